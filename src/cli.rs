use clap::{Arg, ArgAction, ArgMatches, Command};

use firmware_quota::config::{parse_timeout_ms, Config};

pub fn build_cli() -> Command {
    Command::new("firmware-quota")
        .about("Firmware.ai quota reporter (stdio host adapter)")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .num_args(1)
                .help("Quota endpoint URL (overrides FIRMWARE_QUOTA_URL)"),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .num_args(1)
                .help("Hard bound on each quota request, in milliseconds"),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Report once and exit without reading host events")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
}

/// Layer command-line overrides on top of the environment config.
pub fn apply_overrides(mut cfg: Config, matches: &ArgMatches) -> anyhow::Result<Config> {
    if let Some(url) = matches.get_one::<String>("api-url") {
        cfg = cfg.with_api_url(url)?;
    }
    if let Some(ms) = matches.get_one::<String>("timeout-ms") {
        cfg = cfg.with_timeout(parse_timeout_ms(ms)?);
    }
    Ok(cfg)
}

pub fn init_logging(level: Option<&str>) {
    // Respect explicit level, else default to info, allow env override via RUST_LOG
    if let Some(lvl) = level {
        std::env::set_var("RUST_LOG", lvl);
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    // stdout carries host lines, so diagnostics stay on stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn overrides_replace_env_values() {
        let matches = build_cli().get_matches_from([
            "firmware-quota",
            "--api-url",
            "http://127.0.0.1:9/q",
            "--timeout-ms",
            "1500",
        ]);
        let cfg = apply_overrides(Config::default(), &matches).unwrap();
        assert_eq!(cfg.api_url, "http://127.0.0.1:9/q");
        assert_eq!(cfg.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let matches = build_cli().get_matches_from(["firmware-quota", "--timeout-ms", "0"]);
        assert!(apply_overrides(Config::default(), &matches).is_err());
    }
}
