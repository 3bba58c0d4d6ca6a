mod cli;

use firmware_quota::config::Config;
use firmware_quota::server;

#[tokio::main(flavor = "current_thread")] // host events are handled cooperatively on one thread
async fn main() -> anyhow::Result<()> {
    let cmd = cli::build_cli();
    let matches = cmd.get_matches();
    let log_level = matches.get_one::<String>("log-level").cloned();
    let version_flag = matches.get_flag("version");

    cli::init_logging(log_level.as_deref());

    if version_flag {
        println!("firmware-quota {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cfg = cli::apply_overrides(Config::from_env()?, &matches)?;
    if matches.get_flag("once") {
        server::run_once(&cfg).await
    } else {
        server::run_stdio_host(&cfg).await
    }
}
