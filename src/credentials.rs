//! Credential discovery.
//!
//! The API key is looked up in a fixed order: the `FIRMWARE_API_KEY` environment
//! variable first, then a handful of well-known files under the user's home
//! directory. The first source that yields a value wins; nothing is merged.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

pub const ENV_VAR_NAME: &str = "FIRMWARE_API_KEY";

/// Bearer token for the quota endpoint. `Debug` never prints the full value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First four characters followed by an ellipsis; short keys show no prefix.
    pub fn redacted(&self) -> String {
        if self.0.chars().count() <= 8 {
            return "…".to_string();
        }
        let head: String = self.0.chars().take(4).collect();
        format!("{head}…")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.redacted()).finish()
    }
}

/// One place a credential may live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Process environment variable holding the key directly.
    Env(String),
    /// Text file containing a `FIRMWARE_API_KEY=...` assignment.
    File(PathBuf),
}

impl CredentialSource {
    pub fn lookup(&self) -> Option<Credential> {
        match self {
            CredentialSource::Env(name) => std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .map(Credential::new),
            CredentialSource::File(path) => read_key_file(path),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CredentialResolver {
    sources: Vec<CredentialSource>,
}

impl CredentialResolver {
    pub fn new(sources: Vec<CredentialSource>) -> Self {
        Self { sources }
    }

    /// The standard chain: env var, then the candidate files for this platform.
    pub fn standard() -> Self {
        let appdata = if cfg!(windows) {
            std::env::var_os("APPDATA").map(PathBuf::from)
        } else {
            None
        };
        let mut sources = vec![CredentialSource::Env(ENV_VAR_NAME.to_string())];
        if let Some(home) = dirs::home_dir() {
            sources.extend(
                candidate_paths(&home, appdata.as_deref())
                    .into_iter()
                    .map(CredentialSource::File),
            );
        }
        Self::new(sources)
    }

    pub fn sources(&self) -> &[CredentialSource] {
        &self.sources
    }

    pub fn resolve(&self) -> Option<Credential> {
        self.sources.iter().find_map(|source| {
            let found = source.lookup();
            if let Some(c) = &found {
                debug!("credential {} found via {:?}", c.redacted(), source);
            }
            found
        })
    }
}

/// Candidate key files in search order. `appdata` is only supplied on Windows.
pub fn candidate_paths(home: &Path, appdata: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![
        home.join("Projects").join("LLM-API-Key-Proxy").join(".env"),
        home.join(".firmware").join("credentials"),
        home.join(".config").join("firmware").join("api_key"),
    ];
    if let Some(dir) = appdata {
        paths.push(dir.join("firmware").join("api_key"));
    }
    paths
}

fn key_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"FIRMWARE_API_KEY[_\d]*=['"]?([^'"\s]+)"#).ok())
        .as_ref()
}

/// Pull the first `FIRMWARE_API_KEY...=value` assignment out of file contents.
pub fn extract_key(content: &str) -> Option<Credential> {
    key_pattern()?
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| Credential::new(m.as_str()))
}

// Missing, unreadable or non-UTF-8 files all count as "nothing here".
fn read_key_file(path: &Path) -> Option<Credential> {
    if !path.exists() {
        return None;
    }
    match fs::read_to_string(path) {
        Ok(content) => extract_key(&content),
        Err(e) => {
            debug!("skipping credential file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_and_quoted_values() {
        assert_eq!(
            extract_key("FIRMWARE_API_KEY=fw_abc123\n").unwrap().expose(),
            "fw_abc123"
        );
        assert_eq!(
            extract_key("FIRMWARE_API_KEY=\"fw_quoted\"").unwrap().expose(),
            "fw_quoted"
        );
        assert_eq!(
            extract_key("FIRMWARE_API_KEY='fw_single' # note").unwrap().expose(),
            "fw_single"
        );
    }

    #[test]
    fn accepts_numbered_suffixes_and_takes_first() {
        let content = "OTHER=1\nFIRMWARE_API_KEY_2=second\nFIRMWARE_API_KEY=third\n";
        assert_eq!(extract_key(content).unwrap().expose(), "second");
        assert_eq!(
            extract_key("FIRMWARE_API_KEY_1=one").unwrap().expose(),
            "one"
        );
    }

    #[test]
    fn rejects_unrelated_content() {
        assert!(extract_key("").is_none());
        assert!(extract_key("OPENAI_API_KEY=sk-123").is_none());
        assert!(extract_key("FIRMWARE_API_KEY=").is_none());
        assert!(extract_key("FIRMWARE_API_KEY=\"\"").is_none());
    }

    #[test]
    fn candidate_paths_follow_platform() {
        let home = Path::new("/home/u");
        let unix = candidate_paths(home, None);
        assert_eq!(unix.len(), 3);
        assert_eq!(unix[0], home.join("Projects/LLM-API-Key-Proxy/.env"));
        assert_eq!(unix[1], home.join(".firmware/credentials"));
        assert_eq!(unix[2], home.join(".config/firmware/api_key"));

        let with_appdata = candidate_paths(home, Some(Path::new("/appdata")));
        assert_eq!(with_appdata.len(), 4);
        assert_eq!(with_appdata[3], Path::new("/appdata/firmware/api_key"));
    }

    #[test]
    fn debug_output_is_redacted() {
        let c = Credential::new("fw_supersecretvalue");
        let dbg = format!("{:?}", c);
        assert!(dbg.contains("fw_s…"));
        assert!(!dbg.contains("supersecret"));
    }

    #[test]
    fn short_keys_are_fully_masked() {
        for key in ["k", "abcd", "fw_12345"] {
            let c = Credential::new(key);
            assert_eq!(c.redacted(), "…");
            assert!(!format!("{:?}", c).contains(key));
        }
    }
}
