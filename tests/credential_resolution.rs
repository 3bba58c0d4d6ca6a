use firmware_quota::credentials::{CredentialResolver, CredentialSource};
use std::fs;
use std::path::PathBuf;

fn write(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn env_var_wins_over_files() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(&dir, "credentials", b"FIRMWARE_API_KEY=from_file\n");
    std::env::set_var("FQ_TEST_PRECEDENCE_KEY", "from_env");
    let resolver = CredentialResolver::new(vec![
        CredentialSource::Env("FQ_TEST_PRECEDENCE_KEY".into()),
        CredentialSource::File(file),
    ]);
    assert_eq!(resolver.resolve().unwrap().expose(), "from_env");
}

#[test]
fn empty_env_var_falls_through_to_files() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(&dir, "credentials", b"FIRMWARE_API_KEY=from_file\n");
    std::env::set_var("FQ_TEST_EMPTY_KEY", "");
    let resolver = CredentialResolver::new(vec![
        CredentialSource::Env("FQ_TEST_EMPTY_KEY".into()),
        CredentialSource::File(file),
    ]);
    assert_eq!(resolver.resolve().unwrap().expose(), "from_file");
}

#[test]
fn earlier_path_wins_when_several_match() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.env");
    let second = write(&dir, "second", b"FIRMWARE_API_KEY=\"second_key\"\n");
    let third = write(&dir, "third", b"FIRMWARE_API_KEY=third_key\n");
    let resolver = CredentialResolver::new(vec![
        CredentialSource::Env("FQ_TEST_UNSET_KEY_A".into()),
        CredentialSource::File(missing),
        CredentialSource::File(second),
        CredentialSource::File(third),
    ]);
    assert_eq!(resolver.resolve().unwrap().expose(), "second_key");
}

#[test]
fn unreadable_or_unmatched_files_do_not_block_later_paths() {
    let dir = tempfile::tempdir().unwrap();
    // Invalid UTF-8 fails to decode, a directory fails to read.
    let corrupt = write(&dir, "corrupt", &[0xff, 0xfe, 0x00, 0x80]);
    let as_dir = dir.path().join("a_directory");
    fs::create_dir(&as_dir).unwrap();
    let unrelated = write(&dir, "unrelated.env", b"OPENAI_API_KEY=sk-nope\n");
    let good = write(&dir, "api_key", b"FIRMWARE_API_KEY_2='good_key'\n");
    let resolver = CredentialResolver::new(vec![
        CredentialSource::File(corrupt),
        CredentialSource::File(as_dir),
        CredentialSource::File(unrelated),
        CredentialSource::File(good),
    ]);
    assert_eq!(resolver.resolve().unwrap().expose(), "good_key");
}

#[test]
fn nothing_configured_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = CredentialResolver::new(vec![
        CredentialSource::Env("FQ_TEST_UNSET_KEY_B".into()),
        CredentialSource::File(dir.path().join("nope")),
    ]);
    assert!(resolver.resolve().is_none());
}

#[test]
fn standard_chain_starts_with_env_var() {
    let resolver = CredentialResolver::standard();
    assert_eq!(
        resolver.sources().first(),
        Some(&CredentialSource::Env("FIRMWARE_API_KEY".into()))
    );
    assert!(resolver.sources().len() <= 5);
}
