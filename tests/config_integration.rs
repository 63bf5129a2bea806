use std::path::PathBuf;

use splitmark::config::{ConfigFlags, ThemeMode, load_config_flags, parse_flag_tokens};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".splitmarkrc");
    let content = r"
# comment
--watch

--theme light

--render-debug-log=render.log
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.watch);
    assert_eq!(flags.theme, Some(ThemeMode::Light));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".splitmarkrc");
    let content = "--watch\n--theme light\n--split 40\n--render-debug-log file.log\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "splitmark".to_string(),
        "--theme".to_string(),
        "dark".to_string(),
        "--no-sync".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.watch, "file flags should remain enabled");
    assert!(effective.no_sync, "cli flags should be applied");
    assert_eq!(
        effective.theme,
        Some(ThemeMode::Dark),
        "cli should override theme"
    );
    assert_eq!(
        effective.split,
        Some(40.0),
        "file split preserved when CLI does not override"
    );
    assert_eq!(
        effective.render_debug_log,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "splitmark".to_string(),
        "--theme=dark".to_string(),
        "--split=25".to_string(),
        "--render-debug-log=render.log".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.theme, Some(ThemeMode::Dark));
    assert_eq!(flags.split, Some(25.0));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
}

#[test]
fn test_unknown_tokens_are_ignored() {
    let args = vec![
        "splitmark".to_string(),
        "NOTES.md".to_string(),
        "--definitely-not-a-flag".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags, ConfigFlags::default());
}
