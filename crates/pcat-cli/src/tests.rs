use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["pcat", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["pcat", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["pcat"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn ingest_defaults() {
    let cli = Cli::try_parse_from(["pcat", "ingest", "urls.csv"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Ingest {
            ref file,
            format: None,
            dry_run: false,
            no_images: false,
            json: false,
        }) if file == &PathBuf::from("urls.csv")
    ));
}

#[test]
fn ingest_with_flags() {
    let cli = Cli::try_parse_from([
        "pcat",
        "ingest",
        "urls.list",
        "--format",
        "txt",
        "--dry-run",
        "--no-images",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Ingest {
            format: Some(InputFormat::Txt),
            dry_run: true,
            no_images: true,
            ..
        })
    ));
}

#[test]
fn ingest_rejects_unknown_format() {
    let result = Cli::try_parse_from(["pcat", "ingest", "urls.xml", "--format", "xml"]);
    assert!(result.is_err());
}

#[test]
fn ingest_requires_file() {
    assert!(Cli::try_parse_from(["pcat", "ingest"]).is_err());
}

#[test]
fn score_uses_configured_method_by_default() {
    let cli = Cli::try_parse_from(["pcat", "score"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Score { method: None })
    ));
}

#[test]
fn score_accepts_method_override() {
    let cli = Cli::try_parse_from(["pcat", "score", "--method", "value_focused"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Score {
            method: Some(ScoringMethod::ValueFocused)
        })
    ));
}

#[test]
fn score_rejects_unknown_method() {
    assert!(Cli::try_parse_from(["pcat", "score", "--method", "cheapest"]).is_err());
}

#[test]
fn parses_methods_command() {
    let cli = Cli::try_parse_from(["pcat", "methods"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Methods)));
}

#[test]
fn categorize_with_con_flag() {
    let cli =
        Cli::try_parse_from(["pcat", "categorize", "pilling after one wash", "--con"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Categorize { ref text, con: true }) if text == "pilling after one wash"
    ));
}
