use nihongo_progress::{
    EngineConfig, JsonFileStore, LearningManager, ProgressError, Result, StudyType,
};
use serde::Serialize;
use std::env;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

const PROGRESS_FILE: &str = "progress_store.json";
const CONFIG_FILE: &str = "progress_config.json";

const USAGE: &str = "usage: nihongo-progress [--user <id>] <report|recommend|badges|review|weak <type>|due <type>>";

fn setup_logging() -> Result<()> {
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "nihongo_progress.log");

    // RUST_LOG wins; otherwise debug builds log at debug, release at info
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .init();

    info!("Logging system initialized");
    debug!("Debug logging {}", if cfg!(debug_assertions) { "enabled" } else { "disabled" });
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Report,
    Recommend,
    Badges,
    Review,
    Weak(StudyType),
    Due(StudyType),
}

fn parse_study_type(arg: &str) -> Option<StudyType> {
    let arg = arg.trim_start_matches('-').to_lowercase();

    match arg.as_str() {
        "w" | "wo" | "wor" | "word" | "words" => Some(StudyType::Word),
        "g" | "gr" | "gra" | "gram" | "grammar" | "grammars" => Some(StudyType::Grammar),
        _ => None,
    }
}

fn parse_command(name: &str, rest: &mut impl Iterator<Item = String>) -> Result<Command> {
    let name = name.trim_start_matches('-').to_lowercase();
    let mut typed = |build: fn(StudyType) -> Command| {
        let arg = rest
            .next()
            .ok_or_else(|| ProgressError::InvalidInput(format!("'{name}' needs a study type (word or grammar)")))?;
        parse_study_type(&arg)
            .map(build)
            .ok_or_else(|| ProgressError::InvalidInput(format!("unknown study type '{arg}'")))
    };

    match name.as_str() {
        "rep" | "report" => Ok(Command::Report),
        "rec" | "reco" | "recommend" => Ok(Command::Recommend),
        "b" | "ba" | "badge" | "badges" => Ok(Command::Badges),
        "rev" | "review" => Ok(Command::Review),
        "w" | "we" | "weak" => typed(Command::Weak),
        "d" | "du" | "due" => typed(Command::Due),
        _ => Err(ProgressError::InvalidInput(format!("unknown command '{name}'"))),
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<(Option<String>, Command)> {
    let mut args = args.into_iter();
    let mut user = None;

    while let Some(arg) = args.next() {
        if arg == "--user" || arg == "-u" {
            let id = args
                .next()
                .ok_or_else(|| ProgressError::InvalidInput("--user needs an id".to_string()))?;
            user = Some(id);
            continue;
        }
        let command = parse_command(&arg, &mut args)?;
        if let Some(extra) = args.next() {
            warn!("Ignoring extra argument '{}'", extra);
        }
        return Ok((user, command));
    }

    Err(ProgressError::InvalidInput("no command given".to_string()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(manager: &LearningManager, command: Command) -> Result<()> {
    match command {
        Command::Report => print_json(&manager.progress_report()?),
        Command::Recommend => {
            for line in manager.recommendations()? {
                println!("{line}");
            }
            Ok(())
        }
        Command::Badges => print_json(&manager.badges()?),
        Command::Review => print_json(&manager.review_queue()?),
        Command::Weak(study_type) => {
            for (item, rate) in manager.weak_items(study_type)? {
                println!("{item}\t{:.0}%", rate * 100.0);
            }
            Ok(())
        }
        Command::Due(study_type) => {
            for item in manager.due_items(study_type)? {
                println!("{item}");
            }
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    setup_logging()?;
    info!("Starting nihongo progress");

    let (user, command) = match parse_args(env::args().skip(1)) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Invalid arguments: {}", e);
            eprintln!("{e}\n{USAGE}");
            std::process::exit(2);
        }
    };

    let config = EngineConfig::load(CONFIG_FILE)?;
    let store = JsonFileStore::open(PROGRESS_FILE)?;
    let manager = LearningManager::new(Arc::new(store), config);
    if let Some(user) = user {
        manager.switch_user(user);
    }

    debug!(?command, user = %manager.current_user(), "Running command");
    if let Err(e) = run(&manager, command) {
        error!("Command failed: {}", e);
        return Err(e);
    }

    info!("Finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn study_type_prefixes() {
        assert_eq!(parse_study_type("w"), Some(StudyType::Word));
        assert_eq!(parse_study_type("--Grammar"), Some(StudyType::Grammar));
        assert_eq!(parse_study_type("kanji"), None);
    }

    #[test]
    fn commands_with_user() {
        let (user, command) = parse_args(args(&["--user", "alice", "weak", "gram"])).unwrap();
        assert_eq!(user.as_deref(), Some("alice"));
        assert_eq!(command, Command::Weak(StudyType::Grammar));

        let (user, command) = parse_args(args(&["rec"])).unwrap();
        assert_eq!(user, None);
        assert_eq!(command, Command::Recommend);
    }

    #[test]
    fn bad_arguments() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["due"])).is_err());
        assert!(parse_args(args(&["due", "kanji"])).is_err());
        assert!(parse_args(args(&["--user"])).is_err());
        assert!(parse_args(args(&["launch"])).is_err());
    }
}
