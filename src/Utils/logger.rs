//! Logging set-up: a terminal logger writing to stderr, so that the session transcript on
//! stdout stays clean, and optionally a log file.
use chrono::Local;
use simplelog::*;
use std::fs::File;

/// Level filter from its name; `none` is accepted as a synonym of `off`.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    let filter = match level.trim().to_ascii_lowercase().as_str() {
        "off" | "none" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => return None,
    };
    Some(filter)
}

/// `tutor_log_<date>_<time>.txt`
pub fn default_log_file_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("tutor_log_{}.txt", date_and_time)
}

/// Initializes the global logger. Returns `false` when a logger was already installed; a
/// log file that cannot be created is skipped with a warning.
pub fn init_logger(level: LevelFilter, log_file: Option<&str>) -> bool {
    if level == LevelFilter::Off {
        return true;
    }
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    let mut failed_file = None;
    if let Some(name) = log_file {
        match File::create(name) {
            Ok(file) => loggers.push(WriteLogger::new(level, Config::default(), file)),
            Err(e) => failed_file = Some((name, e)),
        }
    }
    let installed = CombinedLogger::init(loggers).is_ok();
    if let Some((name, e)) = failed_file {
        log::warn!("cannot create log file {}: {}", name, e);
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level(" WARN "), Some(LevelFilter::Warn));
        assert_eq!(parse_level("none"), Some(LevelFilter::Off));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_default_log_file_name() {
        let name = default_log_file_name();
        assert!(name.starts_with("tutor_log_"));
        assert!(name.ends_with(".txt"));
    }
}
