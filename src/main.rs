#![allow(non_snake_case)]
use RustedMathTutor::Utils::config::{ConfigError, TutorConfig};
use RustedMathTutor::Utils::logger::{init_logger, parse_level};
use RustedMathTutor::tutor::router::Tutor;
use RustedMathTutor::tutor::session::run_session;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "math-tutor")]
#[command(about = "Interactive math tutor: solve, differentiate, integrate, limits, simplify")]
struct Args {
    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// off | error | warn | info | debug | trace
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
    /// directory plots are written to
    #[arg(long, value_name = "DIR")]
    plot_dir: Option<PathBuf>,
}

fn build_config(args: &Args) -> Result<TutorConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => TutorConfig::load(path)?,
        None => TutorConfig::default(),
    };
    if let Some(level) = &args.log_level {
        if parse_level(level).is_none() {
            return Err(ConfigError::Invalid(format!("unknown log level '{}'", level)));
        }
        config.log_level = level.clone();
    }
    if let Some(dir) = &args.plot_dir {
        config.plot.output_dir = dir.clone();
    }
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logger(config.level_filter(), config.log_file.as_deref());
    log::debug!("configuration: {:?}", config);

    let tutor = Tutor::new(&config);
    let stdin = io::stdin();
    match run_session(&tutor, stdin.lock(), io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("I/O error: {}", e);
            ExitCode::FAILURE
        }
    }
}
