use serde::{Deserialize, Serialize};
use slog::{o, Drain, Logger};

pub use slog;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoggingSettings {
    pub stdout: bool,
    pub level: String,
    pub log_path: Option<String>,
    pub name: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            stdout: true,
            level: String::from("info"),
            log_path: None,
            name: String::from("zap_bridge"),
        }
    }
}

pub fn init_log(config: &LoggingSettings) -> Result<Logger, std::io::Error> {
    let LoggingSettings {
        stdout,
        level,
        log_path,
        name,
    } = config;

    let level = parse_level(level)?;
    let values = o!("name" => name.to_string());

    let drain_stdout = if *stdout {
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        Some(slog_async::Async::new(drain).build().fuse())
    } else {
        None
    };

    let drain_file = match log_path {
        Some(path) => Some(build_file_drain(path)?),
        None => None,
    };

    let logger = match (drain_stdout, drain_file) {
        (Some(drain_stdout), Some(drain_file)) => {
            // both a file drain and a stdout drain
            let drain = slog::Duplicate::new(drain_stdout, drain_file).fuse();
            Logger::root(slog::LevelFilter::new(drain, level).fuse(), values)
        }
        (Some(drain), None) | (None, Some(drain)) => Logger::root(slog::LevelFilter::new(drain, level).fuse(), values),
        (None, None) => Logger::root(slog::Discard, values),
    };
    Ok(logger)
}

fn parse_level(level: &str) -> Result<slog::Level, std::io::Error> {
    let level = match level {
        "trace" => slog::Level::Trace,
        "debug" => slog::Level::Debug,
        "info" => slog::Level::Info,
        "warn" | "warning" => slog::Level::Warning,
        "error" => slog::Level::Error,
        "critical" => slog::Level::Critical,
        st => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Unknown logging level {:?}", st),
            ))
        }
    };
    Ok(level)
}

fn build_file_drain(log_path: &str) -> Result<slog::Fuse<slog_async::Async>, std::io::Error> {
    let file = std::fs::OpenOptions::new().create(true).append(true).open(log_path)?;
    let decorator = slog_term::PlainSyncDecorator::new(file);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Ok(drain)
}
