use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use log::LevelFilter;

/// Initializes the logger with the specified log file path.
/// Should be called once before logging any messages; later calls keep the
/// first logger and return `Ok`.
///
/// The level defaults to `info` and can be overridden through `RUST_LOG`.
pub fn initialize_logger(file_path: &Path) -> io::Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)?;

    let result = env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                current_timestamp(),
                record.level(),
                record.args()
            )
        })
        .try_init();

    if result.is_err() {
        log::debug!("Logger already initialized, keeping the existing one");
    }
    Ok(())
}

/// Returns the current timestamp as a string in seconds.milliseconds format.
fn current_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:03}", now.as_secs(), now.subsec_millis())
}

/// Logs an info message.
pub fn log_info(message: &str) {
    log::info!("{}", message);
}

/// Logs an error message.
pub fn log_error(message: &str) {
    log::error!("{}", message);
}
