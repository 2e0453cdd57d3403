use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use chrono::Local;
use tracing_subscriber::{
    fmt, fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
    Layer,
};

static LOGGER_ONCE: OnceLock<()> = OnceLock::new();
const DEFAULT_FILTER: &str = "info";

/// Initialize the global tracing subscriber (idempotent).
///
/// Logs go to stderr; set `LOG_DIR` to additionally append to a dated file.
pub fn init_logging() {
    LOGGER_ONCE.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let stderr_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr);

        match std::env::var("LOG_DIR").ok() {
            Some(dir) => {
                let file_layer = fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(prepare_log_writer(&dir));
                tracing_subscriber::registry()
                    .with(stderr_layer.and_then(file_layer).with_filter(env_filter))
                    .init();
            }
            None => {
                tracing_subscriber::registry()
                    .with(stderr_layer.with_filter(env_filter))
                    .init();
            }
        }
    });
}

fn prepare_log_writer(dir: &str) -> BoxMakeWriter {
    let log_dir = PathBuf::from(dir);
    fs::create_dir_all(&log_dir).expect("failed to create logs directory");
    let date_prefix = Local::now().format("%Y-%m-%d").to_string();
    let log_path = Arc::new(log_dir.join(format!("{date_prefix}.log")));
    BoxMakeWriter::new({
        let log_path = Arc::clone(&log_path);
        move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&*log_path)
                .expect("failed to open log file")
        }
    })
}
