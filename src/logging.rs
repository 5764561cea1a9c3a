// Session Logging
// One timestamped log file per process run, plus stderr output in debug builds

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use chrono::{DateTime, Local};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static PROCESS_START: OnceLock<Instant> = OnceLock::new();
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_PREFIX: &str = "styleguard_";
const LOGS_TO_KEEP: usize = 30;

pub fn startup_elapsed_ms() -> u128 {
    PROCESS_START
        .get()
        .map(|t| t.elapsed().as_millis())
        .unwrap_or(0)
}

/// Logging switches read from `STYLEGUARD_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub file_log: bool,
    pub cleanup: bool,
    pub dir: PathBuf,
    pub keep: usize,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str| matches!(lookup(name).as_deref(), Some("1" | "true" | "TRUE"));
        let dir = lookup("STYLEGUARD_LOG_DIR")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_logs_dir);

        Self {
            file_log: !flag("STYLEGUARD_DISABLE_FILE_LOG"),
            cleanup: !flag("STYLEGUARD_DISABLE_LOG_CLEANUP"),
            dir,
            keep: LOGS_TO_KEEP,
        }
    }
}

fn default_logs_dir() -> PathBuf {
    if cfg!(debug_assertions) {
        return PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("logs");
    }
    dirs::data_local_dir()
        .map(|d| d.join("styleguard").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn session_log_name(now: DateTime<Local>) -> String {
    format!("{}{}.log", LOG_PREFIX, now.format("%Y%m%d_%H%M%S"))
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
///
/// Console output goes to stderr so stdout stays free for JSON results.
pub fn init_logging() {
    PROCESS_START.get_or_init(Instant::now);
    let settings = LogSettings::from_env();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if !settings.file_log {
        init_console_only(env_filter);
        info!("File logging disabled via STYLEGUARD_DISABLE_FILE_LOG");
        return;
    }

    if let Err(e) = fs::create_dir_all(&settings.dir) {
        eprintln!("Failed to create logs directory {}: {}", settings.dir.display(), e);
        init_console_only(env_filter);
        info!("Falling back to console-only logging");
        return;
    }

    let log_name = session_log_name(Local::now());
    let (file_writer, guard) =
        tracing_appender::non_blocking(rolling::never(&settings.dir, &log_name));
    let _ = LOG_GUARD.set(guard);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = cfg!(debug_assertions).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %settings.dir.join(&log_name).display(),
        "=== StyleGuard Started ==="
    );

    if settings.cleanup {
        std::thread::spawn(move || cleanup_old_logs(&settings.dir, settings.keep));
    }
}

fn init_console_only(env_filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(cfg!(debug_assertions))
                .with_target(true),
        )
        .init();
}

/// Remove all but the newest `keep` session logs. Names sort chronologically.
fn cleanup_old_logs(logs_dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(logs_dir) else {
        return;
    };

    let mut logs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_PREFIX) && n.ends_with(".log"))
        })
        .collect();

    if logs.len() <= keep {
        return;
    }

    logs.sort();
    let excess = logs.len() - keep;
    for path in logs.into_iter().take(excess) {
        let _ = fs::remove_file(path);
    }
}
