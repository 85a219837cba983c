use parking_lot::Mutex;
/// Debug logging for rec-cue
///
/// Every `log::*!` call in the workspace is routed through a bridge installed by
/// [`init_log_bridge`]. Output goes to /tmp/rec_cue_debug.log on Unix/macOS,
/// or %TEMP%\rec_cue_debug.log on Windows, so the console stays reserved for
/// the indicator lines. When RUST_LOG is set, records are mirrored to stderr.
///
/// Level precedence, highest first:
/// - `--log-level` CLI flag
/// - RUST_LOG environment variable
/// - `log_level` from config.yaml (applied via [`set_config_level`] once loaded)
/// - DEBUG_LEVEL environment variable (0-4)
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{LevelFilter, Log, Metadata, Record};

/// Debug level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl DebugLevel {
    fn from_env() -> Self {
        match std::env::var("DEBUG_LEVEL") {
            Ok(val) => Self::parse(&val),
            Err(_) => DebugLevel::Off,
        }
    }

    fn parse(val: &str) -> Self {
        match val.trim().parse::<u8>() {
            Ok(1) => DebugLevel::Error,
            Ok(2) => DebugLevel::Info,
            Ok(3) => DebugLevel::Debug,
            Ok(4) => DebugLevel::Trace,
            _ => DebugLevel::Off,
        }
    }

    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            DebugLevel::Off => LevelFilter::Off,
            DebugLevel::Error => LevelFilter::Error,
            DebugLevel::Info => LevelFilter::Info,
            DebugLevel::Debug => LevelFilter::Debug,
            DebugLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Path of the debug log file.
pub fn log_path() -> PathBuf {
    #[cfg(unix)]
    let path = PathBuf::from("/tmp/rec_cue_debug.log");
    #[cfg(not(unix))]
    let path = std::env::temp_dir().join("rec_cue_debug.log");
    path
}

/// Lazily opened log file; the header is written on first use.
struct DebugFile {
    file: Option<File>,
    open_failed: bool,
}

impl DebugFile {
    fn write_line(&mut self, line: &str) {
        if self.file.is_none() && !self.open_failed {
            match OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(log_path())
            {
                Ok(mut f) => {
                    let _ = writeln!(
                        f,
                        "\n{}\nrec-cue debug session started at {} (level={})\n{}",
                        "=".repeat(80),
                        get_timestamp(),
                        log::max_level(),
                        "=".repeat(80)
                    );
                    self.file = Some(f);
                }
                // Never fall back to the console; it belongs to the indicator.
                Err(_) => self.open_failed = true,
            }
        }
        if let Some(file) = self.file.as_mut() {
            let _ = writeln!(file, "{}", line);
            let _ = file.flush();
        }
    }
}

struct LogBridge {
    file: Mutex<DebugFile>,
    mirror_stderr: bool,
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:<5}] [{}] {}",
            get_timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
        if self.mirror_stderr {
            eprintln!("{}", line);
        }
        self.file.lock().write_line(&line);
    }

    fn flush(&self) {
        if let Some(file) = self.file.lock().file.as_mut() {
            let _ = file.flush();
        }
    }
}

static BRIDGE: OnceLock<LogBridge> = OnceLock::new();

/// Set when the CLI flag or RUST_LOG picked the level; config must not override it.
static LEVEL_PINNED: AtomicBool = AtomicBool::new(false);

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Most verbose level named in a RUST_LOG value such as `info` or
/// `rec_cue_watch=trace,warn`. Returns `None` if nothing parses.
pub fn parse_rust_log(value: &str) -> Option<LevelFilter> {
    value
        .split(',')
        .filter_map(|directive| {
            let level = directive.rsplit('=').next()?;
            level.trim().parse::<LevelFilter>().ok()
        })
        .max()
}

/// Install the log bridge. Safe to call more than once; later calls only
/// adjust the level.
pub fn init_log_bridge(cli_level: Option<LevelFilter>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_level = rust_log.as_deref().and_then(parse_rust_log);

    let level = match (cli_level, env_level) {
        (Some(level), _) | (None, Some(level)) => {
            LEVEL_PINNED.store(true, Ordering::SeqCst);
            level
        }
        (None, None) => DebugLevel::from_env().to_level_filter(),
    };

    let bridge = BRIDGE.get_or_init(|| LogBridge {
        file: Mutex::new(DebugFile {
            file: None,
            open_failed: false,
        }),
        mirror_stderr: rust_log.is_some(),
    });
    // Fails only if another logger was installed first, e.g. by a test harness.
    let _ = log::set_logger(bridge);
    log::set_max_level(level);
}

/// Apply the level from config.yaml unless the CLI or RUST_LOG already chose one.
///
/// `LevelFilter::Off` from config leaves the DEBUG_LEVEL choice in place.
pub fn set_config_level(level: LevelFilter) {
    if LEVEL_PINNED.load(Ordering::SeqCst) || level == LevelFilter::Off {
        return;
    }
    log::set_max_level(level);
    log::debug!("Log level set from config: {}", level);
}
