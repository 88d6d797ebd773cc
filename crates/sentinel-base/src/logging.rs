use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

/// Environment variable overriding the maximum log level
/// (`error`, `warn`, `info`, `debug`, `trace` or `off`).
pub const LOG_LEVEL_ENV: &str = "SENTINEL_LOG";

/// A logger that writes to stdout using println!
pub struct StdoutLogger;

/// A logger that writes to date-named files with automatic day rollover
pub struct FileLogger {
    state: Mutex<FileLoggerState>,
}

/// Writes every record both to stdout and to a `FileLogger`.
pub struct TeeLogger {
    stdout: StdoutLogger,
    file: FileLogger,
}

struct FileLoggerState {
    dir: PathBuf,
    current_date: String,
    file: File,
}

impl FileLogger {
    /// Create a new FileLogger that writes to the specified directory
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let current_date = format_today();
        let file = open_day_file(&dir, &current_date)?;

        Ok(FileLogger {
            state: Mutex::new(FileLoggerState {
                dir,
                current_date,
                file,
            }),
        })
    }
}

impl TeeLogger {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        Ok(TeeLogger {
            stdout: StdoutLogger,
            file: FileLogger::new(dir)?,
        })
    }
}

fn open_day_file(dir: &std::path::Path, date: &str) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(format!("{}.log", date)))
}

fn format_record(record: &Record) -> String {
    format!(
        "{} [{}] [thread:{:?}] {}:{} - {}",
        format_timestamp(),
        record.level(),
        std::thread::current().id(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.args()
    )
}

impl Log for StdoutLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        println!("{}", format_record(record));
    }

    fn flush(&self) {
        std::io::stdout().flush().ok();
    }
}

impl Log for FileLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        // day rollover
        let today = format_today();
        if today != state.current_date {
            match open_day_file(&state.dir, &today) {
                Ok(new_file) => {
                    state.file = new_file;
                    state.current_date = today;
                }
                Err(e) => {
                    eprintln!("Failed to open log file for {} in {:?}: {}", today, state.dir, e);
                }
            }
        }

        let log_line = format!("{}\n", format_record(record));
        if let Err(e) = state.file.write_all(log_line.as_bytes()) {
            eprintln!("Failed to write to log file: {}", e);
            eprintln!("{}", log_line.trim_end());
        }
    }

    fn flush(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.file.flush().ok();
    }
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.stdout.enabled(metadata) || self.file.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.stdout.log(record);
        self.file.log(record);
    }

    fn flush(&self) {
        self.stdout.flush();
        self.file.flush();
    }
}

/// Current local time as YYYY-MM-DDTHH:MM:SS.mmm
pub fn format_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

/// Current local date as YYYY-MM-DD
pub fn format_today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Maximum level: `SENTINEL_LOG` if set and valid, otherwise Debug for
/// debug builds and Info for release builds.
pub fn max_level() -> LevelFilter {
    parse_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref())
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    match value.and_then(|v| LevelFilter::from_str(v.trim()).ok()) {
        Some(level) => level,
        None if cfg!(debug_assertions) => LevelFilter::Debug,
        None => LevelFilter::Info,
    }
}

fn install(logger: &'static dyn Log) {
    // only the first installation in a process wins
    if log::set_logger(logger).is_ok() {
        log::set_max_level(max_level());
    }
}

/// Install `StdoutLogger` as the global logger. Later calls are ignored.
pub fn init_stdout_logger() {
    static LOGGER: StdoutLogger = StdoutLogger;
    install(&LOGGER);
}

/// Install a `FileLogger` writing into `dir`. Later calls are ignored.
pub fn init_file_logger(dir: impl Into<PathBuf>) -> std::io::Result<()> {
    let logger = FileLogger::new(dir)?;
    install(Box::leak(Box::new(logger)));
    Ok(())
}

/// Install a `TeeLogger` (stdout + files in `dir`). Later calls are ignored.
pub fn init_tee_logger(dir: impl Into<PathBuf>) -> std::io::Result<()> {
    let logger = TeeLogger::new(dir)?;
    install(Box::leak(Box::new(logger)));
    Ok(())
}

/// Log a fatal error and exit the process
#[macro_export]
macro_rules! log_fatal {
    ($($arg:tt)*) => {{
        $crate::log::error!($($arg)*);
        $crate::log::Log::flush($crate::log::logger());
        std::process::exit(1);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(Some("warn")), LevelFilter::Warn);
        assert_eq!(parse_level(Some(" TRACE ")), LevelFilter::Trace);
        assert_eq!(parse_level(Some("off")), LevelFilter::Off);

        let fallback = if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        assert_eq!(parse_level(Some("loud")), fallback);
        assert_eq!(parse_level(None), fallback);
    }

    #[test]
    fn test_format_timestamp_structure() {
        let ts = format_timestamp();
        // YYYY-MM-DDTHH:MM:SS.mmm
        assert_eq!(ts.len(), 23);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn test_file_logger_day_rollover() {
        let test_dir = std::env::temp_dir()
            .join(format!("sentinel-log-test-{}-rollover", std::process::id()));
        let _ = fs::remove_dir_all(&test_dir);

        let logger = FileLogger::new(&test_dir).expect("Failed to create FileLogger");

        // pretend the logger was opened on an earlier day
        let stale_path = test_dir.join("1999-01-01.log");
        {
            let mut state = logger.state.lock().unwrap();
            state.current_date = "1999-01-01".to_string();
            state.file = open_day_file(&test_dir, "1999-01-01").unwrap();
        }

        logger.log(
            &log::RecordBuilder::new()
                .level(log::Level::Info)
                .target("test")
                .file(Some("test.rs"))
                .line(Some(1))
                .args(format_args!("after rollover"))
                .build(),
        );
        logger.flush();

        let today_file = test_dir.join(format!("{}.log", format_today()));
        assert!(stale_path.exists());
        let content = fs::read_to_string(&today_file).expect("today's log file");
        assert!(content.contains("after rollover"));
        assert_eq!(fs::read_to_string(&stale_path).unwrap(), "");
        assert_eq!(logger.state.lock().unwrap().current_date, format_today());

        fs::remove_dir_all(&test_dir).ok();
    }
}
