use super::{OsError, OsResult};
use core::{
    cell::RefCell,
    fmt::{self, Write},
    sync::atomic::{AtomicBool, AtomicU32, Ordering},
};
use critical_section::Mutex;
use heapless::{Deque, String};
use log::{Level, LevelFilter, Log, Metadata, Record};

const BLACKLISTED_MODULES: [&str; 2] = ["cortex_m", "critical_section"];

/// Longest line kept, including the level and module prefix. Longer lines are truncated.
pub const LINE_CAPACITY: usize = 96;

/// Number of lines kept. The oldest line is dropped when the ring is full.
pub const HISTORY: usize = 16;

pub type LogLine = String<LINE_CAPACITY>;

/// The firmware's logger.
///
/// There is no console, so records are kept in a small ring in RAM. After the
/// brownout breakpoint the ring can be read with a debugger, or drained by a
/// hosted build.
pub static LOGGER: OsLogger = OsLogger::new();

pub struct OsLogger {
    enabled: AtomicBool,
    lines: Mutex<RefCell<Deque<LogLine, HISTORY>>>,
    overwritten: AtomicU32,
}

impl OsLogger {
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            lines: Mutex::new(RefCell::new(Deque::new())),
            overwritten: AtomicU32::new(0),
        }
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Register with the `log` facade.
    ///
    /// # Errors
    /// Returns [`OsError::LoggerInit`] if another logger is already registered.
    pub fn init(&'static self) -> OsResult<()> {
        let level = if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };

        #[cfg(target_has_atomic = "ptr")]
        {
            log::set_logger(self).map_err(|_| OsError::LoggerInit)?;
            log::set_max_level(level);
        }

        // Cortex-M0 has no compare-and-swap. This runs once, before interrupts are enabled.
        #[cfg(not(target_has_atomic = "ptr"))]
        unsafe {
            log::set_logger_racy(self).map_err(|_| OsError::LoggerInit)?;
            log::set_max_level_racy(level);
        }

        Ok(())
    }

    /// Hand every buffered line to `f`, oldest first, and empty the ring.
    pub fn drain(&self, mut f: impl FnMut(&str)) {
        while let Some(line) = critical_section::with(|cs| self.lines.borrow_ref_mut(cs).pop_front())
        {
            f(&line);
        }
    }

    /// Number of buffered lines.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.lines.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lines dropped because the ring was full.
    pub fn overwritten(&self) -> u32 {
        self.overwritten.load(Ordering::Relaxed)
    }

    fn check_blacklist(module: Option<&str>) -> bool {
        let Some(module) = module else { return false };

        BLACKLISTED_MODULES
            .iter()
            .any(|candidate| module.starts_with(candidate))
    }

    fn push(&self, line: LogLine) {
        critical_section::with(|cs| {
            // An NMI may preempt a logging main path. Drop the record rather than panic.
            let Ok(mut lines) = self.lines.borrow(cs).try_borrow_mut() else {
                return;
            };

            if lines.is_full() {
                lines.pop_front();
                let count = self.overwritten.load(Ordering::Relaxed);
                self.overwritten
                    .store(count.saturating_add(1), Ordering::Relaxed);
            }

            // Cannot fail, a slot was just freed.
            let _ = lines.push_back(line);
        });
    }
}

impl Default for OsLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for OsLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.enabled.load(Ordering::Relaxed) && metadata.level() <= log::max_level()
    }

    fn flush(&self) {}

    fn log(&self, record: &Record) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }

        let module = record.module_path();
        if Self::check_blacklist(module) {
            return;
        }

        let mut line = LogLine::new();

        // Overflowing the line only truncates it.
        let _ = write!(
            Truncating(&mut line),
            "{:<5} [{}] {}",
            level_name(record.level()),
            module.unwrap_or("?"),
            record.args()
        );

        self.push(line);
    }
}

/// Writes as much of each fragment as still fits, cut on a char boundary.
struct Truncating<'a>(&'a mut LogLine);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.0.capacity() - self.0.len();
        let mut end = s.len().min(room);
        while !s.is_char_boundary(end) {
            end -= 1;
        }

        // Cannot fail, `end` is within the remaining room.
        let _ = self.0.push_str(&s[..end]);
        Ok(())
    }
}

const fn level_name(level: Level) -> &'static str {
    match level {
        Level::Info => "INFO",
        Level::Warn => "WARN",
        Level::Error => "ERROR",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

#[macro_export]
macro_rules! os_info {
    ($($arg:tt)+) => {
        log::info!($($arg)+)
    };
}

#[macro_export]
macro_rules! os_warn {
    ($($arg:tt)+) => {
        log::warn!($($arg)+)
    };
}

#[macro_export]
macro_rules! os_error {
    ($($arg:tt)+) => {
        log::error!($($arg)+)
    };
}

#[macro_export]
macro_rules! os_debug {
    ($($arg:tt)+) => {
        #[cfg(debug_assertions)]
        log::debug!($($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(logger: &OsLogger, level: Level, module: &'static str, text: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .module_path_static(Some(module))
                .args(format_args!("{text}"))
                .build(),
        );
    }

    fn collect(logger: &OsLogger) -> Vec<std::string::String> {
        let mut out = Vec::new();
        logger.drain(|line| out.push(line.to_string()));
        out
    }

    #[test]
    fn formats_level_and_module() {
        let logger = OsLogger::new();
        emit(&logger, Level::Warn, "xmcbod::sysc", "supply low");

        assert_eq!(collect(&logger), ["WARN  [xmcbod::sysc] supply low"]);
        assert!(logger.is_empty());
    }

    #[test]
    fn blacklisted_modules_are_dropped() {
        let logger = OsLogger::new();
        emit(&logger, Level::Info, "cortex_m::peripheral", "noise");
        assert!(logger.is_empty());
    }

    #[test]
    fn disabled_logger_keeps_nothing() {
        let logger = OsLogger::new();
        logger.disable();
        emit(&logger, Level::Error, "xmcbod", "lost");
        assert!(logger.is_empty());

        logger.enable();
        emit(&logger, Level::Error, "xmcbod", "kept");
        assert_eq!(logger.len(), 1);
    }

    #[test]
    fn full_ring_drops_oldest() {
        let logger = OsLogger::new();
        for i in 0..HISTORY + 2 {
            emit(&logger, Level::Info, "xmcbod", &i.to_string());
        }

        let lines = collect(&logger);
        assert_eq!(lines.len(), HISTORY);
        assert!(lines[0].ends_with(" 2"));
        assert_eq!(logger.overwritten(), 2);
    }

    #[test]
    fn long_lines_are_truncated() {
        let logger = OsLogger::new();
        let text = "x".repeat(LINE_CAPACITY * 2);
        emit(&logger, Level::Info, "xmcbod", &text);

        let lines = collect(&logger);
        assert!(lines[0].len() <= LINE_CAPACITY);
        assert!(lines[0].starts_with("INFO  [xmcbod]"));
    }

    #[test]
    fn truncation_keeps_the_start_of_the_message() {
        let logger = OsLogger::new();
        let text = "supply fell below the trip point while the monitor was sampling at interval one";
        emit(&logger, Level::Info, "xmcbod::sysc::brownout", text);

        let lines = collect(&logger);
        assert_eq!(lines[0].len(), LINE_CAPACITY);
        assert!(lines[0].starts_with("INFO  [xmcbod::sysc::brownout] supply fell below"));
        assert!(text.starts_with(&lines[0]["INFO  [xmcbod::sysc::brownout] ".len()..]));
    }

    #[test]
    fn truncation_never_splits_a_char() {
        let logger = OsLogger::new();
        let text = "\u{00b5}".repeat(LINE_CAPACITY);
        emit(&logger, Level::Warn, "xmcbod", &text);

        let lines = collect(&logger);
        assert!(lines[0].len() <= LINE_CAPACITY);
        assert!(lines[0].ends_with('\u{00b5}'));
    }
}
