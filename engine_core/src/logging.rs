use std::fmt;
use std::sync::{Mutex, OnceLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        write!(f, "{}", label)
    }
}

type Sink = Box<dyn Fn(LogLevel, &str, &str) + Send + Sync + 'static>;

fn default_sink(level: LogLevel, scope: &str, message: &str) {
    eprintln!("[{}] {}: {}", level, scope, message);
}

fn sink_cell() -> &'static Mutex<Sink> {
    static SINK: OnceLock<Mutex<Sink>> = OnceLock::new();
    SINK.get_or_init(|| Mutex::new(Box::new(default_sink)))
}

pub fn set_sink(sink: impl Fn(LogLevel, &str, &str) + Send + Sync + 'static) {
    let mut guard = sink_cell().lock().expect("log sink lock poisoned");
    *guard = Box::new(sink);
}

pub fn log(level: LogLevel, scope: &str, message: impl AsRef<str>) {
    let guard = sink_cell().lock().expect("log sink lock poisoned");
    (guard)(level, scope, message.as_ref());
}

pub fn error(scope: &str, message: impl AsRef<str>) {
    log(LogLevel::Error, scope, message);
}

pub fn warn(scope: &str, message: impl AsRef<str>) {
    log(LogLevel::Warn, scope, message);
}

pub fn info(scope: &str, message: impl AsRef<str>) {
    log(LogLevel::Info, scope, message);
}

pub fn debug(scope: &str, message: impl AsRef<str>) {
    log(LogLevel::Debug, scope, message);
}
