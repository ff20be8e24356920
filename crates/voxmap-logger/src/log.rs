use crate::severity::LogSeverity;
use crate::time::now;
use once_cell::sync::Lazy;

/// Environment variable holding the minimum severity that gets printed.
pub const LOG_LEVEL_ENV: &str = "VOXMAP_LOG";

static THRESHOLD: Lazy<LogSeverity> = Lazy::new(|| {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LogSeverity::Info)
});

/// Minimum severity printed by [`log`], read once from `VOXMAP_LOG`.
pub fn threshold() -> LogSeverity {
    *THRESHOLD
}

pub fn enabled(log_severity: LogSeverity) -> bool {
    log_severity >= threshold()
}

pub fn log(msg: String, log_severity: LogSeverity) {
    if !enabled(log_severity) {
        return;
    }
    match log_severity {
        LogSeverity::Error | LogSeverity::Fatal => {
            eprintln!("[{}] {} {}", log_severity, now(), msg)
        }
        _ => println!("[{}] {} {}", log_severity, now(), msg),
    }
}
