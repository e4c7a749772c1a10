//! Process-wide logging setup shared by the gateway binary and tests.

pub mod logging;

pub use logging::LogFormat;

/// Initialize process-wide observability with JSON logs.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    logging::init(LogFormat::Json);
}

/// Initialize with an explicit output format.
pub fn init_with(format: LogFormat) {
    logging::init(format);
}
