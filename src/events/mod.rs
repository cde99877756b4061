//! Event types flowing from the tailers to connected viewers

mod types;

pub use types::{Alert, AlertType, LogEvent, MonitorEvent};
