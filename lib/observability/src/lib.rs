//! Logging setup shared by binaries and tests embedding the L1 adapter.

mod config;
mod logs;

pub use config::ObservabilityConfig;
pub use logs::{LogFormat, Logs, UnknownLogFormat};
