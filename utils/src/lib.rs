//! Shared utilities for FairDraw.

pub mod logging;
pub mod shutdown;

pub use logging::{init_logging, LogFormat};
pub use shutdown::shutdown_signal;
