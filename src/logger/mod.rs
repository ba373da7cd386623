//! Tracing setup with a filter that can be reloaded once settings are known.
//! `bin/refresh_demo.rs` shows it in use.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
