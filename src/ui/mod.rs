//! Console rendering for the monitor.
//!
//! ## Submodules
//!
//! - [`status`]: Status line formatting and the [`StatusPrinter`]
//! - [`theme`]: Color themes with light/dark detection

pub mod status;
pub mod theme;

pub use status::{clock_stamp, StatusPrinter};
pub use theme::Theme;
