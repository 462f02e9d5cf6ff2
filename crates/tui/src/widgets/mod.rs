//! TUI widgets.

pub mod command_composer;
pub mod dashboard;
pub mod log_view;

pub use command_composer::CommandComposer;
pub use log_view::{LogLine, LogView};
