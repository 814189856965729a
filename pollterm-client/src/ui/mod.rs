//! Terminal UI for pollterm
//!
//! The reference display surface: the host's screen fills the terminal and
//! a one-line status bar sits below it.

mod app;
mod event;
mod screen;
mod status;
mod terminal;

pub use app::App;
