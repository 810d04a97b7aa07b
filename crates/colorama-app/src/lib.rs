//! Colorama Application
//!
//! Headless application shell tying the drawing engine to settings,
//! storage, export and keyboard shortcuts.

mod cli;
mod config;
mod error;
mod session;
mod shortcuts;

#[cfg(feature = "native")]
mod clipboard;

pub use cli::{Cli, Command};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use session::Session;
pub use shortcuts::{Shortcut, ShortcutAction, ShortcutRegistry};

#[cfg(feature = "native")]
pub use clipboard::copy_image;
