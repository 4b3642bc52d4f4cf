//! Core of the Sandboxie start menu: the persisted folder and sandbox lists,
//! the executable-only directory listing, and the adapter that hands a file
//! to Sandboxie's `Start.exe`.

pub mod config;
pub mod dialog;
pub mod error;
pub mod folder;
pub mod icon;
pub mod launcher;
pub mod sandbox;
pub mod ui_types;

pub use error::{Error, Result};
pub use launcher::Launcher;
