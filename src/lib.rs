//! Script hub: a terminal launcher that lists script categories from a content
//! folder and runs the selected script as a child process.

pub mod animation;
pub mod catalog;
pub mod nav;
pub mod paths;
pub mod runner;
pub mod sound;
pub mod store;
pub mod theme;
pub mod tui;
pub mod warning;

pub use nav::{Effect, Navigator, Stores, View};
pub use paths::HubPaths;
pub use runner::{CapturedRun, RunMode, ScriptRunner};
pub use store::{Config, FlatFile, KvStore, Settings};
pub use theme::{Theme, ThemeDir, ThemeSource};
pub use warning::Warning;
