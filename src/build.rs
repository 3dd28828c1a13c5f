mod builder;
pub mod collections;
mod data;
pub mod document;
mod paths;
pub mod pipeline;
mod render;
mod source;
mod watch;

pub use builder::{BuildResult, Builder};
pub use render::TocEntry;
pub use watch::{ChangeKind, FileWatcher, PathClassifier, WatchEvent, WatchPaths};
