//! Core functionality for tubefetch

pub mod downloader;
pub mod media;
pub mod progress;
pub mod request;
pub mod selector;

pub use downloader::*;
pub use media::*;
pub use progress::*;
pub use request::*;
pub use selector::*;
