//! Byte transfer for tubefetch

pub mod downloader;
pub mod retry;

pub use downloader::*;
pub use retry::*;
