//! Extract title, text, images and engagement counters from Xiaohongshu posts.

pub mod api;
pub mod config;
pub mod download;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod locate;
pub mod models;

pub use config::{Config, HttpSettings};
pub use download::ImageDownloader;
pub use error::ExtractionError;
pub use fetch::PageFetcher;
pub use models::ExtractedContent;
