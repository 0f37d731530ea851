//! Extractors whose rejections render as the error envelope.

pub mod json;
pub mod uuid_path;

pub use json::{ApiJson, ApiQuery};
pub use uuid_path::UuidPath;
