//! Request extractors whose rejections flow through `AppError`.

pub mod id;
pub mod json;

pub use id::DocumentId;
pub use json::JsonBody;
