//! API request and response models.
//!
//! Field names follow what the browser form sends (`dataUrl`, `imageBase64`, `isEdit`), so
//! the structs here rename to camelCase where the wire format does.

pub mod concepts;
pub mod errors;
pub mod images;
