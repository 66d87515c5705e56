//! HTTP request handlers.

pub mod generate;
pub mod page;
pub mod static_assets;
