//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers (form page, generation proxy, static assets)
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - `GET /`: the concept form page
//! - `POST /api/generate`: the generation proxy
//! - `GET /api/docs`: OpenAPI documentation

pub mod handlers;
pub mod models;
