//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `token` - Speech authorization token for the browser client
//! - `assessment` - Pronunciation assessment of an uploaded recording
//! - `speech` - Sentence and word synthesis

pub mod api;
pub mod assessment;
mod form;
pub mod speech;
pub mod token;
