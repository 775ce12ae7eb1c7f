//! HTTP surface: landing page and the scrape endpoint

/// Route definitions and server startup
pub mod routes;

pub use routes::*;
