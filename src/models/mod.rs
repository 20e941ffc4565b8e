//! Request options and response envelope for the API client
//!
//! This module defines the data types passed into and returned from the
//! client verbs.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{GetOptions, MutationOptions};
pub use responses::ApiResponse;
