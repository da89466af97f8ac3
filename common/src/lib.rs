//! Shared data model for the home-section catalog.
//!
//! Everything the service stores or sends over the wire lives here so that the
//! backend and any admin client agree on field names and shapes.

pub mod jobs;
pub mod model;
pub mod requests;
pub mod response;
pub mod time;
