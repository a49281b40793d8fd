//! API route handlers

pub mod analyze;
pub mod packages;
pub mod scores;
