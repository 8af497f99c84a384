//! API Route Handlers
//!
//! Each module contains handlers for a specific resource.

pub mod find;
pub mod health;
pub mod render;
