//! HTTP boundary for the lead coordination engine.
//!
//! Exposed as a library so integration tests can drive the router
//! in-process.

pub mod api;
pub mod state;
