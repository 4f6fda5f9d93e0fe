//! Test helpers module
//!
//! Builders for registrations and sessions, a mock callable-functions server
//! and a test context wiring every service to an in-memory store.

#![allow(dead_code)]

pub mod functions_mock;
pub mod stores;
pub mod test_context;
pub mod test_data;

pub use functions_mock::*;
pub use stores::*;
pub use test_context::*;
pub use test_data::*;
