//! Shared helpers used by every crate in the workspace: tracing setup and
//! filesystem preparation for the persisted session.

pub mod env;
pub mod utils;
