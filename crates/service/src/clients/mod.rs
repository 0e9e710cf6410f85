//! Typed clients for the backend's search and admin surfaces.
//!
//! Both go through [`SessionManager::execute`](crate::auth::SessionManager::execute),
//! so they carry the current credential and share its renewal.

pub mod admin;
pub mod search;

pub use admin::{AdminClient, AdminListing};
pub use search::SearchClient;
