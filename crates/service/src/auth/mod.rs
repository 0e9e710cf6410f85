//! Session lifecycle: sign-in, credential attachment and transparent renewal.

pub mod domain;
pub mod errors;
pub mod session;
pub mod store;

pub use session::SessionManager;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
