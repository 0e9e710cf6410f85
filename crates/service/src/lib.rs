//! Client core for the store locator backend.
//! - Session lifecycle with transparent, single-flight token renewal.
//! - Search validation, paging and open/closed decoration.
//! - Admin user/store management over the same authenticated transport.

pub mod errors;
pub mod auth;
pub mod transport;
pub mod hours;
pub mod search;
pub mod pagination;
pub mod clients;
pub mod runtime;
