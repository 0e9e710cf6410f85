pub mod errors;
pub mod session;
pub mod store;
pub mod search;
pub mod pagination;
pub mod admin;
