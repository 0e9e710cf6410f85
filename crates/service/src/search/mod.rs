//! Search input handling: form state and query validation.

pub mod validator;

pub use validator::{RawSearchInput, SearchForm, SearchQueryValidator, DEFAULT_RADIUS_MILES};
