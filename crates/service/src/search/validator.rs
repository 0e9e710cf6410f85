use std::collections::BTreeSet;

use configs::SearchConfig;
use models::errors::ValidationError;
use models::search::SearchQuery;
use tracing::debug;

/// Radius used when the input is missing, unparseable or zero.
pub const DEFAULT_RADIUS_MILES: f64 = 50.0;
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
const ZIP_CODE_LEN: usize = 5;

/// Untrusted filter input as typed into the search form.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSearchInput {
    pub location: String,
    pub radius: String,
    pub store_type: String,
    pub services: BTreeSet<String>,
    pub open_now: bool,
    pub page: u32,
    pub limit: u32,
}

impl Default for RawSearchInput {
    fn default() -> Self {
        Self {
            location: String::new(),
            radius: String::new(),
            store_type: String::new(),
            services: BTreeSet::new(),
            open_now: false,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Turns raw form input into a canonical [`SearchQuery`].
#[derive(Clone, Debug)]
pub struct SearchQueryValidator {
    default_radius_miles: f64,
}

impl Default for SearchQueryValidator {
    fn default() -> Self {
        Self { default_radius_miles: DEFAULT_RADIUS_MILES }
    }
}

impl SearchQueryValidator {
    pub fn new(default_radius_miles: f64) -> Self {
        if default_radius_miles.is_finite() && default_radius_miles > 0.0 {
            Self { default_radius_miles }
        } else {
            Self::default()
        }
    }

    pub fn from_config(cfg: &SearchConfig) -> Self {
        Self::new(cfg.default_radius_miles)
    }

    pub fn default_radius_miles(&self) -> f64 {
        self.default_radius_miles
    }

    pub fn validate(&self, raw: &RawSearchInput) -> Result<SearchQuery, ValidationError> {
        let location_term = raw.location.trim();
        if location_term.is_empty() {
            return Err(ValidationError::LocationRequired);
        }
        if location_term.chars().all(|c| c.is_ascii_digit()) && location_term.len() < ZIP_CODE_LEN {
            return Err(ValidationError::ShortZipCode);
        }

        debug_assert!(raw.page >= 1 && raw.limit >= 1, "page and limit are 1-based");
        let store_type = match raw.store_type.trim() {
            "" => None,
            t => Some(t.to_string()),
        };

        Ok(SearchQuery {
            location_term: location_term.to_string(),
            radius_miles: self.normalize_radius(&raw.radius),
            store_type,
            services: raw.services.clone(),
            open_now_only: raw.open_now,
            page: raw.page.max(1),
            limit: raw.limit.max(1),
        })
    }

    /// Absolute value of the input, or the default when it is unusable or zero.
    pub fn normalize_radius(&self, raw: &str) -> f64 {
        match raw.trim().parse::<f64>() {
            Ok(r) if r.is_finite() && r != 0.0 => r.abs(),
            _ => {
                debug!(input = %raw, default = self.default_radius_miles, "radius defaulted");
                self.default_radius_miles
            }
        }
    }
}

/// Raw filter state owned by a search view.
///
/// Every filter change sends the user back to page 1; only [`SearchForm::set_page`]
/// keeps the current filters and moves within the result set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchForm {
    input: RawSearchInput,
}

impl SearchForm {
    pub fn new(limit: u32) -> Self {
        Self { input: RawSearchInput { limit: limit.max(1), ..RawSearchInput::default() } }
    }

    pub fn input(&self) -> &RawSearchInput {
        &self.input
    }

    pub fn page(&self) -> u32 {
        self.input.page
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.input.location = location.into();
        self.reset_page();
    }

    pub fn set_radius(&mut self, radius: impl Into<String>) {
        self.input.radius = radius.into();
        self.reset_page();
    }

    pub fn set_store_type(&mut self, store_type: impl Into<String>) {
        self.input.store_type = store_type.into();
        self.reset_page();
    }

    pub fn set_open_now(&mut self, open_now: bool) {
        self.input.open_now = open_now;
        self.reset_page();
    }

    /// Select the service if absent, deselect it if present. Returns whether it is now selected.
    pub fn toggle_service(&mut self, service: &str) -> bool {
        let selected = if self.input.services.remove(service) {
            false
        } else {
            self.input.services.insert(service.to_string());
            true
        };
        self.reset_page();
        selected
    }

    /// Drop every filter but keep the location.
    pub fn clear_filters(&mut self) {
        self.input.radius.clear();
        self.input.store_type.clear();
        self.input.services.clear();
        self.input.open_now = false;
        self.reset_page();
    }

    pub fn set_page(&mut self, page: u32) {
        self.input.page = page.max(1);
    }

    pub fn to_query(&self, validator: &SearchQueryValidator) -> Result<SearchQuery, ValidationError> {
        validator.validate(&self.input)
    }

    fn reset_page(&mut self) {
        self.input.page = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(location: &str, radius: &str) -> RawSearchInput {
        RawSearchInput { location: location.into(), radius: radius.into(), ..RawSearchInput::default() }
    }

    #[test]
    fn negative_radius_is_made_positive() {
        let q = SearchQueryValidator::default().validate(&raw("90210", "-50")).unwrap();
        assert_eq!(q.location_term, "90210");
        assert_eq!(q.radius_miles, 50.0);
        let q = SearchQueryValidator::default().validate(&raw("90210", "-10")).unwrap();
        assert_eq!(q.radius_miles, 10.0);
    }

    #[test]
    fn unusable_radius_falls_back_to_default() {
        let v = SearchQueryValidator::new(25.0);
        for input in ["", "abc", "0", "-0", "NaN", "inf"] {
            assert_eq!(v.normalize_radius(input), 25.0, "input {input:?}");
        }
        assert_eq!(v.normalize_radius(" 250 "), 250.0);
    }

    #[test]
    fn radius_is_never_non_positive() {
        let v = SearchQueryValidator::default();
        for input in ["-1e9", "-0.001", "0.0", "1e-9", "5000", "x", "-inf"] {
            assert!(v.normalize_radius(input) > 0.0, "input {input:?}");
        }
    }

    #[test]
    fn empty_location_is_rejected() {
        let v = SearchQueryValidator::default();
        assert_eq!(v.validate(&raw("", "50")), Err(ValidationError::LocationRequired));
        assert_eq!(v.validate(&raw("   ", "50")), Err(ValidationError::LocationRequired));
    }

    #[test]
    fn short_numeric_terms_are_rejected() {
        let v = SearchQueryValidator::default();
        for short in ["9", "90", "902", "9021"] {
            assert_eq!(v.validate(&raw(short, "")), Err(ValidationError::ShortZipCode), "{short}");
        }
        assert!(v.validate(&raw("99999", "")).is_ok());
        // non-numeric short terms are place names, not zip codes
        assert!(v.validate(&raw("NY", "")).is_ok());
    }

    #[test]
    fn location_is_trimmed_and_store_type_normalized() {
        let mut input = raw("  Beverly Hills ", "");
        input.store_type = "  ".into();
        let q = SearchQueryValidator::default().validate(&input).unwrap();
        assert_eq!(q.location_term, "Beverly Hills");
        assert_eq!(q.store_type, None);

        input.store_type = "outlet".into();
        let q = SearchQueryValidator::default().validate(&input).unwrap();
        assert_eq!(q.store_type.as_deref(), Some("outlet"));
    }

    #[test]
    fn invalid_default_radius_is_ignored() {
        assert_eq!(SearchQueryValidator::new(0.0).default_radius_miles(), DEFAULT_RADIUS_MILES);
        assert_eq!(SearchQueryValidator::new(-3.0).default_radius_miles(), DEFAULT_RADIUS_MILES);
    }

    #[test]
    fn toggling_a_service_twice_removes_it() {
        let mut form = SearchForm::new(10);
        assert!(form.toggle_service("wifi"));
        assert!(form.toggle_service("atm"));
        assert!(!form.toggle_service("wifi"));
        let services: Vec<_> = form.input().services.iter().cloned().collect();
        assert_eq!(services, vec!["atm"]);
    }

    #[test]
    fn filter_changes_reset_page_but_page_navigation_does_not() {
        let mut form = SearchForm::new(10);
        form.set_location("90210");

        form.set_page(4);
        form.set_radius("250");
        assert_eq!(form.page(), 1);

        form.set_page(3);
        form.toggle_service("pharmacy");
        assert_eq!(form.page(), 1);

        form.set_page(2);
        form.set_store_type("outlet");
        assert_eq!(form.page(), 1);

        form.set_page(5);
        form.set_open_now(true);
        assert_eq!(form.page(), 1);

        form.set_page(6);
        form.clear_filters();
        assert_eq!(form.page(), 1);
        assert_eq!(form.input().location, "90210");

        form.set_page(7);
        let q = form.to_query(&SearchQueryValidator::default()).unwrap();
        assert_eq!(q.page, 7);
        assert_eq!(q.limit, 10);
    }

    #[test]
    fn set_page_clamps_to_one() {
        let mut form = SearchForm::new(10);
        form.set_page(0);
        assert_eq!(form.page(), 1);
    }
}
