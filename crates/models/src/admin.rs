use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::store::{Address, StoreListing, WeeklyHours};

/// Console account as listed by `GET /admin/users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub role_id: Option<i64>,
}

fn default_true() -> bool { true }

/// Which record family the admin console is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdminTab {
    Stores,
    Users,
}

impl fmt::Display for AdminTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminTab::Stores => f.write_str("stores"),
            AdminTab::Users => f.write_str("users"),
        }
    }
}

/// Row of the admin table. Consumers match on the variant instead of probing fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdminRecord {
    Store(StoreListing),
    User(UserAccount),
}

impl AdminRecord {
    pub fn tab(&self) -> AdminTab {
        match self {
            AdminRecord::Store(_) => AdminTab::Stores,
            AdminRecord::User(_) => AdminTab::Users,
        }
    }

    /// Identifier used in the record's `/admin/{tab}/{id}` path.
    pub fn id(&self) -> String {
        match self {
            AdminRecord::Store(s) => s.store_id.clone(),
            AdminRecord::User(u) => u.id.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            AdminRecord::Store(s) => &s.name,
            AdminRecord::User(u) => &u.email,
        }
    }
}

/// Input for `POST /admin/users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role_id: i64,
    pub is_active: bool,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password: impl Into<String>, role_id: i64) -> Self {
        Self { email: email.into(), password: password.into(), role_id, is_active: true }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if !email.contains('@') {
            return Err(ValidationError::InvalidEmail);
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        if self.role_id <= 0 {
            return Err(ValidationError::MissingField("role_id"));
        }
        Ok(())
    }
}

/// Input for `POST /admin/stores`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewStore {
    pub store_id: String,
    pub name: String,
    pub store_type: String,
    pub status: String,
    #[serde(flatten)]
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub services: Vec<String>,
    #[serde(flatten)]
    pub weekly_hours: WeeklyHours,
}

impl Default for NewStore {
    fn default() -> Self {
        Self {
            store_id: String::new(),
            name: String::new(),
            store_type: "regular".into(),
            status: "active".into(),
            address: Address::default(),
            phone: None,
            services: Vec::new(),
            weekly_hours: WeeklyHours::business_week(),
        }
    }
}

impl NewStore {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("store_id", &self.store_id),
            ("name", &self.name),
            ("store_type", &self.store_type),
            ("address_postal_code", &self.address.postal_code),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }
        Ok(())
    }
}

/// Partial update for `PATCH /admin/stores/{id}`; absent fields are left as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
}

/// Partial update for `PUT /admin/users/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub errors: u64,
}

/// Body returned by `POST /admin/stores/import`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ImportReport {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stats: ImportStats,
}

/// Split the console's comma-separated services field into names.
pub fn parse_services(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
