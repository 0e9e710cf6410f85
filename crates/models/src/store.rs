use chrono::Weekday;
use serde::{Deserialize, Deserializer, Serialize};

/// Nullable backend columns decode as the type's default instead of failing.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Postal address. The backend stores these as flat, nullable `address_*` columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "address_street", default, deserialize_with = "null_as_default")]
    pub street: String,
    #[serde(rename = "address_city", default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(rename = "address_state", default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(rename = "address_postal_code", default, deserialize_with = "null_as_default")]
    pub postal_code: String,
}

/// Opening hours for each weekday: `"HH:MM-HH:MM"`, `"closed"` or absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyHours {
    #[serde(rename = "hours_mon", default, skip_serializing_if = "Option::is_none")]
    pub mon: Option<String>,
    #[serde(rename = "hours_tue", default, skip_serializing_if = "Option::is_none")]
    pub tue: Option<String>,
    #[serde(rename = "hours_wed", default, skip_serializing_if = "Option::is_none")]
    pub wed: Option<String>,
    #[serde(rename = "hours_thu", default, skip_serializing_if = "Option::is_none")]
    pub thu: Option<String>,
    #[serde(rename = "hours_fri", default, skip_serializing_if = "Option::is_none")]
    pub fri: Option<String>,
    #[serde(rename = "hours_sat", default, skip_serializing_if = "Option::is_none")]
    pub sat: Option<String>,
    #[serde(rename = "hours_sun", default, skip_serializing_if = "Option::is_none")]
    pub sun: Option<String>,
}

impl WeeklyHours {
    /// Typical retail week: 09:00-17:00 on weekdays, closed at the weekend.
    pub fn business_week() -> Self {
        let weekday = || Some("09:00-17:00".to_string());
        Self {
            mon: weekday(),
            tue: weekday(),
            wed: weekday(),
            thu: weekday(),
            fri: weekday(),
            sat: Some("closed".to_string()),
            sun: Some("closed".to_string()),
        }
    }

    pub fn for_day(&self, day: Weekday) -> Option<&str> {
        let slot = match day {
            Weekday::Mon => &self.mon,
            Weekday::Tue => &self.tue,
            Weekday::Wed => &self.wed,
            Weekday::Thu => &self.thu,
            Weekday::Fri => &self.fri,
            Weekday::Sat => &self.sat,
            Weekday::Sun => &self.sun,
        };
        slot.as_deref()
    }

    pub fn with(mut self, day: Weekday, hours: impl Into<String>) -> Self {
        let value = Some(hours.into());
        match day {
            Weekday::Mon => self.mon = value,
            Weekday::Tue => self.tue = value,
            Weekday::Wed => self.wed = value,
            Weekday::Thu => self.thu = value,
            Weekday::Fri => self.fri = value,
            Weekday::Sat => self.sat = value,
            Weekday::Sun => self.sun = value,
        }
        self
    }
}

/// A store as returned by the search endpoint and the admin store API.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreListing {
    pub store_id: String,
    pub name: String,
    #[serde(flatten)]
    pub address: Address,
    #[serde(default, deserialize_with = "null_as_default")]
    pub latitude: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub longitude: f64,
    /// `None` when the search was not anchored to a location (nationwide).
    #[serde(rename = "distance", default, skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub store_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: Vec<String>,
    /// Lifecycle status (`active`, `inactive`, ...), not the open/closed state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub weekly_hours: WeeklyHours,
}
