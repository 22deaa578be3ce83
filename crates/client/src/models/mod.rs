//! Data model returned by and sent to the REST backend.
//!
//! These types are strict: optional fields are `Option`, never a display
//! fallback. Fallbacks live in [`crate::display`].

mod food;
mod order;
mod user;

pub use food::{ALL_CATEGORIES, Food, FoodDraft, FoodUpdate, MenuFilter, categories};
pub use order::{EnrichedLine, Order, OrderFilter, OrderItem, delivered_revenue};
pub use user::{RegistrationForm, User, UserProfile};

pub(crate) mod timestamp {
    //! Backend timestamps arrive either as RFC 3339 or as a zone-less local
    //! date-time (`2025-03-01T12:30:00.123`). Zone-less values are read as UTC.

    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    /// Deserialize an optional, leniently formatted timestamp. Unparseable
    /// values become `None` rather than failing the whole record.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

}
