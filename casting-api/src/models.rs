//! The records the agency manages and the request bodies that shape
//! them

use serde::{Deserialize, Serialize};
use time::Date;

/// Release dates travel as `YYYY-MM-DD` strings.
pub mod date_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::FormatItem;
    use time::macros::format_description;
    use time::Date;

    const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let s = date.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// An actor on the agency's roster
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub name: String,
    pub gender: String,
    pub age: i64,
}

/// A movie in the agency's catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(with = "date_format")]
    pub release_date: Date,
}

/// The body of an actor creation request
///
/// All fields are required, but each is validated separately so the
/// caller learns which one is missing.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewActor {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
}

/// The body of an actor update request; absent fields keep their
/// current value
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ActorPatch {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
}

impl ActorPatch {
    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.gender.is_none()
    }
}

/// The body of a movie creation request
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewMovie {
    pub title: Option<String>,
    #[serde(default, with = "option_date_format")]
    pub release_date: Option<Date>,
}

/// The body of a movie update request; absent fields keep their
/// current value
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MoviePatch {
    pub title: Option<String>,
    #[serde(default, with = "option_date_format")]
    pub release_date: Option<Date>,
}

impl MoviePatch {
    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.release_date.is_none()
    }
}

mod option_date_format {
    use serde::{Deserialize, Deserializer};
    use time::Date;

    #[derive(Deserialize)]
    #[serde(transparent)]
    struct Wrapper(#[serde(with = "super::date_format")] Date);

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
    }
}
