//! Movie records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One movie in the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInfo {
    /// Identifier, assigned by the repository on first save when absent
    #[serde(rename = "movieInfoId", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Title
    pub name: String,
    /// Year of release
    pub year: i32,
    /// Cast members, in billing order
    pub cast: Vec<String>,
    /// Date of release
    pub release_date: NaiveDate,
}

impl MovieInfo {
    /// Create a record without an id
    #[must_use]
    pub fn new<S>(name: impl Into<String>, year: i32, cast: impl IntoIterator<Item = S>, release_date: NaiveDate) -> Self
    where
        S: Into<String>,
    {
        Self {
            id: None,
            name: name.into(),
            year,
            cast: cast.into_iter().map(Into::into).collect(),
            release_date,
        }
    }

    /// Set the id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// This record's id with every other field taken from `updated`
    #[must_use]
    pub fn overwritten_by(self, updated: &Self) -> Self {
        Self {
            id: self.id,
            name: updated.name.clone(),
            year: updated.year,
            cast: updated.cast.clone(),
            release_date: updated.release_date,
        }
    }
}
