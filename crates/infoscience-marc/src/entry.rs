//! Bibliographic entries and the builder that accumulates them field by field.

use std::collections::HashMap;
use std::fmt;

use crate::{MarcError, MissingField};

/// Entries keyed by record identifier.
pub type Collection = HashMap<u64, Entry>;

/// An author name as written in field 700 (`"Last, First"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Author {
    pub last: String,
    pub first: String,
}

impl Author {
    pub fn new(last: impl Into<String>, first: impl Into<String>) -> Self {
        Self {
            last: last.into(),
            first: first.into(),
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.last, self.first)
    }
}

/// A fully populated publication record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: u64,
    /// Main title, followed by `": "` and the subtitle when one is present.
    pub title: String,
    /// Authors in document order.
    pub authors: Vec<Author>,
    /// Conference name, place and date; `None` for journal articles.
    pub venue: Option<String>,
    pub paperurl: Option<String>,
    pub year: i32,
}

/// Accumulates subfield values for a single record before validation.
#[derive(Debug, Clone, Default)]
pub struct EntryBuilder {
    pub id: u64,
    pub title: Option<String>,
    pub authors: Vec<Author>,
    pub venue: Option<String>,
    pub paperurl: Option<String>,
    pub year: Option<i32>,
}

impl EntryBuilder {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Check that year, title and authors were all set.
    ///
    /// A year of `0` counts as missing, as does an empty title.
    pub fn build(self) -> Result<Entry, MarcError> {
        let missing = |missing| MarcError::Validation {
            id: self.id,
            missing,
        };

        let year = match self.year {
            Some(year) if year != 0 => year,
            _ => return Err(missing(MissingField::Year)),
        };
        let title = match self.title {
            Some(ref title) if !title.is_empty() => title.clone(),
            _ => return Err(missing(MissingField::Title)),
        };
        if self.authors.is_empty() {
            return Err(missing(MissingField::Authors));
        }

        Ok(Entry {
            id: self.id,
            title,
            authors: self.authors,
            venue: self.venue,
            paperurl: self.paperurl,
            year,
        })
    }
}
