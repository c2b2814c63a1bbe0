//! MARC-XML ingestion for Infoscience publication exports.
//!
//! Maps the MARC-XML records of a library export onto flat publication
//! [`Entry`]s (title, authors, venue, year, paper URL), deduplicated by
//! record identifier in a caller-owned [`Collection`].
//!
//! ```no_run
//! use infoscience_marc::{Collection, InfoscienceParser};
//!
//! let mut collection = Collection::new();
//! let xml = std::fs::read_to_string("export.xml")?;
//! let added = InfoscienceParser::new(&mut collection).parse_xml(&xml)?;
//! println!("{added} new entries");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod entry;
pub mod fields;
mod parser;
pub mod xml_parser;

use std::fmt;
use std::path::Path;

use thiserror::Error;

pub use entry::{Author, Collection, Entry, EntryBuilder};
pub use parser::{InfoscienceParser, record_id};

/// A field an entry cannot do without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Year,
    Title,
    Authors,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingField::Year => "year",
            MissingField::Title => "title",
            MissingField::Authors => "authors",
        })
    }
}

#[derive(Error, Debug)]
pub enum MarcError {
    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },
    #[error("record has no control field")]
    MissingControlField,
    #[error("invalid record id {value:?}")]
    InvalidId { value: String },
    #[error("invalid datafield tag {tag:?}")]
    InvalidTag { tag: String },
    #[error("record {id}: invalid publication year {value:?}")]
    InvalidYear { id: u64, value: String },
    #[error("record {id}: malformed author {value:?}, expected \"Last, First\"")]
    MalformedAuthor { id: u64, value: String },
    #[error("record {id}: subfield {tag}${code} before its main subfield")]
    OutOfOrderSubfield { id: u64, tag: u16, code: String },
    #[error("record {id}: no publication {missing}")]
    Validation { id: u64, missing: MissingField },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse `data` into `collection`, returning the number of new entries.
pub fn parse_xml(collection: &mut Collection, data: &str) -> Result<usize, MarcError> {
    InfoscienceParser::new(collection).parse_xml(data)
}

/// Parse a MARC-XML export file into `collection`.
pub fn parse_file(collection: &mut Collection, path: &Path) -> Result<usize, MarcError> {
    InfoscienceParser::new(collection).parse_file(path)
}
