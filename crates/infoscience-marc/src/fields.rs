//! Data field dispatch.
//!
//! Each supported MARC tag maps to a [`FieldKind`]; each kind reads the
//! subfield codes it understands and ignores the rest. Unknown tags are
//! skipped so that new fields in the export never break ingestion.

use std::num::IntErrorKind;

use crate::MarcError;
use crate::entry::{Author, EntryBuilder};
use crate::xml_parser::{DataField, Subfield};

/// Visibility value of `856$x` for openly accessible files.
pub const PUBLIC_VISIBILITY: &str = "PUBLIC";

/// The data fields an entry is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 245: title statement
    Title,
    /// 260: publication place, publisher, year
    Publication,
    /// 700: added author
    Author,
    /// 711: meeting name
    Conference,
    /// 773: host item (journal); nothing is extracted
    Journal,
    /// 856: electronic location
    PaperUrl,
}

impl FieldKind {
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            245 => Some(FieldKind::Title),
            260 => Some(FieldKind::Publication),
            700 => Some(FieldKind::Author),
            711 => Some(FieldKind::Conference),
            773 => Some(FieldKind::Journal),
            856 => Some(FieldKind::PaperUrl),
            _ => None,
        }
    }

    pub fn tag(self) -> u16 {
        match self {
            FieldKind::Title => 245,
            FieldKind::Publication => 260,
            FieldKind::Author => 700,
            FieldKind::Conference => 711,
            FieldKind::Journal => 773,
            FieldKind::PaperUrl => 856,
        }
    }
}

/// Resolve a raw `tag` attribute to the field it describes.
///
/// Any integer is a valid tag, including negative or overlong ones, and
/// maps to `None` unless it is one of the handled fields. Surrounding
/// whitespace is ignored; anything that is not an integer is an error.
pub fn field_kind(raw: &str) -> Result<Option<FieldKind>, MarcError> {
    match raw.trim().parse::<i64>() {
        Ok(tag) => Ok(u16::try_from(tag).ok().and_then(FieldKind::from_tag)),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            Ok(None)
        }
        Err(_) => Err(MarcError::InvalidTag {
            tag: raw.to_string(),
        }),
    }
}

/// Apply every subfield of `field` to the entry under construction.
pub fn apply(field: &DataField, entry: &mut EntryBuilder) -> Result<(), MarcError> {
    let Some(kind) = field_kind(&field.tag)? else {
        return Ok(());
    };

    for subfield in &field.subfields {
        match kind {
            FieldKind::Title => title_subfield(subfield, entry)?,
            FieldKind::Publication => publication_subfield(subfield, entry)?,
            FieldKind::Author => author_subfield(subfield, entry)?,
            FieldKind::Conference => conference_subfield(subfield, entry)?,
            FieldKind::Journal => {}
            FieldKind::PaperUrl => url_subfield(subfield, entry),
        }
    }
    Ok(())
}

fn out_of_order(id: u64, kind: FieldKind, code: &str) -> MarcError {
    MarcError::OutOfOrderSubfield {
        id,
        tag: kind.tag(),
        code: code.to_string(),
    }
}

fn title_subfield(subfield: &Subfield, entry: &mut EntryBuilder) -> Result<(), MarcError> {
    let id = entry.id;
    match subfield.code.as_str() {
        "a" => entry.title = Some(subfield.value.clone()),
        "b" => {
            let Some(title) = entry.title.as_mut() else {
                return Err(out_of_order(id, FieldKind::Title, "b"));
            };
            title.push_str(": ");
            title.push_str(&subfield.value);
        }
        _ => {}
    }
    Ok(())
}

fn publication_subfield(subfield: &Subfield, entry: &mut EntryBuilder) -> Result<(), MarcError> {
    // $a place and $b publisher are not kept
    if subfield.code == "c" {
        let year = subfield
            .value
            .trim()
            .parse()
            .map_err(|_| MarcError::InvalidYear {
                id: entry.id,
                value: subfield.value.clone(),
            })?;
        entry.year = Some(year);
    }
    Ok(())
}

fn author_subfield(subfield: &Subfield, entry: &mut EntryBuilder) -> Result<(), MarcError> {
    if subfield.code == "a" {
        let mut parts = subfield.value.split(',');
        let last = parts.next().unwrap_or_default();
        let Some(first) = parts.next() else {
            return Err(MarcError::MalformedAuthor {
                id: entry.id,
                value: subfield.value.clone(),
            });
        };
        entry.authors.push(Author::new(last.trim(), first.trim()));
    }
    Ok(())
}

fn conference_subfield(subfield: &Subfield, entry: &mut EntryBuilder) -> Result<(), MarcError> {
    let id = entry.id;
    match subfield.code.as_str() {
        "a" => entry.venue = Some(subfield.value.clone()),
        code @ ("c" | "d") => {
            let Some(venue) = entry.venue.as_mut() else {
                return Err(out_of_order(id, FieldKind::Conference, code));
            };
            venue.push_str(", ");
            venue.push_str(&subfield.value);
        }
        _ => {}
    }
    Ok(())
}

fn url_subfield(subfield: &Subfield, entry: &mut EntryBuilder) {
    match subfield.code.as_str() {
        "x" if subfield.value != PUBLIC_VISIBILITY => {
            tracing::warn!(
                id = entry.id,
                visibility = %subfield.value,
                "Non-public URL for entry {}",
                entry.id
            );
        }
        "u" => entry.paperurl = Some(subfield.value.clone()),
        _ => {}
    }
}
