//! Record handling and the top-level ingestion driver.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::MarcError;
use crate::entry::{Collection, Entry, EntryBuilder};
use crate::fields;
use crate::xml_parser::{self, MarcRecord};

/// Parse the record identifier from the record's first control field.
pub fn record_id(record: &MarcRecord) -> Result<u64, MarcError> {
    let raw = record
        .first_control_value()
        .ok_or(MarcError::MissingControlField)?;
    raw.trim().parse().map_err(|_| MarcError::InvalidId {
        value: raw.to_string(),
    })
}

/// Ingests MARC-XML exports into a caller-owned [`Collection`].
///
/// Each call to [`parse_xml`](Self::parse_xml) either succeeds and commits
/// all of the document's new entries, or fails and leaves the collection
/// untouched.
pub struct InfoscienceParser<'c> {
    collection: &'c mut Collection,
}

impl<'c> InfoscienceParser<'c> {
    pub fn new(collection: &'c mut Collection) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &Collection {
        self.collection
    }

    /// Parse a MARC-XML document and add every record whose id is not yet
    /// known. Returns the number of entries added by this call.
    pub fn parse_xml(&mut self, data: &str) -> Result<usize, MarcError> {
        let records = xml_parser::parse_records(data)?;

        let mut added = 0;
        let mut staged: HashMap<u64, Entry> = HashMap::new();

        for record in &records {
            if let Some(entry) = self.handle_record(record, &staged)? {
                staged.insert(entry.id, entry);
                added += 1;
            }
        }

        tracing::debug!(
            records = records.len(),
            added,
            skipped = records.len() - added,
            "parsed MARC-XML document"
        );

        self.collection.extend(staged);
        Ok(added)
    }

    /// Read `reader` to the end and parse it as a MARC-XML document.
    pub fn parse_reader<R: Read>(&mut self, mut reader: R) -> Result<usize, MarcError> {
        let mut data = String::new();
        reader.read_to_string(&mut data)?;
        self.parse_xml(&data)
    }

    /// Parse a MARC-XML export file.
    pub fn parse_file(&mut self, path: &Path) -> Result<usize, MarcError> {
        let data = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "read MARC-XML export");
        self.parse_xml(&data)
    }

    /// Build the entry for `record`, or `None` if its id was already seen.
    fn handle_record(
        &self,
        record: &MarcRecord,
        staged: &HashMap<u64, Entry>,
    ) -> Result<Option<Entry>, MarcError> {
        let id = record_id(record)?;

        if self.collection.contains_key(&id) || staged.contains_key(&id) {
            tracing::debug!(id, "skipping duplicate record");
            return Ok(None);
        }

        let mut entry = EntryBuilder::new(id);
        for field in &record.data_fields {
            fields::apply(field, &mut entry)?;
        }

        entry.build().map(Some)
    }
}
