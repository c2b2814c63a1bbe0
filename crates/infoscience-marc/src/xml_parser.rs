//! Reader for MARC-XML exports.
//!
//! Turns a MARC-XML document into a small tree of [`MarcRecord`]s using
//! quick-xml's event reader. The expected structure is:
//! ```xml
//! <collection xmlns="http://www.loc.gov/MARC21/slim">
//!   <record>
//!     <controlfield tag="001">123456</controlfield>
//!     <datafield tag="245" ind1=" " ind2=" ">
//!       <subfield code="a">Fast Graphs</subfield>
//!       <subfield code="b">A Survey</subfield>
//!     </datafield>
//!   </record>
//! </collection>
//! ```
//!
//! Elements are matched on their local name, so `<marc:record>` and
//! `<record>` are treated alike. Only text directly inside a control field
//! or subfield is kept; nested markup is skipped.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::MarcError;

/// A control field (`<controlfield>`), e.g. the record identifier in `001`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlField {
    /// Raw `tag` attribute. Not used for entry building, which takes the
    /// first control field whatever its tag; kept for callers inspecting
    /// the record tree.
    pub tag: Option<String>,
    pub value: String,
}

/// A coded subfield (`<subfield code="a">`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subfield {
    pub code: String,
    pub value: String,
}

/// A data field (`<datafield tag="245">`) with its subfields in document order.
///
/// `tag` is kept as raw attribute text; an absent attribute yields an empty
/// string, which the field dispatcher rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataField {
    pub tag: String,
    /// Indicators are passed through unchanged for callers inspecting the
    /// record tree; entry building ignores them.
    pub ind1: Option<String>,
    pub ind2: Option<String>,
    pub subfields: Vec<Subfield>,
}

/// One `<record>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarcRecord {
    pub control_fields: Vec<ControlField>,
    pub data_fields: Vec<DataField>,
}

impl MarcRecord {
    /// Text of the first control field, if the record has one.
    pub fn first_control_value(&self) -> Option<&str> {
        self.control_fields.first().map(|cf| cf.value.as_str())
    }
}

/// Which leaf element we're currently reading text for.
enum Leaf {
    Control(ControlField),
    Subfield(Subfield),
}

/// Attribute values of one element, keyed by local name.
struct ElementAttrs(Vec<(Vec<u8>, String)>);

impl ElementAttrs {
    /// Read and unescape every attribute. Unquoted values, duplicated names
    /// and bad escapes are malformed XML.
    fn read(xml: &Reader<&[u8]>, e: &BytesStart<'_>) -> Result<Self, MarcError> {
        let mut attrs = Vec::new();
        for attr in e.attributes().with_checks(true) {
            let attr = attr.map_err(|err| malformed(xml, err.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|err| malformed(xml, err.to_string()))?
                .into_owned();
            attrs.push((attr.key.local_name().as_ref().to_vec(), value));
        }
        Ok(Self(attrs))
    }

    fn get(&self, key: &[u8]) -> Option<String> {
        self.0
            .iter()
            .find(|(name, _)| name.as_slice() == key)
            .map(|(_, value)| value.clone())
    }

    fn data_field(&self) -> DataField {
        DataField {
            tag: self.get(b"tag").unwrap_or_default(),
            ind1: self.get(b"ind1"),
            ind2: self.get(b"ind2"),
            subfields: Vec::new(),
        }
    }
}

/// An error reported by quick-xml, located where it occurred.
fn xml_error(reader: &Reader<&[u8]>, message: impl Into<String>) -> MarcError {
    MarcError::Xml {
        position: reader.error_position() as u64,
        message: message.into(),
    }
}

/// A structural problem detected here, located at the end of the last event.
fn malformed(reader: &Reader<&[u8]>, message: impl Into<String>) -> MarcError {
    MarcError::Xml {
        position: reader.buffer_position() as u64,
        message: message.into(),
    }
}

/// Parse a MARC-XML document and return every record in document order.
///
/// Malformed XML (mismatched end tags, bad or undefined escapes anywhere in
/// the text, unquoted or duplicated attributes, unclosed elements, a missing
/// or repeated root element) is reported as [`MarcError::Xml`].
pub fn parse_records(data: &str) -> Result<Vec<MarcRecord>, MarcError> {
    let mut xml = Reader::from_str(data);
    xml.config_mut().trim_text(false);

    let mut records = Vec::new();

    // Element nesting, and the depth at which each open node started
    let mut depth: usize = 0;
    let mut root_closed = false;
    let mut record: Option<(MarcRecord, usize)> = None;
    let mut field: Option<(DataField, usize)> = None;
    let mut leaf: Option<(Leaf, usize)> = None;

    loop {
        let event = xml
            .read_event()
            .map_err(|e| xml_error(&xml, e.to_string()))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if depth == 0 && root_closed {
                    return Err(malformed(&xml, "junk after document element"));
                }
                let attrs = ElementAttrs::read(&xml, e)?;
                let empty = matches!(event, Event::Empty(_));
                let name = e.local_name();

                match name.as_ref() {
                    b"record" if record.is_none() => {
                        if empty {
                            records.push(MarcRecord::default());
                        } else {
                            record = Some((MarcRecord::default(), depth + 1));
                        }
                    }
                    b"controlfield" if leaf.is_none() => {
                        if let Some((rec, _)) = record.as_mut() {
                            let cf = ControlField {
                                tag: attrs.get(b"tag"),
                                value: String::new(),
                            };
                            if empty {
                                rec.control_fields.push(cf);
                            } else {
                                leaf = Some((Leaf::Control(cf), depth + 1));
                            }
                        }
                    }
                    b"datafield" if field.is_none() && leaf.is_none() => {
                        if let Some((rec, _)) = record.as_mut() {
                            if empty {
                                rec.data_fields.push(attrs.data_field());
                            } else {
                                field = Some((attrs.data_field(), depth + 1));
                            }
                        }
                    }
                    b"subfield" if leaf.is_none() => {
                        if let Some((df, _)) = field.as_mut() {
                            let sf = Subfield {
                                code: attrs.get(b"code").unwrap_or_default(),
                                value: String::new(),
                            };
                            if empty {
                                df.subfields.push(sf);
                            } else {
                                leaf = Some((Leaf::Subfield(sf), depth + 1));
                            }
                        }
                    }
                    _ => {}
                }

                if empty {
                    if depth == 0 {
                        root_closed = true;
                    }
                } else {
                    depth += 1;
                }
            }

            Event::Text(ref e) => {
                let text = e
                    .unescape()
                    .map_err(|err| malformed(&xml, err.to_string()))?;
                if let Some((leaf, at)) = leaf.as_mut()
                    && *at == depth
                {
                    match leaf {
                        Leaf::Control(cf) => cf.value.push_str(&text),
                        Leaf::Subfield(sf) => sf.value.push_str(&text),
                    }
                } else if depth == 0 && !text.chars().all(|c| c.is_ascii_whitespace()) {
                    return Err(malformed(&xml, "text outside of document element"));
                }
            }

            Event::CData(ref e) => {
                if let Some((leaf, at)) = leaf.as_mut()
                    && *at == depth
                {
                    let text = String::from_utf8_lossy(e.as_ref());
                    match leaf {
                        Leaf::Control(cf) => cf.value.push_str(&text),
                        Leaf::Subfield(sf) => sf.value.push_str(&text),
                    }
                }
            }

            Event::End(_) => {
                if leaf.as_ref().is_some_and(|(_, at)| *at == depth) {
                    match leaf.take() {
                        Some((Leaf::Control(cf), _)) => {
                            if let Some((rec, _)) = record.as_mut() {
                                rec.control_fields.push(cf);
                            }
                        }
                        Some((Leaf::Subfield(sf), _)) => {
                            if let Some((df, _)) = field.as_mut() {
                                df.subfields.push(sf);
                            }
                        }
                        None => {}
                    }
                } else if field.as_ref().is_some_and(|(_, at)| *at == depth) {
                    if let (Some((df, _)), Some((rec, _))) = (field.take(), record.as_mut()) {
                        rec.data_fields.push(df);
                    }
                } else if record.as_ref().is_some_and(|(_, at)| *at == depth) {
                    if let Some((rec, _)) = record.take() {
                        records.push(rec);
                    }
                }

                depth = depth.saturating_sub(1);
                if depth == 0 {
                    root_closed = true;
                }
            }

            Event::Eof => {
                if depth > 0 {
                    return Err(malformed(&xml, "unexpected end of document"));
                }
                if !root_closed {
                    return Err(malformed(&xml, "no element found"));
                }
                break;
            }

            _ => {}
        }
    }

    Ok(records)
}
