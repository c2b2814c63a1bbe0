use std::io::Write;
use std::path::Path;

use infoscience_marc::{Collection, Entry};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print how many new entries one export file contributed.
pub fn print_import_result(
    w: &mut dyn Write,
    path: &Path,
    added: usize,
    total: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    let line = format!(
        "{}: {} new entries ({} total)",
        path.display(),
        added,
        total
    );
    if color.enabled() && added == 0 {
        writeln!(w, "{}", line.dimmed())
    } else if color.enabled() {
        writeln!(w, "{}", line.green())
    } else {
        writeln!(w, "{}", line)
    }
}

/// Print one entry as an indented block.
pub fn print_entry(w: &mut dyn Write, entry: &Entry, color: ColorMode) -> std::io::Result<()> {
    let heading = format!("[{}] {} ({})", entry.id, entry.title, entry.year);
    if color.enabled() {
        writeln!(w, "{}", heading.bold())?;
    } else {
        writeln!(w, "{}", heading)?;
    }

    let authors = entry
        .authors
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    writeln!(w, "    Authors: {}", authors)?;

    if let Some(ref venue) = entry.venue {
        writeln!(w, "    Venue:   {}", venue)?;
    }
    if let Some(ref url) = entry.paperurl {
        if color.enabled() {
            writeln!(w, "    URL:     {}", url.cyan())?;
        } else {
            writeln!(w, "    URL:     {}", url)?;
        }
    }
    Ok(())
}

/// Print every entry of the collection, ordered by id.
pub fn print_collection(
    w: &mut dyn Write,
    collection: &Collection,
    color: ColorMode,
) -> std::io::Result<()> {
    let mut entries: Vec<&Entry> = collection.values().collect();
    entries.sort_by_key(|e| e.id);

    for entry in entries {
        print_entry(w, entry, color)?;
    }
    writeln!(w)?;
    writeln!(w, "{} entries", collection.len())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use infoscience_marc::Author;

    fn entry(id: u64, venue: Option<&str>) -> Entry {
        Entry {
            id,
            title: format!("Paper {id}"),
            authors: vec![Author::new("Doe", "Jane"), Author::new("Smith", "John")],
            venue: venue.map(str::to_string),
            paperurl: None,
            year: 2020,
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn entry_plain_output() {
        let out = render(|w| print_entry(w, &entry(5, Some("ICML, Vienna, 2023")), ColorMode(false)));
        assert_eq!(
            out,
            "[5] Paper 5 (2020)\n    Authors: Doe, Jane; Smith, John\n    Venue:   ICML, Vienna, 2023\n"
        );
    }

    #[test]
    fn collection_sorted_by_id() {
        let mut collection = Collection::new();
        collection.insert(9, entry(9, None));
        collection.insert(2, entry(2, None));

        let out = render(|w| print_collection(w, &collection, ColorMode(false)));

        let first = out.find("[2]").unwrap();
        let second = out.find("[9]").unwrap();
        assert!(first < second);
        assert!(out.ends_with("2 entries\n"));
    }

    #[test]
    fn import_result_plain() {
        let out = render(|w| {
            print_import_result(w, Path::new("export.xml"), 3, 10, ColorMode(false))
        });
        assert_eq!(out, "export.xml: 3 new entries (10 total)\n");
    }
}
