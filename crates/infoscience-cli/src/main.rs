use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use infoscience_marc::{Collection, InfoscienceParser};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod config_file;
mod output;

use config_file::ConfigFile;
use output::ColorMode;

/// Infoscience importer - Build publication entries from MARC-XML exports
#[derive(Parser, Debug)]
#[command(name = "infoscience", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import one or more MARC-XML exports and list the resulting entries
    Import {
        /// Export files, read in order into one collection
        files: Vec<PathBuf>,

        /// Only print per-file counts, not the entries
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print a single entry from an export
    Show {
        /// Path to the MARC-XML export
        file: PathBuf,

        /// Record identifier
        id: u64,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("infoscience={level},infoscience_marc={level}").into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = config_file::load_config();

    // Resolve configuration: CLI flags > env vars > config file > defaults
    let level = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("INFOSCIENCE_LOG_LEVEL").ok())
        .or_else(|| config.log_level().map(str::to_string))
        .unwrap_or_else(|| "warn".to_string());
    init_tracing(&level);

    let use_color = !cli.no_color
        && std::env::var_os("NO_COLOR").is_none()
        && config.color().unwrap_or(true);
    let color = ColorMode(use_color);

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Import { files, quiet } => import(&mut stdout, files, quiet, &config, color),
        Command::Show { file, id } => show(&mut stdout, file, id, color),
    }
}

fn import(
    w: &mut dyn Write,
    files: Vec<PathBuf>,
    quiet: bool,
    config: &ConfigFile,
    color: ColorMode,
) -> anyhow::Result<()> {
    let files = if files.is_empty() {
        config.import_paths()
    } else {
        files
    };
    if files.is_empty() {
        anyhow::bail!(
            "No export files given. Pass them as arguments or set [import] paths in .infoscience.toml"
        );
    }

    let mut collection = Collection::new();
    let mut parser = InfoscienceParser::new(&mut collection);

    for path in &files {
        let added = parser
            .parse_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to import {}: {}", path.display(), e))?;
        tracing::info!(path = %path.display(), added, "imported export file");
        output::print_import_result(w, path, added, parser.collection().len(), color)?;
    }

    if !quiet {
        writeln!(w)?;
        output::print_collection(w, &collection, color)?;
    }
    Ok(())
}

fn show(w: &mut dyn Write, file: PathBuf, id: u64, color: ColorMode) -> anyhow::Result<()> {
    let mut collection = Collection::new();
    infoscience_marc::parse_file(&mut collection, &file)
        .map_err(|e| anyhow::anyhow!("Failed to import {}: {}", file.display(), e))?;

    let Some(entry) = collection.get(&id) else {
        anyhow::bail!("No entry with id {} in {}", id, file.display());
    };
    output::print_entry(w, entry, color)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"<collection>
<record>
  <controlfield>12</controlfield>
  <datafield tag="245"><subfield code="a">Fast Graphs</subfield></datafield>
  <datafield tag="260"><subfield code="c">2023</subfield></datafield>
  <datafield tag="700"><subfield code="a">Doe, Jane</subfield></datafield>
</record>
</collection>"#;

    #[test]
    fn parses_import_with_files() {
        let cli = Cli::try_parse_from(["infoscience", "import", "a.xml", "b.xml", "--quiet"]).unwrap();
        match cli.command {
            Command::Import { files, quiet } => {
                assert_eq!(files, vec![PathBuf::from("a.xml"), PathBuf::from("b.xml")]);
                assert!(quiet);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(!cli.no_color);
    }

    #[test]
    fn parses_show_with_global_flags() {
        let cli = Cli::try_parse_from([
            "infoscience",
            "show",
            "export.xml",
            "182035",
            "--no-color",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(cli.no_color);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Show { id: 182035, .. }));
    }

    #[test]
    fn show_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["infoscience", "show", "export.xml", "abc"]).is_err());
    }

    #[test]
    fn import_counts_repeated_files_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.xml");
        std::fs::write(&path, EXPORT).unwrap();

        let mut out = Vec::new();
        import(
            &mut out,
            vec![path.clone(), path],
            true,
            &ConfigFile::default(),
            ColorMode(false),
        )
        .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(": 1 new entries (1 total)"));
        assert!(out.contains(": 0 new entries (1 total)"));
    }

    #[test]
    fn import_without_files_fails() {
        let mut out = Vec::new();
        let err = import(&mut out, vec![], false, &ConfigFile::default(), ColorMode(false))
            .unwrap_err();
        assert!(err.to_string().contains("No export files"));
    }

    #[test]
    fn show_unknown_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.xml");
        std::fs::write(&path, EXPORT).unwrap();

        let mut out = Vec::new();
        assert!(show(&mut out, path.clone(), 99, ColorMode(false)).is_err());
        show(&mut out, path, 12, ColorMode(false)).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("[12] Fast Graphs (2023)"));
    }
}
