use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub logging: Option<LoggingConfig>,
    pub display: Option<DisplayConfig>,
    pub import: Option<ImportConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub color: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Export files read by `import` when none are given on the command line.
    pub paths: Option<Vec<String>>,
}

impl ConfigFile {
    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref()?.level.as_deref()
    }

    pub fn color(&self) -> Option<bool> {
        self.display.as_ref()?.color
    }

    pub fn import_paths(&self) -> Vec<PathBuf> {
        self.import
            .as_ref()
            .and_then(|i| i.paths.as_ref())
            .map(|paths| paths.iter().map(PathBuf::from).collect())
            .unwrap_or_default()
    }
}

/// Platform config directory path: `<config_dir>/infoscience/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("infoscience").join("config.toml"))
}

/// Load config by cascading CWD `.infoscience.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".infoscience.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Ignoring unreadable config {}: {}", path.display(), e);
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        logging: Some(LoggingConfig {
            level: overlay
                .logging
                .and_then(|l| l.level)
                .or_else(|| base.logging.and_then(|l| l.level)),
        }),
        display: Some(DisplayConfig {
            color: overlay
                .display
                .and_then(|d| d.color)
                .or_else(|| base.display.and_then(|d| d.color)),
        }),
        import: Some(ImportConfig {
            paths: overlay
                .import
                .and_then(|i| i.paths)
                .or_else(|| base.import.and_then(|i| i.paths)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_deserializes() {
        let toml_str = "[logging]\nlevel = \"debug\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.log_level(), Some("debug"));
        assert!(parsed.color().is_none());
        assert!(parsed.import_paths().is_empty());
    }

    #[test]
    fn import_paths_from_toml() {
        let toml_str = "[import]\npaths = [\"a.xml\", \"exports/b.xml\"]\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(
            parsed.import_paths(),
            vec![PathBuf::from("a.xml"), PathBuf::from("exports/b.xml")]
        );
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            logging: Some(LoggingConfig {
                level: Some("info".to_string()),
            }),
            display: Some(DisplayConfig { color: Some(true) }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            display: Some(DisplayConfig { color: Some(false) }),
            ..Default::default()
        };
        let merged = merge(base, overlay);
        assert_eq!(merged.color(), Some(false));
        assert_eq!(merged.log_level(), Some("info"));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            import: Some(ImportConfig {
                paths: Some(vec!["base.xml".to_string()]),
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.import_paths(), vec![PathBuf::from("base.xml")]);
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[display]\ncolor = false\n").unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.color(), Some(false));
    }

    #[test]
    fn load_from_path_missing_or_invalid_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("absent.toml")).is_none());

        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[display\ncolor = ").unwrap();
        assert!(load_from_path(&path).is_none());
    }
}
