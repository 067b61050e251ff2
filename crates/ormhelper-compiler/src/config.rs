//! Generator configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::diagnostic::CompilerError;

/// Name of the optional project configuration file.
pub const CONFIG_FILE_NAME: &str = "ormhelper.toml";

/// Configuration for the ormhelper generator.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Directory containing the decorated table and helper sources.
    pub source_dir: PathBuf,

    /// Directory to write generated helper classes.
    pub out_dir: PathBuf,

    /// Source language (default: "typescript").
    pub language: String,

    /// Storage runtime the generated code calls into.
    pub runtime: RuntimeProfile,

    /// Also echo every generated unit to stdout.
    pub echo: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src/db"),
            out_dir: PathBuf::from("src/generated"),
            language: "typescript".to_string(),
            runtime: RuntimeProfile::default(),
            echo: false,
        }
    }
}

impl CompilerConfig {
    /// Loads `ormhelper.toml` from `path`, falling back to defaults for
    /// every key the file leaves out. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| CompilerError::io(path, e.to_string()))?;
        Self::from_toml(&text, path)
    }

    /// Parses configuration text. `origin` is only used for error reporting.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, CompilerError> {
        let file: ConfigFile = toml::from_str(text).map_err(|e| CompilerError::InvalidConfig {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;

        let defaults = Self::default();
        Ok(Self {
            source_dir: file.source_dir.unwrap_or(defaults.source_dir),
            out_dir: file.out_dir.unwrap_or(defaults.out_dir),
            language: file.language.unwrap_or(defaults.language),
            runtime: file.runtime.unwrap_or_default(),
            echo: defaults.echo,
        })
    }
}

/// On-disk shape of `ormhelper.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    source_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    language: Option<String>,
    runtime: Option<RuntimeProfile>,
}

/// Names exported by the storage runtime module.
///
/// Generated helpers extend the runtime's base helper and call its table
/// utilities; upgrade routines are checked against the database handle and
/// connection source types by exact identity (module + exported name).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
pub struct RuntimeProfile {
    pub module: String,
    pub context: String,
    pub database: String,
    pub connection_source: String,
    pub open_helper: String,
    pub dao: String,
    pub table_utils: String,
    pub log: String,
    pub config_util: String,
}

impl Default for RuntimeProfile {
    fn default() -> Self {
        Self {
            module: "@ormhelper/runtime".to_string(),
            context: "Context".to_string(),
            database: "SQLiteDatabase".to_string(),
            connection_source: "ConnectionSource".to_string(),
            open_helper: "OrmLiteSqliteOpenHelper".to_string(),
            dao: "Dao".to_string(),
            table_utils: "TableUtils".to_string(),
            log: "Log".to_string(),
            config_util: "OrmLiteConfigUtil".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let config = CompilerConfig::load(Path::new("/nonexistent/ormhelper.toml")).unwrap();
        assert_eq!(config.language, "typescript");
        assert_eq!(config.runtime, RuntimeProfile::default());
    }

    #[test]
    fn partial_runtime_table_keeps_other_defaults() {
        let text = r#"
source_dir = "app/db"

[runtime]
module = "@acme/orm"
database = "Database"
"#;
        let config = CompilerConfig::from_toml(text, Path::new(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.source_dir, PathBuf::from("app/db"));
        assert_eq!(config.out_dir, PathBuf::from("src/generated"));
        assert_eq!(config.runtime.module, "@acme/orm");
        assert_eq!(config.runtime.database, "Database");
        assert_eq!(config.runtime.connection_source, "ConnectionSource");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CompilerConfig::from_toml("outdir = \"x\"", Path::new(CONFIG_FILE_NAME)).unwrap_err();
        assert!(matches!(err, CompilerError::InvalidConfig { .. }));
    }
}
