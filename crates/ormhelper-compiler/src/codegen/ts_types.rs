//! Names and paths of generated TypeScript declarations.

use std::path::Path;

use crate::ir::ModuleRef;

/// Strips every character outside `[A-Za-z0-9]` and upper-cases the first
/// remaining one. Returns an empty string when nothing remains.
pub fn sanitize_db_name(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// `customer` -> `CustomerDatabaseHelper`.
pub fn helper_class_name(db_name: &str) -> String {
    format!("{}DatabaseHelper", sanitize_db_name(db_name))
}

/// `customer` -> `CustomerDatabaseConfigUtil`.
pub fn config_util_class_name(db_name: &str) -> String {
    format!("{}DatabaseConfigUtil", sanitize_db_name(db_name))
}

/// Database file passed to the base helper: the raw name plus `.db`.
pub fn database_file_name(db_name: &str) -> String {
    format!("{}.db", db_name)
}

/// Directory the config util writes into, relative to the working directory.
pub const CONFIG_DIR_NAME: &str = "db_config";

/// Config file written by the config util: the raw name plus `_config.txt`.
pub fn config_file_name(db_name: &str) -> String {
    format!("{}_config.txt", db_name)
}

/// Cached accessor field for a table: `Question` -> `mQuestionDao`.
pub fn dao_field_name(table: &str) -> String {
    format!("m{}Dao", table)
}

/// Accessor getter for a table: `Question` -> `getQuestionDao`.
pub fn dao_getter_name(table: &str) -> String {
    format!("get{}Dao", table)
}

/// Module specifier a generated file in `out_dir` uses to import `module`.
pub fn module_specifier(module: &ModuleRef, out_dir: &Path) -> String {
    match module {
        ModuleRef::Package(name) => name.clone(),
        ModuleRef::File(path) => {
            let relative = pathdiff::diff_paths(path, out_dir).unwrap_or_else(|| path.clone());
            let specifier = relative.to_string_lossy().replace('\\', "/");
            if specifier.starts_with("../") || specifier.starts_with("./") {
                specifier
            } else {
                format!("./{}", specifier)
            }
        }
    }
}
