//! TypeScript code generation from validated helpers.
//!
//! Each helper yields a `<Name>DatabaseHelper` module and, when requested, a
//! `<Name>DatabaseConfigUtil` module. Output depends only on the validated
//! input, so a rerun over unchanged sources is byte-identical.

pub mod imports;
pub mod ts_types;
mod config_util;
mod helper;

use std::path::Path;

use crate::config::RuntimeProfile;
use crate::validate::ValidatedHelper;
use ts_types::{config_util_class_name, helper_class_name};

pub use config_util::generate_config_util;
pub use helper::generate_helper;

/// One generated module.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    /// File name relative to the output directory.
    pub file_name: String,
    pub class_name: String,
    /// Raw name of the helper the file belongs to.
    pub helper: String,
    pub content: String,
}

/// Generated TypeScript code.
#[derive(Debug, Default)]
pub struct GeneratedCode {
    pub files: Vec<GeneratedFile>,
}

/// Generates every module for the given helpers, in helper order.
///
/// `out_dir` must be absolute; imports of scanned sources are made relative to it.
pub fn generate(helpers: &[ValidatedHelper], runtime: &RuntimeProfile, out_dir: &Path) -> GeneratedCode {
    let mut files = Vec::new();

    for helper in helpers {
        let name = &helper.spec.name;

        let class_name = helper_class_name(name);
        files.push(GeneratedFile {
            file_name: format!("{}.ts", class_name),
            class_name,
            helper: name.clone(),
            content: generate_helper(helper, runtime, out_dir),
        });

        if helper.spec.with_config_util {
            let class_name = config_util_class_name(name);
            files.push(GeneratedFile {
                file_name: format!("{}.ts", class_name),
                class_name,
                helper: name.clone(),
                content: generate_config_util(helper, runtime, out_dir),
            });
        }
    }

    GeneratedCode { files }
}

/// First lines of every generated module.
pub(crate) fn header(source_class: &str) -> String {
    format!(
        "// Generated by ormhelper from {}. Do not edit.\n\n",
        source_class
    )
}
