//! Import statements of a generated module.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::ts_types::module_specifier;
use crate::ir::{ImportRequest, ModuleRef};

/// Imports grouped by module specifier, rendered in a stable order.
#[derive(Debug, Default)]
pub struct ImportSet {
    /// specifier -> (exported name, local name); `*` marks a namespace import.
    modules: BTreeMap<String, BTreeSet<(String, String)>>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Imports `name` from `specifier` under its own name.
    pub fn add(&mut self, specifier: &str, name: &str) {
        self.add_as(specifier, name, name);
    }

    pub fn add_as(&mut self, specifier: &str, exported: &str, local: &str) {
        self.modules
            .entry(specifier.to_string())
            .or_default()
            .insert((exported.to_string(), local.to_string()));
    }

    /// Imports `name` from a scanned module or package, relative to `out_dir`.
    pub fn add_module(&mut self, module: &ModuleRef, name: &str, out_dir: &Path) {
        self.add(&module_specifier(module, out_dir), name);
    }

    pub fn add_request(&mut self, request: &ImportRequest, out_dir: &Path) {
        self.add_as(&module_specifier(&request.module, out_dir), &request.exported, &request.local);
    }

    pub fn render(&self) -> String {
        let mut output = String::new();
        for (specifier, names) in &self.modules {
            let mut named = Vec::new();
            for (exported, local) in names {
                if exported == "*" {
                    output.push_str(&format!("import * as {} from {};\n", local, string_literal(specifier)));
                } else if exported == local {
                    named.push(local.clone());
                } else {
                    named.push(format!("{} as {}", exported, local));
                }
            }
            if !named.is_empty() {
                output.push_str(&format!(
                    "import {{ {} }} from {};\n",
                    named.join(", "),
                    string_literal(specifier)
                ));
            }
        }
        output
    }
}

/// Renders `value` as a double-quoted TypeScript string literal.
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_render_groups_and_orders() {
        let mut imports = ImportSet::new();
        imports.add("@ormhelper/runtime", "TableUtils");
        imports.add("@ormhelper/runtime", "Dao");
        imports.add_module(&ModuleRef::File(PathBuf::from("/app/db/question")), "Question", Path::new("/app/gen"));
        imports.add_as("./ids", "Uuid", "Id");
        imports.add_as("@acme/keys", "*", "keys");
        imports.add("@ormhelper/runtime", "Dao");

        assert_eq!(
            imports.render(),
            concat!(
                "import { Question } from \"../db/question\";\n",
                "import { Uuid as Id } from \"./ids\";\n",
                "import * as keys from \"@acme/keys\";\n",
                "import { Dao, TableUtils } from \"@ormhelper/runtime\";\n",
            )
        );
    }

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal(r#"a"b\c"#), r#""a\"b\\c""#);
    }
}
