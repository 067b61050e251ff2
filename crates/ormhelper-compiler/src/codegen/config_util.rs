//! Config artifact generation.
//!
//! The artifact is run by hand after generation (`bun <file>`); the generated
//! helper only calls `getDatabaseConfigFile()` to locate its output.

use std::path::Path;

use super::header;
use super::imports::{string_literal, ImportSet};
use super::ts_types::{config_file_name, config_util_class_name, CONFIG_DIR_NAME};
use crate::config::RuntimeProfile;
use crate::validate::ValidatedHelper;

pub fn generate_config_util(helper: &ValidatedHelper, runtime: &RuntimeProfile, out_dir: &Path) -> String {
    let spec = &helper.spec;
    let class_name = config_util_class_name(&spec.name);

    let mut imports = ImportSet::new();
    imports.add("node:fs", "existsSync");
    imports.add("node:fs", "mkdirSync");
    imports.add("node:fs", "writeFileSync");
    imports.add("node:path", "join");
    imports.add(&runtime.module, &runtime.config_util);
    for table in &spec.tables {
        imports.add_module(&table.module, &table.name, out_dir);
    }

    let mut output = String::new();
    output.push_str(&header(&helper.class_name));
    output.push_str(&imports.render());
    output.push('\n');

    output.push_str(&format!(
        "export class {} extends {} {{\n",
        class_name, runtime.config_util
    ));

    let tables: Vec<&str> = spec.tables.iter().map(|t| t.name.as_str()).collect();
    output.push_str(&format!(
        "  private static readonly sTableClasses = [{}];\n\n",
        tables.join(", ")
    ));

    output.push_str("  static getDatabaseConfigFile(): string {\n");
    output.push_str(&format!(
        "    const dir = join(process.cwd(), {});\n",
        string_literal(CONFIG_DIR_NAME)
    ));
    output.push_str(&format!(
        "    const file = join(dir, {});\n",
        string_literal(&config_file_name(&spec.name))
    ));
    output.push_str("    try {\n");
    output.push_str("      mkdirSync(dir, { recursive: true });\n");
    output.push_str("      if (!existsSync(file)) {\n");
    output.push_str("        writeFileSync(file, \"\");\n");
    output.push_str("      }\n");
    output.push_str("    } catch (e) {\n");
    output.push_str("      console.error(e);\n");
    output.push_str("    }\n");
    output.push_str("    return file;\n");
    output.push_str("  }\n\n");

    output.push_str("  static main(): void {\n");
    output.push_str(&format!(
        "    {}.writeConfigFile({}.getDatabaseConfigFile(), {}.sTableClasses);\n",
        class_name, class_name, class_name
    ));
    output.push_str("  }\n");
    output.push_str("}\n\n");

    output.push_str("if (import.meta.main) {\n");
    output.push_str(&format!("  {}.main();\n", class_name));
    output.push_str("}\n");

    output
}
