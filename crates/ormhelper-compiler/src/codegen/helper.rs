//! Access-layer class generation.

use std::path::Path;

use super::imports::{string_literal, ImportSet};
use super::ts_types::{
    config_util_class_name, dao_field_name, dao_getter_name, database_file_name, helper_class_name,
};
use super::header;
use crate::config::RuntimeProfile;
use crate::schema::{FromVersion, MigrationStrategy, PlannedStep, TableSpec};
use crate::validate::ValidatedHelper;

const CREATE_FAILED: &str = "Can't create database tables.";
const CLEAR_FAILED: &str = "Can't clear database tables.";
const DROP_FAILED: &str = "Can't drop database tables.";

/// Generates the `<Name>DatabaseHelper` module for a validated helper.
pub fn generate_helper(helper: &ValidatedHelper, runtime: &RuntimeProfile, out_dir: &Path) -> String {
    let spec = &helper.spec;
    let class_name = helper_class_name(&spec.name);
    let drop = matches!(helper.migration, MigrationStrategy::DropAndRecreate);

    let mut imports = ImportSet::new();
    for name in [
        &runtime.context,
        &runtime.database,
        &runtime.connection_source,
        &runtime.open_helper,
        &runtime.log,
    ] {
        imports.add(&runtime.module, name);
    }
    if !spec.tables.is_empty() {
        imports.add(&runtime.module, &runtime.dao);
        imports.add(&runtime.module, &runtime.table_utils);
    }
    for table in &spec.tables {
        imports.add_module(&table.module, &table.name, out_dir);
        for request in table.id_type.imports() {
            imports.add_request(request, out_dir);
        }
    }
    if let Some(plan) = helper.migration.plan() {
        if !plan.is_empty() {
            imports.add_module(&helper.class_module, &helper.class_name, out_dir);
        }
    }
    if spec.with_config_util {
        let util = config_util_class_name(&spec.name);
        imports.add(&format!("./{}", util), &util);
    }

    let mut output = String::new();
    output.push_str(&header(&helper.class_name));
    output.push_str(&imports.render());
    output.push('\n');

    output.push_str(&format!(
        "export class {} extends {} {{\n",
        class_name, runtime.open_helper
    ));

    // Accessor fields
    for table in &spec.tables {
        output.push_str(&format!(
            "  private {}: {} | null = null;\n",
            dao_field_name(&table.name),
            dao_type(table, runtime)
        ));
    }
    if !spec.tables.is_empty() {
        output.push('\n');
    }

    generate_constructor(&mut output, helper, runtime);
    output.push('\n');
    generate_on_create(&mut output, &class_name, &spec.tables, runtime);
    output.push('\n');
    generate_on_upgrade(&mut output, helper, runtime);
    output.push('\n');
    generate_clear_tables(&mut output, &class_name, &spec.tables, runtime);
    output.push('\n');
    if drop {
        generate_drop_tables(&mut output, &class_name, &spec.tables, runtime);
        output.push('\n');
    }
    generate_close(&mut output, &spec.tables);

    for table in &spec.tables {
        output.push('\n');
        generate_getter(&mut output, table, runtime);
    }

    output.push_str("}\n");
    output
}

fn dao_type(table: &TableSpec, runtime: &RuntimeProfile) -> String {
    format!("{}<{}, {}>", runtime.dao, table.name, table.id_type.render())
}

fn upgrade_parameters(runtime: &RuntimeProfile) -> String {
    format!(
        "database: {}, connectionSource: {}",
        runtime.database, runtime.connection_source
    )
}

fn generate_constructor(output: &mut String, helper: &ValidatedHelper, runtime: &RuntimeProfile) {
    let spec = &helper.spec;
    output.push_str(&format!("  constructor(context: {}) {{\n", runtime.context));
    if spec.with_config_util {
        output.push_str(&format!(
            "    super(context, {}, null, {}, {}.getDatabaseConfigFile());\n",
            string_literal(&database_file_name(&spec.name)),
            spec.version,
            config_util_class_name(&spec.name)
        ));
    } else {
        output.push_str(&format!(
            "    super(context, {}, null, {});\n",
            string_literal(&database_file_name(&spec.name)),
            spec.version
        ));
    }
    output.push_str("  }\n");
}

fn generate_on_create(output: &mut String, class_name: &str, tables: &[TableSpec], runtime: &RuntimeProfile) {
    output.push_str(&format!(
        "  override onCreate({}): void {{\n",
        upgrade_parameters(runtime)
    ));
    output.push_str(&format!("    {}.i({}.name, \"onCreate\");\n", runtime.log, class_name));
    output.push_str("    try {\n");
    for table in tables {
        output.push_str(&format!(
            "      {}.createTable(connectionSource, {});\n",
            runtime.table_utils, table.name
        ));
    }
    output.push_str("    } catch (e) {\n");
    output.push_str(&format!(
        "      {}.e({}.name, {}, e);\n",
        runtime.log,
        class_name,
        string_literal(CREATE_FAILED)
    ));
    output.push_str(&format!(
        "      throw new Error({}, {{ cause: e }});\n",
        string_literal(CREATE_FAILED)
    ));
    output.push_str("    }\n");
    output.push_str("  }\n");
}

fn generate_on_upgrade(output: &mut String, helper: &ValidatedHelper, runtime: &RuntimeProfile) {
    output.push_str(&format!(
        "  override onUpgrade({}, oldVersion: number, newVersion: number): void {{\n",
        upgrade_parameters(runtime)
    ));

    match &helper.migration {
        MigrationStrategy::DropAndRecreate => {
            output.push_str("    this.dropTables(database, connectionSource);\n");
            output.push_str("    this.onCreate(database, connectionSource);\n");
        }
        MigrationStrategy::Upgrade(plan) if !plan.is_empty() => {
            output.push_str(&format!("    const upgradeHelper = new {}();\n", helper.class_name));
            output.push_str("    let version = oldVersion;\n");
            for planned in &plan.steps {
                generate_upgrade_guard(output, planned);
            }
        }
        MigrationStrategy::Upgrade(_) => {}
    }

    output.push_str("  }\n");
}

/// Guards are independent `if`s so one run can hop through several steps.
fn generate_upgrade_guard(output: &mut String, planned: &PlannedStep) {
    let condition = match planned.step.from {
        FromVersion::Unset => format!("version <= {}", planned.step.to),
        FromVersion::Exact(from) => format!("version == {}", from),
    };
    output.push_str(&format!("    if ({}) {{\n", condition));
    output.push_str(&format!(
        "      upgradeHelper.{}(database, connectionSource);\n",
        planned.routine
    ));
    output.push_str(&format!("      version = {};\n", planned.step.to));
    output.push_str("    }\n");
}

fn generate_clear_tables(output: &mut String, class_name: &str, tables: &[TableSpec], runtime: &RuntimeProfile) {
    output.push_str("  clearTables(): void {\n");
    output.push_str(&format!("    {}.i({}.name, \"clearTables\");\n", runtime.log, class_name));
    output.push_str("    try {\n");
    output.push_str("      const connectionSource = this.getConnectionSource();\n");
    output.push_str("      connectionSource.getReadWriteConnection();\n");
    for table in tables {
        output.push_str(&format!(
            "      {}.clearTable(connectionSource, {});\n",
            runtime.table_utils, table.name
        ));
    }
    output.push_str("    } catch (e) {\n");
    output.push_str(&format!(
        "      {}.e({}.name, {}, e);\n",
        runtime.log,
        class_name,
        string_literal(CLEAR_FAILED)
    ));
    output.push_str("    }\n");
    output.push_str("  }\n");
}

fn generate_drop_tables(output: &mut String, class_name: &str, tables: &[TableSpec], runtime: &RuntimeProfile) {
    output.push_str(&format!(
        "  private dropTables({}): void {{\n",
        upgrade_parameters(runtime)
    ));
    output.push_str(&format!("    {}.i({}.name, \"dropTables\");\n", runtime.log, class_name));
    output.push_str("    try {\n");
    for table in tables {
        output.push_str(&format!(
            "      {}.dropTable(connectionSource, {}, true);\n",
            runtime.table_utils, table.name
        ));
    }
    output.push_str("    } catch (e) {\n");
    output.push_str(&format!(
        "      {}.e({}.name, {}, e);\n",
        runtime.log,
        class_name,
        string_literal(DROP_FAILED)
    ));
    output.push_str("    }\n");
    output.push_str("  }\n");
}

fn generate_close(output: &mut String, tables: &[TableSpec]) {
    output.push_str("  override close(): void {\n");
    output.push_str("    super.close();\n");
    for table in tables {
        output.push_str(&format!("    this.{} = null;\n", dao_field_name(&table.name)));
    }
    output.push_str("  }\n");
}

fn generate_getter(output: &mut String, table: &TableSpec, runtime: &RuntimeProfile) {
    let field = dao_field_name(&table.name);
    output.push_str(&format!(
        "  {}(): {} {{\n",
        dao_getter_name(&table.name),
        dao_type(table, runtime)
    ));
    output.push_str(&format!("    if (this.{} == null) {{\n", field));
    output.push_str(&format!("      this.{} = this.getDao({});\n", field, table.name));
    output.push_str("    }\n");
    output.push_str(&format!("    return this.{};\n", field));
    output.push_str("  }\n");
}
