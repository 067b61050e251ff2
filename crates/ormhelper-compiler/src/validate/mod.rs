//! Validation of declarations.
//!
//! Turns the IR's helper and upgrade routine declarations into validated
//! helpers ready for emission. Each helper is checked on its own: a failing
//! helper contributes diagnostics and no output, and does not stop the others.

mod helper;
mod upgrade;

pub use helper::validate_helper;
pub use upgrade::validate_upgrade_routine;

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::codegen::ts_types::{helper_class_name, sanitize_db_name};
use crate::config::RuntimeProfile;
use crate::diagnostic::{CompilerError, SourceLocation};
use crate::ir::{ClassId, ModuleRef, Program, UpgradeRoutineDecl};
use crate::schema::{MigrationStrategy, TableRegistry, TableSpec};

/// A validated helper declaration.
#[derive(Debug, Clone)]
pub struct HelperSpec {
    /// Raw database name, as declared.
    pub name: String,
    pub version: u32,
    pub tables: Vec<TableSpec>,
    pub drop_on_upgrade: bool,
    pub with_config_util: bool,
}

/// A helper ready for emission.
#[derive(Debug, Clone)]
pub struct ValidatedHelper {
    pub spec: HelperSpec,
    pub migration: MigrationStrategy,
    pub class: ClassId,
    pub class_name: String,
    pub class_module: ModuleRef,
    pub location: SourceLocation,
}

impl ValidatedHelper {
    /// Sanitized database name, the stem of every generated identifier.
    pub fn sanitized_name(&self) -> String {
        sanitize_db_name(&self.spec.name)
    }
}

/// Result of validating a whole program.
#[derive(Debug, Default)]
pub struct Validation {
    /// Valid helpers, ordered by sanitized name.
    pub helpers: Vec<ValidatedHelper>,
    pub diagnostics: Vec<CompilerError>,
}

/// Validates every helper and upgrade routine in the program.
pub fn validate_program(program: &Program, registry: &TableRegistry, runtime: &RuntimeProfile) -> Validation {
    let mut validation = Validation::default();

    let mut routines_by_class: BTreeMap<ClassId, Vec<&UpgradeRoutineDecl>> = BTreeMap::new();
    for routine in program.upgrade_routines() {
        routines_by_class.entry(routine.class).or_default().push(routine);
    }

    let helper_classes: Vec<ClassId> = program.helpers().map(|h| h.class).collect();
    for (class, routines) in &routines_by_class {
        if helper_classes.contains(class) {
            continue;
        }
        for routine in routines {
            validation.diagnostics.push(CompilerError::UpgradeOutsideHelper {
                method: routine.method.clone(),
                src: routine.location.named_source(),
                span: routine.location.source_span(),
            });
        }
    }

    // Generated class name -> helper class that claimed it first.
    let mut claimed: HashMap<String, String> = HashMap::new();

    for helper in program.helpers() {
        let class = program.class(helper.class);

        if let Some(name) = &helper.name {
            if !sanitize_db_name(&name.value).is_empty() {
                let generated = helper_class_name(&name.value);
                if let Some(first) = claimed.get(&generated) {
                    validation.diagnostics.push(CompilerError::DuplicateHelper {
                        class: class.name.clone(),
                        first: first.clone(),
                        generated,
                        src: name.location.named_source(),
                        span: name.location.source_span(),
                    });
                    continue;
                }
                claimed.insert(generated, class.name.clone());
            }
        }

        let routines = routines_by_class
            .get(&helper.class)
            .map(Vec::as_slice)
            .unwrap_or_default();

        match validate_helper(program, registry, runtime, helper, routines) {
            Ok(validated) => {
                debug!(helper = %validated.spec.name, class = %validated.class_name, "helper is valid");
                validation.helpers.push(validated);
            }
            Err(diagnostics) => validation.diagnostics.extend(diagnostics),
        }
    }

    validation
        .helpers
        .sort_by(|a, b| a.sanitized_name().cmp(&b.sanitized_name()));
    validation
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::frontend::typescript::{parser::TypeScriptParser, to_ir::to_ir};
    use crate::schema::{FromVersion, UpgradeStep};

    const RUNTIME_IMPORTS: &str = r#"
import { DatabaseTable, DatabaseField, Helper, OnUpgrade, SQLiteDatabase, ConnectionSource } from "@ormhelper/runtime";
"#;

    fn validate(source: &str) -> Validation {
        let mut parser = TypeScriptParser::new().unwrap();
        let text = format!("{}{}", RUNTIME_IMPORTS, source);
        let file = parser.parse(&text, Path::new("/src/db.ts")).unwrap();
        let program = to_ir(&[file], PathBuf::from("/src")).unwrap();
        let registry = TableRegistry::build(&program);
        validate_program(&program, &registry, &RuntimeProfile::default())
    }

    fn messages(validation: &Validation) -> Vec<String> {
        validation.diagnostics.iter().map(|d| d.to_string()).collect()
    }

    const TABLE: &str = r#"
@DatabaseTable()
export class Question {
    @DatabaseField({ generatedId: true })
    id: number;
}
"#;

    #[test]
    fn test_valid_helper_with_plan() {
        let validation = validate(&format!(
            r#"{TABLE}
@Helper({{ name: "my_database", version: 3, tables: [Question] }})
export class MyDatabase {{
    @OnUpgrade({{ toVersion: 3 }})
    upToThree(database: SQLiteDatabase, connectionSource: ConnectionSource): void {{}}

    @OnUpgrade({{ fromVersion: 1, toVersion: 2 }})
    oneToTwo(database: SQLiteDatabase, connectionSource: ConnectionSource): void {{}}
}}
"#
        ));

        assert!(validation.diagnostics.is_empty(), "{:?}", messages(&validation));
        let helper = &validation.helpers[0];
        assert_eq!(helper.spec.name, "my_database");
        assert_eq!(helper.spec.version, 3);
        assert_eq!(helper.spec.tables[0].id_type.render(), "Number");

        let plan = helper.migration.plan().unwrap();
        let steps: Vec<UpgradeStep> = plan.steps.iter().map(|s| s.step).collect();
        assert_eq!(
            steps,
            vec![
                UpgradeStep::new(FromVersion::Exact(1), 2),
                UpgradeStep::new(FromVersion::Unset, 3),
            ]
        );
    }

    #[test]
    fn test_table_without_identifier() {
        let validation = validate(
            r#"
@DatabaseTable() export class NoId { @DatabaseField() name: string; }
@Helper({ name: "db", tables: [NoId] }) export class Db {}
"#,
        );

        assert!(validation.helpers.is_empty());
        assert_eq!(validation.diagnostics.len(), 1);
        assert!(messages(&validation)[0].contains("must contain classes annotated with @DatabaseTable"));
    }

    #[test]
    fn test_helper_without_empty_constructor() {
        let validation = validate(&format!(
            r#"{TABLE}
@Helper({{ name: "db", tables: [Question] }})
export class Db {{ constructor(readonly path: string) {{}} }}
"#
        ));

        assert!(validation.helpers.is_empty());
        assert!(messages(&validation)[0].contains("must have empty constructor"));
    }

    #[test]
    fn test_upgrade_routine_shapes() {
        let validation = validate(&format!(
            r#"{TABLE}
@Helper({{ name: "db", version: 2, tables: [Question] }})
export class Db {{
    @OnUpgrade({{ toVersion: 2 }})
    one(database: SQLiteDatabase) {{}}

    @OnUpgrade({{ toVersion: 2 }})
    wrongFirst(database: string, connectionSource: ConnectionSource) {{}}

    @OnUpgrade({{ toVersion: 2 }})
    wrongSecond(database: SQLiteDatabase, connectionSource: SQLiteDatabase) {{}}

    @OnUpgrade({{ toVersion: 2 }})
    static shared(database: SQLiteDatabase, connectionSource: ConnectionSource) {{}}
}}
"#
        ));

        let messages = messages(&validation);
        assert!(validation.helpers.is_empty());
        assert_eq!(messages.len(), 4);
        assert!(messages[0].contains("must have 2 parameters"));
        assert!(messages[0].contains("(SQLiteDatabase database, ConnectionSource connectionSource)"));
        assert!(messages[1].contains("must have 1st parameter of type SQLiteDatabase"));
        assert!(messages[2].contains("must have 2nd parameter of type ConnectionSource"));
        assert!(messages[3].contains("must be public non-static method returning void"));
    }

    #[test]
    fn test_upgrade_routine_named_by_key_is_rejected() {
        let validation = validate(&format!(
            r#"{TABLE}
@Helper({{ name: "db", version: 2, tables: [Question] }})
export class Db {{
    @OnUpgrade({{ toVersion: 2 }})
    "to-two"(database: SQLiteDatabase, connectionSource: ConnectionSource) {{}}
}}
"#
        ));

        assert!(validation.helpers.is_empty());
        assert_eq!(validation.diagnostics.len(), 1);
        match &validation.diagnostics[0] {
            CompilerError::UpgradeModifiers { method, modifier, .. } => {
                assert_eq!(method, "\"to-two\"");
                assert_eq!(modifier, "named by a string or computed key");
            }
            other => panic!("unexpected diagnostic: {other}"),
        }
    }

    #[test]
    fn test_locally_declared_lookalike_type_is_rejected() {
        let validation = validate(&format!(
            r#"{TABLE}
class SQLiteDatabaseShim {{}}
@Helper({{ name: "db", version: 2, tables: [Question] }})
export class Db {{
    @OnUpgrade({{ toVersion: 2 }})
    up(database: SQLiteDatabaseShim, connectionSource: ConnectionSource) {{}}
}}
"#
        ));
        assert!(messages(&validation)[0].contains("1st parameter"));
    }

    #[test]
    fn test_drop_on_upgrade_still_checks_routines() {
        let validation = validate(&format!(
            r#"{TABLE}
@Helper({{ name: "customer", version: 3, tables: [Question], dropOnUpgrade: true }})
export class Customer {{
    @OnUpgrade({{ toVersion: 3 }})
    private up(database: SQLiteDatabase, connectionSource: ConnectionSource) {{}}
}}
"#
        ));
        assert!(validation.helpers.is_empty());
        assert_eq!(validation.diagnostics.len(), 1);
    }

    #[test]
    fn test_drop_on_upgrade_skips_plan() {
        let validation = validate(&format!(
            r#"{TABLE}
@Helper({{ name: "customer", version: 3, tables: [Question], dropOnUpgrade: true }})
export class Customer {{
    @OnUpgrade({{ toVersion: 3 }})
    up(database: SQLiteDatabase, connectionSource: ConnectionSource) {{}}
}}
"#
        ));
        assert!(validation.diagnostics.is_empty());
        assert_eq!(validation.helpers[0].migration, MigrationStrategy::DropAndRecreate);
    }

    #[test]
    fn test_routine_outside_helper() {
        let validation = validate(
            r#"
export class NotAHelper {
    @OnUpgrade({ toVersion: 2 })
    up(database: SQLiteDatabase, connectionSource: ConnectionSource) {}
}
"#,
        );
        assert!(messages(&validation)[0].contains("must be inside class annotated with @Helper"));
    }

    #[test]
    fn test_helper_declaration_problems_are_collected() {
        let validation = validate(
            r#"
@Helper({ version: 0, tables: [Nowhere] })
export abstract class Broken {}
"#,
        );
        let messages = messages(&validation);
        assert_eq!(messages.len(), 4, "{:?}", messages);
        assert!(messages[0].contains("must not be abstract"));
        assert!(messages[1].contains("missing the `name` argument"));
        assert!(messages[2].contains("at least 1"));
        assert!(messages[3].contains("must contain classes annotated with"));
    }

    #[test]
    fn test_invalid_versions_on_routine() {
        let validation = validate(&format!(
            r#"{TABLE}
@Helper({{ name: "db", version: 2, tables: [Question] }})
export class Db {{
    @OnUpgrade({{ fromVersion: -3, toVersion: 2 }})
    negative(database: SQLiteDatabase, connectionSource: ConnectionSource) {{}}

    @OnUpgrade({{ fromVersion: 1 }})
    noTarget(database: SQLiteDatabase, connectionSource: ConnectionSource) {{}}
}}
"#
        ));
        let messages = messages(&validation);
        assert!(messages[0].contains("invalid fromVersion -3"));
        assert!(messages[1].contains("missing `toVersion`"));
    }

    #[test]
    fn test_duplicate_and_failed_helpers_do_not_block_others() {
        let validation = validate(&format!(
            r#"{TABLE}
@Helper({{ name: "b_db", tables: [Question] }}) export class Second {{}}
@Helper({{ name: "a-db", tables: [Question] }}) export class First {{}}
@Helper({{ name: "bdb", tables: [Question] }}) export class Clash {{}}
@Helper({{ name: "c", tables: [Missing] }}) export class Failing {{}}
"#
        ));

        let names: Vec<_> = validation.helpers.iter().map(|h| h.spec.name.as_str()).collect();
        assert_eq!(names, vec!["a-db", "b_db"]);
        let messages = messages(&validation);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("BdbDatabaseHelper"));
    }
}
