//! Helper declaration checks.

use tracing::warn;

use super::upgrade::{argument_error, validate_upgrade_routine};
use super::{HelperSpec, ValidatedHelper};
use crate::codegen::ts_types::sanitize_db_name;
use crate::config::RuntimeProfile;
use crate::diagnostic::{CompilerError, SourceLocation};
use crate::ir::{HelperDecl, Program, Resolution, UpgradeRoutineDecl};
use crate::schema::{MigrationStrategy, TableRegistry, TableSpec};

/// Checks a helper and the upgrade routines declared on its class.
///
/// Every problem is collected; a helper with any diagnostic yields none of
/// its output.
pub fn validate_helper(
    program: &Program,
    registry: &TableRegistry,
    runtime: &RuntimeProfile,
    helper: &HelperDecl,
    routines: &[&UpgradeRoutineDecl],
) -> Result<ValidatedHelper, Vec<CompilerError>> {
    let class = program.class(helper.class);
    let mut diagnostics: Vec<CompilerError> = helper.issues.iter().map(argument_error).collect();

    if class.is_abstract {
        diagnostics.push(CompilerError::AbstractHelper {
            class: class.name.clone(),
            src: class.location.named_source(),
            span: class.location.source_span(),
        });
    } else if !program.has_empty_constructor(helper.class) {
        diagnostics.push(CompilerError::MissingEmptyConstructor {
            class: class.name.clone(),
            src: class.location.named_source(),
            span: class.location.source_span(),
        });
    }

    let name = match &helper.name {
        None => {
            diagnostics.push(CompilerError::MissingHelperName {
                class: class.name.clone(),
                src: helper.location.named_source(),
                span: helper.location.source_span(),
            });
            None
        }
        Some(name) if sanitize_db_name(&name.value).is_empty() => {
            diagnostics.push(CompilerError::InvalidHelperName {
                name: name.value.clone(),
                src: name.location.named_source(),
                span: name.location.source_span(),
            });
            None
        }
        Some(name) => Some(name.value.clone()),
    };

    let version = match &helper.version {
        None => Some(1),
        Some(version) => match u32::try_from(version.value) {
            Ok(v) if v >= 1 => Some(v),
            _ => {
                diagnostics.push(CompilerError::InvalidHelperVersion {
                    version: version.value,
                    src: version.location.named_source(),
                    span: version.location.source_span(),
                });
                None
            }
        },
    };

    let mut tables: Vec<TableSpec> = Vec::new();
    for table in &helper.tables {
        match table.resolution {
            Resolution::Found(id) => match registry.lookup(id) {
                Some(spec) => {
                    if !program.class(id).exported {
                        warn!(table = %spec.name, "table class is not exported; the generated import will not resolve");
                    }
                    tables.push(spec.clone());
                }
                None => diagnostics.push(missing_table_id(&table.written, &table.location)),
            },
            Resolution::NotFound => diagnostics.push(missing_table_id(&table.written, &table.location)),
            Resolution::Ambiguous(count) => diagnostics.push(CompilerError::AmbiguousTable {
                table: table.written.clone(),
                count,
                src: table.location.named_source(),
                span: table.location.source_span(),
            }),
        }
    }

    // Routines are shape-checked even when the helper drops on upgrade.
    let mut steps = Vec::new();
    for routine in routines {
        match validate_upgrade_routine(routine, runtime) {
            Ok(step) => steps.push(step),
            Err(e) => diagnostics.push(e),
        }
    }

    if !class.exported {
        warn!(class = %class.name, "helper class is not exported; the generated import will not resolve");
    }

    let (Some(name), Some(version)) = (name, version) else {
        return Err(diagnostics);
    };
    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }

    if helper.drop_on_upgrade && !steps.is_empty() {
        warn!(
            helper = %name,
            routines = steps.len(),
            "dropOnUpgrade is set; upgrade routines are ignored"
        );
    }

    Ok(ValidatedHelper {
        migration: MigrationStrategy::for_helper(helper.drop_on_upgrade, version, steps),
        spec: HelperSpec {
            name,
            version,
            tables,
            drop_on_upgrade: helper.drop_on_upgrade,
            with_config_util: helper.with_config_util,
        },
        class: helper.class,
        class_name: class.name.clone(),
        class_module: program.module_of(helper.class),
        location: helper.location.clone(),
    })
}

fn missing_table_id(table: &str, location: &SourceLocation) -> CompilerError {
    CompilerError::MissingTableId {
        table: table.to_string(),
        src: location.named_source(),
        span: location.source_span(),
    }
}
