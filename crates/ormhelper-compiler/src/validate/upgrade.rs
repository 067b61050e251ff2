//! Upgrade routine checks.

use crate::config::RuntimeProfile;
use crate::diagnostic::{CompilerError, SourceLocation};
use crate::ir::{ArgumentIssue, TypeIdentity, UpgradeRoutineDecl};
use crate::schema::{FromVersion, PlannedStep, UpgradeStep};

/// Checks one routine and turns it into a plannable step.
///
/// Checks run in a fixed order (modifiers, parameter count, first parameter,
/// second parameter, decorator arguments) and stop at the first failure.
pub fn validate_upgrade_routine(
    routine: &UpgradeRoutineDecl,
    runtime: &RuntimeProfile,
) -> Result<PlannedStep, CompilerError> {
    let method = &routine.method;

    if let Some(modifier) = &routine.rejected_modifier {
        return Err(CompilerError::UpgradeModifiers {
            method: method.clone(),
            modifier: modifier.clone(),
            src: routine.location.named_source(),
            span: routine.location.source_span(),
        });
    }

    if routine.parameters.len() != 2 {
        return Err(CompilerError::UpgradeParameterCount {
            method: method.clone(),
            found: routine.parameters.len(),
            database_type: runtime.database.clone(),
            connection_type: runtime.connection_source.clone(),
            src: routine.location.named_source(),
            span: routine.location.source_span(),
        });
    }

    let database = TypeIdentity::package(&runtime.module, &runtime.database);
    let first = &routine.parameters[0];
    if first.identity.as_ref() != Some(&database) {
        return Err(CompilerError::UpgradeFirstParameter {
            method: method.clone(),
            expected: runtime.database.clone(),
            src: first.location.named_source(),
            span: first.location.source_span(),
        });
    }

    let connection = TypeIdentity::package(&runtime.module, &runtime.connection_source);
    let second = &routine.parameters[1];
    if second.identity.as_ref() != Some(&connection) {
        return Err(CompilerError::UpgradeSecondParameter {
            method: method.clone(),
            expected: runtime.connection_source.clone(),
            src: second.location.named_source(),
            span: second.location.source_span(),
        });
    }

    if let Some(issue) = routine.issues.first() {
        return Err(argument_error(issue));
    }

    let Some(to) = &routine.to_version else {
        return Err(CompilerError::MissingToVersion {
            method: method.clone(),
            src: routine.decorator_location.named_source(),
            span: routine.decorator_location.source_span(),
        });
    };
    let to_version = u32::try_from(to.value)
        .map_err(|_| invalid_version(method, "toVersion", to.value, &to.location))?;

    let from = match &routine.from_version {
        None => FromVersion::Unset,
        Some(from) => FromVersion::from_declared(from.value)
            .ok_or_else(|| invalid_version(method, "fromVersion", from.value, &from.location))?,
    };

    Ok(PlannedStep::new(UpgradeStep::new(from, to_version), method.clone()))
}

pub(super) fn argument_error(issue: &ArgumentIssue) -> CompilerError {
    CompilerError::InvalidDecoratorArgument {
        decorator: issue.decorator.to_string(),
        argument: issue.argument.clone(),
        expected: issue.expected.to_string(),
        src: issue.location.named_source(),
        span: issue.location.source_span(),
    }
}

fn invalid_version(method: &str, argument: &str, value: i64, location: &SourceLocation) -> CompilerError {
    CompilerError::InvalidUpgradeVersion {
        method: method.to_string(),
        argument: argument.to_string(),
        value,
        src: location.named_source(),
        span: location.source_span(),
    }
}
