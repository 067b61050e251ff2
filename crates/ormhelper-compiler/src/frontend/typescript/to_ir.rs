//! Convert TypeScript AST to language-agnostic IR.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::ast::*;
use crate::diagnostic::{CompilerError, SourceLocation, Span};
use crate::ir::{
    normalize_path, strip_script_extension, ArgumentIssue, ClassId, ClassInfo, ConstructorShape,
    DeclaredType, Declaration, FileId, HelperDecl, IdField, ImportBinding, ImportMap, Located,
    ModuleRef, ParameterInfo, Program, SourceFile, TableRef, UpgradeRoutineDecl,
};

pub const TABLE_DECORATOR: &str = "DatabaseTable";
pub const FIELD_DECORATOR: &str = "DatabaseField";
pub const HELPER_DECORATOR: &str = "Helper";
pub const UPGRADE_DECORATOR: &str = "OnUpgrade";

/// `OnUpgrade.UNDEFINED`, the explicit spelling of an unset origin version.
const UNDEFINED_MEMBER: &str = "UNDEFINED";
const UNDEFINED_VERSION: i64 = -1;

/// Converts parsed TypeScript files to the IR.
pub fn to_ir(files: &[ParsedFile], source_dir: PathBuf) -> Result<Program, CompilerError> {
    let mut program = Program::new(source_dir);

    for file in files {
        program.files.push(convert_file(file));
    }

    // Classes first: declarations resolve class references against all of them.
    for (file_id, file) in files.iter().enumerate() {
        for class in &file.classes {
            let info = convert_class(&program, file_id, file, class);
            program.classes.push(info);
        }
    }

    let mut class_id: ClassId = 0;
    let mut declarations = Vec::new();
    for (file_id, file) in files.iter().enumerate() {
        for class in &file.classes {
            collect_declarations(&program, file_id, file, class, class_id, &mut declarations);
            class_id += 1;
        }
    }
    program.declarations = declarations;

    Ok(program)
}

fn location(file: &ParsedFile, span: &Span) -> SourceLocation {
    SourceLocation::new(file.source.clone(), span.clone())
}

fn convert_file(file: &ParsedFile) -> SourceFile {
    let path = normalize_path(&file.path);
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut imports = ImportMap::default();
    for import in &file.imports {
        let module = module_ref(&dir, &import.source);
        for specifier in &import.specifiers {
            let binding = if specifier.name == "*" {
                ImportBinding::Namespace { module: module.clone() }
            } else {
                ImportBinding::Named {
                    module: module.clone(),
                    name: specifier.name.clone(),
                }
            };
            imports.insert(specifier.local_name(), binding);
        }
    }

    let declared_types: BTreeSet<String> = file
        .classes
        .iter()
        .map(|c| c.name.clone())
        .chain(file.type_names.iter().cloned())
        .collect();

    SourceFile {
        module_path: strip_script_extension(&path),
        path,
        source: file.source.clone(),
        imports,
        declared_types,
    }
}

fn module_ref(dir: &Path, specifier: &str) -> ModuleRef {
    if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".." {
        ModuleRef::File(normalize_path(&strip_script_extension(&dir.join(specifier))))
    } else {
        ModuleRef::Package(specifier.to_string())
    }
}

fn convert_class(program: &Program, file_id: FileId, file: &ParsedFile, class: &ClassDecl) -> ClassInfo {
    let id_field = class
        .properties
        .iter()
        .filter(|p| !p.is_static)
        .find(|p| {
            p.decorators
                .iter()
                .any(|d| is_decorator(program, file_id, d, FIELD_DECORATOR) && marks_identifier(d))
        })
        .map(|p| IdField {
            name: p.name.clone(),
            declared_type: p.type_annotation.as_ref().map(declared_type),
            location: location(file, &p.span),
        });

    ClassInfo {
        name: class.name.clone(),
        file: file_id,
        superclass: class.superclass.clone(),
        is_abstract: class.is_abstract,
        exported: class.exported,
        id_field,
        constructor: constructor_shape(class),
        location: location(file, &class.span),
    }
}

/// Overload signatures describe the callable shapes; the implementation
/// only counts when no overloads are declared.
fn constructor_shape(class: &ClassDecl) -> ConstructorShape {
    let constructors: Vec<&MethodDecl> = class.constructors().collect();
    if constructors.is_empty() {
        return ConstructorShape::Inherited;
    }

    let overloads: Vec<&MethodDecl> = constructors.iter().copied().filter(|c| !c.has_body).collect();
    let callable = if overloads.is_empty() { constructors } else { overloads };

    if callable
        .iter()
        .any(|c| c.parameters.iter().all(Parameter::can_be_omitted))
    {
        ConstructorShape::ZeroArgs
    } else {
        ConstructorShape::RequiresArgs
    }
}

fn declared_type(annotation: &TypeAnnotation) -> DeclaredType {
    let primitive = match &annotation.node {
        TypeNode::Primitive(p) => Some(p.clone()),
        _ => None,
    };
    DeclaredType {
        text: annotation.text.clone(),
        primitive,
        references: annotation
            .node
            .referenced_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    }
}

/// `@DatabaseField({ id: true })` or `@DatabaseField({ generatedId: true })`.
fn marks_identifier(decorator: &Decorator) -> bool {
    decorator.arguments.first().is_some_and(|options| {
        ["id", "generatedId"].iter().any(|key| {
            matches!(
                options.property(key),
                Some(Expression::BooleanLiteral { value: true, .. })
            )
        })
    })
}

fn is_decorator(program: &Program, file: FileId, decorator: &Decorator, expected: &str) -> bool {
    program.decorator_name(file, decorator.qualifier.as_deref(), &decorator.name) == expected
}

fn collect_declarations(
    program: &Program,
    file_id: FileId,
    file: &ParsedFile,
    class: &ClassDecl,
    class_id: ClassId,
    out: &mut Vec<Declaration>,
) {
    if class
        .decorators
        .iter()
        .any(|d| is_decorator(program, file_id, d, TABLE_DECORATOR))
    {
        out.push(Declaration::Table(class_id));
    }

    if let Some(decorator) = class
        .decorators
        .iter()
        .find(|d| is_decorator(program, file_id, d, HELPER_DECORATOR))
    {
        out.push(Declaration::Helper(convert_helper(program, file_id, file, class_id, decorator)));
    }

    for method in &class.methods {
        for decorator in &method.decorators {
            if is_decorator(program, file_id, decorator, UPGRADE_DECORATOR) {
                out.push(Declaration::UpgradeRoutine(convert_upgrade_routine(
                    program, file_id, file, class_id, method, decorator,
                )));
            }
        }
    }
}

fn convert_helper(
    program: &Program,
    file_id: FileId,
    file: &ParsedFile,
    class_id: ClassId,
    decorator: &Decorator,
) -> HelperDecl {
    let mut helper = HelperDecl {
        class: class_id,
        name: None,
        version: None,
        tables: Vec::new(),
        drop_on_upgrade: false,
        with_config_util: false,
        issues: Vec::new(),
        location: location(file, &decorator.span),
    };

    let properties = match decorator.arguments.first() {
        None => return helper,
        Some(Expression::ObjectLiteral { properties, .. }) => properties,
        Some(other) => {
            helper
                .issues
                .push(issue(file, HELPER_DECORATOR, "options", "an object literal", other));
            return helper;
        }
    };

    for (key, value) in properties {
        match key.as_str() {
            "name" => match value {
                Expression::StringLiteral { value: name, .. } => {
                    helper.name = Some(Located::new(name.clone(), location(file, value.span())));
                }
                _ => helper.issues.push(issue(file, HELPER_DECORATOR, key, "a string literal", value)),
            },
            "version" => match integer_value(program, file_id, value) {
                Some(version) => {
                    helper.version = Some(Located::new(version, location(file, value.span())));
                }
                None => helper.issues.push(issue(file, HELPER_DECORATOR, key, "an integer literal", value)),
            },
            "tables" => match value {
                Expression::ArrayLiteral { elements, .. } => {
                    for element in elements {
                        match expression_path(element) {
                            Some(written) => helper.tables.push(TableRef {
                                resolution: program.resolve_class(file_id, &written),
                                written,
                                location: location(file, element.span()),
                            }),
                            None => helper
                                .issues
                                .push(issue(file, HELPER_DECORATOR, key, "a table class reference", element)),
                        }
                    }
                }
                _ => helper
                    .issues
                    .push(issue(file, HELPER_DECORATOR, key, "an array of table classes", value)),
            },
            "dropOnUpgrade" => match value {
                Expression::BooleanLiteral { value: flag, .. } => helper.drop_on_upgrade = *flag,
                _ => helper.issues.push(issue(file, HELPER_DECORATOR, key, "a boolean literal", value)),
            },
            "withConfigUtil" => match value {
                Expression::BooleanLiteral { value: flag, .. } => helper.with_config_util = *flag,
                _ => helper.issues.push(issue(file, HELPER_DECORATOR, key, "a boolean literal", value)),
            },
            _ => helper.issues.push(issue(
                file,
                HELPER_DECORATOR,
                key,
                "one of `name`, `version`, `tables`, `dropOnUpgrade`, `withConfigUtil`",
                value,
            )),
        }
    }

    helper
}

fn convert_upgrade_routine(
    program: &Program,
    file_id: FileId,
    file: &ParsedFile,
    class_id: ClassId,
    method: &MethodDecl,
    decorator: &Decorator,
) -> UpgradeRoutineDecl {
    let parameters = method
        .parameters
        .iter()
        .map(|p| ParameterInfo {
            name: p.name.clone(),
            type_text: p.type_annotation.as_ref().map(|t| t.text.clone()),
            identity: p.type_annotation.as_ref().and_then(|t| match &t.node {
                TypeNode::Reference { name, .. } => program.identity_of(file_id, name),
                _ => None,
            }),
            location: location(file, &p.span),
        })
        .collect();

    let mut routine = UpgradeRoutineDecl {
        class: class_id,
        method: method.name.clone(),
        rejected_modifier: rejected_modifier(method),
        parameters,
        from_version: None,
        to_version: None,
        issues: Vec::new(),
        location: location(file, &method.span),
        decorator_location: location(file, &decorator.span),
    };

    let properties = match decorator.arguments.first() {
        None => return routine,
        Some(Expression::ObjectLiteral { properties, .. }) => properties,
        Some(other) => {
            routine
                .issues
                .push(issue(file, UPGRADE_DECORATOR, "options", "an object literal", other));
            return routine;
        }
    };

    for (key, value) in properties {
        let slot = match key.as_str() {
            "fromVersion" | "from" => &mut routine.from_version,
            "toVersion" | "to" => &mut routine.to_version,
            _ => {
                routine.issues.push(issue(
                    file,
                    UPGRADE_DECORATOR,
                    key,
                    "one of `fromVersion`, `toVersion`",
                    value,
                ));
                continue;
            }
        };
        match integer_value(program, file_id, value) {
            Some(version) => *slot = Some(Located::new(version, location(file, value.span()))),
            None => routine.issues.push(issue(
                file,
                UPGRADE_DECORATOR,
                key,
                "an integer literal or `OnUpgrade.UNDEFINED`",
                value,
            )),
        }
    }

    routine
}

fn rejected_modifier(method: &MethodDecl) -> Option<String> {
    if method.is_key_name {
        return Some("named by a string or computed key".to_string());
    }
    if method.is_static {
        return Some("static".to_string());
    }
    if method.is_abstract || !method.has_body {
        return Some("abstract".to_string());
    }
    if method.is_private_name || method.visibility == Visibility::Private {
        return Some("private".to_string());
    }
    if method.visibility == Visibility::Protected {
        return Some("protected".to_string());
    }
    if method.kind != MethodKind::Method {
        return Some("an accessor".to_string());
    }
    if method.is_async {
        return Some("async".to_string());
    }
    match &method.return_type {
        Some(annotation) if annotation.text != "void" => Some(format!("declared to return {}", annotation.text)),
        _ => None,
    }
}

fn issue(
    file: &ParsedFile,
    decorator: &'static str,
    argument: &str,
    expected: &'static str,
    value: &Expression,
) -> ArgumentIssue {
    ArgumentIssue {
        decorator,
        argument: argument.to_string(),
        expected,
        location: location(file, value.span()),
    }
}

/// Evaluates an integer-valued decorator argument.
fn integer_value(program: &Program, file: FileId, expr: &Expression) -> Option<i64> {
    match expr {
        Expression::NumberLiteral { value, .. } => {
            if value.is_finite() && value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
                Some(*value as i64)
            } else {
                None
            }
        }
        Expression::Unary { operator, argument, .. } => match operator.as_str() {
            "-" => integer_value(program, file, argument).map(|v| -v),
            "+" => integer_value(program, file, argument),
            _ => None,
        },
        Expression::MemberAccess { object, property, .. } if property == UNDEFINED_MEMBER => {
            let (qualifier, name) = match object.as_ref() {
                Expression::Identifier { name, .. } => (None, name.as_str()),
                Expression::MemberAccess { property, .. } => (Some("."), property.as_str()),
                _ => return None,
            };
            (program.decorator_name(file, qualifier, name) == UPGRADE_DECORATOR).then_some(UNDEFINED_VERSION)
        }
        _ => None,
    }
}

/// `Question` or `model.Question`, as written.
fn expression_path(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Identifier { name, .. } => Some(name.clone()),
        Expression::MemberAccess { object, property, .. } => {
            expression_path(object).map(|prefix| format!("{}.{}", prefix, property))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::TypeScriptParser;
    use super::*;
    use crate::ir::{Resolution, TypeIdentity};

    fn program(sources: &[(&str, &str)]) -> Program {
        let mut parser = TypeScriptParser::new().unwrap();
        let files: Vec<ParsedFile> = sources
            .iter()
            .map(|(path, source)| parser.parse(source, Path::new(path)).unwrap())
            .collect();
        to_ir(&files, PathBuf::from("/src/db")).unwrap()
    }

    #[test]
    fn test_helper_arguments_and_table_resolution() {
        let program = program(&[
            (
                "/src/db/question.ts",
                r#"
import { DatabaseTable, DatabaseField } from "@ormhelper/runtime";

@DatabaseTable()
export class Question {
    @DatabaseField({ generatedId: true })
    id: number;
}
"#,
            ),
            (
                "/src/db/my-database.ts",
                r#"
import { Helper as Db } from "@ormhelper/runtime";
import { Question } from "./question.js";

@Db({ name: "my_database", version: 2, tables: [Question, Missing], withConfigUtil: true })
export class MyDatabase {}
"#,
            ),
        ]);

        assert_eq!(program.tables().collect::<Vec<_>>(), vec![0]);
        let question = program.class(0);
        let id = question.id_field.as_ref().unwrap();
        assert_eq!(id.name, "id");
        assert_eq!(id.declared_type.as_ref().unwrap().primitive.as_deref(), Some("number"));

        let helper = program.helpers().next().unwrap();
        assert_eq!(helper.name.as_ref().unwrap().value, "my_database");
        assert_eq!(helper.version.as_ref().unwrap().value, 2);
        assert!(helper.with_config_util);
        assert!(!helper.drop_on_upgrade);
        assert!(helper.issues.is_empty());
        assert_eq!(helper.tables[0].resolution, Resolution::Found(0));
        assert_eq!(helper.tables[1].resolution, Resolution::NotFound);
    }

    #[test]
    fn test_upgrade_routine_versions_and_parameters() {
        let program = program(&[(
            "/src/db/db.ts",
            r#"
import * as orm from "@ormhelper/runtime";
import { OnUpgrade, SQLiteDatabase } from "@ormhelper/runtime";

@orm.Helper({ name: "db", version: 3 })
export class Db {
    @OnUpgrade({ fromVersion: OnUpgrade.UNDEFINED, toVersion: 2 })
    first(database: SQLiteDatabase, connectionSource: orm.ConnectionSource): void {}

    @orm.OnUpgrade({ from: 2, to: 3, extra: true })
    second(database: SQLiteDatabase, connectionSource: orm.ConnectionSource) {}

    @OnUpgrade({ toVersion: -4 })
    protected third() {}
}
"#,
        )]);

        let routines: Vec<_> = program.upgrade_routines().collect();
        assert_eq!(routines.len(), 3);

        let first = routines[0];
        assert_eq!(first.from_version.as_ref().unwrap().value, -1);
        assert_eq!(first.to_version.as_ref().unwrap().value, 2);
        assert!(first.rejected_modifier.is_none());
        assert_eq!(
            first.parameters[0].identity,
            Some(TypeIdentity::package("@ormhelper/runtime", "SQLiteDatabase"))
        );
        assert_eq!(
            first.parameters[1].identity,
            Some(TypeIdentity::package("@ormhelper/runtime", "ConnectionSource"))
        );

        let second = routines[1];
        assert_eq!(second.from_version.as_ref().unwrap().value, 2);
        assert_eq!(second.issues.len(), 1);
        assert_eq!(second.issues[0].argument, "extra");

        let third = routines[2];
        assert_eq!(third.to_version.as_ref().unwrap().value, -4);
        assert_eq!(third.rejected_modifier.as_deref(), Some("protected"));
    }

    #[test]
    fn test_constructor_shapes() {
        let program = program(&[(
            "/src/db/ctor.ts",
            r#"
class Implicit {}
class Optional { constructor(a?: number, b = 2) {} }
class Required { constructor(a: number) {} }
class Overloaded {
    constructor();
    constructor(a: number);
    constructor(a?: number) {}
}
class Child extends Required {}
"#,
        )]);

        let shapes: Vec<_> = program.classes.iter().map(|c| c.constructor).collect();
        assert_eq!(
            shapes,
            vec![
                ConstructorShape::Inherited,
                ConstructorShape::ZeroArgs,
                ConstructorShape::RequiresArgs,
                ConstructorShape::ZeroArgs,
                ConstructorShape::Inherited,
            ]
        );
        assert!(program.has_empty_constructor(0));
        assert!(!program.has_empty_constructor(4));
    }

    #[test]
    fn test_invalid_helper_arguments_are_recorded() {
        let program = program(&[(
            "/src/db/bad.ts",
            r#"@Helper({ name: 42, version: 1.5, tables: Question, dropOnUpgrade: "yes" }) class Bad {}"#,
        )]);

        let helper = program.helpers().next().unwrap();
        let arguments: Vec<_> = helper.issues.iter().map(|i| i.argument.as_str()).collect();
        assert_eq!(arguments, vec!["name", "version", "tables", "dropOnUpgrade"]);
        assert!(helper.name.is_none());
    }
}
