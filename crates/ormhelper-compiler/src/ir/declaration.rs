//! Scanned classes and the declarations attached to them.

use crate::diagnostic::SourceLocation;

use super::{FileId, TypeIdentity};

/// Index into [`super::Program::classes`].
pub type ClassId = usize;

/// A value together with where it was written.
#[derive(Debug, Clone)]
pub struct Located<T> {
    pub value: T,
    pub location: SourceLocation,
}

impl<T> Located<T> {
    pub fn new(value: T, location: SourceLocation) -> Self {
        Self { value, location }
    }
}

/// A declared type as written on a field.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredType {
    /// Verbatim source text of the annotation.
    pub text: String,
    /// Set when the annotation is a bare primitive keyword (`number`, `string`).
    pub primitive: Option<String>,
    /// Named types the annotation mentions, as written.
    pub references: Vec<String>,
}

/// A field marked as the identifier of a table (primary or generated).
#[derive(Debug, Clone)]
pub struct IdField {
    pub name: String,
    /// `None` when the field has no type annotation.
    pub declared_type: Option<DeclaredType>,
    pub location: SourceLocation,
}

/// A scanned class, whether or not it carries any declaration.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub file: FileId,
    /// The `extends` target as written.
    pub superclass: Option<String>,
    pub is_abstract: bool,
    pub exported: bool,
    /// First identifier field declared directly on this class.
    pub id_field: Option<IdField>,
    pub constructor: ConstructorShape,
    pub location: SourceLocation,
}

/// What the declared constructors of a class allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorShape {
    /// No constructor declared; the parent's constructor applies.
    Inherited,
    /// Some declared constructor can be called without arguments.
    ZeroArgs,
    RequiresArgs,
}

/// Outcome of resolving a written class reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found(ClassId),
    NotFound,
    Ambiguous(usize),
}

impl Resolution {
    pub(crate) fn from_matches(matches: Vec<ClassId>) -> Self {
        match matches.as_slice() {
            [] => Resolution::NotFound,
            [id] => Resolution::Found(*id),
            many => Resolution::Ambiguous(many.len()),
        }
    }
}

/// One entry of a helper's `tables` list.
#[derive(Debug, Clone)]
pub struct TableRef {
    pub written: String,
    pub resolution: Resolution,
    pub location: SourceLocation,
}

/// A decorator argument that could not be evaluated.
#[derive(Debug, Clone)]
pub struct ArgumentIssue {
    pub decorator: &'static str,
    pub argument: String,
    pub expected: &'static str,
    pub location: SourceLocation,
}

/// `@Helper(...)` on a class.
#[derive(Debug, Clone)]
pub struct HelperDecl {
    pub class: ClassId,
    pub name: Option<Located<String>>,
    pub version: Option<Located<i64>>,
    pub tables: Vec<TableRef>,
    pub drop_on_upgrade: bool,
    pub with_config_util: bool,
    pub issues: Vec<ArgumentIssue>,
    /// Location of the decorator.
    pub location: SourceLocation,
}

/// A parameter of an upgrade routine.
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    pub name: String,
    pub type_text: Option<String>,
    pub identity: Option<TypeIdentity>,
    pub location: SourceLocation,
}

/// `@OnUpgrade(...)` on a method.
#[derive(Debug, Clone)]
pub struct UpgradeRoutineDecl {
    pub class: ClassId,
    pub method: String,
    /// First modifier that keeps the method from being a public instance
    /// method returning nothing, phrased to follow "is" (`static`,
    /// `declared to return number`).
    pub rejected_modifier: Option<String>,
    pub parameters: Vec<ParameterInfo>,
    pub from_version: Option<Located<i64>>,
    pub to_version: Option<Located<i64>>,
    pub issues: Vec<ArgumentIssue>,
    /// Location of the method.
    pub location: SourceLocation,
    /// Location of the decorator.
    pub decorator_location: SourceLocation,
}

/// The declaration kinds the generator understands.
#[derive(Debug, Clone)]
pub enum Declaration {
    /// `@DatabaseTable` on a class.
    Table(ClassId),
    Helper(HelperDecl),
    UpgradeRoutine(UpgradeRoutineDecl),
}
