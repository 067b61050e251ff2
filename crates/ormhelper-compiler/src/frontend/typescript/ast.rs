//! TypeScript-specific AST types.

use std::path::PathBuf;
use std::sync::Arc;

use crate::diagnostic::Span;

/// A parsed TypeScript file.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub source: Arc<str>,
    pub imports: Vec<ImportDecl>,
    pub classes: Vec<ClassDecl>,
    /// Type aliases, interfaces and enums declared at the top level.
    pub type_names: Vec<String>,
}

/// An import declaration.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: String,
    pub span: Span,
}

/// An import specifier.
///
/// Default imports use the name `default`; namespace imports (`* as orm`)
/// use the name `*`.
#[derive(Debug, Clone)]
pub struct ImportSpecifier {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportSpecifier {
    /// The name this specifier binds in the importing file.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Type AST nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    /// string, number, boolean, etc.
    Primitive(String),

    /// T[]
    Array(Box<TypeNode>),

    /// T | U
    Union(Vec<TypeNode>),

    /// Reference to another type, possibly with type arguments.
    Reference {
        name: String,
        arguments: Vec<TypeNode>,
    },

    /// T | undefined
    Optional(Box<TypeNode>),
}

impl TypeNode {
    /// Names of every referenced (non-primitive) type, outermost first.
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeNode::Primitive(_) => {}
            TypeNode::Array(inner) | TypeNode::Optional(inner) => inner.collect_references(out),
            TypeNode::Union(variants) => {
                for v in variants {
                    v.collect_references(out);
                }
            }
            TypeNode::Reference { name, arguments } => {
                out.push(name);
                for a in arguments {
                    a.collect_references(out);
                }
            }
        }
    }
}

/// A type annotation: parsed shape plus the verbatim source text.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub node: TypeNode,
    pub text: String,
}

/// A decorator applied to a class or member.
#[derive(Debug, Clone)]
pub struct Decorator {
    /// Last path segment of the decorator expression (`Helper` in `@orm.Helper()`).
    pub name: String,
    /// Leading path segments, if the decorator was a member expression.
    pub qualifier: Option<String>,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

/// A class declaration.
#[derive(Debug)]
pub struct ClassDecl {
    pub name: String,
    pub superclass: Option<String>,
    pub decorators: Vec<Decorator>,
    pub properties: Vec<PropertyDecl>,
    pub methods: Vec<MethodDecl>,
    pub is_abstract: bool,
    pub exported: bool,
    pub span: Span,
}

impl ClassDecl {
    pub fn constructors(&self) -> impl Iterator<Item = &MethodDecl> {
        self.methods.iter().filter(|m| m.kind == MethodKind::Constructor)
    }
}

/// A class property declaration.
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub name: String,
    pub type_annotation: Option<TypeAnnotation>,
    pub decorators: Vec<Decorator>,
    pub is_static: bool,
    pub span: Span,
}

/// What kind of member a method declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Constructor,
    Getter,
    Setter,
}

/// A method declaration, overload signature or abstract signature.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub kind: MethodKind,
    pub parameters: Vec<Parameter>,
    pub decorators: Vec<Decorator>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_async: bool,
    pub return_type: Option<TypeAnnotation>,
    /// `#name` members are private regardless of accessibility modifiers.
    pub is_private_name: bool,
    /// Named by a string, numeric or computed key; `name` holds the key text.
    pub is_key_name: bool,
    /// False for overload and abstract signatures.
    pub has_body: bool,
    pub span: Span,
}

/// Method visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// A parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: Option<TypeAnnotation>,
    pub optional: bool,
    pub default_value: Option<String>,
    pub span: Span,
}

impl Parameter {
    /// Whether a caller may omit this argument.
    pub fn can_be_omitted(&self) -> bool {
        self.optional || self.default_value.is_some()
    }
}

/// An expression, as far as decorator arguments need them.
#[derive(Debug, Clone)]
pub enum Expression {
    Identifier {
        name: String,
        span: Span,
    },
    StringLiteral {
        value: String,
        span: Span,
    },
    NumberLiteral {
        value: f64,
        span: Span,
    },
    BooleanLiteral {
        value: bool,
        span: Span,
    },
    NullLiteral {
        span: Span,
    },
    ArrayLiteral {
        elements: Vec<Expression>,
        span: Span,
    },
    ObjectLiteral {
        properties: Vec<(String, Expression)>,
        span: Span,
    },
    MemberAccess {
        object: Box<Expression>,
        property: String,
        span: Span,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
        span: Span,
    },
    Unary {
        operator: String,
        argument: Box<Expression>,
        span: Span,
    },
    /// Anything decorator arguments never need to look inside.
    Other {
        text: String,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> &Span {
        match self {
            Expression::Identifier { span, .. }
            | Expression::StringLiteral { span, .. }
            | Expression::NumberLiteral { span, .. }
            | Expression::BooleanLiteral { span, .. }
            | Expression::NullLiteral { span }
            | Expression::ArrayLiteral { span, .. }
            | Expression::ObjectLiteral { span, .. }
            | Expression::MemberAccess { span, .. }
            | Expression::Call { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Other { span, .. } => span,
        }
    }

    /// Looks up a property of an object literal.
    pub fn property(&self, key: &str) -> Option<&Expression> {
        match self {
            Expression::ObjectLiteral { properties, .. } => {
                properties.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// The final name of an identifier or member path (`model.Question` -> `Question`).
    pub fn path_tail(&self) -> Option<&str> {
        match self {
            Expression::Identifier { name, .. } => Some(name),
            Expression::MemberAccess { property, .. } => Some(property),
            _ => None,
        }
    }
}
