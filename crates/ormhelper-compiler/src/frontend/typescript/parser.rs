//! TypeScript parser using tree-sitter.

use std::path::Path;
use std::sync::Arc;

use tree_sitter::{Node, Parser};

use super::ast::*;
use crate::diagnostic::{CompilerError, Span};

/// TypeScript parser.
pub struct TypeScriptParser {
    parser: Parser,
}

impl TypeScriptParser {
    /// Creates a new TypeScript parser.
    pub fn new() -> Result<Self, CompilerError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .map_err(|_| CompilerError::ParserInitFailed)?;
        Ok(Self { parser })
    }

    /// Parses a TypeScript source file.
    pub fn parse(&mut self, source: &str, path: &Path) -> Result<ParsedFile, CompilerError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| CompilerError::ParseFailed { path: path.to_path_buf() })?;

        let root = tree.root_node();
        let mut visitor = Visitor::new(source, path);
        visitor.visit_program(root);

        Ok(ParsedFile {
            path: path.to_path_buf(),
            source: Arc::from(source),
            imports: visitor.imports,
            classes: visitor.classes,
            type_names: visitor.type_names,
        })
    }
}

/// AST visitor that extracts declarations from tree-sitter nodes.
struct Visitor<'a> {
    source: &'a str,
    path: &'a Path,
    imports: Vec<ImportDecl>,
    classes: Vec<ClassDecl>,
    type_names: Vec<String>,
}

impl<'a> Visitor<'a> {
    fn new(source: &'a str, path: &'a Path) -> Self {
        Self {
            source,
            path,
            imports: Vec::new(),
            classes: Vec::new(),
            type_names: Vec::new(),
        }
    }

    fn span(&self, node: Node) -> Span {
        Span::new(
            self.path.to_path_buf(),
            (node.start_position().row, node.start_position().column),
            (node.end_position().row, node.end_position().column),
            (node.start_byte(), node.end_byte()),
        )
    }

    fn node_text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn visit_program(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "import_statement" => self.visit_import(child),
                "export_statement" => self.visit_export(child),
                "class_declaration" | "abstract_class_declaration" => {
                    if let Some(class) = self.visit_class(child, false, Vec::new()) {
                        self.classes.push(class);
                    }
                }
                "type_alias_declaration" | "interface_declaration" | "enum_declaration" => {
                    self.visit_type_declaration(child);
                }
                _ => {}
            }
        }
    }

    fn visit_type_declaration(&mut self, node: Node) {
        if let Some(name) = node.child_by_field_name("name") {
            self.type_names.push(self.node_text(name).to_string());
        }
    }

    fn visit_import(&mut self, node: Node) {
        let mut source = String::new();
        let mut specifiers = Vec::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "import_clause" => {
                    specifiers = self.visit_import_clause(child);
                }
                "string" => {
                    source = self.extract_string_value(child);
                }
                _ => {}
            }
        }

        self.imports.push(ImportDecl {
            specifiers,
            source,
            span: self.span(node),
        });
    }

    fn visit_import_clause(&self, node: Node) -> Vec<ImportSpecifier> {
        let mut specifiers = Vec::new();
        let mut cursor = node.walk();

        for child in node.children(&mut cursor) {
            match child.kind() {
                "identifier" => {
                    specifiers.push(ImportSpecifier {
                        name: "default".to_string(),
                        alias: Some(self.node_text(child).to_string()),
                    });
                }
                "namespace_import" => {
                    let mut inner_cursor = child.walk();
                    let alias = child
                        .named_children(&mut inner_cursor)
                        .find(|n| n.kind() == "identifier")
                        .map(|n| self.node_text(n).to_string());
                    specifiers.push(ImportSpecifier {
                        name: "*".to_string(),
                        alias,
                    });
                }
                "named_imports" => {
                    let mut inner_cursor = child.walk();
                    for import_spec in child.children(&mut inner_cursor) {
                        if import_spec.kind() == "import_specifier" {
                            specifiers.push(self.visit_import_specifier(import_spec));
                        }
                    }
                }
                _ => {}
            }
        }

        specifiers
    }

    fn visit_import_specifier(&self, node: Node) -> ImportSpecifier {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.node_text(n).to_string())
            .unwrap_or_default();
        let alias = node
            .child_by_field_name("alias")
            .map(|n| self.node_text(n).to_string());

        ImportSpecifier { name, alias }
    }

    fn visit_export(&mut self, node: Node) {
        let mut decorators = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "decorator" => decorators.push(self.visit_decorator(child)),
                "class_declaration" | "abstract_class_declaration" => {
                    let inherited = std::mem::take(&mut decorators);
                    if let Some(class) = self.visit_class(child, true, inherited) {
                        self.classes.push(class);
                    }
                }
                "type_alias_declaration" | "interface_declaration" | "enum_declaration" => {
                    self.visit_type_declaration(child);
                }
                _ => {}
            }
        }
    }

    fn visit_class(&self, node: Node, exported: bool, mut decorators: Vec<Decorator>) -> Option<ClassDecl> {
        let mut name = String::new();
        let mut superclass = None;
        let mut properties = Vec::new();
        let mut methods = Vec::new();
        let is_abstract = node.kind() == "abstract_class_declaration";

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "decorator" => decorators.push(self.visit_decorator(child)),
                "type_identifier" => {
                    name = self.node_text(child).to_string();
                }
                "class_heritage" => {
                    superclass = self.visit_class_heritage(child);
                }
                "class_body" => {
                    let (props, meths) = self.visit_class_body(child);
                    properties = props;
                    methods = meths;
                }
                _ => {}
            }
        }

        if name.is_empty() {
            return None;
        }

        Some(ClassDecl {
            name,
            superclass,
            decorators,
            properties,
            methods,
            is_abstract,
            exported,
            span: self.span(node),
        })
    }

    /// Extracts the `extends` target; `implements` clauses do not contribute fields.
    fn visit_class_heritage(&self, node: Node) -> Option<String> {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "extends_clause" {
                continue;
            }
            let value = child.child_by_field_name("value").or_else(|| {
                let mut inner = child.walk();
                let found = child.named_children(&mut inner).next();
                found
            })?;
            return Some(self.node_text(value).to_string());
        }
        None
    }

    fn visit_class_body(&self, node: Node) -> (Vec<PropertyDecl>, Vec<MethodDecl>) {
        let mut properties = Vec::new();
        let mut methods = Vec::new();
        // Member decorators are siblings that precede the member they apply to.
        let mut pending = Vec::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "decorator" => pending.push(self.visit_decorator(child)),
                "public_field_definition" | "property_definition" | "field_definition" => {
                    let decorators = std::mem::take(&mut pending);
                    if let Some(prop) = self.visit_property_decl(child, decorators) {
                        properties.push(prop);
                    }
                }
                "method_definition" | "method_signature" | "abstract_method_signature" => {
                    let decorators = std::mem::take(&mut pending);
                    if let Some(method) = self.visit_method_decl(child, decorators) {
                        methods.push(method);
                    }
                }
                _ => {}
            }
        }

        (properties, methods)
    }

    fn visit_property_decl(&self, node: Node, mut decorators: Vec<Decorator>) -> Option<PropertyDecl> {
        let mut name = String::new();
        let mut type_annotation = None;
        let mut is_static = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "decorator" => decorators.push(self.visit_decorator(child)),
                "static" => is_static = true,
                "property_identifier" | "private_property_identifier" => {
                    if name.is_empty() {
                        name = self.node_text(child).to_string();
                    }
                }
                "type_annotation" => {
                    type_annotation = self.visit_type_annotation(child);
                }
                _ => {}
            }
        }

        if name.is_empty() {
            return None;
        }

        Some(PropertyDecl {
            name,
            type_annotation,
            decorators,
            is_static,
            span: self.span(node),
        })
    }

    fn visit_method_decl(&self, node: Node, mut decorators: Vec<Decorator>) -> Option<MethodDecl> {
        let mut name = String::new();
        let mut parameters = Vec::new();
        let mut visibility = Visibility::Public;
        let mut is_static = false;
        let mut is_abstract = node.kind() == "abstract_method_signature";
        let mut is_async = false;
        let mut return_type = None;
        let mut is_private_name = false;
        let mut is_key_name = false;
        let mut has_body = false;
        let mut is_getter = false;
        let mut is_setter = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "decorator" => decorators.push(self.visit_decorator(child)),
                "accessibility_modifier" => {
                    visibility = match self.node_text(child) {
                        "private" => Visibility::Private,
                        "protected" => Visibility::Protected,
                        _ => Visibility::Public,
                    };
                }
                "static" => is_static = true,
                "abstract" => is_abstract = true,
                "async" => is_async = true,
                "type_annotation" => return_type = self.visit_type_annotation(child),
                "get" => is_getter = true,
                "set" => is_setter = true,
                "property_identifier" => {
                    name = self.node_text(child).to_string();
                }
                "private_property_identifier" => {
                    name = self.node_text(child).to_string();
                    is_private_name = true;
                }
                "string" | "number" | "computed_property_name" => {
                    name = self.node_text(child).to_string();
                    is_key_name = true;
                }
                "formal_parameters" => {
                    parameters = self.visit_parameters(child);
                }
                "statement_block" => has_body = true,
                _ => {}
            }
        }

        if name.is_empty() {
            return None;
        }

        let kind = if name == "constructor" && !is_key_name {
            MethodKind::Constructor
        } else if is_getter {
            MethodKind::Getter
        } else if is_setter {
            MethodKind::Setter
        } else {
            MethodKind::Method
        };

        Some(MethodDecl {
            name,
            kind,
            parameters,
            decorators,
            visibility,
            is_static,
            is_abstract,
            is_async,
            return_type,
            is_private_name,
            is_key_name,
            has_body,
            span: self.span(node),
        })
    }

    fn visit_parameters(&self, node: Node) -> Vec<Parameter> {
        let mut params = Vec::new();
        let mut cursor = node.walk();

        for child in node.children(&mut cursor) {
            if child.kind() == "required_parameter" || child.kind() == "optional_parameter" {
                if let Some(param) = self.visit_parameter(child) {
                    params.push(param);
                }
            }
        }

        params
    }

    fn visit_parameter(&self, node: Node) -> Option<Parameter> {
        let mut optional = node.kind() == "optional_parameter";

        let pattern = node.child_by_field_name("pattern")?;
        if pattern.kind() == "rest_pattern" {
            optional = true;
        }
        let name = self.node_text(pattern).trim_start_matches("...").to_string();

        let type_annotation = node
            .child_by_field_name("type")
            .and_then(|t| self.visit_type_annotation(t));
        let default_value = node
            .child_by_field_name("value")
            .map(|v| self.node_text(v).to_string());

        if name.is_empty() {
            return None;
        }

        Some(Parameter {
            name,
            type_annotation,
            optional,
            default_value,
            span: self.span(node),
        })
    }

    fn visit_type_annotation(&self, node: Node) -> Option<TypeAnnotation> {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != ":" {
                return Some(TypeAnnotation {
                    node: self.visit_type_node(child),
                    text: self.node_text(child).to_string(),
                });
            }
        }
        None
    }

    fn visit_type_node(&self, node: Node) -> TypeNode {
        match node.kind() {
            "predefined_type" => TypeNode::Primitive(self.node_text(node).to_string()),
            "type_identifier" | "nested_type_identifier" => {
                let name = self.node_text(node);
                match name {
                    "string" | "number" | "bigint" | "boolean" | "void" | "null" | "undefined" => {
                        TypeNode::Primitive(name.to_string())
                    }
                    _ => TypeNode::Reference {
                        name: name.to_string(),
                        arguments: Vec::new(),
                    },
                }
            }
            "generic_type" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| self.node_text(n).to_string())
                    .unwrap_or_default();
                let mut arguments = Vec::new();
                if let Some(args) = node.child_by_field_name("type_arguments") {
                    let mut cursor = args.walk();
                    for arg in args.named_children(&mut cursor) {
                        arguments.push(self.visit_type_node(arg));
                    }
                }
                TypeNode::Reference { name, arguments }
            }
            "array_type" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() != "[" && child.kind() != "]" {
                        return TypeNode::Array(Box::new(self.visit_type_node(child)));
                    }
                }
                TypeNode::Array(Box::new(TypeNode::Primitive("unknown".to_string())))
            }
            "union_type" => {
                let mut variants = Vec::new();
                let mut has_undefined = false;
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "|" {
                        continue;
                    }
                    match self.visit_type_node(child) {
                        TypeNode::Union(nested) => variants.extend(nested),
                        TypeNode::Primitive(ref p) if p == "undefined" => has_undefined = true,
                        variant => variants.push(variant),
                    }
                }

                if has_undefined && variants.len() == 1 {
                    TypeNode::Optional(Box::new(variants.remove(0)))
                } else {
                    TypeNode::Union(variants)
                }
            }
            "parenthesized_type" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() != "(" && child.kind() != ")" {
                        return self.visit_type_node(child);
                    }
                }
                TypeNode::Primitive("unknown".to_string())
            }
            _ => TypeNode::Primitive(self.node_text(node).to_string()),
        }
    }

    fn visit_decorator(&self, node: Node) -> Decorator {
        let span = self.span(node);
        let mut target = None;
        let mut arguments = Vec::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "@" => {}
                "call_expression" => {
                    target = child.child_by_field_name("function");
                    if let Some(args) = child.child_by_field_name("arguments") {
                        arguments = self.visit_arguments(args);
                    }
                }
                _ => target = Some(child),
            }
        }

        let path = target.map(|t| self.node_text(t)).unwrap_or("");
        let (qualifier, name) = match path.rsplit_once('.') {
            Some((q, n)) => (Some(q.to_string()), n.to_string()),
            None => (None, path.to_string()),
        };

        Decorator {
            name,
            qualifier,
            arguments,
            span,
        }
    }

    fn visit_arguments(&self, node: Node) -> Vec<Expression> {
        let mut arguments = Vec::new();
        let mut cursor = node.walk();
        for arg in node.named_children(&mut cursor) {
            if arg.kind() != "comment" {
                arguments.push(self.visit_expression(arg));
            }
        }
        arguments
    }

    fn visit_expression(&self, node: Node) -> Expression {
        match node.kind() {
            "identifier" => Expression::Identifier {
                name: self.node_text(node).to_string(),
                span: self.span(node),
            },
            "string" | "template_string" => Expression::StringLiteral {
                value: self.extract_string_value(node),
                span: self.span(node),
            },
            "number" => match parse_number(self.node_text(node)) {
                Some(value) => Expression::NumberLiteral {
                    value,
                    span: self.span(node),
                },
                None => Expression::Other {
                    text: self.node_text(node).to_string(),
                    span: self.span(node),
                },
            },
            "true" => Expression::BooleanLiteral {
                value: true,
                span: self.span(node),
            },
            "false" => Expression::BooleanLiteral {
                value: false,
                span: self.span(node),
            },
            "null" => Expression::NullLiteral { span: self.span(node) },
            "array" => {
                let mut elements = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() != "comment" {
                        elements.push(self.visit_expression(child));
                    }
                }
                Expression::ArrayLiteral {
                    elements,
                    span: self.span(node),
                }
            }
            "object" => {
                let mut properties = Vec::new();
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "pair" || child.kind() == "shorthand_property_identifier" {
                        if let Some((key, value)) = self.visit_object_property(child) {
                            properties.push((key, value));
                        }
                    }
                }
                Expression::ObjectLiteral {
                    properties,
                    span: self.span(node),
                }
            }
            "member_expression" => {
                let object = node.child_by_field_name("object");
                let property = node.child_by_field_name("property");
                match (object, property) {
                    (Some(object), Some(property)) => Expression::MemberAccess {
                        object: Box::new(self.visit_expression(object)),
                        property: self.node_text(property).to_string(),
                        span: self.span(node),
                    },
                    _ => Expression::Other {
                        text: self.node_text(node).to_string(),
                        span: self.span(node),
                    },
                }
            }
            "call_expression" => {
                let callee = node.child_by_field_name("function");
                let arguments = node
                    .child_by_field_name("arguments")
                    .map(|args| self.visit_arguments(args))
                    .unwrap_or_default();
                match callee {
                    Some(callee) => Expression::Call {
                        callee: Box::new(self.visit_expression(callee)),
                        arguments,
                        span: self.span(node),
                    },
                    None => Expression::Other {
                        text: self.node_text(node).to_string(),
                        span: self.span(node),
                    },
                }
            }
            "unary_expression" => {
                let operator = node
                    .child_by_field_name("operator")
                    .map(|o| self.node_text(o).to_string())
                    .unwrap_or_default();
                match node.child_by_field_name("argument") {
                    Some(argument) if is_unary_operator(&operator) => Expression::Unary {
                        operator,
                        argument: Box::new(self.visit_expression(argument)),
                        span: self.span(node),
                    },
                    _ => Expression::Other {
                        text: self.node_text(node).to_string(),
                        span: self.span(node),
                    },
                }
            }
            "parenthesized_expression" | "as_expression" | "satisfies_expression" => {
                let mut cursor = node.walk();
                let inner = node.named_children(&mut cursor).next();
                match inner {
                    Some(inner) => self.visit_expression(inner),
                    None => Expression::Other {
                        text: self.node_text(node).to_string(),
                        span: self.span(node),
                    },
                }
            }
            _ => Expression::Other {
                text: self.node_text(node).to_string(),
                span: self.span(node),
            },
        }
    }

    fn visit_object_property(&self, node: Node) -> Option<(String, Expression)> {
        if node.kind() == "shorthand_property_identifier" {
            let name = self.node_text(node).to_string();
            return Some((
                name.clone(),
                Expression::Identifier {
                    name,
                    span: self.span(node),
                },
            ));
        }

        let key = node.child_by_field_name("key")?;
        let value = node.child_by_field_name("value")?;
        let key = self.node_text(key).trim_matches(|c| c == '"' || c == '\'').to_string();
        if key.is_empty() {
            return None;
        }

        Some((key, self.visit_expression(value)))
    }

    fn extract_string_value(&self, node: Node) -> String {
        let text = self.node_text(node);
        // Remove quotes
        if text.len() >= 2
            && ((text.starts_with('"') && text.ends_with('"'))
                || (text.starts_with('\'') && text.ends_with('\''))
                || (text.starts_with('`') && text.ends_with('`')))
        {
            text[1..text.len() - 1].to_string()
        } else {
            text.to_string()
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok().map(|v| v as f64);
    }
    cleaned.parse().ok()
}

fn is_unary_operator(s: &str) -> bool {
    matches!(s, "!" | "-" | "+" | "~" | "typeof" | "void" | "delete")
}
