//! Identifier type extraction.
//!
//! A table's identifier is the first field marked `id` or `generatedId`
//! found walking from the table class up through its ancestors. Numeric
//! primitives are replaced by their wrapper types so every identifier is a
//! reference type; anything else is used as declared.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::ir::{ClassId, DeclaredType, ImportRequest, ModuleRef, Program};

/// Semantic type of a table identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdType {
    /// A numeric primitive, replaced by its wrapper type.
    Wrapped {
        primitive: String,
        wrapper: &'static str,
    },
    /// The declared type, verbatim, with the imports needed to name it.
    Declared {
        text: String,
        imports: Vec<ImportRequest>,
    },
}

impl IdType {
    /// The type as written in generated code.
    pub fn render(&self) -> &str {
        match self {
            IdType::Wrapped { wrapper, .. } => wrapper,
            IdType::Declared { text, .. } => text,
        }
    }

    pub fn imports(&self) -> &[ImportRequest] {
        match self {
            IdType::Wrapped { .. } => &[],
            IdType::Declared { imports, .. } => imports,
        }
    }
}

/// Wrapper type for a numeric primitive keyword.
fn wrapper_of(primitive: &str) -> Option<&'static str> {
    match primitive {
        "number" => Some("Number"),
        "bigint" => Some("BigInt"),
        _ => None,
    }
}

/// A resolved table.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub class: ClassId,
    /// Simple class name.
    pub name: String,
    /// Module the table class is exported from.
    pub module: ModuleRef,
    pub id_type: IdType,
    /// Class that declares the identifier field (the table or an ancestor).
    pub declared_on: ClassId,
}

/// Memoizing identifier resolver over one [`Program`].
pub struct SchemaExtractor<'p> {
    program: &'p Program,
    cache: HashMap<ClassId, Option<(ClassId, IdType)>>,
    in_progress: HashSet<ClassId>,
}

impl<'p> SchemaExtractor<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            cache: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Resolves the identifier type of `class`, returning the declaring
    /// class alongside it, or `None` when no class in the ancestry marks
    /// an identifier field.
    pub fn resolve_id_type(&mut self, class: ClassId) -> Option<(ClassId, IdType)> {
        if let Some(cached) = self.cache.get(&class) {
            return cached.clone();
        }
        // Cyclic `extends` chains resolve to nothing.
        if !self.in_progress.insert(class) {
            return None;
        }

        let program = self.program;
        let resolved = match &program.class(class).id_field {
            Some(field) => Some((class, self.id_type_of(class, field.declared_type.as_ref()))),
            None => match program.superclass_of(class) {
                Some(parent) => self.resolve_id_type(parent),
                None => None,
            },
        };

        self.in_progress.remove(&class);
        self.cache.insert(class, resolved.clone());
        resolved
    }

    fn id_type_of(&self, class: ClassId, declared: Option<&DeclaredType>) -> IdType {
        let Some(declared) = declared else {
            return IdType::Declared {
                text: "unknown".to_string(),
                imports: Vec::new(),
            };
        };

        if let Some((primitive, wrapper)) = declared
            .primitive
            .as_deref()
            .and_then(|p| wrapper_of(p).map(|w| (p, w)))
        {
            return IdType::Wrapped {
                primitive: primitive.to_string(),
                wrapper,
            };
        }

        let file = self.program.class(class).file;
        let mut imports: Vec<ImportRequest> = declared
            .references
            .iter()
            .filter_map(|name| self.program.import_request(file, name))
            .collect();
        imports.sort();
        imports.dedup();

        IdType::Declared {
            text: declared.text.clone(),
            imports,
        }
    }
}

/// Immutable table lookup built once per pass.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: BTreeMap<ClassId, TableSpec>,
}

impl TableRegistry {
    /// Resolves every `@DatabaseTable` class in the program.
    pub fn build(program: &Program) -> Self {
        let mut extractor = SchemaExtractor::new(program);
        let mut tables = BTreeMap::new();

        for class in program.tables() {
            let info = program.class(class);
            match extractor.resolve_id_type(class) {
                Some((declared_on, id_type)) => {
                    debug!(table = %info.name, id_type = id_type.render(), "resolved table");
                    tables.insert(
                        class,
                        TableSpec {
                            class,
                            name: info.name.clone(),
                            module: program.module_of(class),
                            id_type,
                            declared_on,
                        },
                    );
                }
                None => debug!(table = %info.name, "table has no identifier field"),
            }
        }

        Self { tables }
    }

    pub fn lookup(&self, class: ClassId) -> Option<&TableSpec> {
        self.tables.get(&class)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableSpec> {
        self.tables.values()
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::frontend::typescript::{parser::TypeScriptParser, to_ir::to_ir};

    fn program(sources: &[(&str, &str)]) -> Program {
        let mut parser = TypeScriptParser::new().unwrap();
        let files: Vec<_> = sources
            .iter()
            .map(|(path, source)| parser.parse(source, Path::new(path)).unwrap())
            .collect();
        to_ir(&files, PathBuf::from("/src")).unwrap()
    }

    fn class_id(program: &Program, name: &str) -> ClassId {
        program.classes.iter().position(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_inherited_number_id_is_wrapped() {
        let program = program(&[
            (
                "/src/base.ts",
                r#"
import { DatabaseField } from "@ormhelper/runtime";
export abstract class BaseEntity {
    @DatabaseField({ generatedId: true })
    id: number;
}
"#,
            ),
            (
                "/src/question.ts",
                r#"
import { DatabaseTable } from "@ormhelper/runtime";
import { BaseEntity } from "./base";
@DatabaseTable()
export class Question extends BaseEntity {}
"#,
            ),
        ]);

        let registry = TableRegistry::build(&program);
        let question = registry.lookup(class_id(&program, "Question")).unwrap();
        assert_eq!(question.id_type.render(), "Number");
        assert_eq!(question.declared_on, class_id(&program, "BaseEntity"));
        assert_eq!(question.module, ModuleRef::File(PathBuf::from("/src/question")));
    }

    #[test]
    fn test_nearest_identifier_wins() {
        let program = program(&[(
            "/src/tables.ts",
            r#"
class Root { @DatabaseField({ id: true }) key: number; }
class Middle extends Root {
    @DatabaseField() label: string;
    @DatabaseField({ id: true }) code: string;
    @DatabaseField({ id: true }) other: number;
}
@DatabaseTable
class Leaf extends Middle {}
"#,
        )]);

        let registry = TableRegistry::build(&program);
        let leaf = registry.lookup(class_id(&program, "Leaf")).unwrap();
        assert_eq!(leaf.id_type.render(), "string");
        assert!(leaf.id_type.imports().is_empty());
    }

    #[test]
    fn test_missing_identifier_is_not_registered() {
        let program = program(&[(
            "/src/tables.ts",
            r#"
class Base { @DatabaseField() name: string; }
@DatabaseTable() class NoId extends Base {}
@DatabaseTable() class Orphan extends NotScanned {}
"#,
        )]);

        let registry = TableRegistry::build(&program);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_declared_id_type_keeps_its_imports() {
        let program = program(&[(
            "/src/tables.ts",
            r#"
import { Uuid as Id } from "./ids";
import * as keys from "@acme/keys";
@DatabaseTable() export class A { @DatabaseField({ id: true }) id: Id; }
@DatabaseTable() export class B { @DatabaseField({ id: true }) id: keys.Key<string>; }
@DatabaseTable() export class C { @DatabaseField({ id: true }) id: bigint; }
"#,
        )]);

        let registry = TableRegistry::build(&program);
        let a = registry.lookup(class_id(&program, "A")).unwrap();
        assert_eq!(a.id_type.render(), "Id");
        assert_eq!(
            a.id_type.imports(),
            &[ImportRequest {
                module: ModuleRef::File(PathBuf::from("/src/ids")),
                exported: "Uuid".to_string(),
                local: "Id".to_string(),
            }]
        );

        let b = registry.lookup(class_id(&program, "B")).unwrap();
        assert_eq!(b.id_type.render(), "keys.Key<string>");
        assert_eq!(b.id_type.imports()[0].exported, "*");
        assert_eq!(b.id_type.imports()[0].local, "keys");

        let c = registry.lookup(class_id(&program, "C")).unwrap();
        assert_eq!(c.id_type.render(), "BigInt");
    }

    #[test]
    fn test_cyclic_ancestry_terminates() {
        let program = program(&[(
            "/src/cycle.ts",
            r#"
@DatabaseTable() class A extends B {}
class B extends A {}
"#,
        )]);

        let registry = TableRegistry::build(&program);
        assert!(registry.lookup(class_id(&program, "A")).is_none());
    }
}
