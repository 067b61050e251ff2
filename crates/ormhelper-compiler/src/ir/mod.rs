//! Language-agnostic intermediate representation.
//!
//! This IR is produced by language frontends and consumed by the extractor,
//! the validator and the code generators. It holds every scanned class, the
//! import bindings of every file, and the declarations found on them
//! (tables, helpers, upgrade routines) with their decorator arguments
//! already evaluated.

mod declaration;

pub use declaration::{
    ArgumentIssue, ClassId, ClassInfo, ConstructorShape, DeclaredType, Declaration, HelperDecl,
    IdField, Located, ParameterInfo, Resolution, TableRef, UpgradeRoutineDecl,
};

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Index into [`Program::files`].
pub type FileId = usize;

/// Where a type or value binding comes from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleRef {
    /// A bare module specifier (`@ormhelper/runtime`).
    Package(String),
    /// A scanned source file, identified by its path without extension.
    File(PathBuf),
}

/// Identity of a named type: the module that exports it and its exported name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeIdentity {
    pub module: ModuleRef,
    pub name: String,
}

impl TypeIdentity {
    pub fn package(module: &str, name: &str) -> Self {
        Self {
            module: ModuleRef::Package(module.to_string()),
            name: name.to_string(),
        }
    }
}

/// A binding a generated module must import to name a type the way the
/// scanned source wrote it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportRequest {
    pub module: ModuleRef,
    /// Exported name, or `*` for a namespace import.
    pub exported: String,
    /// Local name in the generated module.
    pub local: String,
}

/// A local name bound by an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBinding {
    Named { module: ModuleRef, name: String },
    Namespace { module: ModuleRef },
}

/// Local name -> import binding for one file.
#[derive(Debug, Default, Clone)]
pub struct ImportMap {
    bindings: BTreeMap<String, ImportBinding>,
}

impl ImportMap {
    pub fn insert(&mut self, local: impl Into<String>, binding: ImportBinding) {
        self.bindings.insert(local.into(), binding);
    }

    pub fn get(&self, local: &str) -> Option<&ImportBinding> {
        self.bindings.get(local)
    }
}

/// A scanned source file.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    /// `path` without its extension; the identity of this file as a module.
    pub module_path: PathBuf,
    pub source: Arc<str>,
    pub imports: ImportMap,
    /// Classes, type aliases, interfaces and enums declared in this file.
    pub declared_types: BTreeSet<String>,
}

/// Everything a frontend extracted from the source directory.
#[derive(Debug)]
pub struct Program {
    pub source_dir: PathBuf,
    pub files: Vec<SourceFile>,
    pub classes: Vec<ClassInfo>,
    pub declarations: Vec<Declaration>,
}

impl Program {
    pub fn new(source_dir: PathBuf) -> Self {
        Self {
            source_dir,
            files: Vec::new(),
            classes: Vec::new(),
            declarations: Vec::new(),
        }
    }

    pub fn class(&self, id: ClassId) -> &ClassInfo {
        &self.classes[id]
    }

    pub fn file_of(&self, id: ClassId) -> &SourceFile {
        &self.files[self.classes[id].file]
    }

    /// The module a class is exported from.
    pub fn module_of(&self, id: ClassId) -> ModuleRef {
        ModuleRef::File(self.file_of(id).module_path.clone())
    }

    /// Resolves a name as written in `file` (`Foo` or `ns.Foo`) to the
    /// identity of the type it denotes. Names that are neither imported nor
    /// declared in the file (globals) have no identity.
    pub fn identity_of(&self, file: FileId, written: &str) -> Option<TypeIdentity> {
        let source = &self.files[file];
        match written.rsplit_once('.') {
            Some((qualifier, name)) => match source.imports.get(qualifier) {
                Some(ImportBinding::Namespace { module }) => Some(TypeIdentity {
                    module: module.clone(),
                    name: name.to_string(),
                }),
                _ => None,
            },
            None => match source.imports.get(written) {
                Some(ImportBinding::Named { module, name }) => Some(TypeIdentity {
                    module: module.clone(),
                    name: name.clone(),
                }),
                Some(ImportBinding::Namespace { .. }) => None,
                None if source.declared_types.contains(written) => Some(TypeIdentity {
                    module: ModuleRef::File(source.module_path.clone()),
                    name: written.to_string(),
                }),
                None => None,
            },
        }
    }

    /// The import a generated module needs so that `written` (as it appears
    /// in `file`) means the same type. Globals need none.
    pub fn import_request(&self, file: FileId, written: &str) -> Option<ImportRequest> {
        let source = &self.files[file];
        if let Some((qualifier, _)) = written.split_once('.') {
            return match source.imports.get(qualifier) {
                Some(ImportBinding::Namespace { module }) => Some(ImportRequest {
                    module: module.clone(),
                    exported: "*".to_string(),
                    local: qualifier.to_string(),
                }),
                _ => None,
            };
        }
        self.identity_of(file, written).map(|identity| ImportRequest {
            module: identity.module,
            exported: identity.name,
            local: written.to_string(),
        })
    }

    /// The exported name a decorator refers to, after import aliasing.
    pub fn decorator_name<'a>(&'a self, file: FileId, qualifier: Option<&str>, name: &'a str) -> &'a str {
        let imports = &self.files[file].imports;
        match qualifier {
            Some(_) => name,
            None => match imports.get(name) {
                Some(ImportBinding::Named { name: exported, .. }) => exported,
                _ => name,
            },
        }
    }

    /// Resolves a class reference written in `file` to a scanned class.
    ///
    /// References that resolve to a scanned file must match a class declared
    /// there. References with no identity, or imported from a bare module
    /// specifier (path aliases), fall back to a search by simple name.
    pub fn resolve_class(&self, file: FileId, written: &str) -> Resolution {
        let simple = written.rsplit('.').next().unwrap_or(written);

        if let Some(TypeIdentity {
            module: ModuleRef::File(module),
            name,
        }) = self.identity_of(file, written)
        {
            let index = module.join("index");
            let matches: Vec<ClassId> = self
                .classes
                .iter()
                .enumerate()
                .filter(|(_, c)| {
                    let path = &self.files[c.file].module_path;
                    c.name == name && (*path == module || *path == index)
                })
                .map(|(id, _)| id)
                .collect();
            return Resolution::from_matches(matches);
        }

        let matches: Vec<ClassId> = self
            .classes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name == simple)
            .map(|(id, _)| id)
            .collect();
        Resolution::from_matches(matches)
    }

    /// Resolves the `extends` target of a class, if it is a scanned class.
    pub fn superclass_of(&self, id: ClassId) -> Option<ClassId> {
        let class = &self.classes[id];
        let written = class.superclass.as_deref()?;
        match self.resolve_class(class.file, written) {
            Resolution::Found(parent) if parent != id => Some(parent),
            _ => None,
        }
    }

    /// Whether `new C()` type-checks: the nearest class in the ancestry that
    /// declares constructors decides; a root with none has the implicit one.
    pub fn has_empty_constructor(&self, id: ClassId) -> bool {
        let mut current = id;
        for _ in 0..self.classes.len() {
            match self.classes[current].constructor {
                ConstructorShape::ZeroArgs => return true,
                ConstructorShape::RequiresArgs => return false,
                ConstructorShape::Inherited => match self.superclass_of(current) {
                    Some(parent) => current = parent,
                    None => return true,
                },
            }
        }
        // Cyclic ancestry.
        false
    }

    /// Iterates over helper declarations.
    pub fn helpers(&self) -> impl Iterator<Item = &HelperDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Helper(h) => Some(h),
            _ => None,
        })
    }

    /// Iterates over upgrade routine declarations.
    pub fn upgrade_routines(&self) -> impl Iterator<Item = &UpgradeRoutineDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::UpgradeRoutine(r) => Some(r),
            _ => None,
        })
    }

    /// Iterates over table declarations.
    pub fn tables(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Table(id) => Some(*id),
            _ => None,
        })
    }
}

/// Lexically normalizes a path, resolving `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Strips a script extension from a module path (`./question.js` -> `./question`).
pub fn strip_script_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" | "mts" | "cts") => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_parent_components() {
        assert_eq!(normalize_path(Path::new("/a/b/./../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn strip_only_script_extensions() {
        assert_eq!(strip_script_extension(Path::new("/db/question.js")), PathBuf::from("/db/question"));
        assert_eq!(strip_script_extension(Path::new("/db/question.model")), PathBuf::from("/db/question.model"));
    }
}
