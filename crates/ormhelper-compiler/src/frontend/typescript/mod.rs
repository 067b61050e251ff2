//! TypeScript frontend: decorated classes in `.ts`/`.tsx` files.

pub mod ast;
pub mod parser;
pub mod to_ir;

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use super::Frontend;
use crate::diagnostic::CompilerError;
use crate::ir::Program;
use parser::TypeScriptParser;

/// TypeScript frontend implementation.
pub struct TypeScriptFrontend {
    parser: TypeScriptParser,
}

impl TypeScriptFrontend {
    /// Creates a new TypeScript frontend.
    pub fn new() -> Result<Self, CompilerError> {
        Ok(Self {
            parser: TypeScriptParser::new()?,
        })
    }
}

impl Frontend for TypeScriptFrontend {
    fn language(&self) -> &str {
        "typescript"
    }

    fn extensions(&self) -> &[&str] {
        &["ts", "tsx"]
    }

    fn parse_directory(&mut self, dir: &Path) -> Result<Program, CompilerError> {
        if !dir.is_dir() {
            return Err(CompilerError::io(dir, "source directory does not exist"));
        }

        let mut parsed_files = Vec::new();

        // Sorted so class and declaration order is stable between passes.
        for entry in WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension() else {
                continue;
            };
            let ext_str = ext.to_string_lossy();
            if !self.extensions().contains(&ext_str.as_ref()) || path.to_string_lossy().ends_with(".d.ts") {
                continue;
            }

            let source = std::fs::read_to_string(path).map_err(|e| CompilerError::io(path, e.to_string()))?;
            debug!(path = %path.display(), "parsing");
            parsed_files.push(self.parser.parse(&source, path)?);
        }

        to_ir::to_ir(&parsed_files, dir.to_path_buf())
    }
}
