//! # ormhelper Compiler
//!
//! Generates database access-layer classes for TypeScript projects that
//! declare their tables and helpers with decorators. Sources are read by the
//! tree-sitter TypeScript frontend, which sits behind the `Frontend` trait.
//!
//! ## Architecture
//!
//! ```text
//! Source Code (TS)
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Frontend   │  Language-specific parsing
//! │  (TS → AST)  │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │      IR      │  Classes, ancestry, declarations
//! │  (AST → IR)  │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │    Schema    │  Table registry, id types
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Validate   │  Helper + upgrade routine checks, upgrade plans
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Codegen    │  <Name>DatabaseHelper.ts, <Name>DatabaseConfigUtil.ts
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ormhelper_compiler::{Compiler, CompilerConfig};
//!
//! let config = CompilerConfig {
//!     source_dir: "src/db".into(),
//!     out_dir: "src/generated".into(),
//!     ..Default::default()
//! };
//!
//! let result = Compiler::new(config).generate()?;
//! ```

pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod frontend;
pub mod ir;
pub mod schema;
pub mod validate;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info};

pub use config::{CompilerConfig, RuntimeProfile};
pub use diagnostic::CompilerError;

use codegen::GeneratedCode;
use ir::normalize_path;
use schema::{MigrationStrategy, Simulation, TableRegistry};
use validate::{ValidatedHelper, Validation};

/// The main compiler struct that orchestrates the generation pipeline.
pub struct Compiler {
    config: CompilerConfig,
}

/// Output of the analysis phases shared by every command.
struct Analysis {
    tables: usize,
    validation: Validation,
}

impl Compiler {
    /// Creates a new compiler with the given configuration.
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Runs a full pass and writes the generated modules.
    ///
    /// This runs the full pipeline:
    /// 1. Parse source files into IR
    /// 2. Build the table registry
    /// 3. Validate every helper independently
    /// 4. Generate TypeScript for the valid helpers
    /// 5. Write output files
    ///
    /// Valid helpers are written even when others fail; the pass then
    /// returns every collected diagnostic. Write failures are logged and
    /// counted but do not fail the pass.
    pub fn generate(&self) -> Result<CompileResult, CompilerError> {
        let out_dir = absolutize(&self.config.out_dir)?;
        let Analysis { tables, validation } = self.analyze()?;

        let generated = codegen::generate(&validation.helpers, &self.config.runtime, &out_dir);
        let (written, write_failures) = self.write_output(&generated, &out_dir);

        if let Some(err) = CompilerError::aggregate(validation.diagnostics) {
            return Err(err);
        }

        Ok(CompileResult {
            helpers: validation.helpers.len(),
            tables,
            written,
            write_failures,
        })
    }

    /// Parses and validates without generating code.
    pub fn check(&self) -> Result<CompileResult, CompilerError> {
        let Analysis { tables, validation } = self.analyze()?;
        if let Some(err) = CompilerError::aggregate(validation.diagnostics) {
            return Err(err);
        }

        Ok(CompileResult {
            helpers: validation.helpers.len(),
            tables,
            written: Vec::new(),
            write_failures: 0,
        })
    }

    /// Reports the upgrade dispatch of every helper, or of the one named
    /// `helper` (raw name, sanitized name, or class name).
    ///
    /// With `start`, each plan is also replayed from that installed version.
    pub fn plan(&self, helper: Option<&str>, start: Option<u32>) -> Result<Vec<HelperPlan>, CompilerError> {
        let Analysis { validation, .. } = self.analyze()?;
        if let Some(err) = CompilerError::aggregate(validation.diagnostics) {
            return Err(err);
        }

        let plans: Vec<HelperPlan> = validation
            .helpers
            .iter()
            .filter(|h| helper.map_or(true, |name| matches_helper(h, name)))
            .map(|h| HelperPlan::new(h, start))
            .collect();

        match helper {
            Some(name) if plans.is_empty() => Err(CompilerError::UnknownHelper {
                name: name.to_string(),
            }),
            _ => Ok(plans),
        }
    }

    fn analyze(&self) -> Result<Analysis, CompilerError> {
        let source_dir = absolutize(&self.config.source_dir)?;

        let mut frontend = frontend::create_frontend(&self.config.language)?;
        let program = frontend.parse_directory(&source_dir)?;
        debug!(
            language = frontend.language(),
            files = program.files.len(),
            classes = program.classes.len(),
            declarations = program.declarations.len(),
            "parsed sources"
        );

        let registry = TableRegistry::build(&program);
        debug!(tables = registry.len(), "built table registry");

        let validation = validate::validate_program(&program, &registry, &self.config.runtime);
        debug!(
            helpers = validation.helpers.len(),
            diagnostics = validation.diagnostics.len(),
            "validated declarations"
        );

        Ok(Analysis {
            tables: registry.len(),
            validation,
        })
    }

    /// Writes generated code to the output directory, one file at a time.
    ///
    /// Returns the written paths and the number of files that failed.
    fn write_output(&self, generated: &GeneratedCode, out_dir: &Path) -> (Vec<PathBuf>, usize) {
        let mut written = Vec::new();
        let mut failures = 0;

        if generated.files.is_empty() {
            return (written, failures);
        }

        if let Err(e) = std::fs::create_dir_all(out_dir) {
            error!(path = %out_dir.display(), error = %e, "failed to create output directory");
            return (written, generated.files.len());
        }

        for file in &generated.files {
            let path = out_dir.join(&file.file_name);

            if self.config.echo {
                println!("// ----- {} -----", file.file_name);
                println!("{}", file.content);
            }

            match std::fs::write(&path, &file.content) {
                Ok(()) => {
                    info!(helper = %file.helper, class = %file.class_name, path = %path.display(), "generated");
                    written.push(path);
                }
                Err(e) => {
                    error!(class = %file.class_name, path = %path.display(), error = %e, "failed to write generated file");
                    failures += 1;
                }
            }
        }

        (written, failures)
    }
}

/// Result of a successful pass.
#[derive(Debug)]
pub struct CompileResult {
    /// Number of helpers generated (or validated, for `check`).
    pub helpers: usize,
    /// Number of tables with a resolvable identifier.
    pub tables: usize,
    /// Files written to the output directory.
    pub written: Vec<PathBuf>,
    /// Files that could not be written.
    pub write_failures: usize,
}

/// The upgrade dispatch of one helper.
#[derive(Debug, Clone, Serialize)]
pub struct HelperPlan {
    pub helper: String,
    pub class: String,
    pub version: u32,
    pub migration: MigrationStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<Simulation>,
}

impl HelperPlan {
    fn new(helper: &ValidatedHelper, start: Option<u32>) -> Self {
        let simulation = match (&helper.migration, start) {
            (MigrationStrategy::Upgrade(plan), Some(start)) => Some(plan.simulate(start)),
            _ => None,
        };
        Self {
            helper: helper.spec.name.clone(),
            class: helper.class_name.clone(),
            version: helper.spec.version,
            migration: helper.migration.clone(),
            simulation,
        }
    }
}

fn matches_helper(helper: &ValidatedHelper, name: &str) -> bool {
    helper.spec.name == name || helper.sanitized_name() == name || helper.class_name == name
}

fn absolutize(path: &Path) -> Result<PathBuf, CompilerError> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = std::env::current_dir().map_err(|e| CompilerError::io(path, e.to_string()))?;
    Ok(normalize_path(&cwd.join(path)))
}
