//! Compiler error types.
#![allow(unused_assignments)]

use std::path::PathBuf;
use std::sync::Arc;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors that can occur during generation.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum CompilerError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("Failed to read file '{path}': {message}")]
    #[diagnostic(code(ormhelper::io::read_error))]
    IoError {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration file '{}': {message}", path.display())]
    #[diagnostic(
        code(ormhelper::config::invalid),
        help("See ormhelper.toml: keys `source_dir`, `out_dir`, `language` and a `[runtime]` table")
    )]
    InvalidConfig {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Failed to initialize parser")]
    #[diagnostic(code(ormhelper::parse::init_failed))]
    ParserInitFailed,

    #[error("Failed to parse file: {}", path.display())]
    #[diagnostic(code(ormhelper::parse::parse_failed))]
    ParseFailed {
        path: PathBuf,
    },

    // =========================================================================
    // Declaration Errors
    // =========================================================================
    #[error("Invalid argument `{argument}` in @{decorator}: expected {expected}")]
    #[diagnostic(code(ormhelper::declaration::invalid_argument))]
    InvalidDecoratorArgument {
        decorator: String,
        argument: String,
        expected: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("here")]
        span: SourceSpan,
    },

    // =========================================================================
    // Helper Errors
    // =========================================================================
    #[error("Class annotated with @Helper must have empty constructor.")]
    #[diagnostic(
        code(ormhelper::helper::missing_empty_constructor),
        help("Add `constructor() {{}}` to '{class}' or make every constructor parameter optional")
    )]
    MissingEmptyConstructor {
        class: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("no zero-argument constructor")]
        span: SourceSpan,
    },

    #[error("Class annotated with @Helper must not be abstract.")]
    #[diagnostic(
        code(ormhelper::helper::abstract_class),
        help("The generated migration routine instantiates '{class}'")
    )]
    AbstractHelper {
        class: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("abstract helper class")]
        span: SourceSpan,
    },

    #[error("@Helper on '{class}' is missing the `name` argument")]
    #[diagnostic(code(ormhelper::helper::missing_name))]
    MissingHelperName {
        class: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("add `name: \"...\"`")]
        span: SourceSpan,
    },

    #[error("@Helper name '{name}' has no alphanumeric characters")]
    #[diagnostic(
        code(ormhelper::helper::invalid_name),
        help("Generated class names are built from the alphanumeric characters of the name")
    )]
    InvalidHelperName {
        name: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("unusable name")]
        span: SourceSpan,
    },

    #[error("@Helper version must be at least 1, found {version}")]
    #[diagnostic(code(ormhelper::helper::invalid_version))]
    InvalidHelperVersion {
        version: i64,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("invalid version")]
        span: SourceSpan,
    },

    #[error("@Helper tables must contain classes annotated with @DatabaseTable with one id field annotated with @DatabaseField (can be inherited).")]
    #[diagnostic(
        code(ormhelper::helper::missing_identifier),
        help("'{table}' needs @DatabaseTable and a field marked `@DatabaseField({{ id: true }})` or `@DatabaseField({{ generatedId: true }})`")
    )]
    MissingTableId {
        table: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("no identifier field found for this table")]
        span: SourceSpan,
    },

    #[error("@Helper table '{table}' must be uniquely resolvable, but it is declared {count} times")]
    #[diagnostic(code(ormhelper::helper::ambiguous_table))]
    AmbiguousTable {
        table: String,
        count: usize,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("ambiguous table reference")]
        span: SourceSpan,
    },

    #[error("@Helper '{class}' generates '{generated}', which is already generated for '{first}'")]
    #[diagnostic(
        code(ormhelper::helper::duplicate_name),
        help("Give each @Helper a distinct name")
    )]
    DuplicateHelper {
        class: String,
        first: String,
        generated: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("duplicate helper name")]
        span: SourceSpan,
    },

    // =========================================================================
    // Upgrade Routine Errors
    // =========================================================================
    #[error("Method annotated with @OnUpgrade must be inside class annotated with @Helper.")]
    #[diagnostic(code(ormhelper::upgrade::outside_helper))]
    UpgradeOutsideHelper {
        method: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("'{method}' is not in a @Helper class")]
        span: SourceSpan,
    },

    #[error("Method annotated with @OnUpgrade must be public non-static method returning void.")]
    #[diagnostic(code(ormhelper::upgrade::modifiers))]
    UpgradeModifiers {
        method: String,
        modifier: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("'{method}' is {modifier}")]
        span: SourceSpan,
    },

    #[error("Method annotated with @OnUpgrade must have 2 parameters -> ({database_type} database, {connection_type} connectionSource).")]
    #[diagnostic(code(ormhelper::upgrade::parameter_count))]
    UpgradeParameterCount {
        method: String,
        found: usize,
        database_type: String,
        connection_type: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("{found} parameter(s)")]
        span: SourceSpan,
    },

    #[error("Method annotated with @OnUpgrade must have 1st parameter of type {expected}.")]
    #[diagnostic(code(ormhelper::upgrade::first_parameter))]
    UpgradeFirstParameter {
        method: String,
        expected: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("expected {expected}")]
        span: SourceSpan,
    },

    #[error("Method annotated with @OnUpgrade must have 2nd parameter of type {expected}.")]
    #[diagnostic(code(ormhelper::upgrade::second_parameter))]
    UpgradeSecondParameter {
        method: String,
        expected: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("expected {expected}")]
        span: SourceSpan,
    },

    #[error("@OnUpgrade on '{method}' is missing `toVersion`")]
    #[diagnostic(code(ormhelper::upgrade::missing_to_version))]
    MissingToVersion {
        method: String,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("add `toVersion: N`")]
        span: SourceSpan,
    },

    #[error("@OnUpgrade on '{method}' has invalid {argument} {value}")]
    #[diagnostic(
        code(ormhelper::upgrade::invalid_version),
        help("Versions are non-negative; omit `fromVersion` (or use -1) to upgrade from any older version")
    )]
    InvalidUpgradeVersion {
        method: String,
        argument: String,
        value: i64,
        #[source_code]
        src: NamedSource<Arc<str>>,
        #[label("invalid version")]
        span: SourceSpan,
    },

    // =========================================================================
    // Pass Errors
    // =========================================================================
    #[error("Generation failed with {count} error(s)")]
    #[diagnostic(code(ormhelper::generation_failed))]
    GenerationFailed {
        count: usize,
        #[related]
        diagnostics: Vec<CompilerError>,
    },

    #[error("No helper named '{name}'")]
    #[diagnostic(code(ormhelper::analysis::unknown_helper))]
    UnknownHelper {
        name: String,
    },

    // =========================================================================
    // Frontend Errors
    // =========================================================================
    #[error("Unsupported language: {language}")]
    #[diagnostic(code(ormhelper::frontend::unsupported_language))]
    UnsupportedLanguage {
        language: String,
    },
}

impl CompilerError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wraps collected diagnostics, or returns `None` when there are none.
    pub fn aggregate(diagnostics: Vec<CompilerError>) -> Option<Self> {
        if diagnostics.is_empty() {
            return None;
        }
        Some(Self::GenerationFailed {
            count: diagnostics.len(),
            diagnostics,
        })
    }
}
