//! # FlutterJS code generator
//!
//! Turns the Dart-derived program IR into JavaScript modules for the
//! FlutterJS widget runtime.
//!
//! ## Pipeline
//!
//! 1. **Analyze**: one read-only walk records used symbols, types, widgets,
//!    helper functions and every locally declared name.
//! 2. **Generate**: header, imports, helpers, variables, enums, classes in
//!    dependency order, functions, exports.
//! 3. **Validate** (optional): lexer-aware delimiter balance, marker
//!    comments, output size and a JavaScript parse.
//! 4. **Optimize** (optional): levels 1-3, best-effort.
//!
//! ## Identifier Resolution
//!
//! Identifiers resolve through a scope stack. The innermost declaration
//! wins, so a local shadowing a field emits bare. Instance members emit as
//! `this.x`, static members as `Class.x`, merged accessors as calls.
//! Names that resolve nowhere are error diagnostics, never silent globals.
//!
//! ## Failure Model
//!
//! Diagnostics are data. One failing method becomes a marked stub; one
//! unsupported node becomes a placeholder. `CodeGenerator::generate` never
//! panics and never returns without a `GenerationResult`.

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod analyze;
pub mod batch;
pub mod cache;
pub mod class;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod expression;
pub mod imports;
pub mod ir;
pub mod js;
pub mod optimize;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod scope;
pub mod source_scan;
pub mod stateful;
pub mod statement;
pub mod validate;
pub mod values;
pub mod visitor;
pub mod widget;

#[cfg(test)]
mod component_tests;
#[cfg(test)]
mod import_tests;
#[cfg(test)]
mod pipeline_tests;

pub use batch::{discover_units, generate_batch, load_unit, write_outputs, BatchOutcome};
pub use cache::IncrementalCache;
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity};
pub use error::{CodegenError, CodegenResult, EmitError, OptimizeError};
pub use imports::GlobalSymbolTable;
pub use ir::DartFile;
pub use optimize::{optimize, OptimizeReport};
pub use options::GenerateOptions;
pub use pipeline::{CodeGenerator, GenerationResult, GenerationStats};
pub use registry::WidgetRegistry;
pub use report::render_report;
pub use validate::{validate, ValidationReport};

/// Generates one JSON program unit and returns the serialized result.
#[cfg(feature = "napi")]
#[napi]
pub fn generate_native(unit_json: String, options_json: Option<String>) -> napi::Result<String> {
    let options = match options_json {
        Some(json) => GenerateOptions::from_json_str(&json)
            .map_err(|e| napi::Error::from_reason(e.to_string()))?,
        None => GenerateOptions::default(),
    };
    let result = CodeGenerator::new(options).generate_json(&unit_json);
    serde_json::to_string(&result).map_err(|e| napi::Error::from_reason(e.to_string()))
}

/// Renders the build log for a serialized `GenerationResult`.
#[cfg(feature = "napi")]
#[napi]
pub fn render_report_native(result_json: String) -> napi::Result<String> {
    let result: GenerationResult =
        serde_json::from_str(&result_json).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    Ok(render_report(&result))
}
