use crate::error::{CodegenError, CodegenResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options for one `generate()` run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateOptions {
    pub validate: bool,
    pub optimize: bool,
    /// 1-3; anything else is clamped to 1 with a warning.
    pub optimization_level: u8,
    /// Optimizer reports what it would change but returns the text untouched.
    pub dry_run: bool,
    /// Unknown widget properties warn, deprecated widgets become fatal.
    pub strict: bool,
    pub pretty_print: bool,
    pub call_super_constructor: bool,
    pub call_super_lifecycle: bool,
    /// Annotate `let`/`const` bindings with `/* Type */` comments.
    pub emit_type_comments: bool,
    /// Fail the run when more than this many error diagnostics are recorded.
    pub max_errors: Option<usize>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            validate: true,
            optimize: false,
            optimization_level: 1,
            dry_run: false,
            strict: false,
            pretty_print: true,
            call_super_constructor: true,
            call_super_lifecycle: true,
            emit_type_comments: false,
            max_errors: None,
        }
    }
}

impl GenerateOptions {
    pub fn from_json_str(json: &str) -> CodegenResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> CodegenResult<Self> {
        let data = fs::read_to_string(path).map_err(|source| CodegenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn with_optimization(mut self, level: u8) -> Self {
        self.optimize = true;
        self.optimization_level = level;
        self
    }
}
