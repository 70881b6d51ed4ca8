//! Multi-file driver: discover units, generate them in parallel, write modules.
//!
//! Every file gets its own pipeline run. The only state shared between runs
//! is the read-only registry, symbol table and cache directory.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cache::IncrementalCache;
use crate::diagnostics::{Diagnostic, Severity, FJS_MALFORMED_UNIT};
use crate::error::{CodegenError, CodegenResult};
use crate::imports::GlobalSymbolTable;
use crate::ir::DartFile;
use crate::pipeline::{CodeGenerator, GenerationResult};

/// Suffix of serialized program units.
pub const UNIT_SUFFIX: &str = ".ir.json";

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub source: PathBuf,
    pub result: GenerationResult,
    pub cached: bool,
}

/// Every `*.ir.json` file under `dir`, sorted.
pub fn discover_units(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(UNIT_SUFFIX))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

pub fn load_unit(path: &Path) -> CodegenResult<DartFile> {
    let data = fs::read_to_string(path).map_err(|source| CodegenError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| CodegenError::InvalidUnit {
        path: path.to_path_buf(),
        source,
    })
}

/// Symbol table covering every unit of the batch.
pub fn symbol_table(units: &[DartFile]) -> GlobalSymbolTable {
    let mut table = GlobalSymbolTable::default();
    for unit in units {
        table.add_unit(unit);
    }
    table
}

/// Loads `paths` and generates every unit that decodes.
///
/// Units that cannot be loaded produce a failed result instead of aborting
/// the batch.
pub fn generate_batch(
    paths: &[PathBuf],
    generator: &CodeGenerator,
    cache: Option<&IncrementalCache>,
) -> Vec<BatchOutcome> {
    let _span = tracing::info_span!("batch", files = paths.len()).entered();
    paths
        .par_iter()
        .map(|path| match load_unit(path) {
            Ok(unit) => generate_one(path, &unit, generator, cache),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unit skipped");
                let message = e.to_string();
                let issue = Diagnostic::new(FJS_MALFORMED_UNIT, Severity::Fatal, &message);
                BatchOutcome {
                    source: path.clone(),
                    result: GenerationResult::failed(&message, vec![issue]),
                    cached: false,
                }
            }
        })
        .collect()
}

fn generate_one(
    path: &Path,
    unit: &DartFile,
    generator: &CodeGenerator,
    cache: Option<&IncrementalCache>,
) -> BatchOutcome {
    if let Some(result) = cache.and_then(|c| c.get(unit, generator)) {
        return BatchOutcome {
            source: path.to_path_buf(),
            result,
            cached: true,
        };
    }
    let result = generator.generate(unit);
    if let Some(cache) = cache {
        if let Err(e) = cache.set(unit, generator, &result) {
            tracing::warn!(path = %path.display(), error = %e, "cache write failed");
        }
    }
    BatchOutcome {
        source: path.to_path_buf(),
        result,
        cached: false,
    }
}

/// `lib/main.ir.json` → `main.js`.
pub fn output_name(source: &Path) -> String {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = name.strip_suffix(UNIT_SUFFIX).unwrap_or(&name);
    format!("{}.js", stem)
}

/// Writes each generated module to `out_dir`. Failed units are skipped.
pub fn write_outputs(outcomes: &[BatchOutcome], out_dir: &Path) -> CodegenResult<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|source| CodegenError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::new();
    for outcome in outcomes {
        let Some(code) = &outcome.result.code else {
            continue;
        };
        let target = out_dir.join(output_name(&outcome.source));
        fs::write(&target, code).map_err(|source| CodegenError::Io {
            path: target.clone(),
            source,
        })?;
        tracing::debug!(path = %target.display(), bytes = code.len(), "module written");
        written.push(target);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ExpressionIR, FunctionDecl, StatementIR};
    use crate::options::GenerateOptions;

    fn write_unit(dir: &Path, file: &str, unit: &DartFile) -> PathBuf {
        let path = dir.join(file);
        fs::write(&path, serde_json::to_string(unit).unwrap()).unwrap();
        path
    }

    fn greeter(path: &str) -> DartFile {
        let mut unit = DartFile::new(path);
        unit.functions.push(FunctionDecl::new(
            "greet",
            vec![],
            vec![StatementIR::ret(ExpressionIR::string("hello"))],
        ));
        unit
    }

    #[test]
    fn test_discovery_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        write_unit(dir.path(), "b.ir.json", &greeter("lib/b.dart"));
        write_unit(&dir.path().join("nested"), "a.ir.json", &greeter("lib/a.dart"));
        fs::write(dir.path().join("notes.json"), "{}").unwrap();

        let found = discover_units(dir.path());
        assert_eq!(found.len(), 2);
        assert!(found[0] < found[1]);
        assert!(found.iter().all(|p| p.to_string_lossy().ends_with(UNIT_SUFFIX)));
    }

    #[test]
    fn test_batch_generates_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_unit(dir.path(), "greet.ir.json", &greeter("lib/greet.dart"));
        let bad = dir.path().join("broken.ir.json");
        fs::write(&bad, "not json").unwrap();

        let generator = CodeGenerator::new(GenerateOptions::default());
        let outcomes = generate_batch(&[bad, good], &generator, None);
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].result.success);
        assert!(outcomes[1].result.success, "{:?}", outcomes[1].result.issues);

        let out = dir.path().join("out");
        let written = write_outputs(&outcomes, &out).unwrap();
        assert_eq!(written, vec![out.join("greet.js")]);
        let code = fs::read_to_string(out.join("greet.js")).unwrap();
        assert!(code.contains("function greet()"));
    }

    #[test]
    fn test_second_run_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_unit(dir.path(), "greet.ir.json", &greeter("lib/greet.dart"));
        let cache = IncrementalCache::new(dir.path().join(".cache")).unwrap();
        let generator = CodeGenerator::new(GenerateOptions::default());

        let first = generate_batch(&[path.clone()], &generator, Some(&cache));
        let second = generate_batch(&[path], &generator, Some(&cache));
        assert!(!first[0].cached);
        assert!(second[0].cached);
        assert_eq!(first[0].result, second[0].result);
    }

    #[test]
    fn test_output_name_strips_suffix() {
        assert_eq!(output_name(Path::new("units/home_page.ir.json")), "home_page.js");
    }
}
