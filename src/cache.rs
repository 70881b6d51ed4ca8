use crate::error::{CodegenError, CodegenResult};
use crate::imports::GlobalSymbolTable;
use crate::ir::DartFile;
use crate::pipeline::{CodeGenerator, GenerationResult};
use crate::registry::WidgetRegistry;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub result: GenerationResult,
}

/// Generation results keyed by the unit, the options and the cross-file
/// context (widget registry and symbol table) the generator resolves against.
pub struct IncrementalCache {
    cache_dir: PathBuf,
}

impl IncrementalCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> CodegenResult<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).map_err(|source| CodegenError::Io {
            path: cache_dir.clone(),
            source,
        })?;
        Ok(Self { cache_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn compute_hash(unit: &DartFile, generator: &CodeGenerator) -> CodegenResult<String> {
        let mut hasher = Sha256::new();
        hasher.update(to_json(unit)?);
        hasher.update(b"\0");
        hasher.update(to_json(generator.options())?);
        hasher.update(b"\0");
        hash_registry(&mut hasher, generator.registry())?;
        hasher.update(b"\0");
        hash_symbols(&mut hasher, generator.symbols());
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn get_cache_path(&self, file_path: &str) -> PathBuf {
        let safe_name = file_path.replace(['/', '\\', ':'], "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    pub fn get(&self, unit: &DartFile, generator: &CodeGenerator) -> Option<GenerationResult> {
        let cache_path = self.get_cache_path(&unit.file_path);
        let data = fs::read_to_string(&cache_path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(file = %unit.file_path, error = %e, "corrupt cache entry removed");
                fs::remove_file(&cache_path).ok();
                return None;
            }
        };

        let current_hash = Self::compute_hash(unit, generator).ok()?;
        if entry.hash == current_hash {
            tracing::debug!(file = %unit.file_path, "cache hit");
            Some(entry.result)
        } else {
            None
        }
    }

    pub fn set(&self, unit: &DartFile, generator: &CodeGenerator, result: &GenerationResult) -> CodegenResult<()> {
        let cache_path = self.get_cache_path(&unit.file_path);
        let hash = Self::compute_hash(unit, generator)?;
        let entry = CacheEntry {
            hash,
            result: result.clone(),
        };
        let data = serde_json::to_string(&entry).map_err(|e| CodegenError::Cache(e.to_string()))?;
        fs::write(&cache_path, data).map_err(|source| CodegenError::Io {
            path: cache_path,
            source,
        })
    }
}

fn to_json<T: Serialize>(value: &T) -> CodegenResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| CodegenError::Cache(e.to_string()))
}

fn hash_registry(hasher: &mut Sha256, registry: &WidgetRegistry) -> CodegenResult<()> {
    for entry in registry.entries() {
        hasher.update(to_json(entry)?);
        hasher.update(b"\n");
    }
    Ok(())
}

/// Table contents in sorted order; hash-map iteration order must not leak
/// into the key.
fn hash_symbols(hasher: &mut Sha256, symbols: &GlobalSymbolTable) {
    let mut names: Vec<_> = symbols.symbols.iter().collect();
    names.sort();
    for (name, uri) in names {
        hasher.update(format!("s {} {}\n", name, uri));
    }
    let mut typedefs: Vec<_> = symbols.typedefs.iter().collect();
    typedefs.sort();
    for name in typedefs {
        hasher.update(format!("t {}\n", name));
    }
    let mut modules: Vec<_> = symbols.module_imports.iter().collect();
    modules.sort();
    for (from, targets) in modules {
        for to in targets {
            hasher.update(format!("i {} {}\n", from, to));
        }
    }
}
