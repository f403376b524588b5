//! Benchmark Definition Loader
//!
//! Validates and loads `benchmark.yaml` into an immutable [`BenchmarkConfig`].
//! Beyond the validated fields the full document is preserved verbatim so
//! executor collaborators can read their own pass-through configuration.

use crate::modules::resolve_module_selection;
use crate::BenchmarkError;
use fxhash::FxHashMap;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Which functions the campaign exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionProfile {
    /// Every registered function.
    #[default]
    All,
    /// Only the functions listed in `functions`.
    Subset,
}

impl FunctionProfile {
    fn parse(s: &str) -> Result<Self, BenchmarkError> {
        match s {
            "all" => Ok(FunctionProfile::All),
            "subset" => Ok(FunctionProfile::Subset),
            other => Err(BenchmarkError::UnsupportedProfile(other.to_string())),
        }
    }
}

/// The validated, immutable experiment definition
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Function selection rule.
    pub function_profile: FunctionProfile,
    /// Selected functions; empty unless `function_profile` is `subset`.
    pub functions: Vec<String>,
    /// Platform modes to compare; always includes `jvm` and `native`.
    pub platform_modes: Vec<String>,
    /// Resolved module selection (dependency closure applied), in the
    /// canonical order declared by `module_dependencies`.
    pub modules: Vec<String>,
    /// The full document, preserved for executor collaborators.
    pub raw: Mapping,
}

/// Load and validate a benchmark definition file.
pub fn load_benchmark_config(path: &Path) -> Result<BenchmarkConfig, BenchmarkError> {
    let text = std::fs::read_to_string(path).map_err(|e| BenchmarkError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let value: Value = serde_yaml::from_str(&text).map_err(|e| BenchmarkError::Yaml {
        path: path.to_path_buf(),
        source: e,
    })?;

    // An empty document loads as null; treat it as an empty mapping so the
    // profile default still applies and platform_modes fails with its own
    // message rather than a type error.
    let raw = match value {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => return Err(BenchmarkError::NotAMapping),
    };

    let function_profile = match raw.get("function_profile") {
        None => FunctionProfile::All,
        Some(value) => FunctionProfile::parse(&string_of(value))?,
    };

    let functions = normalize_functions(raw.get("functions"), function_profile)?;
    let platform_modes = normalize_platform_modes(raw.get("platform_modes"))?;
    let modules = normalize_modules(raw.get("modules"), raw.get("module_dependencies"))?;

    Ok(BenchmarkConfig {
        function_profile,
        functions,
        platform_modes,
        modules,
        raw,
    })
}

fn normalize_functions(
    value: Option<&Value>,
    profile: FunctionProfile,
) -> Result<Vec<String>, BenchmarkError> {
    if profile == FunctionProfile::All {
        return Ok(Vec::new());
    }
    match value {
        Some(Value::Sequence(items)) if !items.is_empty() => {
            Ok(items.iter().map(string_of).collect())
        }
        _ => Err(BenchmarkError::EmptyFunctions),
    }
}

fn normalize_platform_modes(value: Option<&Value>) -> Result<Vec<String>, BenchmarkError> {
    let modes: Vec<String> = match value {
        Some(Value::Sequence(items)) if !items.is_empty() => {
            items.iter().map(string_of).collect()
        }
        _ => return Err(BenchmarkError::EmptyPlatformModes),
    };
    if !modes.iter().any(|m| m == "jvm") || !modes.iter().any(|m| m == "native") {
        return Err(BenchmarkError::MissingRequiredMode);
    }
    Ok(modes)
}

/// Resolve the optional module selection.
///
/// With a `module_dependencies` mapping present, its keys (in declaration
/// order) define the available module set and the selection is closed over
/// the declared dependencies. Without one, the listed modules are taken
/// as-is after trim/dedup.
fn normalize_modules(
    modules: Option<&Value>,
    dependencies: Option<&Value>,
) -> Result<Vec<String>, BenchmarkError> {
    let selected: Vec<String> = match modules {
        Some(Value::Sequence(items)) => items.iter().map(string_of).collect(),
        _ => return Ok(Vec::new()),
    };

    let (available, deps) = match dependencies {
        Some(Value::Mapping(mapping)) => {
            let mut available = Vec::new();
            let mut deps: FxHashMap<String, Vec<String>> = FxHashMap::default();
            for (key, value) in mapping {
                let module = string_of(key);
                let direct = match value {
                    Value::Sequence(items) => items.iter().map(string_of).collect(),
                    _ => Vec::new(),
                };
                deps.insert(module.clone(), direct);
                available.push(module);
            }
            (available, deps)
        }
        _ => (selected.clone(), FxHashMap::default()),
    };

    resolve_module_selection(&available, &selected, &deps)
}

fn string_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
