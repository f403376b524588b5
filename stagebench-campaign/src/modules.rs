//! Module Selection
//!
//! Normalizes an operator's module selection against the set of available
//! modules and expands it with transitive dependencies. The result always
//! follows `available`'s order, never the selection's, so two operators
//! picking the same modules in different orders produce the same build
//! inputs (and therefore the same build fingerprint).

use crate::BenchmarkError;
use fxhash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Normalize a module selection against the available set.
///
/// Trims entries, drops empties, dedups while keeping first occurrence,
/// rejects unknown modules, and reorders the result to follow `available`.
/// Idempotent: normalizing a normalized list is a no-op.
pub fn normalize_module_selection(
    available: &[String],
    selected: &[String],
) -> Result<Vec<String>, BenchmarkError> {
    let normalized_available: Vec<&str> = available
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect();
    let available_set: FxHashSet<&str> = normalized_available.iter().copied().collect();

    let mut deduped: Vec<&str> = Vec::new();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for raw in selected {
        let module = raw.trim();
        if module.is_empty() || seen.contains(module) {
            continue;
        }
        seen.insert(module);
        deduped.push(module);
    }

    let unknown: Vec<&str> = deduped
        .iter()
        .copied()
        .filter(|m| !available_set.contains(m))
        .collect();
    if !unknown.is_empty() {
        return Err(BenchmarkError::UnknownModules(unknown.join(", ")));
    }

    let selected_set: FxHashSet<&str> = deduped.into_iter().collect();
    Ok(normalized_available
        .into_iter()
        .filter(|m| selected_set.contains(m))
        .map(str::to_string)
        .collect())
}

/// Normalize a selection and close it over the dependency map.
///
/// Breadth-first worklist over `dependencies` (module -> direct deps); any
/// dependency absent from `available` is an error. The closed selection is
/// returned in `available` order.
pub fn resolve_module_selection(
    available: &[String],
    selected: &[String],
    dependencies: &FxHashMap<String, Vec<String>>,
) -> Result<Vec<String>, BenchmarkError> {
    let ordered_selected = normalize_module_selection(available, selected)?;
    if ordered_selected.is_empty() {
        return Ok(Vec::new());
    }

    let available_set: FxHashSet<&str> = available.iter().map(String::as_str).collect();
    let mut closure: FxHashSet<String> = ordered_selected.iter().cloned().collect();
    let mut worklist: VecDeque<String> = ordered_selected.into();

    while let Some(module) = worklist.pop_front() {
        let Some(deps) = dependencies.get(&module) else {
            continue;
        };
        for dep in deps {
            if !available_set.contains(dep.as_str()) {
                return Err(BenchmarkError::MissingModuleDependency {
                    module,
                    dependency: dep.clone(),
                });
            }
            if closure.contains(dep) {
                continue;
            }
            closure.insert(dep.clone());
            worklist.push_back(dep.clone());
        }
    }

    Ok(available
        .iter()
        .filter(|m| closure.contains(*m))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalization_follows_available_order() {
        let available = strings(&["core", "metrics", "tracing", "replay"]);
        let selected = strings(&["replay", "core"]);

        let normalized = normalize_module_selection(&available, &selected).unwrap();
        assert_eq!(normalized, strings(&["core", "replay"]));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let available = strings(&["core", "metrics", "tracing"]);
        let selected = strings(&[" tracing ", "core", "", "tracing"]);

        let once = normalize_module_selection(&available, &selected).unwrap();
        let twice = normalize_module_selection(&available, &once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, strings(&["core", "tracing"]));
    }

    #[test]
    fn test_normalization_rejects_unknown_modules() {
        let available = strings(&["core", "metrics"]);
        let selected = strings(&["core", "ghost", "phantom"]);

        let err = normalize_module_selection(&available, &selected).unwrap_err();
        assert_eq!(err.to_string(), "unknown modules: ghost, phantom");
    }

    #[test]
    fn test_resolution_pulls_in_transitive_dependencies() {
        let available = strings(&["core", "metrics", "tracing", "replay"]);
        let mut deps = FxHashMap::default();
        deps.insert("replay".to_string(), strings(&["tracing"]));
        deps.insert("tracing".to_string(), strings(&["core"]));

        let resolved =
            resolve_module_selection(&available, &strings(&["replay"]), &deps).unwrap();
        assert_eq!(resolved, strings(&["core", "tracing", "replay"]));
    }

    #[test]
    fn test_resolution_rejects_missing_dependency() {
        let available = strings(&["core", "replay"]);
        let mut deps = FxHashMap::default();
        deps.insert("replay".to_string(), strings(&["tracing"]));

        let err =
            resolve_module_selection(&available, &strings(&["replay"]), &deps).unwrap_err();
        assert_eq!(
            err.to_string(),
            "module 'replay' depends on missing module 'tracing'"
        );
    }

    #[test]
    fn test_empty_selection_resolves_to_empty() {
        let available = strings(&["core"]);
        let deps = FxHashMap::default();
        let resolved = resolve_module_selection(&available, &[], &deps).unwrap();
        assert!(resolved.is_empty());
    }
}
