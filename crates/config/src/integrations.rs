//! Integration list normalization: flatten, drop falsy entries, fill hooks, dedupe.

use crate::path::ConfigPath;
use crate::reader::{Collector, RawObject};
use crate::schema::{IntegrationEntry, Passthrough};
use crate::shape::is_truthy;
use serde_json::Value;
use std::collections::BTreeSet;

/// Flatten nested arrays depth-first and drop every falsy entry.
///
/// The returned order is the left-to-right order of first encounter, and
/// positions in the result are the indices used in violation paths.
#[must_use]
pub fn flatten_truthy(items: &[Value]) -> Vec<&Value> {
    let mut flat = Vec::with_capacity(items.len());
    let mut stack: Vec<std::slice::Iter<'_, Value>> = vec![items.iter()];
    while let Some(level) = stack.last_mut() {
        match level.next() {
            Some(Value::Array(nested)) => stack.push(nested.iter()),
            Some(item) if is_truthy(item) => flat.push(item),
            Some(_) => {},
            None => {
                stack.pop();
            },
        }
    }
    flat
}

/// Normalize the top-level `integrations` value.
pub(crate) fn normalize_integrations(
    collector: &mut Collector,
    path: &ConfigPath,
    value: &Value,
) -> Option<Vec<IntegrationEntry>> {
    if !is_truthy(value) {
        return Some(Vec::new());
    }
    let items = collector.array(path, value)?;
    let before = collector.len();

    let entries: Vec<IntegrationEntry> = flatten_truthy(items)
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| normalize_entry(collector, &path.index(index), item))
        .collect();
    if collector.len() != before {
        return None;
    }
    Some(dedupe_by_name(entries))
}

/// Normalize one `{ name, hooks }` entry (also used for `adapter`).
pub(crate) fn normalize_entry(
    collector: &mut Collector,
    path: &ConfigPath,
    value: &Value,
) -> Option<IntegrationEntry> {
    let object: &RawObject = collector.object(path, value)?;
    let before = collector.len();
    let name = collector.read_required(object, path, "name", Collector::string);
    let hooks = collector.read_or(object, path, "hooks", Passthrough::new(), Collector::passthrough);
    if collector.len() != before {
        return None;
    }
    name.map(|name| IntegrationEntry { name, hooks })
}

fn dedupe_by_name(entries: Vec<IntegrationEntry>) -> Vec<IntegrationEntry> {
    let mut seen = BTreeSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            let first = seen.insert(entry.name.clone());
            if !first {
                tracing::warn!(
                    integration = %entry.name,
                    "duplicate integration dropped; keeping the first occurrence"
                );
            }
            first
        })
        .collect()
}
