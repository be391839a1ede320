use std::borrow::Cow;

use remap_types::{CompositeMap, Compute, ComputeError, Record, Value};

use crate::cache::{KeyAliasCache, build_key_alias_cache};

/// Expands boolean flags in `source` into destination fields.
///
/// Runs in two phases. First every source entry is visited in order: unrecognized
/// keys pass through, a `true` flag copies its rule's static fields (overwriting),
/// and any compute hook is queued whatever the flag's value. Then the queued hooks
/// run in queue order, each seeing the record as left by the previous one, and
/// their fields are merged in. Static fields therefore never overwrite computed ones.
pub fn apply_composite_aliases(
    source: &Record,
    map: &CompositeMap,
    key_cache: Option<&KeyAliasCache>,
) -> Result<Record, ComputeError> {
    let key_cache = key_cache
        .map(Cow::Borrowed)
        .unwrap_or_else(|| Cow::Owned(build_key_alias_cache(map)));

    let mut result = Record::new();
    let mut deferred: Vec<(&str, &Compute, &Value)> = Vec::new();
    for (source_key, source_value) in source {
        let Some((dest_key, rule)) = key_cache
            .get(source_key)
            .and_then(|dest_key| map.get(dest_key).map(|rule| (dest_key, rule)))
        else {
            log::trace!("passing through unrecognized key '{source_key}'");
            result.insert(source_key.clone(), source_value.clone());
            continue;
        };
        if let Some(compute) = &rule.compute {
            deferred.push((dest_key.as_str(), compute, source_value));
        }
        if !source_value.is_true() {
            continue;
        }
        for (field, value) in &rule.fields {
            result.insert(field.clone(), value.clone());
        }
    }

    for (key, compute, trigger) in deferred {
        log::trace!("running compute for '{key}'");
        let fields = compute
            .call(trigger, &result)
            .map_err(|err| err.for_key(key))?;
        result.extend(fields);
    }
    Ok(result)
}
