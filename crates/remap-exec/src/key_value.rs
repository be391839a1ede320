use std::borrow::Cow;

use remap_types::{KeyValueMap, Record, Value};

use crate::cache::{KeyAliasCache, ValueAliasCache, build_key_alias_cache, build_value_alias_cache};
use crate::cast::cast_value;

/// Renames keys and remaps values of `source` through a key-value map.
///
/// Missing caches are rebuilt from `map` for this call only. Unrecognized keys are
/// copied unchanged. For recognized keys, a matching value alias replaces the raw
/// value, and the rule's cast (if any) applies to whichever value is kept.
pub fn apply_key_value_aliases(
    source: &Record,
    map: &KeyValueMap,
    key_cache: Option<&KeyAliasCache>,
    value_cache: Option<&ValueAliasCache>,
) -> Record {
    let key_cache = key_cache
        .map(Cow::Borrowed)
        .unwrap_or_else(|| Cow::Owned(build_key_alias_cache(map)));
    let value_cache = value_cache
        .map(Cow::Borrowed)
        .unwrap_or_else(|| Cow::Owned(build_value_alias_cache(map)));

    let mut result = Record::with_capacity(source.len());
    for (source_key, source_value) in source {
        let Some(dest_key) = key_cache.get(source_key) else {
            log::trace!("passing through unrecognized key '{source_key}'");
            result.insert(source_key.clone(), source_value.clone());
            continue;
        };
        let cast = map.get(dest_key).and_then(|rule| rule.cast_to);
        let canonical = lookup_value_alias(&value_cache, dest_key, source_value);
        let value = match (canonical, cast) {
            (Some(canonical), Some(cast)) => cast_value(&canonical, cast),
            (Some(canonical), None) => canonical,
            (None, Some(cast)) => cast_value(source_value, cast),
            (None, None) => source_value.clone(),
        };
        result.insert(dest_key.clone(), value);
    }
    result
}

fn lookup_value_alias(cache: &ValueAliasCache, key: &str, value: &Value) -> Option<Value> {
    let aliases = cache.get(key)?;
    let text = match value {
        Value::List(_) | Value::Record(_) => return None,
        scalar => scalar.text_form(),
    };
    aliases.get(&text).cloned().map(Value::Text)
}
