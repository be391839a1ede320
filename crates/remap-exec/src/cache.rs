use std::collections::HashMap;

use remap_types::{ALIASES_FIELD, AliasMap, AliasRule, KeyValueMap};

/// Every recognized source key (canonical or alias) to its canonical key.
pub type KeyAliasCache = HashMap<String, String>;

/// Per canonical key: every recognized source value to its canonical value.
pub type ValueAliasCache = HashMap<String, HashMap<String, String>>;

/// Builds the key lookup for either mode.
///
/// Rules are visited in declaration order and each canonical key is registered
/// before its aliases. When two rules claim the same string the later one wins.
pub fn build_key_alias_cache<R: AliasRule>(map: &AliasMap<R>) -> KeyAliasCache {
    let mut cache = KeyAliasCache::with_capacity(map.len());
    for (key, rule) in map {
        claim(&mut cache, key, key);
        for alias in rule.aliases() {
            claim(&mut cache, alias, key);
        }
    }
    log::debug!(
        "built key alias cache: {} rules, {} entries",
        map.len(),
        cache.len()
    );
    cache
}

fn claim(cache: &mut KeyAliasCache, name: &str, key: &str) {
    if let Some(previous) = cache.insert(name.to_string(), key.to_string()) {
        if previous != key {
            log::warn!("alias '{name}' claimed by '{previous}' and '{key}'; using '{key}'");
        }
    }
}

/// Builds the value lookup for key-value maps. Every rule gets an entry, even
/// when it declares no value aliases.
pub fn build_value_alias_cache(map: &KeyValueMap) -> ValueAliasCache {
    let cache: ValueAliasCache = map
        .iter()
        .map(|(key, rule)| {
            let mut values = HashMap::new();
            for (canonical, aliases) in &rule.values {
                if canonical == ALIASES_FIELD {
                    continue;
                }
                for alias in aliases {
                    values.insert(alias.clone(), canonical.clone());
                }
            }
            (key.clone(), values)
        })
        .collect();
    log::debug!(
        "built value alias cache: {} rules, {} value aliases",
        cache.len(),
        cache.values().map(HashMap::len).sum::<usize>()
    );
    cache
}
