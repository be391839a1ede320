use remap_types::{CompositeMap, ComputeError, KeyValueMap, Record};

use crate::cache::{KeyAliasCache, ValueAliasCache, build_key_alias_cache, build_value_alias_cache};
use crate::composite::apply_composite_aliases;
use crate::key_value::apply_key_value_aliases;

/// Key-value map paired with caches derived once at construction.
///
/// The handle owns its map and only lends it out immutably, so the caches cannot
/// drift from it. To change the rules, take the map back with [`into_map`](Self::into_map)
/// and build a new handle.
#[derive(Debug, Clone)]
pub struct KeyValueAliases {
    map: KeyValueMap,
    key_cache: KeyAliasCache,
    value_cache: ValueAliasCache,
}

impl KeyValueAliases {
    pub fn new(map: KeyValueMap) -> Self {
        let key_cache = build_key_alias_cache(&map);
        let value_cache = build_value_alias_cache(&map);
        Self {
            map,
            key_cache,
            value_cache,
        }
    }

    pub fn map(&self) -> &KeyValueMap {
        &self.map
    }

    pub fn key_cache(&self) -> &KeyAliasCache {
        &self.key_cache
    }

    pub fn value_cache(&self) -> &ValueAliasCache {
        &self.value_cache
    }

    pub fn into_map(self) -> KeyValueMap {
        self.map
    }

    pub fn build(&self, source: &Record) -> Record {
        apply_key_value_aliases(
            source,
            &self.map,
            Some(&self.key_cache),
            Some(&self.value_cache),
        )
    }
}

impl From<KeyValueMap> for KeyValueAliases {
    fn from(map: KeyValueMap) -> Self {
        Self::new(map)
    }
}

/// Composite map paired with its key cache.
#[derive(Debug, Clone)]
pub struct CompositeAliases {
    map: CompositeMap,
    key_cache: KeyAliasCache,
}

impl CompositeAliases {
    pub fn new(map: CompositeMap) -> Self {
        let key_cache = build_key_alias_cache(&map);
        Self { map, key_cache }
    }

    pub fn map(&self) -> &CompositeMap {
        &self.map
    }

    pub fn key_cache(&self) -> &KeyAliasCache {
        &self.key_cache
    }

    pub fn into_map(self) -> CompositeMap {
        self.map
    }

    /// Fails only when a compute hook fails.
    pub fn build(&self, source: &Record) -> Result<Record, ComputeError> {
        apply_composite_aliases(source, &self.map, Some(&self.key_cache))
    }
}

impl From<CompositeMap> for CompositeAliases {
    fn from(map: CompositeMap) -> Self {
        Self::new(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remap_types::{CompositeRule, KeyValueRule, record};

    #[test]
    fn key_value_handle_exposes_its_caches() {
        let aliases = KeyValueAliases::new(
            KeyValueMap::new().with("status", KeyValueRule::new().alias("state").value("active", ["a"])),
        );
        assert_eq!(aliases.map().len(), 1);
        assert_eq!(aliases.key_cache()["state"], "status");
        assert_eq!(aliases.value_cache()["status"]["a"], "active");
        assert_eq!(
            aliases.build(&record([("state", "a")])),
            record([("status", "active")])
        );
    }

    #[test]
    fn repeated_builds_are_independent() {
        let aliases = KeyValueAliases::from(
            KeyValueMap::new().with("firstName", KeyValueRule::new().alias("name")),
        );
        let first = aliases.build(&record([("name", "Ada")]));
        let second = aliases.build(&record([("name", "Grace")]));
        assert_eq!(first, record([("firstName", "Ada")]));
        assert_eq!(second, record([("firstName", "Grace")]));
    }

    #[test]
    fn rebuilding_from_returned_map_picks_up_new_rules() {
        let aliases = CompositeAliases::new(
            CompositeMap::new().with("center", CompositeRule::new().field("x", "center")),
        );
        let mut map = aliases.into_map();
        map.insert("center", CompositeRule::new().alias("middle").field("x", "center"));
        let aliases = CompositeAliases::new(map);
        assert_eq!(
            aliases.build(&record([("middle", true)])).unwrap(),
            record([("x", "center")])
        );
    }
}
