//! Alias resolution engine: lookup caches built once from a declarative map, and the
//! key-value and composite appliers that rewrite source records through them.

mod cache;
mod cast;
mod composite;
mod handle;
mod key_value;

pub use cache::{KeyAliasCache, ValueAliasCache, build_key_alias_cache, build_value_alias_cache};
pub use cast::cast_value;
pub use composite::apply_composite_aliases;
pub use handle::{CompositeAliases, KeyValueAliases};
pub use key_value::apply_key_value_aliases;
pub use remap_types::{
    AliasMap, AliasRule, CastTo, CompositeMap, CompositeRule, Compute, ComputeError, KeyValueMap,
    KeyValueRule, LoadError, Record, Value, record, record_from_json,
};
