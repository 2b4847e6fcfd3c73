use std::sync::{Arc, OnceLock};

use hashbrown::HashMap as FastHashMap;
use parking_lot::RwLock;

/// Process-wide, append-only intern table keyed by canonical pattern string.
/// Interning is idempotent; the returned `Arc<str>` is shared by every caller
/// that interns the same string, so pointer equality implies value equality.
struct Table {
    map: RwLock<FastHashMap<Box<str>, Arc<str>>>,
}

static TABLE: OnceLock<Table> = OnceLock::new();

fn table() -> &'static Table {
    TABLE.get_or_init(|| Table {
        map: RwLock::new(FastHashMap::new()),
    })
}

/// Interns `s`, returning the canonical shared handle.
pub fn intern(s: &str) -> Arc<str> {
    let t = table();

    if let Some(existing) = t.map.read().get(s) {
        return existing.clone();
    }

    let mut map = t.map.write();
    if let Some(existing) = map.get(s) {
        return existing.clone();
    }

    let arc: Arc<str> = Arc::from(s);
    map.insert(s.to_string().into_boxed_str(), arc.clone());
    arc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent_and_cheap_to_compare() {
        let a = intern("[0-9]+");
        let b = intern("[0-9]+");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
