//! Load-order table
//!
//! A list of `(order, key)` pairs rather than a map: several keys may share
//! an order. Keys are normalized skin keys.

#[derive(Debug, Clone, Default)]
pub struct LoadOrderTable {
    entries: Vec<(i32, String)>,
}

impl LoadOrderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert by key. Returns `false` when the key already had this order.
    pub fn set(&mut self, key: &str, order: i32) -> bool {
        if let Some(pos) = self.entries.iter().position(|(_, k)| k == key) {
            if self.entries[pos].0 == order {
                return false;
            }
            self.entries.remove(pos);
        }
        self.entries.push((order, key.to_string()));
        true
    }

    /// Order of the first entry for `key`; `None` when never set
    pub fn get(&self, key: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|(_, k)| k == key)
            .map(|(order, _)| *order)
    }

    pub fn remove(&mut self, key: &str) -> Option<i32> {
        let pos = self.entries.iter().position(|(_, k)| k == key)?;
        Some(self.entries.remove(pos).0)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_key_has_no_order() {
        let table = LoadOrderTable::new();
        assert_eq!(table.get("a"), None);
    }

    #[test]
    fn test_explicit_zero_is_distinct_from_unset() {
        let mut table = LoadOrderTable::new();
        table.set("a", 0);
        assert_eq!(table.get("a"), Some(0));
        assert_eq!(table.get("b"), None);
    }

    #[test]
    fn test_upsert_replaces_single_entry() {
        let mut table = LoadOrderTable::new();
        assert!(table.set("a", 1));
        assert!(!table.set("a", 1));
        assert!(table.set("a", 7));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a"), Some(7));
    }

    #[test]
    fn test_keys_may_share_an_order() {
        let mut table = LoadOrderTable::new();
        table.set("a", 3);
        table.set("b", 3);
        assert_eq!(table.len(), 2);
        assert_eq!(table.remove("a"), Some(3));
        assert_eq!(table.remove("a"), None);
        assert_eq!(table.get("b"), Some(3));
    }
}
