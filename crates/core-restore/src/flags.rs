//! Flag assignments and their per-run interner.
//!
//! A `FlagSet` preserves insertion order so that output stays a deterministic
//! function of the input, but equality is map equality: two sets with the same
//! pairs in a different order are the same assignment. Appearance sets compare
//! interned ids element-wise, which keeps the list-order-sensitive identity of
//! grouped conditions cheap (slice equality on `u32`).

/// One variant's flag assignment: an insertion-ordered `name -> value` map.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    entries: Vec<(String, String)>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value for `name`. First insertion fixes the
    /// position of the key in iteration order.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.entries.iter().position(|(k, _)| *k == name) {
            Some(index) => self.entries[index].1 = value.into(),
            None => self.entries.push((name, value.into())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for FlagSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k) == Some(v.as_str()))
    }
}

impl Eq for FlagSet {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = FlagSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Dense id of an interned flag assignment, valid for one decompilation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FlagsId(u32);

/// Per-run interner. Lookup is a linear scan with map equality; the number of
/// distinct assignments is bounded by the number of input variants.
#[derive(Debug, Default)]
pub(crate) struct FlagTable {
    sets: Vec<FlagSet>,
}

impl FlagTable {
    pub(crate) fn intern(&mut self, set: &FlagSet) -> FlagsId {
        if let Some(pos) = self.sets.iter().position(|s| s == set) {
            return FlagsId(pos as u32);
        }
        self.sets.push(set.clone());
        FlagsId((self.sets.len() - 1) as u32)
    }

    pub(crate) fn resolve(&self, id: FlagsId) -> &FlagSet {
        &self.sets[id.0 as usize]
    }
}
