/// A single `key = value` pair of a merge record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeField {
    pub key: String,
    pub value: String,
}

impl MergeField {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One row of merge data.
///
/// Field order is kept for display; lookups go through [`MergeRecord::get`]
/// and return the first field carrying the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRecord {
    pub select_flag: bool,
    pub fields: Vec<MergeField>,
}

impl Default for MergeRecord {
    fn default() -> Self {
        Self {
            select_flag: true,
            fields: Vec::new(),
        }
    }
}

impl MergeRecord {
    pub fn new(fields: Vec<MergeField>) -> Self {
        Self {
            select_flag: true,
            fields,
        }
    }

    /// Builds a selected record from `(key, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(key, value)| MergeField::new(key, value))
                .collect(),
        )
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push(MergeField::new(key, value));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.value.as_str())
    }
}

/// Looks up `key` in `record`. Duplicate keys resolve to the first match.
pub fn eval_key<'a>(record: &'a MergeRecord, key: &str) -> Option<&'a str> {
    record.get(key)
}

/// Counts the records whose selection flag is set.
pub fn count_selected(records: &[MergeRecord]) -> usize {
    records.iter().filter(|record| record.select_flag).count()
}
