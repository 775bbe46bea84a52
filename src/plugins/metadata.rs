//! Line-based reader for plugin `index.yaml` files.
//!
//! Only flat `key: value` pairs are understood. Blank lines and `#` comments
//! are skipped, a single pair of matching quotes around a value is removed and
//! everything after the first `:` belongs to the value. Nested structures are
//! not supported.

pub const METADATA_FILE: &str = "index.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatMetadata {
    pairs: Vec<(String, String)>,
}

impl FlatMetadata {
    pub fn parse(raw: &str) -> Self {
        let mut pairs = Vec::new();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            pairs.push((key.to_string(), unquote(value.trim()).to_string()));
        }
        Self { pairs }
    }

    /// Value for `key`. A repeated key resolves to its last occurrence.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed, non-empty value for `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(is_truthy)
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
