//! Group membership for skins, sections and meters

/// `|`-separated list of group names, matched case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    raw: String,
    names: Vec<String>,
}

impl Group {
    pub fn new(raw: &str) -> Self {
        let names = raw
            .split('|')
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        Self {
            raw: raw.to_string(),
            names,
        }
    }

    /// Group string as configured
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn belongs_to(&self, group: &str) -> bool {
        let group = group.trim().to_lowercase();
        self.names.iter().any(|name| *name == group)
    }
}
