//! Layout Store
//!
//! Ordered key/value sections backing layout files and the statistics store.
//! Section and key lookups are case-insensitive, section order is preserved
//! as written. Writes go through a temp file + rename.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::LayoutError;

/// Section carrying global settings
pub const GLOBAL_SECTION: &str = "SkinHost";

/// Reserved section that is never treated as a skin
pub const TRAY_SECTION: &str = "TrayMeasure";

/// One `[Name]` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Section name as written
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value for a key, case-insensitive
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace a key
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Entries in file order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Drop every key
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Parsed layout or statistics file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutFile {
    path: Option<PathBuf>,
    sections: Vec<Section>,
}

impl LayoutFile {
    /// Empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse a file from disk
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        if !path.exists() {
            return Err(LayoutError::NotAccessible {
                path: path.to_path_buf(),
            });
        }

        let text = fs::read_to_string(path).map_err(|e| LayoutError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut layout = Self::parse(&text);
        layout.path = Some(path.to_path_buf());
        Ok(layout)
    }

    /// Parse INI-style text.
    ///
    /// Keys before the first section header are ignored, as are `;` and `#`
    /// comment lines. Repeated section headers merge into the first one.
    pub fn parse(text: &str) -> Self {
        let mut layout = Self::new();
        let mut current: Option<usize> = None;

        for raw in text.trim_start_matches('\u{feff}').lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim();
                current = Some(layout.section_index_or_insert(name));
                continue;
            }

            let (Some(index), Some((key, value))) = (current, line.split_once('=')) else {
                continue;
            };
            layout.sections[index].set(key.trim(), strip_quotes(value.trim()));
        }

        layout
    }

    /// File this store was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Section names in file order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    /// Look up a section, case-insensitive
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Look up or create a section
    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        let index = self.section_index_or_insert(name);
        &mut self.sections[index]
    }

    /// Raw string value
    pub fn read_string(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    /// Integer value; missing or malformed values yield `default`
    pub fn read_int(&self, section: &str, key: &str, default: i32) -> i32 {
        match self.read_string(section, key) {
            Some(value) => parse_int(value).unwrap_or_else(|| {
                tracing::warn!(section, key, value, "Not an integer, using {}", default);
                default
            }),
            None => default,
        }
    }

    /// Integer value, `None` when the key is absent or malformed
    pub fn read_int_opt(&self, section: &str, key: &str) -> Option<i32> {
        self.read_string(section, key).and_then(parse_int)
    }

    /// Boolean value: any non-zero integer is true
    pub fn read_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.read_int(section, key, i32::from(default)) != 0
    }

    /// Set a value, creating the section if needed
    pub fn write_string(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.section_mut(section).set(key, value);
    }

    /// Serialize back to INI text
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for (key, value) in section.entries() {
                out.push_str(key);
                out.push('=');
                out.push_str(value);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// Atomically write to `path`
    pub fn save(&self, path: &Path) -> Result<(), LayoutError> {
        let write_err = |e: std::io::Error| LayoutError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let temp = path.with_extension("tmp");
        fs::write(&temp, self.to_text()).map_err(write_err)?;
        fs::rename(&temp, path).map_err(write_err)?;
        Ok(())
    }

    fn section_index_or_insert(&mut self, name: &str) -> usize {
        match self
            .sections
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
        {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn parse_int(value: &str) -> Option<i32> {
    value.trim().parse().ok()
}
