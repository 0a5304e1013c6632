use std::collections::BTreeMap;

/// Final dependency listing, keyed by canonical distribution name. Inserting
/// the same distribution twice silently keeps the later version; callers
/// resolve import names in ascending order so "later" is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<String, Option<String>>,
}

impl Manifest {
    pub fn insert(&mut self, name: String, version: Option<String>) {
        self.entries.insert(name, version);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn version_of(&self, name: &str) -> Option<Option<&str>> {
        self.entries.get(name).map(|v| v.as_deref())
    }

    /// Distribution names listed without a known version.
    pub fn missing_versions(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, version)| version.is_none())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Render as `name==version` / bare `name` lines, sorted ascending by
    /// name, one trailing newline per line, no header.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, version) in &self.entries {
            out.push_str(name);
            if let Some(version) = version {
                out.push_str("==");
                out.push_str(version);
            }
            out.push('\n');
        }
        out
    }
}
