//! Primary/secondary gateway lists.

use std::collections::HashSet;
use std::path::Path;

/// Gateway base URLs read from the two seed lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedLists {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
}

impl SeedLists {
    /// Reads both lists. A missing or unreadable file is logged and treated as empty.
    pub fn read(primary: &Path, secondary: &Path) -> Self {
        Self {
            primary: read_list(primary),
            secondary: read_list(secondary),
        }
    }

    /// Every distinct URL with its primary flag, primaries first.
    /// A URL on both lists is primary.
    pub fn entries(&self) -> Vec<(String, bool)> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(self.primary.len() + self.secondary.len());
        for url in &self.primary {
            if seen.insert(url.as_str()) {
                out.push((url.clone(), true));
            }
        }
        for url in &self.secondary {
            if seen.insert(url.as_str()) {
                out.push((url.clone(), false));
            }
        }
        out
    }

    pub fn contains(&self, url: &str) -> bool {
        self.primary.iter().any(|u| u == url) || self.secondary.iter().any(|u| u == url)
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}

fn read_list(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let urls = parse_list(&text);
            tracing::debug!(path = %path.display(), count = urls.len(), "read gateway list");
            urls
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "gateway list unavailable");
            Vec::new()
        }
    }
}

/// One base URL per line; blank lines and `#` comments are skipped, as are
/// lines that are not absolute URLs.
pub fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| match url::Url::parse(line) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping invalid gateway URL");
                false
            }
        })
        .map(str::to_string)
        .collect()
}
