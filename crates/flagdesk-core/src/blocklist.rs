//! Categorized URL block lists held in session memory.
//!
//! URLs are stored in normalized form (see [`normalize_url`]) and a URL may
//! appear in at most one category.

use crate::error::{DeskError, Result};
use reqwest::Url;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

const SEED: &[(&str, &[&str])] = &[
    (
        "Gambling",
        &[
            "https://www.bet365.com",
            "https://www.draftkings.com",
            "https://www.fanduel.com",
        ],
    ),
    (
        "Adult Content",
        &[
            "https://www.pornhub.com",
            "https://www.xvideos.com",
            "https://www.xnxx.com",
        ],
    ),
    (
        "Social Media",
        &[
            "https://www.facebook.com",
            "https://www.instagram.com",
            "https://www.tiktok.com",
            "https://www.snapchat.com",
            "https://www.reddit.com",
            "https://www.x.com",
            "https://www.twitter.com",
        ],
    ),
    (
        "Shopping",
        &[
            "https://www.amazon.com",
            "https://www.ebay.com",
            "https://www.alibaba.com",
            "https://www.shein.com",
            "https://www.temu.com",
        ],
    ),
];

/// Category offered by default when adding a URL.
pub const DEFAULT_CATEGORY: &str = "Social Media";

/// Categories that always exist, in display order.
pub fn known_categories() -> impl Iterator<Item = &'static str> {
    SEED.iter().map(|(name, _)| *name)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Force a scheme, lowercase the host and strip any trailing slash.
///
/// `"YOUTUBE.com/"` becomes `"https://youtube.com"`. Query strings and
/// fragments are dropped. Returns `None` for blank input or input without a
/// host.
pub fn normalize_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let url = Url::parse(&candidate).ok()?;
    let host = url.host_str().filter(|h| !h.is_empty())?;

    let mut netloc = host.to_ascii_lowercase();
    if let Some(port) = url.port() {
        netloc.push(':');
        netloc.push_str(&port.to_string());
    }
    let path = url.path().trim_end_matches('/');
    Some(format!("{}://{}{}", url.scheme(), netloc, path))
}

// ---------------------------------------------------------------------------
// BlockLists
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLists {
    categories: Vec<Category>,
}

impl BlockLists {
    /// Fresh copy of the starter lists.
    pub fn seeded() -> Self {
        Self {
            categories: SEED
                .iter()
                .map(|(name, urls)| Category {
                    name: name.to_string(),
                    urls: urls.iter().map(|u| u.to_string()).collect(),
                })
                .collect(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.urls.as_slice())
    }

    /// Whether `url` (already normalized) is listed in any category.
    pub fn contains(&self, url: &str) -> bool {
        self.categories.iter().any(|c| c.urls.iter().any(|u| u == url))
    }

    fn category_mut(&mut self, category: &str) -> Result<&mut Category> {
        self.categories
            .iter_mut()
            .find(|c| c.name == category)
            .ok_or_else(|| DeskError::UnknownCategory(category.to_string()))
    }

    /// Normalize and append `url` to `category`. Returns the stored form.
    pub fn add(&mut self, url: &str, category: &str) -> Result<String> {
        let normalized = normalize_url(url).ok_or_else(|| DeskError::InvalidUrl(url.to_string()))?;
        if self.contains(&normalized) {
            return Err(DeskError::DuplicateUrl(normalized));
        }
        self.category_mut(category)?.urls.push(normalized.clone());
        Ok(normalized)
    }

    /// Remove `url` from `category`. Returns false if it was not listed there.
    pub fn remove(&mut self, category: &str, url: &str) -> Result<bool> {
        let cat = self.category_mut(category)?;
        let before = cat.urls.len();
        cat.urls.retain(|u| u != url);
        Ok(cat.urls.len() != before)
    }

    /// Move the listed URLs from one category to another. URLs not present in
    /// `from` are skipped; the target never gains a duplicate. Returns how many
    /// URLs left `from`.
    pub fn move_urls(&mut self, from: &str, urls: &[String], to: &str) -> Result<usize> {
        // Both must exist before anything changes.
        self.category_mut(to)?;
        self.category_mut(from)?;
        if from == to {
            return Ok(0);
        }

        let mut moved = Vec::new();
        let source = self.category_mut(from)?;
        for url in urls {
            if let Some(pos) = source.urls.iter().position(|u| u == url) {
                moved.push(source.urls.remove(pos));
            }
        }

        let target = self.category_mut(to)?;
        for url in &moved {
            if !target.urls.contains(url) {
                target.urls.push(url.clone());
            }
        }
        Ok(moved.len())
    }

    pub fn reset(&mut self) {
        *self = Self::seeded();
    }

    pub fn total(&self) -> usize {
        self.categories.iter().map(|c| c.urls.len()).sum()
    }

    // -----------------------------------------------------------------------
    // JSON import / export
    // -----------------------------------------------------------------------

    /// Pretty JSON object mapping category name to its URL array.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace every list with the contents of `text`.
    ///
    /// `text` must be a JSON object whose values are arrays of strings. URLs
    /// are normalized (invalid ones dropped) and deduplicated per category.
    /// Known categories missing from the file come back empty; extra
    /// categories are kept after the known ones.
    pub fn import_json(&mut self, text: &str) -> Result<()> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| DeskError::MalformedImport(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(DeskError::MalformedImport(
                "expected an object of category → URL list".to_string(),
            ));
        };

        let mut imported: Vec<(String, Vec<String>)> = Vec::with_capacity(map.len());
        for (name, urls) in &map {
            let Value::Array(items) = urls else {
                return Err(DeskError::MalformedImport(format!(
                    "category '{name}' is not a list"
                )));
            };
            let mut cleaned: Vec<String> = Vec::with_capacity(items.len());
            for item in items {
                let Value::String(raw) = item else {
                    return Err(DeskError::MalformedImport(format!(
                        "category '{name}' contains a non-string entry"
                    )));
                };
                if let Some(url) = normalize_url(raw) {
                    if !cleaned.contains(&url) {
                        cleaned.push(url);
                    }
                }
            }
            imported.push((name.clone(), cleaned));
        }

        let mut categories: Vec<Category> = known_categories()
            .map(|name| Category {
                name: name.to_string(),
                urls: Vec::new(),
            })
            .collect();
        for (name, urls) in imported {
            match categories.iter_mut().find(|c| c.name == name) {
                Some(cat) => cat.urls = urls,
                None => categories.push(Category { name, urls }),
            }
        }

        self.categories = categories;
        Ok(())
    }
}

impl Default for BlockLists {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Serialize for BlockLists {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for cat in &self.categories {
            map.serialize_entry(&cat.name, &cat.urls)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_scheme_lowercases_and_strips_slash() {
        assert_eq!(
            normalize_url("YOUTUBE.com/").as_deref(),
            Some("https://youtube.com")
        );
        assert_eq!(
            normalize_url("  http://News.Example.org/World/  ").as_deref(),
            Some("http://news.example.org/World")
        );
    }

    #[test]
    fn normalize_keeps_port_and_drops_query() {
        assert_eq!(
            normalize_url("example.com:8443/a/?q=1#top").as_deref(),
            Some("https://example.com:8443/a")
        );
    }

    #[test]
    fn normalize_rejects_blank_and_hostless() {
        assert_eq!(normalize_url(""), None);
        assert_eq!(normalize_url("   "), None);
        assert_eq!(normalize_url("https://"), None);
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_url("Reddit.com/r/rust/").unwrap();
        assert_eq!(normalize_url(&once).as_deref(), Some(once.as_str()));
    }

    #[test]
    fn seeded_lists_have_known_categories_in_order() {
        let lists = BlockLists::seeded();
        assert_eq!(
            lists.category_names(),
            vec!["Gambling", "Adult Content", "Social Media", "Shopping"]
        );
        assert_eq!(lists.get("Social Media").unwrap().len(), 7);
    }

    #[test]
    fn add_normalizes_and_appends() {
        let mut lists = BlockLists::seeded();
        let stored = lists.add("YOUTUBE.com/", DEFAULT_CATEGORY).unwrap();
        assert_eq!(stored, "https://youtube.com");
        assert_eq!(
            lists.get(DEFAULT_CATEGORY).unwrap().last().map(String::as_str),
            Some("https://youtube.com")
        );
    }

    #[test]
    fn duplicate_is_rejected_in_any_category() {
        let mut lists = BlockLists::seeded();
        lists.add("youtube.com", "Social Media").unwrap();
        let err = lists.add("https://YouTube.com/", "Shopping").unwrap_err();
        assert!(matches!(err, DeskError::DuplicateUrl(ref u) if u == "https://youtube.com"));
        assert!(!lists.get("Shopping").unwrap().contains(&"https://youtube.com".to_string()));
    }

    #[test]
    fn add_rejects_invalid_url_and_unknown_category() {
        let mut lists = BlockLists::seeded();
        assert!(matches!(lists.add("  ", "Shopping"), Err(DeskError::InvalidUrl(_))));
        assert!(matches!(
            lists.add("example.com", "Sports"),
            Err(DeskError::UnknownCategory(_))
        ));
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let mut lists = BlockLists::seeded();
        assert!(lists.remove("Shopping", "https://www.ebay.com").unwrap());
        assert!(!lists.remove("Shopping", "https://www.ebay.com").unwrap());
        assert!(!lists.contains("https://www.ebay.com"));
    }

    #[test]
    fn move_urls_between_categories() {
        let mut lists = BlockLists::seeded();
        let moved = lists
            .move_urls(
                "Social Media",
                &[
                    "https://www.reddit.com".to_string(),
                    "https://not-listed.example".to_string(),
                ],
                "Shopping",
            )
            .unwrap();
        assert_eq!(moved, 1);
        assert!(!lists.get("Social Media").unwrap().contains(&"https://www.reddit.com".to_string()));
        assert!(lists.get("Shopping").unwrap().contains(&"https://www.reddit.com".to_string()));
    }

    #[test]
    fn move_to_unknown_category_changes_nothing() {
        let mut lists = BlockLists::seeded();
        let before = lists.clone();
        let err = lists
            .move_urls("Shopping", &["https://www.ebay.com".to_string()], "Nowhere")
            .unwrap_err();
        assert!(matches!(err, DeskError::UnknownCategory(_)));
        assert_eq!(lists, before);
    }

    #[test]
    fn reset_restores_seed() {
        let mut lists = BlockLists::seeded();
        lists.add("example.com", "Gambling").unwrap();
        lists.reset();
        assert_eq!(lists, BlockLists::seeded());
    }

    #[test]
    fn export_preserves_category_order() {
        let json = BlockLists::seeded().export_json().unwrap();
        let gambling = json.find("\"Gambling\"").unwrap();
        let shopping = json.find("\"Shopping\"").unwrap();
        assert!(gambling < shopping);
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["Shopping"][0], "https://www.amazon.com");
    }

    #[test]
    fn import_fills_missing_known_categories() {
        let mut lists = BlockLists::seeded();
        lists
            .import_json(r#"{"Gambling": ["bet365.com"]}"#)
            .unwrap();
        assert_eq!(lists.get("Gambling").unwrap(), ["https://bet365.com"]);
        assert_eq!(lists.get("Shopping").unwrap().len(), 0);
        assert_eq!(lists.get("Adult Content").unwrap().len(), 0);
        assert_eq!(lists.get("Social Media").unwrap().len(), 0);
    }

    #[test]
    fn import_normalizes_dedups_and_keeps_extra_categories() {
        let mut lists = BlockLists::seeded();
        lists
            .import_json(
                r#"{"News": ["CNN.com/", "https://cnn.com", "  "], "Shopping": ["ebay.com"]}"#,
            )
            .unwrap();
        assert_eq!(lists.get("News").unwrap(), ["https://cnn.com"]);
        assert_eq!(lists.get("Shopping").unwrap(), ["https://ebay.com"]);
        assert_eq!(
            lists.category_names(),
            vec!["Gambling", "Adult Content", "Social Media", "Shopping", "News"]
        );
    }

    #[test]
    fn import_rejects_wrong_shapes_without_changing_lists() {
        let mut lists = BlockLists::seeded();
        for bad in [
            "not json",
            r#"["a", "b"]"#,
            r#"{"Gambling": "bet365.com"}"#,
            r#"{"Gambling": [1, 2]}"#,
        ] {
            let err = lists.import_json(bad).unwrap_err();
            assert!(matches!(err, DeskError::MalformedImport(_)), "input: {bad}");
        }
        assert_eq!(lists, BlockLists::seeded());
    }
}
