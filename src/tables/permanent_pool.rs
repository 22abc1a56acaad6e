//! Allow-list of top-tier items that are always obtainable from the
//! permanent pool. Anything outside it counts as restricted (limited).

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::types::{DrawRecord, Title};

const EMBEDDED: &str = include_str!("../../data/permanent_pool.json");

#[derive(Debug, Clone, Default)]
pub struct PermanentPool {
    items: HashMap<Title, HashSet<String>>,
}

impl PermanentPool {
    /// The list shipped with the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let pool = Self::from_json(&raw)?;
        info!(
            path = %path.as_ref().display(),
            titles = pool.items.len(),
            "[POOL] loaded permanent-pool allow-list",
        );
        Ok(pool)
    }

    /// JSON object keyed by title; each value lists item identifiers
    /// (names or numeric ids, depending on the title).
    pub fn from_json(raw: &str) -> Result<Self> {
        let items: HashMap<Title, HashSet<String>> = serde_json::from_str(raw)?;
        Ok(Self { items })
    }

    pub fn contains(&self, title: Title, record: &DrawRecord) -> bool {
        let key = title.tables().item_key.of(record);
        self.items.get(&title).is_some_and(|set| set.contains(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden(item_id: &str, name: &str) -> DrawRecord {
        DrawRecord {
            id: "1".to_string(),
            draw_type: 1,
            rarity: 5,
            item_id: item_id.to_string(),
            item_name: name.to_string(),
            time: String::new(),
        }
    }

    #[test]
    fn embedded_list_parses() {
        let pool = PermanentPool::embedded().unwrap();
        assert!(pool.contains(Title::Genshin, &golden("", "Diluc")));
        assert!(pool.contains(Title::StarRail, &golden("1003", "Himeko")));
        assert!(pool.contains(Title::ZenlessZoneZero, &golden("1141", "Von Lycaon")));
    }

    #[test]
    fn genshin_matches_by_name_and_others_by_id() {
        let pool = PermanentPool::embedded().unwrap();
        // Same name, but star rail looks at the id.
        assert!(!pool.contains(Title::StarRail, &golden("1005", "Himeko")));
        // Genshin ignores the id entirely.
        assert!(!pool.contains(Title::Genshin, &golden("10000042", "Raiden Shogun")));
    }

    #[test]
    fn missing_title_has_empty_list() {
        let pool = PermanentPool::from_json(r#"{"genshin":["Jean"]}"#).unwrap();
        assert!(pool.contains(Title::Genshin, &golden("", "Jean")));
        assert!(!pool.contains(Title::ZenlessZoneZero, &golden("1021", "Nekomata")));
    }

    #[test]
    fn unknown_title_key_is_rejected() {
        assert!(PermanentPool::from_json(r#"{"wuwa":["Verina"]}"#).is_err());
    }

    #[test]
    fn reads_override_file() {
        let path = std::env::temp_dir().join(format!("permanent-pool-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"zzz":["1021"]}"#).unwrap();
        let pool = PermanentPool::from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(pool.contains(Title::ZenlessZoneZero, &golden("1021", "Nekomata")));
        assert!(PermanentPool::from_path(&path).is_err());
    }
}
