use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Title
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Title {
    #[serde(rename = "genshin")]
    Genshin,
    #[serde(rename = "starrail")]
    StarRail,
    #[serde(rename = "zzz")]
    ZenlessZoneZero,
}

impl Title {
    pub fn as_str(&self) -> &'static str {
        match self {
            Title::Genshin => "genshin",
            Title::StarRail => "starrail",
            Title::ZenlessZoneZero => "zzz",
        }
    }
}

impl std::fmt::Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Draw records
// ---------------------------------------------------------------------------

/// One stored draw. `id` is lexicographically ordered and doubles as the
/// resumption cursor for incremental fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub id: String,
    pub draw_type: u32,
    pub rarity: u8,
    /// Empty for titles whose exports carry no numeric item id.
    #[serde(default)]
    pub item_id: String,
    pub item_name: String,
    /// Server-local time as exported, e.g. `2024-03-01 12:00:00`.
    pub time: String,
}

// ---------------------------------------------------------------------------
// Banner category / tier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerCategory {
    Beginner,
    Permanent,
    Character,
    Weapon,
    Chronicled,
    CollaborationCharacter,
    CollaborationWeapon,
    Bangboo,
}

impl std::fmt::Display for BannerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BannerCategory::Beginner => "beginner",
            BannerCategory::Permanent => "permanent",
            BannerCategory::Character => "character",
            BannerCategory::Weapon => "weapon",
            BannerCategory::Chronicled => "chronicled",
            BannerCategory::CollaborationCharacter => "collaboration_character",
            BannerCategory::CollaborationWeapon => "collaboration_weapon",
            BannerCategory::Bangboo => "bangboo",
        };
        write!(f, "{s}")
    }
}

/// Rarity band. Golden is the top tier that pity applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Blue,
    Purple,
    Golden,
}

// ---------------------------------------------------------------------------
// Channel message types
// ---------------------------------------------------------------------------

/// Routed from the API to the DB writer.
#[derive(Debug, Clone)]
pub struct ImportBatch {
    pub title: Title,
    pub account_id: String,
    pub records: Vec<DrawRecord>,
}

impl ImportBatch {
    /// Fails on the first record whose draw type has no category for this
    /// title. Stored records must always be classifiable.
    pub fn check_draw_types(&self) -> Result<()> {
        let tables = self.title.tables();
        match self.records.iter().find(|r| tables.category_of(r.draw_type).is_err()) {
            Some(r) => Err(AppError::RejectedImport {
                title: self.title,
                id: r.id.clone(),
                code: r.draw_type,
            }),
            None => Ok(()),
        }
    }
}
