//! Per-title classification data: draw type → banner category, rarity →
//! tier, and which categories are special-cased. Selected once per
//! computation via [`Title::tables`].

pub mod permanent_pool;

pub use permanent_pool::PermanentPool;

use std::collections::BTreeMap;

use crate::error::{AppError, Result};
use crate::types::{BannerCategory, DrawRecord, Tier, Title};

/// Which record field the permanent-pool allow-list is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKey {
    Name,
    ItemId,
}

impl ItemKey {
    pub fn of<'a>(&self, record: &'a DrawRecord) -> &'a str {
        match self {
            ItemKey::Name => &record.item_name,
            ItemKey::ItemId => &record.item_id,
        }
    }
}

/// One banner category and every draw-type code stored under it.
/// The first code is the representative one reported in statistics.
#[derive(Debug)]
pub struct CategoryDef {
    pub category: BannerCategory,
    pub draw_types: &'static [u32],
}

impl CategoryDef {
    pub fn draw_type(&self) -> u32 {
        self.draw_types[0]
    }
}

#[derive(Debug)]
pub struct TitleTables {
    pub title: Title,
    /// In reporting order.
    pub categories: &'static [CategoryDef],
    pub rarities: &'static [(u8, Tier)],
    pub item_key: ItemKey,
    /// Categories left out of the cross-category aggregate.
    pub aggregate_excludes: &'static [BannerCategory],
    /// Categories whose top-tier hits are never flagged restricted.
    pub restricted_exempt: &'static [BannerCategory],
}

impl TitleTables {
    pub fn category_of(&self, draw_type: u32) -> Result<BannerCategory> {
        self.categories
            .iter()
            .find(|def| def.draw_types.contains(&draw_type))
            .map(|def| def.category)
            .ok_or(AppError::UnmappedDrawType { title: self.title, code: draw_type })
    }

    pub fn tier_of(&self, rarity: u8) -> Option<Tier> {
        self.rarities
            .iter()
            .find(|(code, _)| *code == rarity)
            .map(|&(_, tier)| tier)
    }

    pub fn is_golden(&self, record: &DrawRecord) -> bool {
        self.tier_of(record.rarity) == Some(Tier::Golden)
    }

    pub fn in_aggregate(&self, category: BannerCategory) -> bool {
        !self.aggregate_excludes.contains(&category)
    }

    pub fn is_restricted_exempt(&self, category: BannerCategory) -> bool {
        self.restricted_exempt.contains(&category)
    }

    pub fn draw_type_to_category(&self) -> BTreeMap<u32, BannerCategory> {
        self.categories
            .iter()
            .flat_map(|def| def.draw_types.iter().map(move |&code| (code, def.category)))
            .collect()
    }
}

const STAR_RARITIES: &[(u8, Tier)] = &[(3, Tier::Blue), (4, Tier::Purple), (5, Tier::Golden)];

static GENSHIN: TitleTables = TitleTables {
    title: Title::Genshin,
    categories: &[
        CategoryDef { category: BannerCategory::Beginner, draw_types: &[100] },
        CategoryDef { category: BannerCategory::Permanent, draw_types: &[200] },
        // 400 is the second concurrent character event wish.
        CategoryDef { category: BannerCategory::Character, draw_types: &[301, 400] },
        CategoryDef { category: BannerCategory::Weapon, draw_types: &[302] },
        CategoryDef { category: BannerCategory::Chronicled, draw_types: &[500] },
    ],
    rarities: STAR_RARITIES,
    item_key: ItemKey::Name,
    aggregate_excludes: &[],
    restricted_exempt: &[],
};

static STAR_RAIL: TitleTables = TitleTables {
    title: Title::StarRail,
    categories: &[
        CategoryDef { category: BannerCategory::Beginner, draw_types: &[2] },
        CategoryDef { category: BannerCategory::Permanent, draw_types: &[1] },
        CategoryDef { category: BannerCategory::Character, draw_types: &[11] },
        CategoryDef { category: BannerCategory::Weapon, draw_types: &[12] },
        CategoryDef { category: BannerCategory::CollaborationCharacter, draw_types: &[21] },
        CategoryDef { category: BannerCategory::CollaborationWeapon, draw_types: &[22] },
    ],
    rarities: STAR_RARITIES,
    item_key: ItemKey::ItemId,
    aggregate_excludes: &[],
    restricted_exempt: &[],
};

// Ranks are B=2, A=3, S=4.
static ZENLESS: TitleTables = TitleTables {
    title: Title::ZenlessZoneZero,
    categories: &[
        CategoryDef { category: BannerCategory::Permanent, draw_types: &[1] },
        CategoryDef { category: BannerCategory::Character, draw_types: &[2] },
        CategoryDef { category: BannerCategory::Weapon, draw_types: &[3] },
        CategoryDef { category: BannerCategory::Bangboo, draw_types: &[5] },
    ],
    rarities: &[(2, Tier::Blue), (3, Tier::Purple), (4, Tier::Golden)],
    item_key: ItemKey::ItemId,
    aggregate_excludes: &[BannerCategory::Bangboo],
    restricted_exempt: &[BannerCategory::Bangboo],
};

impl Title {
    pub fn tables(self) -> &'static TitleTables {
        match self {
            Title::Genshin => &GENSHIN,
            Title::StarRail => &STAR_RAIL,
            Title::ZenlessZoneZero => &ZENLESS,
        }
    }
}
