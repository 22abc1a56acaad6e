//! Row type for the `draw_records` table (see migrations/).

use crate::error::AppError;
use crate::types::DrawRecord;

#[derive(Debug, sqlx::FromRow)]
pub struct DrawRecordRow {
    pub id: String,
    pub draw_type: i64,
    pub rarity: i64,
    pub item_id: String,
    pub item_name: String,
    pub time: String,
}

impl TryFrom<DrawRecordRow> for DrawRecord {
    type Error = AppError;

    fn try_from(row: DrawRecordRow) -> Result<Self, Self::Error> {
        let draw_type = u32::try_from(row.draw_type)
            .map_err(|_| AppError::CorruptRow(format!("record {}: draw_type {}", row.id, row.draw_type)))?;
        let rarity = u8::try_from(row.rarity)
            .map_err(|_| AppError::CorruptRow(format!("record {}: rarity {}", row.id, row.rarity)))?;
        Ok(DrawRecord {
            id: row.id,
            draw_type,
            rarity,
            item_id: row.item_id,
            item_name: row.item_name,
            time: row.time,
        })
    }
}
