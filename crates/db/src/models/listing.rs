//! Row types for the `marketplace_items` table.

use std::collections::BTreeMap;

use sqlx::types::Json;
use sqlx::FromRow;

use medina_core::listing::{Condition, Listing, ListingStatus, PriceType};
use medina_core::types::{ActorId, ListingId, Timestamp};

/// A row from `marketplace_items`.
///
/// Enum-typed domain fields are stored as TEXT; conversion to the domain
/// [`Listing`] is fallible only if the database holds a value outside the
/// domain enums, which indicates schema drift.
#[derive(Debug, Clone, FromRow)]
pub struct ListingRow {
    pub id: ListingId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub price_type: String,
    pub category: String,
    pub condition: Option<String>,
    pub images: Vec<String>,
    pub attributes: Json<BTreeMap<String, String>>,
    pub location: String,
    pub area_id: Option<String>,
    pub seller_id: ActorId,
    pub seller_phone: String,
    pub seller_whatsapp: Option<String>,
    pub status: String,
    pub is_featured: bool,
    pub rejection_reason: Option<String>,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub last_bump_at: Timestamp,
}

impl TryFrom<ListingRow> for Listing {
    type Error = String;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        let status = ListingStatus::parse(&row.status)
            .ok_or_else(|| format!("unknown status '{}' for listing {}", row.status, row.id))?;
        let price_type = PriceType::parse(&row.price_type).ok_or_else(|| {
            format!("unknown price_type '{}' for listing {}", row.price_type, row.id)
        })?;
        let condition = match row.condition.as_deref() {
            Some(raw) => Some(
                Condition::parse(raw)
                    .ok_or_else(|| format!("unknown condition '{raw}' for listing {}", row.id))?,
            ),
            None => None,
        };

        Ok(Listing {
            id: row.id,
            slug: row.slug,
            title: row.title,
            description: row.description,
            price: row.price,
            price_type,
            category: row.category,
            condition,
            images: row.images,
            attributes: row.attributes.0,
            location: row.location,
            area_id: row.area_id,
            seller_id: row.seller_id,
            seller_phone: row.seller_phone,
            seller_whatsapp: row.seller_whatsapp,
            status,
            is_featured: row.is_featured,
            rejection_reason: row.rejection_reason,
            view_count: row.view_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
            last_bump_at: row.last_bump_at,
        })
    }
}
