//! Listing store over the `marketplace_items` table.
//!
//! Owns field mapping and the translation of [`ListingFilter`] into a
//! deterministic SQL predicate. Ownership checks and transition legality
//! live in the lifecycle service, not here.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::types::Json;

use medina_core::contracts::ListingStore;
use medina_core::filter::{ListingFilter, ListingOrder, StatusScope};
use medina_core::listing::{Listing, ListingStatus, ListingUpdate, NewListing};
use medina_core::sanitize::strip_query_quotes;
use medina_core::types::ListingId;
use medina_core::CoreError;

use crate::models::ListingRow;
use crate::{map_db_err, DbPool};

/// Column list for `marketplace_items` reads qualified by the `l` alias.
const QUALIFIED_COLUMNS: &str = "\
    l.id, l.slug, l.title, l.description, l.price, l.price_type, \
    l.category, l.condition, l.images, l.attributes, l.location, l.area_id, \
    l.seller_id, l.seller_phone, l.seller_whatsapp, l.status, l.is_featured, \
    l.rejection_reason, l.view_count, l.created_at, l.updated_at, \
    l.expires_at, l.last_bump_at";

/// Column list for INSERT/UPDATE RETURNING clauses.
const COLUMNS: &str = "\
    id, slug, title, description, price, price_type, \
    category, condition, images, attributes, location, area_id, \
    seller_id, seller_phone, seller_whatsapp, status, is_featured, \
    rejection_reason, view_count, created_at, updated_at, \
    expires_at, last_bump_at";

/// PostgreSQL-backed implementation of [`ListingStore`].
#[derive(Clone)]
pub struct ListingRepo {
    pool: DbPool,
}

impl ListingRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for ListingRepo {
    async fn create(&self, listing: NewListing) -> Result<Listing, CoreError> {
        let id = uuid::Uuid::new_v4();
        let query = format!(
            "INSERT INTO marketplace_items (\
                id, slug, title, description, price, price_type, \
                category, condition, images, attributes, location, area_id, \
                seller_id, seller_phone, seller_whatsapp, status, expires_at\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
                $13, $14, $15, $16, $17) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ListingRow>(&query)
            .bind(id)
            .bind(&listing.slug)
            .bind(&listing.title)
            .bind(&listing.description)
            .bind(listing.price)
            .bind(listing.price_type.as_str())
            .bind(&listing.category)
            .bind(listing.condition.map(|c| c.as_str()))
            .bind(&listing.images)
            .bind(Json(&listing.attributes))
            .bind(&listing.location)
            .bind(listing.area_id.as_deref())
            .bind(listing.seller_id)
            .bind(&listing.seller_phone)
            .bind(listing.seller_whatsapp.as_deref())
            .bind(listing.status.as_str())
            .bind(listing.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;

        row.try_into().map_err(CoreError::Internal)
    }

    async fn get_by_id(&self, id: ListingId) -> Result<Option<Listing>, CoreError> {
        let query =
            format!("SELECT {QUALIFIED_COLUMNS} FROM marketplace_items l WHERE l.id = $1");
        let row = sqlx::query_as::<_, ListingRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.map(Listing::try_from)
            .transpose()
            .map_err(CoreError::Internal)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Listing>, CoreError> {
        let query =
            format!("SELECT {QUALIFIED_COLUMNS} FROM marketplace_items l WHERE l.slug = $1");
        let row = sqlx::query_as::<_, ListingRow>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.map(Listing::try_from)
            .transpose()
            .map_err(CoreError::Internal)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, CoreError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM marketplace_items WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(exists.0)
    }

    async fn update_fields(&self, id: ListingId, update: &ListingUpdate) -> Result<(), CoreError> {
        let result = sqlx::query(
            "UPDATE marketplace_items SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                price = COALESCE($4, price), \
                price_type = COALESCE($5, price_type), \
                category = COALESCE($6, category), \
                condition = COALESCE($7, condition), \
                images = COALESCE($8, images), \
                attributes = COALESCE($9, attributes), \
                location = COALESCE($10, location), \
                area_id = COALESCE($11, area_id), \
                seller_phone = COALESCE($12, seller_phone), \
                seller_whatsapp = COALESCE($13, seller_whatsapp), \
                updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.title.as_deref())
        .bind(update.description.as_deref())
        .bind(update.price)
        .bind(update.price_type.map(|p| p.as_str()))
        .bind(update.category.as_deref())
        .bind(update.condition.map(|c| c.as_str()))
        .bind(update.images.as_deref())
        .bind(update.attributes.as_ref().map(Json))
        .bind(update.location.as_deref())
        .bind(update.area_id.as_deref())
        .bind(update.seller_phone.as_deref())
        .bind(update.seller_whatsapp.as_deref())
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound { entity: "Listing" });
        }
        Ok(())
    }

    async fn set_status(
        &self,
        id: ListingId,
        status: ListingStatus,
        reason: Option<&str>,
        relist: bool,
    ) -> Result<(), CoreError> {
        // A relist returns the listing to the head of recency ordering by
        // resetting created_at as well as last_bump_at, and clears the old
        // expiry. Preserved source-system behavior.
        let sql = if relist {
            "UPDATE marketplace_items SET status = $2, rejection_reason = $3, \
             expires_at = NULL, created_at = NOW(), last_bump_at = NOW(), \
             updated_at = NOW() WHERE id = $1"
        } else {
            "UPDATE marketplace_items SET status = $2, rejection_reason = $3, \
             updated_at = NOW() WHERE id = $1"
        };
        let result = sqlx::query(sql)
            .bind(id)
            .bind(status.as_str())
            .bind(reason)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound { entity: "Listing" });
        }
        Ok(())
    }

    async fn bump(&self, id: ListingId) -> Result<(), CoreError> {
        let result = sqlx::query(
            "UPDATE marketplace_items SET last_bump_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound { entity: "Listing" });
        }
        Ok(())
    }

    async fn increment_views(&self, id: ListingId) -> Result<(), CoreError> {
        sqlx::query("UPDATE marketplace_items SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn delete(&self, id: ListingId) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM marketplace_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound { entity: "Listing" });
        }
        Ok(())
    }

    async fn query(
        &self,
        filter: &ListingFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Listing>, i64), CoreError> {
        let plan = QueryPlan::build(filter);

        let rows_sql = format!(
            "SELECT {QUALIFIED_COLUMNS} FROM marketplace_items l {join} {where_clause} \
             ORDER BY {order} LIMIT ${limit_idx} OFFSET ${offset_idx}",
            join = plan.join,
            where_clause = plan.where_clause,
            order = order_clause(filter.order),
            limit_idx = plan.next_idx,
            offset_idx = plan.next_idx + 1,
        );
        let count_sql = format!(
            "SELECT COUNT(*) FROM marketplace_items l {join} {where_clause}",
            join = plan.join,
            where_clause = plan.where_clause,
        );

        let rows_query = plan.bind_all(sqlx::query_as::<_, ListingRow>(&rows_sql));
        let rows = rows_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;

        let count_query = plan.bind_all(sqlx::query_as::<_, (i64,)>(&count_sql));
        let (total,) = count_query.fetch_one(&self.pool).await.map_err(map_db_err)?;

        let items = rows
            .into_iter()
            .map(Listing::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(CoreError::Internal)?;
        Ok((items, total))
    }
}

// ---------------------------------------------------------------------------
// Filter translation
// ---------------------------------------------------------------------------

/// One bound value in the assembled predicate, in ordinal order.
enum BindValue {
    Text(String),
    Float(f64),
    Uuid(uuid::Uuid),
    Bool(bool),
    Jsonb(Json<BTreeMap<String, String>>),
}

/// Deterministic translation of a [`ListingFilter`] into SQL fragments plus
/// the bind values in ordinal order. Rows and count queries share the same
/// plan so their predicates can never drift apart.
struct QueryPlan {
    join: &'static str,
    where_clause: String,
    binds: Vec<BindValue>,
    next_idx: u32,
}

impl QueryPlan {
    fn build(filter: &ListingFilter) -> Self {
        let mut conditions: Vec<String> = Vec::new();
        let mut binds: Vec<BindValue> = Vec::new();
        let mut bind_idx = 1u32;

        match filter.status {
            StatusScope::ActiveUnexpired => {
                conditions.push(
                    "l.status = 'active' AND (l.expires_at IS NULL OR l.expires_at > NOW())"
                        .to_string(),
                );
            }
            StatusScope::Exactly(status) => {
                conditions.push(format!("l.status = ${bind_idx}"));
                binds.push(BindValue::Text(status.as_str().to_string()));
                bind_idx += 1;
            }
            StatusScope::Any => {}
        }
        if let Some(category) = &filter.category {
            conditions.push(format!("l.category = ${bind_idx}"));
            binds.push(BindValue::Text(category.clone()));
            bind_idx += 1;
        }
        if let Some(area_id) = &filter.area_id {
            conditions.push(format!("l.area_id = ${bind_idx}"));
            binds.push(BindValue::Text(area_id.clone()));
            bind_idx += 1;
        }
        let join = if filter.district.is_some() {
            "LEFT JOIN areas a ON a.id = l.area_id"
        } else {
            ""
        };
        if let Some(district) = &filter.district {
            conditions.push(format!("a.district = ${bind_idx}"));
            binds.push(BindValue::Text(district.clone()));
            bind_idx += 1;
        }
        if let Some(min_price) = filter.min_price {
            conditions.push(format!("l.price >= ${bind_idx}"));
            binds.push(BindValue::Float(min_price));
            bind_idx += 1;
        }
        if let Some(max_price) = filter.max_price {
            conditions.push(format!("l.price <= ${bind_idx}"));
            binds.push(BindValue::Float(max_price));
            bind_idx += 1;
        }
        if let Some(condition) = filter.condition {
            conditions.push(format!("l.condition = ${bind_idx}"));
            binds.push(BindValue::Text(condition.as_str().to_string()));
            bind_idx += 1;
        }
        if let Some(query) = &filter.query {
            let cleaned = strip_query_quotes(query);
            if !cleaned.is_empty() {
                conditions.push(format!(
                    "(l.title ILIKE ${bind_idx} OR l.description ILIKE ${bind_idx})"
                ));
                binds.push(BindValue::Text(format!("%{cleaned}%")));
                bind_idx += 1;
            }
        }
        if !filter.attributes.is_empty() {
            conditions.push(format!("l.attributes @> ${bind_idx}"));
            binds.push(BindValue::Jsonb(Json(filter.attributes.clone())));
            bind_idx += 1;
        }
        if let Some(seller_id) = filter.seller_id {
            conditions.push(format!("l.seller_id = ${bind_idx}"));
            binds.push(BindValue::Uuid(seller_id));
            bind_idx += 1;
        }
        if let Some(is_featured) = filter.is_featured {
            conditions.push(format!("l.is_featured = ${bind_idx}"));
            binds.push(BindValue::Bool(is_featured));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        Self {
            join,
            where_clause,
            binds,
            next_idx: bind_idx,
        }
    }

    fn bind_all<'q, O>(
        &'q self,
        mut query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    ) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
        for value in &self.binds {
            query = match value {
                BindValue::Text(text) => query.bind(text),
                BindValue::Float(float) => query.bind(float),
                BindValue::Uuid(id) => query.bind(id),
                BindValue::Bool(flag) => query.bind(flag),
                BindValue::Jsonb(json) => query.bind(json),
            };
        }
        query
    }
}

fn order_clause(order: ListingOrder) -> &'static str {
    match order {
        ListingOrder::FeaturedRecency => {
            "l.is_featured DESC, l.last_bump_at DESC, l.created_at DESC"
        }
        ListingOrder::Recency => "l.last_bump_at DESC, l.created_at DESC",
        ListingOrder::ViewCount => "l.view_count DESC, l.last_bump_at DESC",
        ListingOrder::PriceAsc => "l.price ASC, l.last_bump_at DESC",
    }
}
