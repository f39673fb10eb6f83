//! # Promotion Repository
//!
//! Date-bounded promotional prices. The POS asks for the promotion active
//! for a product right now; the window check lives in the query so a stale
//! promotion can't leak a cheap price.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use maracuya_core::Promotion;

use crate::error::{DbError, DbResult};

/// Repository for promotions.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Promotion> {
        sqlx::query_as::<_, Promotion>("SELECT * FROM promotions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Promotion", id))
    }

    /// The promotion applying to a product at `when`, if any. Newest wins
    /// when windows overlap.
    pub async fn active_for_product(
        &self,
        product_id: &str,
        when: DateTime<Utc>,
    ) -> DbResult<Option<Promotion>> {
        let promo = sqlx::query_as::<_, Promotion>(
            "SELECT * FROM promotions \
             WHERE product_id = ?1 AND is_active = 1 \
               AND valid_from <= ?2 AND valid_until >= ?2 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(product_id)
        .bind(when)
        .fetch_optional(&self.pool)
        .await?;
        Ok(promo)
    }

    pub async fn list_all(&self) -> DbResult<Vec<Promotion>> {
        let promos =
            sqlx::query_as::<_, Promotion>("SELECT * FROM promotions ORDER BY valid_from DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(promos)
    }

    pub async fn insert(&self, promo: &Promotion) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO promotions (id, name, product_id, promo_price_centimos, \
                 valid_from, valid_until, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&promo.id)
        .bind(&promo.name)
        .bind(&promo.product_id)
        .bind(promo.promo_price_centimos)
        .bind(promo.valid_from)
        .bind(promo.valid_until)
        .bind(promo.is_active)
        .bind(promo.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE promotions SET is_active = ?1 WHERE id = ?2")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use maracuya_core::{Product, Promotion};
    use uuid::Uuid;

    use crate::pool::{Database, DbConfig};

    async fn seed_product(db: &Database) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: "Menú del día".to_string(),
            category: None,
            price_centimos: 850,
            is_kitchen: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    fn promo_for(product_id: &str, price: i64, from_days: i64, until_days: i64) -> Promotion {
        let now = Utc::now();
        Promotion {
            id: Uuid::new_v4().to_string(),
            name: "Promo escolar".to_string(),
            product_id: product_id.to_string(),
            promo_price_centimos: price,
            valid_from: now + Duration::days(from_days),
            valid_until: now + Duration::days(until_days),
            is_active: true,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_active_promotion_found_inside_window() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db).await;

        db.promotions().insert(&promo_for(&product.id, 700, -1, 1)).await.unwrap();

        let hit = db.promotions().active_for_product(&product.id, Utc::now()).await.unwrap();
        assert_eq!(hit.unwrap().promo_price_centimos, 700);
    }

    #[tokio::test]
    async fn test_expired_and_inactive_promotions_ignored() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db).await;
        let promos = db.promotions();

        // Expired window
        promos.insert(&promo_for(&product.id, 700, -10, -5)).await.unwrap();

        // In-window but deactivated
        let disabled = promo_for(&product.id, 600, -1, 1);
        promos.insert(&disabled).await.unwrap();
        promos.set_active(&disabled.id, false).await.unwrap();

        let hit = promos.active_for_product(&product.id, Utc::now()).await.unwrap();
        assert!(hit.is_none());
    }
}
