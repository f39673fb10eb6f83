//! # Product Repository
//!
//! CRUD for the product catalog. Products are soft-deleted (`is_active`)
//! because committed sale items reference them by id.

use sqlx::SqlitePool;
use tracing::debug;

use maracuya_core::Product;

use crate::error::{DbError, DbResult};

/// Repository for products.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Active products for the POS grid, alphabetical.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// All products including soft-deleted, for the admin screen.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products =
            sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY is_active DESC, name")
                .fetch_all(&self.pool)
                .await?;
        Ok(products)
    }

    /// Case-insensitive name search over active products.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Product>> {
        let pattern = format!("%{}%", query);
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products \
             WHERE is_active = 1 AND name LIKE ?1 COLLATE NOCASE \
             ORDER BY name LIMIT ?2",
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO products (id, name, category, price_centimos, is_kitchen, \
                 is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_centimos)
        .bind(product.is_kitchen)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(name = %product.name, "Product inserted");
        Ok(())
    }

    /// Updates a product. Committed sale items keep their snapshots, so a
    /// price change here never rewrites history.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET name = ?1, category = ?2, price_centimos = ?3, \
                 is_kitchen = ?4, is_active = ?5, updated_at = ?6 \
             WHERE id = ?7",
        )
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_centimos)
        .bind(product.is_kitchen)
        .bind(product.is_active)
        .bind(product.updated_at)
        .bind(&product.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }
        Ok(())
    }

    /// Soft delete / reactivate.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(active)
            .bind(chrono::Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
