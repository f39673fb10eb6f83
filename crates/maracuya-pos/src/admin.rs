//! # Back-office Administration
//!
//! Admin-gated maintenance of the catalog (products, promotions), the client
//! directory, and terminal users. Every mutation is validated against the
//! core rules and leaves an audit row.
//!
//! Price edits are never retroactive: the cart freezes prices when an item is
//! added, so an edit here only affects future sales.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use maracuya_core::{
    validation, ArStatus, Client, CoreError, PaymentMethod, Product, Promotion, Role, Sale,
    SaleStatus, User, WALK_IN_CLIENT_ID,
};
use maracuya_db::Database;

use crate::error::{PosError, PosResult};
use crate::session::Session;

/// Fields an operator supplies when creating or editing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub category: Option<String>,
    pub price_centimos: i64,
    pub is_kitchen: bool,
}

/// Fields an operator supplies when creating or editing a client.
#[derive(Debug, Clone)]
pub struct ClientInput {
    pub code: String,
    pub names: String,
    pub last_names: String,
    pub has_account: bool,
    pub grade: Option<String>,
    pub level: Option<String>,
}

/// Fields an operator supplies when creating a promotion.
#[derive(Debug, Clone)]
pub struct PromotionInput {
    pub name: String,
    pub product_id: String,
    pub promo_price_centimos: i64,
    pub valid_from: chrono::DateTime<Utc>,
    pub valid_until: chrono::DateTime<Utc>,
}

/// The back-office administration service.
#[derive(Debug, Clone)]
pub struct Admin {
    db: Database,
}

impl Admin {
    pub fn new(db: Database) -> Self {
        Admin { db }
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn create_product(
        &self,
        session: &Session,
        input: ProductInput,
    ) -> PosResult<Product> {
        session.require("create product", Role::Admin)?;
        validate_product_input(&input)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            category: input.category,
            price_centimos: input.price_centimos,
            is_kitchen: input.is_kitchen,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.db.products().insert(&product).await?;
        self.audit(session, "product.create", "product", &product.id).await?;

        info!(product = %product.name, "Product created");
        Ok(product)
    }

    pub async fn update_product(
        &self,
        session: &Session,
        product_id: &str,
        input: ProductInput,
    ) -> PosResult<Product> {
        session.require("update product", Role::Admin)?;
        validate_product_input(&input)?;

        let mut product = self.db.products().get_by_id(product_id).await?;
        product.name = input.name;
        product.category = input.category;
        product.price_centimos = input.price_centimos;
        product.is_kitchen = input.is_kitchen;
        product.updated_at = Utc::now();

        self.db.products().update(&product).await?;
        self.audit(session, "product.update", "product", product_id).await?;
        Ok(product)
    }

    /// Soft delete: the product disappears from the POS grid but stays
    /// referenced by past sale items.
    pub async fn deactivate_product(&self, session: &Session, product_id: &str) -> PosResult<()> {
        session.require("deactivate product", Role::Admin)?;
        self.db.products().set_active(product_id, false).await?;
        self.audit(session, "product.deactivate", "product", product_id).await
    }

    // =========================================================================
    // Clients
    // =========================================================================

    pub async fn create_client(&self, session: &Session, input: ClientInput) -> PosResult<Client> {
        session.require("create client", Role::Admin)?;
        validate_client_input(&input)?;

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            full_name: format!("{} {}", input.names, input.last_names),
            code: input.code,
            names: input.names,
            last_names: input.last_names,
            has_account: input.has_account,
            is_active: true,
            grade: input.grade,
            level: input.level,
            debt_centimos: 0,
            created_at: now,
            updated_at: now,
        };
        self.db.clients().insert(&client).await?;
        self.audit(session, "client.create", "client", &client.id).await?;

        info!(client = %client.code, "Client created");
        Ok(client)
    }

    pub async fn update_client(
        &self,
        session: &Session,
        client_id: &str,
        input: ClientInput,
    ) -> PosResult<Client> {
        session.require("update client", Role::Admin)?;
        if client_id == WALK_IN_CLIENT_ID {
            return Err(PosError::Conflict("the walk-in client cannot be edited".to_string()));
        }
        validate_client_input(&input)?;

        let mut client = self.db.clients().get_by_id(client_id).await?;
        client.full_name = format!("{} {}", input.names, input.last_names);
        client.code = input.code;
        client.names = input.names;
        client.last_names = input.last_names;
        client.has_account = input.has_account;
        client.grade = input.grade;
        client.level = input.level;
        client.updated_at = Utc::now();

        self.db.clients().update(&client).await?;
        self.audit(session, "client.update", "client", client_id).await?;
        Ok(client)
    }

    /// Deactivation is refused while the client still owes money.
    pub async fn deactivate_client(&self, session: &Session, client_id: &str) -> PosResult<()> {
        session.require("deactivate client", Role::Admin)?;
        if client_id == WALK_IN_CLIENT_ID {
            return Err(PosError::Conflict("the walk-in client cannot be deactivated".to_string()));
        }

        let client = self.db.clients().get_by_id(client_id).await?;
        if client.debt_centimos > 0 {
            return Err(PosError::Conflict(format!(
                "client {} still owes {} centimos",
                client.code, client.debt_centimos
            )));
        }

        self.db.clients().set_active(client_id, false).await?;
        self.audit(session, "client.deactivate", "client", client_id).await
    }

    // =========================================================================
    // Promotions
    // =========================================================================

    pub async fn create_promotion(
        &self,
        session: &Session,
        input: PromotionInput,
    ) -> PosResult<Promotion> {
        session.require("create promotion", Role::Admin)?;
        validation::validate_product_name(&input.name).map_err(CoreError::from)?;
        validation::validate_price_centimos(input.promo_price_centimos)
            .map_err(CoreError::from)?;
        if input.valid_until <= input.valid_from {
            return Err(PosError::Conflict("promotion window ends before it starts".to_string()));
        }

        // The product must exist and be sellable
        let product = self.db.products().get_by_id(&input.product_id).await?;
        if !product.is_active {
            return Err(PosError::not_found("Product", &input.product_id));
        }

        let promo = Promotion {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            product_id: input.product_id,
            promo_price_centimos: input.promo_price_centimos,
            valid_from: input.valid_from,
            valid_until: input.valid_until,
            is_active: true,
            created_at: Utc::now(),
        };
        self.db.promotions().insert(&promo).await?;
        self.audit(session, "promotion.create", "promotion", &promo.id).await?;
        Ok(promo)
    }

    pub async fn deactivate_promotion(&self, session: &Session, promo_id: &str) -> PosResult<()> {
        session.require("deactivate promotion", Role::Admin)?;
        self.db.promotions().set_active(promo_id, false).await?;
        self.audit(session, "promotion.deactivate", "promotion", promo_id).await
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Voids a committed sale. The row stays (the correlative sequence must
    /// remain gapless); reports exclude voided sales. A credit sale can only
    /// be voided after its AR entry has been dealt with.
    pub async fn void_sale(&self, session: &Session, sale_id: &str) -> PosResult<Sale> {
        session.require("void sale", Role::Admin)?;

        let sale = self.db.sales().get_by_id(sale_id).await?;
        if sale.status != SaleStatus::Completed {
            return Err(PosError::Conflict(format!(
                "sale {} is {:?}, only completed sales can be voided",
                sale.correlative, sale.status
            )));
        }
        if sale.payment_method == PaymentMethod::Credito {
            let entry = self.db.receivables().get(&sale.client_id, sale_id).await?;
            if entry.status == ArStatus::Pending {
                return Err(PosError::Conflict(format!(
                    "sale {} has a pending receivable; collect it first",
                    sale.correlative
                )));
            }
        }

        self.db.sales().set_status(sale_id, SaleStatus::Void).await?;
        self.audit(session, "sale.void", "sale", sale_id).await?;

        info!(correlative = %sale.correlative, "Sale voided");
        Ok(Sale { status: SaleStatus::Void, ..sale })
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn create_user(
        &self,
        session: &Session,
        code: &str,
        name: &str,
        role: Role,
        pin: &str,
    ) -> PosResult<User> {
        session.require("create user", Role::Admin)?;
        validation::validate_client_code(code).map_err(CoreError::from)?;
        validation::validate_person_name("name", name).map_err(CoreError::from)?;
        validation::validate_pin(pin).map_err(CoreError::from)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            name: name.to_string(),
            pin_hash: bcrypt::hash(pin, bcrypt::DEFAULT_COST)?,
            role,
            is_active: true,
            created_at: Utc::now(),
        };
        self.db.users().insert(&user).await?;
        self.audit(session, "user.create", "user", &user.id).await?;

        info!(user = %user.code, role = ?user.role, "User created");
        Ok(user)
    }

    pub async fn set_user_pin(&self, session: &Session, user_id: &str, pin: &str) -> PosResult<()> {
        session.require("set user PIN", Role::Admin)?;
        validation::validate_pin(pin).map_err(CoreError::from)?;

        let hash = bcrypt::hash(pin, bcrypt::DEFAULT_COST)?;
        self.db.users().set_pin_hash(user_id, &hash).await?;
        self.audit(session, "user.set_pin", "user", user_id).await
    }

    pub async fn deactivate_user(&self, session: &Session, user_id: &str) -> PosResult<()> {
        session.require("deactivate user", Role::Admin)?;
        if user_id == session.user_id {
            return Err(PosError::Conflict("cannot deactivate your own user".to_string()));
        }
        self.db.users().set_active(user_id, false).await?;
        self.audit(session, "user.deactivate", "user", user_id).await
    }

    async fn audit(
        &self,
        session: &Session,
        action: &str,
        entity_type: &str,
        entity_id: &str,
    ) -> PosResult<()> {
        self.db
            .audit()
            .log_action(&session.user_id, action, entity_type, entity_id, serde_json::json!({}))
            .await?;
        Ok(())
    }
}

fn validate_product_input(input: &ProductInput) -> PosResult<()> {
    validation::validate_product_name(&input.name).map_err(CoreError::from)?;
    validation::validate_price_centimos(input.price_centimos).map_err(CoreError::from)?;
    Ok(())
}

fn validate_client_input(input: &ClientInput) -> PosResult<()> {
    validation::validate_client_code(&input.code).map_err(CoreError::from)?;
    validation::validate_person_name("names", &input.names).map_err(CoreError::from)?;
    validation::validate_person_name("last names", &input.last_names).map_err(CoreError::from)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use maracuya_db::DbConfig;

    use super::*;

    fn session(role: Role) -> Session {
        Session {
            user_id: "user-1".to_string(),
            code: "admin".to_string(),
            name: "Administración".to_string(),
            role,
            logged_in_at: Utc::now(),
        }
    }

    fn product_input(price: i64) -> ProductInput {
        ProductInput {
            name: "Empanada de pollo".to_string(),
            category: Some("Snacks".to_string()),
            price_centimos: price,
            is_kitchen: false,
        }
    }

    fn client_input(code: &str) -> ClientInput {
        ClientInput {
            code: code.to_string(),
            names: "Ana".to_string(),
            last_names: "Quispe".to_string(),
            has_account: true,
            grade: Some("3B".to_string()),
            level: Some("Primaria".to_string()),
        }
    }

    #[tokio::test]
    async fn test_product_lifecycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = Admin::new(db.clone());
        let root = session(Role::Admin);

        let product = admin.create_product(&root, product_input(350)).await.unwrap();
        assert_eq!(db.products().list_active().await.unwrap().len(), 1);

        let mut edited = product_input(400);
        edited.name = "Empanada de carne".to_string();
        let updated = admin.update_product(&root, &product.id, edited).await.unwrap();
        assert_eq!(updated.price_centimos, 400);

        admin.deactivate_product(&root, &product.id).await.unwrap();
        assert!(db.products().list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cashier_cannot_manage_catalog() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = Admin::new(db);

        let err = admin
            .create_product(&session(Role::Cashier), product_input(350))
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_invalid_product_price_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = Admin::new(db);

        let err = admin
            .create_product(&session(Role::Admin), product_input(-100))
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::Validation(_)));
    }

    #[tokio::test]
    async fn test_walk_in_client_is_untouchable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = Admin::new(db);
        let root = session(Role::Admin);

        let err = admin
            .update_client(&root, WALK_IN_CLIENT_ID, client_input("C001"))
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::Conflict(_)));

        let err = admin.deactivate_client(&root, WALK_IN_CLIENT_ID).await.unwrap_err();
        assert!(matches!(err, PosError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_client_code_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = Admin::new(db);
        let root = session(Role::Admin);

        admin.create_client(&root, client_input("C001")).await.unwrap();
        let err = admin.create_client(&root, client_input("C001")).await.unwrap_err();
        assert!(matches!(err, PosError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_promotion_window_must_be_ordered() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = Admin::new(db.clone());
        let root = session(Role::Admin);

        let product = admin.create_product(&root, product_input(350)).await.unwrap();
        let now = Utc::now();
        let err = admin
            .create_promotion(
                &root,
                PromotionInput {
                    name: "Promo al revés".to_string(),
                    product_id: product.id,
                    promo_price_centimos: 300,
                    valid_from: now,
                    valid_until: now - chrono::Duration::days(1),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_void_sale_and_double_void_rejected() {
        use maracuya_core::{SaleOrigin, SaleType};

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = Admin::new(db.clone());
        let root = session(Role::Admin);

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            correlative: "V-000001".to_string(),
            sale_date: now,
            cashier_id: "caja1".to_string(),
            client_id: WALK_IN_CLIENT_ID.to_string(),
            client_name: "Cliente Varios".to_string(),
            subtotal_centimos: 508,
            tax_centimos: 92,
            total_centimos: 600,
            paid_centimos: 600,
            payment_method: PaymentMethod::Efectivo,
            sale_type: SaleType::Normal,
            status: SaleStatus::Completed,
            origin: SaleOrigin::Pos,
            request_id: Uuid::new_v4().to_string(),
            created_by: "caja1".to_string(),
            created_at: now,
        };
        let mut tx = db.pool().begin().await.unwrap();
        maracuya_db::SaleRepository::insert_sale_tx(&mut *tx, &sale).await.unwrap();
        tx.commit().await.unwrap();

        let voided = admin.void_sale(&root, &sale.id).await.unwrap();
        assert_eq!(voided.status, SaleStatus::Void);

        let err = admin.void_sale(&root, &sale.id).await.unwrap_err();
        assert!(matches!(err, PosError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_user_creation_and_login_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = Admin::new(db.clone());
        let root = session(Role::Admin);

        let user = admin
            .create_user(&root, "caja2", "Caja Dos", Role::Cashier, "4321")
            .await
            .unwrap();
        assert!(bcrypt::verify("4321", &user.pin_hash).unwrap());

        // Self-deactivation guard
        let mut me = root.clone();
        me.user_id = user.id.clone();
        let err = admin.deactivate_user(&me, &user.id).await.unwrap_err();
        assert!(matches!(err, PosError::Conflict(_)));
    }
}
