use async_trait::async_trait;
use common::{BuyerId, BuyerRef, OrderId, ProductRef};
use domain::{
    DomainError, Money, Order, OrderLine, OrderNumber, OrderStatus, PaymentRefs, SavedAddress,
    SavedPaymentMethod, ShippingProfile, StockAdjustment, StockRecord, UserProfile,
};
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{AccountStore, AddressStore, OrderStore, PaymentMethodStore, SequenceStore, StockStore},
};

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, shipping_address, billing_address, \
     total_amount, guest_email, tracking_number, carrier, tracking_url, payment_intent_id, \
     payment_status, created_at, updated_at";

const ADDRESS_COLUMNS: &str = "id, user_id, first_name, last_name, address_line1, address_line2, \
     city, state, postal_code, country, phone, email, is_default, created_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let shipping: serde_json::Value = row.try_get("shipping_address")?;
        let billing: serde_json::Value = row.try_get("billing_address")?;
        let payment_intent_id: Option<String> = row.try_get("payment_intent_id")?;
        let payment_status: Option<String> = row.try_get("payment_status")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_number: OrderNumber::from_string(row.try_get::<String, _>("order_number")?),
            buyer: BuyerRef::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            status: status.parse()?,
            shipping_address: serde_json::from_value(shipping)?,
            billing_address: serde_json::from_value(billing)?,
            total_amount: Money::from_cents(row.try_get("total_amount")?),
            guest_email: row.try_get("guest_email")?,
            tracking_number: row.try_get("tracking_number")?,
            carrier: row.try_get("carrier")?,
            tracking_url: row.try_get("tracking_url")?,
            payment: payment_intent_id.map(|id| PaymentRefs {
                payment_intent_id: id,
                payment_status: payment_status.unwrap_or_default(),
            }),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_line(row: PgRow) -> Result<OrderLine> {
        let quantity: i32 = row.try_get("quantity")?;
        Ok(OrderLine {
            id: row.try_get("id")?,
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_ref: ProductRef::new(row.try_get::<String, _>("product_id")?),
            name: row.try_get("name")?,
            quantity: u32::try_from(quantity)
                .map_err(|_| StoreError::InvalidData(format!("negative quantity {quantity}")))?,
            unit_price: Money::from_cents(row.try_get("price")?),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_stock(row: PgRow) -> Result<StockRecord> {
        Ok(StockRecord {
            product_ref: ProductRef::new(row.try_get::<String, _>("id")?),
            quantity_on_hand: row.try_get("qtyoh")?,
            disabled: row.try_get("disabled")?,
            sold_out: row.try_get("sold_out")?,
            is_category: row.try_get("is_category")?,
        })
    }

    fn row_to_address(row: PgRow) -> Result<SavedAddress> {
        Ok(SavedAddress {
            id: row.try_get("id")?,
            buyer_id: BuyerId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            is_default: row.try_get("is_default")?,
            country: row.try_get("country")?,
            profile: ShippingProfile {
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                address_line1: row.try_get("address_line1")?,
                address_line2: row.try_get("address_line2")?,
                city: row.try_get("city")?,
                state: row.try_get("state")?,
                postal_code: row.try_get("postal_code")?,
                phone: row.try_get("phone")?,
                email: row.try_get("email")?,
            },
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_profile(row: PgRow) -> Result<UserProfile> {
        Ok(UserProfile {
            id: BuyerId::from_uuid(row.try_get::<Uuid, _>("id")?),
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_payment_method(row: PgRow) -> Result<SavedPaymentMethod> {
        let month: i32 = row.try_get("expiry_month")?;
        let year: i32 = row.try_get("expiry_year")?;
        Ok(SavedPaymentMethod {
            id: row.try_get("id")?,
            buyer_id: BuyerId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            card_brand: row.try_get("card_brand")?,
            last_four: row.try_get("last_four")?,
            expiry_month: month.max(0) as u32,
            expiry_year: year.max(0) as u32,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, user_id, status, shipping_address, billing_address,
                                total_amount, guest_email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.order_number.as_str())
        .bind(order.buyer.as_uuid())
        .bind(order.status.as_str())
        .bind(serde_json::to_value(&order.shipping_address)?)
        .bind(serde_json::to_value(&order.billing_address)?)
        .bind(order.total_amount.cents())
        .bind(&order.guest_email)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_order_lines(&self, lines: &[OrderLine]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for line in lines {
            let quantity = i32::try_from(line.quantity)
                .map_err(|_| StoreError::InvalidData(format!("quantity {}", line.quantity)))?;
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, name, quantity, price, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(line.id)
            .bind(line.order_id.as_uuid())
            .bind(line.product_ref.as_str())
            .bind(&line.name)
            .bind(quantity)
            .bind(line.unit_price.cents())
            .bind(line.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return StoreError::OrderNotFound(line.order_id);
                }
                StoreError::Database(e)
            })?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<bool> {
        // order_items cascade
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        payment: Option<&PaymentRefs>,
    ) -> Result<Order> {
        let current = self
            .get_order(order_id)
            .await?
            .ok_or(StoreError::OrderNotFound(order_id))?;
        if current.status == status {
            return Ok(current);
        }
        current.status.transition_to(status)?;

        let updated = sqlx::query(&format!(
            r#"
            UPDATE orders
            SET status = $2,
                payment_intent_id = COALESCE($3, payment_intent_id),
                payment_status = COALESCE($4, payment_status),
                updated_at = NOW()
            WHERE id = $1 AND status = $5
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id.as_uuid())
        .bind(status.as_str())
        .bind(payment.map(|p| p.payment_intent_id.as_str()))
        .bind(payment.map(|p| p.payment_status.as_str()))
        .bind(current.status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => Self::row_to_order(row),
            None => {
                tracing::debug!(%order_id, %status, "order status changed concurrently");
                let latest = self
                    .get_order(order_id)
                    .await?
                    .ok_or(StoreError::OrderNotFound(order_id))?;
                if latest.status == status {
                    Ok(latest)
                } else {
                    Err(DomainError::InvalidStatusTransition {
                        from: latest.status,
                        to: status,
                    }
                    .into())
                }
            }
        }
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_order).transpose()
    }

    async fn get_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, name, quantity, price, created_at
            FROM order_items
            WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_line).collect()
    }
}

#[async_trait]
impl SequenceStore for PostgresStore {
    async fn next_value(&self, name: &str) -> Result<i64> {
        let value: i64 = sqlx::query_scalar("SELECT get_next_order_sequence($1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(value)
    }
}

#[async_trait]
impl StockStore for PostgresStore {
    async fn get_stock(&self, product_ref: &ProductRef) -> Result<Option<StockRecord>> {
        let row = sqlx::query(
            "SELECT id, qtyoh, disabled, sold_out, is_category FROM products WHERE id = $1",
        )
        .bind(product_ref.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_stock).transpose()
    }

    async fn decrement_clamped(
        &self,
        product_ref: &ProductRef,
        quantity: u32,
    ) -> Result<Option<StockAdjustment>> {
        let row = sqlx::query(
            r#"
            WITH locked AS (
                SELECT id, qtyoh FROM products
                WHERE id = $1 AND NOT is_category
                FOR UPDATE
            )
            UPDATE products p
            SET qtyoh = GREATEST(p.qtyoh - $2, 0),
                disabled = p.disabled OR GREATEST(p.qtyoh - $2, 0) = 0,
                sold_out = p.sold_out OR GREATEST(p.qtyoh - $2, 0) = 0
            FROM locked
            WHERE p.id = locked.id
            RETURNING locked.qtyoh AS previous, p.qtyoh AS remaining
            "#,
        )
        .bind(product_ref.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(StockAdjustment::new(
                product_ref.clone(),
                row.try_get("previous")?,
                quantity,
                row.try_get("remaining")?,
            ))),
            None => match self.get_stock(product_ref).await? {
                Some(record) if record.is_category => Ok(None),
                _ => Err(StoreError::ProductNotFound(product_ref.to_string())),
            },
        }
    }

    async fn upsert_stock(&self, record: &StockRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, qtyoh, disabled, sold_out, is_category)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET qtyoh = EXCLUDED.qtyoh,
                disabled = EXCLUDED.disabled,
                sold_out = EXCLUDED.sold_out,
                is_category = EXCLUDED.is_category
            "#,
        )
        .bind(record.product_ref.as_str())
        .bind(record.quantity_on_hand)
        .bind(record.disabled)
        .bind(record.sold_out)
        .bind(record.is_category)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AddressStore for PostgresStore {
    async fn list_addresses(&self, buyer_id: BuyerId) -> Result<Vec<SavedAddress>> {
        let rows = sqlx::query(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM shipping_addresses WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(buyer_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_address).collect()
    }

    async fn save_address(&self, address: &SavedAddress) -> Result<()> {
        let profile = &address.profile;
        sqlx::query(&format!(
            "INSERT INTO shipping_addresses ({ADDRESS_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        ))
        .bind(address.id)
        .bind(address.buyer_id.as_uuid())
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.address_line1)
        .bind(&profile.address_line2)
        .bind(&profile.city)
        .bind(&profile.state)
        .bind(&profile.postal_code)
        .bind(&address.country)
        .bind(&profile.phone)
        .bind(&profile.email)
        .bind(address.is_default)
        .bind(address.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for PostgresStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT id, email, first_name, last_name, created_at FROM user_profiles \
             WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_profile).transpose()
    }

    async fn get_account(&self, buyer_id: BuyerId) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT id, email, first_name, last_name, created_at FROM user_profiles WHERE id = $1",
        )
        .bind(buyer_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_profile).transpose()
    }

    async fn create_account(&self, profile: &UserProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (id, email, first_name, last_name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(profile.id.as_uuid())
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("idx_user_profiles_email")
            {
                return StoreError::DuplicateAccount(profile.email.clone());
            }
            StoreError::Database(e)
        })?;
        Ok(())
    }
}

#[async_trait]
impl PaymentMethodStore for PostgresStore {
    async fn list_payment_methods(&self, buyer_id: BuyerId) -> Result<Vec<SavedPaymentMethod>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, card_brand, last_four, expiry_month, expiry_year, created_at
            FROM payment_methods
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(buyer_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_payment_method).collect()
    }

    async fn save_payment_method(&self, method: &SavedPaymentMethod) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_methods (id, user_id, card_brand, last_four, expiry_month, expiry_year, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(method.id)
        .bind(method.buyer_id.as_uuid())
        .bind(&method.card_brand)
        .bind(&method.last_four)
        .bind(method.expiry_month as i32)
        .bind(method.expiry_year as i32)
        .bind(method.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
