use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderRequest;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{CreatedOrder, LedgerError, Order, OrderId, OrderLedger, OrderStatus, Result};

/// PostgreSQL-backed order ledger.
///
/// Idempotency rests entirely on the `orders_idempotency_key_key` unique
/// index; see [`OrderLedger::create_order`].
#[derive(Clone)]
pub struct PostgresOrderLedger {
    pool: PgPool,
}

impl PostgresOrderLedger {
    /// Creates a new ledger over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and applies the migrations.
    ///
    /// Failure here means the service cannot start.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        let ledger = Self::new(pool);
        ledger.run_migrations().await?;
        Ok(ledger)
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn parse_status(raw: &str) -> Result<OrderStatus> {
        raw.parse().map_err(LedgerError::CorruptRow)
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: row.try_get("user_id")?,
            amount_cents: row.try_get("amount_cents")?,
            currency: row.try_get("currency")?,
            status: Self::parse_status(&status)?,
            idempotency_key: row.try_get("idempotency_key")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

#[async_trait]
impl OrderLedger for PostgresOrderLedger {
    #[tracing::instrument(skip(self, request), fields(idempotency_key = %request.idempotency_key))]
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder> {
        request.validate()?;

        let candidate = Order::from_request(request);
        let start = Instant::now();

        // The no-op update on conflict makes RETURNING yield the existing row.
        let row = sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, amount_cents, currency, status, idempotency_key, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (idempotency_key) DO UPDATE SET status = orders.status
            RETURNING id, status
            "#,
        )
        .bind(candidate.id.as_uuid())
        .bind(&candidate.user_id)
        .bind(candidate.amount_cents)
        .bind(&candidate.currency)
        .bind(candidate.status.as_str())
        .bind(&candidate.idempotency_key)
        .bind(candidate.created_at)
        .fetch_one(&self.pool)
        .await;

        metrics::histogram!("ledger_query_duration_seconds", "op" => "create_order")
            .record(start.elapsed().as_secs_f64());

        let row = row.inspect_err(|e| tracing::error!(error = %e, "order upsert failed"))?;
        let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let status: String = row.try_get("status")?;

        if order_id != candidate.id {
            tracing::debug!(%order_id, "idempotency key already present");
        }

        Ok(CreatedOrder {
            order_id,
            status: Self::parse_status(&status)?,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_order(&self, id: OrderId) -> Result<Order> {
        let start = Instant::now();

        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, user_id, amount_cents, currency, status, idempotency_key, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        metrics::histogram!("ledger_query_duration_seconds", "op" => "get_order")
            .record(start.elapsed().as_secs_f64());

        match row {
            Some(row) => Self::row_to_order(row),
            None => Err(LedgerError::NotFound(id)),
        }
    }
}
