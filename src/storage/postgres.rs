use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row, Transaction};

use crate::domain::{NewSale, SalesRecord, SalesSummary, SummaryFilter};

use super::traits::{SalesStore, SalesTransaction};

/// Rows per multi-row INSERT. Four binds per row keeps this well
/// under the 65535 bind-parameter limit.
const MAX_ROWS_PER_STATEMENT: usize = 1000;

const SCHEMA: &str = include_str!("../../sql/schema.sql");

/// PostgreSQL implementation of the SalesStore trait.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new PgStore instance with a connection pool.
    pub async fn connect(
        database_url: &str,
        min_connections: u32,
        max_connections: u32,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(min_connections)
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create the sales table if it does not exist.
    pub async fn init_schema(&self) -> anyhow::Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SalesStore for PgStore {
    async fn find_all(&self) -> anyhow::Result<Vec<SalesRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sale_date, product, region, amount
            FROM sales
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<SalesRecord>> {
        let mut conn = self.pool.acquire().await?;
        select_by_id(&mut conn, id, false).await
    }

    async fn aggregate(&self, filter: &SummaryFilter) -> anyhow::Result<Vec<SalesSummary>> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT to_char(sale_date, 'YYYY-MM-DD') AS date,
                   product,
                   region,
                   SUM(amount) AS total_amount,
                   COUNT(*) AS count
            FROM sales
            WHERE 1 = 1"#,
        );

        if let Some(date) = filter.date {
            query.push(" AND sale_date = ");
            query.push_bind(date);
        }
        if let Some(product) = &filter.product {
            query.push(" AND product = ");
            query.push_bind(product);
        }
        if let Some(region) = &filter.region {
            query.push(" AND region = ");
            query.push_bind(region);
        }

        query.push(
            r#"
            GROUP BY sale_date, product, region
            ORDER BY sale_date, product, region"#,
        );

        let rows = query.build().fetch_all(&self.pool).await?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn bulk_insert(&self, sales: &[NewSale]) -> anyhow::Result<u64> {
        // One transaction per call so a multi-statement chunk lands atomically
        let mut tx = self.pool.begin().await?;
        let inserted = insert_many(&mut tx, sales).await?;
        tx.commit().await?;

        Ok(inserted)
    }

    async fn begin(&self) -> anyhow::Result<Box<dyn SalesTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// A PostgreSQL transaction. sqlx rolls back on drop if not committed.
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SalesTransaction for PgTransaction {
    async fn find_by_id(&mut self, id: i32) -> anyhow::Result<Option<SalesRecord>> {
        select_by_id(&mut self.tx, id, true).await
    }

    async fn insert(&mut self, sale: &NewSale) -> anyhow::Result<i32> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO sales (sale_date, product, region, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(sale.sale_date)
        .bind(&sale.product)
        .bind(&sale.region)
        .bind(sale.amount)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn update(&mut self, id: i32, sale: &NewSale) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET sale_date = $1,
                product = $2,
                region = $3,
                amount = $4
            WHERE id = $5
            "#,
        )
        .bind(sale.sale_date)
        .bind(&sale.product)
        .bind(&sale.region)
        .bind(sale.amount)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&mut self, id: i32) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM sales
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn bulk_insert(&mut self, sales: &[NewSale]) -> anyhow::Result<u64> {
        insert_many(&mut self.tx, sales).await
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Fetch one row; `lock` holds it until the surrounding transaction ends.
async fn select_by_id(
    conn: &mut PgConnection,
    id: i32,
    lock: bool,
) -> anyhow::Result<Option<SalesRecord>> {
    let sql = if lock {
        "SELECT id, sale_date, product, region, amount FROM sales WHERE id = $1 FOR UPDATE"
    } else {
        "SELECT id, sale_date, product, region, amount FROM sales WHERE id = $1"
    };

    let row = sqlx::query(sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(record_from_row).transpose()
}

async fn insert_many(conn: &mut PgConnection, sales: &[NewSale]) -> anyhow::Result<u64> {
    let mut inserted = 0;

    for batch in sales.chunks(MAX_ROWS_PER_STATEMENT) {
        let mut query =
            QueryBuilder::<Postgres>::new("INSERT INTO sales (sale_date, product, region, amount) ");

        query.push_values(batch, |mut row, sale| {
            row.push_bind(sale.sale_date)
                .push_bind(&sale.product)
                .push_bind(&sale.region)
                .push_bind(sale.amount);
        });

        let result = query.build().execute(&mut *conn).await?;
        inserted += result.rows_affected();
    }

    Ok(inserted)
}

fn record_from_row(row: &PgRow) -> anyhow::Result<SalesRecord> {
    Ok(SalesRecord {
        id: row.try_get("id")?,
        sale_date: row.try_get("sale_date")?,
        product: row.try_get("product")?,
        region: row.try_get("region")?,
        amount: row.try_get("amount")?,
    })
}

fn summary_from_row(row: &PgRow) -> anyhow::Result<SalesSummary> {
    Ok(SalesSummary {
        date: row.try_get("date")?,
        product: row.try_get("product")?,
        region: row.try_get("region")?,
        total_amount: row.try_get("total_amount")?,
        count: row.try_get("count")?,
    })
}
