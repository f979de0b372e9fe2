use sqlx::{PgPool, Postgres, Transaction, postgres::PgPoolOptions};

use crate::{Result, schema};

const SCHEMA_LOCK_ID: i64 = 7_120_115;

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &rst_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		// Concurrent bootstraps serialize on this lock until commit.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)")
			.bind(SCHEMA_LOCK_ID)
			.execute(&mut *tx)
			.await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}

	/// Opens a read-only transaction whose queries all observe one snapshot.
	pub async fn begin_read_snapshot(&self) -> Result<Transaction<'static, Postgres>> {
		let mut tx = self.pool.begin().await?;

		sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
			.execute(&mut *tx)
			.await?;

		Ok(tx)
	}
}
