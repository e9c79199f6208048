//! # chagok-db
//!
//! PostgreSQL persistence for the CHAGOK evidence pipeline: cases and
//! membership, evidence records, and connection pool management. An
//! in-memory evidence repository is provided for worker tests, mirroring
//! the production table's update-or-create semantics.

pub mod cases;
pub mod evidence;
pub mod memory;
pub mod pool;

use std::sync::Arc;

use sqlx::PgPool;

pub use cases::PgCaseRepository;
pub use evidence::PgEvidenceRepository;
pub use memory::{InMemoryCaseRepository, InMemoryEvidenceRepository};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};

use chagok_core::{CaseRepository, EvidenceRepository, Result};

/// Bundle of repositories sharing one connection pool.
#[derive(Clone)]
pub struct Database {
    pub cases: Arc<dyn CaseRepository>,
    pub evidence: Arc<dyn EvidenceRepository>,
}

impl Database {
    /// Construct repositories over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            cases: Arc::new(PgCaseRepository::new(pool.clone())),
            evidence: Arc::new(PgEvidenceRepository::new(pool)),
        }
    }

    /// Connect to the database and run pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| chagok_core::Error::Config(format!("Migration failed: {}", e)))?;
        Ok(Self::new(pool))
    }

    /// In-memory database for tests and local development without Postgres.
    pub fn in_memory() -> Self {
        Self {
            cases: Arc::new(InMemoryCaseRepository::new()),
            evidence: Arc::new(InMemoryEvidenceRepository::new()),
        }
    }
}
