//! Case and membership repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::info;

use chagok_core::{Case, CaseMember, CaseRepository, CaseRole, CaseStatus, Error, Result};

/// PostgreSQL implementation of [`CaseRepository`].
pub struct PgCaseRepository {
    pool: PgPool,
}

impl PgCaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn status_from_str(s: &str) -> CaseStatus {
        match s {
            "closed" => CaseStatus::Closed,
            _ => CaseStatus::Active,
        }
    }

    fn parse_case_row(row: sqlx::postgres::PgRow) -> Case {
        Case {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            status: Self::status_from_str(row.get("status")),
            owner_id: row.get("owner_id"),
            search_index_ref: row.get("search_index_ref"),
            created_at: row.get("created_at"),
            closed_at: row.get("closed_at"),
        }
    }
}

#[async_trait]
impl CaseRepository for PgCaseRepository {
    async fn create(&self, case: &Case) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO cases (id, title, description, status, owner_id, search_index_ref, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&case.id)
        .bind(&case.title)
        .bind(&case.description)
        .bind(case.status.as_str())
        .bind(&case.owner_id)
        .bind(&case.search_index_ref)
        .bind(case.created_at)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO case_members (case_id, user_id, role, added_at)
             VALUES ($1, $2, 'owner', $3)",
        )
        .bind(&case.id)
        .bind(&case.owner_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "cases",
            op = "create",
            case_id = %case.id,
            user_id = %case.owner_id,
            "Case created"
        );
        Ok(())
    }

    async fn get(&self, case_id: &str) -> Result<Option<Case>> {
        let row = sqlx::query("SELECT * FROM cases WHERE id = $1")
            .bind(case_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.map(Self::parse_case_row))
    }

    async fn close(&self, case_id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE cases SET status = 'closed', closed_at = $2, search_index_ref = NULL
             WHERE id = $1 AND status = 'active'",
        )
        .bind(case_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            // Either unknown or already closed; disambiguate for the caller
            return match self.get(case_id).await? {
                Some(_) => Err(Error::Conflict(format!("case {} is already closed", case_id))),
                None => Err(Error::CaseNotFound(case_id.to_string())),
            };
        }

        info!(
            subsystem = "db",
            component = "cases",
            op = "close",
            case_id = %case_id,
            "Case closed"
        );
        Ok(())
    }

    async fn add_member(&self, member: &CaseMember) -> Result<()> {
        sqlx::query(
            "INSERT INTO case_members (case_id, user_id, role, added_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (case_id, user_id) DO UPDATE SET role = EXCLUDED.role",
        )
        .bind(&member.case_id)
        .bind(&member.user_id)
        .bind(member.role.as_str())
        .bind(member.added_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn role_of(&self, case_id: &str, user_id: &str) -> Result<Option<CaseRole>> {
        let role: Option<String> =
            sqlx::query_scalar("SELECT role FROM case_members WHERE case_id = $1 AND user_id = $2")
                .bind(case_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(role.map(|r| CaseRole::from_str_lossy(&r)))
    }

    async fn set_search_index_ref(&self, case_id: &str, index_ref: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE cases SET search_index_ref = $2 WHERE id = $1")
            .bind(case_id)
            .bind(index_ref)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
