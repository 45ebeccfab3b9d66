//! PostgreSQL implementation of VotingStore.
//!
//! A unit of work wraps one database transaction. Row locks taken through
//! `load_session` are held until commit or rollback.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::foundation::{
    DomainError, ErrorCode, RestaurantId, Timestamp, UserId, VoteId, VoteSessionId,
    VoteSessionStatus,
};
use crate::domain::voting::{VoteRecord, VoteSession};
use crate::ports::{
    MembershipRepository, Page, PageRequest, RowLock, SessionListFilter, VoteRepository,
    VoteSessionRepository, VotingStore, VotingUnitOfWork,
};

const SESSION_COLUMNS: &str = "id, title, description, status, creator_id, votes_per_user, \
     auto_close_at, created_at, started_at, ended_at, updated_at";

const VOTE_COLUMNS: &str = "id, session_id, user_id, restaurant_id, sequence, weight, voted_at";

/// PostgreSQL implementation of VotingStore.
#[derive(Clone)]
pub struct PostgresVotingStore {
    pool: PgPool,
}

impl PostgresVotingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VotingStore for PostgresVotingStore {
    async fn begin(&self) -> Result<Box<dyn VotingUnitOfWork>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;
        Ok(Box::new(PostgresUnitOfWork { tx }))
    }
}

/// One transaction over the voting tables.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl VotingUnitOfWork for PostgresUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let this = *self;
        this.tx.commit().await.map_err(|e| {
            if is_unique_violation(&e) {
                constraint_violation(e)
            } else {
                db_error("Failed to commit transaction")(e)
            }
        })
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        let this = *self;
        this.tx
            .rollback()
            .await
            .map_err(db_error("Failed to roll back transaction"))
    }
}

#[async_trait]
impl VoteSessionRepository for PostgresUnitOfWork {
    async fn insert_session(&mut self, session: &VoteSession) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO vote_sessions (
                id, title, description, status, creator_id, votes_per_user,
                auto_close_at, created_at, started_at, ended_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.title())
        .bind(session.description())
        .bind(session.status().as_str())
        .bind(session.creator_id().as_i64())
        .bind(int_column("votes_per_user", session.votes_per_user())?)
        .bind(session.auto_close_at().map(|t| *t.as_datetime()))
        .bind(session.created_at().as_datetime())
        .bind(session.started_at().map(|t| *t.as_datetime()))
        .bind(session.ended_at().map(|t| *t.as_datetime()))
        .bind(session.updated_at().as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to insert vote session"))?;

        Ok(())
    }

    async fn update_session(&mut self, session: &VoteSession) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE vote_sessions SET
                title = $2,
                description = $3,
                status = $4,
                auto_close_at = $5,
                started_at = $6,
                ended_at = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.title())
        .bind(session.description())
        .bind(session.status().as_str())
        .bind(session.auto_close_at().map(|t| *t.as_datetime()))
        .bind(session.started_at().map(|t| *t.as_datetime()))
        .bind(session.ended_at().map(|t| *t.as_datetime()))
        .bind(session.updated_at().as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to update vote session"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            ));
        }

        Ok(())
    }

    async fn load_session(
        &mut self,
        id: &VoteSessionId,
        lock: RowLock,
    ) -> Result<Option<VoteSession>, DomainError> {
        let sql = format!(
            "SELECT {} FROM vote_sessions WHERE id = $1{}",
            SESSION_COLUMNS,
            lock_clause(lock)
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error("Failed to fetch vote session"))?;

        row.as_ref().map(row_to_session).transpose()
    }

    async fn expired_active_sessions(
        &mut self,
        now: &Timestamp,
    ) -> Result<Vec<VoteSession>, DomainError> {
        let sql = expired_sessions_sql();
        let rows = sqlx::query(&sql)
            .bind(now.as_datetime())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error("Failed to fetch expired vote sessions"))?;

        rows.iter().map(row_to_session).collect()
    }

    async fn list_sessions(
        &mut self,
        filter: &SessionListFilter,
    ) -> Result<Page<VoteSession>, DomainError> {
        let status = filter.status.map(|s| s.as_str());
        let creator_id = filter.creator_id.map(|u| u.as_i64());

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM vote_sessions
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::bigint IS NULL OR creator_id = $2)
            "#,
        )
        .bind(status)
        .bind(creator_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to count vote sessions"))?;

        let sql = format!(
            "SELECT {} FROM vote_sessions \
             WHERE ($1::text IS NULL OR status = $1) \
               AND ($2::bigint IS NULL OR creator_id = $2) \
             ORDER BY created_at DESC, id DESC \
             OFFSET $3 LIMIT $4",
            SESSION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(status)
            .bind(creator_id)
            .bind(filter.page.offset as i64)
            .bind(filter.page.limit as i64)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error("Failed to list vote sessions"))?;

        Ok(Page {
            items: rows.iter().map(row_to_session).collect::<Result<_, _>>()?,
            total: total as u64,
            offset: filter.page.offset,
            limit: filter.page.limit,
        })
    }
}

#[async_trait]
impl MembershipRepository for PostgresUnitOfWork {
    async fn member_ids(
        &mut self,
        session_id: &VoteSessionId,
    ) -> Result<Vec<RestaurantId>, DomainError> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            "SELECT restaurant_id FROM vote_session_restaurants \
             WHERE session_id = $1 ORDER BY restaurant_id",
        )
        .bind(session_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("Failed to fetch session restaurants"))?;

        Ok(ids.into_iter().map(|(id,)| RestaurantId::new(id)).collect())
    }

    async fn is_member(
        &mut self,
        session_id: &VoteSessionId,
        restaurant_id: &RestaurantId,
    ) -> Result<bool, DomainError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM vote_session_restaurants \
             WHERE session_id = $1 AND restaurant_id = $2)",
        )
        .bind(session_id.as_uuid())
        .bind(restaurant_id.as_i64())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to check session restaurant"))?;

        Ok(exists)
    }

    async fn add_members(
        &mut self,
        session_id: &VoteSessionId,
        restaurant_ids: &[RestaurantId],
    ) -> Result<(), DomainError> {
        let ids: Vec<i64> = restaurant_ids.iter().map(|id| id.as_i64()).collect();
        sqlx::query(
            r#"
            INSERT INTO vote_session_restaurants (session_id, restaurant_id)
            SELECT $1, unnest($2::bigint[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(session_id.as_uuid())
        .bind(ids)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to add session restaurants"))?;

        Ok(())
    }

    async fn remove_members(
        &mut self,
        session_id: &VoteSessionId,
        restaurant_ids: &[RestaurantId],
    ) -> Result<(), DomainError> {
        let ids: Vec<i64> = restaurant_ids.iter().map(|id| id.as_i64()).collect();
        sqlx::query(
            "DELETE FROM vote_session_restaurants \
             WHERE session_id = $1 AND restaurant_id = ANY($2)",
        )
        .bind(session_id.as_uuid())
        .bind(ids)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to remove session restaurants"))?;

        Ok(())
    }
}

#[async_trait]
impl VoteRepository for PostgresUnitOfWork {
    async fn count_votes_by_user(
        &mut self,
        session_id: &VoteSessionId,
        user_id: &UserId,
    ) -> Result<u32, DomainError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM votes WHERE session_id = $1 AND user_id = $2")
                .bind(session_id.as_uuid())
                .bind(user_id.as_i64())
                .fetch_one(&mut *self.tx)
                .await
                .map_err(db_error("Failed to count votes"))?;

        Ok(count as u32)
    }

    async fn insert_vote(&mut self, vote: &VoteRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO votes (
                id, session_id, user_id, restaurant_id, sequence, weight, voted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(vote.id().as_uuid())
        .bind(vote.session_id().as_uuid())
        .bind(vote.user_id().as_i64())
        .bind(vote.restaurant_id().as_i64())
        .bind(int_column("sequence", vote.sequence())?)
        .bind(vote.weight())
        .bind(vote.voted_at().as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                constraint_violation(e)
            } else {
                db_error("Failed to insert vote")(e)
            }
        })?;

        Ok(())
    }

    async fn votes_for_session(
        &mut self,
        session_id: &VoteSessionId,
    ) -> Result<Vec<VoteRecord>, DomainError> {
        let sql = format!(
            "SELECT {} FROM votes WHERE session_id = $1 ORDER BY voted_at, user_id, sequence",
            VOTE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(session_id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error("Failed to fetch votes"))?;

        rows.iter().map(row_to_vote).collect()
    }

    async fn votes_by_user(
        &mut self,
        session_id: &VoteSessionId,
        user_id: &UserId,
    ) -> Result<Vec<VoteRecord>, DomainError> {
        let sql = format!(
            "SELECT {} FROM votes WHERE session_id = $1 AND user_id = $2 ORDER BY sequence",
            VOTE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(session_id.as_uuid())
            .bind(user_id.as_i64())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error("Failed to fetch user votes"))?;

        rows.iter().map(row_to_vote).collect()
    }

    async fn list_votes(
        &mut self,
        session_id: &VoteSessionId,
        page: &PageRequest,
    ) -> Result<Page<VoteRecord>, DomainError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM votes WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error("Failed to count votes"))?;

        let sql = format!(
            "SELECT {} FROM votes WHERE session_id = $1 \
             ORDER BY voted_at, user_id, sequence OFFSET $2 LIMIT $3",
            VOTE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(session_id.as_uuid())
            .bind(page.offset as i64)
            .bind(page.limit as i64)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error("Failed to list votes"))?;

        Ok(Page {
            items: rows.iter().map(row_to_vote).collect::<Result<_, _>>()?,
            total: total as u64,
            offset: page.offset,
            limit: page.limit,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn lock_clause(lock: RowLock) -> &'static str {
    match lock {
        RowLock::None => "",
        RowLock::Share => " FOR SHARE",
        RowLock::Update => " FOR UPDATE",
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

/// Expired Active sessions, locked in id order so concurrent sweeps can't deadlock.
fn expired_sessions_sql() -> String {
    format!(
        "SELECT {} FROM vote_sessions \
         WHERE status = 'active' AND auto_close_at IS NOT NULL AND auto_close_at <= $1 \
         ORDER BY id \
         FOR UPDATE",
        SESSION_COLUMNS
    )
}

/// Value for an `INTEGER` column.
fn int_column(name: &'static str, value: u32) -> Result<i32, DomainError> {
    i32::try_from(value).map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("{} out of range for storage: {}", name, value),
        )
    })
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn constraint_violation(e: sqlx::Error) -> DomainError {
    tracing::warn!("Unique constraint rejected write: {}", e);
    DomainError::new(
        ErrorCode::ConstraintViolation,
        "Vote slot already taken by a concurrent request",
    )
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name).map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Failed to get {}: {}", name, e),
        )
    })
}

fn str_to_status(s: &str) -> Result<VoteSessionStatus, DomainError> {
    s.parse().map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid vote session status: {}", s),
        )
    })
}

fn stored_user_id(raw: i64) -> Result<UserId, DomainError> {
    UserId::new(raw).map_err(|e| {
        DomainError::new(ErrorCode::DatabaseError, format!("Invalid user id: {}", e))
    })
}

fn row_to_session(row: &PgRow) -> Result<VoteSession, DomainError> {
    type Ts = chrono::DateTime<chrono::Utc>;

    let status: String = column(row, "status")?;
    let votes_per_user: i32 = column(row, "votes_per_user")?;
    let auto_close_at: Option<Ts> = column(row, "auto_close_at")?;
    let created_at: Ts = column(row, "created_at")?;
    let started_at: Option<Ts> = column(row, "started_at")?;
    let ended_at: Option<Ts> = column(row, "ended_at")?;
    let updated_at: Ts = column(row, "updated_at")?;

    Ok(VoteSession::reconstitute(
        VoteSessionId::from_uuid(column(row, "id")?),
        column(row, "title")?,
        column(row, "description")?,
        str_to_status(&status)?,
        stored_user_id(column(row, "creator_id")?)?,
        votes_per_user.max(0) as u32,
        auto_close_at.map(Timestamp::from_datetime),
        Timestamp::from_datetime(created_at),
        started_at.map(Timestamp::from_datetime),
        ended_at.map(Timestamp::from_datetime),
        Timestamp::from_datetime(updated_at),
    ))
}

fn row_to_vote(row: &PgRow) -> Result<VoteRecord, DomainError> {
    let sequence: i32 = column(row, "sequence")?;
    let voted_at: chrono::DateTime<chrono::Utc> = column(row, "voted_at")?;

    Ok(VoteRecord::reconstitute(
        VoteId::from_uuid(column(row, "id")?),
        VoteSessionId::from_uuid(column(row, "session_id")?),
        stored_user_id(column(row, "user_id")?)?,
        RestaurantId::new(column(row, "restaurant_id")?),
        sequence.max(0) as u32,
        column(row, "weight")?,
        Timestamp::from_datetime(voted_at),
    ))
}
