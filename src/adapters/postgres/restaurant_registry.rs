//! PostgreSQL implementation of RestaurantRegistry.
//!
//! Reads the catalog's `restaurants` table. Soft-deleted rows carry
//! `is_active = false` and are still returned.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, RestaurantId};
use crate::domain::voting::RestaurantRef;
use crate::ports::RestaurantRegistry;

#[derive(Clone)]
pub struct PostgresRestaurantRegistry {
    pool: PgPool,
}

impl PostgresRestaurantRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RestaurantRegistry for PostgresRestaurantRegistry {
    async fn exists(&self, id: &RestaurantId) -> Result<bool, DomainError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM restaurants WHERE id = $1)")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to check restaurant existence: {}", e),
                    )
                })?;

        Ok(exists)
    }

    async fn get(&self, id: &RestaurantId) -> Result<Option<RestaurantRef>, DomainError> {
        let row: Option<(i64, String, bool)> =
            sqlx::query_as("SELECT id, name, is_active FROM restaurants WHERE id = $1")
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to fetch restaurant: {}", e),
                    )
                })?;

        Ok(row.map(to_ref))
    }

    async fn get_many(
        &self,
        ids: &[RestaurantId],
    ) -> Result<HashMap<RestaurantId, RestaurantRef>, DomainError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let raw: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        let rows: Vec<(i64, String, bool)> =
            sqlx::query_as("SELECT id, name, is_active FROM restaurants WHERE id = ANY($1)")
                .bind(raw)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to fetch restaurants: {}", e),
                    )
                })?;

        Ok(rows
            .into_iter()
            .map(to_ref)
            .map(|r| (r.id, r))
            .collect())
    }
}

fn to_ref((id, name, is_active): (i64, String, bool)) -> RestaurantRef {
    RestaurantRef::new(RestaurantId::new(id), name, is_active)
}
