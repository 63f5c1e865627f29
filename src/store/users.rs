//! Credential store

use serde::Serialize;

use super::Database;
use crate::auth::models::{Role, User};
use crate::error::{Error, Result};

/// User listing row for the CLI
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub predictions: i64,
}

impl Database {
    /// Insert a new user. Username matching is exact and case-sensitive.
    pub async fn create_user(&self, username: &str, hashed_password: &str, role: Role) -> Result<User> {
        if self.find_user_by_username(username).await?.is_some() {
            return Err(Error::UserAlreadyExists(username.to_string()));
        }

        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, hashed_password, role) VALUES (?, ?, ?) \
             RETURNING id, username, hashed_password, role",
        )
        .bind(username)
        .bind(hashed_password)
        .bind(role.as_str())
        .fetch_one(self.pool())
        .await;

        match result {
            Ok(user) => {
                tracing::info!("Registered user '{}' as {}", user.username, user.role);
                Ok(user)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(Error::UserAlreadyExists(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, hashed_password, role FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    pub async fn update_password(&self, user_id: i64, hashed_password: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET hashed_password = ? WHERE id = ?")
            .bind(hashed_password)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::UserNotFound(user_id.to_string()));
        }
        Ok(())
    }

    /// Delete a user and everything they own. Predictions go first so no row
    /// is ever left pointing at a missing user; both deletes share one
    /// transaction that rolls back if either fails.
    pub async fn delete_user(&self, user_id: i64) -> Result<u64> {
        let mut tx = self.pool().begin().await?;

        let removed = sqlx::query("DELETE FROM predictions WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(Error::UserNotFound(user_id.to_string()));
        }

        tx.commit().await?;
        tracing::info!("Deleted user {} and {} prediction(s)", user_id, removed);
        Ok(removed)
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.username, u.role, COUNT(p.id) AS predictions \
             FROM users u LEFT JOIN predictions p ON p.user_id = u.id \
             GROUP BY u.id ORDER BY u.username",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(users)
    }
}
