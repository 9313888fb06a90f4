//! User database operations
//!
//! Registration and lookup only. Authentication, sessions and credential
//! storage belong to the fronting deployment, not this service.

use booklib_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// User record
#[derive(Debug, Clone)]
pub struct User {
    pub guid: Uuid,
    pub username: String,
    pub email: String,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
        }
    }
}

/// Insert a new user
///
/// Username and email are unique; a violation surfaces as a database
/// error the API layer maps to a conflict.
pub async fn insert_user(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (guid, username, email, created_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(user.guid.to_string())
    .bind(&user.username)
    .bind(&user.email)
    .execute(pool)
    .await?;

    Ok(())
}

/// Check whether a username or email is already registered
pub async fn username_or_email_exists(
    pool: &SqlitePool,
    username: &str,
    email: &str,
) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE username = ? OR email = ?")
        .bind(username)
        .bind(email)
        .fetch_one(pool)
        .await?;

    let count: i64 = row.get("n");
    Ok(count > 0)
}

/// Load user by guid
pub async fn load_user(pool: &SqlitePool, guid: Uuid) -> Result<Option<User>> {
    let row = sqlx::query("SELECT guid, username, email FROM users WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            Ok(Some(User {
                guid: super::parse_guid(&guid_str)?,
                username: row.get("username"),
                email: row.get("email"),
            }))
        }
        None => Ok(None),
    }
}

/// List all users ordered by username
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query("SELECT guid, username, email FROM users ORDER BY username")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            let guid_str: String = row.get("guid");
            Ok(User {
                guid: super::parse_guid(&guid_str)?,
                username: row.get("username"),
                email: row.get("email"),
            })
        })
        .collect()
}

/// Delete a user along with their comments and ratings
///
/// Returns false if no such user exists.
pub async fn delete_user(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let mut tx = pool.begin().await?;
    let guid_str = guid.to_string();

    sqlx::query("DELETE FROM comments WHERE user_id = ?")
        .bind(&guid_str)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM ratings WHERE user_id = ?")
        .bind(&guid_str)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM users WHERE guid = ?")
        .bind(&guid_str)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_load_user() {
        let pool = crate::db::test_pool().await;

        let user = User::new("reader1", "reader1@example.com");
        insert_user(&pool, &user).await.expect("insert");

        let loaded = load_user(&pool, user.guid)
            .await
            .expect("load")
            .expect("user not found");
        assert_eq!(loaded.username, "reader1");
        assert_eq!(loaded.email, "reader1@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_username_detected() {
        let pool = crate::db::test_pool().await;

        let user = User::new("reader1", "reader1@example.com");
        insert_user(&pool, &user).await.expect("insert");

        assert!(
            username_or_email_exists(&pool, "reader1", "other@example.com")
                .await
                .expect("check")
        );
        assert!(
            !username_or_email_exists(&pool, "reader2", "reader2@example.com")
                .await
                .expect("check")
        );
    }
}
