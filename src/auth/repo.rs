use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    // TODO: store an argon2 hash instead of the verbatim credential
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: OffsetDateTime,
}

/// Projected user fields (id, email, name) for listings and join-style
/// enrichment; never carries the credential.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserRef {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl User {
    /// Find a user by exact email match. Case-sensitive on purpose.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user.
    pub async fn create(
        db: &PgPool,
        email: &str,
        name: &str,
        password: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, password, created_at
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(password)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// All users, projected fields only. Feeds the member picker.
    pub async fn list_refs(db: &PgPool) -> anyhow::Result<Vec<UserRef>> {
        let users = sqlx::query_as::<_, UserRef>(
            r#"
            SELECT id, email, name
            FROM users
            ORDER BY name, email
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Projected lookup of a set of users, for enriching project views.
    pub async fn find_refs(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<UserRef>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = sqlx::query_as::<_, UserRef>(
            r#"
            SELECT id, email, name
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(db)
        .await?;
        Ok(users)
    }
}
