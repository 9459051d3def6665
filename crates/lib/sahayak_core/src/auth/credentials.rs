//! Credential store: user identity records keyed by normalized email.
//!
//! `create` must enforce email uniqueness atomically. The Postgres store
//! relies on the `users.email` unique constraint; the in-memory store on the
//! per-key entry lock of its map.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sqlx::PgPool;
use uuid::Uuid;

use super::StoreError;
use crate::models::auth::{NewUser, STUDENT, User};

/// Read/create access to user records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Look up a user by ID.
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Whether a normalized email is already registered.
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// Insert a user. Fails with [`StoreError::Conflict`] if the email exists.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
}

/// Credential store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: DashMap<String, User>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(email).map(|u| u.value().clone()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.value().id == id)
            .map(|u| u.value().clone()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.users.contains_key(email))
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                let created = User {
                    id: Uuid::now_v7().to_string(),
                    name: user.name,
                    email: user.email,
                    password_hash: user.password_hash,
                    user_type: STUDENT.to_string(),
                    created_at: Utc::now(),
                };
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }
}

type UserRow = (String, String, String, String, String, DateTime<Utc>);

fn user_from_row((id, name, email, password_hash, user_type, created_at): UserRow) -> User {
    User {
        id,
        name,
        email,
        password_hash,
        user_type,
        created_at,
    }
}

/// Credential store backed by the `users` table.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id::text, name, email, password_hash, user_type, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        // Not a UUID means no such user, not a store failure.
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id::text, name, email, password_hash, user_type, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let id = Uuid::now_v7();
        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "INSERT INTO users (id, name, email, password_hash, user_type) \
             VALUES ($1, $2, $3, $4, $5) RETURNING created_at",
        )
        .bind(id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(STUDENT)
        .fetch_one(&self.pool)
        .await?;
        Ok(User {
            id: id.to_string(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            user_type: STUDENT.to_string(),
            created_at,
        })
    }
}
