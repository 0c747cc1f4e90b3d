// src/repository.rs
use crate::error::{StorageError, StorageResult};
use crate::models::{Mail, Message, Subscriber, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};
use std::marker::PhantomData;

pub type BoundQuery<'q, E> = QueryAs<'q, Postgres, E, PgArguments>;

/// Field mapping between an in-memory record and its table.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;
    /// Human-readable name used in logs and client messages.
    const LABEL: &'static str;
    /// Every column except `id`, in the order `bind_columns` binds them.
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> i32;

    /// Assigns the store-generated id. Postgres returns it in the row itself;
    /// stores without `RETURNING`, such as in-memory implementations, set it here.
    fn set_id(&mut self, id: i32);

    fn bind_columns<'q>(&'q self, query: BoundQuery<'q, Self>) -> BoundQuery<'q, Self>;

    /// Runs before every insert and update.
    fn stamp(&mut self) {}
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const LABEL: &'static str = "User";
    const COLUMNS: &'static [&'static str] =
        &["first_name", "last_name", "login", "email", "password"];

    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    fn bind_columns<'q>(&'q self, query: BoundQuery<'q, Self>) -> BoundQuery<'q, Self> {
        query
            .bind(&self.first_name)
            .bind(&self.last_name)
            .bind(&self.login)
            .bind(&self.email)
            .bind(&self.password)
    }
}

impl Entity for Subscriber {
    const TABLE: &'static str = "subscribers";
    const LABEL: &'static str = "Subscriber";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "status_subscription",
        "number_subscriptions",
        "subscription_time",
        "subscriptions_in_row",
        "subscription_level",
    ];

    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    fn bind_columns<'q>(&'q self, query: BoundQuery<'q, Self>) -> BoundQuery<'q, Self> {
        query
            .bind(self.user_id)
            .bind(&self.status_subscription)
            .bind(self.number_subscriptions)
            .bind(self.subscription_time)
            .bind(self.subscriptions_in_row)
            .bind(&self.subscription_level)
    }
}

impl Entity for Message {
    const TABLE: &'static str = "messages";
    const LABEL: &'static str = "Message";
    const COLUMNS: &'static [&'static str] = &["message"];

    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    fn bind_columns<'q>(&'q self, query: BoundQuery<'q, Self>) -> BoundQuery<'q, Self> {
        query.bind(&self.message)
    }
}

impl Entity for Mail {
    const TABLE: &'static str = "mails";
    const LABEL: &'static str = "Mail";
    const COLUMNS: &'static [&'static str] =
        &["to_list", "subject", "body", "content_type", "sent_at"];

    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    fn bind_columns<'q>(&'q self, query: BoundQuery<'q, Self>) -> BoundQuery<'q, Self> {
        query
            .bind(&self.to)
            .bind(&self.subject)
            .bind(&self.body)
            .bind(&self.content_type)
            .bind(self.sent_at)
    }

    // No transport exists, so the write time is the closest thing to a send time.
    fn stamp(&mut self) {
        self.sent_at = Utc::now();
    }
}

#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// `Ok(None)` when no row has this id.
    async fn get(&self, id: i32) -> StorageResult<Option<E>>;

    async fn get_all(&self) -> StorageResult<Vec<E>>;

    /// Inserts every column but `id` and returns the row as stored.
    async fn create(&self, entity: E) -> StorageResult<E>;

    /// Replaces every mutable column of the row at `id`.
    async fn update(&self, id: i32, entity: E) -> StorageResult<E>;

    async fn delete(&self, id: i32) -> StorageResult<()>;
}

/// Leveling operations that only exist for subscribers.
#[async_trait]
pub trait SubscriberRepository: Repository<Subscriber> {
    /// Exact match on `subscription_level`; empty when nobody has that level.
    async fn get_by_level(&self, level: &str) -> StorageResult<Vec<Subscriber>>;

    /// Touches `subscription_level` only.
    async fn update_level(&self, id: i32, level: &str) -> StorageResult<Subscriber>;
}

/// SQL text derived once from an entity's field mapping.
#[derive(Debug, Clone)]
pub struct Statements {
    pub projection: String,
    pub select_one: String,
    pub select_all: String,
    pub insert: String,
    pub update: String,
    pub delete: String,
}

impl Statements {
    pub fn for_entity<E: Entity>() -> Self {
        Self::new(E::TABLE, E::COLUMNS)
    }

    fn new(table: &str, columns: &[&str]) -> Self {
        let projection = std::iter::once("id")
            .chain(columns.iter().copied())
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|n| format!("${}", n))
            .collect::<Vec<_>>()
            .join(", ");
        let assignments = columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ${}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let id_param = columns.len() + 1;

        Self {
            select_one: format!("SELECT {} FROM {} WHERE id = $1", projection, table),
            select_all: format!("SELECT {} FROM {} ORDER BY id", projection, table),
            insert: format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                table,
                columns.join(", "),
                placeholders,
                projection
            ),
            update: format!(
                "UPDATE {} SET {} WHERE id = ${} RETURNING {}",
                table, assignments, id_param, projection
            ),
            delete: format!("DELETE FROM {} WHERE id = $1", table),
            projection,
        }
    }
}

/// Postgres-backed repository, one instance per entity, all sharing one pool.
pub struct PgRepository<E> {
    pool: PgPool,
    statements: Statements,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> PgRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statements: Statements::for_entity::<E>(),
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for PgRepository<E> {
    async fn get(&self, id: i32) -> StorageResult<Option<E>> {
        sqlx::query_as::<_, E>(&self.statements.select_one)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| StorageError::Query {
                entity: E::TABLE,
                source,
            })
    }

    async fn get_all(&self) -> StorageResult<Vec<E>> {
        sqlx::query_as::<_, E>(&self.statements.select_all)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| StorageError::Query {
                entity: E::TABLE,
                source,
            })
    }

    async fn create(&self, mut entity: E) -> StorageResult<E> {
        entity.stamp();
        let created = entity
            .bind_columns(sqlx::query_as::<_, E>(&self.statements.insert))
            .fetch_one(&self.pool)
            .await
            .map_err(|source| StorageError::Insert {
                entity: E::TABLE,
                source,
            })?;
        tracing::debug!(table = E::TABLE, id = created.id(), "row inserted");
        Ok(created)
    }

    async fn update(&self, id: i32, mut entity: E) -> StorageResult<E> {
        entity.stamp();
        entity
            .bind_columns(sqlx::query_as::<_, E>(&self.statements.update))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| StorageError::Update {
                entity: E::TABLE,
                source,
            })?
            .ok_or(StorageError::NotFound {
                entity: E::TABLE,
                id,
            })
    }

    async fn delete(&self, id: i32) -> StorageResult<()> {
        let result = sqlx::query(&self.statements.delete)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|source| StorageError::Delete {
                entity: E::TABLE,
                source,
            })?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound {
                entity: E::TABLE,
                id,
            });
        }
        tracing::debug!(table = E::TABLE, id, "row deleted");
        Ok(())
    }
}

#[async_trait]
impl SubscriberRepository for PgRepository<Subscriber> {
    async fn get_by_level(&self, level: &str) -> StorageResult<Vec<Subscriber>> {
        let query = format!(
            "SELECT {} FROM subscribers WHERE subscription_level = $1 ORDER BY id",
            self.statements.projection
        );
        sqlx::query_as::<_, Subscriber>(&query)
            .bind(level)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| StorageError::Query {
                entity: Subscriber::TABLE,
                source,
            })
    }

    async fn update_level(&self, id: i32, level: &str) -> StorageResult<Subscriber> {
        let query = format!(
            "UPDATE subscribers SET subscription_level = $1 WHERE id = $2 RETURNING {}",
            self.statements.projection
        );
        sqlx::query_as::<_, Subscriber>(&query)
            .bind(level)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| StorageError::Update {
                entity: Subscriber::TABLE,
                source,
            })?
            .ok_or(StorageError::NotFound {
                entity: Subscriber::TABLE,
                id,
            })
    }
}
