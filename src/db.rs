// src/db.rs
use crate::config::Config;
use crate::error::ConnectionError;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgPool};
use std::time::Duration;

const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// One table and the idempotent statements that bring it up to date.
struct TableSchema {
    table: &'static str,
    statements: &'static [&'static str],
    /// Columns that older deployments declared nullable or with another type.
    legacy: &'static [LegacyColumn],
}

/// A column as this crate reads it, plus what to do when the live table disagrees.
struct LegacyColumn {
    column: &'static str,
    /// SQL expression written into rows where the column is NULL.
    backfill: &'static str,
    retype: Option<Retype>,
}

/// Converts a column whose `information_schema` data type is `from`.
struct Retype {
    from: &'static str,
    to: &'static str,
    using: &'static str,
}

const SCHEMA: &[TableSchema] = &[
    TableSchema {
        table: "users",
        statements: &[r#"
            CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                first_name VARCHAR(255),
                last_name VARCHAR(255),
                login VARCHAR(255) NOT NULL UNIQUE,
                email VARCHAR(255),
                password VARCHAR(255)
            )"#],
        legacy: &[],
    },
    TableSchema {
        table: "subscribers",
        statements: &[
            r#"
            CREATE TABLE IF NOT EXISTS subscribers (
                id SERIAL PRIMARY KEY,
                user_id INT NOT NULL,
                status_subscription VARCHAR(255) NOT NULL DEFAULT '',
                number_subscriptions INT NOT NULL DEFAULT 0,
                subscription_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                subscriptions_in_row INT NOT NULL DEFAULT 0,
                subscription_level TEXT NOT NULL DEFAULT 'bronze'
            )"#,
            // Tables created before leveling existed lack the column.
            r#"
            ALTER TABLE subscribers
                ADD COLUMN IF NOT EXISTS subscription_level TEXT NOT NULL DEFAULT 'bronze'
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS subscribers_subscription_level_idx
                ON subscribers (subscription_level)
            "#,
        ],
        legacy: &[
            LegacyColumn {
                column: "status_subscription",
                backfill: "''",
                retype: None,
            },
            LegacyColumn {
                column: "number_subscriptions",
                backfill: "0",
                retype: None,
            },
            LegacyColumn {
                column: "subscription_time",
                backfill: "NOW()",
                retype: Some(Retype {
                    from: "timestamp without time zone",
                    to: "TIMESTAMPTZ",
                    using: "subscription_time AT TIME ZONE 'UTC'",
                }),
            },
            LegacyColumn {
                column: "subscriptions_in_row",
                backfill: "0",
                retype: None,
            },
            LegacyColumn {
                column: "subscription_level",
                backfill: "'bronze'",
                retype: Some(Retype {
                    from: "character varying",
                    to: "TEXT",
                    using: "subscription_level::TEXT",
                }),
            },
        ],
    },
    TableSchema {
        table: "messages",
        statements: &[r#"
            CREATE TABLE IF NOT EXISTS messages (
                id SERIAL PRIMARY KEY,
                message TEXT NOT NULL
            )"#],
        legacy: &[LegacyColumn {
            column: "message",
            backfill: "''",
            retype: Some(Retype {
                from: "character varying",
                to: "TEXT",
                using: "message::TEXT",
            }),
        }],
    },
    TableSchema {
        table: "mails",
        statements: &[r#"
            CREATE TABLE IF NOT EXISTS mails (
                id SERIAL PRIMARY KEY,
                to_list TEXT[] NOT NULL,
                subject VARCHAR(255) NOT NULL,
                body TEXT NOT NULL,
                content_type VARCHAR(50),
                sent_at TIMESTAMPTZ NOT NULL
            )"#],
        legacy: &[
            LegacyColumn {
                column: "to_list",
                backfill: "'{}'",
                retype: None,
            },
            LegacyColumn {
                column: "sent_at",
                backfill: "NOW()",
                retype: Some(Retype {
                    from: "timestamp without time zone",
                    to: "TIMESTAMPTZ",
                    using: "sent_at AT TIME ZONE 'UTC'",
                }),
            },
        ],
    },
];

/// Opens the pool described by `config`, initializes the schema and pings it.
pub async fn open(config: &Config) -> Result<PgPool, ConnectionError> {
    open_with(config.connect_options()?, config.database_max_connections).await
}

/// Like [`open`], for callers that already hold connection options.
///
/// Schema initialization runs on every call and mutates the database; it is
/// safe to repeat. A pool that fails initialization is closed before the
/// error is returned.
pub async fn open_with(
    options: PgConnectOptions,
    max_connections: u32,
) -> Result<PgPool, ConnectionError> {
    tracing::info!(
        host = options.get_host(),
        port = options.get_port(),
        database = options.get_database().unwrap_or_default(),
        max_connections,
        "Connecting to database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
        .map_err(ConnectionError::Connect)?;

    if let Err(e) = init_schema(&pool).await {
        close(&pool).await;
        return Err(e);
    }

    if let Err(e) = ping(&pool).await {
        close(&pool).await;
        return Err(e);
    }

    tracing::info!("Database connection pool established");
    Ok(pool)
}

/// Creates every table that does not exist yet and heals tables left behind by
/// older deployments: legacy column types are converted and NULLs backfilled so
/// every column decodes into its model field.
pub async fn init_schema(pool: &PgPool) -> Result<(), ConnectionError> {
    for schema in SCHEMA {
        let schema_error = |source| ConnectionError::Schema {
            table: schema.table,
            source,
        };
        for statement in schema.statements {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(schema_error)?;
        }
        for legacy in schema.legacy {
            heal_column(pool, schema.table, legacy)
                .await
                .map_err(schema_error)?;
        }
        tracing::debug!(table = schema.table, "table ready");
    }
    Ok(())
}

async fn heal_column(
    pool: &PgPool,
    table: &str,
    legacy: &LegacyColumn,
) -> Result<(), sqlx::Error> {
    let found: Option<(String, String)> = sqlx::query_as(
        "SELECT data_type::TEXT, is_nullable::TEXT FROM information_schema.columns \
         WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2",
    )
    .bind(table)
    .bind(legacy.column)
    .fetch_optional(pool)
    .await?;
    let Some((data_type, is_nullable)) = found else {
        return Ok(());
    };

    if let Some(retype) = &legacy.retype {
        if data_type == retype.from {
            tracing::info!(
                table,
                column = legacy.column,
                from = %data_type,
                to = retype.to,
                "Converting legacy column"
            );
            sqlx::query(&retype_sql(table, legacy.column, retype))
                .execute(pool)
                .await?;
        }
    }

    if is_nullable == "YES" {
        tracing::info!(
            table,
            column = legacy.column,
            "Backfilling nullable legacy column"
        );
        for statement in not_null_sql(table, legacy) {
            sqlx::query(&statement).execute(pool).await?;
        }
    }
    Ok(())
}

fn retype_sql(table: &str, column: &str, retype: &Retype) -> String {
    format!(
        "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}",
        table, column, retype.to, retype.using
    )
}

fn not_null_sql(table: &str, legacy: &LegacyColumn) -> [String; 2] {
    [
        format!(
            "UPDATE {table} SET {column} = {backfill} WHERE {column} IS NULL",
            table = table,
            column = legacy.column,
            backfill = legacy.backfill
        ),
        format!(
            "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
            table, legacy.column
        ),
    ]
}

/// Liveness check: one round trip on a pooled connection.
pub async fn ping(pool: &PgPool) -> Result<(), ConnectionError> {
    let check = async {
        let mut conn = pool.acquire().await?;
        conn.ping().await?;
        Ok::<(), sqlx::Error>(())
    };

    match tokio::time::timeout(PING_TIMEOUT, check).await {
        Ok(result) => result.map_err(ConnectionError::Ping),
        Err(_) => Err(ConnectionError::Ping(sqlx::Error::PoolTimedOut)),
    }
}

/// Releases the pool. Closing an already closed pool does nothing.
pub async fn close(pool: &PgPool) {
    if pool.is_closed() {
        tracing::debug!("Database pool already closed");
        return;
    }
    tracing::info!("Closing database connection pool");
    pool.close().await;
}
