use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::{Connection, Executor, MySqlConnection};
use std::time::Duration;

use super::RouteStore;
use crate::config::DatabaseConfig;
use crate::error::{Result, RouterError};
use crate::route::{Route, RouteType};

pub const SCHEMA_NAME: &str = "event_router_mapping";
pub const TABLE_NAME: &str = "route_mapping";

const INIT_SQL: &str = include_str!("../../init.sql");

const LIST_STATEMENT: &str = "SELECT identifier, routeType AS route_type, postURL AS post_url, description \
     FROM route_mapping ORDER BY identifier, routeType";
const GET_STATEMENT: &str = "SELECT identifier, routeType AS route_type, postURL AS post_url, description \
     FROM route_mapping WHERE identifier = ? AND routeType = ?";
const INSERT_STATEMENT: &str =
    "INSERT INTO route_mapping (identifier, routeType, postURL, description) VALUES (?, ?, ?, ?)";
const DELETE_STATEMENT: &str = "DELETE FROM route_mapping WHERE identifier = ? AND routeType = ?";

#[derive(Debug, sqlx::FromRow)]
struct RouteRow {
    identifier: String,
    route_type: String,
    post_url: String,
    description: Option<String>,
}

impl RouteRow {
    fn into_route(self) -> Result<Route> {
        let route_type = self.route_type.parse::<RouteType>().map_err(|_| {
            RouterError::IntegrityError(format!(
                "stored route {} has unknown type {:?}",
                self.identifier, self.route_type
            ))
        })?;
        Ok(Route::new(self.identifier, route_type, self.post_url, self.description))
    }
}

/// Route store persisted in the `event_router_mapping.route_mapping` table.
pub struct MySqlRouteStore {
    pool: MySqlPool,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new().host(&self.host).port(self.port);
        if let Some(username) = &self.username {
            options = options.username(username);
            if let Some(password) = &self.password {
                options = options.password(password);
            }
        }
        options
    }

    /// Connection target for log lines, without the password.
    pub fn display_target(&self) -> String {
        let user = self
            .username
            .as_deref()
            .map(|u| format!("{}@", u))
            .unwrap_or_default();
        format!("mysql://{}{}:{}/{}", user, self.host, self.port, SCHEMA_NAME)
    }
}

impl MySqlRouteStore {
    /// Connects, provisions the schema if needed and prepares the route
    /// statements. Any failure here should stop the process.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        log::info!("🔧 Connecting to route store at {}", config.display_target());

        ensure_schema(config).await?;

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(config.connect_options().database(SCHEMA_NAME))
            .await
            .map_err(RouterError::StoreUnavailable)?;

        let store = Self { pool };
        store.prepare_statements().await?;

        log::info!("✅ Route store ready");
        Ok(store)
    }

    // sqlx caches prepared statements per connection; preparing them here
    // surfaces SQL errors at startup instead of on the first request.
    async fn prepare_statements(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(RouterError::StoreUnavailable)?;
        for statement in [LIST_STATEMENT, GET_STATEMENT, INSERT_STATEMENT, DELETE_STATEMENT] {
            (&mut *conn)
                .prepare(statement)
                .await
                .map_err(RouterError::StoreUnavailable)?;
        }
        Ok(())
    }

    pub async fn test_connection(&self) -> Result<bool> {
        let value: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(RouterError::StoreUnavailable)?;
        Ok(value == 1)
    }
}

async fn ensure_schema(config: &DatabaseConfig) -> Result<()> {
    let mut conn = MySqlConnection::connect_with(&config.connect_options())
        .await
        .map_err(RouterError::StoreUnavailable)?;

    let result = provision(&mut conn).await;
    if let Err(e) = conn.close().await {
        log::warn!("Failed to close schema bootstrap connection: {}", e);
    }
    result
}

async fn provision(conn: &mut MySqlConnection) -> Result<()> {
    conn.ping().await.map_err(RouterError::StoreUnavailable)?;

    let table_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
    )
    .bind(SCHEMA_NAME)
    .bind(TABLE_NAME)
    .fetch_one(&mut *conn)
    .await
    .map_err(RouterError::StoreUnavailable)?;

    if table_count > 0 {
        log::info!("✅ Route mapping table already exists, skipping initialization");
        return Ok(());
    }

    log::info!("Creating {} schema and {} table", SCHEMA_NAME, TABLE_NAME);
    for statement in sql_statements(INIT_SQL) {
        log::debug!("Executing SQL: {}", statement);
        // Plain text protocol, DDL does not need a prepared statement.
        (&mut *conn)
            .execute(statement.as_str())
            .await
            .map_err(RouterError::StoreUnavailable)?;
    }
    Ok(())
}

// Splits a script into statements, dropping `--` comment lines.
fn sql_statements(script: &str) -> Vec<String> {
    let uncommented: String = script
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    uncommented
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl RouteStore for MySqlRouteStore {
    async fn list(&self) -> Result<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(LIST_STATEMENT)
            .fetch_all(&self.pool)
            .await
            .map_err(RouterError::StoreUnavailable)?;

        rows.into_iter().map(RouteRow::into_route).collect()
    }

    async fn get(&self, identifier: &str, route_type: RouteType) -> Result<Route> {
        let row = sqlx::query_as::<_, RouteRow>(GET_STATEMENT)
            .bind(identifier)
            .bind(route_type.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(RouterError::StoreUnavailable)?;

        match row {
            Some(row) => row.into_route(),
            None => Err(RouterError::not_found(identifier, route_type)),
        }
    }

    async fn create(&self, route: &Route) -> Result<()> {
        let result = sqlx::query(INSERT_STATEMENT)
            .bind(&route.identifier)
            .bind(route.route_type.as_str())
            .bind(&route.post_url)
            .bind(&route.description)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => Ok(()),
            Ok(done) => Err(RouterError::IntegrityError(format!(
                "insert of {} route {} affected {} rows, expected 1",
                route.route_type,
                route.identifier,
                done.rows_affected()
            ))),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(RouterError::Conflict {
                identifier: route.identifier.clone(),
                route_type: route.route_type,
            }),
            Err(e) => Err(RouterError::StoreUnavailable(e)),
        }
    }

    async fn delete(&self, identifier: &str, route_type: RouteType) -> Result<()> {
        let done = sqlx::query(DELETE_STATEMENT)
            .bind(identifier)
            .bind(route_type.as_str())
            .execute(&self.pool)
            .await
            .map_err(RouterError::StoreUnavailable)?;

        if done.rows_affected() != 1 {
            return Err(RouterError::not_found(identifier, route_type));
        }
        Ok(())
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            log::info!("Closing route store connections");
            self.pool.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_script_statements() {
        let statements = sql_statements(INIT_SQL);

        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE DATABASE IF NOT EXISTS event_router_mapping"));
        assert!(statements[1].starts_with("CREATE TABLE IF NOT EXISTS event_router_mapping.route_mapping"));
        assert!(statements[1].contains("PRIMARY KEY (identifier, routeType)"));
    }

    #[test]
    fn test_display_target_hides_password() {
        let config = DatabaseConfig::default();
        assert_eq!(
            config.display_target(),
            "mysql://mapper@localhost:3306/event_router_mapping"
        );

        let anonymous = DatabaseConfig {
            username: None,
            password: None,
            ..DatabaseConfig::default()
        };
        assert_eq!(anonymous.display_target(), "mysql://localhost:3306/event_router_mapping");
    }

    #[test]
    fn test_row_with_unknown_type_is_integrity_error() {
        let row = RouteRow {
            identifier: "platform".to_string(),
            route_type: "slack".to_string(),
            post_url: "https://example.com".to_string(),
            description: None,
        };
        assert!(matches!(row.into_route(), Err(RouterError::IntegrityError(_))));
    }

    #[test]
    fn test_row_without_description() {
        let row = RouteRow {
            identifier: "platform".to_string(),
            route_type: "pagerduty".to_string(),
            post_url: "KEY".to_string(),
            description: None,
        };
        let route = row.into_route().unwrap();
        assert_eq!(route.route_type, RouteType::PagerDuty);
        assert_eq!(route.description, "platform");
    }
}
