use anyhow::Result;
use chrono::{TimeZone, Utc};
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use std::env;
use std::sync::Arc;

use business_registry::{
    models::audit_log::{AuditAction, AuditLog, AuditLogFilters, AUDIT_LOG_TABLE},
    repositories::{BaseRepository, TableRepository},
    services::AuditLogService,
    store::PgStore,
};

// Test helpers

/// Connects to `DATABASE_URL` with every session in a non-UTC time zone and
/// its search path pointing at a fresh schema. `None` when no database is
/// configured.
async fn setup_test_db() -> Result<Option<(PgPool, PgPool, String)>> {
    let Ok(database_url) = env::var("DATABASE_URL") else {
        eprintln!("SKIP: DATABASE_URL not set, skipping Postgres store test");
        return Ok(None);
    };

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;
    let schema = format!("test_{}", uuid::Uuid::new_v4().simple());
    admin
        .execute(format!("CREATE SCHEMA {schema}").as_str())
        .await?;

    let session_schema = schema.clone();
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .after_connect(move |conn, _meta| {
            let schema = session_schema.clone();
            Box::pin(async move {
                conn.execute(
                    format!("SET TIME ZONE 'Asia/Jerusalem'; SET search_path TO {schema}").as_str(),
                )
                .await?;
                Ok(())
            })
        })
        .connect(&database_url)
        .await?;

    pool.execute(
        "CREATE TABLE audit_logs (
            id text PRIMARY KEY,
            user_email text NOT NULL,
            timestamp timestamptz NOT NULL,
            action text NOT NULL,
            function_name text NOT NULL,
            target_user_email text
        )",
    )
    .await?;

    Ok(Some((admin, pool, schema)))
}

async fn teardown_test_db(admin: &PgPool, schema: &str) -> Result<()> {
    admin
        .execute(format!("DROP SCHEMA {schema} CASCADE").as_str())
        .await?;
    Ok(())
}

fn log_at(id: &str, timestamp: chrono::DateTime<Utc>) -> AuditLog {
    AuditLog {
        id: Some(id.to_string()),
        user_email: "admin@example.com".into(),
        timestamp,
        action: AuditAction::Post,
        function_name: "postCustomer".into(),
        target_user_email: None,
    }
}

#[tokio::test]
async fn test_timestamp_bounds_compare_by_value() -> Result<()> {
    let Some((admin, pool, schema)) = setup_test_db().await? else {
        return Ok(());
    };
    let store = Arc::new(PgStore::new(pool));
    let logs: TableRepository<AuditLog> = TableRepository::new(store.clone(), AUDIT_LOG_TABLE);

    let new_year = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mid_month = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
    logs.post(&log_at("a", new_year)).await?;
    logs.post(&log_at("b", mid_month)).await?;

    let service = AuditLogService::with_store(store);

    // a row stamped exactly at the start bound is included
    let from_start = service
        .get_audit_logs(&AuditLogFilters {
            start_date: Some(new_year),
            ..AuditLogFilters::default()
        })
        .await?;
    let ids: Vec<_> = from_start.iter().filter_map(|log| log.id.clone()).collect();
    assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
    assert_eq!(from_start[1].timestamp, new_year);

    // bounds hold regardless of the session time zone
    let until = service
        .get_audit_logs(&AuditLogFilters {
            end_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap()),
            ..AuditLogFilters::default()
        })
        .await?;
    assert_eq!(until.len(), 1);
    assert_eq!(until[0].id.as_deref(), Some("a"));

    let found = logs.get_by_id("a").await?;
    assert_eq!(found.timestamp, new_year);
    logs.delete("a").await?;
    assert!(logs.get_by_id("a").await.unwrap_err().is_not_found());

    teardown_test_db(&admin, &schema).await
}
