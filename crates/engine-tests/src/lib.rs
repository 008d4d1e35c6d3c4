#![allow(dead_code)]

use connectors::sql::postgres::{store::PgStore, utils::connect_client};
use engine_core::sink::LoadTarget;
use model::core::{
    column::{Column, ColumnType},
    identifiers::TableRef,
};
use tokio_postgres::Client;


/// Connection string of the scratch database the end-to-end tests write to.
pub const TEST_PG_URL_ENV: &str = "STRATUM_SINK_TEST_PG_URL";

fn test_pg_url() -> String {
    std::env::var(TEST_PG_URL_ENV)
        .unwrap_or_else(|_| panic!("{TEST_PG_URL_ENV} must point at a scratch database"))
}

async fn admin_client() -> Client {
    connect_client(&test_pg_url())
        .await
        .expect("connect postgres")
}

async fn store() -> PgStore {
    PgStore::connect(&test_pg_url())
        .await
        .expect("connect postgres store")
}

/// Drops and recreates `schema` so every scenario starts empty.
async fn reset_schema(client: &Client, schema: &str) {
    client
        .batch_execute(&format!(
            r#"DROP SCHEMA IF EXISTS "{schema}" CASCADE; CREATE SCHEMA "{schema}";"#
        ))
        .await
        .expect("reset schema");
}

/// `(id BIGINT, region TEXT)` table addressed as `schema.orders`.
fn orders_target(schema: &str) -> LoadTarget {
    LoadTarget::new(
        TableRef::new(schema, "orders"),
        vec![
            Column::new("id", ColumnType::BigInt),
            Column::new("region", ColumnType::Text),
        ],
        "id",
    )
}

async fn create_orders(client: &Client, schema: &str, rows: &[(i64, &str)]) {
    client
        .batch_execute(&format!(
            r#"CREATE TABLE "{schema}"."orders" (id BIGINT, region TEXT)"#
        ))
        .await
        .expect("create orders");

    for (id, region) in rows {
        client
            .execute(
                &format!(r#"INSERT INTO "{schema}"."orders" (id, region) VALUES ($1, $2)"#),
                &[id, region],
            )
            .await
            .expect("insert order");
    }
}

async fn order_ids(client: &Client, schema: &str) -> Vec<i64> {
    client
        .query(
            &format!(r#"SELECT id FROM "{schema}"."orders" ORDER BY id"#),
            &[],
        )
        .await
        .expect("select orders")
        .iter()
        .map(|row| row.get::<_, i64>(0))
        .collect()
}

/// Staging tables left in `schema` or in any session's temporary schema.
async fn staging_tables(client: &Client, schema: &str) -> i64 {
    client
        .query_one(
            "SELECT COUNT(*) FROM pg_class c JOIN pg_namespace n ON n.oid = c.relnamespace \
             WHERE c.relkind = 'r' AND c.relname LIKE '\\_\\_stratum\\_stage\\_%' \
             AND (n.nspname = $1 OR c.relpersistence = 't')",
            &[&schema],
        )
        .await
        .expect("count staging tables")
        .get(0)
}
