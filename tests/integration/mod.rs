//! Integration tests for sqlchat.

pub mod agent_test;
pub mod headless_test;
pub mod mysql_test;
pub mod session_test;
pub mod sqlite_test;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::{Path, PathBuf};

/// Creates `shop.db` under `dir` with a small orders table.
pub async fn create_shop_db(dir: &Path) -> PathBuf {
    let path = dir.join("shop.db");
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();

    sqlx::raw_sql(
        r#"
        CREATE TABLE customers (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );
        CREATE TABLE orders (
            id INTEGER PRIMARY KEY,
            customer_id INTEGER NOT NULL REFERENCES customers(id),
            total REAL NOT NULL
        );
        INSERT INTO customers (id, name) VALUES (1, 'Ada'), (2, 'Grace');
        INSERT INTO orders (id, customer_id, total) VALUES (1, 1, 9.5), (2, 1, 20.0), (3, 2, 4.25);
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    pool.close().await;
    path
}
