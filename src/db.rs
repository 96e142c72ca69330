use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::{MySqlPool, mysql::MySqlPoolOptions};
use tracing::info;

use crate::config::Config;

pub async fn init_db(config: &Config) -> Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS employees (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(255) COLLATE utf8mb4_bin NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY uq_employees_name (name)
    ) DEFAULT CHARSET = utf8mb4
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        email VARCHAR(255) NOT NULL,
        password VARCHAR(255) NOT NULL,
        name VARCHAR(255) NOT NULL,
        employee_id BIGINT UNSIGNED NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY uq_users_email (email),
        CONSTRAINT fk_users_employee FOREIGN KEY (employee_id) REFERENCES employees (id)
    ) DEFAULT CHARSET = utf8mb4
    "#,
    // open_flag is 1 while the session is open and NULL once closed; NULLs
    // never collide, so the key allows one open row per employee per day.
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        employee_id BIGINT UNSIGNED NOT NULL,
        employee_name VARCHAR(255) NOT NULL,
        date DATE NOT NULL,
        start_time TIME NOT NULL,
        end_time TIME NULL,
        location VARCHAR(255) COLLATE utf8mb4_bin NOT NULL,
        duration VARCHAR(32) NULL,
        open_flag TINYINT AS (IF(end_time IS NULL, 1, NULL)) STORED,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY uq_attendance_one_open (employee_id, date, open_flag),
        KEY idx_attendance_employee_date (employee_id, date),
        CONSTRAINT fk_attendance_employee FOREIGN KEY (employee_id) REFERENCES employees (id)
    ) DEFAULT CHARSET = utf8mb4
    "#,
];

/// Creates the tables when missing. Safe to run on every start.
pub async fn init_schema(pool: &MySqlPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to create schema")?;
    }
    info!("Tables created/verified");
    Ok(())
}
