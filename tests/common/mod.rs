#![allow(dead_code)]

use mybb_bridge::{Database, MASTER_SID};
use sqlx::any::AnyPoolOptions;

const SCHEMA: [&str; 5] = [
    "CREATE TABLE mybb_templatesets (
        sid INTEGER PRIMARY KEY,
        title TEXT NOT NULL
    )",
    "CREATE TABLE mybb_templates (
        tid INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        template TEXT NOT NULL,
        sid INTEGER NOT NULL,
        version TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT '',
        dateline INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE mybb_templategroups (
        gid INTEGER PRIMARY KEY,
        prefix TEXT NOT NULL,
        title TEXT NOT NULL,
        isdefault INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE mybb_themes (
        tid INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE mybb_themestylesheets (
        sid INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        tid INTEGER NOT NULL,
        attachedto TEXT NOT NULL DEFAULT '',
        stylesheet TEXT NOT NULL,
        cachefile TEXT NOT NULL DEFAULT '',
        lastmodified INTEGER NOT NULL DEFAULT 0
    )",
];

/// In-memory forum database with the theme tables created and empty.
pub async fn create_test_db() -> Database {
    // One connection: every new sqlite::memory: connection is a fresh database
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database connection pool");

    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }

    Database::from_pool(pool, "mybb_").unwrap()
}

pub async fn insert_template_set(db: &Database, sid: i64, title: &str) {
    sqlx::query("INSERT INTO mybb_templatesets (sid, title) VALUES (?, ?)")
        .bind(sid)
        .bind(title)
        .execute(db.pool())
        .await
        .unwrap();
}

pub async fn insert_template(db: &Database, title: &str, body: &str, sid: i64) {
    sqlx::query(
        "INSERT INTO mybb_templates (title, template, sid, version, dateline) VALUES (?, ?, ?, '1800', 0)",
    )
    .bind(title)
    .bind(body)
    .bind(sid)
    .execute(db.pool())
    .await
    .unwrap();
}

pub async fn insert_master(db: &Database, title: &str, body: &str) {
    insert_template(db, title, body, MASTER_SID).await;
}

pub async fn insert_group(db: &Database, gid: i64, prefix: &str, title: &str) {
    sqlx::query("INSERT INTO mybb_templategroups (gid, prefix, title, isdefault) VALUES (?, ?, ?, 1)")
        .bind(gid)
        .bind(prefix)
        .bind(title)
        .execute(db.pool())
        .await
        .unwrap();
}

pub async fn insert_theme(db: &Database, tid: i64, name: &str) {
    sqlx::query("INSERT INTO mybb_themes (tid, name) VALUES (?, ?)")
        .bind(tid)
        .bind(name)
        .execute(db.pool())
        .await
        .unwrap();
}

pub async fn insert_stylesheet(db: &Database, tid: i64, name: &str, body: &str) {
    sqlx::query(
        "INSERT INTO mybb_themestylesheets (tid, name, stylesheet, cachefile, lastmodified) VALUES (?, ?, ?, ?, 0)",
    )
    .bind(tid)
    .bind(name)
    .bind(body)
    .bind(name)
    .execute(db.pool())
    .await
    .unwrap();
}

/// Number of rows for `title` in set `sid`.
pub async fn count_templates(db: &Database, title: &str, sid: i64) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM mybb_templates WHERE title = ? AND sid = ?")
        .bind(title)
        .bind(sid)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

pub async fn template_body(db: &Database, title: &str, sid: i64) -> String {
    sqlx::query_scalar::<_, String>("SELECT template FROM mybb_templates WHERE title = ? AND sid = ?")
        .bind(title)
        .bind(sid)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

pub async fn count_stylesheets(db: &Database) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM mybb_themestylesheets")
        .fetch_one(db.pool())
        .await
        .unwrap()
}
