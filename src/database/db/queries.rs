use std::fmt::Write as _;

use sha2::{Digest, Sha256};
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use crate::database::models::{GoalRecord, User};

/*
CRUD for the backend's relational store: users, bearer sessions, and the
server-side mirror of savings goals. No allocation math happens here.
 */

const USER_COLUMNS: &str = "user_id, username, password_hash, salt, user_created_at";

const GOAL_COLUMNS: &str =
    "goal_id, user_id, goal_name, target_amount, time_frame, progress, goal_created_at";

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/*==========User Queries===========*/

pub async fn create_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<i64, sqlx::Error> {
    let salt = Uuid::new_v4().simple().to_string();
    let hash = password_digest(&salt, password);

    let row = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, salt, user_created_at)
        VALUES (?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
        RETURNING user_id
        "#,
    )
    .bind(username)
    .bind(hash)
    .bind(salt)
    .fetch_one(pool)
    .await?;

    row.try_get("user_id")
}

pub async fn get_user_by_username(
    pool: &Pool<Sqlite>,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// Delegated credential check: `Ok(None)` covers both an unknown username
/// and a wrong password, so callers cannot tell the two apart.
pub async fn verify_login(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<Option<User>, sqlx::Error> {
    let Some(user) = get_user_by_username(pool, username).await? else {
        return Ok(None);
    };
    if password_digest(&user.salt, password) == user.password_hash {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/*==========Session Queries===========*/

pub async fn create_session(pool: &Pool<Sqlite>, user_id: i64) -> Result<String, sqlx::Error> {
    let token = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO sessions (token, user_id, issued_at)
        VALUES (?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
        "#,
    )
    .bind(&token)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(token)
}

pub async fn user_for_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.user_id, u.username, u.password_hash, u.salt, u.user_created_at
        FROM users u
        JOIN sessions s ON s.user_id = u.user_id
        WHERE s.token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
}

/*==========Goal Queries===========*/

pub async fn create_goal(
    pool: &Pool<Sqlite>,
    user_id: i64,
    name: &str,
    target_amount: f64,
    time_frame: i64,
) -> Result<GoalRecord, sqlx::Error> {
    sqlx::query_as::<_, GoalRecord>(&format!(
        r#"
        INSERT INTO goals (user_id, goal_name, target_amount, time_frame, progress, goal_created_at)
        VALUES (?, ?, ?, ?, 0, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
        RETURNING {GOAL_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(name)
    .bind(target_amount)
    .bind(time_frame)
    .fetch_one(pool)
    .await
}

pub async fn goals_by_user(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<GoalRecord>, sqlx::Error> {
    sqlx::query_as::<_, GoalRecord>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ? ORDER BY goal_id ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn delete_goal(pool: &Pool<Sqlite>, goal_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM goals WHERE goal_id = ?")
        .bind(goal_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
