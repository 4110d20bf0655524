use crate::db::{DbPool, User};
use crate::error::{AgriError, AgriResult};
use crate::extract::AppJson;
use crate::state::AppState;
use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

// bcrypt only reads the first 72 bytes of its input, so the password is
// reduced to a fixed-length digest first and every byte of it counts.
fn prehash(password: &str) -> String {
    Sha256::digest(password.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

async fn hash_password(password: &str, cost: u32) -> AgriResult<String> {
    let digest = prehash(password);
    tokio::task::spawn_blocking(move || bcrypt::hash(digest, cost))
        .await
        .map_err(|e| AgriError::Internal(format!("Hash task failed: {}", e)))?
        .map_err(AgriError::from)
}

// A stored value that is not a valid hash can never match.
async fn password_matches(password: &str, stored_hash: &str) -> bool {
    let digest = prehash(password);
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(digest, &stored_hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

/// Stores a bcrypt hash of `password` at the given work factor. A phone that
/// is already registered yields `AlreadyExists` and leaves the store as is.
pub async fn register_user(
    pool: &DbPool,
    phone: &str,
    password: &str,
    name: &str,
    cost: u32,
) -> AgriResult<()> {
    let hashed = hash_password(password, cost).await?;

    let result = sqlx::query("INSERT INTO users (phone, password, name) VALUES (?, ?, ?)")
        .bind(phone)
        .bind(hashed)
        .bind(name)
        .execute(pool)
        .await;

    match result {
        Ok(_) => {
            tracing::info!("Registered user {}", phone);
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            AgriError::AlreadyExists("User already exists".to_string()),
        ),
        Err(e) => Err(e.into()),
    }
}

/// Returns the user only when both phone and password match. An unknown
/// phone and a wrong password give the same `None` after the same amount of
/// bcrypt work at `cost`.
pub async fn verify_user(
    pool: &DbPool,
    phone: &str,
    password: &str,
    cost: u32,
) -> AgriResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT id, phone, name, password FROM users WHERE phone = ?")
        .bind(phone)
        .fetch_optional(pool)
        .await?;

    match user {
        Some(user) => {
            let matches = password_matches(password, &user.password_hash).await;
            Ok(matches.then_some(user))
        }
        None => {
            // Unknown phone: spend one hash at the same cost so timing matches a wrong password.
            let _ = hash_password(password, cost).await;
            Ok(None)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub phone: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub phone: Option<String>,
    pub password: Option<String>,
}

fn required(value: Option<String>, field: &str) -> AgriResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AgriError::Validation(format!("Missing required field: {}", field)))
}

pub async fn register_axum(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AgriResult<Json<Value>> {
    let phone = required(payload.phone, "phone")?;
    let password = required(payload.password, "password")?;
    let name = required(payload.name, "name")?;

    register_user(&state.pool, &phone, &password, &name, state.config.bcrypt_cost).await?;

    Ok(Json(json!({ "message": "Registration Successful" })))
}

pub async fn login_axum(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AgriResult<Json<Value>> {
    let (Some(phone), Some(password)) = (payload.phone, payload.password) else {
        return Err(AgriError::InvalidCredentials);
    };

    match verify_user(&state.pool, &phone, &password, state.config.bcrypt_cost).await? {
        Some(user) => Ok(Json(json!({ "message": "Login Successful", "user": user }))),
        None => Err(AgriError::InvalidCredentials),
    }
}
