use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use sqlx::Row;
use time::OffsetDateTime;

use crate::domain::user::User;
use crate::infra::db::Db;

const TOKEN_ISSUER: &str = "scribe";
const SESSION_TOKEN_TYPE: &str = "session";

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: i64,
}

#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    db: Db,
    session_key: [u8; 32],
    session_ttl_minutes: u64,
}

impl AuthService {
    pub fn new(db: Db, session_key: [u8; 32], session_ttl_minutes: u64) -> Self {
        Self {
            db,
            session_key,
            session_ttl_minutes,
        }
    }

    pub async fn signup(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let password_hash = hash_password(password)?;
        let row = sqlx::query(
            "INSERT INTO users (username, email, password_hash, created_at) \
             VALUES (?1, ?2, ?3, ?4) \
             RETURNING id, username, email, created_at",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.db.pool())
        .await?;

        let user = User {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            created_at: row.get("created_at"),
        };
        tracing::info!(user_id = user.id, username = %user.username, "user signed up");
        Ok(user)
    }

    /// Checks credentials and issues a session token. `None` means the
    /// username is unknown or the password does not match.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<SessionToken>> {
        let row = sqlx::query("SELECT id, password_hash FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let user_id: i64 = row.get("id");
        let password_hash: String = row.get("password_hash");
        if password_hash.is_empty() {
            return Ok(None);
        }

        if !verify_password(password, &password_hash)? {
            return Ok(None);
        }

        let session = self.issue_session(user_id)?;
        Ok(Some(session))
    }

    pub fn issue_session(&self, user_id: i64) -> Result<SessionToken> {
        let duration = std::time::Duration::from_secs(self.session_ttl_minutes * 60);
        let mut claims = Claims::new_expires_in(&duration)?;
        claims.issuer(TOKEN_ISSUER)?;
        claims.audience(TOKEN_ISSUER)?;
        claims.subject(&user_id.to_string())?;
        claims.add_additional("typ", SESSION_TOKEN_TYPE)?;

        let key = SymmetricKey::<V4>::from(&self.session_key)?;
        let token = local::encrypt(&key, &claims, None, None)?;
        Ok(SessionToken { token })
    }

    /// Resolves a session token to a live user. Invalid, expired or
    /// orphaned tokens yield `None`.
    pub async fn authenticate(&self, token: &str) -> Result<Option<AuthSession>> {
        let claims = match self.decrypt_claims(token)? {
            Some(claims) => claims,
            None => return Ok(None),
        };
        if !has_token_type(&claims, SESSION_TOKEN_TYPE) {
            return Ok(None);
        }
        let user_id = claim_id(&claims, "sub")?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(exists.map(|user_id| AuthSession { user_id }))
    }

    fn decrypt_claims(&self, token: &str) -> Result<Option<Claims>> {
        let key = SymmetricKey::<V4>::from(&self.session_key)?;
        let mut rules = ClaimsValidationRules::new();
        rules.validate_issuer_with(TOKEN_ISSUER);
        rules.validate_audience_with(TOKEN_ISSUER);

        let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let trusted = match local::decrypt(&key, &untrusted, &rules, None, None) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        Ok(trusted.payload_claims().cloned())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn claim_id(claims: &Claims, name: &str) -> Result<i64> {
    let value = claims
        .get_claim(name)
        .and_then(|value| value.as_str())
        .ok_or_else(|| anyhow!("missing {} claim", name))?;
    Ok(value.parse::<i64>()?)
}

fn has_token_type(claims: &Claims, expected: &str) -> bool {
    claims
        .get_claim("typ")
        .and_then(|value| value.as_str())
        .map(|value| value == expected)
        .unwrap_or(false)
}
