use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::dto::{AdminRegisterRequest, LoginRequest, RegisterRequest};
use super::password::{hash_password, verify_password};
use super::repo_types::User;
use crate::error::{is_unique_violation, AppError, AppResult};

pub const USER_MIN_PASSWORD_LEN: usize = 6;
pub const ADMIN_MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A registration that passed input validation.
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn parse(name: &str, email: &str, password: &str, min_password_len: usize) -> AppResult<Self> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Name, email, and password are required."));
        }
        if !is_valid_email(&email) {
            return Err(AppError::validation("Invalid email."));
        }
        if password.chars().count() < min_password_len {
            return Err(AppError::Validation(format!(
                "Password must be at least {min_password_len} characters long."
            )));
        }
        Ok(Self {
            name: name.to_string(),
            email,
            password: password.to_string(),
        })
    }
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = AppError;

    fn try_from(req: RegisterRequest) -> AppResult<Self> {
        Registration::parse(&req.name, &req.email, &req.password, USER_MIN_PASSWORD_LEN)
    }
}

/// Credentials that passed input validation.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for Credentials {
    type Error = AppError;

    fn try_from(req: LoginRequest) -> AppResult<Self> {
        let email = normalize_email(&req.email);
        if email.is_empty() || req.password.is_empty() {
            return Err(AppError::validation("Email and password are required."));
        }
        Ok(Self {
            email,
            password: req.password,
        })
    }
}

/// Creates a user. The password is stored only as an Argon2 hash.
pub async fn register(db: &SqlitePool, reg: Registration, is_admin: bool) -> AppResult<User> {
    if User::find_by_email(db, &reg.email).await?.is_some() {
        warn!(email = %reg.email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let hash = hash_password(&reg.password).await?;
    let user = User::create(db, &reg.name, &reg.email, &hash, is_admin)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEmail
            } else {
                AppError::Database(e)
            }
        })?;

    info!(user_id = %user.id, email = %user.email, is_admin, "user registered");
    Ok(user)
}

/// Admin self-registration, gated by the configured shared key. A wrong
/// key is `Forbidden` no matter what the rest of the request looks like.
pub async fn register_admin(
    db: &SqlitePool,
    configured_key: Option<&str>,
    req: AdminRegisterRequest,
) -> AppResult<User> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Name, email, and password are required."));
    }
    match configured_key {
        Some(key) if key == req.admin_key => {}
        _ => {
            warn!(email = %req.email, "admin registration with bad key");
            return Err(AppError::Forbidden("Invalid admin registration key."));
        }
    }
    let reg = Registration::parse(&req.name, &req.email, &req.password, ADMIN_MIN_PASSWORD_LEN)?;
    register(db, reg, true).await
}

/// Looks the user up by email and checks the password hash.
pub async fn authenticate(db: &SqlitePool, creds: &Credentials) -> AppResult<User> {
    let Some(user) = User::find_by_email(db, &creds.email).await? else {
        warn!(email = %creds.email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&creds.password, &user.password_hash).await? {
        warn!(email = %creds.email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

/// Like [`authenticate`], then requires the admin flag on the row.
pub async fn authenticate_admin(db: &SqlitePool, creds: &Credentials) -> AppResult<User> {
    let user = authenticate(db, creds).await?;
    if !user.is_admin {
        warn!(user_id = %user.id, "admin login by non-admin");
        return Err(AppError::Forbidden("Access denied. User is not an administrator."));
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    fn reg(email: &str) -> Registration {
        Registration::parse("Ada", email, "secret1", USER_MIN_PASSWORD_LEN).expect("valid")
    }

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    fn admin_req(key: &str, password: &str) -> AdminRegisterRequest {
        AdminRegisterRequest {
            name: "Root".into(),
            email: "root@example.com".into(),
            password: password.into(),
            admin_key: key.into(),
        }
    }

    #[test]
    fn registration_validates_input() {
        assert!(matches!(
            Registration::parse("", "a@b.co", "secret1", 6),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Registration::parse("Ada", "not-an-email", "secret1", 6),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Registration::parse("Ada", "a@b.co", "12345", 6),
            Err(AppError::Validation(_))
        ));
        let ok = Registration::parse("  Ada ", " Ada@Example.COM ", "123456", 6).expect("valid");
        assert_eq!(ok.name, "Ada");
        assert_eq!(ok.email, "ada@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_and_password_is_hashed() {
        let db = connect_in_memory().await.expect("db");
        let first = register(&db, reg("ada@example.com"), false).await.expect("first");
        assert!(!first.is_admin);
        assert_ne!(first.password_hash, "secret1");

        let err = register(&db, reg("ADA@example.com"), false).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn authenticate_checks_email_and_password() {
        let db = connect_in_memory().await.expect("db");
        let user = register(&db, reg("ada@example.com"), false).await.expect("register");

        let ok = authenticate(&db, &creds("ada@example.com", "secret1")).await.expect("login");
        assert_eq!(ok.id, user.id);

        assert!(matches!(
            authenticate(&db, &creds("ada@example.com", "wrong!!")).await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&db, &creds("nobody@example.com", "secret1")).await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn admin_registration_requires_key() {
        let db = connect_in_memory().await.expect("db");

        let err = register_admin(&db, Some("k"), admin_req("wrong", "longenough"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // bad key wins over a too-short password
        let err = register_admin(&db, Some("k"), admin_req("wrong", "short"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // registration disabled when no key is configured
        let err = register_admin(&db, None, admin_req("", "longenough"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = register_admin(&db, Some("k"), admin_req("k", "seven77"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let admin = register_admin(&db, Some("k"), admin_req("k", "longenough"))
            .await
            .expect("admin");
        assert!(admin.is_admin);
    }

    #[tokio::test]
    async fn admin_login_requires_admin_flag() {
        let db = connect_in_memory().await.expect("db");
        register(&db, reg("ada@example.com"), false).await.expect("user");
        register_admin(&db, Some("k"), admin_req("k", "longenough"))
            .await
            .expect("admin");

        let err = authenticate_admin(&db, &creds("ada@example.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = authenticate_admin(&db, &creds("root@example.com", "nope-nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let admin = authenticate_admin(&db, &creds("root@example.com", "longenough"))
            .await
            .expect("admin login");
        assert!(admin.is_admin);
    }
}
