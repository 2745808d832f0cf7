use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

use super::password::{hash_password, verify_dummy, verify_password};
use super::repo_types::{NewUser, User};
use crate::config::BootstrapAdmin;
use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Optional fields for the user factory.
#[derive(Debug, Clone)]
pub struct UserExtra {
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Default for UserExtra {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }
}

/// Validates and hashes the input into an insertable row.
pub fn build_new_user(email: &str, password: &str, extra: UserExtra) -> AppResult<NewUser> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::Validation("Users must have an email address".into()));
    }
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let password_hash = hash_password(password)?;
    Ok(NewUser {
        email,
        password_hash,
        first_name: extra.first_name.trim().to_string(),
        last_name: extra.last_name.trim().to_string(),
        is_active: extra.is_active,
        is_staff: extra.is_staff || extra.is_superuser,
        is_superuser: extra.is_superuser,
    })
}

pub async fn create_user(
    db: &PgPool,
    email: &str,
    password: &str,
    extra: UserExtra,
) -> AppResult<User> {
    let new = build_new_user(email, password, extra)?;
    match User::insert(db, &new).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, is_staff = user.is_staff,
                  is_superuser = user.is_superuser, "user created");
            Ok(user)
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            warn!(email = %new.email, "email already registered");
            Err(AppError::Conflict("Email already registered".into()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn create_staffuser(
    db: &PgPool,
    email: &str,
    password: &str,
    extra: UserExtra,
) -> AppResult<User> {
    create_user(
        db,
        email,
        password,
        UserExtra {
            is_staff: true,
            ..extra
        },
    )
    .await
}

pub async fn create_superuser(
    db: &PgPool,
    email: &str,
    password: &str,
    extra: UserExtra,
) -> AppResult<User> {
    create_user(
        db,
        email,
        password,
        UserExtra {
            is_staff: true,
            is_superuser: true,
            ..extra
        },
    )
    .await
}

/// Checks credentials. Unknown email, wrong password and inactive accounts
/// all come back as the same `Unauthorized`.
pub async fn authenticate(db: &PgPool, email: &str, password: &str) -> AppResult<User> {
    let email = normalize_email(email);
    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let Some(user) = User::find_by_email(db, &email).await? else {
        verify_dummy(password);
        warn!(%email, "login unknown email");
        return Err(invalid());
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(invalid());
    }
    if !user.is_active {
        warn!(%email, user_id = %user.id, "login inactive user");
        return Err(invalid());
    }

    User::touch_last_login(db, user.id).await?;
    Ok(user)
}

/// Creates the configured superuser unless that email is already taken.
pub async fn bootstrap_superuser(db: &PgPool, admin: &BootstrapAdmin) -> AppResult<()> {
    let email = normalize_email(&admin.email);
    if User::find_by_email(db, &email).await?.is_some() {
        info!(%email, "bootstrap admin already present");
        return Ok(());
    }
    let user = create_superuser(db, &email, &admin.password, UserExtra::default()).await?;
    info!(user_id = %user.id, %email, "bootstrap superuser created");
    Ok(())
}
