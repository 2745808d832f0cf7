use crate::{
    auth::{
        password::hash_password,
        repo_types::{User, UserChanges},
        services::{is_valid_email, normalize_email, MIN_PASSWORD_LEN},
    },
    error::{AppError, AppResult},
};

use super::dto::{CreateUserRequest, UpdateUserRequest};

/// Only superusers may hand out or take away superuser status.
pub fn check_create(actor: &User, req: &CreateUserRequest) -> AppResult<()> {
    if req.is_superuser && !actor.is_superuser {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Superuser accounts are edited by superusers only.
pub fn check_target(actor: &User, target: &User) -> AppResult<()> {
    if target.is_superuser && !actor.is_superuser {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Turns an admin edit into column changes.
pub fn build_changes(actor: &User, req: UpdateUserRequest) -> AppResult<UserChanges> {
    if req.touches_superuser() && !actor.is_superuser {
        return Err(AppError::Forbidden);
    }

    let email = match req.email {
        Some(e) => {
            let e = normalize_email(&e);
            if !is_valid_email(&e) {
                return Err(AppError::Validation("Invalid email".into()));
            }
            Some(e)
        }
        None => None,
    };

    let password_hash = match req.password {
        Some(p) if p.chars().count() < MIN_PASSWORD_LEN => {
            return Err(AppError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Some(p) => Some(hash_password(&p)?),
        None => None,
    };

    Ok(UserChanges {
        email,
        first_name: req.first_name.map(|s| s.trim().to_string()),
        last_name: req.last_name.map(|s| s.trim().to_string()),
        is_active: req.is_active,
        is_staff: req.is_staff,
        is_superuser: req.is_superuser,
        password_hash,
    })
}
