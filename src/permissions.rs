//! Ownership-based access control shared by tags, ingredients and recipes.

use tracing::warn;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::{AppError, AppResult};

/// A record that belongs to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

/// The owner may change a record; staff and superusers may change any record.
pub fn is_owner_or_privileged<R: Owned + ?Sized>(user: &User, record: &R) -> bool {
    record.owner_id() == user.id || user.is_staff || user.is_superuser
}

pub fn ensure_owner_or_privileged<R: Owned + ?Sized>(user: &User, record: &R) -> AppResult<()> {
    if is_owner_or_privileged(user, record) {
        Ok(())
    } else {
        warn!(user_id = %user.id, owner_id = %record.owner_id(), "ownership check failed");
        Err(AppError::Forbidden)
    }
}

/// Gate for the admin backend.
pub fn require_staff(user: &User) -> AppResult<()> {
    if user.is_privileged() {
        Ok(())
    } else {
        warn!(user_id = %user.id, "non-staff user on admin route");
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use time::OffsetDateTime;

    pub fn user(is_staff: bool, is_superuser: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@domain.com".into(),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
            is_staff,
            is_superuser,
            password_hash: String::new(),
            last_login: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    struct Record(Uuid);

    impl Owned for Record {
        fn owner_id(&self) -> Uuid {
            self.0
        }
    }

    #[test]
    fn owner_may_modify() {
        let owner = user(false, false);
        assert!(is_owner_or_privileged(&owner, &Record(owner.id)));
        assert!(ensure_owner_or_privileged(&owner, &Record(owner.id)).is_ok());
    }

    #[test]
    fn other_user_is_forbidden() {
        let other = user(false, false);
        let record = Record(Uuid::new_v4());
        assert!(!is_owner_or_privileged(&other, &record));
        assert!(matches!(
            ensure_owner_or_privileged(&other, &record),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn staff_and_superuser_bypass_ownership() {
        let record = Record(Uuid::new_v4());
        assert!(is_owner_or_privileged(&user(true, false), &record));
        assert!(is_owner_or_privileged(&user(false, true), &record));
        assert!(is_owner_or_privileged(&user(true, true), &record));
    }

    #[test]
    fn admin_gate() {
        assert!(require_staff(&user(true, false)).is_ok());
        assert!(require_staff(&user(false, true)).is_ok());
        assert!(matches!(require_staff(&user(false, false)), Err(AppError::Forbidden)));
    }
}
