//! Role checks over the boolean account flags.
//!
//! A permission is a zero-sized type; handlers name the one they need in the
//! [`Authorized`](super::extractors::Authorized) extractor and the check runs
//! before the handler body.

use std::marker::PhantomData;

use crate::accounts::repo_types::User;

pub trait Permission {
    fn has_permission(user: &User) -> bool;
}

/// Any authenticated account.
pub struct IsAuthenticated;

impl Permission for IsAuthenticated {
    fn has_permission(_user: &User) -> bool {
        true
    }
}

pub struct IsAdmin;

impl Permission for IsAdmin {
    fn has_permission(user: &User) -> bool {
        user.is_admin_account
    }
}

pub struct IsStaff;

impl Permission for IsStaff {
    fn has_permission(user: &User) -> bool {
        user.is_staff_account
    }
}

pub struct IsFieldWorker;

impl Permission for IsFieldWorker {
    fn has_permission(user: &User) -> bool {
        user.is_field_worker
    }
}

/// Logical OR of two permissions.
pub struct AnyOf<A, B>(PhantomData<(A, B)>);

impl<A: Permission, B: Permission> Permission for AnyOf<A, B> {
    fn has_permission(user: &User) -> bool {
        A::has_permission(user) || B::has_permission(user)
    }
}

pub type IsAdminOrIsStaff = AnyOf<IsAdmin, IsStaff>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repo_types::tests::user_fixture;

    fn with_flags(admin: bool, staff: bool, field: bool) -> User {
        let mut u = user_fixture("flags@example.com");
        u.is_admin_account = admin;
        u.is_staff_account = staff;
        u.is_field_worker = field;
        u
    }

    #[test]
    fn single_flag_checks() {
        let admin = with_flags(true, false, false);
        let staff = with_flags(false, true, false);
        let field = with_flags(false, false, true);

        assert!(IsAdmin::has_permission(&admin));
        assert!(!IsAdmin::has_permission(&staff));
        assert!(IsStaff::has_permission(&staff));
        assert!(!IsStaff::has_permission(&field));
        assert!(IsFieldWorker::has_permission(&field));
        assert!(!IsFieldWorker::has_permission(&admin));
    }

    #[test]
    fn admin_or_staff_is_logical_or() {
        assert!(IsAdminOrIsStaff::has_permission(&with_flags(true, false, false)));
        assert!(IsAdminOrIsStaff::has_permission(&with_flags(false, true, false)));
        assert!(IsAdminOrIsStaff::has_permission(&with_flags(true, true, false)));
        assert!(!IsAdminOrIsStaff::has_permission(&with_flags(false, false, true)));
        assert!(!IsAdminOrIsStaff::has_permission(&with_flags(false, false, false)));
    }

    #[test]
    fn authenticated_allows_plain_accounts() {
        assert!(IsAuthenticated::has_permission(&with_flags(false, false, false)));
    }
}
