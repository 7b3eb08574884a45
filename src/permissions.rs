//! Role-based access control.
//!
//! Roles form a strict ladder; a capability check passes when the user's
//! role is at least the required one. All checks funnel through
//! [`RoleCapability`] so call sites never compare roles directly.

use failure::Fail;

use crate::{
    api::{ApiError, Status},
    db::types::UserRole,
};

/// Capabilities a role may hold.
pub trait RoleCapability {
    /// Lowest role granted this capability.
    fn required() -> UserRole;
}

macro_rules! capability {
    (
        $(#[$meta:meta])*
        $name:ident = $role:expr
    ) => {
        $(#[$meta])*
        pub struct $name;

        impl RoleCapability for $name {
            #[inline]
            fn required() -> UserRole {
                $role
            }
        }
    };
}

capability! {
    /// Holder can approve or reject pending submissions.
    ReviewPublications = UserRole::Moderador
}
capability! {
    /// Holder can manage users and platform settings.
    ManagePlatform = UserRole::Administrador
}

fn rank(role: UserRole) -> u8 {
    match role {
        UserRole::Usuario => 0,
        UserRole::Registrado => 1,
        UserRole::Moderador => 2,
        UserRole::Administrador => 3,
    }
}

/// Verify that `role` holds capability `C`.
pub fn require<C: RoleCapability>(role: UserRole) -> Result<(), RequireRoleError> {
    if rank(role) >= rank(C::required()) {
        Ok(())
    } else {
        Err(RequireRoleError(C::required()))
    }
}

#[derive(Debug, Fail)]
#[fail(display = "No tienes los permisos necesarios")]
pub struct RequireRoleError(UserRole);

impl ApiError for RequireRoleError {
    fn status(&self) -> Status {
        Status::Forbidden
    }

    fn code(&self) -> Option<&str> {
        Some("user:insufficient-role")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_needs_moderator_or_better() {
        assert!(require::<ReviewPublications>(UserRole::Registrado).is_err());
        assert!(require::<ReviewPublications>(UserRole::Moderador).is_ok());
        assert!(require::<ReviewPublications>(UserRole::Administrador).is_ok());
    }

    #[test]
    fn platform_management_is_admin_only() {
        assert!(require::<ManagePlatform>(UserRole::Moderador).is_err());
        assert!(require::<ManagePlatform>(UserRole::Administrador).is_ok());
    }
}
