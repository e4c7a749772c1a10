use thiserror::Error;

use crate::{RequestIdentity, Role};

/// Set of roles admitted by a guard.
///
/// Membership is normalized so that `god` is admitted wherever `admin` is;
/// otherwise the check is plain set membership.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct RoleSet {
    user: bool,
    admin: bool,
    god: bool,
}

impl RoleSet {
    pub fn of(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut set = Self::default();
        for role in roles {
            match role {
                Role::User => set.user = true,
                Role::Admin => set.admin = true,
                Role::God => set.god = true,
            }
        }
        if set.admin {
            set.god = true;
        }
        set
    }

    /// `{admin, god}`: the administrative tier.
    pub fn admin_tier() -> Self {
        Self::of([Role::Admin, Role::God])
    }

    pub fn god_only() -> Self {
        Self::of([Role::God])
    }

    pub fn any_authenticated() -> Self {
        Self::of(Role::ALL)
    }

    pub fn contains(&self, role: Role) -> bool {
        match role {
            Role::User => self.user,
            Role::Admin => self.admin,
            Role::God => self.god,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.user || self.admin || self.god)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl core::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("{")?;
        for (i, role) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(role.as_str())?;
        }
        f.write_str("}")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("role '{role}' is not in the allowed set")]
    InsufficientRole { role: Role },

    /// The identity reached the check in a shape the authenticator never
    /// produces. This is a wiring defect, not a client error.
    #[error("malformed request identity: {0}")]
    MalformedIdentity(String),
}

/// Check a request identity against an allowed role set.
///
/// - No IO
/// - No panics
pub fn authorize(identity: &RequestIdentity, allowed: &RoleSet) -> Result<(), AuthzError> {
    if identity.subject_id.is_empty() {
        return Err(AuthzError::MalformedIdentity("empty subject id".to_string()));
    }

    if allowed.contains(identity.role) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole { role: identity.role })
    }
}
