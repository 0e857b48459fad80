use homeauth_model::User;

use crate::error::{CredentialCommandError, Result};

/// Privilege a command needs from its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any signed-in user.
    Authenticated,
    /// An administrator.
    Admin,
    /// The installation owner, who is always an administrator as well.
    Owner,
}

/// Check `caller` against `access`, returning the caller on success.
///
/// A missing caller on an [`Access::Authenticated`] command is reported as
/// `UserNotFound`; on admin commands it is `AdminRequired`. An admin who is
/// not the owner gets `OwnerRequired`.
pub fn authorize(caller: Option<&User>, access: Access) -> Result<&User> {
    match access {
        Access::Authenticated => caller.ok_or(CredentialCommandError::UserNotFound),
        Access::Admin => caller
            .filter(|user| user.is_admin)
            .ok_or(CredentialCommandError::AdminRequired),
        Access::Owner => {
            let admin = authorize(caller, Access::Admin)?;
            if admin.is_owner {
                Ok(admin)
            } else {
                Err(CredentialCommandError::OwnerRequired)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_matrix() {
        let owner = User::owner("owner");
        let admin = User::admin("admin");
        let user = User::new("user");

        assert!(authorize(Some(&owner), Access::Owner).is_ok());
        assert!(matches!(
            authorize(Some(&admin), Access::Owner),
            Err(CredentialCommandError::OwnerRequired)
        ));
        assert!(matches!(
            authorize(Some(&user), Access::Owner),
            Err(CredentialCommandError::AdminRequired)
        ));
        assert!(authorize(Some(&admin), Access::Admin).is_ok());
        assert!(matches!(
            authorize(Some(&user), Access::Admin),
            Err(CredentialCommandError::AdminRequired)
        ));
        assert!(authorize(Some(&user), Access::Authenticated).is_ok());
    }

    #[test]
    fn missing_caller() {
        assert!(matches!(
            authorize(None, Access::Authenticated),
            Err(CredentialCommandError::UserNotFound)
        ));
        assert!(matches!(
            authorize(None, Access::Admin),
            Err(CredentialCommandError::AdminRequired)
        ));
    }

    #[test]
    fn owner_flag_without_admin_is_not_enough() {
        let mut odd = User::new("odd");
        odd.is_owner = true;
        assert!(matches!(
            authorize(Some(&odd), Access::Owner),
            Err(CredentialCommandError::AdminRequired)
        ));
    }
}
