//! Access policy.
//!
//! Each request moves Anonymous → Authenticated → Authorized; the credential
//! store handles the first transition, these checks handle the second. A
//! rejection at either step terminates the request — there is no partial
//! authorization.

use uuid::Uuid;

use crate::error::{RecordError, RecordResult};
use crate::models::{Role, User};

/// Require the principal's role to be in the operation's allowed set.
pub fn authorize(user: &User, allowed: &[Role]) -> RecordResult<()> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(RecordError::Unauthorized)
    }
}

/// Require the principal to be the doctor owning the roster at `doctor_id`.
/// Doctors can manage their own roster and stats, never another doctor's.
pub fn authorize_roster_owner(user: &User, doctor_id: Uuid) -> RecordResult<()> {
    authorize(user, &[Role::Doctor])?;
    if user.id == Some(doctor_id) {
        Ok(())
    } else {
        Err(RecordError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> User {
        let mut user = User::new(
            "someone@example.com".into(),
            "$2b$04$hash".into(),
            role,
            "Some".into(),
            "One".into(),
        );
        user.id = Some(Uuid::new_v4());
        user
    }

    #[test]
    fn role_must_be_in_the_allowed_set() {
        let admin = principal(Role::Admin);
        assert!(authorize(&admin, &[Role::Admin]).is_ok());
        assert!(authorize(&admin, &[Role::Admin, Role::Doctor]).is_ok());
        assert!(matches!(
            authorize(&admin, &[Role::Doctor]),
            Err(RecordError::Unauthorized)
        ));
    }

    #[test]
    fn roster_owner_must_be_the_named_doctor() {
        let doctor = principal(Role::Doctor);
        let own_id = doctor.id.unwrap();

        assert!(authorize_roster_owner(&doctor, own_id).is_ok());
        assert!(matches!(
            authorize_roster_owner(&doctor, Uuid::new_v4()),
            Err(RecordError::Unauthorized)
        ));
    }

    #[test]
    fn admins_do_not_own_rosters() {
        let admin = principal(Role::Admin);
        assert!(matches!(
            authorize_roster_owner(&admin, admin.id.unwrap()),
            Err(RecordError::Unauthorized)
        ));
    }
}
