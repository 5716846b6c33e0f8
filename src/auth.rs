use crate::types::Actor;

/// The single authorization predicate consulted before every mutating
/// operation (bind, unbind, revert). Read-only operations bypass it.
///
/// An actor passes if they carry the platform's administrator capability,
/// or if they hold the configured admin role.
pub fn is_authorized(actor: &Actor, admin_role: Option<&str>) -> bool {
    if actor.is_admin {
        return true;
    }
    match admin_role {
        Some(role) => actor.role_ids.iter().any(|r| r == role),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(is_admin: bool, roles: &[&str]) -> Actor {
        Actor {
            tag: "user#1234".into(),
            is_admin,
            role_ids: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn admins_pass() {
        assert!(is_authorized(&actor(true, &[]), None));
        assert!(is_authorized(&actor(true, &[]), Some("R1")));
    }

    #[test]
    fn configured_role_passes() {
        assert!(is_authorized(&actor(false, &["R0", "R1"]), Some("R1")));
    }

    #[test]
    fn everyone_else_is_denied() {
        assert!(!is_authorized(&actor(false, &["R0"]), Some("R1")));
        assert!(!is_authorized(&actor(false, &["R1"]), None));
        assert!(!is_authorized(&actor(false, &[]), None));
    }
}
