use super::domain::Department;

/// Visibility and action scope resolved from an authenticated actor's role.
///
/// Unknown roles resolve to a scope literally named after the role string
/// rather than failing hard; such a scope is never actionable and the caller
/// decides what to render for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteScope {
    Department(Department),
    Custom(String),
}

impl RouteScope {
    pub fn department(&self) -> Option<Department> {
        match self {
            Self::Department(department) => Some(*department),
            Self::Custom(_) => None,
        }
    }

    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Department(_))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Department(department) => department.code(),
            Self::Custom(name) => name.as_str(),
        }
    }
}

/// Map an actor's role string to its department scope, folding legacy alias
/// roles (`account`, `hostel`, `lab`, `dean`, ...) onto the canonical
/// department the same way stage codes are folded.
pub fn resolve_role(role: &str) -> RouteScope {
    let normalized = role.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "admin" | "super_admin" => RouteScope::Department(Department::Admin),
        other => match Department::from_code(other) {
            Some(department) => RouteScope::Department(department),
            None => RouteScope::Custom(normalized),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_role_resolves_to_identical_scope() {
        assert_eq!(resolve_role("account"), resolve_role("accounts"));
        assert_eq!(resolve_role("hostel"), resolve_role("hostels"));
        assert_eq!(resolve_role("lab"), resolve_role("laboratories"));
        assert_eq!(resolve_role("dean"), resolve_role("school"));
        assert_eq!(
            resolve_role("accounts").department(),
            Some(Department::Accounts)
        );
    }

    #[test]
    fn admin_roles_share_the_admin_scope() {
        assert_eq!(
            resolve_role("super_admin"),
            RouteScope::Department(Department::Admin)
        );
        assert_eq!(
            resolve_role("ADMIN"),
            RouteScope::Department(Department::Admin)
        );
    }

    #[test]
    fn unknown_role_falls_back_to_named_scope_without_access() {
        let scope = resolve_role("Registrar");
        assert_eq!(scope, RouteScope::Custom("registrar".to_string()));
        assert_eq!(scope.name(), "registrar");
        assert!(!scope.is_actionable());
        assert!(scope.department().is_none());
    }
}
