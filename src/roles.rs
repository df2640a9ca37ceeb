//! Roles allowed into the back-office dashboard.

pub const ALLOWED_ROLES: [&str; 3] = ["Admin", "SuperUser", "Manager"];

#[must_use]
pub fn is_allowed(role: &str) -> bool {
    ALLOWED_ROLES.contains(&role)
}
