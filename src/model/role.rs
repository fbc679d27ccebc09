use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    /// Intern tracking hours
    Member,
    /// Intern who also manages records and approves attendance
    Admin,
    /// Executive viewing department rollups
    Super,
}

impl Role {
    /// Roles that take part in hours aggregation; executives never do.
    pub const TRACKED: [Role; 2] = [Role::Member, Role::Admin];

    pub fn is_tracked(self) -> bool {
        Self::TRACKED.contains(&self)
    }

    /// Dashboard a freshly logged-in user lands on
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Role::Member => "/member",
            Role::Admin => "/admin",
            Role::Super => "/super",
        }
    }
}

impl TryFrom<String> for Role {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_values_case_insensitively() {
        assert_eq!("member".parse::<Role>().unwrap(), Role::Member);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("SUPER".parse::<Role>().unwrap(), Role::Super);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn displays_as_stored_value() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::Super.as_ref(), "super");
    }

    #[test]
    fn executives_are_not_tracked() {
        assert!(Role::Member.is_tracked());
        assert!(Role::Admin.is_tracked());
        assert!(!Role::Super.is_tracked());
    }

    #[test]
    fn each_role_has_its_dashboard() {
        assert_eq!(Role::Member.dashboard_path(), "/member");
        assert_eq!(Role::Admin.dashboard_path(), "/admin");
        assert_eq!(Role::Super.dashboard_path(), "/super");
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Member).unwrap(), "\"member\"");
        let role: Role = serde_json::from_str("\"super\"").unwrap();
        assert_eq!(role, Role::Super);
    }
}
