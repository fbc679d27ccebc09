use serde::Serialize;
use utoipa::ToSchema;

use crate::model::role::Role;

/// Department executives are registered under
pub const MANAGEMENT: &str = "Management";

/// Bucket for members registered without a department
pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[schema(example = json!({
    "department": "HR",
    "member_type": "HR Intern",
    "default_role": "admin"
}))]
pub struct Department {
    #[schema(value_type = String)]
    pub department: &'static str,
    #[schema(value_type = String)]
    pub member_type: &'static str,
    pub default_role: Role,
}

/// Departments an intern can be registered under, with the member type and
/// role the registration form pre-fills.
pub const CATALOGUE: [Department; 7] = [
    Department { department: "IT", member_type: "IT Intern", default_role: Role::Member },
    Department { department: "HR", member_type: "HR Intern", default_role: Role::Admin },
    Department { department: "Marketing", member_type: "Marketing Intern", default_role: Role::Member },
    Department { department: "Design", member_type: "Graphic Design Intern", default_role: Role::Member },
    Department { department: "Content", member_type: "Content Creation Intern", default_role: Role::Member },
    Department { department: "Video", member_type: "Video Editor Intern", default_role: Role::Member },
    Department { department: "Esports", member_type: "E-Sports Intern", default_role: Role::Member },
];

pub fn lookup(name: &str) -> Option<&'static Department> {
    CATALOGUE
        .iter()
        .find(|d| d.department.eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hr_interns_default_to_admin() {
        let hr = lookup("HR").unwrap();
        assert_eq!(hr.member_type, "HR Intern");
        assert_eq!(hr.default_role, Role::Admin);
    }

    #[test]
    fn lookup_ignores_case_and_padding() {
        assert_eq!(lookup(" esports ").unwrap().member_type, "E-Sports Intern");
    }

    #[test]
    fn unknown_department_is_none() {
        assert!(lookup("Finance").is_none());
        assert!(lookup(MANAGEMENT).is_none());
    }
}
