use crate::error::{ApiError, Issue};

pub const MIN_NAME_LEN: usize = 5;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_DEPARTMENT_LEN: usize = 2;
pub const MIN_MEMBER_TYPE_LEN: usize = 5;
pub const MAX_REQUIRED_HOURS: u32 = 9999;

/// Collects field issues and turns them into a single 400.
#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<Issue>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &'static str, message: &'static str) -> &mut Self {
        if !ok {
            self.issues.push(Issue { field, message });
        }
        self
    }

    pub fn min_len(&mut self, value: &str, min: usize, field: &'static str, message: &'static str) -> &mut Self {
        self.check(value.trim().chars().count() >= min, field, message)
    }

    pub fn email(&mut self, value: &str, field: &'static str) -> &mut Self {
        if value.trim().is_empty() {
            return self.check(false, field, "Email is required");
        }
        self.check(is_valid_email(value), field, "Invalid email address")
    }

    pub fn password(&mut self, value: &str, field: &'static str) -> &mut Self {
        if value.is_empty() {
            return self.check(false, field, "Password is required");
        }
        self.check(
            value.chars().count() >= MIN_PASSWORD_LEN,
            field,
            "Password must be at least 6 characters",
        )
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.issues)))
        }
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !host.starts_with('.'),
        None => false,
    }
}

pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}
