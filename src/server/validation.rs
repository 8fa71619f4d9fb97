use crate::server::response::ApiError;

const MAX_USERNAME_LEN: usize = 64;
const MAX_TEAM_NAME_LEN: usize = 100;
const MAX_PROJECT_TITLE_LEN: usize = 250;

fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

pub fn validate_username(name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::bad_request("Username cannot be empty"));
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    if !name.chars().all(is_valid_name_char) {
        return Err(ApiError::bad_request(
            "Username can only contain alphanumeric characters, hyphens, underscores, and periods",
        ));
    }
    if name.starts_with('-') || name.starts_with('.') {
        return Err(ApiError::bad_request(
            "Username cannot start with a hyphen or period",
        ));
    }
    Ok(())
}

fn validate_label(value: &str, entity: &str, max_len: usize) -> Result<(), ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!("{entity} cannot be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(ApiError::bad_request(format!(
            "{entity} cannot exceed {max_len} characters"
        )));
    }
    Ok(())
}

pub fn validate_team_name(name: &str) -> Result<(), ApiError> {
    validate_label(name, "Team name", MAX_TEAM_NAME_LEN)
}

pub fn validate_project_title(title: &str) -> Result<(), ApiError> {
    validate_label(title, "Project title", MAX_PROJECT_TITLE_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usernames() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.b-c_d").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("-alice").is_err());
        assert!(validate_username("al ice").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_project_titles() {
        assert!(validate_project_title("Quarterly plan").is_ok());
        assert!(validate_project_title("   ").is_err());
        assert!(validate_project_title(&"x".repeat(251)).is_err());
    }
}
