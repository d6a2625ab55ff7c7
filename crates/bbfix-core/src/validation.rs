//! Input validation shared by the Apply Pipeline and the CLI/TUI front ends.

use bbfix_api::Error;

/// GitHub project-name rules: at most 100 characters, made up of letters,
/// digits, `.`, `-`, `_`, and not literally `.` or `..`.
pub fn validate_project_name(name: &str) -> Result<(), Error> {
    if name.is_empty() || name.len() > 100 {
        return Err(invalid("project name must be 1-100 characters"));
    }
    if name == "." || name == ".." {
        return Err(invalid("project name cannot be '.' or '..'"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err(invalid(
            "project name may only contain letters, digits, '.', '-', '_'",
        ));
    }
    Ok(())
}

/// A branch name proposed for `publish-new-branch` or `fork-and-retarget`
/// must differ from the branch currently checked out.
pub fn validate_new_branch_name(new_name: &str, current_branch: Option<&str>) -> Result<(), Error> {
    if new_name.is_empty() {
        return Err(invalid("new branch name must not be empty"));
    }
    if Some(new_name) == current_branch {
        return Err(invalid("new branch name must differ from the current branch"));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(bbfix_api::ErrorCode::InvalidInput, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dot_and_dotdot() {
        assert!(validate_project_name(".").is_err());
        assert!(validate_project_name("..").is_err());
    }

    #[test]
    fn rejects_over_100_chars() {
        let name = "a".repeat(101);
        assert!(validate_project_name(&name).is_err());
    }

    #[test]
    fn rejects_disallowed_characters() {
        assert!(validate_project_name("my repo!").is_err());
    }

    #[test]
    fn accepts_typical_name() {
        assert!(validate_project_name("my-repo_2.0").is_ok());
    }

    #[test]
    fn new_branch_must_differ_from_current() {
        assert!(validate_new_branch_name("main", Some("main")).is_err());
        assert!(validate_new_branch_name("fix-1", Some("main")).is_ok());
    }
}
