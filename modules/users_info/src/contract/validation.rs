//! Field rules shared by `NewUser::parse` and `UserPatch::parse`.

use validator::ValidateEmail;

use super::model::ValidationErrors;

/// Maximum name length, in characters.
pub const NAME_MAX_CHARS: usize = 100;

/// Trimmed name, or `None` with a violation recorded.
pub(crate) fn required_name(raw: Option<String>, errors: &mut ValidationErrors) -> Option<String> {
    let Some(raw) = raw else {
        errors.push("name", "name is required");
        return None;
    };

    let name = raw.trim();
    if name.is_empty() {
        errors.push("name", "name must not be empty");
        return None;
    }
    if name.chars().count() > NAME_MAX_CHARS {
        errors.push(
            "name",
            format!("name must be at most {NAME_MAX_CHARS} characters"),
        );
        return None;
    }
    Some(name.to_owned())
}

/// Normalized (trimmed, lower-cased) email, or `None` with a violation recorded.
pub(crate) fn required_email(
    raw: Option<String>,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let Some(raw) = raw else {
        errors.push("email", "email is required");
        return None;
    };

    let email = normalize_email(&raw);
    if !email.validate_email() {
        errors.push("email", "email must be a valid email address");
        return None;
    }
    Some(email)
}

/// Emails compare case-insensitively; they are stored in this form.
pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
