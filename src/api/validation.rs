use super::ApiError;

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    if trimmed.len() > 30 {
        return Err(ApiError::validation(
            "Username must be 30 characters or less",
        ));
    }

    if !trimmed.chars().all(char::is_alphanumeric) {
        return Err(ApiError::validation(
            "Username can only contain letters and numbers",
        ));
    }

    Ok(trimmed)
}

/// Shape check only; real deliverability is not this layer's problem.
pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ApiError::validation("Email is not valid"));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || trimmed.contains(' ') {
        return Err(ApiError::validation("Email is not valid"));
    }

    Ok(trimmed)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }

    Ok(password)
}

pub fn validate_full_name(full_name: &str) -> Result<&str, ApiError> {
    let trimmed = full_name.trim();

    if trimmed.is_empty() {
        return Err(ApiError::validation("Full name is required"));
    }

    Ok(trimmed)
}

/// The upload collaborators hand back http(s) URLs; anything else is a
/// malformed request.
pub fn validate_media_url<'a>(url: &'a str, field: &str) -> Result<&'a str, ApiError> {
    let trimmed = url.trim();

    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }

    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ApiError::validation(format!(
            "{field} must be an http(s) URL"
        )));
    }

    Ok(trimmed)
}

pub fn validate_pagination(page: u64, limit: u64) -> Result<(u64, u64), ApiError> {
    const MAX_LIMIT: u64 = 100;

    if page == 0 {
        return Err(ApiError::validation("Page must be at least 1"));
    }

    if limit == 0 || limit > MAX_LIMIT {
        return Err(ApiError::validation(format!(
            "Limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    Ok((page, limit))
}
