use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Longest post body kept; anything past it is cut off silently.
pub const MAX_CONTENT_CHARS: usize = 20_000;

/// Validate a trimmed title (1-120 Unicode characters).
pub fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 120 {
        return Err(AppError::Validation("Title must be 1-120 characters".into()));
    }
    Ok(())
}

/// Validate an optional external link (at most 255 characters).
pub fn validate_link(link: Option<&str>) -> Result<(), AppError> {
    if let Some(link) = link
        && link.chars().count() > 255
    {
        return Err(AppError::Validation("Link must be at most 255 characters".into()));
    }
    Ok(())
}

/// Validate an optional photo description (at most 510 characters).
pub fn validate_description(description: Option<&str>) -> Result<(), AppError> {
    if let Some(description) = description
        && description.chars().count() > 510
    {
        return Err(AppError::Validation(
            "Description must be at most 510 characters".into(),
        ));
    }
    Ok(())
}

/// Cut `content` down to [`MAX_CONTENT_CHARS`].
pub fn truncate_content(content: &str) -> String {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((end, _)) => content[..end].to_string(),
        None => content.to_string(),
    }
}

/// `YYYY-MM-DD`, as shown next to every listed item.
pub fn date_posted(created_at: &DateTime<Utc>) -> String {
    created_at.format("%Y-%m-%d").to_string()
}
