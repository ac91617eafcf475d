//! Input rules for submissions, edits, ratings and links.
//!
//! Lengths count characters of the trimmed input.

use crate::error::ModerationError;
use crate::status::ModerationAction;
use url::Url;

pub const MIN_CONTENT_CHARS: usize = 10;
pub const MIN_EDIT_MESSAGE_CHARS: usize = 5;
pub const MIN_TITLE_CHARS: usize = 3;
pub const MIN_DESCRIPTION_CHARS: usize = 10;
pub const MAX_RATING: f64 = 5.0;

/// Requires at least `min` characters after trimming.
pub fn min_chars(field: &'static str, value: &str, min: usize) -> Result<(), ModerationError> {
    if value.trim().chars().count() < min {
        return Err(ModerationError::validation(
            field,
            format!("must be at least {min} characters"),
        ));
    }
    Ok(())
}

/// Requires a non-blank value.
pub fn required(field: &'static str, value: &str) -> Result<(), ModerationError> {
    if value.trim().is_empty() {
        return Err(ModerationError::validation(field, "is required"));
    }
    Ok(())
}

/// Summary body text, on submission and on edit.
pub fn content(value: &str) -> Result<(), ModerationError> {
    min_chars("content", value, MIN_CONTENT_CHARS)
}

pub fn edit_message(value: &str) -> Result<(), ModerationError> {
    min_chars("edit_message", value, MIN_EDIT_MESSAGE_CHARS)
}

/// Ratings lie in `[0, 5]`.
pub fn rating(value: f64) -> Result<(), ModerationError> {
    if !(0.0..=MAX_RATING).contains(&value) {
        return Err(ModerationError::validation(
            "rating",
            format!("must be between 0 and {MAX_RATING}"),
        ));
    }
    Ok(())
}

/// Parses a moderation action name.
pub fn action(value: &str) -> Result<ModerationAction, ModerationError> {
    value.parse().map_err(|_| ModerationError::InvalidAction {
        action: value.to_string(),
    })
}

/// Rejections must explain themselves. Returns the notes to record.
pub fn notes_for(
    action: ModerationAction,
    notes: Option<&str>,
) -> Result<Option<String>, ModerationError> {
    let notes = notes.map(str::trim).filter(|n| !n.is_empty());
    if action == ModerationAction::Reject && notes.is_none() {
        return Err(ModerationError::validation(
            "notes",
            "are required when rejecting",
        ));
    }
    Ok(notes.map(str::to_string))
}

/// Requires an absolute http(s) URL and returns it normalized.
pub fn link_url(value: &str) -> Result<Url, ModerationError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ModerationError::validation("url", format!("is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ModerationError::validation(
            "url",
            "must use http or https",
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ModerationError::validation("url", "must include a host"));
    }
    Ok(url)
}

pub fn link_title(value: &str) -> Result<(), ModerationError> {
    min_chars("title", value, MIN_TITLE_CHARS)
}

/// An optional description, when present, must say something.
pub fn link_description(value: Option<&str>) -> Result<Option<String>, ModerationError> {
    match value.map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => {
            min_chars("description", description, MIN_DESCRIPTION_CHARS)?;
            Ok(Some(description.to_string()))
        }
        None => Ok(None),
    }
}
