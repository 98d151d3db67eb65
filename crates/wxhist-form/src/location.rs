//! Location requirement policy.
//!
//! The location text doubles as the search query for place autocomplete.
//! Once a concrete place has been picked (location API mode) the text is
//! advisory only and must not block submission.

/// Whether the location input is sufficient to submit the form.
pub fn location_satisfied(location: Option<&str>, use_location_api: bool) -> bool {
    if use_location_api {
        return true;
    }
    location.is_some_and(|text| !text.trim().is_empty())
}

/// Trimmed location text, or `None` when nothing meaningful was typed.
pub fn normalize_location(location: Option<&str>) -> Option<String> {
    location
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
