//! Whole-form validation.
//!
//! The schema is an ordered table of independent rules. Each rule inspects an
//! immutable [`Snapshot`] of the input and reports at most one error against
//! one field. Every rule runs on every pass; the resulting errors are then
//! stable-grouped by field so the UI sees `startDate`, `endDate`, `location`
//! in that order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{self, is_chronologically_valid, is_on_or_after_floor, DateRange};
use crate::error::{DateParseError, FieldError, FieldErrors, ValidationErrorKind};
use crate::location::{location_satisfied, normalize_location};
use crate::types::{FieldPath, FormInput, ValidatedForm};

/// Tunable parts of the validation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRules {
    /// Reject start dates before [`dates::MINIMUM_DATE`].
    pub enforce_minimum_date: bool,
}

impl Default for FormRules {
    fn default() -> Self {
        Self {
            enforce_minimum_date: true,
        }
    }
}

/// Validate with the default rules.
pub fn validate(input: &FormInput) -> Result<ValidatedForm, FieldErrors> {
    FormSchema::default().validate(input)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FormSchema {
    rules: FormRules,
}

impl FormSchema {
    pub fn new(rules: FormRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> FormRules {
        self.rules
    }

    /// Run every rule against `input`.
    ///
    /// Pure: the same input always yields the same record or the same errors
    /// in the same order.
    pub fn validate(&self, input: &FormInput) -> Result<ValidatedForm, FieldErrors> {
        let snapshot = Snapshot::new(input);

        let mut errors: Vec<FieldError> = RULES
            .iter()
            .filter(|rule| (rule.violated)(&snapshot, &self.rules))
            .map(|rule| FieldError::new(rule.path, rule.kind, rule.message))
            .collect();
        errors.sort_by_key(|e| e.path);

        if let Some(errors) = FieldErrors::from_grouped(errors) {
            tracing::debug!(errors = errors.len(), "form input rejected");
            return Err(errors);
        }

        // The presence and format rules guarantee both dates parsed.
        let (Some(Ok(start)), Some(Ok(end))) = (snapshot.start, snapshot.end) else {
            return Err(FieldErrors::single(FieldError::new(
                FieldPath::StartDate,
                ValidationErrorKind::MissingField,
                START_REQUIRED,
            )));
        };

        tracing::debug!(%start, %end, "form input accepted");
        Ok(ValidatedForm::new(
            start,
            end,
            normalize_location(input.location.as_deref()),
            input.use_location_api,
        ))
    }
}

const START_REQUIRED: &str = "Start date is required";
const END_REQUIRED: &str = "End date is required";
const START_MALFORMED: &str = "Start date must be a valid date (YYYY-MM-DD)";
const END_MALFORMED: &str = "End date must be a valid date (YYYY-MM-DD)";
const END_BEFORE_START: &str = "End date must not be before start date";
const SPAN_TOO_LONG: &str = "Date range must not exceed one year";
const START_BELOW_FLOOR: &str = "Start date must be on or after 1940-01-01";
const LOCATION_REQUIRED: &str = "Location must not be empty";

/// Input values plus the date parses, computed once per pass.
struct Snapshot<'a> {
    start_text: Option<&'a str>,
    end_text: Option<&'a str>,
    start: Option<Result<NaiveDate, DateParseError>>,
    end: Option<Result<NaiveDate, DateParseError>>,
    location: Option<&'a str>,
    use_location_api: bool,
}

impl<'a> Snapshot<'a> {
    fn new(input: &'a FormInput) -> Self {
        let start_text = present(input.start_date.as_deref());
        let end_text = present(input.end_date.as_deref());
        Self {
            start_text,
            end_text,
            start: start_text.map(dates::parse_date),
            end: end_text.map(dates::parse_date),
            location: input.location.as_deref(),
            use_location_api: input.use_location_api,
        }
    }

    fn parsed(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (&self.start, &self.end) {
            (Some(Ok(start)), Some(Ok(end))) => Some((*start, *end)),
            _ => None,
        }
    }
}

fn present(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

struct Rule {
    path: FieldPath,
    kind: ValidationErrorKind,
    message: &'static str,
    violated: fn(&Snapshot<'_>, &FormRules) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        path: FieldPath::StartDate,
        kind: ValidationErrorKind::MissingField,
        message: START_REQUIRED,
        violated: start_missing,
    },
    Rule {
        path: FieldPath::EndDate,
        kind: ValidationErrorKind::MissingField,
        message: END_REQUIRED,
        violated: end_missing,
    },
    Rule {
        path: FieldPath::StartDate,
        kind: ValidationErrorKind::MalformedDate,
        message: START_MALFORMED,
        violated: start_malformed,
    },
    Rule {
        path: FieldPath::EndDate,
        kind: ValidationErrorKind::MalformedDate,
        message: END_MALFORMED,
        violated: end_malformed,
    },
    Rule {
        path: FieldPath::EndDate,
        kind: ValidationErrorKind::OrderingViolation,
        message: END_BEFORE_START,
        violated: end_before_start,
    },
    Rule {
        path: FieldPath::EndDate,
        kind: ValidationErrorKind::SpanViolation,
        message: SPAN_TOO_LONG,
        violated: span_too_long,
    },
    Rule {
        path: FieldPath::StartDate,
        kind: ValidationErrorKind::BelowFloor,
        message: START_BELOW_FLOOR,
        violated: start_below_floor,
    },
    Rule {
        path: FieldPath::Location,
        kind: ValidationErrorKind::MissingField,
        message: LOCATION_REQUIRED,
        violated: location_missing,
    },
];

fn start_missing(s: &Snapshot<'_>, _: &FormRules) -> bool {
    s.start_text.is_none()
}

fn end_missing(s: &Snapshot<'_>, _: &FormRules) -> bool {
    s.end_text.is_none()
}

fn start_malformed(s: &Snapshot<'_>, _: &FormRules) -> bool {
    matches!(s.start, Some(Err(_)))
}

fn end_malformed(s: &Snapshot<'_>, _: &FormRules) -> bool {
    matches!(s.end, Some(Err(_)))
}

fn end_before_start(s: &Snapshot<'_>, _: &FormRules) -> bool {
    s.parsed().is_some_and(|(start, end)| end < start)
}

// Skipped unless the pair is chronologically valid, so a reversed range only
// ever reports the ordering error.
fn span_too_long(s: &Snapshot<'_>, _: &FormRules) -> bool {
    if !is_chronologically_valid(s.start_text, s.end_text) {
        return false;
    }
    s.parsed()
        .and_then(|(start, end)| DateRange::new(start, end).ok())
        .is_some_and(|range| !range.is_within_allowed_span())
}

fn start_below_floor(s: &Snapshot<'_>, rules: &FormRules) -> bool {
    if !rules.enforce_minimum_date {
        return false;
    }
    matches!(s.start, Some(Ok(start)) if !is_on_or_after_floor(start))
}

fn location_missing(s: &Snapshot<'_>, _: &FormRules) -> bool {
    !location_satisfied(s.location, s.use_location_api)
}
