use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::error::FieldErrors;

/// Form fields that can carry a validation error.
///
/// Declaration order is the order errors are grouped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldPath {
    StartDate,
    EndDate,
    Location,
}

impl FieldPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartDate => "startDate",
            Self::EndDate => "endDate",
            Self::Location => "location",
        }
    }

    /// Human-readable label, matching the form's input labels.
    pub fn label(&self) -> &'static str {
        match self {
            Self::StartDate => "Start date",
            Self::EndDate => "End date",
            Self::Location => "Location",
        }
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw form values exactly as the user entered them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormInput {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub use_location_api: bool,
}

impl FormInput {
    pub fn new(
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        location: Option<&str>,
        use_location_api: bool,
    ) -> Self {
        Self {
            start_date: Some(start_date.into()),
            end_date: Some(end_date.into()),
            location: location.map(str::to_string),
            use_location_api,
        }
    }

    /// A fresh form: both dates set to yesterday, no location.
    pub fn with_defaults(today: NaiveDate) -> Self {
        let yesterday = max_selectable_date(today).format(crate::DATE_FORMAT).to_string();
        Self {
            start_date: Some(yesterday.clone()),
            end_date: Some(yesterday),
            location: None,
            use_location_api: false,
        }
    }
}

/// The latest date the archive can serve: the day before `today`.
pub fn max_selectable_date(today: NaiveDate) -> NaiveDate {
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}

/// Normalized form values, produced only by a successful validation pass.
///
/// Deserializing reads a [`FormInput`] and validates it with the default
/// rules, so a stored record can never skip the checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "FormInput")]
pub struct ValidatedForm {
    start_date: NaiveDate,
    end_date: NaiveDate,
    location: Option<String>,
    use_location_api: bool,
}

impl TryFrom<FormInput> for ValidatedForm {
    type Error = FieldErrors;

    fn try_from(input: FormInput) -> Result<Self, Self::Error> {
        crate::schema::validate(&input)
    }
}

impl ValidatedForm {
    pub(crate) fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        location: Option<String>,
        use_location_api: bool,
    ) -> Self {
        Self {
            start_date,
            end_date,
            location,
            use_location_api,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn use_location_api(&self) -> bool {
        self.use_location_api
    }

    /// Start date in canonical `YYYY-MM-DD` form.
    pub fn start_date_text(&self) -> String {
        self.start_date.format(crate::DATE_FORMAT).to_string()
    }

    /// End date in canonical `YYYY-MM-DD` form.
    pub fn end_date_text(&self) -> String {
        self.end_date.format(crate::DATE_FORMAT).to_string()
    }

    pub fn range(&self) -> DateRange {
        DateRange::from_ordered(self.start_date, self.end_date)
    }

    /// Number of days covered, counting both ends.
    pub fn day_count(&self) -> usize {
        self.range().days().count()
    }
}
