//! Input validation for wxhist
//!
//! Decides whether a location and date range may be sent to the weather
//! archive. Everything here is synchronous and side-effect free.

pub mod dates;
pub mod error;
pub mod location;
pub mod schema;
pub mod state;
pub mod types;

pub use dates::{
    is_chronologically_valid, is_within_allowed_span, parse_date, years_between, DateRange,
    DATE_FORMAT, MINIMUM_DATE,
};
pub use error::{DateParseError, FieldError, FieldErrors, ValidationErrorKind};
pub use location::location_satisfied;
pub use schema::{validate, FormRules, FormSchema};
pub use state::{Form, FormState};
pub use types::{max_selectable_date, FieldPath, FormInput, ValidatedForm};
