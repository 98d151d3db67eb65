//! Form lifecycle: `Pristine → Validating → {Valid, Invalid}`.
//!
//! The validator itself is stateless; this tracks what the UI last saw for
//! one input record.

use crate::error::FieldErrors;
use crate::schema::FormSchema;
use crate::types::{FormInput, ValidatedForm};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    /// Edited (or new) and not yet validated.
    #[default]
    Pristine,
    Validating,
    Valid(ValidatedForm),
    Invalid(FieldErrors),
}

impl FormState {
    /// True if a validation pass can start.
    pub fn can_validate(&self) -> bool {
        !matches!(self, FormState::Validating)
    }

    /// True if the form holds a record the query layer may use.
    pub fn can_submit(&self) -> bool {
        matches!(self, FormState::Valid(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FormState::Valid(_) | FormState::Invalid(_))
    }

    /// State after a validation pass starts.
    pub fn on_validation_started(self) -> Self {
        FormState::Validating
    }

    /// State after a validation pass finishes.
    pub fn on_validation_done(self, result: Result<ValidatedForm, FieldErrors>) -> Self {
        match result {
            Ok(form) => FormState::Valid(form),
            Err(errors) => FormState::Invalid(errors),
        }
    }

    /// State after the user edits a field or resets the form.
    pub fn on_reset(self) -> Self {
        FormState::Pristine
    }

    pub fn validated(&self) -> Option<&ValidatedForm> {
        match self {
            FormState::Valid(form) => Some(form),
            _ => None,
        }
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            FormState::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

/// One input record and where it is in its lifecycle.
#[derive(Debug, Clone, Default)]
pub struct Form {
    input: FormInput,
    state: FormState,
    schema: FormSchema,
}

impl Form {
    pub fn new(input: FormInput) -> Self {
        Self::with_schema(input, FormSchema::default())
    }

    pub fn with_schema(input: FormInput, schema: FormSchema) -> Self {
        Self {
            input,
            state: FormState::Pristine,
            schema,
        }
    }

    pub fn input(&self) -> &FormInput {
        &self.input
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Replace the input; any earlier outcome no longer applies.
    pub fn edit(&mut self, edit: impl FnOnce(&mut FormInput)) {
        edit(&mut self.input);
        self.state = std::mem::take(&mut self.state).on_reset();
    }

    pub fn reset(&mut self, input: FormInput) {
        self.input = input;
        self.state = std::mem::take(&mut self.state).on_reset();
    }

    /// Run one validation pass and move to a terminal state.
    pub fn validate(&mut self) -> &FormState {
        let state = std::mem::take(&mut self.state).on_validation_started();
        let result = self.schema.validate(&self.input);
        self.state = state.on_validation_done(result);
        &self.state
    }
}
