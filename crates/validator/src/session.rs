use chrono::NaiveDate;
use log::info;

use crate::config::ValidatorConfig;
use crate::document::{self, GeneratedDocument, MemoFields};
use crate::engine;
use crate::error::ValidatorError;
use crate::model::{InputFile, InputRole, ValidationReport, ValidationRequest};
use crate::reader::WorkbookReader;

/// The current input set and the last validation result.
///
/// Generation stays locked until a validation of the *current* inputs
/// finished without FAIL; changing any input locks it again.
#[derive(Debug, Default)]
pub struct RunSession {
    config: ValidatorConfig,
    request: ValidationRequest,
    last: Option<ValidationReport>,
}

impl RunSession {
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            request: ValidationRequest::default(),
            last: None,
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn request(&self) -> &ValidationRequest {
        &self.request
    }

    /// Replace the input for `role`, invalidating the last report.
    pub fn load(&mut self, role: InputRole, file: InputFile) {
        info!("loaded {role} input '{}'", file.name);
        *self.request.slot_mut(role) = Some(file);
        self.last = None;
    }

    /// Remove the input for `role`, invalidating the last report.
    pub fn unload(&mut self, role: InputRole) {
        if self.request.slot_mut(role).take().is_some() {
            self.last = None;
        }
    }

    /// Text extracted from the memo, invalidating the last report.
    pub fn set_memo_text(&mut self, text: Option<String>) {
        self.request.memo_text = text;
        self.last = None;
    }

    pub fn validate(&mut self, reader: Option<&dyn WorkbookReader>) -> &ValidationReport {
        let report = engine::run(&self.config, &self.request, reader);
        self.last.insert(report)
    }

    pub fn last_report(&self) -> Option<&ValidationReport> {
        self.last.as_ref()
    }

    pub fn can_generate(&self) -> bool {
        self.last.as_ref().is_some_and(ValidationReport::generation_permitted)
    }

    pub fn generate(
        &self,
        fields: &MemoFields,
        template: Option<&str>,
        generated_on: NaiveDate,
    ) -> Result<GeneratedDocument, ValidatorError> {
        let report = self.last.as_ref().ok_or(ValidatorError::NotValidated)?;
        document::generate(report, fields, template, generated_on)
    }

    /// Drop every input and the last report at once.
    pub fn reset(&mut self) {
        self.request = ValidationRequest::default();
        self.last = None;
    }
}
