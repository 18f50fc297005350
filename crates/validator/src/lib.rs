//! `modelcheck-validator` - rule engine for route-planning workbook submissions.
//!
//! Pure engine crate: receives decoded grids through a [`WorkbookReader`],
//! returns an ordered checklist and the aggregated model data.
//! No CLI or file-format dependencies.

pub mod config;
pub mod crosscheck;
pub mod document;
pub mod engine;
pub mod error;
pub mod format;
pub mod model;
pub mod parse;
pub mod reader;
pub mod session;
pub mod summary;

pub use config::ValidatorConfig;
pub use document::{DocumentSlots, GeneratedDocument, MemoFields};
pub use engine::run;
pub use error::{ParseError, ReadError, ValidatorError};
pub use model::{
    CheckResult, CheckStatus, InputFile, InputRole, ModelData, Stage, ValidationReport,
    ValidationRequest,
};
pub use reader::WorkbookReader;
pub use session::RunSession;
