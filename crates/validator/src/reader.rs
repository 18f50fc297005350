use modelcheck_engine::Workbook;

use crate::error::ReadError;
use crate::model::InputFile;

/// Spreadsheet decoding backend.
///
/// The rule engine never touches a file format directly; it is handed a
/// reader, and the absence of one is itself a checklist outcome.
pub trait WorkbookReader {
    /// Decode every sheet of the input into a grid.
    fn read(&self, input: &InputFile) -> Result<Workbook, ReadError>;

    /// Names of embedded media parts (`xl/media/...`) in the workbook
    /// archive. Backends without archive access report `Unsupported`.
    fn list_media(&self, _input: &InputFile) -> Result<Vec<String>, ReadError> {
        Err(ReadError::Unsupported("archive listing".into()))
    }
}
