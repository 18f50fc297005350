// JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use modelcheck_validator::ValidationReport;

/// Export the full report as pretty-printed JSON.
pub fn export(report: &ValidationReport, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report).map_err(|e| e.to_string())
}

pub fn to_string(report: &ValidationReport) -> Result<String, String> {
    serde_json::to_string_pretty(report).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelcheck_validator::{run, ValidationRequest, ValidatorConfig};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_json_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = run(&ValidatorConfig::default(), &ValidationRequest::default(), None);

        export(&report, &path).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["overall"], "FAIL");
        assert_eq!(parsed["stage"], "init");
        assert_eq!(parsed["checks"][1]["code"], "XLS-01");
        assert_eq!(parsed["checks"][1]["status"], "FAIL");
        assert!(parsed["model_data"].is_null());
    }
}
