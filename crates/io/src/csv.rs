// Checklist CSV export

use std::io::Write;
use std::path::Path;

use modelcheck_validator::summary::CheckGroup;
use modelcheck_validator::CheckResult;

pub const HEADER: [&str; 5] = ["code", "group", "description", "status", "detail"];

/// Write the checklist as CSV (header row first) to any writer.
pub fn write_checklist<W: Write>(checks: &[CheckResult], out: W) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADER).map_err(|e| e.to_string())?;
    for check in checks {
        let status = check.status.to_string();
        writer
            .write_record([
                check.code.as_str(),
                CheckGroup::of(&check.code).code(),
                check.description.as_str(),
                status.as_str(),
                check.detail.as_str(),
            ])
            .map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}

pub fn export(checks: &[CheckResult], path: &Path) -> Result<(), String> {
    let file = std::fs::File::create(path).map_err(|e| e.to_string())?;
    write_checklist(checks, file)
}
