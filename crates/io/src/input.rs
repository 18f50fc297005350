// Input loading and fingerprinting

use std::path::Path;

use modelcheck_validator::InputFile;
use sha2::{Digest, Sha256};

/// SHA-256 of raw bytes → "sha256:<64 hex>".
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Read a file into an [`InputFile`] named after its file name.
pub fn load_input(path: &Path) -> Result<InputFile, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let hash = fingerprint(&bytes);
    Ok(InputFile::new(name, bytes).with_fingerprint(hash))
}
