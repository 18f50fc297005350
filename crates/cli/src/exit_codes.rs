//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts branch on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success (validation OK, or WARN without `--strict`)      |
//! | 1    | General error (unspecified)                              |
//! | 2    | Usage error (bad arguments, bad `--field`, bad `--date`) |
//! | 3    | Validation finished with at least one FAIL               |
//! | 4    | Validation finished with WARN and `--strict` was given   |
//! | 5    | Document generation refused                              |
//! | 6    | Configuration file invalid                               |
//! | 7    | I/O failure reading inputs or writing outputs            |

use modelcheck_validator::{CheckStatus, ValidatorError};

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown memo field, malformed date.
pub const EXIT_USAGE: u8 = 2;

/// The checklist contains a FAIL.
pub const EXIT_VALIDATION_FAIL: u8 = 3;

/// The checklist contains a WARN and the caller asked for `--strict`.
pub const EXIT_VALIDATION_WARN: u8 = 4;

/// Generation refused because the validation failed.
pub const EXIT_GENERATION_BLOCKED: u8 = 5;

/// Config file could not be parsed or failed validation.
pub const EXIT_CONFIG_INVALID: u8 = 6;

/// Reading an input or writing an output failed.
pub const EXIT_IO: u8 = 7;

/// Exit code for a finished validation run.
pub fn validation_exit_code(overall: CheckStatus, strict: bool) -> u8 {
    match overall {
        CheckStatus::Ok => EXIT_SUCCESS,
        CheckStatus::Warn if strict => EXIT_VALIDATION_WARN,
        CheckStatus::Warn => EXIT_SUCCESS,
        CheckStatus::Fail => EXIT_VALIDATION_FAIL,
    }
}

/// Map a validator API error to its exit code.
pub fn validator_exit_code(err: &ValidatorError) -> u8 {
    match err {
        ValidatorError::ConfigParse(_) | ValidatorError::ConfigValidation(_) => EXIT_CONFIG_INVALID,
        ValidatorError::GenerationBlocked { .. } | ValidatorError::NotValidated => {
            EXIT_GENERATION_BLOCKED
        }
        ValidatorError::Template(_) => EXIT_USAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_only_affects_warn() {
        assert_eq!(validation_exit_code(CheckStatus::Ok, true), EXIT_SUCCESS);
        assert_eq!(validation_exit_code(CheckStatus::Warn, false), EXIT_SUCCESS);
        assert_eq!(validation_exit_code(CheckStatus::Warn, true), EXIT_VALIDATION_WARN);
        assert_eq!(validation_exit_code(CheckStatus::Fail, false), EXIT_VALIDATION_FAIL);
    }

    #[test]
    fn validator_errors_map_to_registry() {
        let blocked = ValidatorError::GenerationBlocked { status: CheckStatus::Fail };
        assert_eq!(validator_exit_code(&blocked), EXIT_GENERATION_BLOCKED);
        assert_eq!(
            validator_exit_code(&ValidatorError::ConfigValidation("x".into())),
            EXIT_CONFIG_INVALID
        );
        assert_eq!(validator_exit_code(&ValidatorError::Template("x".into())), EXIT_USAGE);
    }
}
