//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | Usage error (bad args, output would overwrite input)      |
//! | 3    | Schema error: a required column is missing                |
//! | 4    | Selection error: reference sheet missing or unknown       |
//! | 5    | Config error: TOML parse or validation failure            |
//! | 6    | IO error: unreadable input, unwritable output             |
//! | 7    | Reference table maps one name to two different ids        |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map it in `CliError::from`

use fundmatch_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, output path equal to the input path.
pub const EXIT_USAGE: u8 = 2;

/// A stage or the reference loader needs a column the table lacks.
pub const EXIT_SCHEMA: u8 = 3;

/// No usable reference sheet was selected.
pub const EXIT_SELECTION: u8 = 4;

/// Config file could not be parsed or failed validation.
pub const EXIT_CONFIG: u8 = 5;

/// File read/write failure.
pub const EXIT_IO: u8 = 6;

/// Conflicting duplicate names in the reference table.
pub const EXIT_DUPLICATE_REFERENCE: u8 = 7;

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
        ReconError::Schema { .. } => EXIT_SCHEMA,
        ReconError::Selection(_) => EXIT_SELECTION,
        ReconError::DuplicateReference { .. } => EXIT_DUPLICATE_REFERENCE,
        ReconError::Io(_) => EXIT_IO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_SCHEMA,
            EXIT_SELECTION,
            EXIT_CONFIG,
            EXIT_IO,
            EXIT_DUPLICATE_REFERENCE,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn recon_errors_map_to_codes() {
        assert_eq!(recon_exit_code(&ReconError::schema("drop_noise", "x")), EXIT_SCHEMA);
        assert_eq!(recon_exit_code(&ReconError::Selection("none".into())), EXIT_SELECTION);
        assert_eq!(recon_exit_code(&ReconError::ConfigParse("bad".into())), EXIT_CONFIG);
        assert_eq!(recon_exit_code(&ReconError::Io("disk".into())), EXIT_IO);
    }
}
