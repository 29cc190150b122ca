//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success, no breaks                                 |
//! | 1    | Run completed and found at least one break         |
//! | 2    | CLI usage error (bad args, missing input file)     |
//! | 3    | Input could not be decoded or split into columns   |
//! | 4    | A required column is missing from an input header  |
//! | 5    | Config file could not be parsed or is invalid      |
//! | 6    | IO error (read or write)                           |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `From<ReconError> for CliError` or the command that raises it

use divrecon_recon::ReconError;

// =============================================================================
// Outcome (0-1)
// =============================================================================

/// Success - the run found no breaks, or a non-run command succeeded.
pub const EXIT_SUCCESS: u8 = 0;

/// Breaks found. Like `diff(1)`, exit 1 means "inputs differ."
pub const EXIT_BREAKS: u8 = 1;

// =============================================================================
// Failures (2-6)
// =============================================================================

/// Usage error - bad arguments, missing input file.
pub const EXIT_USAGE: u8 = 2;

/// Input bytes could not be decoded, or the file has no header row.
pub const EXIT_INGEST: u8 = 3;

/// No header in a dataset matches any spelling of a mapped field.
pub const EXIT_MISSING_COLUMN: u8 = 4;

/// Config TOML failed to parse or validate.
pub const EXIT_CONFIG: u8 = 5;

/// Read or write failure.
pub const EXIT_IO: u8 = 6;

/// Exit code for a fatal engine error.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
        ReconError::Ingest { .. } => EXIT_INGEST,
        ReconError::MissingColumn { .. } => EXIT_MISSING_COLUMN,
        ReconError::Io(_) => EXIT_IO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use divrecon_recon::mapping::Field;
    use divrecon_recon::model::Dataset;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_BREAKS,
            EXIT_USAGE,
            EXIT_INGEST,
            EXIT_MISSING_COLUMN,
            EXIT_CONFIG,
            EXIT_IO,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn recon_errors_map_to_codes() {
        assert_eq!(recon_exit_code(&ReconError::ConfigParse("x".into())), EXIT_CONFIG);
        assert_eq!(recon_exit_code(&ReconError::ConfigValidation("x".into())), EXIT_CONFIG);
        assert_eq!(
            recon_exit_code(&ReconError::Ingest { dataset: Dataset::Nbim, reason: "x".into() }),
            EXIT_INGEST
        );
        assert_eq!(
            recon_exit_code(&ReconError::MissingColumn {
                dataset: Dataset::Custody,
                field: Field::GrossAmount,
                tried: vec![],
            }),
            EXIT_MISSING_COLUMN
        );
        assert_eq!(recon_exit_code(&ReconError::Io("x".into())), EXIT_IO);
    }
}
