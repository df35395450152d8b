//! Shared, version-pinned identifiers and on-disk constants.
//!
//! These constants are the single source of truth for the matrix file layout
//! and for schema strings that appear in machine-readable I/O.

pub const MATSHELL_CONFIG_SCHEMA_VERSION: &str = "matshell.config@0.1.0";
pub const MATSHELL_COMMAND_REPORT_SCHEMA_VERSION: &str = "matshell.command.report@0.1.0";

/// Bytes reserved for a matrix name, including the terminator.
pub const MATRIX_NAME_CAPACITY: usize = 50;

/// Longest name text that fits in [`MATRIX_NAME_CAPACITY`].
pub const MATRIX_NAME_MAX_LEN: usize = MATRIX_NAME_CAPACITY - 1;

pub const DEFAULT_REGISTRY_CAPACITY: usize = 10;

/// Trailer byte appended after the cell data of every matrix file.
pub const MATRIX_FILE_SENTINEL: u8 = 0xFF;

/// Width of every fixed integer field in a matrix file.
pub const MATRIX_FILE_WORD: usize = 4;

pub const STARTUP_MATRIX_NAME: &str = "temp_mat";
pub const STARTUP_MATRIX_DIM: u32 = 5;
pub const STARTUP_MATRIX_LOW: u32 = 10;
pub const STARTUP_MATRIX_HIGH: u32 = 15;
