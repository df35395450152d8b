use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Argument rejected before any state was touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidArgument {
    #[error("matrix name is empty")]
    EmptyName,
    #[error("matrix name is {len} bytes (max {max})")]
    NameTooLong { len: usize, max: usize },
    #[error("matrix name is not valid UTF-8")]
    NameNotUtf8,
    #[error("matrix name contains a NUL byte")]
    NameHasNul,
    #[error("matrix name {0:?} is not a plain file name")]
    NameNotFileSafe(String),
    #[error("matrix dimensions must be non-zero")]
    ZeroDimension,
    #[error("registry capacity must be non-zero")]
    ZeroCapacity,
    #[error("invalid range: low {low} is greater than high {high}")]
    InvalidRange { low: u32, high: u32 },
    #[error("invalid shift direction {0:?} (expected one of: l, left, r, right)")]
    InvalidDirection(String),
}

/// OS cause category carried by [`MatrixError::Io`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoCause {
    NotFound,
    PermissionDenied,
    Busy,
    BadDescriptor,
    AlreadyExists,
    Other,
}

impl IoCause {
    pub fn classify(err: &io::Error) -> Self {
        if let Some(cause) = err.raw_os_error().and_then(classify_errno) {
            return cause;
        }
        match err.kind() {
            io::ErrorKind::NotFound => IoCause::NotFound,
            io::ErrorKind::PermissionDenied => IoCause::PermissionDenied,
            io::ErrorKind::AlreadyExists => IoCause::AlreadyExists,
            io::ErrorKind::AddrInUse => IoCause::Busy,
            _ => IoCause::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IoCause::NotFound => "not found",
            IoCause::PermissionDenied => "permission denied",
            IoCause::Busy => "file busy",
            IoCause::BadDescriptor => "bad file descriptor",
            IoCause::AlreadyExists => "file exists",
            IoCause::Other => "i/o failure",
        }
    }
}

#[cfg(unix)]
fn classify_errno(code: i32) -> Option<IoCause> {
    match code {
        libc::EBADF => Some(IoCause::BadDescriptor),
        libc::EBUSY | libc::ETXTBSY | libc::EADDRINUSE => Some(IoCause::Busy),
        _ => None,
    }
}

#[cfg(not(unix))]
fn classify_errno(_code: i32) -> Option<IoCause> {
    None
}

impl fmt::Display for IoCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),
    #[error("matrix ({name}) doesn't exist")]
    NotFound { name: String },
    #[error("dimension mismatch: {left:?} vs {right:?}")]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },
    #[error("{op} {path:?}: {cause}")]
    Io {
        op: &'static str,
        path: PathBuf,
        cause: IoCause,
        #[source]
        source: io::Error,
    },
    #[error("truncated file: {field} needs {expected} bytes, got {got}")]
    TruncatedFile {
        field: &'static str,
        expected: u64,
        got: u64,
    },
    #[error("failed to allocate storage for {cells} cells")]
    AllocationFailure { cells: u64 },
    #[error("slot {slot} is already empty")]
    AlreadyDestroyed { slot: usize },
}

impl MatrixError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        MatrixError::Io {
            op,
            path: path.into(),
            cause: IoCause::classify(&source),
            source,
        }
    }

    /// Stable identifier used in machine-readable reports.
    pub fn code(&self) -> &'static str {
        match self {
            MatrixError::InvalidArgument(_) => "invalid_argument",
            MatrixError::NotFound { .. } => "not_found",
            MatrixError::DimensionMismatch { .. } => "dimension_mismatch",
            MatrixError::Io { .. } => "io_error",
            MatrixError::TruncatedFile { .. } => "truncated_file",
            MatrixError::AllocationFailure { .. } => "allocation_failure",
            MatrixError::AlreadyDestroyed { .. } => "already_destroyed",
        }
    }
}

pub type Result<T, E = MatrixError> = std::result::Result<T, E>;
