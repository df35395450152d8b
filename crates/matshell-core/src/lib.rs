//! Matrix registry, file codec, and command dispatcher behind `matshell`.
//!
//! - [`matrix`]: named `u32` grids and their element-wise operations.
//! - [`codec`]: the length-prefixed little-endian matrix file format.
//! - [`registry`]: the fixed-capacity ring of owned matrix slots.
//! - [`command`] / [`dispatch`]: parsing and running shell commands.

pub mod codec;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod matrix;
pub mod registry;

pub use command::{Command, CommandError, CommandKind};
pub use dispatch::{Diagnostic, Dispatcher, Outcome, ShellError};
pub use error::{InvalidArgument, IoCause, MatrixError};
pub use matrix::{Matrix, MatrixName, ShiftDirection};
pub use registry::{Insertion, Registry};
