//! Named rows x cols grids of `u32` cells and their element-wise operations.
//!
//! A [`Matrix`] owns its cell buffer. Destroying one consumes the value, so a
//! released matrix cannot be touched again; the registry models an emptied
//! slot as `None`.

use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use matshell_contracts::MATRIX_NAME_MAX_LEN;
use rand::Rng;
use serde::Serialize;

use crate::error::{InvalidArgument, MatrixError, Result};

/// Validated matrix name: non-empty, at most [`MATRIX_NAME_MAX_LEN`] bytes,
/// free of NUL bytes, and usable as a single file name inside the data dir.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MatrixName(String);

impl MatrixName {
    pub fn new(name: &str) -> Result<Self, InvalidArgument> {
        if name.is_empty() {
            return Err(InvalidArgument::EmptyName);
        }
        if name.len() > MATRIX_NAME_MAX_LEN {
            return Err(InvalidArgument::NameTooLong {
                len: name.len(),
                max: MATRIX_NAME_MAX_LEN,
            });
        }
        if name.contains('\0') {
            return Err(InvalidArgument::NameHasNul);
        }
        if !is_plain_file_name(name) {
            return Err(InvalidArgument::NameNotFileSafe(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// Decodes stored name bytes, dropping the trailing terminator if present.
    pub fn from_stored_bytes(bytes: &[u8]) -> Result<Self, InvalidArgument> {
        let text = match bytes.iter().position(|&b| b == 0) {
            Some(end) => &bytes[..end],
            None => bytes,
        };
        let text = std::str::from_utf8(text).map_err(|_| InvalidArgument::NameNotUtf8)?;
        Self::new(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length as stored on disk: the name text plus its terminator.
    pub fn stored_len(&self) -> usize {
        self.0.len() + 1
    }
}

/// `write` stores a matrix under its own name, so the name must be exactly
/// one normal path component on every platform.
fn is_plain_file_name(name: &str) -> bool {
    if name.contains(|c: char| c == '/' || c == '\\') {
        return false;
    }
    let mut parts = Path::new(name).components();
    matches!(
        (parts.next(), parts.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl fmt::Display for MatrixName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for MatrixName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftDirection {
    Left,
    Right,
}

impl ShiftDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftDirection::Left => "left",
            ShiftDirection::Right => "right",
        }
    }
}

impl fmt::Display for ShiftDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftDirection {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l" | "left" => Ok(ShiftDirection::Left),
            "r" | "right" => Ok(ShiftDirection::Right),
            _ => Err(InvalidArgument::InvalidDirection(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    name: MatrixName,
    rows: u32,
    cols: u32,
    data: Vec<u32>,
}

impl Matrix {
    /// Allocates a zero-filled `rows` x `cols` matrix.
    ///
    /// Zero dimensions produce an empty degenerate matrix.
    pub fn new(name: &str, rows: u32, cols: u32) -> Result<Self> {
        let name = MatrixName::new(name)?;
        let cells = cell_count(rows, cols)?;
        let mut data = Vec::new();
        data.try_reserve_exact(cells)
            .map_err(|_| MatrixError::AllocationFailure {
                cells: u64::from(rows) * u64::from(cols),
            })?;
        data.resize(cells, 0);
        Ok(Self {
            name,
            rows,
            cols,
            data,
        })
    }

    /// Builds a matrix around an existing row-major cell buffer.
    pub fn from_parts(name: MatrixName, rows: u32, cols: u32, data: Vec<u32>) -> Result<Self> {
        let cells = cell_count(rows, cols)?;
        if data.len() != cells {
            return Err(MatrixError::DimensionMismatch {
                left: (rows, cols),
                right: (1, u32::try_from(data.len()).unwrap_or(u32::MAX)),
            });
        }
        Ok(Self {
            name,
            rows,
            cols,
            data,
        })
    }

    pub fn name(&self) -> &MatrixName {
        &self.name
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn dims(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    /// Row-major cell values.
    pub fn cells(&self) -> &[u32] {
        &self.data
    }

    pub fn get(&self, row: u32, col: u32) -> Option<u32> {
        self.index(row, col).map(|i| self.data[i])
    }

    /// Writes one cell; returns `false` when the coordinates are out of bounds.
    pub fn set(&mut self, row: u32, col: u32, value: u32) -> bool {
        match self.index(row, col) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    fn index(&self, row: u32, col: u32) -> Option<usize> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(row as usize * self.cols as usize + col as usize)
    }

    /// Overwrites every cell with a value drawn uniformly from `[low, high]`.
    pub fn fill_random<R: Rng>(&mut self, rng: &mut R, low: u32, high: u32) -> Result<()> {
        if high < low {
            return Err(InvalidArgument::InvalidRange { low, high }.into());
        }
        for cell in self.data.iter_mut() {
            *cell = rng.gen_range(low..=high);
        }
        Ok(())
    }

    /// Logical shift of every cell; shifting by 32 or more clears it.
    pub fn shift(&mut self, direction: ShiftDirection, amount: u32) {
        for cell in self.data.iter_mut() {
            *cell = match direction {
                ShiftDirection::Left => cell.checked_shl(amount).unwrap_or(0),
                ShiftDirection::Right => cell.checked_shr(amount).unwrap_or(0),
            };
        }
    }

    /// Same dimensions and same cells in row-major order. Names are ignored.
    pub fn content_eq(&self, other: &Matrix) -> bool {
        self.dims() == other.dims() && self.data == other.data
    }

    /// Releases the cell buffer. Consuming `self` makes a second release
    /// impossible.
    pub fn destroy(self) {
        tracing::debug!(name = %self.name, cells = self.data.len(), "matrix destroyed");
    }
}

/// `out = a + b` cell by cell, wrapping on overflow.
///
/// All three matrices must share the same rows and the same cols. `out` is
/// left untouched on mismatch.
pub fn add(a: &Matrix, b: &Matrix, out: &mut Matrix) -> Result<()> {
    if a.dims() != b.dims() {
        return Err(MatrixError::DimensionMismatch {
            left: a.dims(),
            right: b.dims(),
        });
    }
    if out.dims() != a.dims() {
        return Err(MatrixError::DimensionMismatch {
            left: a.dims(),
            right: out.dims(),
        });
    }
    for ((dst, x), y) in out.data.iter_mut().zip(&a.data).zip(&b.data) {
        *dst = x.wrapping_add(*y);
    }
    Ok(())
}

/// Copies every cell of `src` into `dest`, which must already have the same
/// dimensions.
pub fn duplicate(src: &Matrix, dest: &mut Matrix) -> Result<()> {
    if src.dims() != dest.dims() {
        return Err(MatrixError::DimensionMismatch {
            left: src.dims(),
            right: dest.dims(),
        });
    }
    dest.data.copy_from_slice(&src.data);
    debug_assert!(src.content_eq(dest));
    Ok(())
}

fn cell_count(rows: u32, cols: u32) -> Result<usize> {
    let cells = u64::from(rows) * u64::from(cols);
    usize::try_from(cells).map_err(|_| MatrixError::AllocationFailure { cells })
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix Contents ({}):", self.name)?;
        writeln!(f, "DIM = ({},{})", self.rows, self.cols)?;
        if self.cols == 0 {
            return Ok(());
        }
        for row in self.data.chunks(self.cols as usize) {
            let line = row
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn filled(name: &str, rows: u32, cols: u32, value: u32) -> Matrix {
        let mut m = Matrix::new(name, rows, cols).unwrap();
        m.data.fill(value);
        m
    }

    #[test]
    fn new_matrix_is_zero_filled() {
        let m = Matrix::new("A", 3, 4).unwrap();
        assert_eq!(m.dims(), (3, 4));
        assert_eq!(m.cells().len(), 12);
        assert!(m.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn name_bound_counts_the_terminator() {
        let longest = "n".repeat(MATRIX_NAME_MAX_LEN);
        assert!(Matrix::new(&longest, 1, 1).is_ok());

        let too_long = "n".repeat(MATRIX_NAME_MAX_LEN + 1);
        let err = Matrix::new(&too_long, 1, 1).unwrap_err();
        assert!(matches!(
            err,
            MatrixError::InvalidArgument(InvalidArgument::NameTooLong { len: 50, max: 49 })
        ));
        assert!(matches!(
            Matrix::new("", 1, 1).unwrap_err(),
            MatrixError::InvalidArgument(InvalidArgument::EmptyName)
        ));
    }

    #[test]
    fn zero_dimensions_are_an_empty_matrix() {
        let m = Matrix::new("empty", 0, 7).unwrap();
        assert!(m.cells().is_empty());
        assert_eq!(m.to_string(), "Matrix Contents (empty):\nDIM = (0,7)\n");
        let z = Matrix::new("z", 4, 0).unwrap();
        assert_eq!(z.to_string(), "Matrix Contents (z):\nDIM = (4,0)\n");
    }

    #[test]
    fn names_with_nul_are_rejected() {
        assert_eq!(
            MatrixName::new("a\0b").unwrap_err(),
            InvalidArgument::NameHasNul
        );
        assert!(matches!(
            Matrix::new("\0", 1, 1),
            Err(MatrixError::InvalidArgument(InvalidArgument::NameHasNul))
        ));
    }

    #[test]
    fn names_must_be_a_single_file_name() {
        for bad in ["/tmp/esc", "../esc", "a/b", "a\\b", ".", "..", "dir/"] {
            assert_eq!(
                MatrixName::new(bad).unwrap_err(),
                InvalidArgument::NameNotFileSafe(bad.to_string()),
                "{bad:?}"
            );
        }
        for good in ["A", "temp_mat", "a.b", "..x", "m-1"] {
            assert!(MatrixName::new(good).is_ok(), "{good:?}");
        }
    }

    #[test]
    fn stored_name_bytes_drop_terminator() {
        let name = MatrixName::from_stored_bytes(b"mat\0").unwrap();
        assert_eq!(name.as_str(), "mat");
        assert_eq!(name.stored_len(), 4);
        assert_eq!(
            MatrixName::from_stored_bytes(b"\0").unwrap_err(),
            InvalidArgument::EmptyName
        );
        assert_eq!(
            MatrixName::from_stored_bytes(&[0xC3, 0x28, 0]).unwrap_err(),
            InvalidArgument::NameNotUtf8
        );
    }

    #[test]
    fn random_fill_stays_in_inclusive_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut m = Matrix::new("R", 8, 8).unwrap();
        m.fill_random(&mut rng, 1, 5).unwrap();
        assert!(m.cells().iter().all(|&c| (1..=5).contains(&c)));

        m.fill_random(&mut rng, 9, 9).unwrap();
        assert!(m.cells().iter().all(|&c| c == 9));
    }

    #[test]
    fn random_fill_rejects_inverted_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut m = filled("R", 2, 2, 3);
        let err = m.fill_random(&mut rng, 5, 1).unwrap_err();
        assert!(matches!(
            err,
            MatrixError::InvalidArgument(InvalidArgument::InvalidRange { low: 5, high: 1 })
        ));
        assert!(m.cells().iter().all(|&c| c == 3));
    }

    #[test]
    fn shift_uses_fixed_width_semantics() {
        let mut m = filled("S", 2, 2, 0xFFFF_FFFF);
        m.shift(ShiftDirection::Left, 4);
        assert!(m.cells().iter().all(|&c| c == 0xFFFF_FFF0));
        m.shift(ShiftDirection::Right, 4);
        assert!(m.cells().iter().all(|&c| c == 0x0FFF_FFFF));

        m.shift(ShiftDirection::Left, 32);
        assert!(m.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn direction_tokens() {
        assert_eq!("l".parse::<ShiftDirection>(), Ok(ShiftDirection::Left));
        assert_eq!("right".parse::<ShiftDirection>(), Ok(ShiftDirection::Right));
        assert_eq!(
            "up".parse::<ShiftDirection>(),
            Err(InvalidArgument::InvalidDirection("up".to_string()))
        );
        assert!("L".parse::<ShiftDirection>().is_err());
    }

    #[test]
    fn add_wraps_on_overflow() {
        let a = filled("A", 2, 3, u32::MAX);
        let b = filled("B", 2, 3, 2);
        let mut c = Matrix::new("C", 2, 3).unwrap();
        add(&a, &b, &mut c).unwrap();
        assert!(c.cells().iter().all(|&v| v == 1));
    }

    #[test]
    fn add_requires_both_dimensions_to_match() {
        let a = filled("A", 2, 3, 1);
        let b = filled("B", 3, 2, 1);
        let mut out = filled("C", 2, 3, 42);
        let err = add(&a, &b, &mut out).unwrap_err();
        assert!(matches!(
            err,
            MatrixError::DimensionMismatch {
                left: (2, 3),
                right: (3, 2)
            }
        ));
        assert!(out.cells().iter().all(|&v| v == 42));

        // Rows match, cols differ: still a mismatch.
        let b = filled("B", 2, 4, 1);
        assert!(add(&a, &b, &mut out).is_err());
        assert!(out.cells().iter().all(|&v| v == 42));
    }

    #[test]
    fn duplicate_copies_into_destination() {
        let mut src = Matrix::new("src", 2, 2).unwrap();
        assert!(src.set(0, 1, 9));
        assert!(src.set(1, 0, 4));
        assert!(!src.set(2, 0, 1));
        let mut dest = Matrix::new("dest", 2, 2).unwrap();
        duplicate(&src, &mut dest).unwrap();
        assert!(src.content_eq(&dest));
        assert_eq!(dest.get(0, 1), Some(9));
        assert_eq!(dest.name().as_str(), "dest");

        let mut wrong = Matrix::new("wrong", 1, 4).unwrap();
        assert!(duplicate(&src, &mut wrong).is_err());
    }

    #[test]
    fn content_eq_ignores_names_but_not_shape() {
        let a = filled("a", 1, 4, 5);
        let b = filled("b", 1, 4, 5);
        let c = filled("c", 4, 1, 5);
        assert!(a.content_eq(&b));
        assert!(!a.content_eq(&c));
        assert_ne!(a, b);
    }

    #[test]
    fn display_lists_rows() {
        let mut m = Matrix::new("D", 2, 2).unwrap();
        m.set(0, 0, 1);
        m.set(1, 1, 12);
        assert_eq!(
            m.to_string(),
            "Matrix Contents (D):\nDIM = (2,2)\n1 0\n0 12\n"
        );
    }

    #[test]
    fn from_parts_checks_buffer_length() {
        let name = MatrixName::new("p").unwrap();
        assert!(Matrix::from_parts(name.clone(), 2, 2, vec![1, 2, 3, 4]).is_ok());
        assert!(Matrix::from_parts(name, 2, 2, vec![1, 2, 3]).is_err());
    }
}
