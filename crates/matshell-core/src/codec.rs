//! Matrix file format.
//!
//! ```text
//! name_length: u32 LE   strlen(name) + 1
//! name_bytes:  [u8]     name text followed by a NUL terminator
//! rows:        u32 LE
//! cols:        u32 LE
//! data:        rows * cols * u32 LE, row-major
//! sentinel:    u8       0xFF, written but never required on read
//! ```
//!
//! Decoding is strictly sequential so it works over any [`Read`].

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use matshell_contracts::{MATRIX_FILE_SENTINEL, MATRIX_FILE_WORD, MATRIX_NAME_CAPACITY};

use crate::error::{InvalidArgument, MatrixError, Result};
use crate::matrix::{Matrix, MatrixName};

const READ_CHUNK: usize = 64 * 1024;

/// Exact size of the encoded form of `m`.
pub fn encoded_len(m: &Matrix) -> usize {
    MATRIX_FILE_WORD
        + m.name().stored_len()
        + 2 * MATRIX_FILE_WORD
        + m.cells().len() * MATRIX_FILE_WORD
        + 1
}

/// Encodes `m` into a freshly allocated buffer of exactly [`encoded_len`] bytes.
pub fn encode(m: &Matrix) -> Result<Vec<u8>> {
    let mut w = FieldWriter::with_exact_capacity(encoded_len(m), m.cells().len())?;
    let name = m.name();
    w.put_u32(name.stored_len() as u32);
    w.put_bytes(name.as_str().as_bytes());
    w.put_u8(0);
    w.put_u32(m.rows());
    w.put_u32(m.cols());
    for &cell in m.cells() {
        w.put_u32(cell);
    }
    w.put_u8(MATRIX_FILE_SENTINEL);
    Ok(w.finish())
}

/// Creates or truncates `path` and writes the encoded matrix in one call.
///
/// Returns the number of bytes written.
pub fn write_to_path(m: &Matrix, path: &Path) -> Result<usize> {
    let bytes = encode(m)?;
    let mut file = File::create(path).map_err(|e| MatrixError::io("create", path, e))?;
    file.write_all(&bytes)
        .map_err(|e| MatrixError::io("write", path, e))?;
    file.sync_all()
        .map_err(|e| MatrixError::io("sync", path, e))?;
    tracing::info!(
        name = %m.name(),
        path = %path.display(),
        bytes = bytes.len(),
        "matrix written"
    );
    Ok(bytes.len())
}

pub fn decode_from_path(path: &Path) -> Result<Matrix> {
    let file = File::open(path).map_err(|e| MatrixError::io("open", path, e))?;
    let m = decode_from(BufReader::new(file), path)?;
    tracing::info!(
        name = %m.name(),
        path = %path.display(),
        rows = m.rows(),
        cols = m.cols(),
        "matrix read"
    );
    Ok(m)
}

/// Decodes one matrix from the front of `reader`. Trailing bytes, including
/// the sentinel, are left unread.
pub fn decode<R: Read>(reader: R) -> Result<Matrix> {
    decode_from(reader, Path::new("<stream>"))
}

fn decode_from<R: Read>(reader: R, origin: &Path) -> Result<Matrix> {
    let mut r = FieldReader::new(reader, origin);

    let name_len = r.read_u32("name_length")? as usize;
    if name_len == 0 {
        return Err(InvalidArgument::EmptyName.into());
    }
    if name_len > MATRIX_NAME_CAPACITY {
        return Err(InvalidArgument::NameTooLong {
            len: name_len - 1,
            max: MATRIX_NAME_CAPACITY - 1,
        }
        .into());
    }
    let mut name_buf = [0u8; MATRIX_NAME_CAPACITY];
    r.read_exact_field(&mut name_buf[..name_len], "name")?;
    let name = MatrixName::from_stored_bytes(&name_buf[..name_len])?;

    let rows = r.read_u32("rows")?;
    let cols = r.read_u32("cols")?;
    let cells = r.read_cells(u64::from(rows) * u64::from(cols), "data")?;

    tracing::debug!(
        name = %name,
        rows,
        cols,
        consumed = r.consumed(),
        "matrix decoded"
    );
    Matrix::from_parts(name, rows, cols, cells)
}

/// Appends typed little-endian fields to a pre-sized buffer.
struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    fn with_exact_capacity(len: usize, cells: usize) -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| MatrixError::AllocationFailure {
                cells: cells as u64,
            })?;
        Ok(Self { buf })
    }

    fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads typed fields in order, reporting short reads per field.
struct FieldReader<R> {
    inner: R,
    origin: PathBuf,
    consumed: u64,
}

impl<R: Read> FieldReader<R> {
    fn new(inner: R, origin: &Path) -> Self {
        Self {
            inner,
            origin: origin.to_path_buf(),
            consumed: 0,
        }
    }

    fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Reads until `buf` is full or the stream ends; returns the byte count.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut off = 0usize;
        while off < buf.len() {
            match self.inner.read(&mut buf[off..]) {
                Ok(0) => break,
                Ok(n) => off += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(MatrixError::io("read", &self.origin, e)),
            }
        }
        self.consumed += off as u64;
        Ok(off)
    }

    fn read_exact_field(&mut self, buf: &mut [u8], field: &'static str) -> Result<()> {
        let got = self.fill(buf)?;
        if got < buf.len() {
            return Err(MatrixError::TruncatedFile {
                field,
                expected: buf.len() as u64,
                got: got as u64,
            });
        }
        Ok(())
    }

    fn read_u32(&mut self, field: &'static str) -> Result<u32> {
        let mut word = [0u8; MATRIX_FILE_WORD];
        self.read_exact_field(&mut word, field)?;
        Ok(u32::from_le_bytes(word))
    }

    /// Reads `count` cells in bounded chunks so a corrupt header cannot force
    /// an allocation larger than the bytes actually present.
    fn read_cells(&mut self, count: u64, field: &'static str) -> Result<Vec<u32>> {
        const CHUNK_CELLS: u64 = (READ_CHUNK / MATRIX_FILE_WORD) as u64;
        let word = MATRIX_FILE_WORD as u64;
        let mut cells = Vec::new();
        let mut chunk = vec![0u8; (count.min(CHUNK_CELLS) * word) as usize];
        let mut remaining = count;
        let mut got = 0u64;
        while remaining > 0 {
            let want = (remaining.min(CHUNK_CELLS) * word) as usize;
            let n = self.fill(&mut chunk[..want])?;
            got += n as u64;
            if n < want {
                return Err(MatrixError::TruncatedFile {
                    field,
                    expected: count.saturating_mul(word),
                    got,
                });
            }
            remaining -= (want / MATRIX_FILE_WORD) as u64;
            cells
                .try_reserve(want / MATRIX_FILE_WORD)
                .map_err(|_| MatrixError::AllocationFailure { cells: count })?;
            cells.extend(
                chunk[..want]
                    .chunks_exact(MATRIX_FILE_WORD)
                    .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]])),
            );
        }
        Ok(cells)
    }
}
