//! The file format from spec.md §6: a fixed 13-byte header followed by
//! `nrows` rows, each row `ceil(ncols / 8)` bytes, MSB-first per byte, with
//! the trailing bits of the last byte zero. No serde — a fixed-layout
//! 13-byte header doesn't need a serialization framework, the same call the
//! pack's other small binary-format readers make.

use std::io::{Read, Write};

use gf2_core::matrix::{Mat, MatRef};

const MAGIC: [u8; 4] = *b"GF2\0";
const VERSION: u8 = 1;

/// Failure modes for [`read`]/[`write`]. Kept separate from [`std::io::Error`]
/// so a bad magic/version is distinguishable from a short read without
/// inspecting `io::Error`'s kind.
#[derive(Debug)]
pub enum Gf2IoError {
    Io(std::io::Error),
    BadMagic([u8; 4]),
    UnsupportedVersion(u8),
}

impl std::fmt::Display for Gf2IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gf2IoError::Io(e) => write!(f, "i/o error: {e}"),
            Gf2IoError::BadMagic(m) => write!(f, "bad magic: {m:02x?}"),
            Gf2IoError::UnsupportedVersion(v) => write!(f, "unsupported version: {v}"),
        }
    }
}

impl std::error::Error for Gf2IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Gf2IoError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Gf2IoError {
    fn from(e: std::io::Error) -> Self {
        Gf2IoError::Io(e)
    }
}

/// Writes `m` in the spec.md §6 format: header then `nrows` packed rows.
pub fn write<W: Write>(mut w: W, m: MatRef<'_>) -> Result<(), Gf2IoError> {
    w.write_all(&MAGIC)?;
    w.write_all(&[VERSION])?;
    w.write_all(&(m.nrows() as u64).to_be_bytes())?;
    w.write_all(&(m.ncols() as u64).to_be_bytes())?;

    let row_bytes = (m.ncols() + 7) / 8;
    let mut buf = vec![0u8; row_bytes];
    for i in 0..m.nrows() {
        buf.iter_mut().for_each(|b| *b = 0);
        for j in 0..m.ncols() {
            if m.get(i, j) {
                buf[j / 8] |= 0x80 >> (j % 8);
            }
        }
        w.write_all(&buf)?;
    }
    Ok(())
}

/// Reads a matrix written by [`write`]. Rejects any magic other than
/// `"GF2\0"` or a version other than the one this crate writes.
pub fn read<R: Read>(mut r: R) -> Result<Mat, Gf2IoError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(Gf2IoError::BadMagic(magic));
    }

    let mut version = [0u8; 1];
    r.read_exact(&mut version)?;
    if version[0] != VERSION {
        return Err(Gf2IoError::UnsupportedVersion(version[0]));
    }

    let mut dims = [0u8; 16];
    r.read_exact(&mut dims)?;
    let nrows = u64::from_be_bytes(dims[0..8].try_into().unwrap()) as usize;
    let ncols = u64::from_be_bytes(dims[8..16].try_into().unwrap()) as usize;

    let mut out = Mat::zeros(nrows, ncols);
    let mut view = out.as_mut();
    let row_bytes = (ncols + 7) / 8;
    let mut buf = vec![0u8; row_bytes];
    for i in 0..nrows {
        r.read_exact(&mut buf)?;
        for j in 0..ncols {
            if buf[j / 8] & (0x80 >> (j % 8)) != 0 {
                view.set(i, j, true);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn round_trips_through_bytes() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut m = Mat::zeros(5, 13);
        let mut view = m.as_mut();
        for i in 0..5 {
            for j in 0..13 {
                if rng.gen_bool(0.4) {
                    view.set(i, j, true);
                }
            }
        }

        let mut buf = Vec::new();
        write(&mut buf, m.as_ref()).unwrap();
        let back = read(&buf[..]).unwrap();
        assert!(back == m);
    }

    #[test]
    fn trailing_bits_are_zero() {
        let m = Mat::set_ui(2, 3, 1);
        let mut buf = Vec::new();
        write(&mut buf, m.as_ref()).unwrap();
        // header (13 bytes) + 2 rows of ceil(3/8)=1 byte each.
        assert!(buf.len() == 13 + 2);
        let last_byte = buf[buf.len() - 1];
        assert!(last_byte & 0b0001_1111 == 0);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = vec![0u8; 13];
        buf[0..4].copy_from_slice(b"nope");
        assert!(matches!(read(&buf[..]), Err(Gf2IoError::BadMagic(_))));
    }
}
