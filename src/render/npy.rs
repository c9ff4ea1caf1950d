//! Minimal NPY container parsing.
//!
//! The upstream pipeline saves per-sample arrays as NumPy `.npy` files
//! (optionally zipped into `.npz`). We only ever read small 2-D grayscale
//! arrays, so the parser here handles exactly what the pipeline writes:
//! little-endian `f4`/`f8` and `u1` element types, C order, format versions
//! 1 and 2.

use std::path::Path;

use crate::error::{Error, Result};

const MAGIC: &[u8] = b"\x93NUMPY";

/// A parsed array: shape plus elements widened to `f32`.
#[derive(Debug, Clone)]
pub struct NpyArray {
    /// Dimension sizes, outermost first.
    pub shape: Vec<usize>,

    /// Elements in C (row-major) order.
    pub data: Vec<f32>,
}

impl NpyArray {
    /// Drop a leading singleton axis, e.g. `(1, H, W)` → `(H, W)`.
    pub fn squeeze_leading(&mut self) {
        if self.shape.len() > 1 && self.shape[0] == 1 {
            self.shape.remove(0);
        }
    }
}

/// Parse an NPY byte stream. `path` is used for error context only.
pub fn parse_npy(bytes: &[u8], path: &Path) -> Result<NpyArray> {
    let fail = |reason: String| Error::ArrayLoad {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err(fail("not an NPY file (bad magic)".to_string()));
    }

    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (
            u16::from_le_bytes([bytes[8], bytes[9]]) as usize,
            10,
        ),
        2 => {
            if bytes.len() < 12 {
                return Err(fail("truncated version 2 header".to_string()));
            }
            (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            )
        }
        other => return Err(fail(format!("unsupported NPY version {other}"))),
    };

    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err(fail("truncated header".to_string()));
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| fail("header is not valid UTF-8".to_string()))?;

    let descr = header_str_field(header, "descr")
        .ok_or_else(|| fail("header missing `descr`".to_string()))?;
    if header_bool_field(header, "fortran_order").unwrap_or(false) {
        return Err(fail("Fortran-order arrays are not supported".to_string()));
    }
    let shape = header_shape_field(header)
        .ok_or_else(|| fail("header missing or malformed `shape`".to_string()))?;

    // A hostile header can declare dimensions whose product overflows usize.
    let count = shape
        .iter()
        .try_fold(1_usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| fail(format!("shape {shape:?} overflows element count")))?;
    let byte_len = |width: usize| {
        count
            .checked_mul(width)
            .ok_or_else(|| fail(format!("shape {shape:?} overflows payload size")))
    };
    let payload = &bytes[data_start..];

    let data = match descr.as_str() {
        "<f4" => {
            let len = byte_len(4)?;
            if payload.len() < len {
                return Err(fail("truncated f4 payload".to_string()));
            }
            payload[..len]
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        }
        "<f8" => {
            let len = byte_len(8)?;
            if payload.len() < len {
                return Err(fail("truncated f8 payload".to_string()));
            }
            payload[..len]
                .chunks_exact(8)
                .map(|c| {
                    f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32
                })
                .collect()
        }
        "|u1" => {
            if payload.len() < count {
                return Err(fail("truncated u1 payload".to_string()));
            }
            payload[..count].iter().map(|&b| f32::from(b)).collect()
        }
        other => return Err(fail(format!("unsupported element type `{other}`"))),
    };

    Ok(NpyArray { shape, data })
}

/// Extract a quoted string value, e.g. `'descr': '<f4'`.
fn header_str_field(header: &str, key: &str) -> Option<String> {
    let rest = field_value(header, key)?;
    let quote = rest.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let rest = &rest[1..];
    let close = rest.find(quote)?;
    Some(rest[..close].to_string())
}

/// Extract a Python boolean value, e.g. `'fortran_order': False`.
fn header_bool_field(header: &str, key: &str) -> Option<bool> {
    let rest = field_value(header, key)?;
    if rest.starts_with("True") {
        Some(true)
    } else if rest.starts_with("False") {
        Some(false)
    } else {
        None
    }
}

/// Extract the shape tuple, e.g. `'shape': (1, 256, 256)` or `(10,)`.
fn header_shape_field(header: &str) -> Option<Vec<usize>> {
    let rest = field_value(header, "shape")?;
    let rest = rest.strip_prefix('(')?;
    let close = rest.find(')')?;
    let mut shape = Vec::new();
    for part in rest[..close].split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        shape.push(part.parse().ok()?);
    }
    Some(shape)
}

/// Position the cursor just past `'<key>':` with surrounding whitespace.
fn field_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("'{key}'");
    let at = header.find(&needle)?;
    let rest = header[at + needle.len()..].trim_start();
    Some(rest.strip_prefix(':')?.trim_start())
}

/// Serialize an `f4` array in NPY v1 format. Test fixture builder.
#[cfg(test)]
pub(crate) fn encode_npy_f32(shape: &[usize], data: &[f32]) -> Vec<u8> {
    let shape_str = match shape.len() {
        1 => format!("({},)", shape[0]),
        _ => format!(
            "({})",
            shape
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    let mut header = format!(
        "{{'descr': '<f4', 'fortran_order': False, 'shape': {shape_str}, }}"
    );
    // Pad so magic + prefix + header is a multiple of 64, newline-terminated.
    let unpadded = 10 + header.len() + 1;
    header.push_str(&" ".repeat(unpadded.div_ceil(64) * 64 - unpadded));
    header.push('\n');

    let mut bytes = Vec::new();
    bytes.extend_from_slice(MAGIC);
    bytes.push(1);
    bytes.push(0);
    bytes.extend_from_slice(&u16::try_from(header.len()).unwrap().to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    for value in data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}
