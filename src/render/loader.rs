//! Sample enumeration and loading.
//!
//! Evaluation outputs arrive in three formats: single-channel PNG images,
//! raw `.npy` arrays, and `.npz` archives holding one array. Everything is
//! loaded into a single-channel `f32` buffer in the unit range.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use imgref::ImgVec;

use crate::error::{Error, Result};
use crate::render::npy::parse_npy;

/// File extensions recognized as per-sample data.
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["png", "npy", "npz"];

/// How to map raw pixel values into the unit range.
///
/// The upstream arrays are either already in `[0, 1]` or raw `[0, 255]`.
/// `Auto` keeps the historical heuristic: divide by 255 whenever the
/// observed maximum exceeds 1.0. That heuristic cannot distinguish a
/// low-contrast raw image from a normalized one, so callers that know the
/// format can force it with `Unit` or `EightBit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PixelScale {
    /// Rescale by 1/255 iff the sample's maximum value exceeds 1.0.
    #[default]
    Auto,

    /// Values are already in `[0, 1]`; leave them untouched.
    Unit,

    /// Values are raw 8-bit; always rescale by 1/255.
    EightBit,
}

impl PixelScale {
    fn apply(self, data: &mut [f32]) {
        let rescale = match self {
            Self::Unit => false,
            Self::EightBit => true,
            Self::Auto => data.iter().copied().fold(0.0_f32, f32::max) > 1.0,
        };
        if rescale {
            for value in data {
                *value /= 255.0;
            }
        }
    }
}

/// List recognized sample files in `dir`, sorted by filename.
///
/// Filename order is load-bearing: pairing across folders is positional, so
/// upstream filenames must be zero-padded consistently. That is an assumption
/// about the producer, not something this crate can enforce.
pub fn list_sample_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let recognized = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| {
                RECOGNIZED_EXTENSIONS
                    .iter()
                    .any(|r| ext.eq_ignore_ascii_case(r))
            });
        if recognized {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Load one sample into a unit-range grayscale buffer.
///
/// Array containers yield their first stored array; a leading singleton axis
/// is dropped, and the result must be 2-D. PNGs are decoded to 8-bit
/// grayscale.
pub fn load_sample(path: &Path, scale: PixelScale) -> Result<ImgVec<f32>> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let mut array = match ext.as_str() {
        "npy" => {
            let bytes = fs::read(path)?;
            parse_npy(&bytes, path)?
        }
        "npz" => {
            let bytes = first_npz_member(path)?;
            parse_npy(&bytes, path)?
        }
        "png" => {
            let img = image::open(path)
                .map_err(|e| Error::ImageLoad {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
                .to_luma8();
            let (width, height) = img.dimensions();
            return Ok(finish_image(
                img.into_raw().into_iter().map(f32::from).collect(),
                width as usize,
                height as usize,
                scale,
            ));
        }
        other => {
            return Err(Error::ImageLoad {
                path: path.to_path_buf(),
                reason: format!("unrecognized sample format `{other}`"),
            })
        }
    };

    array.squeeze_leading();
    if array.shape.len() != 2 {
        return Err(Error::ArrayLoad {
            path: path.to_path_buf(),
            reason: format!("expected a 2-D array, got shape {:?}", array.shape),
        });
    }
    // imgref panics on zero-sized buffers, so reject degenerate shapes here.
    if array.shape.contains(&0) {
        return Err(Error::ArrayLoad {
            path: path.to_path_buf(),
            reason: format!("array has a zero dimension: shape {:?}", array.shape),
        });
    }

    let (height, width) = (array.shape[0], array.shape[1]);
    Ok(finish_image(array.data, width, height, scale))
}

fn finish_image(mut data: Vec<f32>, width: usize, height: usize, scale: PixelScale) -> ImgVec<f32> {
    scale.apply(&mut data);
    ImgVec::new(data, width, height)
}

/// Read the bytes of the first stored member of an NPZ (zip) archive.
fn first_npz_member(path: &Path) -> Result<Vec<u8>> {
    let fail = |reason: String| Error::ArrayLoad {
        path: path.to_path_buf(),
        reason,
    };

    let file = fs::File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| fail(format!("not a zip archive: {e}")))?;
    if archive.is_empty() {
        return Err(fail("archive holds no members".to_string()));
    }
    let mut member = archive
        .by_index(0)
        .map_err(|e| fail(format!("cannot read first member: {e}")))?;
    let mut bytes = Vec::new();
    member
        .read_to_end(&mut bytes)
        .map_err(|e| fail(format!("cannot read first member: {e}")))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::npy::encode_npy_f32;
    use image::{GrayImage, Luma};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_npy(dir: &Path, name: &str, shape: &[usize], data: &[f32]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, encode_npy_f32(shape, data)).unwrap();
        path
    }

    fn write_npz(dir: &Path, name: &str, shape: &[usize], data: &[f32]) -> PathBuf {
        let path = dir.join(name);
        let file = fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("arr_0.npy", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(&encode_npy_f32(shape, data)).unwrap();
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_list_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        for name in ["002.npy", "000.png", "001.npz", "notes.txt"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }
        fs::create_dir(tmp.path().join("sub.png")).unwrap();

        let files: Vec<String> = list_sample_files(tmp.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(files, vec!["000.png", "001.npz", "002.npy"]);
    }

    #[test]
    fn test_load_npy_unit_range_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = write_npy(tmp.path(), "a.npy", &[2, 2], &[0.0, 0.25, 0.5, 1.0]);
        let img = load_sample(&path, PixelScale::Auto).unwrap();
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 2);
        assert_eq!(img.buf(), &[0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn test_load_npy_auto_rescales_8bit_values() {
        let tmp = TempDir::new().unwrap();
        let path = write_npy(tmp.path(), "a.npy", &[1, 2], &[0.0, 255.0]);
        let img = load_sample(&path, PixelScale::Auto).unwrap();
        assert_eq!(img.buf(), &[0.0, 1.0]);
    }

    #[test]
    fn test_scale_overrides_beat_the_heuristic() {
        let tmp = TempDir::new().unwrap();
        // Max > 1 but declared unit-range: left untouched.
        let path = write_npy(tmp.path(), "a.npy", &[1, 2], &[0.0, 2.0]);
        let img = load_sample(&path, PixelScale::Unit).unwrap();
        assert_eq!(img.buf(), &[0.0, 2.0]);

        // Max <= 1 but declared 8-bit: still divided.
        let path = write_npy(tmp.path(), "b.npy", &[1, 2], &[0.0, 1.0]);
        let img = load_sample(&path, PixelScale::EightBit).unwrap();
        assert_eq!(img.buf(), &[0.0, 1.0 / 255.0]);
    }

    #[test]
    fn test_load_npy_squeezes_leading_singleton() {
        let tmp = TempDir::new().unwrap();
        let path = write_npy(tmp.path(), "a.npy", &[1, 2, 3], &[0.1; 6]);
        let img = load_sample(&path, PixelScale::Auto).unwrap();
        assert_eq!(img.width(), 3);
        assert_eq!(img.height(), 2);
    }

    #[test]
    fn test_load_rejects_zero_dimension() {
        let tmp = TempDir::new().unwrap();
        let path = write_npy(tmp.path(), "a.npy", &[2, 0], &[]);
        let err = load_sample(&path, PixelScale::Auto).unwrap_err();
        assert!(matches!(err, crate::error::Error::ArrayLoad { .. }));

        let path = write_npy(tmp.path(), "b.npy", &[0, 3], &[]);
        assert!(load_sample(&path, PixelScale::Auto).is_err());
    }

    #[test]
    fn test_load_rejects_higher_rank() {
        let tmp = TempDir::new().unwrap();
        let path = write_npy(tmp.path(), "a.npy", &[2, 2, 3], &[0.1; 12]);
        assert!(load_sample(&path, PixelScale::Auto).is_err());
    }

    #[test]
    fn test_load_npz_first_member() {
        let tmp = TempDir::new().unwrap();
        let path = write_npz(tmp.path(), "a.npz", &[2, 2], &[0.1, 0.2, 0.3, 0.4]);
        let img = load_sample(&path, PixelScale::Auto).unwrap();
        assert_eq!(img.buf(), &[0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_load_png_grayscale() {
        let tmp = TempDir::new().unwrap();
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, Luma([0]));
        img.put_pixel(1, 0, Luma([255]));
        let path = tmp.path().join("a.png");
        img.save(&path).unwrap();

        let loaded = load_sample(&path, PixelScale::Auto).unwrap();
        assert_eq!(loaded.buf(), &[0.0, 1.0]);
    }

    #[test]
    fn test_load_unrecognized_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, b"x").unwrap();
        assert!(load_sample(&path, PixelScale::Auto).is_err());
    }
}
