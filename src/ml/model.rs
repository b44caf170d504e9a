use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ModelError;

/// Header that distinguishes a real model from a placeholder asset.
pub const MODEL_MAGIC: [u8; 4] = *b"TFL3";

pub fn has_model_magic(blob: &[u8]) -> bool {
    blob.len() >= MODEL_MAGIC.len() && blob[..MODEL_MAGIC.len()] == MODEL_MAGIC
}

/// Read a model asset and reject placeholders.
pub fn load_model_blob(path: &Path) -> Result<Vec<u8>, ModelError> {
    let blob = fs::read(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ModelError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            ModelError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    if !has_model_magic(&blob) {
        return Err(ModelError::Placeholder {
            path: path.to_path_buf(),
        });
    }
    Ok(blob)
}

/// Dense `batch x channels x size x size` tensor of one byte per element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorShape {
    pub batch: usize,
    pub channels: usize,
    pub size: usize,
}

impl TensorShape {
    pub fn bytes(&self) -> usize {
        self.batch * self.channels * self.size * self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn unique_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "fluidsim_model_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn magic_requires_four_bytes() {
        assert!(has_model_magic(b"TFL3\x00\x01"));
        assert!(!has_model_magic(b"TFL"));
        assert!(!has_model_magic(b"PLACEHOLDER"));
        assert!(!has_model_magic(b""));
    }

    #[test]
    fn missing_asset_is_reported_as_missing() {
        let path = unique_path("missing.tflite");
        let err = load_model_blob(&path).unwrap_err();
        assert!(matches!(err, ModelError::Missing { .. }), "{err}");
    }

    #[test]
    fn placeholder_asset_is_rejected() {
        let path = unique_path("placeholder.tflite");
        fs::write(&path, b"# model goes here\n").unwrap();
        let err = load_model_blob(&path).unwrap_err();
        assert!(matches!(err, ModelError::Placeholder { .. }), "{err}");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn real_header_loads() {
        let path = unique_path("model.tflite");
        fs::write(&path, b"TFL3rest-of-model").unwrap();
        let blob = load_model_blob(&path).expect("valid model");
        assert_eq!(blob.len(), 17);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn tensor_bytes() {
        let shape = TensorShape {
            batch: 1,
            channels: 7,
            size: 256,
        };
        assert_eq!(shape.bytes(), 7 * 256 * 256);
    }
}
