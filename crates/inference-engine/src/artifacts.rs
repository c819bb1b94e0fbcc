//! Persisted Model Artifacts
//!
//! Each artifact is a postcard blob prefixed by an [`ArtifactHeader`]. The
//! header is decoded on its own first so a format change is reported as a
//! version mismatch rather than a decode failure.

use crate::classifier::LogisticRegression;
use crate::scaler::StandardScaler;
use crate::ArtifactError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

/// What a blob contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Scaler,
    Classifier,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactHeader {
    version: u32,
    kind: ArtifactKind,
}

/// A fitted component that can be written to disk
pub trait Artifact: Serialize + DeserializeOwned {
    const KIND: ArtifactKind;

    /// Reject decoded values the component could never have been fitted to
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Artifact for StandardScaler {
    const KIND: ArtifactKind = ArtifactKind::Scaler;

    fn validate(&self) -> Result<(), String> {
        let width = self.n_features();
        if self.mean().len() != width || self.scale().len() != width {
            return Err(format!(
                "{} names, {} means, {} scales",
                width,
                self.mean().len(),
                self.scale().len()
            ));
        }
        if let Some((i, m)) = self.mean().iter().enumerate().find(|(_, m)| !m.is_finite()) {
            return Err(format!("mean[{i}] is {m}"));
        }
        if let Some((i, s)) = self
            .scale()
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && **s > 0.0))
        {
            return Err(format!("scale[{i}] is {s}"));
        }
        Ok(())
    }
}

impl Artifact for LogisticRegression {
    const KIND: ArtifactKind = ArtifactKind::Classifier;

    fn validate(&self) -> Result<(), String> {
        if let Some((i, w)) = self.weights().iter().enumerate().find(|(_, w)| !w.is_finite()) {
            return Err(format!("weight[{i}] is {w}"));
        }
        if !self.intercept().is_finite() {
            return Err(format!("intercept is {}", self.intercept()));
        }
        Ok(())
    }
}

/// Locations of the two persisted blobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub scaler: PathBuf,
    pub model: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside a directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            scaler: dir.join("scaler.bin"),
            model: dir.join("model.bin"),
        }
    }
}

/// Serialize an artifact to `path`, replacing any previous file atomically
pub fn save_artifact<T: Artifact>(artifact: &T, path: &Path) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    };

    let header = ArtifactHeader {
        version: FORMAT_VERSION,
        kind: T::KIND,
    };
    let mut bytes = postcard::to_allocvec(&header).map_err(ArtifactError::Encode)?;
    bytes.extend(postcard::to_allocvec(artifact).map_err(ArtifactError::Encode)?);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, &bytes).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;

    info!("Saved {:?} artifact to {} ({} bytes)", T::KIND, path.display(), bytes.len());
    Ok(())
}

/// Read an artifact written by [`save_artifact`]
pub fn load_artifact<T: Artifact>(path: &Path) -> Result<T, ArtifactError> {
    let display = path.display().to_string();
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ArtifactError::Missing(display.clone()),
        _ => ArtifactError::Io {
            path: display.clone(),
            source,
        },
    })?;

    let decode = |source| ArtifactError::Decode {
        path: display.clone(),
        source,
    };
    let (header, payload) = postcard::take_from_bytes::<ArtifactHeader>(&bytes).map_err(decode)?;
    if header.version != FORMAT_VERSION {
        return Err(ArtifactError::Version {
            path: display.clone(),
            found: header.version,
            expected: FORMAT_VERSION,
        });
    }
    if header.kind != T::KIND {
        return Err(ArtifactError::WrongKind {
            path: display.clone(),
            found: header.kind,
            expected: T::KIND,
        });
    }

    let artifact: T = postcard::from_bytes(payload).map_err(decode)?;
    artifact.validate().map_err(|reason| ArtifactError::Invalid {
        path: display.clone(),
        reason,
    })?;
    debug!("Loaded {:?} artifact from {}", T::KIND, path.display());
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler() -> StandardScaler {
        StandardScaler::from_parts(
            vec!["Age".into(), "BMI".into()],
            vec![40.0, 24.0],
            vec![12.0, 3.5],
        )
        .unwrap()
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path().join("nested"));

        save_artifact(&scaler(), &paths.scaler).unwrap();
        let model = LogisticRegression::new(vec![0.3, -0.7], 0.1);
        save_artifact(&model, &paths.model).unwrap();

        assert_eq!(load_artifact::<StandardScaler>(&paths.scaler).unwrap(), scaler());
        assert_eq!(load_artifact::<LogisticRegression>(&paths.model).unwrap(), model);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_artifact::<StandardScaler>(&dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing(_)));
    }

    #[test]
    fn test_wrong_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.bin");
        save_artifact(&scaler(), &path).unwrap();
        let err = load_artifact::<LogisticRegression>(&path).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::WrongKind {
                found: ArtifactKind::Scaler,
                expected: ArtifactKind::Classifier,
                ..
            }
        ));
    }

    #[test]
    fn test_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let header = ArtifactHeader {
            version: FORMAT_VERSION + 1,
            kind: ArtifactKind::Classifier,
        };
        fs::write(&path, postcard::to_allocvec(&header).unwrap()).unwrap();
        let err = load_artifact::<LogisticRegression>(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Version { found: 2, expected: 1, .. }));
    }

    #[test]
    fn test_zero_scale_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.bin");
        let zero: StandardScaler = serde_json::from_value(serde_json::json!({
            "feature_names": ["Age", "BMI"],
            "mean": [40.0, 24.0],
            "scale": [12.0, 0.0],
        }))
        .unwrap();
        save_artifact(&zero, &path).unwrap();

        let err = load_artifact::<StandardScaler>(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid { ref reason, .. } if reason.starts_with("scale[1]")));
    }

    #[test]
    fn test_non_finite_weight_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        save_artifact(&LogisticRegression::new(vec![0.2, f64::NAN], 0.0), &path).unwrap();
        assert!(matches!(
            load_artifact::<LogisticRegression>(&path),
            Err(ArtifactError::Invalid { .. })
        ));

        save_artifact(&LogisticRegression::new(vec![0.2, 0.1], f64::INFINITY), &path).unwrap();
        assert!(matches!(
            load_artifact::<LogisticRegression>(&path),
            Err(ArtifactError::Invalid { .. })
        ));
    }

    #[test]
    fn test_corrupt_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, [0xFFu8; 3]).unwrap();
        let err = load_artifact::<LogisticRegression>(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Decode { .. }));
    }
}
