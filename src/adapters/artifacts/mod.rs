//! Artifact adapter: loads the fitted scaler and classifier from disk.
//!
//! Artifacts are JSON exports of the fitted parameters, read once at startup
//! and immutable afterwards.
//!
//! # Integrity
//!
//! An optional `manifest.json` in the artifact directory binds file names to
//! SHA-256 digests:
//!
//! ```json
//! { "version": 1, "files": { "model.json": "<hex>", "scaler.json": "<hex>" } }
//! ```
//!
//! When present, both loaded artifacts must be listed and every listed file
//! must match its digest. When absent, loading proceeds with a warning unless
//! `require_manifest` is set.

mod scaler;
mod svm;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::ArtifactSettings;
use crate::domain::{ModelError, FEATURE_NAMES, N_FEATURES};
use crate::ports::{Classifier, FeatureScaler};

pub use scaler::{MinMaxScaler, ScalerArtifact, StandardScaler};
pub use svm::{Kernel, KernelSvc, LinearSvc, PlattParams, SvmClassifier};

/// Name of the optional integrity manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("Scaler and classifier disagree: {0}")]
    Mismatch(String),

    #[error("Integrity check failed: {0}")]
    Integrity(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Build a manifest for files in `dir`, hashing their current contents.
    ///
    /// # Errors
    /// Returns `ArtifactError::Io` if a file cannot be read.
    pub fn for_files(dir: &Path, names: &[&str]) -> Result<Self, ArtifactError> {
        let mut files = BTreeMap::new();
        for name in names {
            let path = dir.join(name);
            let bytes = read_bytes(&path)?;
            files.insert((*name).to_string(), sha256_hex(&bytes));
        }
        Ok(Self { version: 1, files })
    }
}

/// The fitted scaler and classifier, loaded together.
///
/// Constructed once at process start and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct TriageArtifacts {
    pub classifier: Arc<SvmClassifier>,
    pub scaler: Arc<ScalerArtifact>,
    /// Whether a manifest was present and verified.
    pub verified: bool,
}

impl TriageArtifacts {
    /// Load and cross-check both artifacts.
    ///
    /// # Errors
    /// Returns error if either file is missing or corrupt, if the manifest
    /// check fails, or if the two artifacts do not describe the same features.
    pub fn load(settings: &ArtifactSettings) -> Result<Self, ArtifactError> {
        let manifest = read_manifest(settings)?;
        let model_bytes = read_bytes(&settings.model_path())?;
        let scaler_bytes = read_bytes(&settings.scaler_path())?;

        // Digests are checked against the same buffers that get parsed.
        let verified = match &manifest {
            Some(manifest) => {
                verify_manifest(
                    &settings.dir,
                    manifest,
                    &[
                        (settings.model_file.as_str(), model_bytes.as_slice()),
                        (settings.scaler_file.as_str(), scaler_bytes.as_slice()),
                    ],
                )?;
                true
            }
            None => false,
        };

        Self::parse(settings, &model_bytes, &scaler_bytes, verified)
    }

    /// Load and cross-check both artifacts, ignoring any manifest.
    ///
    /// Used when (re)generating the manifest itself.
    ///
    /// # Errors
    /// Same as [`TriageArtifacts::load`], minus the integrity check.
    pub fn load_unverified(settings: &ArtifactSettings) -> Result<Self, ArtifactError> {
        let model_bytes = read_bytes(&settings.model_path())?;
        let scaler_bytes = read_bytes(&settings.scaler_path())?;
        Self::parse(settings, &model_bytes, &scaler_bytes, false)
    }

    fn parse(
        settings: &ArtifactSettings,
        model_bytes: &[u8],
        scaler_bytes: &[u8],
        verified: bool,
    ) -> Result<Self, ArtifactError> {
        let scaler_path = settings.scaler_path();
        let scaler: ScalerArtifact = parse_json(&scaler_path, scaler_bytes)?;
        scaler.validate().map_err(|source| ArtifactError::Invalid {
            path: scaler_path.clone(),
            source,
        })?;
        check_feature_names(&scaler_path, scaler.feature_names())?;

        let model_path = settings.model_path();
        let classifier: SvmClassifier = parse_json(&model_path, model_bytes)?;
        classifier
            .validate()
            .map_err(|source| ArtifactError::Invalid {
                path: model_path.clone(),
                source,
            })?;
        check_feature_names(&model_path, classifier.feature_names())?;

        if scaler.n_features() != N_FEATURES || classifier.n_features() != N_FEATURES {
            return Err(ArtifactError::Mismatch(format!(
                "expected {N_FEATURES} features, scaler has {}, classifier has {}",
                scaler.n_features(),
                classifier.n_features()
            )));
        }

        tracing::info!(
            dir = ?settings.dir,
            probability = classifier.supports_probability(),
            verified,
            "Loaded triage artifacts"
        );

        Ok(Self {
            classifier: Arc::new(classifier),
            scaler: Arc::new(scaler),
            verified,
        })
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_json<T>(path: &Path, bytes: &[u8]) -> Result<T, ArtifactError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_slice(bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    parse_json(path, &read_bytes(path)?)
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Feature names, when an artifact declares them, must match the fitted order.
fn check_feature_names(path: &Path, names: Option<&[String]>) -> Result<(), ArtifactError> {
    let Some(names) = names else {
        return Ok(());
    };
    let matches = names.len() == N_FEATURES
        && names
            .iter()
            .zip(FEATURE_NAMES.iter())
            .all(|(a, b)| a.eq_ignore_ascii_case(b));
    if matches {
        Ok(())
    } else {
        Err(ArtifactError::Mismatch(format!(
            "{path:?} feature order {names:?} does not match {FEATURE_NAMES:?}"
        )))
    }
}

/// Manifest entries name plain files inside the artifact directory.
fn check_manifest_entry(rel: &str) -> Result<(), ArtifactError> {
    let path = Path::new(rel);
    let plain = !rel.is_empty()
        && path
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
    if plain {
        Ok(())
    } else {
        Err(ArtifactError::Integrity(format!(
            "manifest entry {rel:?} is not a relative path inside the artifact directory"
        )))
    }
}

/// Read and sanity-check the manifest; `None` when absent and not required.
fn read_manifest(settings: &ArtifactSettings) -> Result<Option<ArtifactManifest>, ArtifactError> {
    let manifest_path = settings.dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        if settings.require_manifest {
            return Err(ArtifactError::Integrity(format!(
                "{manifest_path:?} is required but missing"
            )));
        }
        tracing::warn!(
            dir = ?settings.dir,
            "No artifact manifest found; loading without integrity check"
        );
        return Ok(None);
    }

    let manifest: ArtifactManifest = read_json(&manifest_path)?;
    if manifest.version != 1 {
        return Err(ArtifactError::Integrity(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }

    for rel in manifest.files.keys() {
        check_manifest_entry(rel)?;
    }

    for required in [&settings.model_file, &settings.scaler_file] {
        if !manifest.files.contains_key(required.as_str()) {
            return Err(ArtifactError::Integrity(format!(
                "manifest does not bind {required}"
            )));
        }
    }

    Ok(Some(manifest))
}

/// Check every manifest digest. Files already in memory (`loaded`) are
/// hashed from those buffers; other listed files are read from `dir`.
fn verify_manifest(
    dir: &Path,
    manifest: &ArtifactManifest,
    loaded: &[(&str, &[u8])],
) -> Result<(), ArtifactError> {
    for (rel, expected_hex) in &manifest.files {
        let actual = match loaded.iter().find(|(name, _)| *name == rel.as_str()) {
            Some((_, bytes)) => sha256_hex(bytes),
            None => sha256_hex(&read_bytes(&dir.join(rel))?),
        };
        if !actual.eq_ignore_ascii_case(expected_hex.trim()) {
            return Err(ArtifactError::Integrity(format!("File hash mismatch for {rel}")));
        }
    }

    tracing::info!("Artifact hashes verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names() -> Vec<String> {
        FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect()
    }

    fn write_scaler(dir: &Path) {
        let scaler = ScalerArtifact::Standard(StandardScaler {
            feature_names: Some(names()),
            mean: vec![0.0; N_FEATURES],
            scale: vec![1.0; N_FEATURES],
            with_mean: true,
            with_std: true,
        });
        let json = serde_json::to_vec(&scaler).expect("serialize scaler");
        std::fs::write(dir.join("scaler.json"), json).expect("write scaler");
    }

    fn write_model(dir: &Path, intercept: f64, feature_names: Option<Vec<String>>) {
        let model = SvmClassifier::LinearSvc(LinearSvc {
            feature_names,
            coef: vec![0.1; N_FEATURES],
            intercept,
            classes: [0, 1],
            probability: None,
        });
        let json = serde_json::to_vec(&model).expect("serialize model");
        std::fs::write(dir.join("model.json"), json).expect("write model");
    }

    fn write_manifest(dir: &Path) {
        let manifest =
            ArtifactManifest::for_files(dir, &["model.json", "scaler.json"]).expect("manifest");
        let json = serde_json::to_vec_pretty(&manifest).expect("serialize manifest");
        std::fs::write(dir.join(MANIFEST_FILE), json).expect("write manifest");
    }

    #[test]
    fn test_load_without_manifest() {
        let temp = tempdir().expect("tempdir");
        write_scaler(temp.path());
        write_model(temp.path(), 0.0, Some(names()));

        let artifacts =
            TriageArtifacts::load(&ArtifactSettings::in_dir(temp.path())).expect("load");
        assert!(!artifacts.verified);
        assert_eq!(artifacts.classifier.n_features(), N_FEATURES);
    }

    #[test]
    fn test_required_manifest_missing() {
        let temp = tempdir().expect("tempdir");
        write_scaler(temp.path());
        write_model(temp.path(), 0.0, None);

        let mut settings = ArtifactSettings::in_dir(temp.path());
        settings.require_manifest = true;
        let err = TriageArtifacts::load(&settings).expect_err("must fail");
        assert!(matches!(err, ArtifactError::Integrity(_)));
    }

    #[test]
    fn test_load_with_valid_manifest() {
        let temp = tempdir().expect("tempdir");
        write_scaler(temp.path());
        write_model(temp.path(), 0.0, None);
        write_manifest(temp.path());

        let mut settings = ArtifactSettings::in_dir(temp.path());
        settings.require_manifest = true;
        let artifacts = TriageArtifacts::load(&settings).expect("load");
        assert!(artifacts.verified);
    }

    #[test]
    fn test_tampered_artifact_fails_integrity() {
        let temp = tempdir().expect("tempdir");
        write_scaler(temp.path());
        write_model(temp.path(), 0.0, None);
        write_manifest(temp.path());

        // Rewrite the model after the manifest was produced.
        write_model(temp.path(), 5.0, None);

        let err = TriageArtifacts::load(&ArtifactSettings::in_dir(temp.path()))
            .expect_err("must fail");
        assert!(err.to_string().contains("hash mismatch"));

        // Regenerating the manifest still needs the files themselves to load.
        let artifacts = TriageArtifacts::load_unverified(&ArtifactSettings::in_dir(temp.path()))
            .expect("load unverified");
        assert!(!artifacts.verified);
    }

    #[test]
    fn test_digest_covers_loaded_bytes() {
        let temp = tempdir().expect("tempdir");
        write_scaler(temp.path());
        write_model(temp.path(), 0.0, None);
        write_manifest(temp.path());

        let settings = ArtifactSettings::in_dir(temp.path());
        let manifest = read_manifest(&settings).expect("read").expect("present");
        let scaler_bytes = std::fs::read(temp.path().join("scaler.json")).expect("read scaler");
        let model_bytes = std::fs::read(temp.path().join("model.json")).expect("read model");

        verify_manifest(
            temp.path(),
            &manifest,
            &[
                ("model.json", model_bytes.as_slice()),
                ("scaler.json", scaler_bytes.as_slice()),
            ],
        )
        .expect("on-disk bytes verify");

        // The files on disk still match; a different in-memory buffer must not.
        let mut altered = model_bytes.clone();
        altered.push(b' ');
        let err = verify_manifest(
            temp.path(),
            &manifest,
            &[
                ("model.json", altered.as_slice()),
                ("scaler.json", scaler_bytes.as_slice()),
            ],
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("hash mismatch for model.json"));
    }

    #[test]
    fn test_manifest_entries_outside_dir_rejected() {
        for entry in ["../model.json", "/etc/passwd", "sub/../../x", ""] {
            let temp = tempdir().expect("tempdir");
            write_scaler(temp.path());
            write_model(temp.path(), 0.0, None);

            let mut manifest =
                ArtifactManifest::for_files(temp.path(), &["model.json", "scaler.json"])
                    .expect("manifest");
            manifest.files.insert(entry.to_string(), "00".repeat(32));
            let json = serde_json::to_vec(&manifest).expect("serialize manifest");
            std::fs::write(temp.path().join(MANIFEST_FILE), json).expect("write manifest");

            let err = TriageArtifacts::load(&ArtifactSettings::in_dir(temp.path()))
                .expect_err("must fail");
            assert!(
                err.to_string().contains("not a relative path"),
                "{entry:?}: {err}"
            );
        }
    }

    #[test]
    fn test_missing_model_file() {
        let temp = tempdir().expect("tempdir");
        write_scaler(temp.path());

        let err = TriageArtifacts::load(&ArtifactSettings::in_dir(temp.path()))
            .expect_err("must fail");
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn test_corrupt_model_file() {
        let temp = tempdir().expect("tempdir");
        write_scaler(temp.path());
        std::fs::write(temp.path().join("model.json"), b"\x80\x04\x95 not json")
            .expect("write");

        let err = TriageArtifacts::load(&ArtifactSettings::in_dir(temp.path()))
            .expect_err("must fail");
        assert!(matches!(err, ArtifactError::Parse { .. }));
    }

    #[test]
    fn test_reordered_feature_names_rejected() {
        let temp = tempdir().expect("tempdir");
        write_scaler(temp.path());
        let mut reordered = names();
        reordered.swap(0, 1);
        write_model(temp.path(), 0.0, Some(reordered));

        let err = TriageArtifacts::load(&ArtifactSettings::in_dir(temp.path()))
            .expect_err("must fail");
        assert!(matches!(err, ArtifactError::Mismatch(_)));
    }

    #[test]
    fn test_wrong_feature_count_rejected() {
        let temp = tempdir().expect("tempdir");
        write_scaler(temp.path());
        let model = SvmClassifier::LinearSvc(LinearSvc {
            feature_names: None,
            coef: vec![0.1; 9],
            intercept: 0.0,
            classes: [0, 1],
            probability: None,
        });
        std::fs::write(
            temp.path().join("model.json"),
            serde_json::to_vec(&model).expect("serialize"),
        )
        .expect("write");

        let err = TriageArtifacts::load(&ArtifactSettings::in_dir(temp.path()))
            .expect_err("must fail");
        assert!(matches!(err, ArtifactError::Mismatch(_)));
    }

    #[test]
    fn test_shipped_artifacts_load() {
        let artifacts =
            TriageArtifacts::load(&ArtifactSettings::in_dir("models")).expect("load shipped");
        assert!(artifacts.classifier.supports_probability());
        assert_eq!(artifacts.scaler.n_features(), N_FEATURES);
    }
}
