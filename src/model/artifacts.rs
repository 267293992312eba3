use std::path::{Path, PathBuf};

use crate::error::TickError;
use crate::model::{LstmModel, MinMaxScaler};

/// Plain-text file holding the path of the currently active model.
/// The retraining pipeline rewrites it after every successful fit.
pub const MODEL_POINTER_FILE: &str = "model_latest_path.txt";

/// Scaler artifacts share the model's directory and end with this suffix.
pub const SCALER_SUFFIX: &str = ".scaler.json";

/// The active model and its feature scaler, loaded together.
pub struct ModelArtifacts {
    pub model: LstmModel,
    pub scaler: MinMaxScaler,
}

/// Resolve the active model path through the pointer file.
pub fn resolve_model_path(models_dir: &Path) -> Result<PathBuf, TickError> {
    let pointer = models_dir.join(MODEL_POINTER_FILE);
    let contents = std::fs::read_to_string(&pointer)
        .map_err(|_| TickError::ArtifactMissing(pointer.clone()))?;

    let model_path = PathBuf::from(contents.trim());
    if model_path.as_os_str().is_empty() || !model_path.exists() {
        return Err(TickError::ArtifactMissing(model_path));
    }
    Ok(model_path)
}

/// Locate the newest scaler artifact by the fixed suffix convention
/// (descending filename sort, so timestamp-versioned names win).
pub fn resolve_scaler_path(models_dir: &Path) -> Result<PathBuf, TickError> {
    let entries = std::fs::read_dir(models_dir)
        .map_err(|_| TickError::ArtifactMissing(models_dir.to_path_buf()))?;

    let mut scalers: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(SCALER_SUFFIX))
                .unwrap_or(false)
        })
        .collect();

    scalers.sort();
    scalers
        .pop()
        .ok_or_else(|| TickError::ArtifactMissing(models_dir.join(format!("*{}", SCALER_SUFFIX))))
}

/// Load the active model and scaler.
///
/// Re-resolving on every call means a retraining job that swaps the
/// pointer file takes effect on the next tick without a restart.
pub fn load_artifacts(models_dir: &Path) -> Result<ModelArtifacts, TickError> {
    let model_path = resolve_model_path(models_dir)?;
    let scaler_path = resolve_scaler_path(models_dir)?;

    let model =
        LstmModel::load(&model_path).map_err(|_| TickError::ArtifactMissing(model_path))?;
    let scaler =
        MinMaxScaler::load(&scaler_path).map_err(|_| TickError::ArtifactMissing(scaler_path))?;

    Ok(ModelArtifacts { model, scaler })
}

/// Startup gate for live trading: pointer file present, model path
/// resolves, scaler present. Dashboard-only surfaces skip this check.
pub fn artifacts_exist(models_dir: &Path) -> bool {
    resolve_model_path(models_dir).is_ok() && resolve_scaler_path(models_dir).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DenseHead, LstmCell};
    use ndarray::Array1;

    fn write_model(dir: &Path, name: &str) -> PathBuf {
        let model = LstmModel {
            cell: LstmCell::zeros(4, 8),
            head: DenseHead {
                weights: Array1::zeros(8),
                bias: 0.0,
            },
        };
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();
        path
    }

    fn write_scaler(dir: &Path, name: &str) {
        let scaler = MinMaxScaler {
            data_min: vec![0.0; 4],
            data_max: vec![1.0; 4],
        };
        std::fs::write(dir.join(name), serde_json::to_string(&scaler).unwrap()).unwrap();
    }

    #[test]
    fn test_missing_pointer_blocks() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!artifacts_exist(dir.path()));
        assert!(matches!(
            resolve_model_path(dir.path()),
            Err(TickError::ArtifactMissing(_))
        ));
    }

    #[test]
    fn test_dangling_pointer_blocks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MODEL_POINTER_FILE),
            dir.path().join("gone.json").to_str().unwrap(),
        )
        .unwrap();
        assert!(resolve_model_path(dir.path()).is_err());
    }

    #[test]
    fn test_latest_scaler_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_scaler(dir.path(), "2026-01-01.scaler.json");
        write_scaler(dir.path(), "2026-03-01.scaler.json");

        let resolved = resolve_scaler_path(dir.path()).unwrap();
        assert!(resolved.to_str().unwrap().contains("2026-03-01"));
    }

    #[test]
    fn test_load_artifacts_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = write_model(dir.path(), "lstm_model.json");
        write_scaler(dir.path(), "2026-01-01.scaler.json");
        std::fs::write(
            dir.path().join(MODEL_POINTER_FILE),
            model_path.to_str().unwrap(),
        )
        .unwrap();

        assert!(artifacts_exist(dir.path()));
        let artifacts = load_artifacts(dir.path()).unwrap();
        assert_eq!(artifacts.model.input_size(), 4);
        assert_eq!(artifacts.scaler.n_features(), 4);
    }
}
