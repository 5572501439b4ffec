//! On-device soil-type classifier
//!
//! Decodes the photo, runs the ONNX model on a blocking thread and maps
//! the argmax class to a [`SoilTypeLabel`]. Failures never escape: a missing
//! model or undecodable frame yields `AnalysisError`.

pub mod model;
pub mod preprocess;

pub use model::{InputLayout, SoilModel};
pub use preprocess::{image_to_tensor, INPUT_LEN, INPUT_SIZE};

use crate::error::{ScanError, ScanResult};
use crate::models::SoilTypeLabel;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Maps one captured image to a soil type
#[async_trait]
pub trait SoilClassifier: Send + Sync {
    async fn classify(&self, image: Bytes) -> SoilTypeLabel;
}

/// Index of the largest value; ties go to the lowest index
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, value) in values.iter().copied().enumerate() {
        match best {
            Some((_, current)) if value <= current => {}
            _ if value.is_nan() => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

/// Classifier backed by a model file on disk
///
/// The model is loaded for each call and dropped when the call returns, so
/// no handle is ever shared between concurrent inferences.
#[derive(Debug, Clone)]
pub struct LocalModelClassifier {
    model_path: PathBuf,
}

impl LocalModelClassifier {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Synchronous classification; callers on the runtime use [`SoilClassifier::classify`]
    pub fn classify_blocking(&self, image: &[u8]) -> ScanResult<SoilTypeLabel> {
        let model = SoilModel::load(&self.model_path)?;
        let input = image_to_tensor(image)?;
        let scores = model.scores(input)?;

        let index = argmax(&scores)
            .ok_or_else(|| ScanError::Inference("no finite class score".to_string()))?;
        let label = SoilTypeLabel::from_class_index(index);

        debug!(
            class_index = index,
            score = scores[index],
            layout = ?model.layout(),
            label = %label,
            "Soil image classified"
        );
        Ok(label)
    }
}

#[async_trait]
impl SoilClassifier for LocalModelClassifier {
    async fn classify(&self, image: Bytes) -> SoilTypeLabel {
        let classifier = self.clone();
        let outcome =
            tokio::task::spawn_blocking(move || classifier.classify_blocking(&image)).await;

        match outcome {
            Ok(Ok(label)) => label,
            Ok(Err(e)) => {
                warn!(error = %e, "Soil classification failed");
                SoilTypeLabel::AnalysisError
            }
            Err(join_err) => {
                warn!(error = %join_err, "Soil classification task aborted");
                SoilTypeLabel::AnalysisError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
    }

    #[test]
    fn test_argmax_ties_go_to_first_index() {
        assert_eq!(argmax(&[0.25, 0.25, 0.25, 0.25]), Some(0));
        assert_eq!(argmax(&[0.1, 0.45, 0.45]), Some(1));
    }

    #[test]
    fn test_argmax_empty_and_nan() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f32::NAN, 0.3]), Some(1));
    }

    #[tokio::test]
    async fn test_missing_model_is_analysis_error() {
        let classifier = LocalModelClassifier::new("/nonexistent/soil_classifier.onnx");
        let label = classifier.classify(Bytes::from_static(b"jpeg")).await;
        assert_eq!(label, SoilTypeLabel::AnalysisError);
    }
}
