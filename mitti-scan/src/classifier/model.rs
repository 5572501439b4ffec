//! ONNX soil-type model evaluated on the CPU with candle
//!
//! The first graph input takes one 224×224 RGB image in [0, 1], NHWC or
//! NCHW as declared by the graph. The first graph output holds one score per
//! classifier label.

use super::preprocess::{INPUT_CHANNELS, INPUT_LEN, INPUT_SIZE};
use crate::error::{ScanError, ScanResult};
use crate::models::soil_type::CLASSIFIER_LABELS;
use candle_core::{DType, Device, Tensor};
use candle_onnx::onnx::{self, ModelProto, ValueInfoProto};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Memory layout of the image input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLayout {
    /// `[1, 224, 224, 3]`, the TFLite export layout
    Nhwc,
    /// `[1, 3, 224, 224]`, the PyTorch export layout
    Nchw,
}

impl InputLayout {
    /// NCHW when the declared shape has 3 channels at position 1, else NHWC
    pub fn from_value_info(info: &ValueInfoProto) -> Self {
        match declared_dims(info).as_slice() {
            [_, Some(3), _, _] => InputLayout::Nchw,
            _ => InputLayout::Nhwc,
        }
    }
}

fn declared_dims(info: &ValueInfoProto) -> Vec<Option<i64>> {
    let Some(onnx::type_proto::Value::TensorType(tensor)) =
        info.r#type.as_ref().and_then(|t| t.value.as_ref())
    else {
        return Vec::new();
    };

    tensor
        .shape
        .as_ref()
        .map(|shape| {
            shape
                .dim
                .iter()
                .map(|dim| match &dim.value {
                    Some(onnx::tensor_shape_proto::dimension::Value::DimValue(v)) => Some(*v),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn inference_error(err: candle_core::Error) -> ScanError {
    ScanError::Inference(err.to_string())
}

/// Loaded model graph plus the names of its image input and score output
pub struct SoilModel {
    proto: ModelProto,
    input_name: String,
    output_name: String,
    layout: InputLayout,
}

impl SoilModel {
    pub fn load(path: &Path) -> ScanResult<Self> {
        let proto = candle_onnx::read_file(path)
            .map_err(|e| ScanError::ModelLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_proto(proto)
    }

    pub fn from_proto(proto: ModelProto) -> ScanResult<Self> {
        let graph = proto
            .graph
            .as_ref()
            .ok_or_else(|| ScanError::ModelLoad("model has no graph".to_string()))?;

        // Older exporters also list initializers as graph inputs
        let initializers: HashSet<&str> =
            graph.initializer.iter().map(|t| t.name.as_str()).collect();
        let input = graph
            .input
            .iter()
            .find(|input| !initializers.contains(input.name.as_str()))
            .ok_or_else(|| ScanError::ModelLoad("model graph has no image input".to_string()))?;
        let output = graph
            .output
            .first()
            .ok_or_else(|| ScanError::ModelLoad("model graph has no output".to_string()))?;

        let input_name = input.name.clone();
        let output_name = output.name.clone();
        let layout = InputLayout::from_value_info(input);

        Ok(Self {
            proto,
            input_name,
            output_name,
            layout,
        })
    }

    pub fn layout(&self) -> InputLayout {
        self.layout
    }

    /// One score per classifier label for a flattened HWC image
    pub fn scores(&self, image: Vec<f32>) -> ScanResult<Vec<f32>> {
        if image.len() != INPUT_LEN {
            return Err(ScanError::Inference(format!(
                "image tensor has {} values, model takes {}",
                image.len(),
                INPUT_LEN
            )));
        }

        let side = INPUT_SIZE as usize;
        let nhwc = Tensor::from_vec(image, (1, side, side, INPUT_CHANNELS), &Device::Cpu)
            .map_err(inference_error)?;
        let input = match self.layout {
            InputLayout::Nhwc => nhwc,
            InputLayout::Nchw => nhwc
                .permute((0, 3, 1, 2))
                .and_then(|t| t.contiguous())
                .map_err(inference_error)?,
        };

        let mut inputs = HashMap::new();
        inputs.insert(self.input_name.clone(), input);
        let mut outputs =
            candle_onnx::simple_eval(&self.proto, inputs).map_err(inference_error)?;

        let scores = outputs.remove(&self.output_name).ok_or_else(|| {
            ScanError::Inference(format!("model did not produce `{}`", self.output_name))
        })?;
        let scores = scores
            .flatten_all()
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(inference_error)?;

        if scores.len() != CLASSIFIER_LABELS.len() {
            return Err(ScanError::Inference(format!(
                "model produced {} scores, expected {}",
                scores.len(),
                CLASSIFIER_LABELS.len()
            )));
        }
        Ok(scores)
    }
}
