//! Small ONNX graphs for classifier tests
//!
//! `image -> Flatten -> MatMul(W) -> Add(B) -> scores`, where only the
//! column of the hot class carries weight.

use candle_onnx::onnx::tensor_proto::DataType;
use candle_onnx::onnx::tensor_shape_proto::{dimension, Dimension};
use candle_onnx::onnx::{
    type_proto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
    TensorShapeProto, TypeProto, ValueInfoProto,
};
use mitti_scan::classifier::{InputLayout, INPUT_LEN};
use prost::Message;
use std::path::Path;

fn float_info(name: &str, dims: &[i64]) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: DataType::Float as i32,
                shape: Some(TensorShapeProto {
                    dim: dims
                        .iter()
                        .map(|d| Dimension {
                            value: Some(dimension::Value::DimValue(*d)),
                            ..Default::default()
                        })
                        .collect(),
                }),
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn float_tensor(name: &str, dims: &[i64], values: Vec<f32>) -> TensorProto {
    TensorProto {
        name: name.to_string(),
        dims: dims.to_vec(),
        data_type: DataType::Float as i32,
        float_data: values,
        ..Default::default()
    }
}

fn node(op: &str, inputs: &[&str], output: &str) -> NodeProto {
    NodeProto {
        op_type: op.to_string(),
        name: format!("{}_{}", op.to_lowercase(), output),
        input: inputs.iter().map(|i| i.to_string()).collect(),
        output: vec![output.to_string()],
        ..Default::default()
    }
}

/// Linear model with `classes` outputs whose largest score is always `hot`
pub fn linear_model(hot: usize, classes: usize, layout: InputLayout) -> ModelProto {
    let mut weights = vec![0.0f32; INPUT_LEN * classes];
    for row in 0..INPUT_LEN {
        weights[row * classes + hot] = 1.0 / INPUT_LEN as f32;
    }
    // Keeps an all-black frame on the hot class
    let mut bias = vec![0.0f32; classes];
    bias[hot] = 1.0;

    let input_dims: [i64; 4] = match layout {
        InputLayout::Nhwc => [1, 224, 224, 3],
        InputLayout::Nchw => [1, 3, 224, 224],
    };

    ModelProto {
        ir_version: 8,
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 13,
        }],
        graph: Some(GraphProto {
            name: "soil_classifier_fixture".to_string(),
            node: vec![
                node("Flatten", &["image"], "flat"),
                node("MatMul", &["flat", "weights"], "logits"),
                node("Add", &["logits", "bias"], "scores"),
            ],
            initializer: vec![
                float_tensor("weights", &[INPUT_LEN as i64, classes as i64], weights),
                float_tensor("bias", &[classes as i64], bias),
            ],
            input: vec![float_info("image", &input_dims)],
            output: vec![float_info("scores", &[1, classes as i64])],
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Ten-class NHWC model whose output is always class `hot`
pub fn one_hot_model(hot: usize) -> ModelProto {
    linear_model(hot, 10, InputLayout::Nhwc)
}

pub fn write_model(model: &ModelProto, path: &Path) {
    std::fs::write(path, model.encode_to_vec()).unwrap();
}
