//! ONNX backend (tract)

use std::path::Path;
use tract_onnx::prelude::*;

use super::ImageModel;
use crate::error::{Error, Result};

pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    input_size: usize,
}

impl OnnxModel {
    pub fn load(path: &Path, input_size: u32) -> TractResult<Self> {
        let size = input_size as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())?
            .into_optimized()?
            .into_runnable()?;
        Ok(Self {
            plan,
            input_size: size,
        })
    }
}

impl ImageModel for OnnxModel {
    fn logits(&self, pixels: &[f32]) -> Result<Vec<f32>> {
        let size = self.input_size;
        let input: Tensor =
            tract_ndarray::Array4::from_shape_vec((1, 3, size, size), pixels.to_vec())
                .map_err(|e| Error::Inference(e.to_string()))?
                .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| Error::Inference(e.to_string()))?;

        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| Error::Inference(e.to_string()))?;
        Ok(view.iter().copied().collect())
    }
}
