//! CLIP vision encoder over ONNX Runtime (feature `clip`)

use crate::model::{ImageEmbedder, ModelLoader};
use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbImage};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use pixmatch_core::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// CLIP preprocessing constants (OpenAI ViT checkpoints)
const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Where and how to load a CLIP vision encoder
#[derive(Debug, Clone)]
pub struct ClipConfig {
    pub model_path: PathBuf,
    /// Output embedding length (512 for ViT-B/32, 768 for ViT-L/14)
    pub dimension: usize,
    /// Square input side in pixels
    pub input_resolution: u32,
    pub intra_threads: usize,
}

impl ClipConfig {
    pub fn vit_b32(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            dimension: 512,
            input_resolution: 224,
            intra_threads: 4,
        }
    }
}

pub struct ClipOnnxLoader {
    config: ClipConfig,
}

impl ClipOnnxLoader {
    pub fn new(config: ClipConfig) -> Self {
        Self { config }
    }
}

impl ModelLoader for ClipOnnxLoader {
    fn load(&self) -> Result<Arc<dyn ImageEmbedder>> {
        let path = &self.config.model_path;
        if !path.exists() {
            return Err(Error::BackendUnavailable(format!(
                "vision model not found at {}",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), "Loading CLIP vision model");

        let session = Session::builder()
            .map_err(|e| Error::BackendUnavailable(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::BackendUnavailable(e.to_string()))?
            .with_intra_threads(self.config.intra_threads)
            .map_err(|e| Error::BackendUnavailable(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| Error::BackendUnavailable(format!("failed to load vision model: {}", e)))?;

        tracing::info!(path = %path.display(), dims = self.config.dimension, "CLIP vision model loaded");

        Ok(Arc::new(ClipImageEmbedder {
            session: Mutex::new(session),
            dimension: self.config.dimension,
            input_resolution: self.config.input_resolution,
        }))
    }
}

pub struct ClipImageEmbedder {
    session: Mutex<Session>,
    dimension: usize,
    input_resolution: u32,
}

impl ClipImageEmbedder {
    /// Center square crop, resize to the input size, CLIP mean/std, NCHW
    fn preprocess(&self, image: &DynamicImage) -> Array4<f32> {
        let size = self.input_resolution;
        let input = fit_square(image, size);

        let mut array = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
        for y in 0..size as usize {
            for x in 0..size as usize {
                let pixel = input.get_pixel(x as u32, y as u32);
                for c in 0..3 {
                    array[[0, c, y, x]] = (pixel[c] as f32 / 255.0 - CLIP_MEAN[c]) / CLIP_STD[c];
                }
            }
        }
        array
    }
}

/// Crop the centered square in source coordinates, then resize it
fn fit_square(image: &DynamicImage, size: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    let side = w.min(h).max(1);
    let square = image.crop_imm((w - side.min(w)) / 2, (h - side.min(h)) / 2, side, side);
    square.resize_exact(size, size, FilterType::CatmullRom).to_rgb8()
}

impl ImageEmbedder for ClipImageEmbedder {
    fn name(&self) -> &str {
        "clip-onnx"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_bytes(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let image = image::load_from_memory(bytes).map_err(|e| Error::Decode(e.to_string()))?;
        let pixel_values = self.preprocess(&image);

        let input_tensor = Tensor::from_array(pixel_values)
            .map_err(|e| Error::Inference(format!("failed to create input tensor: {}", e)))?;

        let mut session = self.session.lock();

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "pixel_values".into());
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "image_embeds".into());

        let outputs = session
            .run(ort::inputs![input_name => input_tensor])
            .map_err(|e| Error::Inference(format!("vision inference failed: {}", e)))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| Error::Inference(format!("no output '{}' from vision model", output_name)))?;

        let (_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference(format!("failed to extract embeddings: {}", e)))?;

        Ok(data.to_vec())
    }
}
