//! Frequently used structs shared by the loaders, augmenters and transforms.

use std::collections::HashMap;
use std::path::PathBuf;

use image::RgbImage;
use ndarray::{Array1, Array2, Array3, Array4};
use serde::{Deserialize, Serialize};

/// One serialized annotation record, as stored in `labels.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub ann: RawAnnotation,
}

/// Raw per-image annotation fields.
///
/// Oriented boxes are `[cx, cy, w, h, angle]` with the angle in radians.
/// The ignore sets mark instances excluded from loss computation but kept
/// for evaluation bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAnnotation {
    pub bboxes: Vec<[f32; 5]>,
    pub labels: Vec<i64>,
    #[serde(default)]
    pub bboxes_ignore: Vec<[f32; 5]>,
    #[serde(default)]
    pub labels_ignore: Vec<i64>,
}

impl RawAnnotation {
    pub fn rboxes_array(&self) -> Array2<f32> {
        to_box_array(&self.bboxes)
    }

    pub fn rboxes_ignore_array(&self) -> Array2<f32> {
        to_box_array(&self.bboxes_ignore)
    }
}

fn to_box_array(boxes: &[[f32; 5]]) -> Array2<f32> {
    Array2::from_shape_fn((boxes.len(), 5), |(i, j)| boxes[i][j])
}

/// Derived annotation handed to the transform pipeline and the training loop.
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Oriented boxes, (n, 5).
    pub rboxes: Array2<f32>,
    /// Axis-aligned boxes derived from `rboxes`, (n, 4): xmin, ymin, xmax, ymax.
    pub hboxes: Array2<f32>,
    /// Polygon corners derived from `rboxes`, (n, 8).
    pub polys: Array2<f32>,
    pub labels: Array1<i64>,
    pub rboxes_ignore: Array2<f32>,
    pub hboxes_ignore: Array2<f32>,
    pub polys_ignore: Array2<f32>,
    pub labels_ignore: Array1<i64>,
    pub classes: Vec<String>,
    /// Image size as read from disk, (width, height).
    pub ori_img_size: (u32, u32),
    /// Current size, updated by resizing transforms.
    pub img_size: (u32, u32),
    pub scale_factor: f32,
    pub filename: String,
    pub img_file: PathBuf,
}

/// Image payload of a sample. Transforms may keep working on the decoded
/// raster or convert it to a CHW float tensor.
#[derive(Debug, Clone)]
pub enum ImageData {
    Raster(RgbImage),
    Tensor(Array3<f32>),
}

impl ImageData {
    /// (width, height) of the image in its current representation.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageData::Raster(image) => image.dimensions(),
            ImageData::Tensor(tensor) => {
                let shape = tensor.shape();
                (shape[2] as u32, shape[1] as u32)
            }
        }
    }

    /// CHW float tensor with values in [0, 1]. Rasters are converted, tensors
    /// pass through unchanged.
    pub fn into_tensor(self) -> Array3<f32> {
        match self {
            ImageData::Tensor(tensor) => tensor,
            ImageData::Raster(image) => {
                let (width, height) = image.dimensions();
                Array3::from_shape_fn((3, height as usize, width as usize), |(c, y, x)| {
                    image.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
                })
            }
        }
    }
}

/// An image with its annotation, the unit handed through the pipeline.
#[derive(Debug, Clone)]
pub struct Sample {
    pub image: ImageData,
    pub ann: Annotation,
}

/// A collated mini-batch: images zero-padded to the max height/width in the
/// batch, annotations passed through untouched.
#[derive(Debug, Clone)]
pub struct Batch {
    /// (batch, 3, max_height, max_width)
    pub images: Array4<f32>,
    pub annotations: Vec<Annotation>,
}

/// Per-image predictions fed to the `Evaluate` hook.
#[derive(Debug, Clone)]
pub struct Detections {
    /// Predicted oriented boxes, (m, 5).
    pub rboxes: Array2<f32>,
    pub scores: Array1<f32>,
    pub labels: Array1<i64>,
}

/// Named metric values produced by an evaluation.
pub type EvalReport = HashMap<String, f64>;
