//! Dataset adapter for oriented (rotated) object detection.
//!
//! Loads serialized per-image annotation records, reads the matching images
//! from disk, optionally blends two samples together (mix-up), runs a
//! user-supplied transform pipeline and collates samples into zero-padded
//! mini-batches for a training loop.

pub mod box_ops;
pub mod common_structs;
pub mod data_augmenters;
pub mod data_loaders;
pub mod error;
pub mod iterator_adapters;
pub mod transforms;

pub use common_structs::{
    Annotation, AnnotationRecord, Batch, Detections, EvalReport, ImageData, RawAnnotation, Sample,
};
pub use data_loaders::{
    collate_batch, AnnotatedImageDataset, DataLoader, DatasetConfig, Evaluate,
};
pub use error::{Error, Result};
pub use transforms::{Compose, ToTensor, Transform};
