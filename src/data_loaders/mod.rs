pub mod annotated_image;

pub use annotated_image::{collate_batch, AnnotatedImageDataset, DatasetConfig, SampleIter};

use std::path::Path;

use crate::common_structs::{Detections, EvalReport};
use crate::error::{Error, Result};

/// Extends the iterator trait so dataset loaders can report progress.
pub trait DataLoader: Iterator {
    /// Returns the next element index, starting from 0
    fn next_element_index(&self) -> usize;
    /// Returns the index of the last element to be loaded
    fn max_elem_index(&self) -> usize;
}

/// Metric computation hook. The base adapter only fixes the call shape;
/// concrete dataset variants override with task-specific metrics.
pub trait Evaluate {
    fn evaluate(
        &self,
        results: &[Detections],
        work_dir: &Path,
        epoch: usize,
    ) -> Result<EvalReport> {
        let _ = (results, work_dir, epoch);
        Err(Error::Unimplemented("evaluate"))
    }
}
