//! Transform pipeline sequencing. The pipeline's steps are external
//! collaborators; this module only chains them and ships a `ToTensor`
//! conversion for the common tail of a pipeline.

use crate::common_structs::{ImageData, Sample};
use crate::error::Result;

pub trait Transform: Send + Sync {
    fn apply(&self, sample: Sample) -> Result<Sample>;
}

/// Runs a list of transforms in order.
#[derive(Default)]
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    pub fn apply(&self, mut sample: Sample) -> Result<Sample> {
        for transform in &self.transforms {
            sample = transform.apply(sample)?;
        }
        Ok(sample)
    }
}

/// Converts the sample image to a CHW float tensor with values in [0, 1].
pub struct ToTensor;

impl Transform for ToTensor {
    fn apply(&self, sample: Sample) -> Result<Sample> {
        Ok(Sample {
            image: ImageData::Tensor(sample.image.into_tensor()),
            ann: sample.ann,
        })
    }
}
