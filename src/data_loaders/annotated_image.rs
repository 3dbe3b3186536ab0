//! Loader for pre-serialized oriented-box annotations plus on-disk images.
//!
//! Annotation format (`labels.json`):
//!
//! ```json
//! [
//!     {
//!         "filename": "a.jpg",
//!         "width": 1280,
//!         "height": 720,
//!         "ann": {
//!             "bboxes": [[cx, cy, w, h, angle], ...],
//!             "labels": [...],
//!             "bboxes_ignore": [...],   // optional
//!             "labels_ignore": [...]    // optional
//!         }
//!     },
//!     ...
//! ]
//! ```

use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use image::RgbImage;
use itertools::Either;
use log::{debug, info};
use ndarray::{s, Array1, Array4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::box_ops::rotated_boxes_to_aligned;
use crate::common_structs::{Annotation, AnnotationRecord, Batch, ImageData, Sample};
use crate::data_augmenters::mix_up::{blend, mix_annotations};
use crate::data_loaders::{DataLoader, Evaluate};
use crate::error::{Error, Result};
use crate::iterator_adapters::batching::Batching;
use crate::iterator_adapters::shuffling::Shuffling;
use crate::transforms::Compose;

/// How many times `read_one` re-draws a random index before giving up on
/// finding a record with ground-truth boxes.
const MAX_RESAMPLE_ATTEMPTS: usize = 32;

/// Fixed blend weight used by mix-up.
const MIX_RATIO: f32 = 0.5;

/// Configuration of an [`AnnotatedImageDataset`].
///
/// Exactly one of `dataset_dir` or the `images_dir` + `annotations_file` pair
/// must be set. `dataset_dir` derives `images/` and `labels.json` under it.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub images_dir: Option<PathBuf>,
    pub annotations_file: Option<PathBuf>,
    pub dataset_dir: Option<PathBuf>,
    /// Class names recorded into every produced annotation.
    pub classes: Vec<String>,
    pub batch_size: usize,
    /// Recorded for the caller's executor; iteration here is synchronous.
    pub num_workers: usize,
    pub shuffle: bool,
    pub drop_last: bool,
    /// Drop records with no ground-truth boxes (and below `filter_min_size`)
    /// at construction.
    pub filter_empty_gt: bool,
    pub mix_up: bool,
    pub mix_up_prob: f64,
    /// Minimum of width/height a record must have to survive filtering.
    pub filter_min_size: Option<u32>,
    /// Seed for the dataset's random source. Unseeded datasets draw from
    /// entropy and are not reproducible across runs.
    pub seed: Option<u64>,
    /// Debug hook: forces every `get` call to this sample index. When unset,
    /// the `BATCH_IDX` environment variable is consulted once at construction.
    pub index_override: Option<usize>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            images_dir: None,
            annotations_file: None,
            dataset_dir: None,
            classes: vec![],
            batch_size: 1,
            num_workers: 0,
            shuffle: false,
            drop_last: false,
            filter_empty_gt: true,
            mix_up: false,
            mix_up_prob: 0.3,
            filter_min_size: None,
            seed: None,
            index_override: None,
        }
    }
}

/// Dataset adapter over a serialized annotation list and a directory of
/// images. Every access re-reads the image from disk; nothing is cached.
pub struct AnnotatedImageDataset {
    config: DatasetConfig,
    images_dir: PathBuf,
    annotations_file: PathBuf,
    records: Vec<AnnotationRecord>,
    transforms: Compose,
    rng: Mutex<StdRng>,
    index_override: Option<usize>,
}

impl AnnotatedImageDataset {
    pub fn new(config: DatasetConfig, transforms: Compose) -> Result<Self> {
        let (images_dir, annotations_file) = match (
            &config.dataset_dir,
            &config.images_dir,
            &config.annotations_file,
        ) {
            (Some(dir), None, None) => (dir.join("images"), dir.join("labels.json")),
            (None, Some(images_dir), Some(annotations_file)) => {
                (images_dir.clone(), annotations_file.clone())
            }
            _ => return Err(Error::Config),
        };

        let file = File::open(&annotations_file).map_err(|source| Error::ReadAnnotations {
            path: annotations_file.clone(),
            source,
        })?;
        let mut records: Vec<AnnotationRecord> =
            serde_json::from_reader(file).map_err(|source| Error::ParseAnnotations {
                path: annotations_file.clone(),
                source,
            })?;

        let loaded = records.len();
        if config.filter_empty_gt {
            let min_size = config.filter_min_size.unwrap_or(0);
            records.retain(|record| {
                !record.ann.bboxes.is_empty() && record.width.min(record.height) >= min_size
            });
            debug!(
                "filtered out {} of {} records (no ground truth or below min size {})",
                loaded - records.len(),
                loaded,
                min_size
            );
        }
        info!(
            "loaded {} annotation records from {}",
            records.len(),
            annotations_file.display()
        );

        let index_override = match config.index_override {
            Some(index) => Some(index),
            None => env::var("BATCH_IDX").ok().and_then(|v| v.parse().ok()),
        };
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            images_dir,
            annotations_file,
            records,
            transforms,
            rng: Mutex::new(rng),
            index_override,
            config,
        })
    }

    /// Number of records in the working set, after filtering.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.config.classes
    }

    pub fn annotations_file(&self) -> &std::path::Path {
        &self.annotations_file
    }

    /// Reads the image and assembles the derived annotation for one record.
    ///
    /// A record without ground-truth boxes is skipped by re-drawing a uniform
    /// random index, capped at [`MAX_RESAMPLE_ATTEMPTS`]; repeated identical
    /// access is therefore only guaranteed when the requested record already
    /// has boxes.
    pub fn read_one(&self, index: usize) -> Result<(RgbImage, Annotation)> {
        let mut rng = self.lock_rng();
        self.read_one_inner(index, &mut rng)
    }

    fn read_one_inner(
        &self,
        mut index: usize,
        rng: &mut StdRng,
    ) -> Result<(RgbImage, Annotation)> {
        if index >= self.records.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }

        let mut attempts = 0;
        let record = loop {
            let record = &self.records[index];
            if !record.ann.bboxes.is_empty() {
                break record;
            }
            if attempts >= MAX_RESAMPLE_ATTEMPTS {
                return Err(Error::NoAnnotatedSample { attempts });
            }
            attempts += 1;
            debug!("record {} has no ground-truth boxes, resampling", index);
            index = rng.gen_range(0..self.records.len());
        };

        let img_file = self.images_dir.join(&record.filename);
        let image = image::open(&img_file)
            .map_err(|source| Error::ReadImage {
                path: img_file.clone(),
                source,
            })?
            .to_rgb8();

        let (width, height) = image.dimensions();
        if (width, height) != (record.width, record.height) {
            return Err(Error::SizeMismatch {
                path: img_file,
                expected_w: record.width,
                expected_h: record.height,
                actual_w: width,
                actual_h: height,
            });
        }

        let rboxes = record.ann.rboxes_array();
        let rboxes_ignore = record.ann.rboxes_ignore_array();
        let (hboxes, polys) = rotated_boxes_to_aligned(&rboxes);
        let (hboxes_ignore, polys_ignore) = rotated_boxes_to_aligned(&rboxes_ignore);

        let ann = Annotation {
            rboxes,
            hboxes,
            polys,
            labels: Array1::from_vec(record.ann.labels.clone()),
            rboxes_ignore,
            hboxes_ignore,
            polys_ignore,
            labels_ignore: Array1::from_vec(record.ann.labels_ignore.clone()),
            classes: self.config.classes.clone(),
            ori_img_size: (width, height),
            img_size: (width, height),
            scale_factor: 1.0,
            filename: record.filename.clone(),
            img_file,
        };
        Ok((image, ann))
    }

    /// Mix-up augmentation: with probability `prob` the two samples are
    /// alpha-blended at a fixed 0.5 ratio and their ground-truth fields
    /// concatenated; otherwise sample `idx1` is returned unchanged.
    pub fn mix_up(&self, idx1: usize, idx2: usize, prob: f64) -> Result<(RgbImage, Annotation)> {
        let mut rng = self.lock_rng();
        self.mix_up_inner(idx1, idx2, prob, &mut rng)
    }

    fn mix_up_inner(
        &self,
        idx1: usize,
        idx2: usize,
        prob: f64,
        rng: &mut StdRng,
    ) -> Result<(RgbImage, Annotation)> {
        if rng.gen_range(0.0..1.0) >= prob {
            return self.read_one_inner(idx1, rng);
        }
        let (image1, ann1) = self.read_one_inner(idx1, rng)?;
        let (image2, ann2) = self.read_one_inner(idx2, rng)?;
        let image = blend(&image1, &image2, MIX_RATIO)?;
        let ann = mix_annotations(ann1, &ann2);
        Ok((image, ann))
    }

    /// Fetches one transformed sample. The index override (explicit field or
    /// the `BATCH_IDX` environment variable resolved at construction) takes
    /// precedence over the requested index.
    pub fn get(&self, index: usize) -> Result<Sample> {
        if self.records.is_empty() {
            return Err(Error::IndexOutOfRange { index, len: 0 });
        }
        let index = self.index_override.unwrap_or(index);

        let mut rng = self.lock_rng();
        let (image, ann) = if self.config.mix_up {
            let idx2 = rng.gen_range(0..self.records.len());
            self.mix_up_inner(index, idx2, self.config.mix_up_prob, &mut rng)?
        } else {
            self.read_one_inner(index, &mut rng)?
        };
        drop(rng);

        self.transforms.apply(Sample {
            image: ImageData::Raster(image),
            ann,
        })
    }

    /// Iterates samples in index order, reporting progress via [`DataLoader`].
    pub fn iter(&self) -> SampleIter<'_> {
        SampleIter {
            dataset: self,
            next_index: 0,
        }
    }

    /// Iterates collated batches, honoring `shuffle`, `batch_size` and
    /// `drop_last`. Shuffling draws a child generator from the dataset's
    /// random source so a seeded dataset replays the same epoch order.
    pub fn batches(&self) -> impl Iterator<Item = Result<Batch>> + '_ {
        if self.config.num_workers > 0 {
            debug!(
                "num_workers = {} requested; batch iteration runs on the caller's thread",
                self.config.num_workers
            );
        }
        let len = self.records.len();
        let indices = if self.config.shuffle {
            let seed = self.lock_rng().gen();
            Either::Left((0..len).shuffling(len, StdRng::seed_from_u64(seed)))
        } else {
            Either::Right(0..len)
        };
        indices
            .batches_of(self.config.batch_size, self.config.drop_last)
            .map(move |batch| {
                let samples = batch
                    .into_iter()
                    .map(|index| self.get(index))
                    .collect::<Result<Vec<_>>>()?;
                collate_batch(samples)
            })
    }

    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// Base adapter: metric computation is left to concrete dataset variants.
impl Evaluate for AnnotatedImageDataset {}

pub struct SampleIter<'a> {
    dataset: &'a AnnotatedImageDataset,
    next_index: usize,
}

impl Iterator for SampleIter<'_> {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.dataset.len() {
            return None;
        }
        let item = self.dataset.get(self.next_index);
        self.next_index += 1;
        Some(item)
    }
}

impl DataLoader for SampleIter<'_> {
    fn next_element_index(&self) -> usize {
        self.next_index
    }

    fn max_elem_index(&self) -> usize {
        self.dataset.len()
    }
}

/// Zero-pads a batch of CHW image tensors to the max height/width and stacks
/// them into one (n, 3, max_h, max_w) array. Smaller images land in the
/// top-left corner of their slot, padded on the bottom/right. No padding mask
/// is produced; consumers read each annotation's recorded image size.
pub fn collate_batch(samples: Vec<Sample>) -> Result<Batch> {
    let (images, annotations): (Vec<_>, Vec<_>) = samples
        .into_iter()
        .map(|sample| (sample.image.into_tensor(), sample.ann))
        .unzip();

    let mut max_height = 0;
    let mut max_width = 0;
    for image in &images {
        let shape = image.shape();
        if shape[0] != 3 {
            return Err(Error::ChannelCount(shape[0]));
        }
        max_height = max_height.max(shape[1]);
        max_width = max_width.max(shape[2]);
    }

    let mut batch = Array4::zeros((images.len(), 3, max_height, max_width));
    for (i, image) in images.iter().enumerate() {
        let (h, w) = (image.shape()[1], image.shape()[2]);
        batch.slice_mut(s![i, .., ..h, ..w]).assign(image);
    }

    Ok(Batch {
        images: batch,
        annotations,
    })
}
