use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("exactly one of `dataset_dir` or `images_dir` + `annotations_file` must be set")]
    Config,

    #[error("failed to read annotations file {path}")]
    ReadAnnotations {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse annotations file {path}")]
    ParseAnnotations {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read image {path}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "image {path} is {actual_w}x{actual_h} but its annotation records {expected_w}x{expected_h}"
    )]
    SizeMismatch {
        path: PathBuf,
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error("cannot blend images of different sizes: {0}x{1} vs {2}x{3}")]
    BlendSize(u32, u32, u32, u32),

    #[error("sample index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no record with ground-truth boxes found after {attempts} resampling attempts")]
    NoAnnotatedSample { attempts: usize },

    #[error("expected 3-channel images in batch, got {0} channels")]
    ChannelCount(usize),

    #[error("`{0}` is not implemented")]
    Unimplemented(&'static str),
}
