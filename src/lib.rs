pub mod aligner;
pub mod args;
pub mod config;
pub mod detections;
pub mod error;
pub mod evaluator;
pub mod frames;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod session;
pub mod timeline;
pub mod transcript;
pub mod types;
pub mod video;

pub use error::{GazeError, GazeResult};
