pub mod loader;
pub mod preprocessing;
pub mod transforms;

pub use loader::ImageLoader;
pub use preprocessing::{preprocess, ImagePreprocessor};
pub use transforms::ImageTransforms;
