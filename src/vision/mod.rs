pub mod processor;

pub use processor::{prepare_image, ImageInfo, ImageLimits, PreparedImage};
