mod image;
mod mask;

pub use self::image::ClutterImage;

pub use mask::Instance;
pub use mask::LabelMask;
