pub mod image_loader;
pub mod toml_loader;

pub use image_loader::{is_supported_image, load_images_from_folder};
pub use toml_loader::{load_manifest, DetectionManifest, DetectionRecord, ImageRecord, ReferenceRecord};
