mod loader;

pub use loader::{load_tiff_stack, DataLoadError};
