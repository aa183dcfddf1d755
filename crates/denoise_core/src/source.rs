//! Access to the multi-slice source image.

use crate::image::{ImageStack, PixelBuffer, RoiRect};

/// Provider of the source image a job reads from.
///
/// Implementations hand out owned copies of their slices; the pipeline never
/// holds a reference into the provider's storage across thread boundaries.
pub trait SliceSource: Send + Sync {
    /// Title of the source, used to derive result titles.
    fn title(&self) -> &str;

    /// Number of slices in the source.
    fn slice_count(&self) -> usize;

    /// An owned copy of the slice at the given 0-based index.
    fn slice(&self, index: usize) -> Option<PixelBuffer>;

    /// The current region of interest. `None` means the whole frame.
    fn roi(&self) -> Option<RoiRect> {
        None
    }
}

impl SliceSource for ImageStack {
    fn title(&self) -> &str {
        ImageStack::title(self)
    }

    fn slice_count(&self) -> usize {
        ImageStack::slice_count(self)
    }

    fn slice(&self, index: usize) -> Option<PixelBuffer> {
        self.get(index).cloned()
    }
}
