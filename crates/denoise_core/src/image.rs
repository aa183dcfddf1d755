//! Owned image containers crossing the UI/worker boundary.
//!
//! Every buffer handed across a thread boundary is a private copy: the types
//! here own their pixel data outright and are cloned at the boundary instead
//! of shared.

use ndarray::{Array2, ArrayView2};

/// An owned 2-D grayscale plane.
///
/// Pixels are stored row-major, one byte per pixel. The plane is exclusively
/// owned by whichever task currently holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a buffer from raw row-major bytes.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err(format!("empty buffer dimensions {}x{}", width, height));
        }
        if data.len() != width * height {
            return Err(format!(
                "pixel data length {} does not match {}x{}",
                data.len(),
                width,
                height
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a buffer filled with a constant value.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw row-major pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Copy out the sub-plane covered by `roi`. Returns `None` if the
    /// rectangle does not fit inside this buffer.
    pub fn crop(&self, roi: &RoiRect) -> Option<PixelBuffer> {
        if roi.width == 0
            || roi.height == 0
            || roi.x + roi.width > self.width
            || roi.y + roi.height > self.height
        {
            return None;
        }

        let mut data = Vec::with_capacity(roi.width * roi.height);
        for y in roi.y..roi.y + roi.height {
            let start = y * self.width + roi.x;
            data.extend_from_slice(&self.data[start..start + roi.width]);
        }

        Some(PixelBuffer {
            width: roi.width,
            height: roi.height,
            data,
        })
    }

    /// Convert to an `(height, width)` float plane with intensities in [0, 1].
    pub fn to_normalized(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.height, self.width), |(r, c)| {
            f32::from(self.data[r * self.width + c]) / 255.0
        })
    }

    /// Convert a float plane back to bytes, clamping intensities to [0, 1].
    pub fn from_normalized(plane: ArrayView2<f32>) -> Self {
        let (height, width) = plane.dim();
        let mut data = Vec::with_capacity(width * height);
        for r in 0..height {
            for c in 0..width {
                let v = plane[[r, c]].clamp(0.0, 1.0);
                data.push((v * 255.0).round() as u8);
            }
        }
        Self {
            width,
            height,
            data,
        }
    }
}

/// A rectangular region of interest within a frame, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoiRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl RoiRect {
    /// A square region of at most `max_size` per side, centered in a
    /// `frame_width` x `frame_height` frame and clipped to it.
    pub fn centered(frame_width: usize, frame_height: usize, max_size: usize) -> RoiRect {
        let width = frame_width.min(max_size);
        let height = frame_height.min(max_size);
        RoiRect {
            x: (frame_width - width) / 2,
            y: (frame_height - height) / 2,
            width,
            height,
        }
    }
}

/// An inclusive range of slices, numbered from 1 like ImageJ stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRange {
    first: usize,
    last: usize,
}

impl SliceRange {
    /// Create a range `[first, last]`, both 1-based and inclusive.
    pub fn new(first: usize, last: usize) -> Result<Self, String> {
        if first == 0 {
            return Err("slice numbering starts at 1".to_string());
        }
        if last < first {
            return Err(format!("invalid slice range [{}, {}]", first, last));
        }
        Ok(Self { first, last })
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn last(&self) -> usize {
        self.last
    }

    /// Number of slices in the range.
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn is_empty(&self) -> bool {
        false // construction guarantees at least one slice
    }

    /// Iterate the 1-based slice numbers in order.
    pub fn iter(&self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }
}

/// An ordered stack of equally sized grayscale slices with a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageStack {
    title: String,
    width: usize,
    height: usize,
    slices: Vec<PixelBuffer>,
}

impl ImageStack {
    /// Assemble a stack from slices, checking that dimensions are consistent.
    pub fn from_slices(title: String, slices: Vec<PixelBuffer>) -> Result<Self, String> {
        let first = slices
            .first()
            .ok_or_else(|| "image stack needs at least one slice".to_string())?;
        let (width, height) = (first.width(), first.height());
        for (i, slice) in slices.iter().enumerate() {
            if slice.width() != width || slice.height() != height {
                return Err(format!(
                    "slice {} is {}x{}, expected {}x{}",
                    i + 1,
                    slice.width(),
                    slice.height(),
                    width,
                    height
                ));
            }
        }
        Ok(Self {
            title,
            width,
            height,
            slices,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    /// Borrow a slice by 0-based index.
    pub fn get(&self, index: usize) -> Option<&PixelBuffer> {
        self.slices.get(index)
    }
}

// =============================================================================
// Tests
// =============================================================================
