use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;

use denoise_core::{ImageStack, PixelBuffer};

#[derive(Debug)]
pub enum DataLoadError {
    IoError(String),
    TiffError(String),
    InvalidDimensions(String),
    UnsupportedDataType(String),
}

impl std::fmt::Display for DataLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(s) => write!(f, "IO error: {}", s),
            Self::TiffError(s) => write!(f, "TIFF error: {}", s),
            Self::InvalidDimensions(s) => write!(f, "Invalid dimensions: {}", s),
            Self::UnsupportedDataType(s) => write!(f, "Unsupported data type: {}", s),
        }
    }
}

/// Load a multi-page grayscale TIFF as a stack of 8-bit slices.
/// 16-bit input is rescaled to 8 bits.
pub fn load_tiff_stack(path: &Path) -> Result<ImageStack, DataLoadError> {
    let file = File::open(path).map_err(|e| DataLoadError::IoError(e.to_string()))?;
    let reader = BufReader::new(file);
    let mut decoder = Decoder::new(reader).map_err(|e| DataLoadError::TiffError(e.to_string()))?;

    let mut slices: Vec<PixelBuffer> = Vec::new();
    let mut width = 0usize;
    let mut height = 0usize;

    loop {
        let (w, h) = decoder
            .dimensions()
            .map_err(|e| DataLoadError::TiffError(e.to_string()))?;
        let color_type = decoder
            .colortype()
            .map_err(|e| DataLoadError::TiffError(e.to_string()))?;

        // Only grayscale stacks are supported
        if !matches!(color_type, ColorType::Gray(8) | ColorType::Gray(16)) {
            return Err(DataLoadError::UnsupportedDataType(format!(
                "Unsupported TIFF color type: {:?}. Only 8/16-bit grayscale supported.",
                color_type
            )));
        }

        if slices.is_empty() {
            width = w as usize;
            height = h as usize;
        } else if w as usize != width || h as usize != height {
            return Err(DataLoadError::InvalidDimensions(format!(
                "TIFF pages have inconsistent dimensions: expected {}x{}, got {}x{}",
                width, height, w, h
            )));
        }

        let image_data = decoder
            .read_image()
            .map_err(|e| DataLoadError::TiffError(e.to_string()))?;

        let pixels: Vec<u8> = match image_data {
            DecodingResult::U8(data) => data,
            DecodingResult::U16(data) => data.into_iter().map(|v| (v >> 8) as u8).collect(),
            _ => {
                return Err(DataLoadError::UnsupportedDataType(
                    "Unexpected TIFF sample format for grayscale data".to_string(),
                ))
            }
        };

        let slice = PixelBuffer::new(width, height, pixels)
            .map_err(DataLoadError::InvalidDimensions)?;
        slices.push(slice);

        // Try to move to next page
        if decoder.more_images() {
            if decoder.next_image().is_err() {
                break;
            }
        } else {
            break;
        }
    }

    if slices.is_empty() {
        return Err(DataLoadError::TiffError("No pages found in TIFF".to_string()));
    }

    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("stack")
        .to_string();

    ImageStack::from_slices(title, slices).map_err(DataLoadError::InvalidDimensions)
}
