//! Output image buffers
//!
//! The frame processors produce plain pixel buffers tagged with their layout;
//! rendering them is the consumer's concern.

use bytes::Bytes;

/// Pixel layout of an output image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// One gray byte per pixel
    Gray8,
    /// Blue, green, red, padding
    Bgrx32,
    /// Red, green, blue, padding
    Rgbx32,
    /// Blue, green, red, alpha
    Bgra32,
}

impl PixelLayout {
    /// Bytes per pixel for this layout
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelLayout::Gray8 => 1,
            PixelLayout::Bgrx32 | PixelLayout::Rgbx32 | PixelLayout::Bgra32 => 4,
        }
    }
}

/// A displayable image produced from one sensor frame
///
/// Cheap to clone: the pixel data is reference counted.
#[derive(Debug, Clone)]
pub struct OutputImage {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Bytes,
}

impl OutputImage {
    /// Wrap a pixel buffer
    ///
    /// The buffer length must equal `width * height * bytes_per_pixel`.
    pub(crate) fn new(width: u32, height: u32, layout: PixelLayout, data: Bytes) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * layout.bytes_per_pixel()
        );

        Self {
            width,
            height,
            layout,
            data,
        }
    }

    /// Image width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel layout of the data
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Row stride in bytes
    pub fn stride(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }

    /// The raw pixel data
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}
