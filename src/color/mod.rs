//! Colorization pipeline: lookup tables, frame processors, output images
//!
//! Raw 16-bit sensor samples become displayable pixels here. The
//! [`RangeColorizer`] owns the precomputed intensity tables; the processor
//! functions implement the per-stream acquisition contracts and are invoked
//! from inside subscriber frame callbacks.

pub mod colorizer;
pub mod image;
pub mod processor;

pub use colorizer::{ChannelOrder, DepthTreatment, RangeColorizer};
pub use image::{OutputImage, PixelLayout};
pub use processor::{
    process_body_frame, process_color_frame, process_depth_frame, process_infrared_frame,
    DepthParams, SampleBuffer,
};
