//! Per-frame conversion from raw sensor data to output images
//!
//! Each function implements one acquisition contract: take the latest frame
//! out of the delivered reference, copy the raw samples into the caller's
//! reusable buffer, convert, and build an output image at the frame's
//! declared resolution. Frames arrive at sensor rate (≈30 Hz), so the sample
//! buffer is sized exactly once on first use and reused for every later
//! frame of the stream.
//!
//! "No data" (`None` / `Ok(false)`) is the normal answer whenever a frame is
//! not available or does not convert cleanly: a single bad frame is logged
//! and dropped, never allowed to take the stream down. The one exception is
//! the body buffer contract, which fails fast on a capacity mismatch because
//! it signals a caller bug.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::stream::{Body, FramePayload, FrameRef, SensorFrame};

use super::colorizer::{ChannelOrder, RangeColorizer};
use super::image::{OutputImage, PixelLayout};

/// Depth conversion options
#[derive(Debug, Clone, Copy)]
pub struct DepthParams {
    /// Override the colorizer's minimum bound for this stream
    pub min_clip: Option<u16>,
    /// Override the colorizer's maximum bound for this stream
    pub max_clip: Option<u16>,
    /// Produce a 4-byte color image instead of 8-bit grayscale
    pub to_color: bool,
}

impl Default for DepthParams {
    fn default() -> Self {
        Self {
            min_clip: None,
            max_clip: None,
            to_color: true,
        }
    }
}

/// Reusable 16-bit sample buffer owned by one subscriber
///
/// Sized to the stream's pixel count on the first frame and never resized
/// afterwards; a later frame with a different pixel count is treated as a
/// conversion failure. Buffers must not be shared between subscribers or
/// stream types.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    data: Vec<u16>,
}

impl SampleBuffer {
    /// Create an unsized buffer; the first copy sizes it
    pub fn new() -> Self {
        Self::default()
    }

    /// The samples from the most recent copy
    pub fn samples(&self) -> &[u16] {
        &self.data
    }

    // Copies little-endian u16 samples out of a frame payload. Returns false
    // when the payload does not match the pixel count this buffer was sized
    // for.
    fn copy_from(&mut self, payload: &Bytes, pixel_count: usize) -> bool {
        if self.data.is_empty() && pixel_count > 0 {
            self.data = vec![0; pixel_count];
        }

        if self.data.len() != pixel_count || payload.len() != pixel_count * 2 {
            return false;
        }

        for (sample, raw) in self.data.iter_mut().zip(payload.chunks_exact(2)) {
            *sample = u16::from_le_bytes([raw[0], raw[1]]);
        }

        true
    }
}

// Takes the pixel payload out of a frame, or logs why it can't be used.
fn pixel_payload(frame: &SensorFrame) -> Option<&Bytes> {
    match &frame.payload {
        FramePayload::Samples(data) => Some(data),
        FramePayload::Bodies(_) => {
            tracing::warn!(kind = %frame.kind, "pixel processor received a body payload");
            None
        }
    }
}

/// Convert one depth frame to an output image
///
/// Returns `None` when no frame is available or the frame does not convert;
/// the caller's buffers are left untouched in the mismatch case.
pub fn process_depth_frame(
    frame: &FrameRef,
    samples: &mut SampleBuffer,
    colorizer: &RangeColorizer,
    params: DepthParams,
) -> Option<OutputImage> {
    let frame = frame.acquire()?;
    let desc = frame.description;
    let payload = pixel_payload(&frame)?;

    if !samples.copy_from(payload, desc.pixel_count()) {
        tracing::warn!(
            kind = %frame.kind,
            payload_len = payload.len(),
            pixels = desc.pixel_count(),
            "depth frame dropped: payload does not match the stream resolution"
        );
        return None;
    }

    let (data, layout) = if params.to_color {
        (
            colorizer.depth_to_color(
                samples.samples(),
                params.min_clip,
                params.max_clip,
                ChannelOrder::Bgrx,
            ),
            PixelLayout::Bgrx32,
        )
    } else {
        (
            colorizer.depth_to_gray(samples.samples(), params.min_clip, params.max_clip),
            PixelLayout::Gray8,
        )
    };

    Some(OutputImage::new(
        desc.width,
        desc.height,
        layout,
        Bytes::from(data),
    ))
}

/// Convert one infrared frame to a 4-byte gray output image
pub fn process_infrared_frame(
    frame: &FrameRef,
    samples: &mut SampleBuffer,
    colorizer: &RangeColorizer,
) -> Option<OutputImage> {
    let frame = frame.acquire()?;
    let desc = frame.description;
    let payload = pixel_payload(&frame)?;

    if !samples.copy_from(payload, desc.pixel_count()) {
        tracing::warn!(
            kind = %frame.kind,
            payload_len = payload.len(),
            pixels = desc.pixel_count(),
            "infrared frame dropped: payload does not match the stream resolution"
        );
        return None;
    }

    let data = colorizer.ir_to_gray(samples.samples());

    Some(OutputImage::new(
        desc.width,
        desc.height,
        PixelLayout::Bgrx32,
        Bytes::from(data),
    ))
}

/// Copy one color frame into an output image
///
/// Color frames are already in display format; the payload is shared with
/// the output image rather than copied.
pub fn process_color_frame(frame: &FrameRef) -> Option<OutputImage> {
    let frame = frame.acquire()?;
    let desc = frame.description;
    let payload = pixel_payload(&frame)?;

    if payload.len() != desc.byte_len() || desc.bytes_per_pixel != 4 {
        tracing::warn!(
            payload_len = payload.len(),
            expected = desc.byte_len(),
            "color frame dropped: payload does not match the stream resolution"
        );
        return None;
    }

    Some(OutputImage::new(
        desc.width,
        desc.height,
        PixelLayout::Bgra32,
        payload.clone(),
    ))
}

// TODO: body-index visualization (palette mapping from label bytes).

/// Copy one body frame into the caller's preallocated body slots
///
/// Returns `Ok(false)` when no frame is available. The buffer length must
/// equal the stream's tracked-body capacity; anything else is a caller bug
/// and fails fast rather than silently truncating.
pub fn process_body_frame(frame: &FrameRef, bodies: &mut [Body]) -> Result<bool> {
    let Some(frame) = frame.acquire() else {
        return Ok(false);
    };

    let tracked = match &frame.payload {
        FramePayload::Bodies(tracked) => tracked,
        FramePayload::Samples(_) => {
            tracing::warn!("body processor received a pixel payload");
            return Ok(false);
        }
    };

    if bodies.len() != tracked.len() {
        return Err(Error::BufferSizeMismatch {
            expected: tracked.len(),
            actual: bodies.len(),
        });
    }

    bodies.clone_from_slice(tracked);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::BufMut;

    use crate::color::DepthTreatment;
    use crate::stream::{FrameDescription, StreamKind};

    use super::*;

    fn depth_frame(width: u32, height: u32, samples: &[u16]) -> SensorFrame {
        let mut data = bytes::BytesMut::with_capacity(samples.len() * 2);
        for sample in samples {
            data.put_u16_le(*sample);
        }

        SensorFrame::samples(
            StreamKind::Depth,
            0,
            FrameDescription::new(width, height, 2),
            data.freeze(),
        )
    }

    #[test]
    fn test_no_frame_reports_no_data() {
        let colorizer = RangeColorizer::default();
        let mut samples = SampleBuffer::new();

        let image = process_depth_frame(
            &FrameRef::empty(),
            &mut samples,
            &colorizer,
            DepthParams::default(),
        );

        assert!(image.is_none());
        assert!(samples.samples().is_empty());
    }

    #[test]
    fn test_depth_to_color_image() {
        let colorizer = RangeColorizer::new(400, 4500, DepthTreatment::TintUnreliable);
        let mut samples = SampleBuffer::new();
        let frame = FrameRef::ready(depth_frame(2, 2, &[350, 2500, 4600, 400]));

        let image = process_depth_frame(&frame, &mut samples, &colorizer, DepthParams::default())
            .expect("frame should convert");

        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 2);
        assert_eq!(image.layout(), PixelLayout::Bgrx32);
        assert_eq!(image.data().len(), 16);
        // Out-of-range samples become the blue warning color.
        assert_eq!(&image.data()[0..4], &[255, 0, 0, 0]);
        assert_eq!(&image.data()[8..12], &[255, 0, 0, 0]);
    }

    #[test]
    fn test_depth_to_gray_image() {
        let colorizer = RangeColorizer::new(400, 4500, DepthTreatment::TintUnreliable);
        let mut samples = SampleBuffer::new();
        let frame = FrameRef::ready(depth_frame(4, 1, &[350, 2500, 4600, 400]));

        let params = DepthParams {
            to_color: false,
            ..DepthParams::default()
        };
        let image = process_depth_frame(&frame, &mut samples, &colorizer, params)
            .expect("frame should convert");

        assert_eq!(image.layout(), PixelLayout::Gray8);
        assert_eq!(image.data().len(), 4);
        assert_eq!(image.data()[0], 0);
        assert_eq!(image.data()[3], 255);
    }

    #[test]
    fn test_buffer_sized_once_rejects_resized_stream() {
        let colorizer = RangeColorizer::default();
        let mut samples = SampleBuffer::new();

        let first = FrameRef::ready(depth_frame(2, 1, &[500, 600]));
        assert!(
            process_depth_frame(&first, &mut samples, &colorizer, DepthParams::default())
                .is_some()
        );
        assert_eq!(samples.samples().len(), 2);

        // A frame at a different resolution must not resize the buffer.
        let second = FrameRef::ready(depth_frame(4, 1, &[500, 600, 700, 800]));
        assert!(
            process_depth_frame(&second, &mut samples, &colorizer, DepthParams::default())
                .is_none()
        );
        assert_eq!(samples.samples().len(), 2);
    }

    #[test]
    fn test_infrared_frame() {
        let colorizer = RangeColorizer::default();
        let mut samples = SampleBuffer::new();

        let mut data = bytes::BytesMut::new();
        for sample in [0u16, 40000] {
            data.put_u16_le(sample);
        }
        let frame = FrameRef::ready(SensorFrame::samples(
            StreamKind::Infrared,
            0,
            FrameDescription::new(2, 1, 2),
            data.freeze(),
        ));

        let image = process_infrared_frame(&frame, &mut samples, &colorizer)
            .expect("frame should convert");

        assert_eq!(image.layout(), PixelLayout::Bgrx32);
        assert_eq!(image.data()[0], 255);
        assert!(image.data()[4] < 255);
    }

    #[test]
    fn test_color_frame_shares_payload() {
        let pixels = Bytes::from(vec![10u8; 2 * 2 * 4]);
        let frame = FrameRef::ready(SensorFrame::samples(
            StreamKind::Color,
            0,
            FrameDescription::new(2, 2, 4),
            pixels,
        ));

        let image = process_color_frame(&frame).expect("frame should convert");

        assert_eq!(image.layout(), PixelLayout::Bgra32);
        assert_eq!(image.data().len(), 16);
    }

    #[test]
    fn test_color_frame_length_mismatch() {
        let frame = FrameRef::ready(SensorFrame::samples(
            StreamKind::Color,
            0,
            FrameDescription::new(2, 2, 4),
            Bytes::from(vec![0u8; 3]),
        ));

        assert!(process_color_frame(&frame).is_none());
    }

    #[test]
    fn test_body_frame_copies_bodies() {
        let tracked: Arc<[Body]> = vec![
            Body {
                tracking_id: 42,
                is_tracked: true,
                ..Body::untracked()
            },
            Body::untracked(),
        ]
        .into();
        let frame = FrameRef::ready(SensorFrame::bodies(0, tracked));

        let mut bodies = vec![Body::untracked(); 2];
        let processed = process_body_frame(&frame, &mut bodies).expect("sizes match");

        assert!(processed);
        assert!(bodies[0].is_tracked);
        assert_eq!(bodies[0].tracking_id, 42);
        assert!(!bodies[1].is_tracked);
    }

    #[test]
    fn test_body_buffer_size_mismatch_fails_fast() {
        let tracked: Arc<[Body]> = vec![Body::untracked(); 6].into();
        let frame = FrameRef::ready(SensorFrame::bodies(0, tracked));

        let mut bodies = vec![Body::untracked(); 4];
        let result = process_body_frame(&frame, &mut bodies);

        assert!(matches!(
            result,
            Err(Error::BufferSizeMismatch {
                expected: 6,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_body_no_frame() {
        let mut bodies = vec![Body::untracked(); 6];

        assert!(!process_body_frame(&FrameRef::empty(), &mut bodies).expect("no data is not an error"));
    }
}
