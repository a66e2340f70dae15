//! Range colorization lookup tables
//!
//! Converting 16-bit range samples to display intensities happens once per
//! pixel at sensor frame rate, so the exponential falloff is precomputed
//! into two lookup tables at construction time: one over the reliable depth
//! range, one over the full infrared domain at quarter resolution. The
//! tables are immutable for the life of the colorizer.
//!
//! Per-call min/max overrides are plain parameters. Earlier designs that
//! temporarily rewrote the configured bounds corrupt concurrent conversions
//! running on other stream callbacks; passing the effective bounds by value
//! removes the shared state entirely.

/// Treatment of depth samples outside the reliable range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthTreatment {
    /// Clamp out-of-range samples to the nearest bound
    ClampUnreliable,
    /// Show all samples, tinting the out-of-range ones
    #[default]
    TintUnreliable,
    /// Show all samples unmodified
    DisplayAll,
}

/// Channel placement for 4-byte output pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Blue, green, red, padding
    Bgrx,
    /// Red, green, blue, padding
    Rgbx,
}

// Decay constants for the intensity falloff curves.
const DEPTH_DECAY: f64 = -0.0009;
const IR_DECAY: f64 = -0.00005;

// The depth curve is anchored this far above the minimum, so near-minimum
// samples stay at full intensity.
const DEPTH_ANCHOR_OFFSET: u32 = 100;

/// Generates display representations of depth and infrared frames
///
/// Pure and immutable after construction; conversion calls never mutate the
/// colorizer, so it can be shared freely across stream callbacks.
#[derive(Debug)]
pub struct RangeColorizer {
    min_depth: u16,
    max_depth: u16,
    min_ir: u16,
    max_ir: u16,
    treatment: DepthTreatment,
    depth_table: Vec<u8>,
    ir_table: Vec<u8>,
}

impl RangeColorizer {
    /// Build the lookup tables for the given reliable depth range
    ///
    /// The depth table spans `[min_depth, max_depth]` inclusive; the infrared
    /// table spans the full u16 domain sampled every 4th value.
    pub fn new(min_depth: u16, max_depth: u16, treatment: DepthTreatment) -> Self {
        let (min_ir, max_ir) = (u16::MIN, u16::MAX);

        let anchor = min_depth as u32 + DEPTH_ANCHOR_OFFSET;
        let depth_len = (max_depth - min_depth) as usize + 1;
        let depth_table = (0..depth_len)
            .map(|i| {
                let value = i as u32 + min_depth as u32;
                let over = value.saturating_sub(anchor) as f64;
                (255.0 * (DEPTH_DECAY * over).exp()).round() as u8
            })
            .collect();

        let ir_len = ((max_ir - min_ir) / 4) as usize + 1;
        let ir_table = (0..ir_len)
            .map(|i| {
                let value = (i * 4) as f64;
                (255.0 * (IR_DECAY * value).exp()).round() as u8
            })
            .collect();

        Self {
            min_depth,
            max_depth,
            min_ir,
            max_ir,
            treatment,
            depth_table,
            ir_table,
        }
    }

    /// Configured minimum reliable depth
    pub fn min_depth(&self) -> u16 {
        self.min_depth
    }

    /// Configured maximum reliable depth
    pub fn max_depth(&self) -> u16 {
        self.max_depth
    }

    /// Configured infrared domain
    pub fn ir_range(&self) -> (u16, u16) {
        (self.min_ir, self.max_ir)
    }

    /// Configured unreliable-range treatment
    pub fn treatment(&self) -> DepthTreatment {
        self.treatment
    }

    // Table lookup with the effective minimum as the index base. Overridden
    // bounds can push the index outside the configured table; those samples
    // read as fully decayed.
    fn depth_intensity(&self, sample: u16, min: u16) -> u8 {
        let index = (sample - min) as usize;
        self.depth_table.get(index).copied().unwrap_or(0)
    }

    /// Convert depth samples to one gray byte per sample
    ///
    /// In-range samples take their table intensity; out-of-range samples
    /// become 0. `min`/`max` override the configured bounds for this call
    /// only.
    pub fn depth_to_gray(&self, samples: &[u16], min: Option<u16>, max: Option<u16>) -> Vec<u8> {
        let min = min.unwrap_or(self.min_depth);
        let max = max.unwrap_or(self.max_depth);

        samples
            .iter()
            .map(|&sample| {
                if sample >= min && sample <= max {
                    self.depth_intensity(sample, min)
                } else {
                    0
                }
            })
            .collect()
    }

    /// Convert depth samples to 4-byte pixels (3 channels + padding)
    ///
    /// In-range samples replicate their table intensity across the three
    /// color channels. Out-of-range samples are painted full-saturation blue
    /// instead of clamped, so unreliable zones stay visually distinct from
    /// valid near/far extremes. `min`/`max` override the configured bounds
    /// for this call only.
    pub fn depth_to_color(
        &self,
        samples: &[u16],
        min: Option<u16>,
        max: Option<u16>,
        order: ChannelOrder,
    ) -> Vec<u8> {
        let min = min.unwrap_or(self.min_depth);
        let max = max.unwrap_or(self.max_depth);

        let out_of_range: [u8; 4] = match order {
            ChannelOrder::Bgrx => [255, 0, 0, 0],
            ChannelOrder::Rgbx => [0, 0, 255, 0],
        };

        let mut pixels = Vec::with_capacity(samples.len() * 4);
        for &sample in samples {
            if sample >= min && sample <= max {
                let intensity = self.depth_intensity(sample, min);
                pixels.extend_from_slice(&[intensity, intensity, intensity, 0]);
            } else {
                pixels.extend_from_slice(&out_of_range);
            }
        }

        pixels
    }

    /// Convert infrared samples to 4-byte gray pixels
    ///
    /// Every sample maps through the quarter-resolution table; the intensity
    /// is replicated across the three color channels.
    pub fn ir_to_gray(&self, samples: &[u16]) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(samples.len() * 4);
        for &sample in samples {
            let intensity = self.ir_table[(sample / 4) as usize];
            pixels.extend_from_slice(&[intensity, intensity, intensity, 0]);
        }

        pixels
    }
}

impl Default for RangeColorizer {
    fn default() -> Self {
        Self::new(400, 4500, DepthTreatment::default())
    }
}
