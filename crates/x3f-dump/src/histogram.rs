//! Per-channel sample histograms

use std::io::Write;

use x3f_core::consts::CHANNELS;
use x3f_core::{X3fError, X3fResult};

const SAMPLE_RANGE: u64 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramOptions {
    pub bins: usize,
    /// Bin by `ln(v + 1)` instead of `v`
    pub log: bool,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            bins: 1024,
            log: false,
        }
    }
}

impl HistogramOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    options: HistogramOptions,
    counts: Vec<[u64; CHANNELS]>,
}

impl Histogram {
    /// Count interleaved three-channel `samples`
    pub fn from_samples(samples: &[u16], options: HistogramOptions) -> X3fResult<Self> {
        if options.bins == 0 || options.bins as u64 > SAMPLE_RANGE {
            return Err(X3fError::InvalidParameter(format!(
                "histogram needs 1..={} bins, got {}",
                SAMPLE_RANGE, options.bins
            )));
        }
        let mut histogram = Self {
            options,
            counts: vec![[0; CHANNELS]; options.bins],
        };
        for pixel in samples.chunks_exact(CHANNELS) {
            for (channel, &value) in pixel.iter().enumerate() {
                let bin = histogram.bin_of(value);
                histogram.counts[bin][channel] += 1;
            }
        }
        Ok(histogram)
    }

    pub fn options(&self) -> HistogramOptions {
        self.options
    }

    pub fn counts(&self) -> &[[u64; CHANNELS]] {
        &self.counts
    }

    pub fn bin_of(&self, value: u16) -> usize {
        let bins = self.options.bins;
        let bin = if self.options.log {
            let scaled = (value as f64 + 1.0).ln() / (SAMPLE_RANGE as f64).ln() * bins as f64;
            scaled.floor() as usize
        } else {
            (value as u64 * bins as u64 / SAMPLE_RANGE) as usize
        };
        bin.min(bins - 1)
    }

    /// Smallest sample value that lands in `bin`
    pub fn lower_bound(&self, bin: usize) -> u32 {
        let bins = self.options.bins as u64;
        if self.options.log {
            let edge = (SAMPLE_RANGE as f64).powf(bin as f64 / bins as f64) - 1.0;
            edge.ceil().max(0.0) as u32
        } else {
            (bin as u64 * SAMPLE_RANGE).div_ceil(bins) as u32
        }
    }

    /// Bins with at least one count, as `(lower_bound, counts)`
    pub fn rows(&self) -> impl Iterator<Item = (u32, [u64; CHANNELS])> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, counts)| counts.iter().any(|&c| c != 0))
            .map(|(bin, counts)| (self.lower_bound(bin), *counts))
    }

    pub fn write_csv<W: Write>(&self, mut writer: W) -> X3fResult<()> {
        for (lower, [c0, c1, c2]) in self.rows() {
            writeln!(writer, "{}, {}, {}, {}", lower, c0, c1, c2)?;
        }
        writer.flush()?;
        Ok(())
    }
}
