use rodio::source::Amplify;
use rodio::Source;
use std::f32::consts::{FRAC_PI_2, TAU};
use std::time::Duration;

use super::{ChannelChain, OscillatorShape, StereoGraph};

pub const SAMPLE_RATE: u32 = 44100;

/// Mono sine oscillator. Phase starts at zero when the source is built.
pub struct SineOscillator {
    phase: f32,
    phase_increment: f32,
    sample_rate: u32,
}

impl SineOscillator {
    pub fn new(frequency_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_increment: frequency_hz / SAMPLE_RATE as f32,
            sample_rate: SAMPLE_RATE,
        }
    }
}

impl Iterator for SineOscillator {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = (self.phase * TAU).sin();

        // rem_euclid keeps negative frequencies in [0, 1) as well
        self.phase = (self.phase + self.phase_increment).rem_euclid(1.0);

        Some(sample)
    }
}

impl Source for SineOscillator {
    fn current_frame_len(&self) -> Option<usize> {
        None // Infinite stream
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Equal-power gains of a stereo panner fed with a mono signal.
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let x = (pan.clamp(-1.0, 1.0) + 1.0) / 2.0;
    ((x * FRAC_PI_2).cos(), (x * FRAC_PI_2).sin())
}

/// Spreads a mono source over two interleaved channels.
pub struct StereoPanner<S> {
    input: S,
    left_gain: f32,
    right_gain: f32,
    pending_right: Option<f32>,
}

impl<S> StereoPanner<S>
where
    S: Source<Item = f32>,
{
    pub fn new(input: S, pan: f32) -> Self {
        let (left_gain, right_gain) = pan_gains(pan);
        Self {
            input,
            left_gain,
            right_gain,
            pending_right: None,
        }
    }
}

impl<S> Iterator for StereoPanner<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(right) = self.pending_right.take() {
            return Some(right);
        }
        let sample = self.input.next()?;
        self.pending_right = Some(sample * self.right_gain);
        Some(sample * self.left_gain)
    }
}

impl<S> Source for StereoPanner<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.input.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

pub type ChainSource = StereoPanner<Amplify<SineOscillator>>;

impl ChannelChain {
    pub fn to_source(&self) -> ChainSource {
        let oscillator = match self.oscillator.shape {
            OscillatorShape::Sine => SineOscillator::new(self.oscillator.frequency_hz),
        };
        StereoPanner::new(oscillator.amplify(self.gain), self.pan)
    }
}

/// Binaural beat generator
/// Sums both channel chains sample by sample so the two oscillators start together
pub struct BinauralBeats {
    left: ChainSource,
    right: ChainSource,
}

impl BinauralBeats {
    pub fn new(graph: &StereoGraph) -> Self {
        Self {
            left: graph.left.to_source(),
            right: graph.right.to_source(),
        }
    }
}

impl Iterator for BinauralBeats {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.left.next()? + self.right.next()?)
    }
}

impl Source for BinauralBeats {
    fn current_frame_len(&self) -> Option<usize> {
        None // Infinite stream
    }

    fn channels(&self) -> u16 {
        2 // Stereo
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite
    }
}
