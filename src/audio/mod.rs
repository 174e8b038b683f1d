pub mod binaural;
mod engine;
#[cfg(test)]
pub mod testing;

pub use binaural::BinauralBeats;
pub use engine::AudioEngineHandle;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Amplitude applied by each channel's gain stage.
pub const CHANNEL_GAIN: f32 = 0.5;
pub const LEFT_PAN: f32 = -1.0;
pub const RIGHT_PAN: f32 = 1.0;

/// Identifies one opened processing context on an engine.
pub type ContextId = u64;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OscillatorShape {
    Sine,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OscillatorNode {
    pub shape: OscillatorShape,
    pub frequency_hz: f32,
}

/// One channel of the graph: oscillator -> gain -> stereo pan -> output.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelChain {
    pub oscillator: OscillatorNode,
    pub gain: f32,
    pub pan: f32,
}

impl ChannelChain {
    pub fn sine(frequency_hz: f32, gain: f32, pan: f32) -> Self {
        Self {
            oscillator: OscillatorNode {
                shape: OscillatorShape::Sine,
                frequency_hz,
            },
            gain,
            pan,
        }
    }
}

/// The two channel chains of a tone session, both feeding the same sink.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StereoGraph {
    pub left: ChannelChain,
    pub right: ChannelChain,
}

impl StereoGraph {
    /// Left ear at `base_hz`, right ear at `base_hz + beat_hz`. No range checks here.
    pub fn binaural(base_hz: f32, beat_hz: f32) -> Self {
        Self {
            left: ChannelChain::sine(base_hz, CHANNEL_GAIN, LEFT_PAN),
            right: ChannelChain::sine(base_hz + beat_hz, CHANNEL_GAIN, RIGHT_PAN),
        }
    }

    pub fn left_frequency_hz(&self) -> f32 {
        self.left.oscillator.frequency_hz
    }

    pub fn right_frequency_hz(&self) -> f32 {
        self.right.oscillator.frequency_hz
    }
}

/// Platform audio capability used by the tone session.
///
/// A context is opened per session and must be closed when the session ends.
/// Graphs are one-shot: once stopped they cannot be started again, a new
/// context and graph have to be built.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Opens a processing context on the default output device.
    async fn open_context(&mut self) -> Result<ContextId>;

    /// Wires both channel chains to the context's output and starts their
    /// oscillators on the same sample.
    async fn start_graph(&mut self, context: ContextId, graph: &StereoGraph) -> Result<()>;

    /// Stops the oscillators and disconnects every node of the graph.
    async fn stop_graph(&mut self, context: ContextId) -> Result<()>;

    async fn close_context(&mut self, context: ContextId) -> Result<()>;
}
