//! Recording fakes for the audio capability and the clip viewer.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{AudioEngine, ContextId, StereoGraph};
use crate::viewer::WaveformViewer;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Open(ContextId),
    Start(ContextId, StereoGraph),
    Stop(ContextId),
    Close(ContextId),
}

#[derive(Default)]
struct EngineLog {
    calls: Vec<EngineCall>,
    next_context: ContextId,
    live: Vec<ContextId>,
}

/// Engine that records every call instead of producing sound.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    log: Arc<Mutex<EngineLog>>,
    unavailable: bool,
    fail_start: bool,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose host has no audio output.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.log.lock().unwrap().calls.clone()
    }

    /// Contexts opened and not yet closed.
    pub fn live_contexts(&self) -> Vec<ContextId> {
        self.log.lock().unwrap().live.clone()
    }
}

#[async_trait]
impl AudioEngine for RecordingEngine {
    async fn open_context(&mut self) -> Result<ContextId> {
        if self.unavailable {
            bail!("no audio output device");
        }
        let mut log = self.log.lock().unwrap();
        log.next_context += 1;
        let id = log.next_context;
        log.live.push(id);
        log.calls.push(EngineCall::Open(id));
        Ok(id)
    }

    async fn start_graph(&mut self, context: ContextId, graph: &StereoGraph) -> Result<()> {
        if self.fail_start {
            bail!("sink refused graph");
        }
        let mut log = self.log.lock().unwrap();
        if !log.live.contains(&context) {
            return Err(anyhow!("unknown context {context}"));
        }
        log.calls.push(EngineCall::Start(context, *graph));
        Ok(())
    }

    async fn stop_graph(&mut self, context: ContextId) -> Result<()> {
        self.log.lock().unwrap().calls.push(EngineCall::Stop(context));
        Ok(())
    }

    async fn close_context(&mut self, context: ContextId) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.live.retain(|id| *id != context);
        log.calls.push(EngineCall::Close(context));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerCall {
    Load(String),
    Play,
    Pause,
}

#[derive(Default)]
struct ViewerLog {
    calls: Vec<ViewerCall>,
    loaded: bool,
    playing: bool,
}

/// Viewer that records calls instead of decoding or playing anything.
#[derive(Clone, Default)]
pub struct RecordingViewer {
    log: Arc<Mutex<ViewerLog>>,
    undecodable: bool,
    failing_playback: bool,
    load_delay: Option<Duration>,
}

impl RecordingViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every load fails as if the file could not be decoded.
    pub fn undecodable() -> Self {
        Self {
            undecodable: true,
            ..Self::default()
        }
    }

    /// Loads succeed but playback always fails.
    pub fn failing_playback() -> Self {
        Self {
            failing_playback: true,
            ..Self::default()
        }
    }

    /// Loads take `delay` of runtime time, like a long decode off-thread.
    pub fn slow_loading(delay: Duration) -> Self {
        Self {
            load_delay: Some(delay),
            ..Self::default()
        }
    }

    /// The loaded clip plays to its end.
    pub fn finish_clip(&self) {
        self.log.lock().unwrap().playing = false;
    }

    pub fn calls(&self) -> Vec<ViewerCall> {
        self.log.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl WaveformViewer for RecordingViewer {
    async fn load_clip(&mut self, path: &Path) -> Result<String> {
        if let Some(delay) = self.load_delay {
            tokio::time::sleep(delay).await;
        }
        let mut log = self.log.lock().unwrap();
        log.calls.push(ViewerCall::Load(path.display().to_string()));
        if self.undecodable {
            bail!("cannot decode {}", path.display());
        }
        log.loaded = true;
        log.playing = false;
        Ok("▁▄█▄▁".to_string())
    }

    fn has_clip(&self) -> bool {
        self.log.lock().unwrap().loaded
    }

    async fn play(&mut self) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.calls.push(ViewerCall::Play);
        if self.failing_playback {
            bail!("playback failed");
        }
        log.playing = true;
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.calls.push(ViewerCall::Pause);
        log.playing = false;
        Ok(())
    }

    async fn is_playing(&self) -> bool {
        self.log.lock().unwrap().playing
    }
}
