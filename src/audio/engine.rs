use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;
use tokio::sync::oneshot;

use super::{AudioEngine, BinauralBeats, ContextId, StereoGraph};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error};

type Reply<T> = oneshot::Sender<Result<T, String>>;

enum AudioCommand {
    OpenContext { reply: Reply<ContextId> },
    StartGraph {
        context: ContextId,
        graph: StereoGraph,
        reply: Reply<()>,
    },
    StopGraph { context: ContextId, reply: Reply<()> },
    CloseContext { context: ContextId, reply: Reply<()> },
    LoadClip { bytes: Arc<[u8]>, reply: Reply<()> },
    PlayClip { reply: Reply<()> },
    PauseClip { reply: Reply<()> },
    ClipPlaying { reply: Reply<bool> },
}

/// An opened output stream plus the sink the graph is rendered into.
struct ToneContext {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

/// The decoded clip's sink. The stream is `None` only for idle test sinks.
struct LoadedClip {
    _stream: Option<OutputStream>,
    sink: Sink,
    bytes: Arc<[u8]>,
}

impl LoadedClip {
    /// Queues the clip paused at its start.
    fn new(stream: Option<OutputStream>, sink: Sink, bytes: Arc<[u8]>) -> Result<Self, String> {
        let decoder = decode(&bytes)?;
        sink.pause();
        sink.append(decoder);
        Ok(Self {
            _stream: stream,
            sink,
            bytes,
        })
    }

    fn play(&self) -> Result<(), String> {
        // A clip that played to the end starts over
        if self.sink.empty() {
            self.sink.append(decode(&self.bytes)?);
        }
        self.sink.play();
        Ok(())
    }

    fn pause(&self) {
        self.sink.pause();
    }

    /// A drained sink is not playing even though it was never paused.
    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }
}

fn open_output() -> Result<(OutputStream, OutputStreamHandle), String> {
    OutputStream::try_default().map_err(|e| format!("Failed to create audio output stream: {}", e))
}

fn decode(bytes: &Arc<[u8]>) -> Result<Decoder<Cursor<Arc<[u8]>>>, String> {
    Decoder::new(Cursor::new(Arc::clone(bytes))).map_err(|e| format!("Failed to decode audio clip: {}", e))
}

/// State owned by the audio thread. rodio streams are not `Send`, so every
/// stream and sink lives here and is only touched through `AudioCommand`s.
#[derive(Default)]
struct AudioThreadState {
    next_context: ContextId,
    contexts: HashMap<ContextId, ToneContext>,
    clip: Option<LoadedClip>,
}

impl AudioThreadState {
    fn open_context(&mut self) -> Result<ContextId, String> {
        let (stream, handle) = open_output()?;
        self.next_context += 1;
        let id = self.next_context;
        self.contexts.insert(
            id,
            ToneContext {
                _stream: stream,
                handle,
                sink: None,
            },
        );
        Ok(id)
    }

    fn context_mut(&mut self, context: ContextId) -> Result<&mut ToneContext, String> {
        self.contexts
            .get_mut(&context)
            .ok_or_else(|| format!("Unknown audio context {}", context))
    }

    fn start_graph(&mut self, context: ContextId, graph: &StereoGraph) -> Result<(), String> {
        let ctx = self.context_mut(context)?;
        if ctx.sink.is_some() {
            return Err(format!("Audio context {} already has a graph", context));
        }
        let sink = Sink::try_new(&ctx.handle).map_err(|e| format!("Failed to create audio sink: {}", e))?;
        sink.append(BinauralBeats::new(graph));
        sink.play();
        ctx.sink = Some(sink);
        Ok(())
    }

    fn stop_graph(&mut self, context: ContextId) -> Result<(), String> {
        let ctx = self.context_mut(context)?;
        if let Some(sink) = ctx.sink.take() {
            sink.stop();
        }
        Ok(())
    }

    fn close_context(&mut self, context: ContextId) -> Result<(), String> {
        match self.contexts.remove(&context) {
            Some(ctx) => {
                if let Some(sink) = ctx.sink {
                    sink.stop();
                }
                Ok(())
            }
            None => Err(format!("Unknown audio context {}", context)),
        }
    }

    fn load_clip(&mut self, bytes: Arc<[u8]>) -> Result<(), String> {
        decode(&bytes)?;
        if let Some(old) = self.clip.take() {
            old.sink.stop();
        }
        let (stream, handle) = open_output()?;
        let sink = Sink::try_new(&handle).map_err(|e| format!("Failed to create audio sink: {}", e))?;
        self.clip = Some(LoadedClip::new(Some(stream), sink, bytes)?);
        Ok(())
    }

    fn play_clip(&mut self) -> Result<(), String> {
        self.clip.as_ref().ok_or("No audio clip loaded")?.play()
    }

    fn pause_clip(&mut self) -> Result<(), String> {
        if let Some(clip) = self.clip.as_ref() {
            clip.pause();
        }
        Ok(())
    }

    fn clip_playing(&self) -> bool {
        self.clip.as_ref().is_some_and(LoadedClip::is_playing)
    }
}

/// Cloneable handle to the dedicated audio thread.
#[derive(Clone)]
pub struct AudioEngineHandle {
    tx: Arc<Mutex<Option<Sender<AudioCommand>>>>,
}

impl Default for AudioEngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

fn send_reply<T>(reply: Reply<T>, result: Result<T, String>) {
    if reply.send(result).is_err() {
        log_error!("audio caller dropped before receiving result");
    }
}

impl AudioEngineHandle {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>> {
        let mut guard = self.tx.lock().map_err(|e| anyhow!(e.to_string()))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        // Spawn dedicated audio thread holding non-Send audio objects
        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let mut state = AudioThreadState::default();

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::OpenContext { reply } => {
                            send_reply(reply, state.open_context());
                        }
                        AudioCommand::StartGraph {
                            context,
                            graph,
                            reply,
                        } => {
                            send_reply(reply, state.start_graph(context, &graph));
                        }
                        AudioCommand::StopGraph { context, reply } => {
                            send_reply(reply, state.stop_graph(context));
                        }
                        AudioCommand::CloseContext { context, reply } => {
                            send_reply(reply, state.close_context(context));
                        }
                        AudioCommand::LoadClip { bytes, reply } => {
                            send_reply(reply, state.load_clip(bytes));
                        }
                        AudioCommand::PlayClip { reply } => {
                            send_reply(reply, state.play_clip());
                        }
                        AudioCommand::PauseClip { reply } => {
                            send_reply(reply, state.pause_clip());
                        }
                        AudioCommand::ClipPlaying { reply } => {
                            send_reply(reply, Ok(state.clip_playing()));
                        }
                    }
                }
                log_debug!("audio-engine thread exiting");
            })?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    /// Sends one command and awaits the audio thread's answer without
    /// blocking the runtime.
    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> AudioCommand) -> Result<T> {
        let tx = self.ensure_thread()?;
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(build(reply_tx))
            .map_err(|err| anyhow!("failed to send command to audio thread: {err}"))?;
        match reply_rx.await {
            Ok(result) => result.map_err(|e| {
                log_error!("{}", e);
                anyhow!(e)
            }),
            Err(_) => Err(anyhow!("audio thread terminated unexpectedly")),
        }
    }

    pub async fn load_clip(&self, bytes: Arc<[u8]>) -> Result<()> {
        self.request(|reply| AudioCommand::LoadClip { bytes, reply }).await
    }

    pub async fn play_clip(&self) -> Result<()> {
        self.request(|reply| AudioCommand::PlayClip { reply }).await
    }

    pub async fn pause_clip(&self) -> Result<()> {
        self.request(|reply| AudioCommand::PauseClip { reply }).await
    }

    /// Asks the sink itself, so a clip that ran out reports as stopped.
    pub async fn is_clip_playing(&self) -> Result<bool> {
        self.request(|reply| AudioCommand::ClipPlaying { reply }).await
    }
}

#[async_trait]
impl AudioEngine for AudioEngineHandle {
    async fn open_context(&mut self) -> Result<ContextId> {
        self.request(|reply| AudioCommand::OpenContext { reply }).await
    }

    async fn start_graph(&mut self, context: ContextId, graph: &StereoGraph) -> Result<()> {
        let graph = *graph;
        self.request(|reply| AudioCommand::StartGraph {
            context,
            graph,
            reply,
        })
        .await
    }

    async fn stop_graph(&mut self, context: ContextId) -> Result<()> {
        self.request(|reply| AudioCommand::StopGraph { context, reply }).await
    }

    async fn close_context(&mut self, context: ContextId) -> Result<()> {
        self.request(|reply| AudioCommand::CloseContext { context, reply }).await
    }
}
