pub mod waveform;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rodio::{Decoder, Source};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use crate::audio::AudioEngineHandle;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Bars drawn for a loaded clip.
const WAVEFORM_BARS: usize = 64;

/// Plays a user-selected audio file independently of the tone session and
/// shows its waveform.
#[async_trait]
pub trait WaveformViewer: Send + Sync {
    /// Loads the file, leaving it paused, and returns its rendered waveform.
    async fn load_clip(&mut self, path: &Path) -> Result<String>;

    fn has_clip(&self) -> bool;

    async fn play(&mut self) -> Result<()>;

    /// Pausing without a clip is a no-op.
    async fn pause(&mut self) -> Result<()>;

    /// False once the clip has played to its end.
    async fn is_playing(&self) -> bool;

    /// Returns whether the clip is playing afterwards.
    async fn toggle_play_pause(&mut self) -> Result<bool> {
        if !self.has_clip() {
            bail!("no audio file loaded");
        }
        if self.is_playing().await {
            self.pause().await?;
            Ok(false)
        } else {
            self.play().await?;
            Ok(true)
        }
    }
}

/// rodio-backed viewer sharing the audio thread with the tone engine.
pub struct ClipPlayer {
    engine: AudioEngineHandle,
    loaded: bool,
}

impl ClipPlayer {
    pub fn new(engine: AudioEngineHandle) -> Self {
        Self {
            engine,
            loaded: false,
        }
    }
}

fn render_waveform(bytes: &Arc<[u8]>) -> Result<String> {
    let decoder = Decoder::new(Cursor::new(Arc::clone(bytes))).context("failed to decode audio clip")?;
    let peaks = waveform::window_peaks(decoder.convert_samples::<f32>(), waveform::PEAK_WINDOW);
    Ok(waveform::render(&waveform::normalized_bars(&peaks, WAVEFORM_BARS)))
}

/// Reads and decodes the whole file. Slow for long clips, so it runs on the
/// blocking pool.
fn read_clip(path: &Path) -> Result<(Arc<[u8]>, String)> {
    let bytes: Arc<[u8]> = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?
        .into();
    let rendered = render_waveform(&bytes)
        .with_context(|| format!("{} is not a playable audio file", path.display()))?;
    Ok((bytes, rendered))
}

#[async_trait]
impl WaveformViewer for ClipPlayer {
    async fn load_clip(&mut self, path: &Path) -> Result<String> {
        let owned = path.to_path_buf();
        let (bytes, rendered) = tokio::task::spawn_blocking(move || read_clip(&owned))
            .await
            .context("clip decoding worker join failed")??;

        if let Err(err) = self.engine.load_clip(bytes).await {
            log_warn!("clip load failed for {}: {err:#}", path.display());
            return Err(err);
        }
        self.loaded = true;
        log_info!("loaded audio clip {}", path.display());
        Ok(rendered)
    }

    fn has_clip(&self) -> bool {
        self.loaded
    }

    async fn play(&mut self) -> Result<()> {
        if !self.loaded {
            bail!("no audio file loaded");
        }
        self.engine.play_clip().await
    }

    async fn pause(&mut self) -> Result<()> {
        if !self.loaded {
            return Ok(());
        }
        self.engine.pause_clip().await
    }

    async fn is_playing(&self) -> bool {
        if !self.loaded {
            return false;
        }
        match self.engine.is_clip_playing().await {
            Ok(playing) => playing,
            Err(err) => {
                log_warn!("could not query clip state: {err:#}");
                false
            }
        }
    }
}
