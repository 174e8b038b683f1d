use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::audio::{AudioEngine, ContextId, StereoGraph};
use crate::viewer::WaveformViewer;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Graph state that only exists while the session is playing.
#[derive(Debug, Clone)]
struct ActiveTone {
    id: Uuid,
    context: ContextId,
    graph: StereoGraph,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneSnapshot {
    pub is_active: bool,
    pub session_id: Option<String>,
    pub base_frequency_hz: Option<f32>,
    pub right_frequency_hz: Option<f32>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Owns the stereo oscillator graph of one binaural session at a time.
pub struct ToneSession {
    engine: Box<dyn AudioEngine>,
    active: Option<ActiveTone>,
}

impl ToneSession {
    pub fn new(engine: Box<dyn AudioEngine>) -> Self {
        Self {
            engine,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn graph(&self) -> Option<&StereoGraph> {
        self.active.as_ref().map(|active| &active.graph)
    }

    pub fn snapshot(&self) -> ToneSnapshot {
        match &self.active {
            Some(active) => ToneSnapshot {
                is_active: true,
                session_id: Some(active.id.to_string()),
                base_frequency_hz: Some(active.graph.left_frequency_hz()),
                right_frequency_hz: Some(active.graph.right_frequency_hz()),
                started_at: Some(active.started_at),
            },
            None => ToneSnapshot {
                is_active: false,
                session_id: None,
                base_frequency_hz: None,
                right_frequency_hz: None,
                started_at: None,
            },
        }
    }

    /// Builds and starts a fresh graph. Returns `false` without touching the
    /// engine when a session is already playing.
    ///
    /// A loaded clip is started alongside the tones; if that fails the tones
    /// keep playing.
    pub async fn start(
        &mut self,
        base_frequency_hz: f32,
        beat_frequency_hz: f32,
        viewer: &mut dyn WaveformViewer,
    ) -> Result<bool> {
        if self.active.is_some() {
            return Ok(false);
        }

        let context = self
            .engine
            .open_context()
            .await
            .context("audio output is unavailable")?;

        let graph = StereoGraph::binaural(base_frequency_hz, beat_frequency_hz);
        if let Err(err) = self.engine.start_graph(context, &graph).await {
            if let Err(close_err) = self.engine.close_context(context).await {
                log_warn!("failed to close audio context {context}: {close_err:#}");
            }
            return Err(err.context("failed to start binaural tones"));
        }

        let active = ActiveTone {
            id: Uuid::new_v4(),
            context,
            graph,
            started_at: Utc::now(),
        };
        log_info!(
            "tone session {} started: left {} Hz, right {} Hz",
            active.id,
            graph.left_frequency_hz(),
            graph.right_frequency_hz()
        );
        self.active = Some(active);

        if viewer.has_clip() {
            if let Err(err) = viewer.play().await {
                log_warn!("audio clip did not start with the tones: {err:#}");
            }
        }

        Ok(true)
    }

    /// Tears the graph down. Returns `false` when nothing was playing.
    ///
    /// The session is inactive afterwards even if the engine reports an error.
    pub async fn stop(&mut self, viewer: &mut dyn WaveformViewer) -> Result<bool> {
        let Some(active) = self.active.take() else {
            return Ok(false);
        };

        let stopped = self.engine.stop_graph(active.context).await;
        let closed = self.engine.close_context(active.context).await;

        if let Err(err) = viewer.pause().await {
            log_warn!("failed to pause audio clip: {err:#}");
        }

        let elapsed = Utc::now() - active.started_at;
        log_info!(
            "tone session {} stopped after {}s",
            active.id,
            elapsed.num_seconds()
        );

        stopped
            .and(closed)
            .with_context(|| format!("failed to release tone session {}", active.id))?;
        Ok(true)
    }
}
