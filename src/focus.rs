use anyhow::{bail, Result};
use serde::Serialize;
use std::path::Path;
use tokio::sync::{watch, Mutex};

use crate::{
    audio::AudioEngine,
    settings::{AppSettings, ToneSettings},
    timer::{TimerController, TimerSnapshot},
    tone::{ToneSession, ToneSnapshot},
    viewer::WaveformViewer,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

struct AudioSide {
    session: ToneSession,
    viewer: Box<dyn WaveformViewer>,
    tone: ToneSettings,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSnapshot {
    pub timer: TimerSnapshot,
    pub tone: ToneSnapshot,
    pub settings: ToneSettings,
    pub clip_loaded: bool,
    pub clip_playing: bool,
}

/// Command surface of the app: one method per user control.
pub struct FocusController {
    timer: TimerController,
    audio: Mutex<AudioSide>,
}

impl FocusController {
    pub fn new(
        settings: &AppSettings,
        engine: Box<dyn AudioEngine>,
        viewer: Box<dyn WaveformViewer>,
    ) -> Self {
        Self {
            timer: TimerController::new(settings.timer_duration_minutes),
            audio: Mutex::new(AudioSide {
                session: ToneSession::new(engine),
                viewer,
                tone: settings.tone(),
            }),
        }
    }

    pub fn timer_events(&self) -> watch::Receiver<TimerSnapshot> {
        self.timer.subscribe()
    }

    pub async fn start_timer(&self) -> bool {
        self.timer.start().await
    }

    pub async fn pause_timer(&self) -> bool {
        self.timer.pause().await
    }

    pub async fn reset_timer(&self) -> TimerSnapshot {
        self.timer.reset().await
    }

    /// Expects a value already clamped by `controls::timer_duration`.
    pub async fn set_timer_duration(&self, minutes: u32) -> TimerSnapshot {
        self.timer.set_duration(minutes).await
    }

    /// Takes effect on the next start; a playing session keeps its pitch.
    pub async fn set_base_frequency(&self, hz: f32) -> ToneSettings {
        let mut audio = self.audio.lock().await;
        audio.tone.base_frequency_hz = hz;
        audio.tone
    }

    pub async fn set_beat_frequency(&self, hz: f32) -> ToneSettings {
        let mut audio = self.audio.lock().await;
        audio.tone.beat_frequency_hz = hz;
        audio.tone
    }

    pub async fn start_beats(&self) -> Result<bool> {
        let mut audio = self.audio.lock().await;
        let AudioSide {
            session,
            viewer,
            tone,
        } = &mut *audio;
        session
            .start(tone.base_frequency_hz, tone.beat_frequency_hz, &mut **viewer)
            .await
    }

    pub async fn stop_beats(&self) -> Result<bool> {
        let mut audio = self.audio.lock().await;
        let AudioSide {
            session, viewer, ..
        } = &mut *audio;
        session.stop(&mut **viewer).await
    }

    /// Starts the timer and then the tones. Refused while either one is
    /// already active. Timer expiry does not stop the tones.
    pub async fn start_timer_and_beats(&self) -> Result<()> {
        let mut audio = self.audio.lock().await;
        if audio.session.is_active() || self.timer.is_running().await {
            bail!("timer or beats already running");
        }

        self.timer.start().await;

        let AudioSide {
            session,
            viewer,
            tone,
        } = &mut *audio;
        session
            .start(tone.base_frequency_hz, tone.beat_frequency_hz, &mut **viewer)
            .await?;
        log_info!("focus session started");
        Ok(())
    }

    /// Loads a clip into the viewer. Failures leave tone playback untouched.
    /// The countdown keeps ticking while the file is decoded.
    pub async fn load_clip(&self, path: &Path) -> Result<String> {
        let mut audio = self.audio.lock().await;
        audio.viewer.load_clip(path).await.map_err(|err| {
            log_warn!("could not load {}: {err:#}", path.display());
            err
        })
    }

    /// Returns whether the clip is playing afterwards.
    pub async fn toggle_clip(&self) -> Result<bool> {
        self.audio.lock().await.viewer.toggle_play_pause().await
    }

    pub async fn snapshot(&self) -> FocusSnapshot {
        let timer = self.timer.get_snapshot().await;
        let audio = self.audio.lock().await;
        FocusSnapshot {
            timer,
            tone: audio.session.snapshot(),
            settings: audio.tone,
            clip_loaded: audio.viewer.has_clip(),
            clip_playing: audio.viewer.is_playing().await,
        }
    }

    /// Stops the tones and pauses the timer before exit.
    pub async fn shutdown(&self) -> Result<()> {
        self.timer.pause().await;
        self.stop_beats().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{RecordingEngine, RecordingViewer, ViewerCall};
    use crate::timer::TimerStatus;
    use std::time::Duration;

    fn controller() -> (FocusController, RecordingEngine, RecordingViewer) {
        let engine = RecordingEngine::new();
        let viewer = RecordingViewer::new();
        let focus = FocusController::new(
            &AppSettings::default(),
            Box::new(engine.clone()),
            Box::new(viewer.clone()),
        );
        (focus, engine, viewer)
    }

    #[tokio::test(start_paused = true)]
    async fn start_all_runs_timer_and_tones() {
        let (focus, engine, _viewer) = controller();
        focus.start_timer_and_beats().await.unwrap();

        let snapshot = focus.snapshot().await;
        assert_eq!(snapshot.timer.status, TimerStatus::Running);
        assert!(snapshot.tone.is_active);
        assert_eq!(snapshot.tone.right_frequency_hz, Some(310.0));
        assert_eq!(engine.live_contexts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_all_is_refused_while_timer_runs() {
        let (focus, engine, _viewer) = controller();
        focus.start_timer().await;

        assert!(focus.start_timer_and_beats().await.is_err());
        assert!(engine.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn start_all_is_refused_while_tones_play() {
        let (focus, engine, _viewer) = controller();
        focus.start_beats().await.unwrap();

        assert!(focus.start_timer_and_beats().await.is_err());
        assert_eq!(focus.snapshot().await.timer.status, TimerStatus::Idle);
        assert_eq!(engine.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn start_all_reports_missing_output_after_starting_timer() {
        let focus = FocusController::new(
            &AppSettings::default(),
            Box::new(RecordingEngine::unavailable()),
            Box::new(RecordingViewer::new()),
        );

        let err = focus.start_timer_and_beats().await.unwrap_err();
        assert!(err.to_string().contains("audio output is unavailable"));
        let snapshot = focus.snapshot().await;
        assert_eq!(snapshot.timer.status, TimerStatus::Running);
        assert!(!snapshot.tone.is_active);
    }

    #[tokio::test(start_paused = true)]
    async fn tones_keep_playing_after_timer_expires() {
        let settings = AppSettings {
            timer_duration_minutes: 1,
            ..AppSettings::default()
        };
        let focus = FocusController::new(
            &settings,
            Box::new(RecordingEngine::new()),
            Box::new(RecordingViewer::new()),
        );
        focus.start_timer_and_beats().await.unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;
        let snapshot = focus.snapshot().await;
        assert_eq!(snapshot.timer.status, TimerStatus::Expired);
        assert!(snapshot.tone.is_active);
    }

    #[tokio::test]
    async fn frequency_edits_apply_to_the_next_session() {
        let (focus, _engine, _viewer) = controller();
        focus.start_beats().await.unwrap();
        focus.set_base_frequency(200.0).await;
        focus.set_beat_frequency(4.0).await;
        assert_eq!(focus.snapshot().await.tone.base_frequency_hz, Some(300.0));

        focus.stop_beats().await.unwrap();
        focus.start_beats().await.unwrap();
        let tone = focus.snapshot().await.tone;
        assert_eq!(tone.base_frequency_hz, Some(200.0));
        assert_eq!(tone.right_frequency_hz, Some(204.0));
    }

    #[tokio::test]
    async fn stop_beats_twice_is_harmless() {
        let (focus, _engine, _viewer) = controller();
        assert!(!focus.stop_beats().await.unwrap());
        focus.start_beats().await.unwrap();
        assert!(focus.stop_beats().await.unwrap());
        assert!(!focus.stop_beats().await.unwrap());
    }

    #[tokio::test]
    async fn clip_controls_need_a_loaded_clip() {
        let (focus, _engine, viewer) = controller();
        assert!(focus.toggle_clip().await.is_err());

        focus.load_clip(Path::new("waves.flac")).await.unwrap();
        assert!(focus.toggle_clip().await.unwrap());
        assert!(focus.snapshot().await.clip_playing);
        assert!(!focus.toggle_clip().await.unwrap());
        assert_eq!(viewer.calls().last(), Some(&ViewerCall::Pause));
    }

    #[tokio::test]
    async fn finished_clip_shows_as_stopped() {
        let (focus, _engine, viewer) = controller();
        focus.load_clip(Path::new("waves.flac")).await.unwrap();
        assert!(focus.toggle_clip().await.unwrap());

        viewer.finish_clip();
        assert!(!focus.snapshot().await.clip_playing);
        assert!(focus.toggle_clip().await.unwrap());
        assert_eq!(viewer.calls().last(), Some(&ViewerCall::Play));
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_keeps_ticking_during_a_slow_clip_load() {
        let focus = FocusController::new(
            &AppSettings::default(),
            Box::new(RecordingEngine::new()),
            Box::new(RecordingViewer::slow_loading(Duration::from_millis(3_500))),
        );
        focus.start_timer().await;

        focus.load_clip(Path::new("long-mix.mp3")).await.unwrap();

        let timer = focus.snapshot().await.timer;
        assert_eq!(timer.remaining_seconds, 25 * 60 - 3);
        assert_eq!(timer.display, "24:57");
    }

    #[tokio::test]
    async fn failed_clip_load_does_not_affect_tones() {
        let focus = FocusController::new(
            &AppSettings::default(),
            Box::new(RecordingEngine::new()),
            Box::new(RecordingViewer::undecodable()),
        );
        focus.start_beats().await.unwrap();

        assert!(focus.load_clip(Path::new("notes.txt")).await.is_err());
        let snapshot = focus.snapshot().await;
        assert!(snapshot.tone.is_active);
        assert!(!snapshot.clip_loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_releases_audio_and_pauses_timer() {
        let (focus, engine, _viewer) = controller();
        focus.start_timer_and_beats().await.unwrap();
        focus.shutdown().await.unwrap();

        let snapshot = focus.snapshot().await;
        assert_eq!(snapshot.timer.status, TimerStatus::Idle);
        assert!(!snapshot.tone.is_active);
        assert!(engine.live_contexts().is_empty());
    }
}
