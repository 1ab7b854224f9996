// src/tracker/recorder.rs
//! Recording session coordination
//!
//! The recorder owns the session state behind a mutex and hands a reference
//! into the callback registered with the location source, so the async fix
//! path and the caller-facing API always see the same state. All per-fix
//! mutation happens under the lock, in arrival order.

use crate::config::RecorderConfig;
use crate::error::{RecorderError, Result};
use crate::geo::TrackPoint;
use crate::gps::source::{FixErrorHandler, FixHandler, LocationSource, Subscription, WatchOptions};
use crate::persist::RoutePersistence;
use crate::tracker::session::{FixOutcome, RecordingSession};
use crate::tracker::summary::{RouteSummary, MIN_ROUTE_KM, MIN_TRACK_POINTS};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

type TrackUpdateHook = Arc<dyn Fn(&[TrackPoint]) + Send + Sync>;
type TickHook = Arc<dyn Fn(u64) + Send + Sync>;
type RouteFinishedHook = Arc<dyn Fn(&RouteSummary) + Send + Sync>;

/// Owns the recording state machine: Idle -> Recording -> Idle.
///
/// One recorder drives at most one session at a time. Observers are wired in
/// through hooks: `on_track_update` receives the full point sequence after
/// every accepted fix (this is what feeds a live renderer), `on_tick` fires
/// once a second with the elapsed time, and `on_route_finished` fires on
/// every successful stop before persistence is attempted.
pub struct RouteRecorder {
    config: RecorderConfig,
    session: Arc<Mutex<RecordingSession>>,
    subscription: Option<Subscription>,
    ticker: Option<JoinHandle<()>>,
    on_track_update: Option<TrackUpdateHook>,
    on_tick: Option<TickHook>,
    on_route_finished: Option<RouteFinishedHook>,
}

impl RouteRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            session: Arc::new(Mutex::new(RecordingSession::new())),
            subscription: None,
            ticker: None,
            on_track_update: None,
            on_tick: None,
            on_route_finished: None,
        }
    }

    /// Register an observer for the growing point sequence.
    pub fn set_on_track_update(&mut self, hook: impl Fn(&[TrackPoint]) + Send + Sync + 'static) {
        self.on_track_update = Some(Arc::new(hook));
    }

    /// Register the 1-second elapsed-time observer.
    pub fn set_on_tick(&mut self, hook: impl Fn(u64) + Send + Sync + 'static) {
        self.on_tick = Some(Arc::new(hook));
    }

    /// Register the finished-session notification hook.
    pub fn set_on_route_finished(&mut self, hook: impl Fn(&RouteSummary) + Send + Sync + 'static) {
        self.on_route_finished = Some(Arc::new(hook));
    }

    pub fn is_recording(&self) -> bool {
        self.session.lock().unwrap().is_recording()
    }

    pub fn distance_km(&self) -> f64 {
        self.session.lock().unwrap().distance_km()
    }

    pub fn point_count(&self) -> usize {
        self.session.lock().unwrap().points().len()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.session.lock().unwrap().elapsed_secs()
    }

    /// Read-only snapshot of the accepted points so far.
    pub fn points(&self) -> Vec<TrackPoint> {
        self.session.lock().unwrap().points().to_vec()
    }

    /// Start a fresh recording session against the given location source.
    ///
    /// Fails with `AlreadyRecording` while a session is active (the existing
    /// session is untouched) and with `GeolocationUnavailable` when the
    /// source has no capability to offer, in which case the state stays Idle.
    pub fn start(&mut self, source: &dyn LocationSource) -> Result<()> {
        {
            let mut session = self.session.lock().unwrap();
            if session.is_recording() {
                return Err(RecorderError::AlreadyRecording);
            }
            session.begin();
        }

        let options = WatchOptions::from_config(&self.config);
        let subscription =
            match source.subscribe(options, self.fix_handler(), self.fix_error_handler()) {
                Ok(subscription) => subscription,
                Err(e) => {
                    // Roll back to Idle; nothing was recorded.
                    self.session.lock().unwrap().finish();
                    return Err(e);
                }
            };

        self.subscription = Some(subscription);
        self.ticker = Some(self.spawn_ticker());
        log::info!("Recording started");
        Ok(())
    }

    /// Stop the active session, summarize it, and hand it to persistence.
    ///
    /// The location subscription is cancelled before anything else; no fix
    /// delivered after that point can reach the session. Sessions with fewer
    /// than 2 points or negligible distance are discarded with
    /// `InsufficientTrackData` and persistence is never invoked. A
    /// persistence failure is reported, but the session state is cleared
    /// either way; the track is not recoverable through the recorder.
    pub async fn stop<P: RoutePersistence>(&mut self, persistence: &P) -> Result<RouteSummary> {
        let mut subscription = self
            .subscription
            .take()
            .ok_or(RecorderError::NotRecording)?;
        subscription.cancel();
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }

        let finished = self.session.lock().unwrap().finish();

        if finished.points.len() < MIN_TRACK_POINTS || finished.distance_km < MIN_ROUTE_KM {
            log::info!(
                "Discarding session: {} points, {:.4} km",
                finished.points.len(),
                finished.distance_km
            );
            return Err(RecorderError::InsufficientTrackData);
        }

        let summary = RouteSummary::build(
            Utc::now(),
            finished.distance_km,
            finished.elapsed_secs,
            finished.points,
        );

        if let Some(hook) = &self.on_route_finished {
            hook(&summary);
        }

        log::info!(
            "Recording stopped: {} over {}",
            summary.distance_label,
            crate::tracker::summary::format_duration(summary.duration_secs)
        );

        if let Err(e) = persistence.persist_route(&summary).await {
            log::error!("Failed to persist route: {}", e);
            return Err(match e {
                RecorderError::Persistence(msg) => RecorderError::Persistence(msg),
                other => RecorderError::Persistence(other.to_string()),
            });
        }

        Ok(summary)
    }

    fn fix_handler(&self) -> FixHandler {
        let session = Arc::clone(&self.session);
        let accuracy_limit_m = self.config.accuracy_limit_m;
        let min_displacement_km = self.config.min_displacement_km;
        let on_update = self.on_track_update.clone();

        Box::new(move |sample| {
            let snapshot = {
                let mut session = session.lock().unwrap();
                if !session.is_recording() {
                    return;
                }
                match session.apply_fix(&sample, accuracy_limit_m, min_displacement_km) {
                    FixOutcome::Accepted { delta_km } => {
                        log::debug!(
                            "Accepted fix ({:.6}, {:.6}), +{:.4} km",
                            sample.latitude,
                            sample.longitude,
                            delta_km
                        );
                        Some(session.points().to_vec())
                    }
                    FixOutcome::Rejected(reason) => {
                        log::debug!("Rejected fix: {:?}", reason);
                        None
                    }
                    FixOutcome::Ignored => None,
                }
            };

            // Notify outside the lock; observers get a read-only snapshot.
            if let (Some(points), Some(callback)) = (snapshot, on_update.as_ref()) {
                callback(&points);
            }
        })
    }

    fn fix_error_handler(&self) -> FixErrorHandler {
        // Fix-level failures are recovered locally; recording continues
        // without a new point this cycle.
        Box::new(move |error| {
            log::warn!("Location stream: {}", error);
        })
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let session = Arc::clone(&self.session);
        let on_tick = self.on_tick.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await; // first tick completes immediately
            loop {
                interval.tick().await;
                let elapsed = {
                    let session = session.lock().unwrap();
                    if !session.is_recording() {
                        break;
                    }
                    session.elapsed_secs()
                };
                if let Some(callback) = on_tick.as_ref() {
                    callback(elapsed);
                }
            }
        })
    }
}

impl Drop for RouteRecorder {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}
