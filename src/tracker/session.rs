// src/tracker/session.rs
//! In-progress recording state and per-fix filtering

use crate::geo::{haversine_km, GeoSample, TrackPoint};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Recording,
}

/// Why a fix was not appended to the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Coordinates outside valid WGS84 ranges.
    OutOfRange,
    /// Reported accuracy radius above the configured limit.
    PoorAccuracy,
    /// Displacement from the previous point below the jitter floor.
    BelowMinDisplacement,
}

/// Result of feeding one raw fix into the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixOutcome {
    /// The fix became a track point; `delta_km` was added to the total.
    Accepted { delta_km: f64 },
    Rejected(RejectReason),
    /// The session is not recording; the fix was dropped silently.
    Ignored,
}

/// The finalized contents of a session, handed out exactly once by
/// [`RecordingSession::finish`].
#[derive(Debug, Clone)]
pub struct FinishedTrack {
    pub points: Vec<TrackPoint>,
    pub distance_km: f64,
    pub elapsed_secs: u64,
}

/// The in-progress state of one recording.
///
/// `distance_km` is always the sum of great-circle distances between
/// consecutive points in `points`; it only grows while recording and resets
/// to zero on a fresh start.
#[derive(Debug)]
pub struct RecordingSession {
    status: SessionStatus,
    started_at: Option<DateTime<Utc>>,
    points: Vec<TrackPoint>,
    distance_km: f64,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            started_at: None,
            points: Vec::new(),
            distance_km: 0.0,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_recording(&self) -> bool {
        self.status == SessionStatus::Recording
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    /// Wall-clock seconds since the session started. Display only; has no
    /// effect on distance or point acceptance.
    pub fn elapsed_secs(&self) -> u64 {
        match self.started_at {
            Some(started) => Utc::now()
                .signed_duration_since(started)
                .num_seconds()
                .max(0) as u64,
            None => 0,
        }
    }

    /// Clear any prior state and transition to Recording.
    pub fn begin(&mut self) {
        self.points.clear();
        self.distance_km = 0.0;
        self.started_at = Some(Utc::now());
        self.status = SessionStatus::Recording;
    }

    /// Feed one raw fix through the accuracy and displacement filters.
    ///
    /// The first accepted fix of a session is appended unconditionally; every
    /// later fix must move more than `min_displacement_km` from the last
    /// accepted point, which both filters GPS jitter and keeps the
    /// accumulator from double-counting stationary noise.
    pub fn apply_fix(
        &mut self,
        sample: &GeoSample,
        accuracy_limit_m: f64,
        min_displacement_km: f64,
    ) -> FixOutcome {
        if self.status != SessionStatus::Recording {
            return FixOutcome::Ignored;
        }

        if !sample.position_valid() {
            return FixOutcome::Rejected(RejectReason::OutOfRange);
        }

        if let Some(accuracy) = sample.accuracy_m {
            if accuracy > accuracy_limit_m {
                return FixOutcome::Rejected(RejectReason::PoorAccuracy);
            }
        }

        let candidate = TrackPoint::from_sample(sample);

        match self.points.last() {
            None => {
                self.points.push(candidate);
                FixOutcome::Accepted { delta_km: 0.0 }
            }
            Some(last) => {
                let delta_km = haversine_km(last.lat_lon(), candidate.lat_lon());
                if delta_km <= min_displacement_km {
                    return FixOutcome::Rejected(RejectReason::BelowMinDisplacement);
                }
                self.points.push(candidate);
                self.distance_km += delta_km;
                FixOutcome::Accepted { delta_km }
            }
        }
    }

    /// Take the recorded track and return to Idle. All session state is
    /// cleared regardless of what the caller does with the result.
    pub fn finish(&mut self) -> FinishedTrack {
        let elapsed_secs = self.elapsed_secs();
        let finished = FinishedTrack {
            points: std::mem::take(&mut self.points),
            distance_km: self.distance_km,
            elapsed_secs,
        };
        self.distance_km = 0.0;
        self.started_at = None;
        self.status = SessionStatus::Idle;
        finished
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::polyline_length_km;

    const ACCURACY_LIMIT: f64 = 100.0;
    const MIN_DISPLACEMENT: f64 = 0.003;

    fn sample(lat: f64, lon: f64, accuracy: Option<f64>) -> GeoSample {
        GeoSample::new(lat, lon, accuracy)
    }

    fn feed(session: &mut RecordingSession, lat: f64, lon: f64) -> FixOutcome {
        session.apply_fix(&sample(lat, lon, Some(10.0)), ACCURACY_LIMIT, MIN_DISPLACEMENT)
    }

    #[test]
    fn test_first_fix_accepted_unconditionally() {
        let mut session = RecordingSession::new();
        session.begin();

        let outcome = feed(&mut session, 0.0, 0.0);
        assert_eq!(outcome, FixOutcome::Accepted { delta_km: 0.0 });
        assert_eq!(session.points().len(), 1);
        assert_eq!(session.distance_km(), 0.0);
    }

    #[test]
    fn test_distance_equals_pairwise_sum() {
        let mut session = RecordingSession::new();
        session.begin();

        feed(&mut session, 0.0, 0.0);
        feed(&mut session, 0.0, 0.0001);
        feed(&mut session, 0.0, 0.0002);
        feed(&mut session, 0.0001, 0.0002);

        assert_eq!(session.points().len(), 4);
        let expected = polyline_length_km(session.points());
        assert!((session.distance_km() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_distance_monotone_non_decreasing() {
        let mut session = RecordingSession::new();
        session.begin();

        let mut previous = 0.0;
        let fixes = [
            (0.0, 0.0),
            (0.0, 0.0001),
            (0.0, 0.0001), // repeat, rejected
            (0.0, 0.0002),
            (0.00000001, 0.0002), // sub-threshold wiggle, rejected
            (0.0, 0.0004),
        ];
        for (lat, lon) in fixes {
            feed(&mut session, lat, lon);
            assert!(session.distance_km() >= previous);
            previous = session.distance_km();
        }
    }

    #[test]
    fn test_repeated_fix_appends_at_most_once() {
        let mut session = RecordingSession::new();
        session.begin();

        for _ in 0..5 {
            feed(&mut session, 10.0, 20.0);
        }

        assert_eq!(session.points().len(), 1);
        assert_eq!(session.distance_km(), 0.0);
    }

    #[test]
    fn test_poor_accuracy_rejected_regardless_of_displacement() {
        let mut session = RecordingSession::new();
        session.begin();
        feed(&mut session, 0.0, 0.0);

        // Far away, but with a huge reported error radius
        let outcome = session.apply_fix(
            &sample(10.0, 10.0, Some(9999.0)),
            ACCURACY_LIMIT,
            MIN_DISPLACEMENT,
        );
        assert_eq!(outcome, FixOutcome::Rejected(RejectReason::PoorAccuracy));
        assert_eq!(session.points().len(), 1);
    }

    #[test]
    fn test_missing_accuracy_is_not_rejected() {
        let mut session = RecordingSession::new();
        session.begin();

        let outcome =
            session.apply_fix(&sample(1.0, 1.0, None), ACCURACY_LIMIT, MIN_DISPLACEMENT);
        assert!(matches!(outcome, FixOutcome::Accepted { .. }));
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        let mut session = RecordingSession::new();
        session.begin();

        let outcome =
            session.apply_fix(&sample(91.0, 0.0, Some(5.0)), ACCURACY_LIMIT, MIN_DISPLACEMENT);
        assert_eq!(outcome, FixOutcome::Rejected(RejectReason::OutOfRange));
        assert!(session.points().is_empty());
    }

    #[test]
    fn test_idle_session_ignores_fixes() {
        let mut session = RecordingSession::new();
        let outcome = feed(&mut session, 0.0, 0.0);
        assert_eq!(outcome, FixOutcome::Ignored);
        assert!(session.points().is_empty());
    }

    #[test]
    fn test_begin_resets_prior_state() {
        let mut session = RecordingSession::new();
        session.begin();
        feed(&mut session, 0.0, 0.0);
        feed(&mut session, 0.0, 0.001);
        assert!(session.distance_km() > 0.0);

        session.begin();
        assert!(session.points().is_empty());
        assert_eq!(session.distance_km(), 0.0);
        assert!(session.is_recording());
    }

    #[test]
    fn test_finish_clears_state() {
        let mut session = RecordingSession::new();
        session.begin();
        feed(&mut session, 0.0, 0.0);
        feed(&mut session, 0.0, 0.001);

        let finished = session.finish();
        assert_eq!(finished.points.len(), 2);
        assert!(finished.distance_km > 0.0);

        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.points().is_empty());
        assert_eq!(session.distance_km(), 0.0);
        assert_eq!(session.elapsed_secs(), 0);
    }
}
