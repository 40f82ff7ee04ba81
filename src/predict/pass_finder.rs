use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::predict::{
    look_angles_at, FrameConverter, LookAngles, Observer, Pass, PendingPass, Propagator,
};

/// Sampling resolution. Rise and set times are reported at the first sample
/// past the crossing; there is no refinement between samples.
pub const SAMPLE_STEP: Duration = Duration::minutes(1);
/// Strictly above this elevation counts as visible
pub const VISIBILITY_THRESHOLD_DEG: f64 = 10.0;

/// What to do with a pass that is still above the threshold at the last sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowEdgePolicy {
    /// Only passes that set inside the window are reported
    #[default]
    Discard,
    /// Close the open pass at the last valid sample
    Flush,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectorState {
    Idle,
    InPass(PendingPass),
}

impl DetectorState {
    /// Feed one sample, returning the next state and the pass it closed, if any
    pub fn advance(self, timestamp: DateTime<Utc>, look: LookAngles) -> (Self, Option<Pass>) {
        let visible = look.elevation_deg > VISIBILITY_THRESHOLD_DEG;

        match (self, visible) {
            (DetectorState::Idle, false) => (DetectorState::Idle, None),
            (DetectorState::Idle, true) => (
                DetectorState::InPass(PendingPass::open(timestamp, look)),
                None,
            ),
            (DetectorState::InPass(mut pending), true) => {
                pending.max_elevation_deg = pending.max_elevation_deg.max(look.elevation_deg);
                (DetectorState::InPass(pending), None)
            }
            (DetectorState::InPass(pending), false) => (
                DetectorState::Idle,
                Some(pending.close(timestamp, look.azimuth_deg)),
            ),
        }
    }

    /// Resolve the state left over when the walk reaches the end of the window
    pub fn finish(
        self,
        policy: WindowEdgePolicy,
        last_sample: Option<(DateTime<Utc>, LookAngles)>,
    ) -> Option<Pass> {
        match (self, policy, last_sample) {
            (DetectorState::InPass(pending), WindowEdgePolicy::Flush, Some((timestamp, look))) => {
                Some(pending.close(timestamp, look.azimuth_deg))
            }
            _ => None,
        }
    }
}

/// Walk `[start, end]` in [`SAMPLE_STEP`] increments and segment the
/// elevation curve into passes.
///
/// Samples the propagator cannot produce are skipped without affecting an
/// open pass. The result is in chronological order.
pub fn detect_passes<P, C>(
    propagator: &P,
    converter: &C,
    observer: &Observer,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    policy: WindowEdgePolicy,
) -> Vec<Pass>
where
    P: Propagator + ?Sized,
    C: FrameConverter + ?Sized,
{
    let mut passes = Vec::new();
    let mut state = DetectorState::Idle;
    let mut last_sample = None;
    let mut skipped = 0usize;
    let mut cursor = start;

    while cursor <= end {
        match look_angles_at(propagator, converter, observer, cursor) {
            Ok(look) => {
                let (next, closed) = state.advance(cursor, look);
                state = next;
                passes.extend(closed);
                last_sample = Some((cursor, look));
            }
            Err(e) => {
                log::debug!("Skipping sample at {}: {}", cursor, e);
                skipped += 1;
            }
        }
        cursor += SAMPLE_STEP;
    }

    if skipped > 0 {
        log::warn!("{} samples could not be propagated", skipped);
    }

    match state.finish(policy, last_sample) {
        Some(pass) => passes.push(pass),
        None => {
            if let DetectorState::InPass(pending) = state {
                log::debug!(
                    "Discarding pass starting {} still open at window end",
                    pending.start_time
                );
            }
        }
    }

    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::propagation::RawLookAngles;
    use crate::predict::{PredictError, Sgp4Propagator, Wgs84Converter};
    use crate::tle::ElementSet;
    use chrono::TimeZone;

    /// Encodes the sample index in the x coordinate
    struct IndexPropagator {
        t0: DateTime<Utc>,
        failing: Vec<usize>,
    }

    impl Propagator for IndexPropagator {
        fn position_km(&self, timestamp: DateTime<Utc>) -> Result<[f64; 3], PredictError> {
            let index = (timestamp - self.t0).num_minutes() as usize;
            if self.failing.contains(&index) {
                return Err(PredictError::PropagationSample("decayed".into()));
            }
            Ok([index as f64, 0.0, 0.0])
        }
    }

    /// Replays scripted (elevation, azimuth) pairs in degrees
    struct ScriptedConverter {
        samples: Vec<(f64, f64)>,
    }

    impl FrameConverter for ScriptedConverter {
        fn sidereal_time(&self, _timestamp: DateTime<Utc>) -> f64 {
            0.0
        }

        fn inertial_to_earth_fixed(&self, position_km: [f64; 3], _sidereal: f64) -> [f64; 3] {
            position_km
        }

        fn look_angles(&self, _observer: &Observer, position_ecef_km: [f64; 3]) -> RawLookAngles {
            let (elevation, azimuth) = self.samples[position_ecef_km[0] as usize];
            RawLookAngles {
                elevation_rad: elevation.to_radians(),
                azimuth_rad: azimuth.to_radians(),
            }
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap()
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        t0() + Duration::minutes(minutes)
    }

    fn observer() -> Observer {
        Observer::from_degrees(37.7749, -122.4194, 0.0)
    }

    fn run_with(
        samples: Vec<(f64, f64)>,
        failing: Vec<usize>,
        policy: WindowEdgePolicy,
    ) -> Vec<Pass> {
        let end = at(samples.len() as i64 - 1);
        let propagator = IndexPropagator { t0: t0(), failing };
        let converter = ScriptedConverter { samples };
        detect_passes(&propagator, &converter, &observer(), t0(), end, policy)
    }

    fn run(elevations: &[f64], policy: WindowEdgePolicy) -> Vec<Pass> {
        let samples = elevations
            .iter()
            .enumerate()
            .map(|(i, &el)| (el, 10.0 * i as f64))
            .collect();
        run_with(samples, Vec::new(), policy)
    }

    fn look(elevation_deg: f64, azimuth_deg: f64) -> LookAngles {
        LookAngles {
            elevation_deg,
            azimuth_deg,
        }
    }

    #[test]
    fn single_pass_from_elevation_profile() {
        let passes = run(&[5.0, 5.0, 15.0, 20.0, 15.0, 5.0], WindowEdgePolicy::Discard);

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert_eq!(pass.start_time, at(2));
        assert_eq!(pass.end_time, at(5));
        assert!((pass.max_elevation_deg - 20.0).abs() < 1e-9);
        assert_eq!(pass.duration_seconds, 180);
        assert!((pass.start_azimuth_deg - 20.0).abs() < 1e-9);
        assert!((pass.end_azimuth_deg - 50.0).abs() < 1e-9);
    }

    #[test]
    fn never_above_threshold_yields_nothing() {
        let passes = run(&[0.0, 5.0, 9.9, 9.99, 3.0, -20.0], WindowEdgePolicy::Flush);
        assert!(passes.is_empty());
    }

    #[test]
    fn exactly_ten_degrees_is_not_visible() {
        let (state, closed) = DetectorState::Idle.advance(at(0), look(10.0, 0.0));
        assert_eq!(state, DetectorState::Idle);
        assert!(closed.is_none());

        let (state, _) = state.advance(at(1), look(10.5, 0.0));
        assert!(matches!(state, DetectorState::InPass(_)));

        let (state, closed) = state.advance(at(2), look(10.0, 0.0));
        assert_eq!(state, DetectorState::Idle);
        let pass = closed.unwrap();
        assert_eq!(pass.start_time, at(1));
        assert_eq!(pass.end_time, at(2));
        assert_eq!(pass.duration_seconds, 60);
    }

    #[test]
    fn multiple_passes_are_chronological() {
        let passes = run(
            &[0.0, 30.0, 0.0, 0.0, 12.0, 45.0, 11.0, 0.0, 50.0, 0.0],
            WindowEdgePolicy::Discard,
        );

        assert_eq!(passes.len(), 3);
        for window in passes.windows(2) {
            assert!(window[0].start_time <= window[1].start_time);
            assert!(window[0].end_time <= window[1].start_time);
        }
        for pass in &passes {
            assert!(pass.end_time >= pass.start_time);
        }
        assert!((passes[1].max_elevation_deg - 45.0).abs() < 1e-9);
    }

    #[test]
    fn open_pass_at_window_end_is_discarded() {
        let passes = run(&[0.0, 20.0, 0.0, 0.0, 15.0, 25.0], WindowEdgePolicy::Discard);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].start_time, at(1));
    }

    #[test]
    fn open_pass_at_window_end_is_flushed() {
        let passes = run(&[0.0, 20.0, 0.0, 0.0, 15.0, 25.0], WindowEdgePolicy::Flush);
        assert_eq!(passes.len(), 2);

        let last = &passes[1];
        assert_eq!(last.start_time, at(4));
        assert_eq!(last.end_time, at(5));
        assert_eq!(last.duration_seconds, 60);
        assert!((last.max_elevation_deg - 25.0).abs() < 1e-9);
        assert!((last.end_azimuth_deg - 50.0).abs() < 1e-9);
    }

    #[test]
    fn policies_agree_when_nothing_is_open() {
        let elevations = [5.0, 15.0, 20.0, 5.0, 5.0];
        assert_eq!(
            run(&elevations, WindowEdgePolicy::Discard),
            run(&elevations, WindowEdgePolicy::Flush)
        );
    }

    #[test]
    fn failed_samples_do_not_close_a_pass() {
        let samples = vec![
            (5.0, 0.0),
            (15.0, 10.0),
            (0.0, 20.0),
            (0.0, 30.0),
            (30.0, 40.0),
            (5.0, 50.0),
        ];
        // Indices 2 and 3 would have closed the pass had they been propagated
        let passes = run_with(samples, vec![2, 3], WindowEdgePolicy::Discard);

        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].start_time, at(1));
        assert_eq!(passes[0].end_time, at(5));
        assert!((passes[0].max_elevation_deg - 30.0).abs() < 1e-9);
    }

    #[test]
    fn flush_uses_last_valid_sample() {
        let samples = vec![(0.0, 0.0), (20.0, 10.0), (25.0, 20.0), (30.0, 30.0)];
        let passes = run_with(samples, vec![3], WindowEdgePolicy::Flush);

        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].end_time, at(2));
        assert!((passes[0].end_azimuth_deg - 20.0).abs() < 1e-9);
    }

    #[test]
    fn azimuths_are_normalized() {
        let samples = vec![(0.0, 0.0), (20.0, -90.0), (25.0, 400.0), (0.0, 720.0 + 359.0)];
        let passes = run_with(samples, Vec::new(), WindowEdgePolicy::Discard);

        assert_eq!(passes.len(), 1);
        assert!((passes[0].start_azimuth_deg - 270.0).abs() < 1e-6);
        assert!((passes[0].end_azimuth_deg - 359.0).abs() < 1e-6);
        for pass in &passes {
            assert!((0.0..360.0).contains(&pass.start_azimuth_deg));
            assert!((0.0..360.0).contains(&pass.end_azimuth_deg));
        }
    }

    #[test]
    fn empty_window_when_start_after_end() {
        let propagator = IndexPropagator {
            t0: t0(),
            failing: Vec::new(),
        };
        let converter = ScriptedConverter {
            samples: vec![(50.0, 0.0)],
        };
        let passes = detect_passes(
            &propagator,
            &converter,
            &observer(),
            at(1),
            at(0),
            WindowEdgePolicy::Flush,
        );
        assert!(passes.is_empty());
    }

    #[test]
    fn advance_transitions() {
        let (state, closed) = DetectorState::Idle.advance(at(0), look(5.0, 0.0));
        assert_eq!(state, DetectorState::Idle);
        assert!(closed.is_none());

        let (state, closed) = state.advance(at(1), look(12.0, 100.0));
        assert_eq!(
            state,
            DetectorState::InPass(PendingPass {
                start_time: at(1),
                start_azimuth_deg: 100.0,
                max_elevation_deg: 12.0,
            })
        );
        assert!(closed.is_none());

        // Peak is kept when elevation drops but stays visible
        let (state, _) = state.advance(at(2), look(40.0, 120.0));
        let (state, _) = state.advance(at(3), look(20.0, 140.0));
        match state {
            DetectorState::InPass(pending) => {
                assert_eq!(pending.max_elevation_deg, 40.0);
                assert_eq!(pending.start_azimuth_deg, 100.0);
            }
            DetectorState::Idle => panic!("pass closed early"),
        }

        let (state, closed) = state.advance(at(4), look(10.0, 160.0));
        assert_eq!(state, DetectorState::Idle);
        let pass = closed.unwrap();
        assert_eq!(pass.end_time, at(4));
        assert_eq!(pass.end_azimuth_deg, 160.0);
        assert_eq!(pass.duration_seconds, 180);
    }

    #[test]
    fn finish_from_idle_emits_nothing() {
        let last = Some((at(0), look(0.0, 0.0)));
        assert!(DetectorState::Idle
            .finish(WindowEdgePolicy::Flush, last)
            .is_none());
        assert!(DetectorState::Idle
            .finish(WindowEdgePolicy::Discard, last)
            .is_none());
    }

    #[test]
    fn real_propagation_over_one_day() {
        let iss = ElementSet {
            name: "ISS (ZARYA)".to_string(),
            line1: "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992"
                .to_string(),
            line2: "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008"
                .to_string(),
        };
        let start = Utc.with_ymd_and_hms(2020, 7, 13, 0, 0, 0).unwrap();
        let end = start + Duration::hours(24);

        let propagator = Sgp4Propagator::from_element_set(&iss).unwrap();
        let passes = detect_passes(
            &propagator,
            &Wgs84Converter,
            &observer(),
            start,
            end,
            WindowEdgePolicy::Discard,
        );

        assert!(!passes.is_empty());
        for pass in &passes {
            assert!(pass.start_time >= start && pass.end_time <= end);
            assert!(pass.end_time > pass.start_time);
            assert!(pass.max_elevation_deg > VISIBILITY_THRESHOLD_DEG);
            assert!(pass.max_elevation_deg <= 90.0);
            assert!((0.0..360.0).contains(&pass.start_azimuth_deg));
            assert!((0.0..360.0).contains(&pass.end_azimuth_deg));
            // LEO passes last minutes, not hours
            assert!(pass.duration_seconds < 20 * 60);
            assert_eq!(pass.duration_seconds % 60, 0);
        }
        for window in passes.windows(2) {
            assert!(window[0].end_time <= window[1].start_time);
        }
    }
}
