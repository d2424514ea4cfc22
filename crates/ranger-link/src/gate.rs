use std::time::{Duration, Instant};

/// Presence flag and time of the last announcement. Owned by the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchState {
    pub target_present: bool,
    pub last_dispatch: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Send the selected detection now.
    Dispatch,
    /// Target still in view and announced less than one interval ago.
    Suppressed,
    /// Nothing in view.
    Absent,
}

/// Announces a target as soon as it appears, then at most once per interval
/// while it stays in view.
#[derive(Debug, Clone)]
pub struct DispatchGate {
    refresh: Duration,
    state: DispatchState,
}

impl DispatchGate {
    pub fn new(refresh: Duration) -> Self {
        Self { refresh, state: DispatchState::default() }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn decide(&mut self, has_candidate: bool, now: Instant) -> Decision {
        if !has_candidate {
            self.state.target_present = false;
            return Decision::Absent;
        }

        let due = match self.state.last_dispatch {
            None => true,
            Some(t) => now.saturating_duration_since(t) >= self.refresh,
        };
        if self.state.target_present && !due {
            return Decision::Suppressed;
        }

        self.state.target_present = true;
        // never move the timestamp backwards
        self.state.last_dispatch = Some(match self.state.last_dispatch {
            Some(t) if t > now => t,
            _ => now,
        });
        Decision::Dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(t0: Instant, secs: f64) -> Instant {
        t0 + Duration::from_secs_f64(secs)
    }

    #[test]
    fn starts_absent_with_no_dispatch() {
        let gate = DispatchGate::new(Duration::from_secs(5));
        assert_eq!(gate.state(), DispatchState { target_present: false, last_dispatch: None });
    }

    #[test]
    fn appear_hold_refresh_vanish_reappear() {
        let t0 = Instant::now();
        let mut gate = DispatchGate::new(Duration::from_secs(5));

        assert_eq!(gate.decide(true, at(t0, 0.0)), Decision::Dispatch);
        assert!(gate.state().target_present);

        assert_eq!(gate.decide(true, at(t0, 2.0)), Decision::Suppressed);
        assert_eq!(gate.state().last_dispatch, Some(at(t0, 0.0)));

        assert_eq!(gate.decide(true, at(t0, 6.0)), Decision::Dispatch);
        assert_eq!(gate.state().last_dispatch, Some(at(t0, 6.0)));

        assert_eq!(gate.decide(false, at(t0, 7.0)), Decision::Absent);
        assert!(!gate.state().target_present);

        assert_eq!(gate.decide(true, at(t0, 7.1)), Decision::Dispatch);
        assert_eq!(gate.state().last_dispatch, Some(at(t0, 7.1)));
    }

    #[test]
    fn exactly_one_interval_is_due() {
        let t0 = Instant::now();
        let mut gate = DispatchGate::new(Duration::from_secs(5));
        gate.decide(true, t0);
        assert_eq!(gate.decide(true, at(t0, 4.999)), Decision::Suppressed);
        assert_eq!(gate.decide(true, at(t0, 5.0)), Decision::Dispatch);
    }

    #[test]
    fn repeated_absence_is_harmless() {
        let t0 = Instant::now();
        let mut gate = DispatchGate::new(Duration::from_secs(5));
        for i in 0..3 {
            assert_eq!(gate.decide(false, at(t0, i as f64)), Decision::Absent);
        }
        assert_eq!(gate.state().last_dispatch, None);
        assert_eq!(gate.decide(true, at(t0, 3.0)), Decision::Dispatch);
    }

    #[test]
    fn timestamp_never_goes_backwards() {
        let t0 = Instant::now();
        let mut gate = DispatchGate::new(Duration::from_secs(5));
        gate.decide(true, at(t0, 10.0));
        gate.decide(false, at(t0, 11.0));
        // out-of-order clock sample on reappearance
        assert_eq!(gate.decide(true, at(t0, 9.0)), Decision::Dispatch);
        assert_eq!(gate.state().last_dispatch, Some(at(t0, 10.0)));
    }
}
