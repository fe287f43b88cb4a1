//! Control-loop context
//!
//! [`Knob`] owns every piece of per-device state (conditioner, classifier,
//! resolver, dispatcher and the loaded profiles) and is threaded through
//! the control loop explicitly. One call to [`Knob::step`] is one loop
//! iteration.

use heapless::{Deque, Vec};

use crate::action::{Action, Dispatcher, HidSink};
use crate::config::{KnobConfig, MacroPolicy};
use crate::gesture::{Classifier, GestureKind};
use crate::input::{Edge, PinSample, SignalConditioner};
use crate::profile::{resolve, Layer, ProfileSet, Resolver};
use crate::time::Millis;

/// Gestures waiting for a running macro to finish
///
/// A gesture arriving with the queue full aborts the macro instead.
pub const GESTURE_QUEUE_LEN: usize = 16;

/// Gestures handled in a single step (queued ones drained plus new ones)
pub const MAX_STEP_GESTURES: usize = GESTURE_QUEUE_LEN + 8;

/// What happened during one loop iteration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepOutcome {
    /// New active profile to write back, if a profile-control action ran
    pub persist: Option<u8>,
    /// Gestures whose actions ran this iteration, in order
    pub gestures: Vec<GestureKind, MAX_STEP_GESTURES>,
}

/// The whole device state
#[derive(Debug, Clone)]
pub struct Knob {
    conditioner: SignalConditioner,
    classifier: Classifier,
    resolver: Resolver,
    dispatcher: Dispatcher,
    profiles: ProfileSet,
    policy: MacroPolicy,
    /// Waiting gestures with the layer they were classified on
    queue: Deque<(GestureKind, Layer), GESTURE_QUEUE_LEN>,
}

impl Knob {
    /// Build the device state from a loaded configuration
    ///
    /// `initial` is the first raw pin sample, used to settle the debouncers.
    pub fn new(config: KnobConfig, initial: PinSample) -> Self {
        let config = config.sanitized();
        info!(
            "knob ready: profile {}, long press {} ms, multi-click {} ms",
            config.active_profile,
            config.timing.long_press_ms,
            config.timing.multi_click_ms
        );
        Self {
            conditioner: SignalConditioner::new(config.conditioner, initial),
            classifier: Classifier::new(config.timing),
            resolver: Resolver::new(config.active_profile),
            dispatcher: Dispatcher::new(),
            profiles: config.profiles,
            policy: config.macro_policy,
            queue: Deque::new(),
        }
    }

    /// Active profile (0-based)
    pub fn active_profile(&self) -> u8 {
        self.resolver.active()
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Gestures waiting for the running macro
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Run one control-loop iteration
    pub fn step<S: HidSink>(&mut self, sample: PinSample, now: Millis, sink: &mut S) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        let mut fresh: Vec<GestureKind, 6> = Vec::new();

        for event in self.conditioner.sample(sample, now) {
            for gesture in self.classifier.on_edge(event) {
                let _ = fresh.push(gesture);
            }
            if event.edge == Edge::ButtonUp {
                self.resolver.button_released();
            }
        }
        for gesture in self.classifier.tick(now) {
            let _ = fresh.push(gesture);
        }

        self.dispatcher.poll(now, sink);
        self.drain_queue(now, sink, &mut outcome);

        for gesture in fresh {
            self.resolver.observe(gesture);
            let layer = self.resolver.layer();

            if self.dispatcher.is_busy() {
                match self.policy {
                    MacroPolicy::Finish => {
                        // A full queue cuts the running macro short
                        while self.queue.is_full() {
                            warn!("gesture queue full, aborting running macro");
                            self.dispatcher.abort(sink);
                            self.drain_queue(now, sink, &mut outcome);
                        }
                        if self.dispatcher.is_busy() {
                            let _ = self.queue.push_back((gesture, layer));
                            debug!("queued {:?} behind running macro", gesture);
                            continue;
                        }
                    }
                    MacroPolicy::Abort => {
                        debug!("{:?} aborts running macro", gesture);
                        self.dispatcher.abort(sink);
                    }
                }
            }

            self.run(gesture, layer, now, sink, &mut outcome);
        }

        outcome
    }

    /// Run queued gestures while the dispatcher is idle
    fn drain_queue<S: HidSink>(&mut self, now: Millis, sink: &mut S, outcome: &mut StepOutcome) {
        while !self.dispatcher.is_busy() {
            let Some((gesture, layer)) = self.queue.pop_front() else {
                break;
            };
            self.run(gesture, layer, now, sink, outcome);
        }
    }

    /// Resolve a gesture and execute its action
    fn run<S: HidSink>(
        &mut self,
        gesture: GestureKind,
        layer: Layer,
        now: Millis,
        sink: &mut S,
        outcome: &mut StepOutcome,
    ) {
        let _ = outcome.gestures.push(gesture);

        let action = resolve(&self.profiles, self.resolver.active(), layer, gesture);
        trace!("{:?} -> {:?}", gesture, action);

        match action {
            Action::ProfileControl(control) => {
                if let Some(change) = self.resolver.apply(*control) {
                    self.dispatcher.release_all(sink);
                    outcome.persist = Some(change.to);
                }
            }
            _ => {
                let sensitivity = self.profiles.profile(self.resolver.active()).sensitivity;
                self.dispatcher.dispatch(action, &sensitivity, now, sink);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{HidEvent, KeyCode, ProfileControl, SimpleAction, Step};
    use crate::config::defaults::default_profiles;
    use crate::profile::Sensitivity;

    const POLL_MS: Millis = 2;

    /// Sink that stamps each event with the loop time
    #[derive(Default)]
    struct Timeline {
        now: Millis,
        events: std::vec::Vec<(Millis, HidEvent)>,
    }

    impl HidSink for Timeline {
        fn emit(&mut self, event: HidEvent) {
            self.events.push((self.now, event));
        }
    }

    /// Drives a knob with synthetic pin levels at the 2 ms poll rate
    struct Bench {
        knob: Knob,
        sink: Timeline,
        now: Millis,
        switch_down: bool,
        gestures: std::vec::Vec<GestureKind>,
        persisted: std::vec::Vec<u8>,
    }

    impl Bench {
        fn new(config: KnobConfig) -> Self {
            Self {
                knob: Knob::new(config, PinSample::idle()),
                sink: Timeline::default(),
                now: 1000,
                switch_down: false,
                gestures: std::vec::Vec::new(),
                persisted: std::vec::Vec::new(),
            }
        }

        fn poll(&mut self, a: bool, b: bool) {
            self.sink.now = self.now;
            let sample = PinSample {
                a,
                b,
                switch: !self.switch_down,
            };
            let outcome = self.knob.step(sample, self.now, &mut self.sink);
            self.gestures.extend(outcome.gestures.iter().copied());
            self.persisted.extend(outcome.persist);
            self.now += POLL_MS;
        }

        fn wait(&mut self, ms: Millis) {
            for _ in 0..ms / POLL_MS {
                self.poll(true, true);
            }
        }

        fn press(&mut self) {
            self.switch_down = true;
            self.wait(6);
        }

        fn release(&mut self) {
            self.switch_down = false;
            self.wait(6);
        }

        fn click(&mut self) {
            self.press();
            self.wait(40);
            self.release();
        }

        /// One detent clockwise, each phase held for three polls
        fn cw(&mut self) {
            for (a, b) in [(false, true), (false, false), (true, false), (true, true)] {
                for _ in 0..3 {
                    self.poll(a, b);
                }
            }
        }

        fn events(&self) -> std::vec::Vec<HidEvent> {
            self.sink.events.iter().map(|(_, e)| *e).collect()
        }

        fn time_of(&self, event: HidEvent) -> Option<Millis> {
            self.sink.events.iter().find(|(_, e)| *e == event).map(|(t, _)| *t)
        }
    }

    fn config_with(bindings: &[(GestureKind, Action)]) -> KnobConfig {
        let mut config = KnobConfig::default();
        for (gesture, action) in bindings {
            config.profiles.profiles[0].set(*gesture, action.clone());
        }
        config.profiles.profiles[0].sensitivity = Sensitivity::default();
        config
    }

    fn demo_macro() -> Action {
        Action::from_steps(&[
            Step::KeyPress(KeyCode::A),
            Step::Wait(50),
            Step::KeyTap(KeyCode::B),
            Step::ReleaseAll,
        ])
    }

    #[test]
    fn test_spaced_clicks() {
        let mut bench = Bench::new(KnobConfig::default());
        bench.click();
        bench.wait(400);
        bench.click();
        bench.wait(400);
        assert_eq!(
            bench.gestures,
            [GestureKind::SingleClick, GestureKind::SingleClick]
        );
        assert_eq!(bench.events(), [HidEvent::Mute, HidEvent::Mute]);
    }

    #[test]
    fn test_double_click() {
        let mut bench = Bench::new(config_with(&[
            (GestureKind::SingleClick, Action::Simple(SimpleAction::Mute)),
            (GestureKind::DoubleClick, Action::Simple(SimpleAction::PlayPause)),
        ]));
        bench.click();
        bench.wait(50);
        bench.click();
        bench.wait(400);
        assert_eq!(bench.gestures, [GestureKind::DoubleClick]);
        assert_eq!(
            bench.events(),
            [HidEvent::Media(crate::action::MediaKey::PlayPause)]
        );
    }

    #[test]
    fn test_triple_click_fires_on_third_release() {
        let mut bench = Bench::new(config_with(&[(
            GestureKind::TripleClick,
            Action::Simple(SimpleAction::Redo),
        )]));
        bench.click();
        bench.wait(50);
        bench.click();
        bench.wait(50);
        bench.click();
        // No waiting for the window to close
        assert_eq!(bench.gestures, [GestureKind::TripleClick]);
        assert_eq!(bench.events().len(), 1);
        bench.wait(400);
        assert_eq!(bench.gestures, [GestureKind::TripleClick]);
    }

    #[test]
    fn test_long_press_switches_profile() {
        let mut bench = Bench::new(KnobConfig::default());
        bench.press();
        bench.wait(700);
        bench.release();
        bench.wait(400);
        assert_eq!(bench.gestures, [GestureKind::LongPress]);
        assert!(bench.events().is_empty());
        assert_eq!(bench.persisted, [1]);
        assert_eq!(bench.knob.active_profile(), 1);
    }

    #[test]
    fn test_next_profile_wraps_and_persists() {
        let mut config = KnobConfig {
            active_profile: 2,
            ..KnobConfig::default()
        };
        config.profiles.profiles[2].set(
            GestureKind::LongPress,
            Action::ProfileControl(ProfileControl::NextProfile),
        );
        let mut bench = Bench::new(config);
        bench.press();
        bench.wait(700);
        bench.release();
        assert_eq!(bench.persisted, [0]);
        assert_eq!(bench.knob.active_profile(), 0);
    }

    #[test]
    fn test_rotation_while_held_is_shift_only() {
        let config = KnobConfig {
            active_profile: 2,
            profiles: default_profiles(),
            ..KnobConfig::default()
        };
        let mut bench = Bench::new(config);
        bench.press();
        bench.cw();
        bench.cw();
        bench.wait(1000);
        bench.release();
        bench.wait(400);
        assert_eq!(
            bench.gestures,
            [GestureKind::ShiftRotateCw, GestureKind::ShiftRotateCw]
        );
        assert_eq!(
            bench.events(),
            [HidEvent::ScrollHorizontal(1), HidEvent::ScrollHorizontal(1)]
        );
        assert_eq!(bench.knob.resolver().layer(), crate::profile::Layer::Base);
    }

    #[test]
    fn test_scroll_multiplier() {
        let mut config = config_with(&[(
            GestureKind::RotateCw,
            Action::Simple(SimpleAction::ScrollUp),
        )]);
        config.profiles.profiles[0].sensitivity.scroll = 4;
        let mut bench = Bench::new(config);
        bench.cw();
        assert_eq!(bench.events(), [HidEvent::ScrollVertical(4)]);
    }

    /// Click, then step until the macro has pressed A; returns that time
    fn start_macro(bench: &mut Bench) -> Millis {
        bench.click();
        for _ in 0..200 {
            if let Some(t) = bench.time_of(HidEvent::KeyPress(KeyCode::A)) {
                return t;
            }
            bench.wait(POLL_MS);
        }
        panic!("macro never started");
    }

    #[test]
    fn test_macro_finishes_before_queued_gesture() {
        let mut bench = Bench::new(config_with(&[
            (GestureKind::SingleClick, demo_macro()),
            (GestureKind::RotateCw, Action::Simple(SimpleAction::VolumeUp)),
        ]));
        let started = start_macro(&mut bench);

        // Turn during the wait
        bench.cw();
        assert_eq!(bench.events(), [HidEvent::KeyPress(KeyCode::A)]);
        assert_eq!(bench.knob.queued(), 1);

        bench.wait(100);
        assert_eq!(
            bench.events(),
            [
                HidEvent::KeyPress(KeyCode::A),
                HidEvent::KeyPress(KeyCode::B),
                HidEvent::KeyRelease(KeyCode::B),
                HidEvent::KeyRelease(KeyCode::A),
                HidEvent::VolumeUp(1),
            ]
        );
        assert_eq!(bench.time_of(HidEvent::KeyPress(KeyCode::B)), Some(started + 50));
        assert!(bench.knob.dispatcher().held_keys().is_empty());
    }

    fn long_macro() -> Action {
        Action::from_steps(&[
            Step::KeyPress(KeyCode::A),
            Step::Wait(1500),
            Step::Wait(1500),
            Step::ReleaseAll,
        ])
    }

    #[test]
    fn test_queued_rotation_keeps_its_layer() {
        let mut bench = Bench::new(config_with(&[
            (GestureKind::SingleClick, long_macro()),
            (GestureKind::RotateCw, Action::Simple(SimpleAction::VolumeUp)),
            (GestureKind::ShiftRotateCw, Action::Simple(SimpleAction::NextTrack)),
        ]));
        start_macro(&mut bench);

        bench.cw();
        bench.press();
        bench.cw();
        assert_eq!(bench.knob.queued(), 2);

        // Switch still held when the macro ends and the queue drains
        bench.wait(3500);
        assert_eq!(
            bench.events(),
            [
                HidEvent::KeyPress(KeyCode::A),
                HidEvent::KeyRelease(KeyCode::A),
                HidEvent::VolumeUp(1),
                HidEvent::Media(crate::action::MediaKey::NextTrack),
            ]
        );
        assert_eq!(
            bench.gestures[1..],
            [GestureKind::RotateCw, GestureKind::ShiftRotateCw]
        );
    }

    #[test]
    fn test_full_queue_aborts_macro_instead_of_dropping() {
        let mut bench = Bench::new(config_with(&[
            (GestureKind::SingleClick, long_macro()),
            (GestureKind::RotateCw, Action::Simple(SimpleAction::VolumeUp)),
        ]));
        start_macro(&mut bench);

        let turns = GESTURE_QUEUE_LEN + 4;
        for _ in 0..turns {
            bench.cw();
        }
        bench.wait(3500);

        let events = bench.events();
        assert_eq!(
            events[..2],
            [HidEvent::KeyPress(KeyCode::A), HidEvent::KeyRelease(KeyCode::A)]
        );
        assert_eq!(
            events.iter().filter(|e| **e == HidEvent::VolumeUp(1)).count(),
            turns
        );
        assert_eq!(events.len(), turns + 2);
        assert_eq!(bench.knob.queued(), 0);
        assert!(!bench.knob.dispatcher().is_busy());
        assert!(bench.knob.dispatcher().held_keys().is_empty());
    }

    #[test]
    fn test_abort_policy_releases_before_next_action() {
        let config = KnobConfig {
            macro_policy: MacroPolicy::Abort,
            ..config_with(&[
                (GestureKind::SingleClick, demo_macro()),
                (GestureKind::RotateCw, Action::Simple(SimpleAction::VolumeUp)),
            ])
        };
        let mut bench = Bench::new(config);
        start_macro(&mut bench);

        bench.cw();
        bench.wait(100);
        assert_eq!(
            bench.events(),
            [
                HidEvent::KeyPress(KeyCode::A),
                HidEvent::KeyRelease(KeyCode::A),
                HidEvent::VolumeUp(1),
            ]
        );
        assert!(!bench.knob.dispatcher().is_busy());
    }

    #[test]
    fn test_profile_control_waits_for_macro() {
        let mut bench = Bench::new(config_with(&[
            (GestureKind::SingleClick, demo_macro()),
            (
                GestureKind::RotateCw,
                Action::ProfileControl(ProfileControl::SetProfile(1)),
            ),
        ]));
        start_macro(&mut bench);
        bench.cw();
        assert_eq!(bench.knob.active_profile(), 0);
        bench.wait(100);
        assert_eq!(bench.knob.active_profile(), 1);
        assert_eq!(bench.persisted, [1]);
        assert_eq!(bench.events().len(), 4);
    }

    #[test]
    fn test_idle_knob_is_quiet() {
        let mut bench = Bench::new(KnobConfig::default());
        bench.wait(2000);
        assert!(bench.gestures.is_empty());
        assert!(bench.events().is_empty());
        assert!(bench.persisted.is_empty());
    }
}
