//! Scene transition sequencer.
//!
//! A one-shot state machine per load request: fade the overlay in, issue the
//! load with activation held back, publish progress, wait behind a "press any
//! key" gate, activate and fade back out. It is advanced by one [`tick`] per
//! frame and never blocks; everything it touches goes through
//! [`TransitionHost`] so it runs the same in the game and in tests.
//!
//! [`tick`]: SceneTransitionSequencer::tick

use app::LOG_SCENES;
use tracing::{debug, warn};

use super::fade::{Easing, Fade};
use crate::preferences::TransitionSettings;
use crate::scenes::SceneId;

/// Native progress at which a deferred load is ready to activate.
pub const ACTIVATION_THRESHOLD: f32 = 0.9;

/// Map native load progress to the `[0, 1]` value shown in the progress bar.
pub fn display_progress(native: f32) -> f32 {
    if !native.is_finite() {
        return 0.0;
    }
    (native / ACTIVATION_THRESHOLD).clamp(0.0, 1.0)
}

/// The scene a transition is heading to. Owned by the sequencer for exactly
/// one transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub scene: SceneId,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransitionState {
    #[default]
    Idle,
    FadingIn,
    TrackingProgress,
    WaitingForInput,
    Activating,
    FadingOut,
}

/// Everything the sequencer needs from the outside world.
///
/// Missing widgets are the host's business: setters on absent UI are
/// expected to do nothing.
pub trait TransitionHost {
    /// Start loading `scene` with activation suppressed. Returns `false` if
    /// the load could not be issued.
    fn begin_load(&mut self, scene: &SceneId) -> bool;
    /// Native progress of the pending load, capped at
    /// [`ACTIVATION_THRESHOLD`] until activation is allowed.
    fn load_progress(&mut self) -> f32;
    fn allow_activation(&mut self);
    fn is_activated(&self) -> bool;
    /// Edge-triggered: true only on the frame an input was pressed.
    fn any_input(&self) -> bool;
    fn set_overlay_alpha(&mut self, alpha: f32);
    fn set_progress(&mut self, progress: f32);
    fn set_progress_visible(&mut self, visible: bool);
    fn set_prompt_visible(&mut self, visible: bool);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionConfig {
    pub fade_in_secs: f32,
    pub fade_out_secs: f32,
    pub easing: Easing,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self::from(&TransitionSettings::default())
    }
}

impl From<&TransitionSettings> for TransitionConfig {
    fn from(settings: &TransitionSettings) -> Self {
        Self {
            fade_in_secs: settings.fade_in_secs,
            fade_out_secs: settings.fade_out_secs,
            easing: settings.easing,
        }
    }
}

/// A state change reported by [`SceneTransitionSequencer::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateChange {
    pub from: TransitionState,
    pub to: TransitionState,
}

#[derive(Debug, Default)]
pub struct SceneTransitionSequencer {
    state: TransitionState,
    request: Option<LoadRequest>,
    fade: Option<Fade>,
    progress: f32,
    config: TransitionConfig,
}

impl SceneTransitionSequencer {
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// True from the accepted request until the fade-out has finished.
    pub fn is_loading(&self) -> bool {
        self.state != TransitionState::Idle
    }

    /// Last published display progress.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn request(&self) -> Option<&LoadRequest> {
        self.request.as_ref()
    }

    pub fn config(&self) -> TransitionConfig {
        self.config
    }

    /// New durations apply to the next fade that starts.
    pub fn set_config(&mut self, config: TransitionConfig) {
        self.config = config;
    }

    /// Start a transition to `scene`.
    ///
    /// Ignored (returns `false`) while another transition runs or when the
    /// scene name is empty.
    pub fn request_load(&mut self, scene: SceneId) -> bool {
        if self.is_loading() {
            debug!(target: LOG_SCENES, %scene, "transition already running, request ignored");
            return false;
        }
        if matches!(&scene, SceneId::Name(name) if name.is_empty()) {
            return false;
        }

        self.request = Some(LoadRequest { scene });
        self.progress = 0.0;
        self.fade = Some(
            Fade::new(0.0, 1.0, self.config.fade_in_secs).with_easing(self.config.easing),
        );
        self.state = TransitionState::FadingIn;
        true
    }

    /// Advance the transition by one frame.
    pub fn tick<H: TransitionHost>(&mut self, dt: f32, host: &mut H) -> Option<StateChange> {
        let from = self.state;
        let to = match from {
            TransitionState::Idle => return None,
            TransitionState::FadingIn => self.tick_fade_in(dt, host),
            TransitionState::TrackingProgress => self.tick_progress(host),
            TransitionState::WaitingForInput => self.tick_gate(host),
            TransitionState::Activating => self.tick_activation(host),
            TransitionState::FadingOut => self.tick_fade_out(dt, host),
        };

        if to == from {
            return None;
        }
        debug!(target: LOG_SCENES, ?from, ?to, "transition state changed");
        self.state = to;
        Some(StateChange { from, to })
    }

    fn tick_fade_in<H: TransitionHost>(&mut self, dt: f32, host: &mut H) -> TransitionState {
        let Some(fade) = self.fade.as_mut() else {
            return TransitionState::FadingOut;
        };
        host.set_overlay_alpha(fade.advance(dt));
        if !fade.is_finished() {
            return TransitionState::FadingIn;
        }

        let Some(request) = self.request.as_ref() else {
            return self.start_fade_out();
        };
        if !host.begin_load(&request.scene) {
            warn!(target: LOG_SCENES, scene = %request.scene, "scene could not be loaded");
            return self.start_fade_out();
        }

        self.progress = 0.0;
        host.set_progress(0.0);
        host.set_progress_visible(true);
        TransitionState::TrackingProgress
    }

    fn tick_progress<H: TransitionHost>(&mut self, host: &mut H) -> TransitionState {
        let native = host.load_progress();
        if native < ACTIVATION_THRESHOLD {
            self.progress = self.progress.max(display_progress(native));
            host.set_progress(self.progress);
            return TransitionState::TrackingProgress;
        }

        self.progress = 1.0;
        host.set_progress(1.0);
        host.set_prompt_visible(true);
        TransitionState::WaitingForInput
    }

    // The prompt became visible on an earlier tick, so the keypress that
    // reached this tick was made while it was on screen.
    fn tick_gate<H: TransitionHost>(&mut self, host: &mut H) -> TransitionState {
        if !host.any_input() {
            return TransitionState::WaitingForInput;
        }
        host.allow_activation();
        host.set_prompt_visible(false);
        host.set_progress_visible(false);
        TransitionState::Activating
    }

    fn tick_activation<H: TransitionHost>(&mut self, host: &mut H) -> TransitionState {
        if host.is_activated() {
            self.start_fade_out()
        } else {
            TransitionState::Activating
        }
    }

    fn tick_fade_out<H: TransitionHost>(&mut self, dt: f32, host: &mut H) -> TransitionState {
        let finished = match self.fade.as_mut() {
            Some(fade) => {
                host.set_overlay_alpha(fade.advance(dt));
                fade.is_finished()
            }
            None => {
                host.set_overlay_alpha(0.0);
                true
            }
        };
        if !finished {
            return TransitionState::FadingOut;
        }

        self.fade = None;
        self.request = None;
        TransitionState::Idle
    }

    fn start_fade_out(&mut self) -> TransitionState {
        self.fade = Some(
            Fade::new(1.0, 0.0, self.config.fade_out_secs).with_easing(self.config.easing),
        );
        TransitionState::FadingOut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockHost {
        loadable: bool,
        native: f32,
        input: bool,
        activation_allowed: bool,
        activated: bool,
        loads: Vec<SceneId>,
        alphas: Vec<f32>,
        progress: Vec<f32>,
        progress_visible: bool,
        prompt_visible: bool,
    }

    impl MockHost {
        fn loadable() -> Self {
            Self {
                loadable: true,
                ..Default::default()
            }
        }
    }

    impl TransitionHost for MockHost {
        fn begin_load(&mut self, scene: &SceneId) -> bool {
            self.loads.push(scene.clone());
            self.loadable
        }

        fn load_progress(&mut self) -> f32 {
            self.native
        }

        fn allow_activation(&mut self) {
            self.activation_allowed = true;
        }

        fn is_activated(&self) -> bool {
            self.activated
        }

        fn any_input(&self) -> bool {
            self.input
        }

        fn set_overlay_alpha(&mut self, alpha: f32) {
            self.alphas.push(alpha);
        }

        fn set_progress(&mut self, progress: f32) {
            self.progress.push(progress);
        }

        fn set_progress_visible(&mut self, visible: bool) {
            self.progress_visible = visible;
        }

        fn set_prompt_visible(&mut self, visible: bool) {
            self.prompt_visible = visible;
        }
    }

    fn sequencer() -> SceneTransitionSequencer {
        SceneTransitionSequencer::new(TransitionConfig {
            fade_in_secs: 0.5,
            fade_out_secs: 0.5,
            easing: Easing::Linear,
        })
    }

    fn run_until(
        seq: &mut SceneTransitionSequencer,
        host: &mut MockHost,
        state: TransitionState,
    ) -> usize {
        for ticks in 1..=1000 {
            seq.tick(0.1, host);
            if seq.state() == state {
                return ticks;
            }
        }
        panic!("never reached {state:?}");
    }

    #[test]
    fn second_request_while_loading_is_ignored() {
        let mut seq = sequencer();
        let mut host = MockHost::loadable();

        assert!(seq.request_load(SceneId::from("world")));
        assert!(!seq.request_load(SceneId::from("other")));
        run_until(&mut seq, &mut host, TransitionState::TrackingProgress);

        assert_eq!(host.loads, vec![SceneId::from("world")]);
        assert!(!seq.request_load(SceneId::from("other")));
    }

    #[test]
    fn empty_scene_name_is_skipped() {
        let mut seq = sequencer();
        assert!(!seq.request_load(SceneId::from("")));
        assert!(!seq.is_loading());
    }

    #[test]
    fn full_sequence_runs_in_order() {
        let mut seq = sequencer();
        let mut host = MockHost::loadable();
        seq.request_load(SceneId::from("world"));

        run_until(&mut seq, &mut host, TransitionState::TrackingProgress);
        assert_eq!(*host.alphas.last().unwrap(), 1.0);
        assert!(host.progress_visible);

        host.native = 0.45;
        seq.tick(0.1, &mut host);
        assert!((seq.progress() - 0.5).abs() < 1e-6);

        host.native = 0.9;
        seq.tick(0.1, &mut host);
        assert_eq!(seq.state(), TransitionState::WaitingForInput);
        assert_eq!(seq.progress(), 1.0);
        assert!(host.prompt_visible);

        // No input: stays at the gate indefinitely.
        for _ in 0..50 {
            seq.tick(0.1, &mut host);
        }
        assert_eq!(seq.state(), TransitionState::WaitingForInput);
        assert!(!host.activation_allowed);

        host.input = true;
        seq.tick(0.1, &mut host);
        assert_eq!(seq.state(), TransitionState::Activating);
        assert!(host.activation_allowed);
        assert!(!host.prompt_visible);
        assert!(!host.progress_visible);

        seq.tick(0.1, &mut host);
        assert_eq!(seq.state(), TransitionState::Activating);

        host.activated = true;
        seq.tick(0.1, &mut host);
        assert_eq!(seq.state(), TransitionState::FadingOut);

        run_until(&mut seq, &mut host, TransitionState::Idle);
        assert_eq!(*host.alphas.last().unwrap(), 0.0);
        assert!(seq.request().is_none());
        assert!(seq.request_load(SceneId::from("main_menu")));
    }

    #[test]
    fn published_progress_is_bounded_and_non_decreasing() {
        let mut seq = sequencer();
        let mut host = MockHost::loadable();
        seq.request_load(SceneId::Index(1));
        run_until(&mut seq, &mut host, TransitionState::TrackingProgress);

        for step in 0..=20 {
            host.native = step as f32 * 0.05;
            seq.tick(0.016, &mut host);
        }

        let mut prev = 0.0;
        for &p in &host.progress {
            assert!((0.0..=1.0).contains(&p));
            assert!(p >= prev);
            prev = p;
        }
        assert_eq!(prev, 1.0);
    }

    #[test]
    fn failed_load_fades_back_out() {
        let mut seq = sequencer();
        let mut host = MockHost::default();
        seq.request_load(SceneId::from("missing"));

        run_until(&mut seq, &mut host, TransitionState::FadingOut);
        assert!(!host.progress_visible);
        run_until(&mut seq, &mut host, TransitionState::Idle);
        assert_eq!(*host.alphas.last().unwrap(), 0.0);
    }

    #[test]
    fn display_progress_rescales_and_clamps() {
        assert_eq!(display_progress(0.0), 0.0);
        assert!((display_progress(0.45) - 0.5).abs() < 1e-6);
        assert_eq!(display_progress(0.9), 1.0);
        assert_eq!(display_progress(1.0), 1.0);
        assert_eq!(display_progress(-0.3), 0.0);
        assert_eq!(display_progress(f32::NAN), 0.0);
    }
}
