//! In-game pause.
//!
//! [`PauseController`] is a two-state switch; the plugin maps the bound
//! triggers onto it and scales virtual time. UI reacts to the controller
//! changing (see the pause menu scene).

use app::LOG_MAIN;
use bevy::prelude::*;

use crate::GameState;
use crate::transition::SceneLoadManager;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PauseState {
    #[default]
    Running,
    Paused,
}

#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PauseController {
    state: PauseState,
}

impl PauseController {
    pub fn state(&self) -> PauseState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == PauseState::Paused
    }

    pub fn pause(&mut self) {
        self.state = PauseState::Paused;
    }

    pub fn resume(&mut self) {
        self.state = PauseState::Running;
    }

    pub fn toggle(&mut self) -> PauseState {
        self.state = match self.state {
            PauseState::Running => PauseState::Paused,
            PauseState::Paused => PauseState::Running,
        };
        self.state
    }

    /// Scale applied to game time: 0 while paused.
    pub fn time_scale(&self) -> f32 {
        match self.state {
            PauseState::Running => 1.0,
            PauseState::Paused => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PauseTrigger {
    Key(KeyCode),
    Gamepad(GamepadButton),
}

/// Every input that toggles pause.
#[derive(Resource, Clone, Debug)]
pub struct PauseBindings(pub Vec<PauseTrigger>);

impl Default for PauseBindings {
    fn default() -> Self {
        Self(vec![
            PauseTrigger::Key(KeyCode::Escape),
            PauseTrigger::Key(KeyCode::KeyP),
            PauseTrigger::Gamepad(GamepadButton::Start),
        ])
    }
}

#[derive(Message, Debug, Clone, Copy)]
pub struct PauseToggled {
    pub state: PauseState,
}

pub struct PausePlugin;

impl Plugin for PausePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PauseController>()
            .init_resource::<PauseBindings>()
            .add_message::<PauseToggled>()
            .add_systems(
                Update,
                toggle_pause_on_input.run_if(in_state(GameState::InGame)),
            )
            .add_systems(PostUpdate, apply_time_scale)
            .add_systems(OnExit(GameState::InGame), resume_on_leave_game);
    }
}

fn trigger_pressed(
    bindings: &PauseBindings,
    keys: Option<&ButtonInput<KeyCode>>,
    gamepads: &Query<&Gamepad>,
) -> bool {
    bindings.0.iter().any(|trigger| match *trigger {
        PauseTrigger::Key(key) => keys.is_some_and(|keys| keys.just_pressed(key)),
        PauseTrigger::Gamepad(button) => gamepads.iter().any(|pad| pad.just_pressed(button)),
    })
}

/// One toggle per frame, however many triggers fired.
fn toggle_pause_on_input(
    bindings: Res<PauseBindings>,
    keys: Option<Res<ButtonInput<KeyCode>>>,
    gamepads: Query<&Gamepad>,
    loader: Option<Res<SceneLoadManager>>,
    mut controller: ResMut<PauseController>,
    mut toggled: MessageWriter<PauseToggled>,
) {
    if loader.is_some_and(|loader| loader.is_loading()) {
        return;
    }
    if !trigger_pressed(&bindings, keys.as_deref(), &gamepads) {
        return;
    }

    let state = controller.toggle();
    info!(target: LOG_MAIN, ?state, "pause toggled");
    toggled.write(PauseToggled { state });
}

fn apply_time_scale(controller: Res<PauseController>, mut time: ResMut<Time<Virtual>>) {
    if !controller.is_changed() {
        return;
    }
    if controller.is_paused() {
        time.pause();
    } else {
        time.unpause();
    }
}

fn resume_on_leave_game(mut controller: ResMut<PauseController>) {
    if controller.is_paused() {
        controller.resume();
    }
}
