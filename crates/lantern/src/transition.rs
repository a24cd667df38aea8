mod fade;
mod loading_screen;
mod sequencer;

use bevy::prelude::*;

pub use fade::{Easing, Fade, FadeFinished, FadeRequest, ScreenFadeOverlay, ScreenFadePlugin};
pub use loading_screen::{
    LoadSceneRequest, LoadingOverlay, LoadingScreenPlugin, PressAnyKeyPrompt, ProgressFill,
    ProgressGroup, SceneLoadManager, TransitionStateChanged,
};
pub use sequencer::{
    ACTIVATION_THRESHOLD, LoadRequest, SceneTransitionSequencer, StateChange, TransitionConfig,
    TransitionHost, TransitionState, display_progress,
};

/// Screen fades plus the loading screen driven by the transition sequencer.
pub struct TransitionPlugin;

impl Plugin for TransitionPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((ScreenFadePlugin, LoadingScreenPlugin));
    }
}
