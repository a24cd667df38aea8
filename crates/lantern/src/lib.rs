//! Lantern front end: menus, pause, audio mixing and scene transitions.

pub mod audio;
pub mod dialogue;
pub mod input;
pub mod pause;
pub mod preferences;
pub mod scenes;
pub mod transition;
pub mod ui;
pub mod utils;

use app::LOG_SCENES;
use bevy::prelude::*;

use crate::input::MenuNavigationPlugin;
use crate::pause::PausePlugin;
use crate::scenes::{SceneEntry, SceneId, SceneRegistry, StartScene};
use crate::transition::TransitionPlugin;
use crate::ui::UIPlugin;

/// Game state tracking where we are in the application flow.
#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[default]
    MainMenu,
    InGame,
}

/// Which screen of the main menu is shown.
#[derive(SubStates, Debug, Clone, PartialEq, Eq, Hash, Default)]
#[source(GameState = GameState::MainMenu)]
pub enum MenuScreen {
    #[default]
    Main,
    Options,
}

/// The scene list every build ships with.
pub fn default_scenes() -> SceneRegistry {
    SceneRegistry::default()
        .with_scene(SceneEntry::new("main_menu", GameState::MainMenu))
        .with_scene(SceneEntry::new("world", GameState::InGame))
}

/// Everything between the window and the game world: states, menus,
/// pause and scene transitions.
pub struct FrontEndPlugin {
    scenes: SceneRegistry,
    start_scene: SceneId,
}

impl Default for FrontEndPlugin {
    fn default() -> Self {
        Self {
            scenes: default_scenes(),
            start_scene: SceneId::from("world"),
        }
    }
}

impl FrontEndPlugin {
    pub fn with_scenes(mut self, scenes: SceneRegistry) -> Self {
        self.scenes = scenes;
        self
    }

    pub fn with_start_scene(mut self, scene: impl Into<SceneId>) -> Self {
        self.start_scene = scene.into();
        self
    }
}

impl Plugin for FrontEndPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .add_sub_state::<MenuScreen>()
            .insert_resource(self.scenes.clone())
            .insert_resource(StartScene(self.start_scene.clone()))
            .add_plugins((MenuNavigationPlugin, TransitionPlugin, PausePlugin, UIPlugin))
            .add_systems(Startup, validate_start_scene);
    }
}

/// A start scene missing from the scene list is the one configuration error
/// worth shouting about; the menu keeps working either way.
fn validate_start_scene(start: Res<StartScene>, registry: Res<SceneRegistry>) {
    if !registry.contains(&start.0) {
        error!(
            target: LOG_SCENES,
            scene = %start.0,
            known = registry.len(),
            "start scene is not in the scene list"
        );
    }
}
