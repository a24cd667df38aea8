mod in_game;
mod main_menu;
mod options;
mod pause_menu;

use bevy::prelude::*;

pub use in_game::InGameScenePlugin;
pub use main_menu::{MainMenuItem, MainMenuScenePlugin};
pub use options::{OptionsRow, OptionsScenePlugin};
pub use pause_menu::{PauseMenuItem, PauseMenuScenePlugin};

/// Main scene plugin that coordinates all screen sub-plugins
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            MainMenuScenePlugin,
            OptionsScenePlugin,
            InGameScenePlugin,
            PauseMenuScenePlugin,
        ));
    }
}
