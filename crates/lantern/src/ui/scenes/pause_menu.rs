use app::LOG_UI;
use bevy::prelude::*;
use bevy::ui::FocusPolicy;

use crate::GameState;
use crate::input::MenuSubmitted;
use crate::pause::PauseController;
use crate::scenes::SceneId;
use crate::transition::LoadSceneRequest;
use crate::ui::components::{menu_root, spawn_menu_button, title};
use crate::utils::cleanup;

/// Scene the "Main Menu" entry returns to.
const MAIN_MENU_SCENE: &str = "main_menu";

/// Plugin for the overlay shown while the game is paused
pub struct PauseMenuScenePlugin;

impl Plugin for PauseMenuScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (sync_pause_menu, handle_pause_menu_buttons)
                .chain()
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(OnExit(GameState::InGame), cleanup::<PauseMenuUI>);
    }
}

/// Marker component for pause menu UI entities
#[derive(Component)]
struct PauseMenuUI;

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PauseMenuItem {
    Resume,
    MainMenu,
}

impl PauseMenuItem {
    pub const ALL: [PauseMenuItem; 2] = [PauseMenuItem::Resume, PauseMenuItem::MainMenu];

    pub fn label(self) -> &'static str {
        match self {
            PauseMenuItem::Resume => "Resume",
            PauseMenuItem::MainMenu => "Main Menu",
        }
    }
}

fn sync_pause_menu(
    mut commands: Commands,
    pause: Res<PauseController>,
    existing: Query<Entity, With<PauseMenuUI>>,
) {
    if !pause.is_changed() {
        return;
    }

    if !pause.is_paused() {
        for entity in &existing {
            commands.entity(entity).despawn();
        }
        return;
    }

    if !existing.is_empty() {
        return;
    }

    commands
        .spawn((
            menu_root(),
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.65)),
            // Clicks never reach the game underneath.
            FocusPolicy::Block,
            GlobalZIndex(100),
            PauseMenuUI,
            Name::new("Pause Menu Overlay"),
        ))
        .with_children(|parent| {
            parent.spawn(title("Paused", 40.0));
            for (order, item) in PauseMenuItem::ALL.into_iter().enumerate() {
                spawn_menu_button(parent, item.label(), order, item, ());
            }
        });
}

fn handle_pause_menu_buttons(
    mut submitted: MessageReader<MenuSubmitted>,
    items: Query<&PauseMenuItem>,
    mut pause: ResMut<PauseController>,
    mut loads: MessageWriter<LoadSceneRequest>,
) {
    for message in submitted.read() {
        let Ok(item) = items.get(message.item) else {
            continue;
        };
        info!(target: LOG_UI, item = item.label(), "pause menu item chosen");
        pause.resume();
        if *item == PauseMenuItem::MainMenu {
            loads.write(LoadSceneRequest {
                scene: SceneId::from(MAIN_MENU_SCENE),
            });
        }
    }
}
