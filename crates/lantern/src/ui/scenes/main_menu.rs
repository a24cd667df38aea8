//! Main menu screen: Play, Options, Quit.

use app::{LOG_SCENES, LOG_UI};
use bevy::prelude::*;

use crate::MenuScreen;
use crate::input::MenuSubmitted;
use crate::scenes::{SceneRegistry, StartScene};
use crate::transition::LoadSceneRequest;
use crate::ui::components::{menu_root, spawn_menu_button, title};
use crate::utils::cleanup;

pub struct MainMenuScenePlugin;

impl Plugin for MainMenuScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(MenuScreen::Main), spawn_ui)
            .add_systems(OnExit(MenuScreen::Main), cleanup::<MainMenuUI>)
            .add_systems(
                Update,
                handle_submissions.run_if(in_state(MenuScreen::Main)),
            );
    }
}

/// Marker component for main menu UI entities
#[derive(Component)]
struct MainMenuUI;

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MainMenuItem {
    Play,
    Options,
    Quit,
}

impl MainMenuItem {
    pub const ALL: [MainMenuItem; 3] = [
        MainMenuItem::Play,
        MainMenuItem::Options,
        MainMenuItem::Quit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MainMenuItem::Play => "Play",
            MainMenuItem::Options => "Options",
            MainMenuItem::Quit => "Quit",
        }
    }
}

fn spawn_ui(mut commands: Commands) {
    commands
        .spawn((menu_root(), MainMenuUI, Name::new("Main Menu UI Root")))
        .with_children(|parent| {
            parent.spawn(title("Lantern", 56.0));
            for (order, item) in MainMenuItem::ALL.into_iter().enumerate() {
                spawn_menu_button(parent, item.label(), order, item, ());
            }
        });
}

fn handle_submissions(
    mut submitted: MessageReader<MenuSubmitted>,
    items: Query<&MainMenuItem>,
    start: Option<Res<StartScene>>,
    registry: Res<SceneRegistry>,
    mut loads: MessageWriter<LoadSceneRequest>,
    mut next_screen: ResMut<NextState<MenuScreen>>,
    mut exit: MessageWriter<AppExit>,
) {
    for message in submitted.read() {
        let Ok(item) = items.get(message.item) else {
            continue;
        };
        info!(target: LOG_UI, item = item.label(), "main menu item chosen");

        match item {
            MainMenuItem::Play => match start.as_deref() {
                Some(StartScene(scene)) if registry.contains(scene) => {
                    loads.write(LoadSceneRequest {
                        scene: scene.clone(),
                    });
                }
                Some(StartScene(scene)) => {
                    error!(target: LOG_SCENES, %scene, "start scene is not in the scene list");
                }
                None => {
                    error!(target: LOG_SCENES, "no start scene configured");
                }
            },
            MainMenuItem::Options => next_screen.set(MenuScreen::Options),
            MainMenuItem::Quit => {
                exit.write(AppExit::Success);
            }
        }
    }
}
