//! Loading screen widgets and the Bevy side of the transition sequencer.

use app::LOG_SCENES;
use bevy::color::Alpha;
use bevy::ecs::system::SystemParam;
use bevy::picking::Pickable;
use bevy::prelude::*;
use bevy::ui::FocusPolicy;
use settings::SettingsArc;

use super::sequencer::{SceneTransitionSequencer, TransitionConfig, TransitionHost, TransitionState};
use crate::GameState;
use crate::input::MenuNavigation;
use crate::preferences::TransitionSettings;
use crate::scenes::{AssetSceneLoad, SceneId, SceneRegistry};

/// Root of the loading screen; its background is the transition overlay.
#[derive(Component)]
pub struct LoadingOverlay;

/// Progress bar frame and label.
#[derive(Component)]
pub struct ProgressGroup;

/// The bar itself; its width is the published progress.
#[derive(Component)]
pub struct ProgressFill;

#[derive(Component)]
pub struct PressAnyKeyPrompt;

/// Owns the single transition sequencer of the game.
#[derive(Resource, Default, Deref, DerefMut)]
pub struct SceneLoadManager(pub SceneTransitionSequencer);

/// The load issued by the running transition, if any.
#[derive(Resource, Default)]
struct ActiveSceneLoad(Option<AssetSceneLoad>);

/// Ask for a transition to another scene.
#[derive(Message, Debug, Clone)]
pub struct LoadSceneRequest {
    pub scene: SceneId,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionStateChanged {
    pub from: TransitionState,
    pub to: TransitionState,
}

pub struct LoadingScreenPlugin;

impl Plugin for LoadingScreenPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneLoadManager>()
            .init_resource::<ActiveSceneLoad>()
            .init_resource::<SceneRegistry>()
            .add_message::<LoadSceneRequest>()
            .add_message::<TransitionStateChanged>()
            .add_systems(Startup, spawn_loading_screen)
            .add_systems(
                Update,
                (
                    sync_transition_config,
                    queue_load_requests,
                    tick_scene_transition,
                    lock_menus_while_loading,
                )
                    .chain(),
            );
    }
}

fn spawn_loading_screen(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::End,
                align_items: AlignItems::Center,
                padding: UiRect::bottom(Val::Px(80.0)),
                row_gap: Val::Px(16.0),
                ..default()
            },
            BackgroundColor(Color::BLACK.with_alpha(0.0)),
            GlobalZIndex(i32::MAX - 2),
            FocusPolicy::Pass,
            Pickable::IGNORE,
            LoadingOverlay,
            Name::new("Loading Overlay"),
        ))
        .with_children(|parent| {
            parent
                .spawn((
                    Node {
                        width: Val::Px(420.0),
                        height: Val::Px(18.0),
                        border: UiRect::all(Val::Px(2.0)),
                        ..default()
                    },
                    BorderColor::all(Color::srgb(0.9, 0.9, 0.9)),
                    BorderRadius::all(Val::Px(4.0)),
                    Visibility::Hidden,
                    ProgressGroup,
                ))
                .with_children(|bar| {
                    bar.spawn((
                        Node {
                            width: Val::Percent(0.0),
                            height: Val::Percent(100.0),
                            ..default()
                        },
                        BackgroundColor(Color::srgb(0.95, 0.75, 0.35)),
                        ProgressFill,
                    ));
                });

            parent.spawn((
                Text::new("Press any key"),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(Color::srgb(0.9, 0.9, 0.9)),
                Visibility::Hidden,
                PressAnyKeyPrompt,
            ));
        });
}

/// [`TransitionHost`] over the loading screen widgets, the asset server and
/// the raw input resources.
#[derive(SystemParam)]
struct LoadingScreenHost<'w, 's> {
    registry: Res<'w, SceneRegistry>,
    asset_server: Res<'w, AssetServer>,
    active: ResMut<'w, ActiveSceneLoad>,
    state: Res<'w, State<GameState>>,
    next_state: ResMut<'w, NextState<GameState>>,
    keys: Option<Res<'w, ButtonInput<KeyCode>>>,
    mouse: Option<Res<'w, ButtonInput<MouseButton>>>,
    gamepads: Query<'w, 's, &'static Gamepad>,
    overlay: Query<
        'w,
        's,
        (&'static mut BackgroundColor, &'static mut FocusPolicy),
        With<LoadingOverlay>,
    >,
    fill: Query<'w, 's, &'static mut Node, With<ProgressFill>>,
    progress_group: Query<
        'w,
        's,
        &'static mut Visibility,
        (With<ProgressGroup>, Without<PressAnyKeyPrompt>),
    >,
    prompt: Query<
        'w,
        's,
        &'static mut Visibility,
        (With<PressAnyKeyPrompt>, Without<ProgressGroup>),
    >,
}

impl TransitionHost for LoadingScreenHost<'_, '_> {
    fn begin_load(&mut self, scene: &SceneId) -> bool {
        let Some(entry) = self.registry.resolve(scene) else {
            return false;
        };
        info!(
            target: LOG_SCENES,
            scene = %entry.name,
            assets = entry.assets.len(),
            "loading scene"
        );
        self.active.0 = Some(AssetSceneLoad::begin(entry, &self.asset_server));
        true
    }

    fn load_progress(&mut self) -> f32 {
        match self.active.0.as_mut() {
            Some(load) => load.native_progress(&self.asset_server),
            None => 0.0,
        }
    }

    fn allow_activation(&mut self) {
        if let Some(load) = self.active.0.as_mut() {
            load.allow_activation(&mut self.next_state);
        }
    }

    fn is_activated(&self) -> bool {
        self.active
            .0
            .as_ref()
            .is_some_and(|load| load.is_activated(self.state.get()))
    }

    fn any_input(&self) -> bool {
        let key = self
            .keys
            .as_ref()
            .is_some_and(|keys| keys.get_just_pressed().next().is_some());
        let click = self
            .mouse
            .as_ref()
            .is_some_and(|mouse| mouse.get_just_pressed().next().is_some());
        let button = self
            .gamepads
            .iter()
            .any(|gamepad| gamepad.get_just_pressed().next().is_some());
        key || click || button
    }

    fn set_overlay_alpha(&mut self, alpha: f32) {
        for (mut color, mut focus) in &mut self.overlay {
            color.0.set_alpha(alpha);
            // A visible overlay swallows clicks meant for the menu beneath.
            *focus = if alpha > 0.0 {
                FocusPolicy::Block
            } else {
                FocusPolicy::Pass
            };
        }
    }

    fn set_progress(&mut self, progress: f32) {
        for mut node in &mut self.fill {
            node.width = Val::Percent(progress * 100.0);
        }
    }

    fn set_progress_visible(&mut self, visible: bool) {
        for mut visibility in &mut self.progress_group {
            *visibility = visible_if(visible);
        }
    }

    fn set_prompt_visible(&mut self, visible: bool) {
        for mut visibility in &mut self.prompt {
            *visibility = visible_if(visible);
        }
    }
}

fn visible_if(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn sync_transition_config(
    settings: Option<Res<SettingsArc<TransitionSettings>>>,
    mut manager: ResMut<SceneLoadManager>,
) {
    let Some(settings) = settings else {
        return;
    };
    if settings.is_changed() {
        manager.set_config(TransitionConfig::from(&*settings.0));
    }
}

fn queue_load_requests(
    mut requests: MessageReader<LoadSceneRequest>,
    registry: Res<SceneRegistry>,
    mut manager: ResMut<SceneLoadManager>,
    mut changes: MessageWriter<TransitionStateChanged>,
) {
    for request in requests.read() {
        if !registry.contains(&request.scene) {
            debug!(target: LOG_SCENES, scene = %request.scene, "unknown scene, request skipped");
            continue;
        }
        let from = manager.state();
        if manager.request_load(request.scene.clone()) {
            info!(target: LOG_SCENES, scene = %request.scene, "scene transition started");
            changes.write(TransitionStateChanged {
                from,
                to: manager.state(),
            });
        }
    }
}

fn tick_scene_transition(
    time: Res<Time<Real>>,
    mut manager: ResMut<SceneLoadManager>,
    mut host: LoadingScreenHost,
    mut changes: MessageWriter<TransitionStateChanged>,
) {
    let Some(change) = manager.tick(time.delta_secs(), &mut host) else {
        return;
    };
    if change.to == TransitionState::Idle {
        host.active.0 = None;
        info!(target: LOG_SCENES, "scene transition finished");
    }
    changes.write(TransitionStateChanged {
        from: change.from,
        to: change.to,
    });
}

fn lock_menus_while_loading(
    manager: Res<SceneLoadManager>,
    navigation: Option<ResMut<MenuNavigation>>,
) {
    if let Some(mut navigation) = navigation {
        let enabled = !manager.is_loading();
        if navigation.enabled() != enabled {
            navigation.set_enabled(enabled);
        }
    }
}
