//! In-game screen: a small HUD and the intro conversation.

use app::LOG_UI;
use bevy::color::Alpha;
use bevy::prelude::*;

use crate::GameState;
use crate::dialogue::{ConversationCursor, NarrativeLibrary};
use crate::pause::PauseController;
use crate::transition::SceneLoadManager;
use crate::ui::components::TEXT_COLOR;
use crate::utils::{cleanup, remove};

const INTRO_CONVERSATION: &str = "intro";

pub struct InGameScenePlugin;

impl Plugin for InGameScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::InGame), (spawn_hud, start_intro))
            .add_systems(
                Update,
                (advance_dialogue, show_dialogue)
                    .chain()
                    .run_if(in_state(GameState::InGame)),
            )
            .add_systems(
                OnExit(GameState::InGame),
                (
                    cleanup::<InGameUI>,
                    cleanup::<DialogueBox>,
                    remove::<ConversationCursor>,
                ),
            );
    }
}

#[derive(Component)]
struct InGameUI;

#[derive(Component)]
struct DialogueBox;

#[derive(Component)]
struct DialogueSpeaker;

#[derive(Component)]
struct DialogueText;

fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Text::new("Esc: pause"),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(TEXT_COLOR.with_alpha(0.6)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            right: Val::Px(16.0),
            ..default()
        },
        InGameUI,
        Name::new("HUD Hint"),
    ));
}

fn start_intro(mut commands: Commands, library: Option<Res<NarrativeLibrary>>) {
    let Some(conversation) = library.and_then(|l| l.get(INTRO_CONVERSATION).cloned()) else {
        return;
    };
    let cursor = ConversationCursor::new(conversation);
    if cursor.is_finished() {
        return;
    }

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Percent(10.0),
                right: Val::Percent(10.0),
                bottom: Val::Px(32.0),
                padding: UiRect::all(Val::Px(16.0)),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(8.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.05, 0.05, 0.08, 0.85)),
            BorderRadius::all(Val::Px(8.0)),
            DialogueBox,
            Name::new("Dialogue Box"),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::default(),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::srgb(0.95, 0.75, 0.35)),
                DialogueSpeaker,
            ));
            parent.spawn((
                Text::default(),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(TEXT_COLOR),
                DialogueText,
            ));
        });
    commands.insert_resource(cursor);
}

/// Enter/Space moves the conversation on, unless the game is paused or a
/// transition owns the screen.
fn advance_dialogue(
    mut commands: Commands,
    keys: Option<Res<ButtonInput<KeyCode>>>,
    pause: Res<PauseController>,
    loader: Res<SceneLoadManager>,
    cursor: Option<ResMut<ConversationCursor>>,
    dialogue_box: Query<Entity, With<DialogueBox>>,
) {
    let Some(mut cursor) = cursor else {
        return;
    };
    // The frame that closed the pause menu must not also skip a line.
    if pause.is_paused() || pause.is_changed() || loader.is_loading() {
        return;
    }
    let pressed = keys.is_some_and(|keys| keys.any_just_pressed([KeyCode::Enter, KeyCode::Space]));
    if !pressed {
        return;
    }

    cursor.advance();
    if cursor.is_finished() {
        debug!(target: LOG_UI, conversation = cursor.id(), "conversation finished");
        for entity in &dialogue_box {
            commands.entity(entity).despawn();
        }
        commands.remove_resource::<ConversationCursor>();
    }
}

fn show_dialogue(
    cursor: Option<Res<ConversationCursor>>,
    mut speaker: Query<&mut Text, (With<DialogueSpeaker>, Without<DialogueText>)>,
    mut line: Query<&mut Text, (With<DialogueText>, Without<DialogueSpeaker>)>,
) {
    let Some(cursor) = cursor else {
        return;
    };
    let Some(current) = cursor.current() else {
        return;
    };
    for mut text in &mut speaker {
        if text.0 != current.speaker {
            text.0 = current.speaker.clone();
        }
    }
    for mut text in &mut line {
        if text.0 != current.text {
            text.0 = current.text.clone();
        }
    }
}
