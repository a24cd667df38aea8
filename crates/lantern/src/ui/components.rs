use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::prelude::*;

use crate::input::MenuItem;

/// UI color constants for buttons
pub const NORMAL_BUTTON: Color = Color::srgb(0.15, 0.15, 0.15);
pub const HOVERED_BUTTON: Color = Color::srgb(0.25, 0.25, 0.25);
pub const PRESSED_BUTTON: Color = Color::srgb(0.35, 0.75, 0.35);

pub const TEXT_COLOR: Color = Color::srgb(0.9, 0.9, 0.9);

/// Spawn a navigable menu button.
///
/// `marker` goes on the button, `label_marker` on its text so screens can
/// rewrite the label later.
pub fn spawn_menu_button(
    parent: &mut ChildSpawnerCommands,
    label: impl Into<String>,
    order: usize,
    marker: impl Bundle,
    label_marker: impl Bundle,
) -> Entity {
    parent
        .spawn((
            Button,
            Node {
                width: Val::Px(320.0),
                height: Val::Px(56.0),
                border: UiRect::all(Val::Px(4.0)),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BorderColor::all(Color::WHITE),
            BorderRadius::all(Val::Px(10.0)),
            BackgroundColor(NORMAL_BUTTON),
            MenuItem { order },
            marker,
        ))
        .with_children(|button| {
            button.spawn((
                Text::new(label),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(TEXT_COLOR),
                label_marker,
            ));
        })
        .id()
}

/// Full-screen column that centers its children.
pub fn menu_root() -> Node {
    Node {
        width: Val::Percent(100.0),
        height: Val::Percent(100.0),
        align_items: AlignItems::Center,
        justify_content: JustifyContent::Center,
        flex_direction: FlexDirection::Column,
        row_gap: Val::Px(16.0),
        ..default()
    }
}

pub fn title(text: &str, size: f32) -> impl Bundle {
    (
        Text::new(text),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(TEXT_COLOR),
        Node {
            margin: UiRect::bottom(Val::Px(32.0)),
            ..default()
        },
    )
}
