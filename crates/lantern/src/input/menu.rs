//! Menu input handling.
//!
//! Keyboard, gamepad and mouse drive one selection over the [`MenuItem`]s
//! currently on screen. Clicking an item and submitting it with the keyboard
//! end up in the same [`MenuSubmitted`] message.

use bevy::prelude::*;

use super::navigation::{MenuCursor, MenuIntent, NavDirection, NeighborMap, Neighbors};
use crate::ui::components::{HOVERED_BUTTON, NORMAL_BUTTON, PRESSED_BUTTON};

/// A selectable entry; `order` is its position in linear navigation.
#[derive(Component, Clone, Copy, Debug)]
pub struct MenuItem {
    pub order: usize,
}

/// Explicit neighbors, used in [`NavigationMode::Neighbors`].
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct MenuNeighbors(pub Neighbors<Entity>);

impl MenuNeighbors {
    pub fn from_map(map: &NeighborMap<Entity>, item: Entity) -> Self {
        Self(map.neighbors(item))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavigationMode {
    #[default]
    Linear,
    Neighbors,
}

#[derive(Resource, Debug)]
pub struct MenuNavigation {
    pub mode: NavigationMode,
    cursor: MenuCursor,
    focused: Option<Entity>,
    enabled: bool,
}

impl Default for MenuNavigation {
    fn default() -> Self {
        Self {
            mode: NavigationMode::Linear,
            cursor: MenuCursor::default(),
            focused: None,
            enabled: true,
        }
    }
}

impl MenuNavigation {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling keeps the current selection for when input comes back.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn cursor(&self) -> &MenuCursor {
        &self.cursor
    }

    pub fn focused(&self) -> Option<Entity> {
        self.focused
    }

    pub fn reset(&mut self) {
        self.cursor.select(0);
        self.focused = None;
    }
}

/// The selected item was activated.
#[derive(Message, Debug, Clone, Copy)]
pub struct MenuSubmitted {
    pub item: Entity,
}

/// Left/right on the selected item in linear mode (`step` is -1 or +1).
#[derive(Message, Debug, Clone, Copy)]
pub struct MenuAdjusted {
    pub item: Entity,
    pub step: i32,
}

pub struct MenuNavigationPlugin;

impl Plugin for MenuNavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MenuNavigation>()
            .add_message::<MenuSubmitted>()
            .add_message::<MenuAdjusted>()
            .add_systems(
                Update,
                (
                    sync_menu_items,
                    handle_pointer_input,
                    handle_directional_input,
                    highlight_selected_item,
                )
                    .chain(),
            );
    }
}

const STICK_PRESS: f32 = 0.5;
const STICK_RELEASE: f32 = 0.2;

/// Menu items sorted by their order.
fn ordered_items(items: &Query<(Entity, &MenuItem)>) -> Vec<Entity> {
    let mut sorted: Vec<(usize, Entity)> =
        items.iter().map(|(e, item)| (item.order, e)).collect();
    sorted.sort_unstable_by_key(|(order, _)| *order);
    sorted.into_iter().map(|(_, e)| e).collect()
}

fn selected_item(navigation: &MenuNavigation, ordered: &[Entity]) -> Option<Entity> {
    match navigation.mode {
        NavigationMode::Linear => ordered.get(navigation.cursor.index()).copied(),
        NavigationMode::Neighbors => navigation.focused,
    }
}

/// Keeps the cursor in range and starts every freshly spawned menu at its
/// first item.
fn sync_menu_items(
    mut navigation: ResMut<MenuNavigation>,
    items: Query<(Entity, &MenuItem)>,
    added: Query<(), Added<MenuItem>>,
) {
    let ordered = ordered_items(&items);
    if !added.is_empty() {
        navigation.cursor = MenuCursor::new(ordered.len());
        navigation.focused = ordered.first().copied();
        return;
    }

    if navigation.cursor.len() != ordered.len() {
        navigation.cursor.set_len(ordered.len());
    }
    if navigation
        .focused
        .is_some_and(|focused| !ordered.contains(&focused))
    {
        navigation.focused = ordered.first().copied();
    }
}

fn handle_pointer_input(
    mut navigation: ResMut<MenuNavigation>,
    interactions: Query<(Entity, &Interaction), (Changed<Interaction>, With<MenuItem>)>,
    items: Query<(Entity, &MenuItem)>,
    mut submitted: MessageWriter<MenuSubmitted>,
) {
    if !navigation.enabled {
        return;
    }
    let ordered = ordered_items(&items);
    for (entity, interaction) in &interactions {
        if *interaction == Interaction::None {
            continue;
        }
        // Hovering moves the selection, so keyboard and mouse never disagree.
        if let Some(index) = ordered.iter().position(|e| *e == entity) {
            navigation.cursor.select(index);
        }
        navigation.focused = Some(entity);

        if *interaction == Interaction::Pressed {
            submitted.write(MenuSubmitted { item: entity });
        }
    }
}

fn collect_intents(
    keys: Option<&ButtonInput<KeyCode>>,
    gamepads: &Query<&Gamepad>,
    stick_latched: &mut bool,
) -> Vec<MenuIntent> {
    const KEY_BINDINGS: [(KeyCode, MenuIntent); 11] = [
        (KeyCode::ArrowUp, MenuIntent::Move(NavDirection::Up)),
        (KeyCode::KeyW, MenuIntent::Move(NavDirection::Up)),
        (KeyCode::ArrowDown, MenuIntent::Move(NavDirection::Down)),
        (KeyCode::KeyS, MenuIntent::Move(NavDirection::Down)),
        (KeyCode::ArrowLeft, MenuIntent::Move(NavDirection::Left)),
        (KeyCode::KeyA, MenuIntent::Move(NavDirection::Left)),
        (KeyCode::ArrowRight, MenuIntent::Move(NavDirection::Right)),
        (KeyCode::KeyD, MenuIntent::Move(NavDirection::Right)),
        (KeyCode::Enter, MenuIntent::Submit),
        (KeyCode::NumpadEnter, MenuIntent::Submit),
        (KeyCode::Space, MenuIntent::Submit),
    ];
    const PAD_BINDINGS: [(GamepadButton, MenuIntent); 5] = [
        (GamepadButton::DPadUp, MenuIntent::Move(NavDirection::Up)),
        (GamepadButton::DPadDown, MenuIntent::Move(NavDirection::Down)),
        (GamepadButton::DPadLeft, MenuIntent::Move(NavDirection::Left)),
        (GamepadButton::DPadRight, MenuIntent::Move(NavDirection::Right)),
        (GamepadButton::South, MenuIntent::Submit),
    ];

    let mut intents = Vec::new();
    if let Some(keys) = keys {
        for (key, intent) in KEY_BINDINGS {
            if keys.just_pressed(key) && !intents.contains(&intent) {
                intents.push(intent);
            }
        }
    }

    let mut stick = Vec2::ZERO;
    for gamepad in gamepads {
        for (button, intent) in PAD_BINDINGS {
            if gamepad.just_pressed(button) && !intents.contains(&intent) {
                intents.push(intent);
            }
        }
        let left = gamepad.left_stick();
        if left.length_squared() > stick.length_squared() {
            stick = left;
        }
    }

    // The stick behaves like a button: one step per push past the threshold.
    if *stick_latched {
        if stick.x.abs() < STICK_RELEASE && stick.y.abs() < STICK_RELEASE {
            *stick_latched = false;
        }
    } else if let Some(direction) = stick_direction(stick) {
        *stick_latched = true;
        let intent = MenuIntent::Move(direction);
        if !intents.contains(&intent) {
            intents.push(intent);
        }
    }

    intents
}

fn stick_direction(stick: Vec2) -> Option<NavDirection> {
    if stick.y.abs() >= stick.x.abs() {
        if stick.y > STICK_PRESS {
            return Some(NavDirection::Up);
        }
        if stick.y < -STICK_PRESS {
            return Some(NavDirection::Down);
        }
    } else {
        if stick.x > STICK_PRESS {
            return Some(NavDirection::Right);
        }
        if stick.x < -STICK_PRESS {
            return Some(NavDirection::Left);
        }
    }
    None
}

fn handle_directional_input(
    mut navigation: ResMut<MenuNavigation>,
    keys: Option<Res<ButtonInput<KeyCode>>>,
    gamepads: Query<&Gamepad>,
    items: Query<(Entity, &MenuItem)>,
    neighbors: Query<&MenuNeighbors>,
    mut stick_latched: Local<bool>,
    mut submitted: MessageWriter<MenuSubmitted>,
    mut adjusted: MessageWriter<MenuAdjusted>,
) {
    let intents = collect_intents(keys.as_deref(), &gamepads, &mut stick_latched);
    if intents.is_empty() || !navigation.enabled {
        return;
    }

    let ordered = ordered_items(&items);
    for intent in intents {
        let Some(selected) = selected_item(&navigation, &ordered) else {
            return;
        };
        match (intent, navigation.mode) {
            (MenuIntent::Submit, _) => {
                submitted.write(MenuSubmitted { item: selected });
            }
            (MenuIntent::Move(direction), NavigationMode::Linear) => {
                if !navigation.cursor.step(direction) {
                    let step = match direction {
                        NavDirection::Left => -1,
                        NavDirection::Right => 1,
                        _ => continue,
                    };
                    adjusted.write(MenuAdjusted {
                        item: selected,
                        step,
                    });
                }
            }
            (MenuIntent::Move(direction), NavigationMode::Neighbors) => {
                let next = neighbors
                    .get(selected)
                    .ok()
                    .and_then(|links| links.0.step(direction));
                if let Some(next) = next {
                    navigation.focused = Some(next);
                    if let Some(index) = ordered.iter().position(|e| *e == next) {
                        navigation.cursor.select(index);
                    }
                }
            }
        }
    }
}

fn highlight_selected_item(
    navigation: Res<MenuNavigation>,
    all_items: Query<(Entity, &MenuItem)>,
    mut items: Query<(Entity, &Interaction, &mut BackgroundColor), With<MenuItem>>,
) {
    let ordered = ordered_items(&all_items);
    let selected = selected_item(&navigation, &ordered);
    for (entity, interaction, mut color) in &mut items {
        let wanted = if *interaction == Interaction::Pressed {
            PRESSED_BUTTON
        } else if Some(entity) == selected {
            HOVERED_BUTTON
        } else {
            NORMAL_BUTTON
        };
        if color.0 != wanted {
            color.0 = wanted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stick_needs_a_clear_push() {
        assert_eq!(stick_direction(Vec2::new(0.0, 0.3)), None);
        assert_eq!(stick_direction(Vec2::new(0.1, 0.8)), Some(NavDirection::Up));
        assert_eq!(stick_direction(Vec2::new(-0.9, 0.2)), Some(NavDirection::Left));
        assert_eq!(stick_direction(Vec2::new(0.0, -0.6)), Some(NavDirection::Down));
    }

    #[test]
    fn disabling_keeps_the_cursor() {
        let mut navigation = MenuNavigation::default();
        navigation.cursor = MenuCursor::new(3);
        navigation.cursor.select(2);

        navigation.set_enabled(false);
        navigation.set_enabled(true);
        assert_eq!(navigation.cursor().index(), 2);
    }
}
