pub mod components;
pub mod scenes;

use app::LOG_UI;
use bevy::{input_focus::InputFocus, prelude::*};
use scenes::ScenePlugin;
use settings::SettingsArc;

use crate::preferences::DisplaySettings;

/// Main UI plugin: the UI camera, screen plugins and display preferences.
pub struct UIPlugin;

impl Plugin for UIPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(ScenePlugin)
            .init_resource::<InputFocus>()
            .insert_resource(ClearColor(backdrop(DisplaySettings::default().brightness)))
            .add_systems(Startup, spawn_ui_camera)
            .add_systems(Update, apply_display_settings);
    }
}

fn spawn_ui_camera(mut commands: Commands) {
    commands.spawn((Camera2d, Name::new("UI Camera")));
}

/// Background colour for a brightness in `[0, 1]`.
fn backdrop(brightness: f32) -> Color {
    let level = 0.02 + 0.18 * brightness.clamp(0.0, 1.0);
    Color::srgb(level, level * 0.9, level * 0.75)
}

fn apply_display_settings(
    display: Option<Res<SettingsArc<DisplaySettings>>>,
    mut clear_color: ResMut<ClearColor>,
) {
    let Some(display) = display else {
        return;
    };
    if !display.is_changed() {
        return;
    }
    clear_color.0 = backdrop(display.brightness);
    let (brightness, fsr) = (display.brightness, display.fsr_enabled);
    debug!(
        target: LOG_UI,
        brightness,
        fsr,
        "display settings applied"
    );
}
