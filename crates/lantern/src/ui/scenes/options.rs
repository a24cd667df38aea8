//! Options screen.
//!
//! Up/down picks a row, left/right changes its value, submit toggles or
//! leaves. Every change is written to the settings file right away.

use app::LOG_SETTINGS;
use bevy::prelude::*;
use settings::{Settings, SettingsArc, SettingsStoreRef};

use crate::MenuScreen;
use crate::audio::{AudioChannel, AudioManager, SetVolume};
use crate::input::{MenuAdjusted, MenuSubmitted};
use crate::preferences::{ControlSettings, DisplaySettings};
use crate::ui::components::{menu_root, spawn_menu_button, title};
use crate::utils::cleanup;

const STEP: f32 = 0.1;

pub struct OptionsScenePlugin;

impl Plugin for OptionsScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(MenuScreen::Options), spawn_ui)
            .add_systems(OnExit(MenuScreen::Options), cleanup::<OptionsUI>)
            .add_systems(
                Update,
                (
                    handle_adjustments,
                    handle_submissions,
                    back_on_escape,
                    refresh_row_labels,
                )
                    .chain()
                    .run_if(in_state(MenuScreen::Options)),
            );
    }
}

#[derive(Component)]
struct OptionsUI;

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionsRow {
    MasterVolume,
    MusicVolume,
    EffectsVolume,
    Sensitivity,
    Brightness,
    Fsr,
    Back,
}

impl OptionsRow {
    pub const ALL: [OptionsRow; 7] = [
        OptionsRow::MasterVolume,
        OptionsRow::MusicVolume,
        OptionsRow::EffectsVolume,
        OptionsRow::Sensitivity,
        OptionsRow::Brightness,
        OptionsRow::Fsr,
        OptionsRow::Back,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OptionsRow::MasterVolume => "Master Volume",
            OptionsRow::MusicVolume => "Music Volume",
            OptionsRow::EffectsVolume => "Effects Volume",
            OptionsRow::Sensitivity => "Sensitivity",
            OptionsRow::Brightness => "Brightness",
            OptionsRow::Fsr => "FSR",
            OptionsRow::Back => "Back",
        }
    }

    fn channel(self) -> Option<AudioChannel> {
        match self {
            OptionsRow::MasterVolume => Some(AudioChannel::Master),
            OptionsRow::MusicVolume => Some(AudioChannel::Music),
            OptionsRow::EffectsVolume => Some(AudioChannel::Effects),
            _ => None,
        }
    }
}

/// Text of a row, rewritten whenever its value changes.
#[derive(Component)]
struct RowLabel(OptionsRow);

/// Move `value` by `step` increments of 0.1, staying on the 0.1 grid in
/// `[0, 1]`.
fn step_value(value: f32, step: i32) -> f32 {
    let stepped = ((value + step as f32 * STEP) * 10.0).round() / 10.0;
    stepped.clamp(0.0, 1.0)
}

fn percent(value: f32) -> String {
    format!("{:.0}%", value * 100.0)
}

fn spawn_ui(mut commands: Commands) {
    commands
        .spawn((menu_root(), OptionsUI, Name::new("Options UI Root")))
        .with_children(|parent| {
            parent.spawn(title("Options", 44.0));
            for (order, row) in OptionsRow::ALL.into_iter().enumerate() {
                spawn_menu_button(parent, row.label(), order, row, RowLabel(row));
            }
        });
}

/// Apply a change to one settings section through the store.
fn update_section<S: Settings>(store: Option<&SettingsStoreRef>, change: impl FnOnce(&mut S)) {
    let Some(store) = store else {
        debug!(target: LOG_SETTINGS, section = S::SECTION, "no settings store, change dropped");
        return;
    };
    if let Err(err) = store.update::<S, _>(change) {
        warn!(target: LOG_SETTINGS, section = S::SECTION, %err, "could not save settings");
    }
}

fn handle_adjustments(
    mut adjusted: MessageReader<MenuAdjusted>,
    rows: Query<&OptionsRow>,
    audio: Res<AudioManager>,
    store: Option<Res<SettingsStoreRef>>,
    mut volumes: MessageWriter<SetVolume>,
) {
    for message in adjusted.read() {
        let Ok(row) = rows.get(message.item) else {
            continue;
        };
        if let Some(channel) = row.channel() {
            volumes.write(SetVolume {
                channel,
                linear: step_value(audio.volume(channel), message.step),
            });
            continue;
        }

        let step = message.step;
        match row {
            OptionsRow::Sensitivity => {
                update_section::<ControlSettings>(store.as_deref(), |c| {
                    c.sensitivity = step_value(c.sensitivity, step);
                });
            }
            OptionsRow::Brightness => {
                update_section::<DisplaySettings>(store.as_deref(), |d| {
                    d.brightness = step_value(d.brightness, step);
                });
            }
            OptionsRow::Fsr => {
                update_section::<DisplaySettings>(store.as_deref(), |d| {
                    d.fsr_enabled = !d.fsr_enabled;
                });
            }
            _ => {}
        }
    }
}

fn handle_submissions(
    mut submitted: MessageReader<MenuSubmitted>,
    rows: Query<&OptionsRow>,
    store: Option<Res<SettingsStoreRef>>,
    mut next_screen: ResMut<NextState<MenuScreen>>,
) {
    for message in submitted.read() {
        match rows.get(message.item) {
            Ok(OptionsRow::Fsr) => {
                update_section::<DisplaySettings>(store.as_deref(), |d| {
                    d.fsr_enabled = !d.fsr_enabled;
                });
            }
            Ok(OptionsRow::Back) => next_screen.set(MenuScreen::Main),
            _ => {}
        }
    }
}

fn back_on_escape(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut next_screen: ResMut<NextState<MenuScreen>>,
) {
    if keys.is_some_and(|keys| keys.just_pressed(KeyCode::Escape)) {
        next_screen.set(MenuScreen::Main);
    }
}

fn refresh_row_labels(
    audio: Res<AudioManager>,
    controls: Option<Res<SettingsArc<ControlSettings>>>,
    display: Option<Res<SettingsArc<DisplaySettings>>>,
    mut labels: Query<(&RowLabel, &mut Text)>,
) {
    let sensitivity = controls.map(|c| c.sensitivity);
    let (brightness, fsr) = match display {
        Some(display) => (Some(display.brightness), Some(display.fsr_enabled)),
        None => (None, None),
    };

    for (RowLabel(row), mut text) in &mut labels {
        let value = match row {
            OptionsRow::MasterVolume | OptionsRow::MusicVolume | OptionsRow::EffectsVolume => {
                row.channel().map(|channel| percent(audio.volume(channel)))
            }
            OptionsRow::Sensitivity => sensitivity.map(percent),
            OptionsRow::Brightness => brightness.map(percent),
            OptionsRow::Fsr => fsr.map(|on| if on { "On" } else { "Off" }.to_owned()),
            OptionsRow::Back => None,
        };
        let wanted = match value {
            Some(value) => format!("{}: {value}", row.label()),
            None => row.label().to_owned(),
        };
        if text.0 != wanted {
            text.0 = wanted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_stay_on_the_grid() {
        assert_eq!(step_value(0.8, 1), 0.9);
        assert_eq!(step_value(0.9, 1), 1.0);
        assert_eq!(step_value(1.0, 1), 1.0);
        assert_eq!(step_value(0.1, -1), 0.0);
        assert_eq!(step_value(0.0, -1), 0.0);
        // Off-grid values snap back onto it.
        assert_eq!(step_value(0.33, 1), 0.4);
    }

    #[test]
    fn labels_show_percentages() {
        assert_eq!(percent(0.8), "80%");
        assert_eq!(percent(0.0), "0%");
    }
}
