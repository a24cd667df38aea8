//! Persisted player preferences.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use settings::{AppSettingsExt, Settings};

use crate::transition::Easing;

fn clamp_unit(value: &mut f32) {
    *value = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        1.0
    };
}

/// Linear channel volumes in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub master: f32,
    pub music: f32,
    pub effects: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master: 1.0,
            music: 0.8,
            effects: 1.0,
        }
    }
}

impl Settings for AudioSettings {
    const SECTION: &'static str = "audio";

    fn sanitize(&mut self) {
        clamp_unit(&mut self.master);
        clamp_unit(&mut self.music);
        clamp_unit(&mut self.effects);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub brightness: f32,
    pub fsr_enabled: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            brightness: 0.5,
            fsr_enabled: false,
        }
    }
}

impl Settings for DisplaySettings {
    const SECTION: &'static str = "display";

    fn sanitize(&mut self) {
        clamp_unit(&mut self.brightness);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub sensitivity: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self { sensitivity: 0.5 }
    }
}

impl Settings for ControlSettings {
    const SECTION: &'static str = "controls";

    fn sanitize(&mut self) {
        clamp_unit(&mut self.sensitivity);
    }
}

/// Durations in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionSettings {
    pub fade_in_secs: f32,
    pub fade_out_secs: f32,
    pub startup_fade_secs: f32,
    pub easing: Easing,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            fade_in_secs: 0.5,
            fade_out_secs: 0.5,
            startup_fade_secs: 1.0,
            easing: Easing::Linear,
        }
    }
}

impl Settings for TransitionSettings {
    const SECTION: &'static str = "transitions";

    fn sanitize(&mut self) {
        let defaults = Self::default();
        for (value, fallback) in [
            (&mut self.fade_in_secs, defaults.fade_in_secs),
            (&mut self.fade_out_secs, defaults.fade_out_secs),
            (&mut self.startup_fade_secs, defaults.startup_fade_secs),
        ] {
            *value = if value.is_finite() {
                value.clamp(0.0, 10.0)
            } else {
                fallback
            };
        }
    }
}

/// Registers every preference section with the settings store.
///
/// Must be added after the store was inserted.
pub struct PreferencesPlugin;

impl Plugin for PreferencesPlugin {
    fn build(&self, app: &mut App) {
        app.register_settings_section::<AudioSettings>()
            .register_settings_section::<DisplaySettings>()
            .register_settings_section::<ControlSettings>()
            .register_settings_section::<TransitionSettings>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut audio = AudioSettings {
            master: 3.0,
            music: -1.0,
            effects: f32::NAN,
        };
        audio.sanitize();
        assert_eq!(audio.master, 1.0);
        assert_eq!(audio.music, 0.0);
        assert_eq!(audio.effects, 1.0);

        let mut transitions = TransitionSettings {
            fade_in_secs: -2.0,
            fade_out_secs: f32::INFINITY,
            ..Default::default()
        };
        transitions.sanitize();
        assert_eq!(transitions.fade_in_secs, 0.0);
        assert_eq!(transitions.fade_out_secs, 0.5);
    }
}
