//! Volume mixing and menu sounds.
//!
//! Volumes are stored linearly (what the sliders show) and pushed to the
//! mixer as decibels under one named parameter per channel. Output follows
//! the mixer: master drives [`GlobalVolume`], music and effects drive the
//! sinks tagged [`MusicTrack`] and [`SoundEffect`].

use std::collections::HashMap;

use app::LOG_AUDIO;
use bevy::audio::{AudioSinkPlayback, Volume};
use bevy::prelude::*;
use settings::{SettingsArc, SettingsStoreRef};

use crate::GameState;
use crate::input::MenuSubmitted;
use crate::preferences::AudioSettings;
use crate::utils::cleanup;

/// Quietest linear volume the mixer distinguishes from silence.
pub const MIN_LINEAR_VOLUME: f32 = 1e-4;
pub const MIN_DECIBELS: f32 = -80.0;

/// `20 * log10(v)` with `v` clamped to `[1e-4, 1]`, so silence is -80 dB and
/// never negative infinity.
pub fn linear_to_decibels(linear: f32) -> f32 {
    if !linear.is_finite() {
        return MIN_DECIBELS;
    }
    20.0 * linear.clamp(MIN_LINEAR_VOLUME, 1.0).log10()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioChannel {
    Master,
    Music,
    Effects,
}

impl AudioChannel {
    pub const ALL: [AudioChannel; 3] = [
        AudioChannel::Master,
        AudioChannel::Music,
        AudioChannel::Effects,
    ];

    /// Name of the mixer parameter this channel controls.
    pub fn parameter(self) -> &'static str {
        match self {
            AudioChannel::Master => "MasterVolume",
            AudioChannel::Music => "MusicVolume",
            AudioChannel::Effects => "SFXVolume",
        }
    }

    fn index(self) -> usize {
        match self {
            AudioChannel::Master => 0,
            AudioChannel::Music => 1,
            AudioChannel::Effects => 2,
        }
    }
}

/// A mixer exposing named float parameters (decibels for volumes).
pub trait AudioMixer {
    fn set_float(&mut self, name: &str, value: f32);
    fn get_float(&self, name: &str) -> Option<f32>;
}

#[derive(Resource, Debug, Default)]
pub struct MixerParameters {
    values: HashMap<String, f32>,
}

impl AudioMixer for MixerParameters {
    fn set_float(&mut self, name: &str, value: f32) {
        self.values.insert(name.to_owned(), value);
    }

    fn get_float(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }
}

impl MixerParameters {
    fn decibels(&self, channel: AudioChannel) -> f32 {
        self.get_float(channel.parameter()).unwrap_or(0.0)
    }
}

/// Linear volume per channel, the source of truth for the options screen.
#[derive(Resource, Debug, Clone)]
pub struct AudioManager {
    volumes: [f32; 3],
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::from(&AudioSettings::default())
    }
}

impl From<&AudioSettings> for AudioManager {
    fn from(settings: &AudioSettings) -> Self {
        Self {
            volumes: [settings.master, settings.music, settings.effects],
        }
    }
}

impl AudioManager {
    pub fn volume(&self, channel: AudioChannel) -> f32 {
        self.volumes[channel.index()]
    }

    /// Clamp, remember and push one channel to the mixer. Returns the stored
    /// value.
    pub fn set_volume(
        &mut self,
        channel: AudioChannel,
        linear: f32,
        mixer: &mut impl AudioMixer,
    ) -> f32 {
        let linear = if linear.is_finite() {
            linear.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.volumes[channel.index()] = linear;
        mixer.set_float(channel.parameter(), linear_to_decibels(linear));
        linear
    }

    /// Push every channel to the mixer.
    pub fn apply_all(&self, mixer: &mut impl AudioMixer) {
        for channel in AudioChannel::ALL {
            mixer.set_float(channel.parameter(), linear_to_decibels(self.volume(channel)));
        }
    }

    pub fn to_settings(&self) -> AudioSettings {
        AudioSettings {
            master: self.volume(AudioChannel::Master),
            music: self.volume(AudioChannel::Music),
            effects: self.volume(AudioChannel::Effects),
        }
    }
}

/// Change one channel; persisted to the `audio` settings section.
#[derive(Message, Debug, Clone, Copy)]
pub struct SetVolume {
    pub channel: AudioChannel,
    pub linear: f32,
}

#[derive(Component)]
pub struct MusicTrack;

#[derive(Component)]
pub struct SoundEffect;

#[derive(Component)]
struct MenuMusic;

#[derive(Resource, Clone, Debug, Default)]
struct MenuSounds {
    theme: Option<String>,
    select: Option<String>,
}

#[derive(Default)]
pub struct MixerPlugin {
    sounds: MenuSounds,
}

impl MixerPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loop this track while the main menu is shown.
    pub fn with_menu_theme(mut self, path: impl Into<String>) -> Self {
        self.sounds.theme = Some(path.into());
        self
    }

    /// Play this sound whenever a menu item is submitted.
    pub fn with_select_sound(mut self, path: impl Into<String>) -> Self {
        self.sounds.select = Some(path.into());
        self
    }
}

impl Plugin for MixerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MixerParameters>()
            .init_resource::<AudioManager>()
            .insert_resource(self.sounds.clone())
            .add_message::<SetVolume>()
            .add_systems(Startup, load_persisted_volumes)
            .add_systems(
                Update,
                (
                    apply_volume_commands,
                    play_select_sound,
                    apply_mixer_to_outputs,
                )
                    .chain(),
            )
            .add_systems(OnEnter(GameState::MainMenu), start_menu_music)
            .add_systems(OnExit(GameState::MainMenu), cleanup::<MenuMusic>);
    }
}

fn load_persisted_volumes(
    settings: Option<Res<SettingsArc<AudioSettings>>>,
    mut manager: ResMut<AudioManager>,
    mut mixer: ResMut<MixerParameters>,
) {
    if let Some(settings) = settings {
        *manager = AudioManager::from(&*settings.0);
    }
    manager.apply_all(mixer.as_mut());
    debug!(target: LOG_AUDIO, volumes = ?manager.volumes, "mixer initialised");
}

fn apply_volume_commands(
    mut commands: MessageReader<SetVolume>,
    mut manager: ResMut<AudioManager>,
    mut mixer: ResMut<MixerParameters>,
    store: Option<Res<SettingsStoreRef>>,
) {
    let mut changed = false;
    for command in commands.read() {
        let stored = manager.set_volume(command.channel, command.linear, mixer.as_mut());
        debug!(target: LOG_AUDIO, channel = ?command.channel, volume = stored, "volume set");
        changed = true;
    }
    if !changed {
        return;
    }

    let Some(store) = store else {
        return;
    };
    let persisted = manager.to_settings();
    if let Err(err) = store.update::<AudioSettings, _>(|audio| *audio = persisted) {
        warn!(target: LOG_AUDIO, %err, "could not persist audio settings");
    }
}

fn apply_mixer_to_outputs(
    mixer: Res<MixerParameters>,
    mut global: ResMut<GlobalVolume>,
    mut sinks: Query<(&mut AudioSink, Has<MusicTrack>, Has<SoundEffect>)>,
) {
    let master = mixer.decibels(AudioChannel::Master);
    if mixer.is_changed() {
        global.volume = Volume::Decibels(master);
    }

    for (mut sink, is_music, is_effect) in &mut sinks {
        if !mixer.is_changed() && !sink.is_added() {
            continue;
        }
        let channel = if is_music {
            mixer.decibels(AudioChannel::Music)
        } else if is_effect {
            mixer.decibels(AudioChannel::Effects)
        } else {
            0.0
        };
        sink.set_volume(Volume::Decibels(master + channel));
    }
}

fn start_menu_music(
    mut commands: Commands,
    sounds: Res<MenuSounds>,
    asset_server: Res<AssetServer>,
    mixer: Res<MixerParameters>,
) {
    let Some(theme) = sounds.theme.as_ref() else {
        return;
    };
    info!(target: LOG_AUDIO, %theme, "starting menu music");
    commands.spawn((
        AudioPlayer::<AudioSource>::new(asset_server.load(theme.clone())),
        PlaybackSettings::LOOP.with_volume(Volume::Decibels(mixer.decibels(AudioChannel::Music))),
        MusicTrack,
        MenuMusic,
        Name::new("Menu Music"),
    ));
}

fn play_select_sound(
    mut commands: Commands,
    mut submitted: MessageReader<MenuSubmitted>,
    sounds: Res<MenuSounds>,
    asset_server: Res<AssetServer>,
    mixer: Res<MixerParameters>,
) {
    // One click per frame is plenty.
    if submitted.read().last().is_none() {
        return;
    }
    let Some(select) = sounds.select.as_ref() else {
        return;
    };
    commands.spawn((
        AudioPlayer::<AudioSource>::new(asset_server.load(select.clone())),
        PlaybackSettings::DESPAWN
            .with_volume(Volume::Decibels(mixer.decibels(AudioChannel::Effects))),
        SoundEffect,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_mapping_endpoints() {
        assert_eq!(linear_to_decibels(1.0), 0.0);
        assert!((linear_to_decibels(1e-4) - MIN_DECIBELS).abs() < 1e-3);
        assert!((linear_to_decibels(0.0) - MIN_DECIBELS).abs() < 1e-3);
        assert!((linear_to_decibels(-5.0) - MIN_DECIBELS).abs() < 1e-3);
        assert_eq!(linear_to_decibels(f32::NAN), MIN_DECIBELS);
        assert!(linear_to_decibels(0.0).is_finite());
    }

    #[test]
    fn volume_mapping_is_monotonic() {
        let mut prev = f32::NEG_INFINITY;
        for step in 0..=100 {
            let db = linear_to_decibels(step as f32 / 100.0);
            assert!(db >= prev);
            prev = db;
        }
    }

    #[test]
    fn half_volume_is_about_minus_six_decibels() {
        let db = linear_to_decibels(0.5);
        assert!((db + 6.0206).abs() < 1e-3);
    }

    #[test]
    fn manager_clamps_and_pushes_to_mixer() {
        let mut manager = AudioManager::default();
        let mut mixer = MixerParameters::default();

        assert_eq!(manager.set_volume(AudioChannel::Music, 1.7, &mut mixer), 1.0);
        assert_eq!(mixer.get_float("MusicVolume"), Some(0.0));

        assert_eq!(manager.set_volume(AudioChannel::Effects, -0.2, &mut mixer), 0.0);
        let effects = mixer.get_float("SFXVolume").unwrap();
        assert!((effects - MIN_DECIBELS).abs() < 1e-3);
        assert_eq!(manager.to_settings().effects, 0.0);
    }
}
