use bevy::audio::Volume;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use lantern::GameState;
use lantern::audio::{
    AudioChannel, AudioManager, AudioMixer, MixerParameters, MixerPlugin, SetVolume,
    linear_to_decibels,
};
use lantern::input::MenuSubmitted;
use lantern::preferences::{AudioSettings, PreferencesPlugin};
use settings::{AppSettingsExt, SettingsArc, SettingsStore};
use tempfile::TempDir;

fn app(dir: &TempDir) -> App {
    let store = SettingsStore::builder()
        .with_settings_file(dir.path().join("lantern.settings.json"))
        .build()
        .unwrap();

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, AssetPlugin::default(), StatesPlugin))
        .init_resource::<GlobalVolume>()
        .init_state::<GameState>()
        .add_message::<MenuSubmitted>()
        .insert_settings_store(store)
        .add_plugins((PreferencesPlugin, MixerPlugin::new()));
    app.update();
    app
}

fn set_volume(app: &mut App, channel: AudioChannel, linear: f32) {
    app.world_mut().write_message(SetVolume { channel, linear });
    app.update();
}

#[test]
fn volume_changes_reach_mixer_and_global_volume() {
    let dir = TempDir::new().unwrap();
    let mut app = app(&dir);

    set_volume(&mut app, AudioChannel::Master, 0.5);

    let mixer = app.world().resource::<MixerParameters>();
    let master = mixer.get_float(AudioChannel::Master.parameter()).unwrap();
    assert!((master - linear_to_decibels(0.5)).abs() < 1e-4);

    let global = app.world().resource::<GlobalVolume>();
    assert!((global.volume.to_linear() - 0.5).abs() < 1e-3);
    assert!(matches!(global.volume, Volume::Decibels(_)));
}

#[test]
fn out_of_range_volume_is_clamped() {
    let dir = TempDir::new().unwrap();
    let mut app = app(&dir);

    set_volume(&mut app, AudioChannel::Effects, 4.0);
    assert_eq!(
        app.world().resource::<AudioManager>().volume(AudioChannel::Effects),
        1.0
    );

    set_volume(&mut app, AudioChannel::Effects, -1.0);
    let mixer = app.world().resource::<MixerParameters>();
    assert!((mixer.get_float("SFXVolume").unwrap() + 80.0).abs() < 1e-3);
}

#[test]
fn volumes_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut app = app(&dir);
        set_volume(&mut app, AudioChannel::Music, 0.3);
        // The settings resource follows the store one frame later.
        app.update();
        let audio = app.world().resource::<SettingsArc<AudioSettings>>();
        assert!((audio.music - 0.3).abs() < 1e-6);
    }

    let app = app(&dir);
    let manager = app.world().resource::<AudioManager>();
    assert!((manager.volume(AudioChannel::Music) - 0.3).abs() < 1e-6);
    assert_eq!(manager.volume(AudioChannel::Master), 1.0);

    let mixer = app.world().resource::<MixerParameters>();
    let music = mixer.get_float("MusicVolume").unwrap();
    assert!((music - linear_to_decibels(0.3)).abs() < 1e-4);
}
