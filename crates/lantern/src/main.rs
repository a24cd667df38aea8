use anyhow::{Context, Result, anyhow};
use app::{AppBuilder, Application, LOG_MAIN};
use bevy::asset::io::file::FileAssetReader;
use bevy::{log::LogPlugin, prelude::*};
use lantern::FrontEndPlugin;
use lantern::audio::MixerPlugin;
use lantern::dialogue::NarrativePlugin;
use lantern::preferences::PreferencesPlugin;
use settings::{AppSettingsExt, SettingsStore};

struct Lantern;

impl Application for Lantern {
    const APP_ID: &'static str = "lantern";
}

const MENU_THEME: &str = "audio/menu_theme.ogg";
const SELECT_SOUND: &str = "audio/ui_select.ogg";

fn main() -> Result<()> {
    let builder = AppBuilder::<Lantern>::new(env!("CARGO_PKG_VERSION"))
        .map_err(|err| anyhow!(err))
        .context("failed to initialise application context")?;

    let settings_file = builder.context().path_context().settings_file();
    let store = SettingsStore::builder()
        .with_settings_file(&settings_file)
        .build()
        .with_context(|| format!("failed to open settings file {}", settings_file.display()))?;

    let assets_dir = FileAssetReader::get_base_path().join("assets");
    let mut mixer = MixerPlugin::new();
    // Sounds are optional; a checkout without them still runs silently.
    if assets_dir.join(MENU_THEME).is_file() {
        mixer = mixer.with_menu_theme(MENU_THEME);
    }
    if assets_dir.join(SELECT_SOUND).is_file() {
        mixer = mixer.with_select_sound(SELECT_SOUND);
    }

    let mut app = builder.build_with_bevy(|mut app, ctx| {
        app.add_plugins(
            DefaultPlugins
                .build()
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Lantern".to_string(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .insert_settings_store(store)
        .add_plugins((
            PreferencesPlugin,
            FrontEndPlugin::default(),
            mixer,
            NarrativePlugin::new()
                .with_dir(assets_dir.join("narrative"))
                .with_dir(ctx.path_context().narrative_dir()),
        ));
        app
    });

    let exit = app.run();
    info!(target: LOG_MAIN, ?exit, "application exited");
    Ok(())
}
