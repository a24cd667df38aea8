//! A start scene missing from the scene list is reported and never loaded.
//!
//! Installs a process-wide subscriber, so this file holds a single test.

use std::sync::{Arc, Mutex};

use app::LOG_SCENES;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use lantern::input::MenuItem;
use lantern::transition::{LoadSceneRequest, SceneLoadManager, TransitionState};
use lantern::ui::scenes::MainMenuItem;
use lantern::{FrontEndPlugin, GameState};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Clone, Default)]
struct ErrorLog(Arc<Mutex<Vec<String>>>);

impl ErrorLog {
    fn count(&self, target: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|logged| *logged == target)
            .count()
    }
}

impl<S: Subscriber> Layer<S> for ErrorLog {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() == Level::ERROR {
            self.0.lock().unwrap().push(metadata.target().to_owned());
        }
    }
}

#[derive(Resource, Default)]
struct LoadRequests(usize);

fn count_load_requests(
    mut requests: MessageReader<LoadSceneRequest>,
    mut seen: ResMut<LoadRequests>,
) {
    seen.0 += requests.read().count();
}

#[test]
fn missing_start_scene_is_reported_and_play_does_nothing() {
    let errors = ErrorLog::default();
    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(errors.clone()))
        .expect("install subscriber");

    let mut app = App::new();
    // No InputPlugin: it would clear `just_pressed` before our systems run.
    app.add_plugins((MinimalPlugins, AssetPlugin::default(), StatesPlugin))
        .init_resource::<ButtonInput<KeyCode>>()
        .init_resource::<ButtonInput<MouseButton>>()
        .add_plugins(FrontEndPlugin::default().with_start_scene("credits"))
        .init_resource::<LoadRequests>()
        .add_systems(PostUpdate, count_load_requests);

    app.update();
    app.update();
    assert_eq!(errors.count(LOG_SCENES), 1);

    // The menu is up and Play is the first item.
    let world = app.world_mut();
    let play = world
        .query::<(&MainMenuItem, &MenuItem)>()
        .iter(world)
        .find(|(item, _)| **item == MainMenuItem::Play)
        .map(|(_, menu_item)| menu_item.order);
    assert_eq!(play, Some(0));

    app.world_mut()
        .resource_mut::<ButtonInput<KeyCode>>()
        .press(KeyCode::Enter);
    app.update();
    {
        let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keys.release_all();
        keys.clear();
    }
    app.update();

    assert_eq!(errors.count(LOG_SCENES), 2);
    assert_eq!(app.world().resource::<LoadRequests>().0, 0);
    assert_eq!(
        app.world().resource::<SceneLoadManager>().state(),
        TransitionState::Idle
    );
    assert_eq!(
        *app.world().resource::<State<GameState>>().get(),
        GameState::MainMenu
    );
}
