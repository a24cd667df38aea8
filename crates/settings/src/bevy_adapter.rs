#![cfg(feature = "bevy")]

use bevy::{
    app::{App, PreUpdate},
    ecs::resource::Resource,
    prelude::{Deref, DerefMut, World},
};
use std::sync::Arc;

use crate::{Settings, SettingsStore};

/// Shared handle to the store for systems that write settings.
#[derive(Resource, Clone, Deref)]
pub struct SettingsStoreRef(pub Arc<SettingsStore>);

/// Read-only snapshot of one section, refreshed whenever the store changes.
#[derive(Resource, Deref, DerefMut, Clone)]
pub struct SettingsArc<T: Send + Sync + 'static>(pub Arc<T>);

type Updater = fn(&SettingsStore, &mut World);

#[derive(Resource, Default)]
struct SettingsRegistry {
    updaters: Vec<Updater>,
    seen_revision: u64,
}

pub trait AppSettingsExt {
    fn insert_settings_store(&mut self, store: SettingsStore) -> &mut Self;
    fn register_settings_section<S: Settings>(&mut self) -> &mut Self;
}

impl AppSettingsExt for App {
    fn insert_settings_store(&mut self, store: SettingsStore) -> &mut Self {
        let seen_revision = store.revision();
        self.insert_resource(SettingsStoreRef(Arc::new(store)))
            .insert_resource(SettingsRegistry {
                updaters: Vec::new(),
                seen_revision,
            })
            .add_systems(PreUpdate, refresh_settings_resources)
    }

    fn register_settings_section<S: Settings>(&mut self) -> &mut Self {
        let Some(store) = self.world().get_resource::<SettingsStoreRef>().cloned() else {
            tracing::error!(
                target: "settings",
                section = S::SECTION,
                "no settings store inserted, section keeps its defaults"
            );
            return self.insert_resource(SettingsArc(Arc::new(S::default())));
        };

        if !store.is_registered::<S>() {
            if let Err(err) = store.register::<S>() {
                tracing::warn!(target: "settings", section = S::SECTION, %err, "register failed");
            }
        }
        let snapshot = store.get::<S>().unwrap_or_else(|err| {
            tracing::warn!(target: "settings", section = S::SECTION, %err, "using defaults");
            Arc::new(S::default())
        });
        self.insert_resource(SettingsArc::<S>(snapshot));

        fn update_one<S: Settings>(store: &SettingsStore, world: &mut World) {
            if let Ok(fresh) = store.get::<S>() {
                world.insert_resource(SettingsArc::<S>(fresh));
            }
        }

        self.world_mut()
            .resource_mut::<SettingsRegistry>()
            .updaters
            .push(update_one::<S>);
        self
    }
}

/// Re-publish every registered section after the store revision moved.
fn refresh_settings_resources(world: &mut World) {
    let Some(store) = world.get_resource::<SettingsStoreRef>().cloned() else {
        return;
    };
    let revision = store.revision();
    let updaters = {
        let mut registry = world.resource_mut::<SettingsRegistry>();
        if registry.seen_revision == revision {
            return;
        }
        registry.seen_revision = revision;
        registry.updaters.clone()
    };

    for update in updaters {
        update(&store, world);
    }
}
