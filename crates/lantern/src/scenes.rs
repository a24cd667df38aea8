//! Scene list and the asset-backed load primitive.
//!
//! A "scene" is a [`GameState`] plus the assets it needs before it can be
//! shown. Loading one means issuing the asset loads, reporting their settled
//! fraction scaled to [`ACTIVATION_THRESHOLD`] and, once activation is
//! allowed, switching the game state.

use std::fmt;

use bevy::asset::{LoadState, UntypedHandle};
use bevy::prelude::*;

use crate::GameState;
use crate::transition::ACTIVATION_THRESHOLD;

/// Identifies a scene by name or by build index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SceneId {
    Name(String),
    Index(usize),
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneId::Name(name) => write!(f, "{name}"),
            SceneId::Index(index) => write!(f, "#{index}"),
        }
    }
}

impl From<&str> for SceneId {
    fn from(name: &str) -> Self {
        SceneId::Name(name.to_owned())
    }
}

impl From<usize> for SceneId {
    fn from(index: usize) -> Self {
        SceneId::Index(index)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneEntry {
    pub name: String,
    pub state: GameState,
    /// Asset paths that must settle before the scene may activate.
    pub assets: Vec<String>,
}

impl SceneEntry {
    pub fn new(name: impl Into<String>, state: GameState) -> Self {
        Self {
            name: name.into(),
            state,
            assets: Vec::new(),
        }
    }

    pub fn with_asset(mut self, path: impl Into<String>) -> Self {
        self.assets.push(path.into());
        self
    }
}

/// Ordered list of loadable scenes. The position of an entry is its index.
#[derive(Resource, Clone, Debug, Default)]
pub struct SceneRegistry {
    entries: Vec<SceneEntry>,
}

impl SceneRegistry {
    pub fn with_scene(mut self, entry: SceneEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn resolve(&self, id: &SceneId) -> Option<&SceneEntry> {
        match id {
            SceneId::Name(name) if name.is_empty() => None,
            SceneId::Name(name) => self.entries.iter().find(|e| e.name == *name),
            SceneId::Index(index) => self.entries.get(*index),
        }
    }

    pub fn contains(&self, id: &SceneId) -> bool {
        self.resolve(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The scene "Play" starts.
#[derive(Resource, Clone, Debug)]
pub struct StartScene(pub SceneId);

/// Native progress for `settled` of `total` assets.
///
/// A scene without assets is immediately ready.
pub fn native_progress_from(settled: usize, total: usize) -> f32 {
    if total == 0 {
        return ACTIVATION_THRESHOLD;
    }
    let fraction = settled.min(total) as f32 / total as f32;
    fraction * ACTIVATION_THRESHOLD
}

/// A pending scene load with activation held back.
#[derive(Debug)]
pub struct AssetSceneLoad {
    scene: String,
    target: GameState,
    handles: Vec<UntypedHandle>,
    last_progress: f32,
    activation_allowed: bool,
}

impl AssetSceneLoad {
    pub fn begin(entry: &SceneEntry, asset_server: &AssetServer) -> Self {
        let handles = entry
            .assets
            .iter()
            .map(|path| asset_server.load_untyped(path.clone()).untyped())
            .collect();

        Self {
            scene: entry.name.clone(),
            target: entry.state.clone(),
            handles,
            last_progress: 0.0,
            activation_allowed: false,
        }
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn target(&self) -> &GameState {
        &self.target
    }

    /// Monotonic load progress, at most [`ACTIVATION_THRESHOLD`].
    ///
    /// Failed assets count as settled; they are not retried.
    pub fn native_progress(&mut self, asset_server: &AssetServer) -> f32 {
        let settled = self
            .handles
            .iter()
            .filter(|handle| {
                asset_server.is_loaded_with_dependencies(handle.id())
                    || matches!(asset_server.load_state(handle.id()), LoadState::Failed(_))
            })
            .count();

        self.last_progress = self
            .last_progress
            .max(native_progress_from(settled, self.handles.len()));
        self.last_progress
    }

    pub fn allow_activation(&mut self, next_state: &mut NextState<GameState>) {
        if !self.activation_allowed {
            next_state.set(self.target.clone());
            self.activation_allowed = true;
        }
    }

    pub fn is_activated(&self, current: &GameState) -> bool {
        self.activation_allowed && *current == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SceneRegistry {
        SceneRegistry::default()
            .with_scene(SceneEntry::new("main_menu", GameState::MainMenu))
            .with_scene(SceneEntry::new("world", GameState::InGame).with_asset("audio/wind.ogg"))
    }

    #[test]
    fn resolves_by_name_and_index() {
        let registry = registry();
        assert_eq!(
            registry.resolve(&SceneId::from("world")).map(|e| &e.state),
            Some(&GameState::InGame)
        );
        assert_eq!(
            registry.resolve(&SceneId::Index(0)).map(|e| e.name.as_str()),
            Some("main_menu")
        );
    }

    #[test]
    fn empty_and_unknown_scenes_do_not_resolve() {
        let registry = registry();
        assert!(!registry.contains(&SceneId::from("")));
        assert!(!registry.contains(&SceneId::from("credits")));
        assert!(!registry.contains(&SceneId::Index(2)));
    }

    #[test]
    fn native_progress_saturates_at_threshold() {
        assert_eq!(native_progress_from(0, 4), 0.0);
        assert!((native_progress_from(2, 4) - 0.45).abs() < 1e-6);
        assert_eq!(native_progress_from(4, 4), ACTIVATION_THRESHOLD);
        assert_eq!(native_progress_from(9, 4), ACTIVATION_THRESHOLD);
        assert_eq!(native_progress_from(0, 0), ACTIVATION_THRESHOLD);
    }
}
