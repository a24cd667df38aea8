//! Typed, delta-persisted preference sections.
//!
//! Every section is a plain serde struct implementing [`Settings`]. Only the
//! fields that differ from `Default` are written to the settings file, so new
//! defaults shipped with an update reach players who never touched them.

#[cfg(feature = "bevy")]
mod bevy_adapter;
mod errors;
mod store;

#[cfg(feature = "bevy")]
pub use bevy_adapter::*;

pub use errors::SettingsError;
pub use store::{SettingsStore, SettingsStoreBuilder};

use serde::{Serialize, de::DeserializeOwned};

/// A section of the settings file.
pub trait Settings: Default + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Key of the section inside the settings file.
    const SECTION: &'static str;

    /// Clamp or repair values before they are stored.
    fn sanitize(&mut self) {}
}
