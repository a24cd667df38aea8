mod menu;
mod navigation;

pub use menu::{
    MenuAdjusted, MenuItem, MenuNavigation, MenuNavigationPlugin, MenuNeighbors, MenuSubmitted,
    NavigationMode,
};
pub use navigation::{MenuCursor, MenuIntent, NavDirection, NeighborMap, Neighbors};
