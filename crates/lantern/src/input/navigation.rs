//! Engine-free menu navigation: a wrapping linear cursor and explicit
//! per-direction neighbor links for grid layouts.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavDirection {
    Up,
    Down,
    Left,
    Right,
}

/// What a frame of menu input asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuIntent {
    Move(NavDirection),
    Submit,
}

/// Cursor over a fixed, ordered list of items.
///
/// Moving past either end wraps around. An empty list keeps the cursor at 0
/// and every move is a no-op.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MenuCursor {
    index: usize,
    len: usize,
}

impl MenuCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Change the item count, keeping the index when it is still valid.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if self.index >= len {
            self.index = 0;
        }
    }

    pub fn select(&mut self, index: usize) {
        if index < self.len {
            self.index = index;
        }
    }

    pub fn prev(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + self.len - 1) % self.len;
        }
        self.index
    }

    pub fn next(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
        self.index
    }

    /// Up/Down move the cursor; Left/Right are left to the selected item.
    pub fn step(&mut self, direction: NavDirection) -> bool {
        let before = self.index;
        match direction {
            NavDirection::Up => self.prev(),
            NavDirection::Down => self.next(),
            NavDirection::Left | NavDirection::Right => return false,
        };
        before != self.index
    }
}

/// Explicit links from one selectable to its neighbors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbors<K> {
    pub up: Option<K>,
    pub down: Option<K>,
    pub left: Option<K>,
    pub right: Option<K>,
}

impl<K> Default for Neighbors<K> {
    fn default() -> Self {
        Self {
            up: None,
            down: None,
            left: None,
            right: None,
        }
    }
}

impl<K: Copy> Neighbors<K> {
    pub fn step(&self, direction: NavDirection) -> Option<K> {
        match direction {
            NavDirection::Up => self.up,
            NavDirection::Down => self.down,
            NavDirection::Left => self.left,
            NavDirection::Right => self.right,
        }
    }
}

/// Neighbor links for a whole menu, keyed by selectable.
#[derive(Clone, Debug)]
pub struct NeighborMap<K> {
    links: HashMap<K, Neighbors<K>>,
}

impl<K> Default for NeighborMap<K> {
    fn default() -> Self {
        Self {
            links: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> NeighborMap<K> {
    pub fn insert(&mut self, key: K, neighbors: Neighbors<K>) {
        self.links.insert(key, neighbors);
    }

    /// Link `a` and `b` both ways along one axis: `b` lies `direction` of `a`.
    pub fn link(&mut self, a: K, direction: NavDirection, b: K) {
        let (forward, back) = match direction {
            NavDirection::Up => (NavDirection::Up, NavDirection::Down),
            NavDirection::Down => (NavDirection::Down, NavDirection::Up),
            NavDirection::Left => (NavDirection::Left, NavDirection::Right),
            NavDirection::Right => (NavDirection::Right, NavDirection::Left),
        };
        set_link(self.links.entry(a).or_default(), forward, b);
        set_link(self.links.entry(b).or_default(), back, a);
    }

    /// All links of `key`; unknown keys have none.
    pub fn neighbors(&self, key: K) -> Neighbors<K> {
        self.links.get(&key).copied().unwrap_or_default()
    }

    /// Neighbor of `from` in `direction`; `None` keeps the selection.
    pub fn step(&self, from: K, direction: NavDirection) -> Option<K> {
        self.links.get(&from).and_then(|n| n.step(direction))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

fn set_link<K>(neighbors: &mut Neighbors<K>, direction: NavDirection, to: K) {
    let slot = match direction {
        NavDirection::Up => &mut neighbors.up,
        NavDirection::Down => &mut neighbors.down,
        NavDirection::Left => &mut neighbors.left,
        NavDirection::Right => &mut neighbors.right,
    };
    *slot = Some(to);
}
