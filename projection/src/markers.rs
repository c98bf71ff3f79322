//! Map marker diffing.
//!
//! A marker survives an update (and is merely repositioned) only when its
//! object is still present, still on the map, and its icon URL is
//! byte-identical. Anything else tears the marker down, and recreates it if
//! the object should still be drawn.

#[cfg(test)]
#[path = "markers_test.rs"]
mod markers_test;

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Anything the map layer hands back for a live marker.
pub trait MarkerRef {
    /// Icon URL the marker was created with.
    fn icon_url(&self) -> &str;
}

impl MarkerRef for String {
    fn icon_url(&self) -> &str {
        self
    }
}

/// What the current object set wants drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSpec<K> {
    pub id: K,
    pub icon_url: String,
    pub on_map: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerDiff<K> {
    /// Markers to reposition in place.
    pub keep: Vec<K>,
    /// Markers to build from scratch.
    pub create: Vec<K>,
    /// Markers to tear down. Applied before `create`.
    pub remove: Vec<K>,
}

impl<K> MarkerDiff<K> {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.remove.is_empty()
    }
}

/// Split `current` against the live `previous` markers.
///
/// `keep` and `create` follow the order of `current`; `remove` is sorted.
/// Duplicate ids in `current` are considered once.
#[must_use]
pub fn map_marker_diff<K, M>(previous: &HashMap<K, M>, current: &[MarkerSpec<K>]) -> MarkerDiff<K>
where
    K: Eq + Hash + Clone + Ord,
    M: MarkerRef,
{
    let mut keep = Vec::new();
    let mut create = Vec::new();
    let mut remove = Vec::new();
    let mut seen: HashSet<&K> = HashSet::with_capacity(current.len());

    for spec in current {
        if !seen.insert(&spec.id) {
            continue;
        }
        match previous.get(&spec.id) {
            Some(marker) if spec.on_map && marker.icon_url() == spec.icon_url => keep.push(spec.id.clone()),
            Some(_) => {
                remove.push(spec.id.clone());
                if spec.on_map {
                    create.push(spec.id.clone());
                }
            }
            None if spec.on_map => create.push(spec.id.clone()),
            None => {}
        }
    }

    remove.extend(previous.keys().filter(|id| !seen.contains(id)).cloned());
    remove.sort();

    MarkerDiff { keep, create, remove }
}
