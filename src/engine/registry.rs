// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The channel registry guarantees that there is at most one channel per
//! kind of playback for each asset, and is the only place channels are
//! created and destroyed.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use tracing::debug;

use super::channel::{Channel, ChannelKind, Spawner};
use super::EngineError;
use crate::assets::{Asset, AssetId};
use crate::output::Position;

/// Uniquely identifies a channel for the lifetime of its registry. A channel
/// that is destroyed and created again for the same asset gets a new ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    pub(crate) fn new(id: u64) -> ChannelId {
        ChannelId(id)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The registry key of a channel: what kind of channel it is and which asset
/// it plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    kind: ChannelKind,
    asset: AssetId,
}

impl ChannelKey {
    pub fn new(kind: ChannelKind, asset: AssetId) -> ChannelKey {
        ChannelKey { kind, asset }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn asset(&self) -> AssetId {
        self.asset
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.asset)
    }
}

/// Holds every live channel.
#[derive(Default)]
pub struct Registry {
    next_id: u64,
    /// Channels by ID, iterated in creation order.
    channels: BTreeMap<ChannelId, Channel>,
    /// Channel IDs by key.
    index: HashMap<ChannelKey, ChannelId>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Finds the live channel for the given key, if there is one.
    pub fn find(&self, key: &ChannelKey) -> Option<&Channel> {
        self.index.get(key).and_then(|id| self.channels.get(id))
    }

    pub(crate) fn find_mut(&mut self, key: &ChannelKey) -> Option<&mut Channel> {
        match self.index.get(key) {
            Some(id) => self.channels.get_mut(id),
            None => None,
        }
    }

    pub fn get(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.get_mut(&id)
    }

    /// Creates and registers a channel for the given asset. Callers must look
    /// for an existing channel first: registering a second channel for the
    /// same key is an error.
    pub(crate) fn create_and_register(
        &mut self,
        kind: ChannelKind,
        asset: Asset,
        position: Option<Position>,
    ) -> Result<ChannelId, EngineError> {
        let key = ChannelKey::new(kind, asset.id());
        if self.index.contains_key(&key) {
            return Err(EngineError::AlreadyRegistered(key));
        }

        self.next_id += 1;
        let id = ChannelId::new(self.next_id);
        debug!(channel = %id, kind = %kind, asset = asset.name(), "Channel created");
        self.channels
            .insert(id, Channel::new(id, kind, asset, position));
        self.index.insert(key, id);
        Ok(id)
    }

    /// Destroys a channel along with all of its voices. Returns false if
    /// there was no such channel.
    pub(crate) fn destroy(&mut self, id: ChannelId) -> bool {
        match self.channels.remove(&id) {
            Some(channel) => {
                self.index.remove(&channel.key());
                debug!(
                    channel = %id,
                    voices = channel.voice_count(),
                    "Channel destroyed"
                );
                true
            }
            None => false,
        }
    }

    /// A snapshot of every live channel ID, in creation order.
    pub fn all_live(&self) -> Vec<ChannelId> {
        self.channels.keys().copied().collect()
    }

    /// A snapshot of every live channel ID whose asset is not in `keep`.
    pub fn all_except(&self, keep: &[AssetId]) -> Vec<ChannelId> {
        let keep: HashSet<&AssetId> = keep.iter().collect();
        self.channels
            .values()
            .filter(|channel| !keep.contains(&channel.asset_id()))
            .map(Channel::id)
            .collect()
    }

    /// Snapshot of the channels playing the given asset, of any kind.
    pub fn for_asset(&self, asset: AssetId) -> Vec<ChannelId> {
        self.channels
            .values()
            .filter(|channel| channel.asset_id() == asset)
            .map(Channel::id)
            .collect()
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// The total number of voices across all channels.
    pub fn voice_count(&self) -> usize {
        self.channels.values().map(Channel::voice_count).sum()
    }

    /// Ticks every channel once, destroying the ones that are finished.
    pub(crate) fn tick(&mut self, delta: f32, spawner: &mut Spawner) {
        for id in self.all_live() {
            let alive = match self.channels.get_mut(&id) {
                Some(channel) => channel.tick(delta, spawner),
                None => continue,
            };
            if !alive {
                self.destroy(id);
            }
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("channels", &self.channels.len())
            .field("voices", &self.voice_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Clip, Soundbank};

    #[test]
    fn test_find_after_create() {
        let mut registry = Registry::new();
        let clip = Clip::new("clip", 1.0);
        let key = ChannelKey::new(ChannelKind::ClipHit, clip.id());
        assert!(registry.find(&key).is_none());

        let id = registry
            .create_and_register(ChannelKind::ClipHit, clip.into(), None)
            .unwrap();
        assert_eq!(registry.find(&key).map(Channel::id), Some(id));
        assert_eq!(registry.len(), 1);

        // The looping channel for the same clip is a different key.
        let loop_key = ChannelKey::new(ChannelKind::ClipLoop, key.asset());
        assert!(registry.find(&loop_key).is_none());
    }

    #[test]
    fn test_double_registration_is_an_error() {
        let mut registry = Registry::new();
        let clip = Clip::new("clip", 1.0);
        registry
            .create_and_register(ChannelKind::ClipHit, clip.clone().into(), None)
            .unwrap();
        let result = registry.create_and_register(ChannelKind::ClipHit, clip.into(), None);
        assert!(matches!(result, Err(EngineError::AlreadyRegistered(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_destroy_frees_key() {
        let mut registry = Registry::new();
        let clip = Clip::new("clip", 1.0);
        let key = ChannelKey::new(ChannelKind::ClipLoop, clip.id());
        let first = registry
            .create_and_register(ChannelKind::ClipLoop, clip.clone().into(), None)
            .unwrap();
        assert!(registry.destroy(first));
        assert!(!registry.destroy(first));
        assert!(registry.find(&key).is_none());

        let second = registry
            .create_and_register(ChannelKind::ClipLoop, clip.into(), None)
            .unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_all_except() {
        let mut registry = Registry::new();
        let music = Clip::new("music", 10.0);
        let steps = Soundbank::new("steps", vec![Clip::new("step", 0.2)]);
        let door = Clip::new("door", 1.0);

        let music_id = registry
            .create_and_register(ChannelKind::ClipLoop, music.clone().into(), None)
            .unwrap();
        let steps_id = registry
            .create_and_register(ChannelKind::SoundbankHit, steps.clone().into(), None)
            .unwrap();
        let door_hit = registry
            .create_and_register(ChannelKind::ClipHit, door.clone().into(), None)
            .unwrap();
        let door_loop = registry
            .create_and_register(ChannelKind::ClipLoop, door.clone().into(), None)
            .unwrap();

        assert_eq!(
            registry.all_live(),
            vec![music_id, steps_id, door_hit, door_loop]
        );
        assert_eq!(
            registry.all_except(&[music.id(), steps.id()]),
            vec![door_hit, door_loop]
        );
        assert_eq!(registry.for_asset(door.id()), vec![door_hit, door_loop]);
    }

    #[test]
    fn test_snapshot_survives_destruction() {
        let mut registry = Registry::new();
        for i in 0..5 {
            registry
                .create_and_register(
                    ChannelKind::ClipHit,
                    Clip::new(&format!("clip{}", i), 1.0).into(),
                    None,
                )
                .unwrap();
        }

        let snapshot = registry.all_live();
        for id in &snapshot {
            assert!(registry.destroy(*id));
        }
        assert!(registry.is_empty());
        assert_eq!(snapshot.len(), 5);
    }
}
