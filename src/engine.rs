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

//! The engine plays hits and loops. It owns the channel registry, creates
//! channels on demand, and ticks every channel and voice once per frame.

mod channel;
mod command;
mod registry;
#[cfg(test)]
mod tests;
mod voice;

use crossbeam_channel::{Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info};

use crate::assets::{Asset, AssetId};
use crate::output::{Backend, Position};
use crate::params::VoiceParams;

pub use channel::{Channel, ChannelKind, Playback};
pub use command::{Command, CommandSender};
pub use registry::{ChannelId, ChannelKey, Registry};
pub use voice::{Voice, VoiceId};

use channel::Spawner;

/// Errors returned by the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("a channel is already registered for {0}")]
    AlreadyRegistered(ChannelKey),

    #[error("the engine command queue is closed")]
    CommandQueueClosed,
}

/// Plays hits and loops through outputs created by a backend.
pub struct Engine<B: Backend> {
    registry: Registry,
    backend: B,
    rng: StdRng,
    command_tx: Sender<Command>,
    command_rx: Receiver<Command>,
}

impl<B: Backend> Engine<B> {
    /// Creates a new engine with a randomly seeded generator.
    pub fn new(backend: B) -> Self {
        Self::with_rng(backend, StdRng::from_entropy())
    }

    /// Creates a new engine whose random choices are reproducible.
    pub fn with_seed(backend: B, seed: u64) -> Self {
        Self::with_rng(backend, StdRng::seed_from_u64(seed))
    }

    fn with_rng(backend: B, rng: StdRng) -> Self {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        Self {
            registry: Registry::new(),
            backend,
            rng,
            command_tx,
            command_rx,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The number of live channels.
    pub fn channel_count(&self) -> usize {
        self.registry.len()
    }

    /// The number of live voices across all channels.
    pub fn voice_count(&self) -> usize {
        self.registry.voice_count()
    }

    /// Returns a sender for queueing commands from other threads.
    pub fn command_sender(&self) -> CommandSender {
        CommandSender::new(self.command_tx.clone())
    }

    /// Finds the channel that plays the given asset.
    pub fn find_channel(&self, asset: &Asset, playback: Playback) -> Option<&Channel> {
        let key = ChannelKey::new(ChannelKind::new(asset, playback), asset.id());
        self.registry.find(&key)
    }

    /// The number of voices on the asset's channel, or 0 if there is none.
    pub fn find_channel_voice_count(&self, asset: &Asset, playback: Playback) -> usize {
        self.find_channel(asset, playback)
            .map_or(0, Channel::voice_count)
    }

    /// Plays the asset once. Does nothing if there is no asset. Uses
    /// [`VoiceParams::variable_2d`] if no parameters are given.
    pub fn hit(
        &mut self,
        asset: Option<&Asset>,
        params: Option<VoiceParams>,
        position: Option<Position>,
    ) -> Result<(), EngineError> {
        let Some(asset) = asset else {
            return Ok(());
        };
        let params = params.unwrap_or_else(|| VoiceParams::variable_2d(0.9, 1.0).build());
        self.trigger(asset, Playback::Hit, params, position)
    }

    /// Plays the asset once, unless its hit channel already has `limit` or
    /// more voices. A limit of 0 means no limit.
    pub fn hit_limited(
        &mut self,
        asset: Option<&Asset>,
        params: Option<VoiceParams>,
        position: Option<Position>,
        limit: usize,
    ) -> Result<(), EngineError> {
        if let Some(asset) = asset {
            if limit > 0 && self.find_channel_voice_count(asset, Playback::Hit) >= limit {
                debug!(asset = asset.name(), limit, "Voice limit reached, skipping hit");
                return Ok(());
            }
        }
        self.hit(asset, params, position)
    }

    /// Starts a sustained sound, or updates it if it is already playing. Does
    /// nothing if there is no asset. Uses [`VoiceParams::const_2d`] if no
    /// parameters are given.
    pub fn play_loop(
        &mut self,
        asset: Option<&Asset>,
        params: Option<VoiceParams>,
        position: Option<Position>,
    ) -> Result<(), EngineError> {
        let Some(asset) = asset else {
            return Ok(());
        };
        let params = params.unwrap_or_else(|| VoiceParams::const_2d(1.0, 1.0).build());
        self.trigger(asset, Playback::Loop, params, position)
    }

    fn trigger(
        &mut self,
        asset: &Asset,
        playback: Playback,
        params: VoiceParams,
        position: Option<Position>,
    ) -> Result<(), EngineError> {
        let kind = ChannelKind::new(asset, playback);
        let key = ChannelKey::new(kind, asset.id());
        let id = match self.registry.find(&key) {
            Some(channel) => channel.id(),
            None => self
                .registry
                .create_and_register(kind, asset.clone(), position)?,
        };

        let mut spawner = Spawner {
            backend: &mut self.backend,
            rng: &mut self.rng,
        };
        if let Some(channel) = self.registry.get_mut(id) {
            channel.set_volume(1.0);
            channel.trigger(params, &mut spawner);
        }
        Ok(())
    }

    /// Fades out the hit and loop channels of the asset. Voices keep playing
    /// until the fade completes.
    pub fn stop(&mut self, asset: Option<&Asset>) {
        let Some(asset) = asset else {
            return;
        };
        for playback in [Playback::Hit, Playback::Loop] {
            let key = ChannelKey::new(ChannelKind::new(asset, playback), asset.id());
            if let Some(channel) = self.registry.find_mut(&key) {
                channel.set_volume(0.0);
            }
        }
    }

    /// Fades out every channel.
    pub fn stop_all(&mut self) {
        let ids = self.registry.all_live();
        info!(channels = ids.len(), "Stopping all channels");
        self.fade_out(&ids);
    }

    /// Fades out every channel that doesn't play one of the given assets.
    pub fn stop_all_except(&mut self, keep: &[AssetId]) {
        let ids = self.registry.all_except(keep);
        info!(
            channels = ids.len(),
            kept = keep.len(),
            "Stopping all channels except kept assets"
        );
        self.fade_out(&ids);
    }

    fn fade_out(&mut self, ids: &[ChannelId]) {
        for id in ids {
            if let Some(channel) = self.registry.get_mut(*id) {
                channel.set_volume(0.0);
            }
        }
    }

    /// Immediately destroys the hit and loop channels of the asset and all
    /// of their voices.
    pub fn halt(&mut self, asset: Option<&Asset>) {
        let Some(asset) = asset else {
            return;
        };
        let ids = self.registry.for_asset(asset.id());
        self.destroy(&ids);
    }

    /// Immediately destroys every channel.
    pub fn halt_all(&mut self) {
        let ids = self.registry.all_live();
        info!(channels = ids.len(), "Halting all channels");
        self.destroy(&ids);
    }

    /// Immediately destroys every channel that doesn't play one of the given
    /// assets.
    pub fn halt_all_except(&mut self, keep: &[AssetId]) {
        let ids = self.registry.all_except(keep);
        info!(
            channels = ids.len(),
            kept = keep.len(),
            "Halting all channels except kept assets"
        );
        self.destroy(&ids);
    }

    fn destroy(&mut self, ids: &[ChannelId]) {
        for id in ids {
            self.registry.destroy(*id);
        }
    }

    /// Applies a single command.
    pub fn apply(&mut self, command: Command) -> Result<(), EngineError> {
        match command {
            Command::Hit {
                asset,
                params,
                position,
                limit,
            } => self.hit_limited(Some(&asset), params, position, limit),
            Command::Loop {
                asset,
                params,
                position,
            } => self.play_loop(Some(&asset), params, position),
            Command::Stop(asset) => {
                self.stop(Some(&asset));
                Ok(())
            }
            Command::StopAll => {
                self.stop_all();
                Ok(())
            }
            Command::StopAllExcept(keep) => {
                self.stop_all_except(&keep);
                Ok(())
            }
            Command::Halt(asset) => {
                self.halt(Some(&asset));
                Ok(())
            }
            Command::HaltAll => {
                self.halt_all();
                Ok(())
            }
            Command::HaltAllExcept(keep) => {
                self.halt_all_except(&keep);
                Ok(())
            }
        }
    }

    /// Advances the engine by one frame: applies queued commands in the order
    /// they were sent, then ticks every channel, each followed by its voices.
    pub fn tick(&mut self, delta: f32) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };

        while let Ok(command) = self.command_rx.try_recv() {
            if let Err(e) = self.apply(command) {
                error!(error = %e, "Failed to apply queued command");
            }
        }

        let mut spawner = Spawner {
            backend: &mut self.backend,
            rng: &mut self.rng,
        };
        self.registry.tick(delta, &mut spawner);
    }
}

impl<B: Backend> std::fmt::Debug for Engine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("channels", &self.registry.len())
            .field("voices", &self.registry.voice_count())
            .finish()
    }
}
