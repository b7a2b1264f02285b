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

//! A channel owns every voice playing one audio asset, and decides what a
//! trigger does: start another voice, update the voice that is already
//! playing, or keep a silence-padded loop cycling.

use std::fmt;

use rand::rngs::StdRng;
use tracing::{debug, warn};

use super::registry::{ChannelId, ChannelKey};
use super::voice::{Voice, VoiceId};
use crate::assets::{Asset, AssetId, Clip};
use crate::output::{Backend, Position};
use crate::params::{AutomatedParameter, VoiceParams, DEFAULT_TRANSITION_SPEED};

/// Whether a trigger plays a sound once or keeps it going.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Playback {
    Hit,
    Loop,
}

/// The kind of channel, which determines how it reacts to triggers and when
/// it is destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelKind {
    /// Plays a clip once per trigger.
    ClipHit,
    /// Keeps a clip playing.
    ClipLoop,
    /// Plays a random clip from a soundbank once per trigger.
    SoundbankHit,
    /// Keeps playing random clips from a soundbank, one after another.
    SoundbankLoop,
}

impl ChannelKind {
    /// The kind of channel that plays the given asset.
    pub fn new(asset: &Asset, playback: Playback) -> ChannelKind {
        match (asset, playback) {
            (Asset::Clip(_), Playback::Hit) => ChannelKind::ClipHit,
            (Asset::Clip(_), Playback::Loop) => ChannelKind::ClipLoop,
            (Asset::Soundbank(_), Playback::Hit) => ChannelKind::SoundbankHit,
            (Asset::Soundbank(_), Playback::Loop) => ChannelKind::SoundbankLoop,
        }
    }

    pub fn playback(self) -> Playback {
        match self {
            ChannelKind::ClipHit | ChannelKind::SoundbankHit => Playback::Hit,
            ChannelKind::ClipLoop | ChannelKind::SoundbankLoop => Playback::Loop,
        }
    }

    /// True if the channel should be destroyed as soon as it has no voices.
    /// Looping channels persist until their volume fades out.
    pub fn destroy_when_no_voices(self) -> bool {
        self.playback() == Playback::Hit
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::ClipHit => "clip hit",
            ChannelKind::ClipLoop => "clip loop",
            ChannelKind::SoundbankHit => "soundbank hit",
            ChannelKind::SoundbankLoop => "soundbank loop",
        };
        f.write_str(name)
    }
}

/// What a channel needs to start new voices.
pub(crate) struct Spawner<'a> {
    pub backend: &'a mut dyn Backend,
    pub rng: &'a mut StdRng,
}

/// The wake-up deadline of a silence-scheduled loop. Present only while the
/// loop is running.
#[derive(Clone, Copy, Debug)]
struct LoopToken {
    /// Channel clock time at which the next cycle starts.
    wake_at: f64,
    /// Number of cycles started so far.
    cycles: u64,
}

/// Plays one audio asset.
pub struct Channel {
    id: ChannelId,
    kind: ChannelKind,
    asset: Asset,
    position: Option<Position>,
    volume: AutomatedParameter,
    voices: Vec<Voice>,
    /// Seconds this channel has been ticked for.
    clock: f64,
    /// The parameters used by the next loop cycle.
    params: Option<VoiceParams>,
    /// The running silence-scheduled loop, if any.
    loop_token: Option<LoopToken>,
    /// The voice that retriggers are applied to on looping clip channels.
    current_voice: Option<VoiceId>,
    warned_empty: bool,
}

impl Channel {
    pub(crate) fn new(id: ChannelId, kind: ChannelKind, asset: Asset, position: Option<Position>) -> Channel {
        Channel {
            id,
            kind,
            asset,
            position,
            volume: AutomatedParameter::new(1.0, DEFAULT_TRANSITION_SPEED),
            voices: Vec::new(),
            clock: 0.0,
            params: None,
            loop_token: None,
            current_voice: None,
            warned_empty: false,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn key(&self) -> ChannelKey {
        ChannelKey::new(self.kind, self.asset.id())
    }

    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset.id()
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// The channel volume, which scales every voice it owns.
    pub fn volume(&self) -> &AutomatedParameter {
        &self.volume
    }

    /// Sets the volume the channel glides toward. Gliding to 0 destroys the
    /// channel and all of its voices.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume.set_desired(volume);
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Returns true while a silence-scheduled loop is running.
    pub fn is_looping(&self) -> bool {
        self.loop_token.is_some()
    }

    /// The number of silence-scheduled loop cycles started so far.
    pub fn loop_cycles(&self) -> u64 {
        self.loop_token.map_or(0, |token| token.cycles)
    }

    /// Starts, restarts or continues playback with the given parameters.
    pub(crate) fn trigger(&mut self, params: VoiceParams, spawner: &mut Spawner) {
        match self.kind {
            ChannelKind::ClipHit | ChannelKind::SoundbankHit => {
                let clip = self.pick_clip(spawner);
                self.spawn_voice(clip, false, &params, spawner);
            }
            ChannelKind::ClipLoop => {
                let current = self
                    .current_voice
                    .and_then(|id| self.voices.iter_mut().find(|voice| voice.id() == id));
                match current {
                    Some(voice) => {
                        voice.apply(&params, spawner.rng);
                        debug!(
                            channel = %self.id,
                            voice = %voice.id(),
                            "Applied new parameters to looping voice"
                        );
                        self.params = Some(params);
                    }
                    // The loop is between cycles; the next cycle picks these up.
                    None if self.loop_token.is_some() => {
                        self.params = Some(params);
                    }
                    None if params.has_silence_padding() => {
                        self.params = Some(params);
                        self.start_loop(spawner);
                    }
                    None => {
                        let clip = self.pick_clip(spawner);
                        let id = self.spawn_voice(clip, true, &params, spawner);
                        self.current_voice = Some(id);
                        self.params = Some(params);
                    }
                }
            }
            ChannelKind::SoundbankLoop => {
                self.params = Some(params);
                self.start_loop(spawner);
            }
        }
    }

    /// Starts the silence-scheduled loop unless it is already running. The
    /// first cycle starts right away.
    fn start_loop(&mut self, spawner: &mut Spawner) {
        if self.loop_token.is_some() {
            return;
        }
        self.loop_token = Some(LoopToken {
            wake_at: self.clock,
            cycles: 0,
        });
        debug!(channel = %self.id, kind = %self.kind, "Loop started");
        self.run_loop(spawner);
    }

    /// Starts the next loop cycle if its deadline has been reached.
    fn run_loop(&mut self, spawner: &mut Spawner) {
        let Some(token) = self.loop_token else {
            return;
        };
        if self.clock < token.wake_at {
            return;
        }
        let Some(params) = self.params.clone() else {
            return;
        };

        let clip = self.pick_clip(spawner);
        let id = self.spawn_voice(clip, false, &params, spawner);
        let wait = self
            .voices
            .iter()
            .find(|voice| voice.id() == id)
            .map_or(0.0, Voice::remaining_time);

        self.current_voice = Some(id);
        self.loop_token = Some(LoopToken {
            wake_at: self.clock + f64::from(wait),
            cycles: token.cycles + 1,
        });
        debug!(
            channel = %self.id,
            voice = %id,
            cycle = token.cycles + 1,
            wait,
            "Loop cycle started"
        );
    }

    fn pick_clip(&mut self, spawner: &mut Spawner) -> Option<Clip> {
        match &self.asset {
            Asset::Clip(clip) => Some(clip.clone()),
            Asset::Soundbank(soundbank) => {
                let clip = soundbank.random_clip(spawner.rng);
                if clip.is_none() && !self.warned_empty {
                    warn!(
                        channel = %self.id,
                        soundbank = soundbank.name(),
                        "Soundbank has no clips to play"
                    );
                    self.warned_empty = true;
                }
                clip
            }
        }
    }

    fn spawn_voice(
        &mut self,
        clip: Option<Clip>,
        looping: bool,
        params: &VoiceParams,
        spawner: &mut Spawner,
    ) -> VoiceId {
        let output = spawner.backend.create_output();
        let voice = Voice::play(
            self.id,
            output,
            clip,
            looping,
            params,
            self.position,
            spawner.rng,
        );
        let id = voice.id();
        debug!(
            channel = %self.id,
            voice = %id,
            asset = self.asset.name(),
            looping,
            "Voice spawned"
        );
        self.voices.push(voice);
        id
    }

    /// Advances the channel and its voices by one frame. Returns false once
    /// the channel should be destroyed.
    pub(crate) fn tick(&mut self, delta: f32, spawner: &mut Spawner) -> bool {
        self.clock += f64::from(delta);
        let volume = self.volume.update(delta);

        // If this channel is no longer audible, destroy it.
        if volume == 0.0 {
            debug!(
                channel = %self.id,
                voices = self.voices.len(),
                "Channel faded out"
            );
            return false;
        }
        // If this channel has no more voices, destroy it.
        if self.kind.destroy_when_no_voices() && self.voices.is_empty() {
            debug!(channel = %self.id, "Channel has no voices left");
            return false;
        }

        let channel = self.id;
        self.voices.retain_mut(|voice| {
            let alive = voice.tick(delta, volume);
            if !alive {
                debug!(channel = %channel, voice = %voice.id(), "Voice finished");
            }
            alive
        });

        if let Some(id) = self.current_voice {
            if !self.voices.iter().any(|voice| voice.id() == id) {
                self.current_voice = None;
            }
        }

        self.run_loop(spawner);
        true
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("asset", &self.asset.name())
            .field("volume", &self.volume.current())
            .field("voices", &self.voices.len())
            .field("looping", &self.loop_token.is_some())
            .finish()
    }
}
