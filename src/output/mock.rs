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

//! A simulated backend. Doesn't actually produce sound, but advances
//! playback time as frames elapse so voices behave as they would against a
//! real device.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::{Backend, Output, Position, Route};
use crate::assets::Clip;

/// The observable state of a mock output.
#[derive(Debug)]
struct State {
    id: usize,
    clip: Option<Clip>,
    looping: bool,
    route: Option<Route>,
    position: Option<Position>,
    time: f32,
    playing: bool,
    volume: f32,
    pitch: f32,
    pan_stereo: f32,
    spatial_blend: f32,
    play_count: u32,
    released: bool,
}

/// A mock output. Playback advances by `delta * |pitch|` on every update.
pub struct MockOutput {
    state: Arc<Mutex<State>>,
}

impl Output for MockOutput {
    fn set_clip(&mut self, clip: Option<Clip>) {
        let mut state = self.state.lock();
        state.clip = clip;
        state.time = 0.0;
        state.playing = false;
    }

    fn clip_length(&self) -> Option<f32> {
        self.state.lock().clip.as_ref().map(Clip::length)
    }

    fn set_looping(&mut self, looping: bool) {
        self.state.lock().looping = looping;
    }

    fn set_route(&mut self, route: Option<Route>) {
        self.state.lock().route = route;
    }

    fn set_position(&mut self, position: Option<Position>) {
        self.state.lock().position = position;
    }

    fn set_time(&mut self, seconds: f32) {
        self.state.lock().time = seconds;
    }

    fn time(&self) -> f32 {
        self.state.lock().time
    }

    fn play(&mut self) {
        let mut state = self.state.lock();
        if state.clip.is_none() {
            return;
        }
        state.playing = true;
        state.play_count += 1;
        trace!(output = state.id, time = state.time, "Mock output playing");
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().volume = volume;
    }

    fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.state.lock().pitch = pitch;
    }

    fn set_pan_stereo(&mut self, pan: f32) {
        self.state.lock().pan_stereo = pan;
    }

    fn set_spatial_blend(&mut self, blend: f32) {
        self.state.lock().spatial_blend = blend;
    }

    fn update(&mut self, delta: f32) {
        let mut state = self.state.lock();
        if !state.playing {
            return;
        }
        let length = match &state.clip {
            Some(clip) => clip.length(),
            None => {
                state.playing = false;
                return;
            }
        };

        state.time += delta.max(0.0) * state.pitch.abs();
        if state.time >= length {
            if state.looping && length > 0.0 {
                state.time %= length;
            } else {
                state.time = length;
                state.playing = false;
            }
        }
    }
}

impl Drop for MockOutput {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.released = true;
    }
}

/// A read-only view of a mock output, for inspecting playback from tests and
/// the simulator.
#[derive(Clone)]
pub struct MockOutputHandle {
    state: Arc<Mutex<State>>,
}

impl MockOutputHandle {
    pub fn id(&self) -> usize {
        self.state.lock().id
    }

    pub fn clip(&self) -> Option<Clip> {
        self.state.lock().clip.clone()
    }

    pub fn is_looping(&self) -> bool {
        self.state.lock().looping
    }

    pub fn route(&self) -> Option<Route> {
        self.state.lock().route.clone()
    }

    pub fn position(&self) -> Option<Position> {
        self.state.lock().position
    }

    pub fn time(&self) -> f32 {
        self.state.lock().time
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn pitch(&self) -> f32 {
        self.state.lock().pitch
    }

    pub fn pan_stereo(&self) -> f32 {
        self.state.lock().pan_stereo
    }

    pub fn spatial_blend(&self) -> f32 {
        self.state.lock().spatial_blend
    }

    /// How many times playback has been started.
    pub fn play_count(&self) -> u32 {
        self.state.lock().play_count
    }

    /// Returns true once the owning voice has dropped the output.
    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }
}

impl fmt::Debug for MockOutputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockOutputHandle")
            .field("id", &state.id)
            .field("clip", &state.clip.as_ref().map(Clip::name))
            .field("playing", &state.playing)
            .field("released", &state.released)
            .finish()
    }
}

/// A mock backend that keeps a handle to every output it creates until
/// released outputs are pruned.
#[derive(Default)]
pub struct MockBackend {
    outputs: Vec<MockOutputHandle>,
    /// Outputs created so far, including pruned ones.
    created: usize,
}

impl MockBackend {
    pub fn new() -> MockBackend {
        MockBackend::default()
    }

    /// Every output created and not yet pruned, in creation order.
    pub fn outputs(&self) -> &[MockOutputHandle] {
        &self.outputs
    }

    /// The number of outputs created so far, including pruned ones.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Forgets the handles of released outputs. Returns how many were
    /// dropped.
    pub fn prune_released(&mut self) -> usize {
        let before = self.outputs.len();
        self.outputs.retain(|output| !output.is_released());
        before - self.outputs.len()
    }

    /// The most recently created output.
    pub fn last_output(&self) -> Option<&MockOutputHandle> {
        self.outputs.last()
    }

    /// The number of outputs that have not been released.
    pub fn live_outputs(&self) -> usize {
        self.outputs
            .iter()
            .filter(|output| !output.is_released())
            .count()
    }

    /// The number of outputs that are currently playing.
    pub fn playing_outputs(&self) -> usize {
        self.outputs
            .iter()
            .filter(|output| output.is_playing())
            .count()
    }
}

impl Backend for MockBackend {
    fn create_output(&mut self) -> Box<dyn Output> {
        let state = Arc::new(Mutex::new(State {
            id: self.created,
            clip: None,
            looping: false,
            route: None,
            position: None,
            time: 0.0,
            playing: false,
            volume: 1.0,
            pitch: 1.0,
            pan_stereo: 0.0,
            spatial_blend: 0.0,
            play_count: 0,
            released: false,
        }));
        self.outputs.push(MockOutputHandle {
            state: state.clone(),
        });
        self.created += 1;
        Box::new(MockOutput { state })
    }
}

impl fmt::Display for MockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mock ({} outputs, {} live)",
            self.created,
            self.live_outputs()
        )
    }
}
