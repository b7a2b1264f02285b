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
use std::fmt;
use std::sync::Arc;

use crate::assets::Clip;

pub mod mock;

/// An opaque handle naming where a voice's output is sent, e.g. a mixer bus.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Route(Arc<str>);

impl Route {
    pub fn new(name: &str) -> Route {
        Route(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A position in world space for spatialized playback.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Position {
        Position { x, y, z }
    }
}

/// A physical playback resource that plays one clip at a time. Each voice
/// owns exactly one output, and dropping the output releases it.
pub trait Output: Send {
    /// Sets the clip to play. Clears the playback position.
    fn set_clip(&mut self, clip: Option<Clip>);

    /// The length of the current clip in seconds, or None if there is no clip.
    fn clip_length(&self) -> Option<f32>;

    /// Whether playback wraps around at the end of the clip.
    fn set_looping(&mut self, looping: bool);

    /// Where the output is sent.
    fn set_route(&mut self, route: Option<Route>);

    /// Where the output is in world space.
    fn set_position(&mut self, position: Option<Position>);

    /// Sets the playback position in seconds.
    fn set_time(&mut self, seconds: f32);

    /// The playback position in seconds.
    fn time(&self) -> f32;

    /// Starts playback from the current playback position.
    fn play(&mut self);

    /// Returns true while the clip is playing.
    fn is_playing(&self) -> bool;

    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    fn set_pitch(&mut self, pitch: f32);

    fn set_pan_stereo(&mut self, pan: f32);

    fn set_spatial_blend(&mut self, blend: f32);

    /// Called once per frame with the elapsed time. Backends that render on
    /// their own thread may ignore this.
    fn update(&mut self, _delta: f32) {}
}

/// Creates outputs for new voices.
pub trait Backend: Send {
    fn create_output(&mut self) -> Box<dyn Output>;
}
