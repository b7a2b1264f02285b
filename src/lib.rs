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

//! Triggers and mixes one-shot and looping sounds. Sounds are played through
//! channels, one per asset and kind of playback, which own the voices that
//! are actually heard.

pub mod assets;
pub mod config;
pub mod engine;
pub mod output;
pub mod params;
pub mod simulator;
#[cfg(test)]
mod testutil;

pub use assets::{Asset, AssetId, Clip, Soundbank};
pub use engine::{Engine, EngineError, Playback};
pub use output::{Backend, Output, Position, Route};
pub use params::{AutomatedParameter, Variance, VoiceParams};
