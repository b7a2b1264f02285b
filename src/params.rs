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

//! Voice parameters: values that glide toward a target over time, ranges that
//! are resolved randomly when a sound is triggered, and the bundle of ranges
//! that describes how a single trigger should sound.

mod automated;
mod variance;
mod voice_params;

pub use automated::{AutomatedParameter, DEFAULT_TRANSITION_SPEED};
pub use variance::Variance;
pub use voice_params::{VoiceParams, VoiceParamsBuilder};
