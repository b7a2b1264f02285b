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

//! A voice plays one clip through one output, gliding its parameters toward
//! their targets and removing itself once it has nothing left to play.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use super::registry::ChannelId;
use crate::assets::Clip;
use crate::output::{Output, Position};
use crate::params::{AutomatedParameter, VoiceParams, DEFAULT_TRANSITION_SPEED};

/// Global voice ID counter.
static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

/// Uniquely identifies a voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(u64);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents one playing (or about to play) instance of a clip.
pub struct Voice {
    id: VoiceId,
    /// The channel that owns this voice. Only used for identification; the
    /// channel's volume is handed to the voice on every tick.
    channel: ChannelId,
    volume: AutomatedParameter,
    pitch: AutomatedParameter,
    pan_stereo: AutomatedParameter,
    spatial_blend: AutomatedParameter,
    /// Seconds of silence left before the clip starts.
    remaining_left_silence: f32,
    /// Seconds of silence left after the clip finishes.
    remaining_right_silence: f32,
    output: Box<dyn Output>,
}

impl Voice {
    /// Creates a voice and starts the clip on the given output. All of the
    /// parameters are resolved once here. If there is leading silence, the
    /// clip starts once the silence has elapsed.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn play<R: Rng + ?Sized>(
        channel: ChannelId,
        mut output: Box<dyn Output>,
        clip: Option<Clip>,
        looping: bool,
        params: &VoiceParams,
        position: Option<Position>,
        rng: &mut R,
    ) -> Voice {
        let volume = AutomatedParameter::new(params.volume(rng), DEFAULT_TRANSITION_SPEED);
        let pitch = AutomatedParameter::new(params.pitch(rng), DEFAULT_TRANSITION_SPEED);
        let remaining_left_silence = params.left_silence_length(rng);
        let remaining_right_silence = params.right_silence_length(rng);
        let pan_stereo = AutomatedParameter::new(params.pan_stereo(rng), DEFAULT_TRANSITION_SPEED);
        let spatial_blend =
            AutomatedParameter::new(params.spatial_blend(rng), DEFAULT_TRANSITION_SPEED);
        let normalized_time = params.time(rng);

        output.set_clip(clip.clone());
        output.set_looping(looping);
        output.set_position(position);
        output.set_volume(volume.current());
        output.set_pitch(pitch.current());
        output.set_pan_stereo(pan_stereo.current());
        output.set_spatial_blend(spatial_blend.current());
        output.set_route(params.route().cloned());
        if let Some(clip) = &clip {
            let length = clip.length();
            output.set_time((normalized_time * length).clamp(0.0, length));
        }

        if remaining_left_silence == 0.0 {
            output.play();
        }

        Voice {
            id: VoiceId(NEXT_VOICE_ID.fetch_add(1, Ordering::SeqCst)),
            channel,
            volume,
            pitch,
            pan_stereo,
            spatial_blend,
            remaining_left_silence,
            remaining_right_silence,
            output,
        }
    }

    /// Resolves new targets for volume, pitch, pan and spatial blend. The
    /// voice glides toward them without restarting playback.
    pub(crate) fn apply<R: Rng + ?Sized>(&mut self, params: &VoiceParams, rng: &mut R) {
        self.volume.set_desired(params.volume(rng));
        self.pitch.set_desired(params.pitch(rng));
        self.pan_stereo.set_desired(params.pan_stereo(rng));
        self.spatial_blend.set_desired(params.spatial_blend(rng));
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    /// The channel that owns this voice.
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// The voice's own volume, before the channel volume is applied.
    pub fn volume(&self) -> &AutomatedParameter {
        &self.volume
    }

    pub fn pitch(&self) -> &AutomatedParameter {
        &self.pitch
    }

    pub fn pan_stereo(&self) -> &AutomatedParameter {
        &self.pan_stereo
    }

    pub fn spatial_blend(&self) -> &AutomatedParameter {
        &self.spatial_blend
    }

    pub fn remaining_left_silence(&self) -> f32 {
        self.remaining_left_silence
    }

    pub fn remaining_right_silence(&self) -> f32 {
        self.remaining_right_silence
    }

    /// Seconds until the voice finishes: the leading silence, the rest of the
    /// clip and the trailing silence. 0 if the voice has no clip.
    pub fn remaining_time(&self) -> f32 {
        match self.output.clip_length() {
            Some(length) => {
                let remaining_clip = (length - self.output.time()).max(0.0);
                self.remaining_left_silence + remaining_clip + self.remaining_right_silence
            }
            None => 0.0,
        }
    }

    /// Returns true if the output is playing at a non-zero volume.
    pub fn is_audible(&self) -> bool {
        self.output.is_playing() && self.output.volume() != 0.0
    }

    /// Advances the voice by one frame. `channel_volume` is the owning
    /// channel's current volume. Returns false once the voice is finished and
    /// should be removed.
    pub(crate) fn tick(&mut self, delta: f32, channel_volume: f32) -> bool {
        self.output.update(delta);

        self.output
            .set_volume(self.volume.update(delta) * channel_volume);
        self.output.set_pitch(self.pitch.update(delta));
        self.output.set_pan_stereo(self.pan_stereo.update(delta));
        self.output
            .set_spatial_blend(self.spatial_blend.update(delta));

        // Wait until the leading silence has elapsed before playing the clip.
        if self.remaining_left_silence > 0.0 {
            self.remaining_left_silence -= delta;
            if self.remaining_left_silence <= 0.0 {
                self.remaining_left_silence = 0.0;
                self.output.play();
            }
        }

        // The trailing silence only starts once the clip has finished.
        if self.remaining_left_silence == 0.0
            && !self.output.is_playing()
            && self.remaining_right_silence > 0.0
        {
            self.remaining_right_silence = (self.remaining_right_silence - delta).max(0.0);
        }

        self.remaining_left_silence > 0.0
            || self.remaining_right_silence > 0.0
            || self.is_audible()
    }
}

impl fmt::Debug for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Voice")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("volume", &self.volume.current())
            .field("remaining_left_silence", &self.remaining_left_silence)
            .field("remaining_right_silence", &self.remaining_right_silence)
            .field("playing", &self.output.is_playing())
            .finish()
    }
}
