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
use rand::Rng;

use super::Variance;
use crate::output::Route;

/// A collection of parameter ranges that describe how a single trigger of a
/// sound should play. The ranges are resolved into concrete values each time
/// a voice is started, so two voices started from the same parameters may
/// sound slightly different.
///
/// Parameters are immutable once built. Use [`VoiceParams::to_builder`] to
/// derive a modified copy.
#[derive(Clone, Debug, PartialEq)]
pub struct VoiceParams {
    volume: Variance,
    pitch: Variance,
    normalized_time: Variance,
    left_silence_padding: Variance,
    right_silence_padding: Variance,
    pan_stereo: Variance,
    spatial_blend: Variance,
    route: Option<Route>,
}

impl VoiceParams {
    /// Creates a builder initialized with the default parameters.
    pub fn builder() -> VoiceParamsBuilder {
        VoiceParamsBuilder::default()
    }

    /// Creates a builder initialized with a copy of these parameters.
    pub fn to_builder(&self) -> VoiceParamsBuilder {
        VoiceParamsBuilder {
            params: self.clone(),
        }
    }

    /// A 2D voice with a volume and pitch that vary by 0.1 in either
    /// direction.
    pub fn variable_2d(volume: f32, pitch: f32) -> VoiceParamsBuilder {
        Self::builder()
            .volume(Variance::variance(volume, 0.1))
            .pitch(Variance::variance(pitch, 0.1))
            .spatial_blend(Variance::constant(0.0))
    }

    /// A 2D voice with a constant volume and pitch.
    pub fn const_2d(volume: f32, pitch: f32) -> VoiceParamsBuilder {
        Self::builder()
            .volume(Variance::constant(volume))
            .pitch(Variance::constant(pitch))
            .spatial_blend(Variance::constant(0.0))
    }

    /// A 3D voice with a volume and pitch that vary by 0.1 in either
    /// direction.
    pub fn variable_3d(volume: f32, pitch: f32) -> VoiceParamsBuilder {
        Self::builder()
            .volume(Variance::variance(volume, 0.1))
            .pitch(Variance::variance(pitch, 0.1))
            .spatial_blend(Variance::constant(1.0))
    }

    /// A 3D voice with a constant volume and pitch.
    pub fn const_3d(volume: f32, pitch: f32) -> VoiceParamsBuilder {
        Self::builder()
            .volume(Variance::constant(volume))
            .pitch(Variance::constant(pitch))
            .spatial_blend(Variance::constant(1.0))
    }

    /// Generates a volume, where 1 is the unaltered volume of the audio and 0
    /// is muted.
    pub fn volume<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.volume.generate(rng)
    }

    /// Generates a pitch.
    pub fn pitch<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.pitch.generate(rng)
    }

    /// Generates a normalized start position, wrapped to `[0, 1)`.
    pub fn time<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        (self.normalized_time.generate(rng) % 1.0).clamp(0.0, 1.0)
    }

    /// Generates the seconds of silence that precede the audio.
    pub fn left_silence_length<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.left_silence_padding.generate(rng).max(0.0)
    }

    /// Generates the seconds of silence that follow the audio.
    pub fn right_silence_length<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.right_silence_padding.generate(rng).max(0.0)
    }

    /// Generates a stereo pan.
    pub fn pan_stereo<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.pan_stereo.generate(rng)
    }

    /// Generates a spatial blend, where 0 is fully 2D and 1 is fully 3D.
    pub fn spatial_blend<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.spatial_blend.generate(rng)
    }

    /// The output route voices should be sent to.
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// Returns true if these parameters can pad the audio with silence on
    /// either side.
    pub fn has_silence_padding(&self) -> bool {
        self.left_silence_padding.can_be_nonzero() || self.right_silence_padding.can_be_nonzero()
    }

    pub fn volume_range(&self) -> Variance {
        self.volume
    }

    pub fn pitch_range(&self) -> Variance {
        self.pitch
    }

    pub fn normalized_time_range(&self) -> Variance {
        self.normalized_time
    }

    pub fn left_silence_padding_range(&self) -> Variance {
        self.left_silence_padding
    }

    pub fn right_silence_padding_range(&self) -> Variance {
        self.right_silence_padding
    }

    pub fn pan_stereo_range(&self) -> Variance {
        self.pan_stereo
    }

    pub fn spatial_blend_range(&self) -> Variance {
        self.spatial_blend
    }
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            volume: Variance::range(0.8, 1.0),
            pitch: Variance::variance(1.0, 0.1),
            normalized_time: Variance::constant(0.0),
            left_silence_padding: Variance::constant(0.0),
            right_silence_padding: Variance::constant(0.0),
            pan_stereo: Variance::constant(0.0),
            spatial_blend: Variance::constant(0.0),
            route: None,
        }
    }
}

/// Builds [`VoiceParams`] one parameter at a time.
#[derive(Clone, Debug, Default)]
pub struct VoiceParamsBuilder {
    params: VoiceParams,
}

impl VoiceParamsBuilder {
    /// The volume of the voice. 1 is the default volume of the audio and 0 is
    /// muted.
    pub fn volume(mut self, volume: Variance) -> Self {
        self.params.volume = volume;
        self
    }

    /// The pitch of the voice.
    pub fn pitch(mut self, pitch: Variance) -> Self {
        self.params.pitch = pitch;
        self
    }

    /// The normalized initial playback position of the voice, where 0 is the
    /// beginning of the audio and 1 is the end. Generated values are wrapped
    /// to `[0, 1)`. Has no effect on a voice that is already playing.
    pub fn normalized_time(mut self, normalized_time: Variance) -> Self {
        self.params.normalized_time = normalized_time;
        self
    }

    /// Seconds of silence to insert before the voice generates sound.
    pub fn left_silence_padding(mut self, padding: Variance) -> Self {
        self.params.left_silence_padding = padding;
        self
    }

    /// Seconds of silence to insert after the voice finishes its audio.
    pub fn right_silence_padding(mut self, padding: Variance) -> Self {
        self.params.right_silence_padding = padding;
        self
    }

    /// Pans the voice between the left and right speakers before it is
    /// spatialized.
    pub fn pan_stereo(mut self, pan: Variance) -> Self {
        self.params.pan_stereo = pan;
        self
    }

    /// How much the voice is affected by 3D spatialization. 0 is fully 2D and
    /// 1 is fully 3D.
    pub fn spatial_blend(mut self, blend: Variance) -> Self {
        self.params.spatial_blend = blend;
        self
    }

    /// The output route the voice is sent to.
    pub fn route(mut self, route: Option<Route>) -> Self {
        self.params.route = route;
        self
    }

    pub fn build(self) -> VoiceParams {
        self.params
    }
}

impl From<VoiceParamsBuilder> for VoiceParams {
    fn from(builder: VoiceParamsBuilder) -> Self {
        builder.build()
    }
}
