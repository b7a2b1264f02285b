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

//! Audio assets that can be triggered: single clips and soundbanks of
//! interchangeable clips.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

/// Global asset ID counter.
static NEXT_ASSET_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one audio asset for the lifetime of the process. Clones of an
/// asset share its identity; two assets created separately never do, even if
/// they have the same name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u64);

impl AssetId {
    fn next() -> Self {
        AssetId(NEXT_ASSET_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct ClipInner {
    id: AssetId,
    name: String,
    length: f32,
}

/// A single piece of audio with a known length.
#[derive(Clone, Debug)]
pub struct Clip {
    inner: Arc<ClipInner>,
}

impl Clip {
    /// Creates a new clip. Negative or non-finite lengths are treated as 0.
    pub fn new(name: &str, length: f32) -> Clip {
        let length = if length.is_finite() {
            length.max(0.0)
        } else {
            0.0
        };
        Clip {
            inner: Arc::new(ClipInner {
                id: AssetId::next(),
                name: name.to_string(),
                length,
            }),
        }
    }

    pub fn id(&self) -> AssetId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The length of the clip in seconds.
    pub fn length(&self) -> f32 {
        self.inner.length
    }
}

impl PartialEq for Clip {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Clip {}

#[derive(Debug)]
struct SoundbankInner {
    id: AssetId,
    name: String,
    clips: Vec<Clip>,
}

/// A named collection of clips, one of which is picked at random each time
/// the soundbank is played.
#[derive(Clone, Debug)]
pub struct Soundbank {
    inner: Arc<SoundbankInner>,
}

impl Soundbank {
    pub fn new(name: &str, clips: Vec<Clip>) -> Soundbank {
        Soundbank {
            inner: Arc::new(SoundbankInner {
                id: AssetId::next(),
                name: name.to_string(),
                clips,
            }),
        }
    }

    pub fn id(&self) -> AssetId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn clips(&self) -> &[Clip] {
        &self.inner.clips
    }

    pub fn is_empty(&self) -> bool {
        self.inner.clips.is_empty()
    }

    /// The length of the longest clip, or 0 if the soundbank is empty.
    pub fn max_length(&self) -> f32 {
        self.inner
            .clips
            .iter()
            .map(Clip::length)
            .fold(0.0, f32::max)
    }

    /// Picks a clip uniformly at random. Returns None if the soundbank is
    /// empty.
    pub fn random_clip<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Clip> {
        self.inner.clips.choose(rng).cloned()
    }
}

impl PartialEq for Soundbank {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Soundbank {}

/// Anything that can be hit, looped, stopped or halted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Asset {
    Clip(Clip),
    Soundbank(Soundbank),
}

impl Asset {
    pub fn id(&self) -> AssetId {
        match self {
            Asset::Clip(clip) => clip.id(),
            Asset::Soundbank(soundbank) => soundbank.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Asset::Clip(clip) => clip.name(),
            Asset::Soundbank(soundbank) => soundbank.name(),
        }
    }
}

impl From<Clip> for Asset {
    fn from(clip: Clip) -> Self {
        Asset::Clip(clip)
    }
}

impl From<Soundbank> for Asset {
    fn from(soundbank: Soundbank) -> Self {
        Asset::Soundbank(soundbank)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Clip(clip) => write!(f, "clip '{}' ({})", clip.name(), clip.id()),
            Asset::Soundbank(soundbank) => write!(
                f,
                "soundbank '{}' ({}, {} clips)",
                soundbank.name(),
                soundbank.id(),
                soundbank.clips().len()
            ),
        }
    }
}
