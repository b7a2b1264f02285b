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

/// Typed error for scene load, parse and validation failures so callers can
/// tell a missing file from a bad reference without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid duration {0}")]
    Duration(String),

    #[error("unknown asset {0}")]
    UnknownAsset(String),

    #[error("unknown profile {0}")]
    UnknownProfile(String),

    #[error("asset {0} is declared more than once")]
    DuplicateAsset(String),

    #[error("invalid clip {name}: {reason}")]
    InvalidClip { name: String, reason: String },

    #[error("invalid cue {index}: {reason}")]
    InvalidCue { index: usize, reason: String },
}
