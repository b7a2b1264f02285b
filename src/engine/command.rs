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

//! Commands let other threads drive an engine. They are queued and applied
//! in order at the start of the engine's next tick.

use crossbeam_channel::Sender;

use super::EngineError;
use crate::assets::{Asset, AssetId};
use crate::output::Position;
use crate::params::VoiceParams;

/// A request to the engine, applied on the frame thread.
#[derive(Clone, Debug)]
pub enum Command {
    /// Plays the asset once. A non-zero `limit` skips the hit when the
    /// asset's hit channel already has that many voices.
    Hit {
        asset: Asset,
        params: Option<VoiceParams>,
        position: Option<Position>,
        limit: usize,
    },
    /// Starts or updates a sustained sound.
    Loop {
        asset: Asset,
        params: Option<VoiceParams>,
        position: Option<Position>,
    },
    Stop(Asset),
    StopAll,
    StopAllExcept(Vec<AssetId>),
    Halt(Asset),
    HaltAll,
    HaltAllExcept(Vec<AssetId>),
}

/// Sends commands to an engine. Cheap to clone.
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    pub(crate) fn new(tx: Sender<Command>) -> CommandSender {
        CommandSender { tx }
    }

    /// Queues a command. Fails once the engine has been dropped.
    pub fn send(&self, command: Command) -> Result<(), EngineError> {
        self.tx
            .send(command)
            .map_err(|_| EngineError::CommandQueueClosed)
    }

    pub fn hit(&self, asset: Asset, params: Option<VoiceParams>) -> Result<(), EngineError> {
        self.send(Command::Hit {
            asset,
            params,
            position: None,
            limit: 0,
        })
    }

    pub fn play_loop(&self, asset: Asset, params: Option<VoiceParams>) -> Result<(), EngineError> {
        self.send(Command::Loop {
            asset,
            params,
            position: None,
        })
    }

    pub fn stop(&self, asset: Asset) -> Result<(), EngineError> {
        self.send(Command::Stop(asset))
    }

    pub fn halt(&self, asset: Asset) -> Result<(), EngineError> {
        self.send(Command::Halt(asset))
    }
}
