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

//! Runs a scene against an engine with the mock backend, one frame at a time.

use std::fmt;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::ResolvedScene;
use crate::engine::{CommandSender, Engine, EngineError};
use crate::output::mock::MockBackend;

/// How the simulator spaces its frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pacing {
    /// One frame per frame period of wall-clock time.
    RealTime,
    /// As fast as possible.
    Fast,
}

/// What happened during a simulation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulationReport {
    frames: u64,
    cues_applied: usize,
    peak_channels: usize,
    peak_voices: usize,
    outputs_created: usize,
    final_channels: usize,
}

impl SimulationReport {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn cues_applied(&self) -> usize {
        self.cues_applied
    }

    /// The most channels alive at the end of any frame.
    pub fn peak_channels(&self) -> usize {
        self.peak_channels
    }

    /// The most voices alive at the end of any frame.
    pub fn peak_voices(&self) -> usize {
        self.peak_voices
    }

    pub fn outputs_created(&self) -> usize {
        self.outputs_created
    }

    /// Channels still alive after the last frame.
    pub fn final_channels(&self) -> usize {
        self.final_channels
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frames: {}", self.frames)?;
        writeln!(f, "Cues applied: {}", self.cues_applied)?;
        writeln!(f, "Peak channels: {}", self.peak_channels)?;
        writeln!(f, "Peak voices: {}", self.peak_voices)?;
        writeln!(f, "Outputs created: {}", self.outputs_created)?;
        write!(f, "Channels left: {}", self.final_channels)
    }
}

/// Plays a scene's cues through an engine.
pub struct Simulator {
    engine: Engine<MockBackend>,
    sender: CommandSender,
    scene: ResolvedScene,
}

impl Simulator {
    /// Creates a simulator. The engine is seeded from the scene if it has a
    /// seed.
    pub fn new(scene: ResolvedScene) -> Simulator {
        let backend = MockBackend::new();
        let engine = match scene.seed() {
            Some(seed) => Engine::with_seed(backend, seed),
            None => Engine::new(backend),
        };
        let sender = engine.command_sender();
        Simulator {
            engine,
            sender,
            scene,
        }
    }

    pub fn engine(&self) -> &Engine<MockBackend> {
        &self.engine
    }

    pub fn scene(&self) -> &ResolvedScene {
        &self.scene
    }

    /// Runs the scene to the end. Every cue whose time has been reached is
    /// queued at the start of a frame and applied by that frame's tick.
    pub async fn run(&mut self, pacing: Pacing) -> Result<SimulationReport, EngineError> {
        let frame_rate = self.scene.frame_rate();
        let delta = 1.0 / frame_rate as f32;
        let total_frames =
            (self.scene.duration().as_secs_f64() * f64::from(frame_rate)).ceil() as u64;
        info!(
            frames = total_frames,
            frame_rate,
            pacing = ?pacing,
            "Starting simulation"
        );

        let mut ticker = match pacing {
            Pacing::RealTime => {
                let mut ticker = interval(Duration::from_secs_f64(1.0 / f64::from(frame_rate)));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Some(ticker)
            }
            Pacing::Fast => None,
        };

        let mut report = SimulationReport::default();
        let mut next_cue = 0;
        for frame in 0..total_frames {
            if let Some(ticker) = ticker.as_mut() {
                ticker.tick().await;
            }

            let now = Duration::from_secs_f64(frame as f64 / f64::from(frame_rate));
            while let Some(cue) = self.scene.cues().get(next_cue) {
                if cue.at() > now {
                    break;
                }
                debug!(frame, cue = %cue, "Queueing cue");
                self.sender.send(cue.command().clone())?;
                report.cues_applied += 1;
                next_cue += 1;
            }

            self.engine.tick(delta);
            self.engine.backend_mut().prune_released();
            report.frames += 1;
            report.peak_channels = report.peak_channels.max(self.engine.channel_count());
            report.peak_voices = report.peak_voices.max(self.engine.voice_count());

            if frame > 0 && frame % u64::from(frame_rate) == 0 {
                debug!(
                    seconds = frame / u64::from(frame_rate),
                    channels = self.engine.channel_count(),
                    voices = self.engine.voice_count(),
                    "Simulation progress"
                );
            }
        }

        report.outputs_created = self.engine.backend().created();
        report.final_channels = self.engine.channel_count();
        info!(
            frames = report.frames,
            peak_channels = report.peak_channels,
            peak_voices = report.peak_voices,
            "Simulation finished"
        );
        Ok(report)
    }
}
