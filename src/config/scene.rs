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

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use config::{Config, File, FileFormat};
use duration_string::DurationString;
use serde::Deserialize;
use tracing::warn;

use super::error::ConfigError;
use crate::assets::{Asset, AssetId, Clip, Soundbank};
use crate::engine::Command;
use crate::output::Route;
use crate::params::{Variance, VoiceParams, VoiceParamsBuilder};

/// The frame rate used when a scene doesn't specify one.
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// How long a scene runs past its last cue when it doesn't specify a duration.
const DEFAULT_TAIL: Duration = Duration::from_secs(5);

fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    let duration: Duration = DurationString::from_string(value.to_string())
        .map_err(|e| ConfigError::Duration(format!("{}: {}", value, e)))?
        .into();
    Ok(duration)
}

/// A clip declaration.
#[derive(Deserialize, Clone, Debug)]
pub struct ClipConfig {
    /// The name cues and soundbanks refer to the clip by.
    name: String,
    /// The length of the clip, e.g. `1.5s` or `250ms`.
    length: String,
}

impl ClipConfig {
    pub fn new(name: &str, length: &str) -> ClipConfig {
        ClipConfig {
            name: name.to_string(),
            length: length.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parsed length of the clip.
    pub fn length(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.length)
    }
}

/// A soundbank declaration. Soundbanks may only contain clips.
#[derive(Deserialize, Clone, Debug)]
pub struct SoundbankConfig {
    name: String,
    #[serde(default)]
    clips: Vec<String>,
}

impl SoundbankConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clips(&self) -> &[String] {
        &self.clips
    }
}

/// A randomized range in one of three forms: a constant, `{ min, max }` or
/// `{ value, variance }`.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(untagged)]
pub enum VarianceConfig {
    Constant(f32),
    Range { min: f32, max: f32 },
    Spread { value: f32, variance: f32 },
}

impl From<VarianceConfig> for Variance {
    fn from(config: VarianceConfig) -> Variance {
        match config {
            VarianceConfig::Constant(value) => Variance::constant(value),
            VarianceConfig::Range { min, max } => Variance::range(min, max),
            VarianceConfig::Spread { value, variance } => Variance::variance(value, variance),
        }
    }
}

/// The preset a profile starts from.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    #[serde(rename = "variable_2d")]
    Variable2d,
    #[serde(rename = "const_2d")]
    Const2d,
    #[serde(rename = "variable_3d")]
    Variable3d,
    #[serde(rename = "const_3d")]
    Const3d,
}

impl Preset {
    fn builder(self) -> VoiceParamsBuilder {
        match self {
            Preset::Variable2d => VoiceParams::variable_2d(1.0, 1.0),
            Preset::Const2d => VoiceParams::const_2d(1.0, 1.0),
            Preset::Variable3d => VoiceParams::variable_3d(1.0, 1.0),
            Preset::Const3d => VoiceParams::const_3d(1.0, 1.0),
        }
    }
}

/// A named playback profile. Fields that are not set come from the preset,
/// or from the default profile if there is no preset.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ProfileConfig {
    preset: Option<Preset>,
    volume: Option<VarianceConfig>,
    pitch: Option<VarianceConfig>,
    normalized_time: Option<VarianceConfig>,
    left_silence_padding: Option<VarianceConfig>,
    right_silence_padding: Option<VarianceConfig>,
    pan_stereo: Option<VarianceConfig>,
    spatial_blend: Option<VarianceConfig>,
    route: Option<String>,
}

impl ProfileConfig {
    pub fn preset(&self) -> Option<Preset> {
        self.preset
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Builds the playback profile.
    pub fn to_voice_params(&self) -> VoiceParams {
        let mut builder = match self.preset {
            Some(preset) => preset.builder(),
            None => VoiceParams::default().to_builder(),
        };

        if let Some(volume) = self.volume {
            builder = builder.volume(volume.into());
        }
        if let Some(pitch) = self.pitch {
            builder = builder.pitch(pitch.into());
        }
        if let Some(time) = self.normalized_time {
            builder = builder.normalized_time(time.into());
        }
        if let Some(padding) = self.left_silence_padding {
            builder = builder.left_silence_padding(padding.into());
        }
        if let Some(padding) = self.right_silence_padding {
            builder = builder.right_silence_padding(padding.into());
        }
        if let Some(pan) = self.pan_stereo {
            builder = builder.pan_stereo(pan.into());
        }
        if let Some(blend) = self.spatial_blend {
            builder = builder.spatial_blend(blend.into());
        }
        if let Some(route) = &self.route {
            builder = builder.route(Some(Route::new(route)));
        }
        builder.build()
    }
}

/// What a cue does when it fires.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CueAction {
    Hit,
    Loop,
    Stop,
    Halt,
    StopAll,
    HaltAll,
}

impl fmt::Display for CueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CueAction::Hit => "hit",
            CueAction::Loop => "loop",
            CueAction::Stop => "stop",
            CueAction::Halt => "halt",
            CueAction::StopAll => "stop_all",
            CueAction::HaltAll => "halt_all",
        };
        f.write_str(name)
    }
}

/// A timed cue declaration.
#[derive(Deserialize, Clone, Debug)]
pub struct CueConfig {
    /// When the cue fires, relative to the start of the scene.
    at: String,
    action: CueAction,
    asset: Option<String>,
    profile: Option<String>,
    /// Voice limit for hits. 0 or unset means no limit.
    limit: Option<usize>,
    /// Assets that `stop_all` and `halt_all` leave alone.
    #[serde(default)]
    except: Vec<String>,
}

impl CueConfig {
    pub fn action(&self) -> CueAction {
        self.action
    }

    pub fn asset(&self) -> Option<&str> {
        self.asset.as_deref()
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Returns the parsed cue time.
    pub fn at(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.at)
    }
}

/// A scene file.
#[derive(Deserialize, Clone, Debug)]
pub struct Scene {
    frame_rate: Option<u32>,
    seed: Option<u64>,
    #[serde(default)]
    clips: Vec<ClipConfig>,
    #[serde(default)]
    soundbanks: Vec<SoundbankConfig>,
    #[serde(default)]
    profiles: HashMap<String, ProfileConfig>,
    #[serde(default)]
    cues: Vec<CueConfig>,
    duration: Option<String>,
}

impl Scene {
    /// Parse a scene from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Scene, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Scene>()?)
    }

    /// Parse a scene from a YAML string.
    pub fn parse(yaml: &str) -> Result<Scene, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<Scene>()?)
    }

    /// The simulation frame rate. Never less than 1.
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate.unwrap_or(DEFAULT_FRAME_RATE).max(1)
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn clips(&self) -> &[ClipConfig] {
        &self.clips
    }

    pub fn soundbanks(&self) -> &[SoundbankConfig] {
        &self.soundbanks
    }

    pub fn profiles(&self) -> &HashMap<String, ProfileConfig> {
        &self.profiles
    }

    pub fn cues(&self) -> &[CueConfig] {
        &self.cues
    }

    /// Creates the scene's assets and profiles, and checks that every name a
    /// soundbank or cue refers to exists.
    pub fn resolve(&self) -> Result<ResolvedScene, ConfigError> {
        let mut assets: HashMap<String, Asset> = HashMap::new();

        let mut clips = Vec::with_capacity(self.clips.len());
        for config in &self.clips {
            if config.name.is_empty() {
                return Err(ConfigError::InvalidClip {
                    name: config.name.clone(),
                    reason: "name must not be empty".to_string(),
                });
            }
            if assets.contains_key(&config.name) {
                return Err(ConfigError::DuplicateAsset(config.name.clone()));
            }
            let length = config.length()?;
            if length.is_zero() {
                return Err(ConfigError::InvalidClip {
                    name: config.name.clone(),
                    reason: "length must be greater than zero".to_string(),
                });
            }

            let clip = Clip::new(&config.name, length.as_secs_f32());
            assets.insert(config.name.clone(), clip.clone().into());
            clips.push(clip);
        }

        let mut soundbanks = Vec::with_capacity(self.soundbanks.len());
        for config in &self.soundbanks {
            if assets.contains_key(&config.name) {
                return Err(ConfigError::DuplicateAsset(config.name.clone()));
            }
            let members = config
                .clips
                .iter()
                .map(|name| match assets.get(name) {
                    Some(Asset::Clip(clip)) => Ok(clip.clone()),
                    _ => Err(ConfigError::UnknownAsset(name.clone())),
                })
                .collect::<Result<Vec<Clip>, ConfigError>>()?;
            if members.is_empty() {
                warn!(soundbank = config.name.as_str(), "Soundbank has no clips");
            }

            let soundbank = Soundbank::new(&config.name, members);
            soundbanks.push(soundbank.clone());
            assets.insert(config.name.clone(), soundbank.into());
        }

        let profiles: HashMap<String, VoiceParams> = self
            .profiles
            .iter()
            .map(|(name, profile)| (name.clone(), profile.to_voice_params()))
            .collect();

        let mut cues = Vec::with_capacity(self.cues.len());
        for (index, cue) in self.cues.iter().enumerate() {
            let at = cue.at()?;
            let params = match &cue.profile {
                Some(name) => Some(
                    profiles
                        .get(name)
                        .cloned()
                        .ok_or_else(|| ConfigError::UnknownProfile(name.clone()))?,
                ),
                None => None,
            };
            if cue.limit.is_some() && cue.action != CueAction::Hit {
                warn!(
                    cue = index,
                    action = %cue.action,
                    "Voice limit only applies to hits"
                );
            }

            let command = match cue.action {
                CueAction::Hit => Command::Hit {
                    asset: cue_asset(&assets, index, cue)?,
                    params,
                    position: None,
                    limit: cue.limit.unwrap_or(0),
                },
                CueAction::Loop => Command::Loop {
                    asset: cue_asset(&assets, index, cue)?,
                    params,
                    position: None,
                },
                CueAction::Stop => Command::Stop(cue_asset(&assets, index, cue)?),
                CueAction::Halt => Command::Halt(cue_asset(&assets, index, cue)?),
                CueAction::StopAll => {
                    let keep = kept_assets(&assets, index, cue);
                    if keep.is_empty() {
                        Command::StopAll
                    } else {
                        Command::StopAllExcept(keep)
                    }
                }
                CueAction::HaltAll => {
                    let keep = kept_assets(&assets, index, cue);
                    if keep.is_empty() {
                        Command::HaltAll
                    } else {
                        Command::HaltAllExcept(keep)
                    }
                }
            };
            cues.push(TimedCommand { at, command });
        }
        // Stable, so cues at the same time keep their file order.
        cues.sort_by_key(|cue| cue.at);

        let duration = match &self.duration {
            Some(duration) => parse_duration(duration)?,
            None => cues.last().map_or(Duration::ZERO, |cue| cue.at) + DEFAULT_TAIL,
        };

        Ok(ResolvedScene {
            frame_rate: self.frame_rate(),
            seed: self.seed,
            assets,
            clips,
            soundbanks,
            profiles,
            cues,
            duration,
        })
    }
}

fn cue_asset(
    assets: &HashMap<String, Asset>,
    index: usize,
    cue: &CueConfig,
) -> Result<Asset, ConfigError> {
    let name = cue.asset.as_deref().ok_or_else(|| ConfigError::InvalidCue {
        index,
        reason: format!("{} needs an asset", cue.action),
    })?;
    assets
        .get(name)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownAsset(name.to_string()))
}

fn kept_assets(assets: &HashMap<String, Asset>, index: usize, cue: &CueConfig) -> Vec<AssetId> {
    cue.except
        .iter()
        .filter_map(|name| match assets.get(name) {
            Some(asset) => Some(asset.id()),
            None => {
                warn!(
                    cue = index,
                    asset = name.as_str(),
                    "Ignoring unknown asset in except list"
                );
                None
            }
        })
        .collect()
}

/// A command and the time it is applied at.
#[derive(Clone, Debug)]
pub struct TimedCommand {
    at: Duration,
    command: Command,
}

impl TimedCommand {
    pub fn at(&self) -> Duration {
        self.at
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

impl fmt::Display for TimedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8.3}s ", self.at.as_secs_f64())?;
        match &self.command {
            Command::Hit { asset, limit, .. } if *limit > 0 => {
                write!(f, "hit {} (limit {})", asset.name(), limit)
            }
            Command::Hit { asset, .. } => write!(f, "hit {}", asset.name()),
            Command::Loop { asset, .. } => write!(f, "loop {}", asset.name()),
            Command::Stop(asset) => write!(f, "stop {}", asset.name()),
            Command::Halt(asset) => write!(f, "halt {}", asset.name()),
            Command::StopAll => write!(f, "stop all"),
            Command::HaltAll => write!(f, "halt all"),
            Command::StopAllExcept(keep) => write!(f, "stop all except {} assets", keep.len()),
            Command::HaltAllExcept(keep) => write!(f, "halt all except {} assets", keep.len()),
        }
    }
}

/// A validated scene with its assets and profiles created.
#[derive(Clone, Debug)]
pub struct ResolvedScene {
    frame_rate: u32,
    seed: Option<u64>,
    assets: HashMap<String, Asset>,
    clips: Vec<Clip>,
    soundbanks: Vec<Soundbank>,
    profiles: HashMap<String, VoiceParams>,
    /// Sorted by time.
    cues: Vec<TimedCommand>,
    duration: Duration,
}

impl ResolvedScene {
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Looks up a clip or soundbank by name.
    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.assets.get(name)
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn soundbanks(&self) -> &[Soundbank] {
        &self.soundbanks
    }

    pub fn profile(&self, name: &str) -> Option<&VoiceParams> {
        self.profiles.get(name)
    }

    pub fn profiles(&self) -> &HashMap<String, VoiceParams> {
        &self.profiles
    }

    pub fn cues(&self) -> &[TimedCommand] {
        &self.cues
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for ResolvedScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Scene ({} fps, {:.3}s):",
            self.frame_rate,
            self.duration.as_secs_f64()
        )?;

        writeln!(f, "  Clips (count: {}):", self.clips.len())?;
        for clip in &self.clips {
            writeln!(f, "    {} ({:.3}s)", clip.name(), clip.length())?;
        }

        writeln!(f, "  Soundbanks (count: {}):", self.soundbanks.len())?;
        for soundbank in &self.soundbanks {
            let names: Vec<&str> = soundbank.clips().iter().map(Clip::name).collect();
            writeln!(f, "    {}: {}", soundbank.name(), names.join(", "))?;
        }

        let mut names: Vec<&String> = self.profiles.keys().collect();
        names.sort();
        writeln!(f, "  Profiles (count: {}):", names.len())?;
        for name in names {
            let params = &self.profiles[name];
            writeln!(
                f,
                "    {}: volume {}, pitch {}",
                name,
                params.volume_range(),
                params.pitch_range()
            )?;
        }

        writeln!(f, "  Cues (count: {}):", self.cues.len())?;
        for cue in &self.cues {
            writeln!(f, "    {}", cue)?;
        }
        Ok(())
    }
}
