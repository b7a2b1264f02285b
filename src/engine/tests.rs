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

use std::thread;

use super::*;
use crate::assets::{Clip, Soundbank};
use crate::output::mock::MockBackend;
use crate::params::Variance;
use crate::testutil::{assert_close, run_frames, tick_until};

const DELTA: f32 = 0.05;

fn engine() -> Engine<MockBackend> {
    Engine::with_seed(MockBackend::new(), 7)
}

fn clip(name: &str, length: f32) -> Asset {
    Clip::new(name, length).into()
}

fn bank(name: &str, lengths: &[f32]) -> Asset {
    let clips = lengths
        .iter()
        .enumerate()
        .map(|(i, length)| Clip::new(&format!("{}{}", name, i), *length))
        .collect();
    Soundbank::new(name, clips).into()
}

#[test]
fn test_absent_asset_is_a_noop() {
    let mut engine = engine();
    engine.hit(None, None, None).unwrap();
    engine.hit_limited(None, None, None, 1).unwrap();
    engine.play_loop(None, None, None).unwrap();
    engine.stop(None);
    engine.halt(None);
    engine.tick(DELTA);

    assert_eq!(engine.channel_count(), 0);
    assert!(engine.backend().outputs().is_empty());
}

#[test]
fn test_hits_share_one_channel() {
    let mut engine = engine();
    let asset = clip("door", 10.0);
    for _ in 0..3 {
        engine.hit(Some(&asset), None, None).unwrap();
    }

    assert_eq!(engine.channel_count(), 1);
    assert_eq!(engine.find_channel_voice_count(&asset, Playback::Hit), 3);
    assert_eq!(engine.find_channel_voice_count(&asset, Playback::Loop), 0);
    assert_eq!(engine.backend().playing_outputs(), 3);
}

#[test]
fn test_default_profiles() {
    let mut engine = engine();
    let hit = clip("hit", 10.0);
    let ambience = clip("ambience", 10.0);
    engine.hit(Some(&hit), None, None).unwrap();
    engine.play_loop(Some(&ambience), None, None).unwrap();

    let outputs = engine.backend().outputs();
    assert!((0.8..=1.0).contains(&outputs[0].volume()));
    assert!((0.9..=1.1).contains(&outputs[0].pitch()));
    assert!(!outputs[0].is_looping());

    assert_eq!(outputs[1].volume(), 1.0);
    assert_eq!(outputs[1].pitch(), 1.0);
    assert!(outputs[1].is_looping());
}

#[test]
fn test_hit_channel_destroyed_after_voices_finish() {
    let mut engine = engine();
    let asset = clip("step", 0.5);
    engine.hit(Some(&asset), None, None).unwrap();
    engine.hit(Some(&asset), None, None).unwrap();

    engine.tick(DELTA);
    assert_eq!(engine.channel_count(), 1);
    assert_eq!(engine.voice_count(), 2);

    tick_until(
        &mut engine,
        DELTA,
        40,
        |engine| engine.channel_count() == 0,
        "hit channel was never destroyed",
    );
    assert_eq!(engine.backend().live_outputs(), 0);
    assert!(engine
        .find_channel(&asset, Playback::Hit)
        .is_none());
}

#[test]
fn test_stop_fades_then_destroys() {
    let mut engine = engine();
    let asset = clip("music", 2.0);
    engine.play_loop(Some(&asset), None, None).unwrap();
    engine.stop(Some(&asset));

    run_frames(&mut engine, 40, DELTA);
    assert_eq!(engine.channel_count(), 1);
    let output = engine.backend().outputs()[0].clone();
    assert!(output.is_playing());
    assert!((output.volume() - 0.5).abs() < 0.02, "volume {}", output.volume());

    let frames = tick_until(
        &mut engine,
        DELTA,
        60,
        |engine| engine.channel_count() == 0,
        "stopped channel was never destroyed",
    );
    // The channel fades from 1 to 0 in four seconds.
    assert!((38..=42).contains(&frames), "took {} more frames", frames);
    assert!(output.is_released());
    assert!(!output.is_playing());
}

#[test]
fn test_halt_destroys_immediately() {
    let mut engine = engine();
    let asset = clip("alarm", 10.0);
    engine.hit(Some(&asset), None, None).unwrap();
    engine.play_loop(Some(&asset), None, None).unwrap();
    assert_eq!(engine.channel_count(), 2);

    engine.halt(Some(&asset));
    assert_eq!(engine.channel_count(), 0);
    assert_eq!(engine.voice_count(), 0);
    assert_eq!(engine.backend().live_outputs(), 0);
}

#[test]
fn test_stop_covers_hit_and_loop_channels() {
    let mut engine = engine();
    let asset = clip("engine", 10.0);
    let other = clip("radio", 10.0);
    engine.hit(Some(&asset), None, None).unwrap();
    engine.play_loop(Some(&asset), None, None).unwrap();
    engine.play_loop(Some(&other), None, None).unwrap();

    engine.stop(Some(&asset));
    for playback in [Playback::Hit, Playback::Loop] {
        let channel = engine.find_channel(&asset, playback).unwrap();
        assert_eq!(channel.volume().desired(), 0.0);
    }
    let channel = engine.find_channel(&other, Playback::Loop).unwrap();
    assert_eq!(channel.volume().desired(), 1.0);
}

#[test]
fn test_trigger_revives_fading_channel() {
    let mut engine = engine();
    let asset = clip("wind", 10.0);
    engine.play_loop(Some(&asset), None, None).unwrap();
    engine.stop(Some(&asset));
    run_frames(&mut engine, 20, DELTA);

    engine.play_loop(Some(&asset), None, None).unwrap();
    let channel = engine.find_channel(&asset, Playback::Loop).unwrap();
    assert_eq!(channel.volume().desired(), 1.0);
    assert!(channel.volume().current() < 1.0);

    run_frames(&mut engine, 100, DELTA);
    assert_eq!(engine.channel_count(), 1);
    assert_eq!(engine.backend().outputs().len(), 1);
}

#[test]
fn test_loop_is_idempotent() {
    let mut engine = engine();
    let asset = clip("hum", 3.0);
    engine.play_loop(Some(&asset), None, None).unwrap();
    run_frames(&mut engine, 5, DELTA);
    engine
        .play_loop(
            Some(&asset),
            Some(VoiceParams::const_2d(0.5, 1.0).build()),
            None,
        )
        .unwrap();

    assert_eq!(engine.channel_count(), 1);
    assert_eq!(engine.backend().outputs().len(), 1);
    let channel = engine.find_channel(&asset, Playback::Loop).unwrap();
    assert_eq!(channel.voice_count(), 1);
    assert!(!channel.is_looping());
    assert_eq!(channel.voices()[0].volume().desired(), 0.5);

    // The looping voice keeps playing past the end of its clip.
    run_frames(&mut engine, 100, DELTA);
    assert_eq!(engine.backend().playing_outputs(), 1);
    assert_eq!(engine.backend().outputs()[0].play_count(), 1);
}

#[test]
fn test_soundbank_loop_cycles_through_clips() {
    let mut engine = engine();
    let asset = bank("rain", &[0.5, 0.5, 0.5]);
    let Asset::Soundbank(soundbank) = &asset else {
        unreachable!()
    };
    engine.play_loop(Some(&asset), None, None).unwrap();

    let channel = engine.find_channel(&asset, Playback::Loop).unwrap();
    assert!(channel.is_looping());
    assert_eq!(channel.loop_cycles(), 1);
    assert_eq!(channel.voice_count(), 1);
    assert!(engine.backend().outputs()[0].is_playing());
    assert!(!engine.backend().outputs()[0].is_looping());

    for _ in 0..40 {
        engine.tick(DELTA);
        assert!(engine.voice_count() <= 2);
    }

    let channel = engine.find_channel(&asset, Playback::Loop).unwrap();
    assert!(channel.loop_cycles() >= 4, "cycles {}", channel.loop_cycles());
    let outputs = engine.backend().outputs();
    assert_eq!(outputs.len() as u64, channel.loop_cycles());
    for output in outputs {
        let clip = output.clip().unwrap();
        assert!(soundbank.clips().contains(&clip));
    }
}

#[test]
fn test_soundbank_loop_retrigger_does_not_restart() {
    let mut engine = engine();
    let asset = bank("crowd", &[1.0, 2.0]);
    engine.play_loop(Some(&asset), None, None).unwrap();
    engine.play_loop(Some(&asset), None, None).unwrap();

    let channel = engine.find_channel(&asset, Playback::Loop).unwrap();
    assert_eq!(channel.loop_cycles(), 1);
    assert_eq!(engine.backend().outputs().len(), 1);
}

#[test]
fn test_padded_clip_loop_waits_for_silence() {
    let mut engine = engine();
    let asset = clip("drip", 1.0);
    let params = VoiceParams::const_2d(1.0, 1.0)
        .left_silence_padding(Variance::constant(0.5))
        .build();
    engine.play_loop(Some(&asset), Some(params), None).unwrap();

    let channel = engine.find_channel(&asset, Playback::Loop).unwrap();
    assert!(channel.is_looping());
    let first = engine.backend().outputs()[0].clone();
    assert!(!first.is_playing());
    assert!(!first.is_looping());

    let frames = tick_until(
        &mut engine,
        DELTA,
        40,
        |engine| {
            engine
                .find_channel(&asset, Playback::Loop)
                .map_or(0, Channel::loop_cycles)
                >= 2
        },
        "loop never started a second cycle",
    );
    // Half a second of silence and one second of clip.
    assert!((29..=31).contains(&frames), "took {} frames", frames);
    assert_eq!(first.play_count(), 1);
    assert_eq!(engine.backend().outputs().len(), 2);
}

#[test]
fn test_padded_clip_loop_retrigger_applies_to_current_voice() {
    let mut engine = engine();
    let asset = clip("tick", 1.0);
    let params = VoiceParams::const_2d(1.0, 1.0)
        .right_silence_padding(Variance::constant(0.25))
        .build();
    engine.play_loop(Some(&asset), Some(params.clone()), None).unwrap();

    let quieter = params.to_builder().volume(Variance::constant(0.5)).build();
    engine.play_loop(Some(&asset), Some(quieter), None).unwrap();

    let channel = engine.find_channel(&asset, Playback::Loop).unwrap();
    assert_eq!(channel.loop_cycles(), 1);
    assert_eq!(channel.voice_count(), 1);
    assert_eq!(channel.voices()[0].volume().desired(), 0.5);

    // Later cycles use the new parameters.
    tick_until(
        &mut engine,
        DELTA,
        40,
        |engine| engine.backend().outputs().len() == 2,
        "loop never started a second cycle",
    );
    assert_close(engine.backend().outputs()[1].volume(), 0.5);
}

#[test]
fn test_retrigger_between_loop_cycles_does_not_start_a_second_loop() {
    let mut engine = engine();
    let asset = clip("chime", 1.0);
    // At double pitch the clip finishes well before the next cycle is due.
    let params = VoiceParams::const_2d(1.0, 2.0)
        .left_silence_padding(Variance::constant(0.5))
        .build();
    engine.play_loop(Some(&asset), Some(params), None).unwrap();

    run_frames(&mut engine, 25, DELTA);
    let channel = engine.find_channel(&asset, Playback::Loop).unwrap();
    assert!(channel.is_looping());
    assert_eq!(channel.voice_count(), 0);

    engine
        .play_loop(
            Some(&asset),
            Some(VoiceParams::const_2d(1.0, 1.0).build()),
            None,
        )
        .unwrap();
    assert_eq!(engine.backend().outputs().len(), 1);
    assert_eq!(engine.voice_count(), 0);

    run_frames(&mut engine, 20, DELTA);
    let channel = engine.find_channel(&asset, Playback::Loop).unwrap();
    assert!(channel.is_looping());
    assert_eq!(channel.loop_cycles(), 2);
    assert_eq!(channel.voice_count(), 1);

    let outputs = engine.backend().outputs();
    assert_eq!(outputs.len(), 2);
    assert!(outputs.iter().all(|output| !output.is_looping()));
    // The second cycle uses the new parameters.
    assert_eq!(outputs[1].pitch(), 1.0);
}

#[test]
fn test_empty_soundbank_hit() {
    let mut engine = engine();
    let asset = bank("empty", &[]);
    engine.hit(Some(&asset), None, None).unwrap();

    assert_eq!(engine.voice_count(), 1);
    let output = engine.backend().outputs()[0].clone();
    assert!(output.clip().is_none());
    assert!(!output.is_playing());

    engine.tick(DELTA);
    assert_eq!(engine.voice_count(), 0);
    engine.tick(DELTA);
    assert_eq!(engine.channel_count(), 0);
    assert_eq!(output.play_count(), 0);
}

#[test]
fn test_empty_soundbank_loop_retries_every_frame() {
    let mut engine = engine();
    let asset = bank("empty", &[]);
    engine.play_loop(Some(&asset), None, None).unwrap();

    run_frames(&mut engine, 10, DELTA);
    assert_eq!(engine.channel_count(), 1);
    assert_eq!(engine.voice_count(), 1);
    assert_eq!(engine.backend().outputs().len(), 11);
    assert_eq!(engine.backend().playing_outputs(), 0);
}

#[test]
fn test_hit_limited() {
    let mut engine = engine();
    let asset = clip("coin", 10.0);
    for _ in 0..3 {
        engine.hit_limited(Some(&asset), None, None, 2).unwrap();
    }
    assert_eq!(engine.find_channel_voice_count(&asset, Playback::Hit), 2);

    engine.hit_limited(Some(&asset), None, None, 0).unwrap();
    assert_eq!(engine.find_channel_voice_count(&asset, Playback::Hit), 3);
}

#[test]
fn test_stop_all_except() {
    let mut engine = engine();
    let music = clip("music", 10.0);
    let door = clip("door", 10.0);
    let wind = bank("wind", &[10.0]);
    engine.play_loop(Some(&music), None, None).unwrap();
    engine.hit(Some(&door), None, None).unwrap();
    engine.play_loop(Some(&wind), None, None).unwrap();

    engine.stop_all_except(&[music.id()]);
    run_frames(&mut engine, 100, DELTA);

    assert_eq!(engine.channel_count(), 1);
    assert!(engine.find_channel(&music, Playback::Loop).is_some());
    assert_eq!(engine.backend().live_outputs(), 1);
}

#[test]
fn test_halt_all_except() {
    let mut engine = engine();
    let music = clip("music", 10.0);
    let door = clip("door", 10.0);
    let wind = bank("wind", &[10.0]);
    engine.play_loop(Some(&music), None, None).unwrap();
    engine.hit(Some(&door), None, None).unwrap();
    engine.play_loop(Some(&wind), None, None).unwrap();

    engine.halt_all_except(&[music.id(), wind.id()]);
    assert_eq!(engine.channel_count(), 2);
    assert!(engine.find_channel(&door, Playback::Hit).is_none());

    engine.halt_all();
    assert_eq!(engine.channel_count(), 0);
    assert_eq!(engine.backend().live_outputs(), 0);
}

#[test]
fn test_stop_all() {
    let mut engine = engine();
    let music = clip("music", 10.0);
    let door = clip("door", 10.0);
    engine.play_loop(Some(&music), None, None).unwrap();
    engine.hit(Some(&door), None, None).unwrap();

    engine.stop_all();
    assert_eq!(engine.channel_count(), 2);
    for channel in engine.registry().channels() {
        assert_eq!(channel.volume().desired(), 0.0);
    }
    run_frames(&mut engine, 100, DELTA);
    assert_eq!(engine.channel_count(), 0);
}

#[test]
fn test_position_is_passed_to_outputs() {
    let mut engine = engine();
    let asset = clip("explosion", 2.0);
    let position = Position::new(1.0, 2.0, 3.0);
    engine
        .hit(
            Some(&asset),
            Some(VoiceParams::const_3d(1.0, 1.0).build()),
            Some(position),
        )
        .unwrap();

    let output = &engine.backend().outputs()[0];
    assert_eq!(output.position(), Some(position));
    assert_eq!(output.spatial_blend(), 1.0);
    assert_eq!(
        engine
            .find_channel(&asset, Playback::Hit)
            .and_then(Channel::position),
        Some(position)
    );
}

#[test]
fn test_invalid_delta_is_ignored() {
    let mut engine = engine();
    let asset = clip("beep", 1.0);
    engine
        .hit(Some(&asset), Some(VoiceParams::const_2d(1.0, 1.0).build()), None)
        .unwrap();

    engine.tick(-1.0);
    engine.tick(f32::NAN);
    let output = &engine.backend().outputs()[0];
    assert_eq!(output.time(), 0.0);
    assert!(output.is_playing());
}

#[test]
fn test_command_queue_applies_in_order() {
    let mut engine = engine();
    let asset = clip("bell", 10.0);
    let sender = engine.command_sender();

    let remote = sender.clone();
    let remote_asset = asset.clone();
    thread::spawn(move || remote.hit(remote_asset, None))
        .join()
        .unwrap()
        .unwrap();
    sender.halt(asset.clone()).unwrap();

    // Nothing happens until the next tick.
    assert!(engine.backend().outputs().is_empty());

    engine.tick(DELTA);
    assert_eq!(engine.channel_count(), 0);
    assert_eq!(engine.backend().outputs().len(), 1);
    assert!(engine.backend().outputs()[0].is_released());

    sender.play_loop(asset.clone(), None).unwrap();
    sender
        .send(Command::Hit {
            asset: asset.clone(),
            params: None,
            position: None,
            limit: 1,
        })
        .unwrap();
    engine.tick(DELTA);
    assert_eq!(engine.channel_count(), 2);
    assert_eq!(engine.find_channel_voice_count(&asset, Playback::Hit), 1);
}

#[test]
fn test_command_sender_fails_after_engine_dropped() {
    let engine = engine();
    let sender = engine.command_sender();
    drop(engine);

    let result = sender.hit(clip("late", 1.0), None);
    assert!(matches!(result, Err(EngineError::CommandQueueClosed)));
}
