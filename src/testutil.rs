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

use std::error::Error;
use std::io::Write;

use tempfile::NamedTempFile;

use crate::engine::Engine;
use crate::output::Backend;

/// Asserts that two values are within a small tolerance of each other.
#[track_caller]
pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() <= 1e-4,
        "expected {} to be close to {}",
        actual,
        expected
    );
}

/// Ticks the engine the given number of frames.
pub fn run_frames<B: Backend>(engine: &mut Engine<B>, frames: usize, delta: f32) {
    for _ in 0..frames {
        engine.tick(delta);
    }
}

/// Ticks the engine until the predicate holds, returning the number of frames
/// it took. Panics with the given message after `max_frames`.
#[track_caller]
pub fn tick_until<B, F>(
    engine: &mut Engine<B>,
    delta: f32,
    max_frames: usize,
    predicate: F,
    error_msg: &str,
) -> usize
where
    B: Backend,
    F: Fn(&Engine<B>) -> bool,
{
    for frame in 0..max_frames {
        if predicate(engine) {
            return frame;
        }
        engine.tick(delta);
    }
    if predicate(engine) {
        return max_frames;
    }
    panic!("{}", error_msg);
}

/// Writes the given YAML to a temporary scene file.
pub fn write_scene(yaml: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
    file.write_all(yaml.as_bytes())?;
    file.flush()?;
    Ok(file)
}
