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

/// The rate, in units per second, used by every voice and channel parameter.
pub const DEFAULT_TRANSITION_SPEED: f32 = 0.25;

/// A parameter which glides from its current value toward a desired value at
/// a fixed rate instead of jumping to it.
#[derive(Clone, Debug, PartialEq)]
pub struct AutomatedParameter {
    /// The value that is currently in effect.
    current: f32,
    /// The value the parameter is moving toward.
    desired: f32,
    /// Units per second.
    speed: f32,
}

impl AutomatedParameter {
    /// Creates a new parameter resting at the given value.
    pub fn new(value: f32, speed: f32) -> Self {
        Self {
            current: value,
            desired: value,
            speed: speed.max(0.0),
        }
    }

    /// The value that is currently in effect.
    pub fn current(&self) -> f32 {
        self.current
    }

    /// The value the parameter is moving toward.
    pub fn desired(&self) -> f32 {
        self.desired
    }

    /// Sets the value to move toward. The current value is left untouched
    /// until the next update.
    pub fn set_desired(&mut self, value: f32) {
        self.desired = value;
    }

    /// The rate of change in units per second.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Returns true if the current value has reached the desired value.
    pub fn is_settled(&self) -> bool {
        self.current == self.desired
    }

    /// Moves the current value toward the desired value and returns the new
    /// current value. The desired value is never overshot.
    pub fn update(&mut self, delta: f32) -> f32 {
        if (self.current - self.desired).abs() < f32::EPSILON {
            self.current = self.desired;
            return self.current;
        }

        let step = self.speed * delta.max(0.0);
        self.current = if self.current < self.desired {
            (self.current + step).min(self.desired)
        } else {
            (self.current - step).max(self.desired)
        };
        self.current
    }
}
