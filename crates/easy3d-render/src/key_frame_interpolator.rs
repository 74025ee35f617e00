//! Key frame animation of a frame along a smooth path.
//!
//! Positions follow a Catmull-Rom style Hermite spline through the key frame
//! positions; orientations are spherically interpolated between consecutive
//! key frames. The interpolator is driven by [`KeyFrameInterpolator::update`],
//! which the render loop calls with the elapsed time.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::frame::Frame;

/// A frame the path passes through at a given time (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyFrame {
    pub frame: Frame,
    pub time: f32,
}

/// Interpolates a frame along a path of key frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFrameInterpolator {
    keyframes: Vec<KeyFrame>,
    /// Time between two key frames added without an explicit time.
    interval: f32,
    speed: f32,
    looping: bool,
    #[serde(skip)]
    current_time: f32,
    #[serde(skip)]
    started: bool,
}

impl Default for KeyFrameInterpolator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyFrameInterpolator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keyframes: Vec::new(),
            interval: 1.0,
            speed: 1.0,
            looping: false,
            current_time: 0.0,
            started: false,
        }
    }

    /// Appends a key frame one interval after the last one (at time 0 for the first).
    pub fn add_keyframe(&mut self, frame: Frame) {
        let time = self
            .keyframes
            .last()
            .map_or(0.0, |k| k.time + self.interval);
        self.keyframes.push(KeyFrame { frame, time });
    }

    /// Appends a key frame at an explicit time.
    ///
    /// Times must increase; a key frame earlier than the last one is rejected.
    pub fn add_keyframe_at(&mut self, frame: Frame, time: f32) -> bool {
        if self.keyframes.last().is_some_and(|k| time < k.time) {
            log::warn!("key frame time {time} is earlier than the last key frame, ignored");
            return false;
        }
        self.keyframes.push(KeyFrame { frame, time });
        true
    }

    /// Removes all key frames and stops the animation.
    pub fn delete_path(&mut self) {
        self.stop_interpolation();
        self.keyframes.clear();
        self.current_time = 0.0;
    }

    #[must_use]
    pub fn number_of_keyframes(&self) -> usize {
        self.keyframes.len()
    }

    #[must_use]
    pub fn keyframe(&self, index: usize) -> Option<&KeyFrame> {
        self.keyframes.get(index)
    }

    #[must_use]
    pub fn keyframes(&self) -> &[KeyFrame] {
        &self.keyframes
    }

    #[must_use]
    pub fn first_time(&self) -> f32 {
        self.keyframes.first().map_or(0.0, |k| k.time)
    }

    #[must_use]
    pub fn last_time(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    /// Length of the path in seconds at speed 1.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.last_time() - self.first_time()
    }

    #[must_use]
    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn set_interval(&mut self, interval: f32) {
        self.interval = interval.max(1e-3);
    }

    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    #[must_use]
    pub fn loop_interpolation(&self) -> bool {
        self.looping
    }

    pub fn set_loop_interpolation(&mut self, looping: bool) {
        self.looping = looping;
    }

    #[must_use]
    pub fn interpolation_time(&self) -> f32 {
        self.current_time
    }

    pub fn set_interpolation_time(&mut self, time: f32) {
        self.current_time = time;
    }

    #[must_use]
    pub fn is_interpolation_started(&self) -> bool {
        self.started
    }

    /// Starts playing the path. Restarts from the beginning when at the end,
    /// or from the end when playing backwards.
    pub fn start_interpolation(&mut self) {
        if self.keyframes.len() < 2 {
            log::warn!(
                "cannot play a path with {} key frames",
                self.keyframes.len()
            );
            return;
        }
        let (first, last) = (self.first_time(), self.last_time());
        if self.speed < 0.0 {
            if self.current_time <= first || self.current_time > last {
                self.current_time = last;
            }
        } else if self.current_time >= last || self.current_time < first {
            self.current_time = first;
        }
        self.started = true;
    }

    pub fn stop_interpolation(&mut self) {
        self.started = false;
    }

    pub fn toggle_interpolation(&mut self) {
        if self.started {
            self.stop_interpolation();
        } else {
            self.start_interpolation();
        }
    }

    /// Rewinds to the first key frame.
    pub fn reset_interpolation(&mut self) {
        self.stop_interpolation();
        self.current_time = self.first_time();
    }

    /// Advances the animation by `dt` seconds and returns the new frame.
    ///
    /// Returns `None` when the animation is not running. Running past either
    /// end stops the animation unless looping is enabled.
    pub fn update(&mut self, dt: f32) -> Option<Frame> {
        if !self.started {
            return None;
        }
        self.current_time += dt * self.speed;
        let (first, last) = (self.first_time(), self.last_time());
        if self.current_time > last || self.current_time < first {
            let end = if self.current_time > last { last } else { first };
            if self.looping && last > first {
                self.current_time = first + (self.current_time - first).rem_euclid(last - first);
            } else {
                self.current_time = end;
                self.started = false;
            }
        }
        self.interpolate(self.current_time)
    }

    fn tangent(&self, i: usize) -> Vec3 {
        let prev = self.keyframes[i.saturating_sub(1)].frame.position();
        let next = self.keyframes[(i + 1).min(self.keyframes.len() - 1)]
            .frame
            .position();
        0.5 * (next - prev)
    }

    /// Frame on the path at `time`, clamped to the path's time range.
    #[must_use]
    pub fn interpolate(&self, time: f32) -> Option<Frame> {
        let first = self.keyframes.first()?;
        if self.keyframes.len() == 1 || time <= first.time {
            return Some(first.frame);
        }
        let last = self.keyframes[self.keyframes.len() - 1];
        if time >= last.time {
            return Some(last.frame);
        }

        let i = self
            .keyframes
            .windows(2)
            .position(|w| time >= w[0].time && time <= w[1].time)?;
        let (k0, k1) = (self.keyframes[i], self.keyframes[i + 1]);
        let span = k1.time - k0.time;
        let u = if span > 0.0 { (time - k0.time) / span } else { 1.0 };

        let (t0, t1) = (self.tangent(i), self.tangent(i + 1));
        let (p0, p1) = (k0.frame.position(), k1.frame.position());
        let u2 = u * u;
        let u3 = u2 * u;
        let position = (2.0 * u3 - 3.0 * u2 + 1.0) * p0
            + (u3 - 2.0 * u2 + u) * t0
            + (-2.0 * u3 + 3.0 * u2) * p1
            + (u3 - u2) * t1;
        let orientation = k0.frame.orientation().slerp(k1.frame.orientation(), u);
        Some(Frame::new(position, orientation))
    }

    /// Samples the whole path at `fps` frames per second (at speed 1).
    #[must_use]
    pub fn interpolated_path(&self, fps: f32) -> Vec<Frame> {
        if self.keyframes.is_empty() || fps <= 0.0 {
            return Vec::new();
        }
        let count = (self.duration() * fps).floor() as usize + 1;
        (0..count)
            .filter_map(|i| self.interpolate(self.first_time() + i as f32 / fps))
            .collect()
    }

    /// Writes the key frames to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), text)?;
        log::info!(
            "{} key frames saved to {}",
            self.keyframes.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Replaces the path with key frames read from a JSON file.
    pub fn load(&mut self, path: impl AsRef<Path>) -> RenderResult<()> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let loaded: KeyFrameInterpolator = serde_json::from_str(&text)?;
        if loaded.keyframes.windows(2).any(|w| w[1].time < w[0].time) {
            return Err(RenderError::JsonError(serde::de::Error::custom(
                "key frame times must increase",
            )));
        }
        *self = loaded;
        log::info!(
            "{} key frames loaded from {}",
            self.keyframes.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}
