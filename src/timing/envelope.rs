//! Continuous value synthesis from note on/off boundaries.

use serde::{Deserialize, Serialize};

/// Shortest segment time in seconds. Raw dials of zero land here instead of
/// dividing by zero.
const MIN_SEGMENT_TIME: f32 = 1e-5;

/// ADSR envelope dials.
///
/// Attack, decay and release are raw UI values scaled down by 10 when read
/// as times, so a dial of 1.0 means a 100 ms segment. Sustain is a level in
/// [0, 1], not a time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Envelope {
    pub fn attack_time(&self) -> f32 {
        (self.attack / 10.0).max(MIN_SEGMENT_TIME)
    }

    pub fn decay_time(&self) -> f32 {
        (self.decay / 10.0).max(MIN_SEGMENT_TIME)
    }

    pub fn release_time(&self) -> f32 {
        (self.release / 10.0).max(MIN_SEGMENT_TIME)
    }

    pub fn sustain_level(&self) -> f32 {
        self.sustain.clamp(0.0, 1.0)
    }

    /// Envelope level for a note that has sounded for `on_elapsed` seconds
    /// and been released for `off_elapsed` seconds (zero while still held).
    ///
    /// The release contribution is a subtraction applied to whichever
    /// attack/decay/sustain segment `on_elapsed` falls in, so releasing
    /// mid-attack fades from the level the ramp had reached.
    pub fn value(&self, on_elapsed: f32, off_elapsed: f32) -> f32 {
        let attack_time = self.attack_time();
        let decay_time = self.decay_time();

        let mut level = -off_elapsed / self.release_time();

        if on_elapsed < attack_time {
            level += on_elapsed / attack_time;
        } else if on_elapsed < attack_time + decay_time {
            level += 1.0 - (on_elapsed - attack_time) / decay_time * (1.0 - self.sustain_level());
        } else {
            level += self.sustain_level();
        }

        level.max(0.0)
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: 0.0,
            decay: 1.0,
            sustain: 0.5,
            release: 1.0,
        }
    }
}

/// One key of a [`Curve`], with explicit Hermite tangents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    pub in_tangent: f32,
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self::with_tangents(time, value, 0.0, 0.0)
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// A 1D keyframed curve, cubic-Hermite interpolated between keys.
///
/// Evaluation clamps to the first/last value outside the keyed range. A
/// non-finite tangent turns its segment into a step that holds the left
/// key's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    keys: Vec<Keyframe>,
}

impl Curve {
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn evaluate(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }
        for pair in self.keys.windows(2) {
            if time < pair[1].time {
                return hermite(&pair[0], &pair[1], time);
            }
        }
        last.value
    }
}

fn hermite(k0: &Keyframe, k1: &Keyframe, time: f32) -> f32 {
    let dt = k1.time - k0.time;
    if dt <= f32::EPSILON {
        return k1.value;
    }
    let m0 = k0.out_tangent * dt;
    let m1 = k1.in_tangent * dt;
    if !m0.is_finite() || !m1.is_finite() {
        return k0.value;
    }
    let t = (time - k0.time) / dt;
    let t2 = t * t;
    let t3 = t2 * t;
    (2.0 * t3 - 3.0 * t2 + 1.0) * k0.value
        + (t3 - 2.0 * t2 + t) * m0
        + (-2.0 * t3 + 3.0 * t2) * k1.value
        + (t3 - t2) * m1
}
