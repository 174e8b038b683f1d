//! Range limits of the numeric inputs. Values are clamped here, at the input
//! boundary; the tone session and timer accept whatever they are given.

use std::ops::RangeInclusive;

pub const BASE_FREQUENCY_HZ: RangeInclusive<f32> = 100.0..=1000.0;
pub const BEAT_FREQUENCY_HZ: RangeInclusive<f32> = 1.0..=30.0;
pub const TIMER_DURATION_MINUTES: RangeInclusive<u32> = 1..=120;

pub const DEFAULT_BASE_FREQUENCY_HZ: f32 = 300.0;
pub const DEFAULT_BEAT_FREQUENCY_HZ: f32 = 10.0;

fn clamp_hz(value: f32, range: &RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_nan() {
        return fallback;
    }
    value.clamp(*range.start(), *range.end())
}

pub fn base_frequency(hz: f32) -> f32 {
    clamp_hz(hz, &BASE_FREQUENCY_HZ, DEFAULT_BASE_FREQUENCY_HZ)
}

pub fn beat_frequency(hz: f32) -> f32 {
    clamp_hz(hz, &BEAT_FREQUENCY_HZ, DEFAULT_BEAT_FREQUENCY_HZ)
}

pub fn timer_duration(minutes: u32) -> u32 {
    minutes.clamp(*TIMER_DURATION_MINUTES.start(), *TIMER_DURATION_MINUTES.end())
}
