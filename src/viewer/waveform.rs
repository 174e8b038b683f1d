//! Peak summaries of decoded audio, rendered as a row of block characters.

const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Samples folded into one peak while decoding.
pub const PEAK_WINDOW: usize = 1024;

/// Reduces a sample stream to the absolute peak of every `window` samples.
pub fn window_peaks<I>(samples: I, window: usize) -> Vec<f32>
where
    I: IntoIterator<Item = f32>,
{
    let window = window.max(1);
    let mut peaks = Vec::new();
    let mut current = 0.0f32;
    let mut filled = 0;

    for sample in samples {
        current = current.max(sample.abs());
        filled += 1;
        if filled == window {
            peaks.push(current);
            current = 0.0;
            filled = 0;
        }
    }
    if filled > 0 {
        peaks.push(current);
    }
    peaks
}

/// Groups peaks into `count` bars scaled so the loudest bar is 1.0.
/// Silence stays at zero.
pub fn normalized_bars(peaks: &[f32], count: usize) -> Vec<f32> {
    if peaks.is_empty() || count == 0 {
        return Vec::new();
    }
    let count = count.min(peaks.len());

    let mut bars: Vec<f32> = (0..count)
        .map(|i| {
            let start = i * peaks.len() / count;
            let end = ((i + 1) * peaks.len() / count).max(start + 1);
            peaks[start..end].iter().copied().fold(0.0, f32::max)
        })
        .collect();

    let loudest = bars.iter().copied().fold(0.0, f32::max);
    if loudest > 0.0 {
        for bar in &mut bars {
            *bar /= loudest;
        }
    }
    bars
}

pub fn render(bars: &[f32]) -> String {
    bars.iter()
        .map(|bar| {
            let level = (bar.clamp(0.0, 1.0) * (LEVELS.len() - 1) as f32).round() as usize;
            LEVELS[level]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peaks_track_absolute_maximum_per_window() {
        let samples = vec![0.1, -0.5, 0.2, 0.3, -0.05];
        assert_eq!(window_peaks(samples, 2), vec![0.5, 0.3, 0.05]);
    }

    #[test]
    fn bars_are_normalized_to_loudest() {
        let bars = normalized_bars(&[0.1, 0.2, 0.25, 0.5], 2);
        assert_eq!(bars, vec![0.4, 1.0]);
    }

    #[test]
    fn fewer_peaks_than_bars_keeps_every_peak() {
        let bars = normalized_bars(&[0.5, 0.25], 80);
        assert_eq!(bars, vec![1.0, 0.5]);
    }

    #[test]
    fn silence_renders_as_floor() {
        let bars = normalized_bars(&[0.0; 16], 4);
        assert_eq!(bars, vec![0.0; 4]);
        assert_eq!(render(&bars), "▁▁▁▁");
    }

    #[test]
    fn render_maps_extremes() {
        assert_eq!(render(&[0.0, 1.0]), "▁█");
        assert!(render(&[]).is_empty());
    }
}
