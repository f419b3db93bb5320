// Analysis windows: the whole-piece window and sequential partitions of the timeline

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::events::EventStream;

/// Which row of the result table a window feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowIndex {
    Overall,
    Sequential(usize),
}

impl fmt::Display for WindowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowIndex::Overall => write!(f, "overall window"),
            WindowIndex::Sequential(i) => write!(f, "window {}", i),
        }
    }
}

/// Half-open tick range `[start_tick, end_tick)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub index: WindowIndex,
    pub start_tick: u64,
    pub end_tick: u64,
}

impl Window {
    /// The window spanning the whole piece
    pub fn overall(stream: &EventStream) -> Self {
        Self {
            index: WindowIndex::Overall,
            start_tick: 0,
            end_tick: stream.end_tick(),
        }
    }

    pub fn sequential(index: usize, start_tick: u64, end_tick: u64) -> Self {
        Self {
            index: WindowIndex::Sequential(index),
            start_tick,
            end_tick: end_tick.max(start_tick),
        }
    }

    pub fn contains(&self, tick: u64) -> bool {
        tick >= self.start_tick && tick < self.end_tick
    }

    pub fn len_ticks(&self) -> u64 {
        self.end_tick - self.start_tick
    }

    /// Clip `[start, end)` to the window, `None` when nothing overlaps
    pub fn clip(&self, start: u64, end: u64) -> Option<(u64, u64)> {
        let s = start.max(self.start_tick);
        let e = end.min(self.end_tick);
        (e > s).then_some((s, e))
    }
}

/// How the timeline is cut into sequential windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WindowSpec {
    /// Fixed-length windows in seconds; `overlap` is the shared fraction of consecutive windows
    Seconds {
        size: f64,
        #[serde(default)]
        overlap: f64,
    },
    /// Fixed-length windows in ticks
    Ticks { size: u64 },
    /// Caller-provided boundaries; window `i` is `[ticks[i], ticks[i + 1])`
    Boundaries { ticks: Vec<u64> },
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self::Seconds { size: 10.0, overlap: 0.0 }
    }
}

/// Window settings for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Whether to evaluate sequential features per window in addition to the overall pass
    #[serde(default)]
    pub sequential: bool,

    #[serde(default)]
    pub spec: WindowSpec,
}

impl WindowConfig {
    pub fn overall_only() -> Self {
        Self { sequential: false, spec: WindowSpec::default() }
    }

    pub fn sequential(spec: WindowSpec) -> Self {
        Self { sequential: true, spec }
    }
}

impl WindowSpec {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            WindowSpec::Seconds { size, overlap } => {
                if !(size.is_finite() && *size > 0.0) {
                    return Err(ConfigurationError::InvalidWindow(format!(
                        "window size must be a positive number of seconds, got {}", size
                    )));
                }
                if !(0.0..1.0).contains(overlap) {
                    return Err(ConfigurationError::InvalidWindow(format!(
                        "window overlap must be in [0, 1), got {}", overlap
                    )));
                }
            }
            WindowSpec::Ticks { size } => {
                if *size == 0 {
                    return Err(ConfigurationError::InvalidWindow(
                        "window size must be at least one tick".into(),
                    ));
                }
            }
            WindowSpec::Boundaries { ticks } => {
                if ticks.len() < 2 {
                    return Err(ConfigurationError::InvalidWindow(
                        "at least two boundaries are needed to form a window".into(),
                    ));
                }
                if ticks.windows(2).any(|pair| pair[1] <= pair[0]) {
                    return Err(ConfigurationError::InvalidWindow(
                        "window boundaries must be strictly increasing".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Cut the piece's timeline into sequential windows, indexed from zero.
    ///
    /// Fixed-size specs produce no windows for an empty piece.
    pub fn partition(&self, stream: &EventStream) -> Result<Vec<Window>, ConfigurationError> {
        self.validate()?;
        let end = stream.end_tick();

        let windows = match self {
            WindowSpec::Seconds { size, overlap } => {
                let total = stream.tick_to_seconds(end);
                let step = size * (1.0 - overlap);
                let mut windows = Vec::new();
                let mut i = 0usize;
                loop {
                    let start_secs = i as f64 * step;
                    if start_secs >= total {
                        break;
                    }
                    let start_tick = stream.seconds_to_tick(start_secs);
                    let end_tick = stream.seconds_to_tick((start_secs + size).min(total)).min(end);
                    if end_tick > start_tick {
                        windows.push(Window::sequential(windows.len(), start_tick, end_tick));
                    }
                    if start_secs + size >= total {
                        break;
                    }
                    i += 1;
                }
                windows
            }
            WindowSpec::Ticks { size } => (0..end)
                .step_by(*size as usize)
                .enumerate()
                .map(|(i, start)| Window::sequential(i, start, (start + size).min(end)))
                .collect(),
            WindowSpec::Boundaries { ticks } => ticks
                .windows(2)
                .enumerate()
                .map(|(i, pair)| Window::sequential(i, pair[0], pair[1]))
                .collect(),
        };

        log::debug!("Partitioned {} ticks into {} windows", end, windows.len());
        Ok(windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoteEvent;

    fn piece(end_tick: u64) -> EventStream {
        EventStream::new(vec![NoteEvent::new(60, 100, 0, 0, end_tick)], 480)
    }

    #[test]
    fn tick_windows_cover_the_piece() {
        let windows = WindowSpec::Ticks { size: 480 }.partition(&piece(1200)).unwrap();
        let ranges: Vec<(u64, u64)> = windows.iter().map(|w| (w.start_tick, w.end_tick)).collect();
        assert_eq!(ranges, vec![(0, 480), (480, 960), (960, 1200)]);
        assert_eq!(windows[2].index, WindowIndex::Sequential(2));
    }

    #[test]
    fn second_windows_follow_the_tempo_map() {
        // 120 BPM, 480 tpb: 960 ticks per second, piece lasts 3 seconds
        let windows = WindowSpec::Seconds { size: 1.0, overlap: 0.0 }.partition(&piece(2880)).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!((windows[1].start_tick, windows[1].end_tick), (960, 1920));
    }

    #[test]
    fn overlapping_windows_share_ticks() {
        let windows = WindowSpec::Seconds { size: 2.0, overlap: 0.5 }.partition(&piece(2880)).unwrap();
        let ranges: Vec<(u64, u64)> = windows.iter().map(|w| (w.start_tick, w.end_tick)).collect();
        assert_eq!(ranges, vec![(0, 1920), (960, 2880)]);
    }

    #[test]
    fn empty_piece_has_no_fixed_windows() {
        let empty = EventStream::new(Vec::new(), 480);
        assert!(WindowSpec::Ticks { size: 100 }.partition(&empty).unwrap().is_empty());
        assert!(WindowSpec::default().partition(&empty).unwrap().is_empty());
    }

    #[test]
    fn boundaries_must_increase() {
        let bad = WindowSpec::Boundaries { ticks: vec![0, 480, 480] };
        assert!(matches!(bad.partition(&piece(960)), Err(ConfigurationError::InvalidWindow(_))));

        let good = WindowSpec::Boundaries { ticks: vec![0, 100, 960] };
        assert_eq!(good.partition(&piece(960)).unwrap().len(), 2);
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        assert!(WindowSpec::Ticks { size: 0 }.validate().is_err());
        assert!(WindowSpec::Seconds { size: 0.0, overlap: 0.0 }.validate().is_err());
        assert!(WindowSpec::Seconds { size: 1.0, overlap: 1.0 }.validate().is_err());
    }

    #[test]
    fn clip_to_window() {
        let w = Window::sequential(0, 100, 200);
        assert_eq!(w.clip(50, 150), Some((100, 150)));
        assert_eq!(w.clip(200, 300), None);
        assert!(w.contains(100) && !w.contains(200));
    }
}
