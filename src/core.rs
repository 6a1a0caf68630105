use crate::error::{WeftError, WeftResult};

pub use kurbo::{Affine, Point, Vec2};

/// Wall-clock milliseconds. All engine time is carried in this unit; the
/// host samples its monotonic clock and hands the value in unchanged.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct TimeMs(pub u64);

impl TimeMs {
    pub fn saturating_sub(self, other: TimeMs) -> u64 {
        self.0.saturating_sub(other.0)
    }

    pub fn offset(self, delta_ms: u64) -> TimeMs {
        TimeMs(self.0.saturating_add(delta_ms))
    }
}

/// A curve's visibility interval `[start, start+duration)`, relative to the
/// owning timeline's epoch. `duration == 0` is legal and means the curve is
/// drawn fully, instantaneously, once `start` is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeWindow {
    pub start: u64,
    pub duration: u64,
}

impl TimeWindow {
    pub fn new(start: u64, duration: u64) -> Self {
        Self { start, duration }
    }

    pub fn end(self) -> u64 {
        self.start.saturating_add(self.duration)
    }

    pub fn contains(self, elapsed_ms: u64) -> bool {
        self.start <= elapsed_ms && elapsed_ms < self.end()
    }
}

/// The parametric sub-interval of a curve visible in the current frame,
/// with `0 <= t0 <= t1 <= 1`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SweepRange {
    pub t0: f64,
    pub t1: f64,
}

impl SweepRange {
    pub const FULL: SweepRange = SweepRange { t0: 0.0, t1: 1.0 };

    pub fn new(t0: f64, t1: f64) -> WeftResult<Self> {
        let r = Self { t0, t1 };
        if !r.is_valid() {
            return Err(WeftError::evaluation(format!(
                "sweep range [{t0}, {t1}] must satisfy 0 <= t0 <= t1 <= 1"
            )));
        }
        Ok(r)
    }

    pub fn is_valid(self) -> bool {
        0.0 <= self.t0 && self.t0 <= self.t1 && self.t1 <= 1.0
    }

    /// Degenerate ranges draw nothing and are dropped by the emitter.
    pub fn is_empty(self) -> bool {
        self.t0 >= self.t1
    }
}

/// Output surface dimensions, used only to derive the aspect correction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> WeftResult<Self> {
        if width == 0 || height == 0 {
            return Err(WeftError::scene("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Uniform-square correction: scales the shorter axis to 1 so scene
    /// units keep their aspect regardless of surface shape.
    pub fn aspect(self) -> Vec2 {
        let min = f64::from(self.width.min(self.height));
        Vec2::new(min / f64::from(self.width), min / f64::from(self.height))
    }
}

/// Straight (non-premultiplied) RGB, unit range per component.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB` hex or one of a small set of color names.
    pub fn parse(s: &str) -> WeftResult<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 {
                return Err(WeftError::compile(format!(
                    "color '{s}' must be #RRGGBB"
                )));
            }
            let byte = |i: usize| -> WeftResult<f32> {
                let v = u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|_| WeftError::compile(format!("color '{s}' has invalid hex")))?;
                Ok(f32::from(v) / 255.0)
            };
            return Ok(Self::new(byte(0)?, byte(2)?, byte(4)?));
        }
        match s.to_ascii_lowercase().as_str() {
            "white" => Ok(Self::new(1.0, 1.0, 1.0)),
            "black" => Ok(Self::new(0.0, 0.0, 0.0)),
            "red" => Ok(Self::new(1.0, 0.0, 0.0)),
            "green" => Ok(Self::new(0.0, 1.0, 0.0)),
            "blue" => Ok(Self::new(0.0, 0.0, 1.0)),
            "gray" | "grey" => Ok(Self::new(0.5, 0.5, 0.5)),
            _ => Err(WeftError::compile(format!("unknown color '{s}'"))),
        }
    }
}
