use regex::Regex;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::sync::LazyLock;

use crate::error::{MotionError, Result};

static EASE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9]+)(?:\.(in|out|inout))?(?:\(([^)]*)\))?$").expect("valid ease regex")
});

/// Which end of the curve the acceleration happens at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EaseMode {
    In,
    Out,
    InOut,
}

impl EaseMode {
    fn suffix(self) -> &'static str {
        match self {
            EaseMode::In => "in",
            EaseMode::Out => "out",
            EaseMode::InOut => "inOut",
        }
    }
}

/// Easing curves addressed by their timeline-library names
/// (`power2.out`, `back.out(1.7)`, `elastic.out(1, 0.3)`, ...).
///
/// CSS keyword curves (`ease`, `ease-in-out`, `cubic-bezier(...)`) are accepted
/// as well so configuration files can use either vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EasingFunction {
    Linear,
    /// `power0`..`power4`; the exponent applied is `degree + 1`.
    Power { degree: u8, mode: EaseMode },
    Sine(EaseMode),
    Expo(EaseMode),
    Circ(EaseMode),
    Back { overshoot: f32, mode: EaseMode },
    Elastic { amplitude: f32, period: f32, mode: EaseMode },
    Bounce(EaseMode),
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
}

impl EasingFunction {
    pub const POWER2_OUT: EasingFunction = EasingFunction::Power {
        degree: 2,
        mode: EaseMode::Out,
    };

    /// Parse an ease name. Unknown names are an error rather than a silent
    /// fallback so typos in presets and config surface immediately.
    pub fn parse(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        let lowered = trimmed.to_ascii_lowercase().replace(' ', "");

        match lowered.as_str() {
            "none" | "linear" => return Ok(EasingFunction::Linear),
            "ease" => return Ok(Self::bezier(0.25, 0.1, 0.25, 1.0)),
            "ease-in" | "easein" => return Ok(Self::bezier(0.42, 0.0, 1.0, 1.0)),
            "ease-out" | "easeout" => return Ok(Self::bezier(0.0, 0.0, 0.58, 1.0)),
            "ease-in-out" | "easeinout" => return Ok(Self::bezier(0.42, 0.0, 0.58, 1.0)),
            _ => {}
        }

        if let Some(inner) = lowered
            .strip_prefix("cubic-bezier(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::parse_cubic_bezier(inner)
                .ok_or_else(|| MotionError::UnknownEasing(trimmed.to_string()));
        }

        let unknown = || MotionError::UnknownEasing(trimmed.to_string());
        let caps = EASE_PATTERN.captures(&lowered).ok_or_else(unknown)?;
        let family = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let mode = match caps.get(2).map(|m| m.as_str()) {
            Some("in") => EaseMode::In,
            Some("inout") => EaseMode::InOut,
            _ => EaseMode::Out,
        };
        let args: Vec<f32> = match caps.get(3) {
            Some(raw) if !raw.as_str().is_empty() => raw
                .as_str()
                .split(',')
                .map(|part| part.trim().parse::<f32>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| unknown())?,
            _ => Vec::new(),
        };

        let easing = match family {
            "power0" => EasingFunction::Linear,
            "power1" | "quad" => EasingFunction::Power { degree: 1, mode },
            "power2" | "cubic" => EasingFunction::Power { degree: 2, mode },
            "power3" | "quart" => EasingFunction::Power { degree: 3, mode },
            "power4" | "quint" | "strong" => EasingFunction::Power { degree: 4, mode },
            "sine" => EasingFunction::Sine(mode),
            "expo" => EasingFunction::Expo(mode),
            "circ" => EasingFunction::Circ(mode),
            "back" => EasingFunction::Back {
                overshoot: args.first().copied().unwrap_or(1.70158),
                mode,
            },
            "elastic" => EasingFunction::Elastic {
                amplitude: args.first().copied().unwrap_or(1.0),
                period: args.get(1).copied().unwrap_or(0.3),
                mode,
            },
            "bounce" => EasingFunction::Bounce(mode),
            _ => return Err(unknown()),
        };

        Ok(easing)
    }

    fn bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        EasingFunction::CubicBezier { x1, y1, x2, y2 }
    }

    fn parse_cubic_bezier(inner: &str) -> Option<Self> {
        let parts: Vec<f32> = inner
            .split(',')
            .map(|s| s.trim().parse::<f32>().ok())
            .collect::<Option<_>>()?;

        match parts.as_slice() {
            [x1, y1, x2, y2] => Some(Self::bezier(*x1, *y1, *x2, *y2)),
            _ => None,
        }
    }

    /// Map linear progress (0.0 to 1.0) to eased progress.
    ///
    /// Endpoints are exact: `apply(0.0) == 0.0` and `apply(1.0) == 1.0` for
    /// every curve, so a finished tween always lands on its end state.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 {
            return 0.0;
        }
        if t == 1.0 {
            return 1.0;
        }

        match *self {
            EasingFunction::Linear => t,
            EasingFunction::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(t, x1, y1, x2, y2),
            EasingFunction::Power { mode, .. }
            | EasingFunction::Sine(mode)
            | EasingFunction::Expo(mode)
            | EasingFunction::Circ(mode)
            | EasingFunction::Back { mode, .. }
            | EasingFunction::Elastic { mode, .. }
            | EasingFunction::Bounce(mode) => match mode {
                EaseMode::In => self.ease_in(t),
                EaseMode::Out => 1.0 - self.ease_in(1.0 - t),
                EaseMode::InOut => {
                    if t < 0.5 {
                        self.ease_in(2.0 * t) / 2.0
                    } else {
                        1.0 - self.ease_in(2.0 - 2.0 * t) / 2.0
                    }
                }
            },
        }
    }

    /// The "in" form of each family; out and in-out are derived from it.
    fn ease_in(&self, t: f32) -> f32 {
        match *self {
            EasingFunction::Linear | EasingFunction::CubicBezier { .. } => t,
            EasingFunction::Power { degree, .. } => t.powi(degree as i32 + 1),
            EasingFunction::Sine(_) => 1.0 - (t * PI / 2.0).cos(),
            EasingFunction::Expo(_) => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * (t - 1.0))
                }
            }
            EasingFunction::Circ(_) => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            EasingFunction::Back { overshoot, .. } => {
                (overshoot + 1.0) * t * t * t - overshoot * t * t
            }
            EasingFunction::Elastic {
                amplitude, period, ..
            } => 1.0 - elastic_out(1.0 - t, amplitude, period),
            EasingFunction::Bounce(_) => 1.0 - bounce_out(1.0 - t),
        }
    }

    /// True when the curve never leaves [0, 1] and never moves backwards.
    pub fn is_monotonic(&self) -> bool {
        match self {
            EasingFunction::Linear
            | EasingFunction::Power { .. }
            | EasingFunction::Sine(_)
            | EasingFunction::Expo(_)
            | EasingFunction::Circ(_) => true,
            EasingFunction::CubicBezier { y1, y2, .. } => {
                (0.0..=1.0).contains(y1) && (0.0..=1.0).contains(y2)
            }
            EasingFunction::Back { .. }
            | EasingFunction::Elastic { .. }
            | EasingFunction::Bounce(_) => false,
        }
    }
}

fn elastic_out(t: f32, amplitude: f32, period: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let amplitude = amplitude.max(1.0);
    let period = if period > 0.0 { period } else { 0.3 };
    let shift = period / (2.0 * PI) * (1.0 / amplitude).asin();
    amplitude * 2.0_f32.powf(-10.0 * t) * ((t - shift) * 2.0 * PI / period).sin() + 1.0
}

fn bounce_out(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        n1 * (t - 1.5 / d1) * (t - 1.5 / d1) + 0.75
    } else if t < 2.5 / d1 {
        n1 * (t - 2.25 / d1) * (t - 2.25 / d1) + 0.9375
    } else {
        n1 * (t - 2.625 / d1) * (t - 2.625 / d1) + 0.984375
    }
}

/// Solve the bezier for `x == t` with Newton iterations, falling back to
/// bisection when the slope flattens out.
fn cubic_bezier(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let sample = |a1: f32, a2: f32, s: f32| {
        let u = 1.0 - s;
        3.0 * u * u * s * a1 + 3.0 * u * s * s * a2 + s * s * s
    };
    let slope = |a1: f32, a2: f32, s: f32| {
        let u = 1.0 - s;
        3.0 * u * u * a1 + 6.0 * u * s * (a2 - a1) + 3.0 * s * s * (1.0 - a2)
    };

    let mut s = t;
    for _ in 0..8 {
        let dx = sample(x1, x2, s) - t;
        if dx.abs() < 1e-6 {
            return sample(y1, y2, s);
        }
        let d = slope(x1, x2, s);
        if d.abs() < 1e-6 {
            break;
        }
        s -= dx / d;
    }

    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    s = t;
    for _ in 0..32 {
        let x = sample(x1, x2, s);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    sample(y1, y2, s)
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EasingFunction::Linear => write!(f, "none"),
            EasingFunction::Power { degree, mode } => write!(f, "power{}.{}", degree, mode.suffix()),
            EasingFunction::Sine(mode) => write!(f, "sine.{}", mode.suffix()),
            EasingFunction::Expo(mode) => write!(f, "expo.{}", mode.suffix()),
            EasingFunction::Circ(mode) => write!(f, "circ.{}", mode.suffix()),
            EasingFunction::Back { overshoot, mode } => {
                write!(f, "back.{}({})", mode.suffix(), overshoot)
            }
            EasingFunction::Elastic {
                amplitude,
                period,
                mode,
            } => write!(f, "elastic.{}({}, {})", mode.suffix(), amplitude, period),
            EasingFunction::Bounce(mode) => write!(f, "bounce.{}", mode.suffix()),
            EasingFunction::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic-bezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
        }
    }
}

impl TryFrom<String> for EasingFunction {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<EasingFunction> for String {
    fn from(value: EasingFunction) -> Self {
        value.to_string()
    }
}

impl Default for EasingFunction {
    fn default() -> Self {
        Self::POWER2_OUT
    }
}
