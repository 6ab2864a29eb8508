//! Per-character color effects for `<gradient>` and `<rainbow>`.
use smallvec::SmallVec;

use crate::numbers::{floor_f64_to_usize, unit_to_channel, usize_to_f64};
use crate::richtext::{Color, NamedColor};

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Paint {
    /// Linear blend across the color stops. `phase` in `[-1, 1]` shifts the
    /// blend, bouncing off either end.
    Gradient { stops: SmallVec<[u32; 4]>, phase: f64 },
    /// Full hue cycle, offset by `phase` characters.
    Rainbow { phase: usize, reverse: bool },
}

impl Paint {
    /// Parse the arguments of `<gradient:a:b[:phase]>` or `<rainbow[:!][phase]>`.
    pub(super) fn parse(name: &str, args: &str) -> Option<Self> {
        let args: SmallVec<[&str; 4]> = args.split(':').filter(|arg| !arg.is_empty()).collect();
        match name {
            "gradient" => {
                let mut stops = SmallVec::new();
                let mut phase = 0.0;
                for (position, arg) in args.iter().enumerate() {
                    if let Some(color) = Color::parse(arg) {
                        stops.push(color.rgb());
                    } else if position + 1 == args.len()
                        && let Ok(value) = arg.parse::<f64>()
                        && (-1.0..=1.0).contains(&value)
                    {
                        phase = value;
                    } else {
                        return None;
                    }
                }
                if stops.is_empty() {
                    stops.extend([NamedColor::White.rgb(), NamedColor::Black.rgb()]);
                }
                Some(Self::Gradient { stops, phase })
            }
            "rainbow" => {
                if args.len() > 1 {
                    return None;
                }
                let raw = args.first().copied().unwrap_or_default();
                let (reverse, digits) = raw
                    .strip_prefix('!')
                    .map_or((false, raw), |rest| (true, rest));
                let phase = if digits.is_empty() {
                    0
                } else {
                    digits.parse().ok()?
                };
                Some(Self::Rainbow { phase, reverse })
            }
            _ => None,
        }
    }

    /// Color of character `index` out of `total` painted characters.
    pub(super) fn color_at(&self, index: usize, total: usize) -> Color {
        match self {
            Self::Gradient { stops, phase } => {
                let position = if total <= 1 {
                    0.0
                } else {
                    usize_to_f64(index) / usize_to_f64(total - 1)
                };
                Color::Rgb(blend(stops, bounce(position + phase)))
            }
            Self::Rainbow { phase, reverse } => {
                let total = total.max(1);
                let step = if *reverse {
                    total.saturating_sub(index + 1)
                } else {
                    index
                };
                let hue = usize_to_f64((step + phase) % total) / usize_to_f64(total);
                Color::Rgb(hue_to_rgb(hue))
            }
        }
    }
}

/// Fold any real number into `[0, 1]` by reflecting at the ends.
fn bounce(position: f64) -> f64 {
    let folded = position.rem_euclid(2.0);
    if folded > 1.0 { 2.0 - folded } else { folded }
}

fn blend(stops: &[u32], position: f64) -> u32 {
    let Some(last) = stops.len().checked_sub(1) else {
        return NamedColor::White.rgb();
    };
    if last == 0 {
        return stops[0];
    }
    let scaled = position * usize_to_f64(last);
    let segment = floor_f64_to_usize(scaled).min(last - 1);
    let local = scaled - usize_to_f64(segment);
    match (stops.get(segment), stops.get(segment + 1)) {
        (Some(from), Some(to)) => lerp(*from, *to, local),
        _ => stops[last],
    }
}

fn lerp(from: u32, to: u32, t: f64) -> u32 {
    [16, 8, 0].into_iter().fold(0, |rgb, shift| {
        let a = f64::from((from >> shift) & 0xff) / 255.0;
        let b = f64::from((to >> shift) & 0xff) / 255.0;
        rgb | (unit_to_channel(a + (b - a) * t) << shift)
    })
}

/// Fully saturated, full brightness color for `hue` in `[0, 1)`.
fn hue_to_rgb(hue: f64) -> u32 {
    let sector = hue.rem_euclid(1.0) * 6.0;
    let x = 1.0 - ((sector % 2.0) - 1.0).abs();
    let (r, g, b) = match floor_f64_to_usize(sector) {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    (unit_to_channel(r) << 16) | (unit_to_channel(g) << 8) | unit_to_channel(b)
}
