use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::shared::constants::ZOOM_PAN_FACTOR;

/// Camera move applied over a scene's still image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionKind {
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
    ZoomInPan,
}

impl MotionKind {
    pub const ALL: [MotionKind; 5] = [
        MotionKind::ZoomIn,
        MotionKind::ZoomOut,
        MotionKind::PanLeft,
        MotionKind::PanRight,
        MotionKind::ZoomInPan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MotionKind::ZoomIn => "zoom_in",
            MotionKind::ZoomOut => "zoom_out",
            MotionKind::PanLeft => "pan_left",
            MotionKind::PanRight => "pan_right",
            MotionKind::ZoomInPan => "zoom_in_pan",
        }
    }
}

impl std::str::FromStr for MotionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MotionKind::ALL
            .into_iter()
            .find(|k| k.name() == s.trim().to_lowercase().replace('-', "_"))
            .ok_or_else(|| {
                let names: Vec<_> = MotionKind::ALL.iter().map(|k| k.name()).collect();
                format!("unknown motion '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// Visible window into the base image.
///
/// `zoom` is the magnification (1.0 shows the whole image) and the centre is
/// normalised to `[0, 1]` on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl Viewport {
    pub const IDENTITY: Viewport = Viewport {
        zoom: 1.0,
        center_x: 0.5,
        center_y: 0.5,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSpec {
    pub kind: MotionKind,
    pub zoom_intensity: f64,
    pub pan_intensity: f64,
}

impl MotionSpec {
    pub fn new(kind: MotionKind, zoom_intensity: f64, pan_intensity: f64) -> Self {
        Self {
            kind,
            zoom_intensity: zoom_intensity.max(0.0),
            pan_intensity: pan_intensity.max(0.0),
        }
    }

    /// Viewport at `t` seconds into a clip lasting `duration` seconds.
    ///
    /// Pans travel across a canvas `pan_intensity * width` wider than the
    /// frame, so the window never leaves the image.
    pub fn viewport_at(&self, t: f64, duration: f64) -> Viewport {
        let p = if duration > 0.0 {
            (t / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };

        match self.kind {
            MotionKind::ZoomIn => centred(1.0 + self.zoom_intensity * p),
            MotionKind::ZoomOut => centred(1.0 + self.zoom_intensity * (1.0 - p)),
            MotionKind::PanLeft => panned(1.0 + self.pan_intensity, 1.0 - p),
            MotionKind::PanRight => panned(1.0 + self.pan_intensity, p),
            MotionKind::ZoomInPan => {
                let pan_zoom = 1.0 + self.pan_intensity * ZOOM_PAN_FACTOR;
                let mut viewport = panned(pan_zoom, p);
                viewport.zoom *= 1.0 + self.zoom_intensity * p;
                viewport
            }
        }
    }
}

fn centred(zoom: f64) -> Viewport {
    Viewport {
        zoom,
        ..Viewport::IDENTITY
    }
}

/// Horizontal pan at `zoom`, `progress` 0 at the left edge and 1 at the right.
fn panned(zoom: f64, progress: f64) -> Viewport {
    let half = 0.5 / zoom;
    Viewport {
        zoom,
        center_x: half + (1.0 - 2.0 * half) * progress,
        center_y: 0.5,
    }
}

/// Picks the camera move for each scene, reproducibly when seeded.
pub struct MotionPicker {
    rng: StdRng,
    pinned: Option<MotionKind>,
    zoom_intensity: f64,
    pan_intensity: f64,
}

impl MotionPicker {
    pub fn new(
        seed: Option<u64>,
        pinned: Option<MotionKind>,
        zoom_intensity: f64,
        pan_intensity: f64,
    ) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        log::debug!("Motion seed {seed}");
        Self {
            rng: StdRng::seed_from_u64(seed),
            pinned,
            zoom_intensity,
            pan_intensity,
        }
    }

    pub fn next_spec(&mut self) -> MotionSpec {
        let kind = match self.pinned {
            Some(kind) => kind,
            None => *MotionKind::ALL
                .choose(&mut self.rng)
                .unwrap_or(&MotionKind::ZoomIn),
        };
        MotionSpec::new(kind, self.zoom_intensity, self.pan_intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn spec(kind: MotionKind) -> MotionSpec {
        MotionSpec::new(kind, 0.2, 0.1)
    }

    fn assert_inside_image(v: Viewport) {
        let half = 0.5 / v.zoom;
        assert!(v.zoom >= 1.0);
        assert!(v.center_x - half >= -1e-9, "{v:?}");
        assert!(v.center_x + half <= 1.0 + 1e-9, "{v:?}");
        assert!(v.center_y - half >= -1e-9, "{v:?}");
        assert!(v.center_y + half <= 1.0 + 1e-9, "{v:?}");
    }

    #[test]
    fn test_zoom_in_interpolates_scale() {
        let s = spec(MotionKind::ZoomIn);
        assert_relative_eq!(s.viewport_at(0.0, 4.0).zoom, 1.0);
        assert_relative_eq!(s.viewport_at(2.0, 4.0).zoom, 1.1);
        assert_relative_eq!(s.viewport_at(4.0, 4.0).zoom, 1.2);
    }

    #[test]
    fn test_zoom_out_reverses_zoom_in() {
        let s = spec(MotionKind::ZoomOut);
        assert_relative_eq!(s.viewport_at(0.0, 4.0).zoom, 1.2);
        assert_relative_eq!(s.viewport_at(4.0, 4.0).zoom, 1.0);
        assert_eq!(s.viewport_at(1.0, 4.0).center_x, 0.5);
    }

    #[test]
    fn test_pan_right_moves_window_left_to_right() {
        let s = spec(MotionKind::PanRight);
        let start = s.viewport_at(0.0, 3.0);
        let end = s.viewport_at(3.0, 3.0);
        assert_relative_eq!(start.zoom, 1.1);
        assert_relative_eq!(start.center_x, 0.5 / 1.1);
        assert_relative_eq!(end.center_x, 1.0 - 0.5 / 1.1);
    }

    #[test]
    fn test_pan_left_mirrors_pan_right() {
        let left = spec(MotionKind::PanLeft);
        let right = spec(MotionKind::PanRight);
        for t in [0.0, 0.7, 1.5, 3.0] {
            let l = left.viewport_at(t, 3.0);
            let r = right.viewport_at(t, 3.0);
            assert_relative_eq!(l.center_x, 1.0 - r.center_x, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zoom_in_pan_pans_more_gently() {
        let combined = spec(MotionKind::ZoomInPan);
        let start = combined.viewport_at(0.0, 2.0);
        assert_relative_eq!(start.zoom, 1.0 + 0.1 * ZOOM_PAN_FACTOR);
        let end = combined.viewport_at(2.0, 2.0);
        assert_relative_eq!(end.zoom, (1.0 + 0.1 * ZOOM_PAN_FACTOR) * 1.2);
        assert!(end.center_x > start.center_x);
    }

    #[rstest]
    fn test_viewport_stays_inside_image(
        #[values(
            MotionKind::ZoomIn,
            MotionKind::ZoomOut,
            MotionKind::PanLeft,
            MotionKind::PanRight,
            MotionKind::ZoomInPan
        )]
        kind: MotionKind,
        #[values(-1.0, 0.0, 0.4, 1.9, 3.0, 10.0)] t: f64,
    ) {
        assert_inside_image(spec(kind).viewport_at(t, 3.0));
    }

    #[test]
    fn test_zero_duration_uses_start_viewport() {
        let s = spec(MotionKind::ZoomIn);
        assert_eq!(s.viewport_at(1.0, 0.0), s.viewport_at(0.0, 1.0));
    }

    #[test]
    fn test_zero_intensity_is_identity() {
        let s = MotionSpec::new(MotionKind::ZoomIn, 0.0, 0.0);
        assert!(s.viewport_at(1.0, 2.0).is_identity());
    }

    #[test]
    fn test_picker_is_reproducible() {
        let mut a = MotionPicker::new(Some(42), None, 0.15, 0.05);
        let mut b = MotionPicker::new(Some(42), None, 0.15, 0.05);
        let first: Vec<_> = (0..10).map(|_| a.next_spec().kind).collect();
        let second: Vec<_> = (0..10).map(|_| b.next_spec().kind).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_picker_honours_pinned_motion() {
        let mut picker = MotionPicker::new(None, Some(MotionKind::PanLeft), 0.15, 0.05);
        for _ in 0..5 {
            assert_eq!(picker.next_spec().kind, MotionKind::PanLeft);
        }
    }

    #[rstest]
    #[case("zoom_in", MotionKind::ZoomIn)]
    #[case("Zoom-In-Pan", MotionKind::ZoomInPan)]
    #[case("pan_right", MotionKind::PanRight)]
    fn test_parse_motion_kind(#[case] input: &str, #[case] expected: MotionKind) {
        assert_eq!(input.parse::<MotionKind>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_motion() {
        assert!("spin".parse::<MotionKind>().is_err());
    }
}
