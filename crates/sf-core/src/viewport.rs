//! Viewport fitting: scale + pan that shows the whole workspace rectangle
//! centered in its container with a margin.

use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Share of the container the fitted workspace occupies along its tighter axis.
pub const DEFAULT_FIT_PADDING: f64 = 0.85;

/// Uniform scale followed by translation: `screen = world * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub scale: f64,
    pub translate: Vec2,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewportTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate: Vec2::ZERO,
    };

    pub fn to_affine(&self) -> Affine {
        Affine::translate(self.translate) * Affine::scale(self.scale)
    }

    /// Coefficients `[a, b, c, d, e, f]` as taken by canvas `setTransform`.
    pub fn coeffs(&self) -> [f64; 6] {
        self.to_affine().as_coeffs()
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        (p.to_vec2() * self.scale + self.translate).to_point()
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        ((p.to_vec2() - self.translate) / self.scale).to_point()
    }

    /// Rescale by `factor` keeping the world point under `anchor` (screen
    /// space) fixed. The resulting scale is clamped to `[min, max]`.
    pub fn zoom_about(&self, anchor: Point, factor: f64, min: f64, max: f64) -> Self {
        self.scaled_about(anchor, (self.scale * factor).clamp(min, max))
    }

    /// Set the scale to `scale` keeping the world point under `anchor` fixed.
    pub fn scaled_about(&self, anchor: Point, scale: f64) -> Self {
        let world = self.screen_to_world(anchor);
        Self {
            scale,
            translate: anchor.to_vec2() - world.to_vec2() * scale,
        }
    }
}

/// Compute the transform that fits `workspace` inside a `container`-sized
/// viewport, centered, scaled by `padding`.
///
/// Returns `None` when either rectangle is degenerate (non-positive or
/// non-finite size); callers leave the current transform untouched.
pub fn fit_workspace(workspace: Rect, container: Size, padding: f64) -> Option<ViewportTransform> {
    let ws = workspace.size();
    let usable = |n: f64| n.is_finite() && n > 0.0;
    let sizes = [ws.width, ws.height, container.width, container.height];
    if !sizes.into_iter().all(usable) || !usable(padding) {
        return None;
    }

    let scale = (container.width / ws.width).min(container.height / ws.height) * padding;
    let container_center = Vec2::new(container.width / 2.0, container.height / 2.0);
    let translate = container_center - workspace.center().to_vec2() * scale;
    Some(ViewportTransform { scale, translate })
}
