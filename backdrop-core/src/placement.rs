//! # Placement
//! Cover-fit math for dropping an arbitrarily sized image behind a canvas.
//! Pure and deterministic - callers feed in measured sizes and apply the
//! result, nothing here touches a scene.

use crate::scene::Placement;

/// How to place an image so it covers a canvas: uniform scale, anchored by
/// its center at the canvas center.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CoverFit {
    /// Applied to both axes. Aspect is never distorted.
    pub scale: f32,
    /// Canvas center, where the image's own center lands.
    pub left: f32,
    pub top: f32,
}
impl CoverFit {
    /// As an object placement, ready to assign.
    #[must_use]
    pub fn placement(self) -> Placement {
        Placement::centered_at(self.left, self.top, self.scale)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlacementError {
    /// A dimension was zero, negative, or not finite. Sizes come from decode
    /// results and canvas config, so this is a defect upstream, not bad user
    /// input.
    #[error("dimensions must be finite and positive")]
    InvalidDimensions,
}

/// Smallest uniform scale at which `image` fully covers `canvas`, centered.
///
/// `scale = max(canvas_w / image_w, canvas_h / image_h)` - the overflowing
/// axis spills symmetrically off both edges because the image is anchored at
/// the canvas center.
pub fn cover(canvas: [f32; 2], image: [f32; 2]) -> Result<CoverFit, PlacementError> {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !canvas.into_iter().all(valid) || !image.into_iter().all(valid) {
        return Err(PlacementError::InvalidDimensions);
    }
    let scale = (canvas[0] / image[0]).max(canvas[1] / image[1]);
    Ok(CoverFit {
        scale,
        left: canvas[0] / 2.0,
        top: canvas[1] / 2.0,
    })
}
