//! Recenter a cloned model and measure its radius.

use tracing::debug;

use crate::scene::Scene;
use crate::util::{BBox3f, Error, Radius, Result, Vec3};

/// Result of [`normalize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedScene {
    /// Bounding-box center measured before recentering.
    pub center: Vec3,
    /// Full box extents.
    pub size: Vec3,
    /// Half the largest extent.
    pub radius: Radius,
    /// Model-space bounds after recentering; centered on the origin.
    pub bounds: BBox3f,
}

/// Translate the model so its bounding box is centered on the origin and
/// report the radius.
///
/// Bounds are measured in model space (hierarchy plus any earlier centering,
/// without the root's rotation), so calling this again on an already
/// centered scene, even one that has since been spun, returns a center of
/// roughly zero and the same radius.
pub fn normalize(scene: &mut Scene) -> Result<NormalizedScene> {
    let bounds = scene.model_bounds();
    if bounds.is_empty() {
        return Err(Error::DegenerateBounds(0.0));
    }
    let size = bounds.size();
    let half = bounds.half_max_extent();
    let radius = Radius::new(half).ok_or(Error::DegenerateBounds(half * 2.0))?;
    let center = bounds.center();
    if !center.is_finite() {
        return Err(Error::DegenerateBounds(half * 2.0));
    }

    scene.root_mut().centering -= center;
    let normalized = NormalizedScene {
        center,
        size,
        radius,
        bounds: bounds.translated(-center),
    };
    debug!(?center, ?size, %radius, "normalized scene");
    Ok(normalized)
}
