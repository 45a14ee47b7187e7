//! Fit-policy resolution
//!
//! Maps viewport and page dimensions to the native scale factor that the
//! host sees as logical zoom `1.0`.

use crate::error::GeometryError;
use serde::{Deserialize, Deserializer, Serialize};

/// Width/height pair in surface units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and strictly positive
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Strictly taller than wide
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

/// Rule for choosing the unit scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FitPolicy {
    Width,
    Height,
    #[default]
    Both,
}

impl FitPolicy {
    /// Parses the wire form. Unknown values fall back to [`FitPolicy::Both`].
    pub fn from_wire(value: &str) -> Self {
        match value.strip_prefix("FitPolicy.").unwrap_or(value) {
            "width" => Self::Width,
            "height" => Self::Height,
            _ => Self::Both,
        }
    }
}

impl<'de> Deserialize<'de> for FitPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&value))
    }
}

/// Native scale factor that corresponds to logical zoom `1.0`.
///
/// `Both` fits the width when the viewport is strictly taller than wide and
/// the height otherwise, so a square viewport takes the height branch.
pub fn resolve_unit_scale(
    viewport: Size,
    page: Size,
    policy: FitPolicy,
) -> Result<f64, GeometryError> {
    if !viewport.is_valid() || !page.is_valid() {
        return Err(GeometryError::InvalidGeometry {
            viewport_width: viewport.width,
            viewport_height: viewport.height,
            page_width: page.width,
            page_height: page.height,
        });
    }

    let fit_width = viewport.width / page.width;
    let fit_height = viewport.height / page.height;

    Ok(match policy {
        FitPolicy::Width => fit_width,
        FitPolicy::Height => fit_height,
        FitPolicy::Both if viewport.is_portrait() => fit_width,
        FitPolicy::Both => fit_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_and_height_policies() {
        let viewport = Size::new(800.0, 600.0);
        let page = Size::new(400.0, 600.0);
        assert_eq!(resolve_unit_scale(viewport, page, FitPolicy::Width), Ok(2.0));
        assert_eq!(resolve_unit_scale(viewport, page, FitPolicy::Height), Ok(1.0));
    }

    #[test]
    fn both_follows_viewport_orientation() {
        let page = Size::new(400.0, 600.0);

        let portrait = Size::new(600.0, 800.0);
        assert_eq!(resolve_unit_scale(portrait, page, FitPolicy::Both), Ok(1.5));

        let landscape = Size::new(800.0, 600.0);
        assert_eq!(resolve_unit_scale(landscape, page, FitPolicy::Both), Ok(1.0));
    }

    #[test]
    fn square_viewport_takes_height_branch() {
        let viewport = Size::new(500.0, 500.0);
        let page = Size::new(250.0, 1000.0);
        assert_eq!(resolve_unit_scale(viewport, page, FitPolicy::Both), Ok(0.5));
    }

    #[test]
    fn rejects_degenerate_dimensions() {
        let page = Size::new(400.0, 600.0);
        for viewport in [
            Size::new(0.0, 600.0),
            Size::new(800.0, -1.0),
            Size::new(f64::NAN, 600.0),
        ] {
            assert!(resolve_unit_scale(viewport, page, FitPolicy::Width).is_err());
        }
        let err = resolve_unit_scale(Size::new(800.0, 600.0), Size::new(400.0, 0.0), FitPolicy::Height);
        assert!(matches!(err, Err(GeometryError::InvalidGeometry { page_height, .. }) if page_height == 0.0));
    }

    #[test]
    fn wire_names() {
        assert_eq!(FitPolicy::from_wire("FitPolicy.width"), FitPolicy::Width);
        assert_eq!(FitPolicy::from_wire("height"), FitPolicy::Height);
        assert_eq!(FitPolicy::from_wire("FitPolicy.both"), FitPolicy::Both);
        assert_eq!(FitPolicy::from_wire("FitPolicy.stretch"), FitPolicy::Both);
    }
}
