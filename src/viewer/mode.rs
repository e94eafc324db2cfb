//! Display modes, view presets and render-loop policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::util::Error;

/// Where a viewer is embedded. Drives framing, interaction and animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayMode {
    /// Home page banner; slow idle spin.
    Hero,
    /// Product page; user can orbit and zoom.
    Product,
    /// Gallery grid tile; static, framed loose.
    GalleryThumb,
    /// Full-screen inspection; user can orbit and zoom.
    Modal,
    /// Camera follows page scroll through fixed keyframes.
    Scrolly,
}

impl DisplayMode {
    pub const ALL: [Self; 5] = [
        Self::Hero,
        Self::Product,
        Self::GalleryThumb,
        Self::Modal,
        Self::Scrolly,
    ];

    /// Camera distance in units of model radius.
    pub fn distance_multiplier(self) -> f32 {
        match self {
            Self::Hero => 3.0,
            Self::Product => 3.8,
            Self::GalleryThumb => 4.2,
            Self::Modal => 3.4,
            Self::Scrolly => 3.2,
        }
    }

    /// Modes where drag-to-orbit and wheel zoom are live.
    pub fn is_interactive(self) -> bool {
        matches!(self, Self::Product | Self::Modal)
    }

    /// Modes that render every frame while active.
    pub fn is_animation_heavy(self) -> bool {
        matches!(self, Self::Hero | Self::Scrolly)
    }

    pub fn is_scroll_driven(self) -> bool {
        matches!(self, Self::Scrolly)
    }

    /// The cinematic path owns the camera in scroll mode, so presets are
    /// ignored there.
    pub fn honors_view_preset(self) -> bool {
        !self.is_scroll_driven()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Product => "product",
            Self::GalleryThumb => "galleryThumb",
            Self::Modal => "modal",
            Self::Scrolly => "scrolly",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "hero" | "homehero" => Ok(Self::Hero),
            "product" => Ok(Self::Product),
            "thumb" | "gallerythumb" | "gallery" => Ok(Self::GalleryThumb),
            "modal" => Ok(Self::Modal),
            "scrolly" | "homescrolly" | "scroll" => Ok(Self::Scrolly),
            _ => Err(Error::other(format!("unknown display mode: {}", s))),
        }
    }
}

/// Canonical camera direction, independent of display mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewPreset {
    /// Front three-quarter, slightly above.
    Front34,
    Side,
    Top,
    /// From behind the heel.
    Heel,
    /// From directly below.
    Sole,
    /// Close, low three-quarter.
    Detail,
}

impl ViewPreset {
    pub const ALL: [Self; 6] = [
        Self::Front34,
        Self::Side,
        Self::Top,
        Self::Heel,
        Self::Sole,
        Self::Detail,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front34 => "front34",
            Self::Side => "side",
            Self::Top => "top",
            Self::Heel => "heel",
            Self::Sole => "sole",
            Self::Detail => "detail",
        }
    }
}

impl fmt::Display for ViewPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front34" | "front" => Ok(Self::Front34),
            "side" => Ok(Self::Side),
            "top" => Ok(Self::Top),
            "heel" | "back" => Ok(Self::Heel),
            "sole" | "bottom" => Ok(Self::Sole),
            "detail" | "close" => Ok(Self::Detail),
            _ => Err(Error::other(format!("unknown view preset: {}", s))),
        }
    }
}

/// How the host should schedule frames for an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameLoop {
    /// Render every frame.
    Always,
    /// Render only after an explicit invalidate.
    Demand,
}

impl FrameLoop {
    pub fn for_mode(mode: DisplayMode, active: bool) -> Self {
        if active && mode.is_animation_heavy() {
            Self::Always
        } else {
            Self::Demand
        }
    }
}
