//! Product colorways and part recoloring.
//!
//! Only the shoe's outer shell takes the variant color. Which parts count as
//! the shell is decided by [`is_paintable`]: an explicit role tag from the
//! asset wins; otherwise the part name is matched case-insensitively against
//! `upper` and `shoe`. The name rule is a convention, not a guarantee. An
//! asset whose parts are named differently and carry no tags is left
//! unrecolored, which is a valid (if plain) result.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::scene::{Color, Part, PartRole, Scene};
use crate::util::Error;

/// Name fragments that mark a part as the outer shell.
const PAINTABLE_TOKENS: [&str; 2] = ["upper", "shoe"];

/// Color used for variant ids nobody recognizes.
pub const NEUTRAL_HEX: &str = "#ffffff";

/// Selectable colorway.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    #[default]
    Skywave,
    Midnight,
    Volt,
}

impl Variant {
    pub const ALL: [Self; 3] = [Self::Skywave, Self::Midnight, Self::Volt];

    pub fn id(self) -> &'static str {
        match self {
            Self::Skywave => "Skywave",
            Self::Midnight => "Midnight",
            Self::Volt => "Volt",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            Self::Skywave => "#0ea5e9",
            Self::Midnight => "#1e293b",
            Self::Volt => "#a3e635",
        }
    }

    pub fn color(self) -> Color {
        Color::from_hex(self.hex()).unwrap_or(Color::WHITE)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::other(format!("unknown variant: {}", s)))
    }
}

/// Color for a variant id; unknown ids get the neutral color.
pub fn variant_color(id: &str) -> Color {
    match id.parse::<Variant>() {
        Ok(v) => v.color(),
        Err(_) => {
            debug!(variant = id, "unknown variant, using neutral color");
            Color::from_hex(NEUTRAL_HEX).unwrap_or(Color::WHITE)
        }
    }
}

/// Whether a part belongs to the recolorable shell.
pub fn is_paintable(part: &Part) -> bool {
    match part.role {
        Some(role) => role == PartRole::Upper,
        None => name_marks_shell(&part.name),
    }
}

fn name_marks_shell(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    PAINTABLE_TOKENS.iter().any(|t| lower.contains(t))
}

/// Recolor the shell parts of `scene` for `variant`. Returns the indices of
/// the parts that were painted.
pub fn apply_variant(scene: &mut Scene, variant: &str) -> SmallVec<[usize; 4]> {
    apply_color(scene, variant_color(variant))
}

/// Paint every shell part with `color`. Each painted part gets its own
/// material copy first, so parts and scenes that shared the original are
/// left alone.
pub fn apply_color(scene: &mut Scene, color: Color) -> SmallVec<[usize; 4]> {
    let mut painted = SmallVec::new();
    for (i, part) in scene.parts_mut().iter_mut().enumerate() {
        if is_paintable(part) {
            part.material_mut().set_color(color);
            painted.push(i);
        }
    }
    if painted.is_empty() {
        warn!("no paintable parts found; model left in its original colors");
    }
    painted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, Transform};
    use crate::util::{Vec3, Vec4};
    use std::sync::Arc;

    fn scene(names: &[&str], shared: &Arc<Material>) -> Scene {
        let mut scene = Scene::new();
        let n = scene.add_node("root", None, Transform::IDENTITY);
        for name in names {
            scene.add_part(n, *name, vec![Vec3::ZERO, Vec3::ONE].into(), shared.clone());
        }
        scene
    }

    #[test]
    fn test_variant_lookup() {
        assert_eq!("midnight".parse::<Variant>().unwrap(), Variant::Midnight);
        assert_eq!(variant_color("Volt"), Variant::Volt.color());
        assert_eq!(variant_color("Crimson"), Color::WHITE);
    }

    #[test]
    fn test_variant_hex_values() {
        assert_eq!(Variant::Skywave.hex(), "#0ea5e9");
        assert_eq!(Variant::Midnight.hex(), "#1e293b");
        assert_eq!(Variant::Volt.hex(), "#a3e635");
        assert_eq!(NEUTRAL_HEX, "#ffffff");

        assert_eq!(variant_color("Skywave"), Color::from_hex("#0ea5e9").unwrap());
        assert_eq!(variant_color("Midnight"), Color::from_hex("#1e293b").unwrap());
        assert_eq!(variant_color("Volt"), Color::from_hex("#a3e635").unwrap());
        assert_eq!(variant_color("no-such-colorway"), Color::from_hex("#ffffff").unwrap());
        assert_eq!(Variant::default(), Variant::Skywave);
    }

    #[test]
    fn test_only_shell_parts_painted() {
        let shared = Arc::new(Material::new("base", Vec4::new(0.5, 0.5, 0.5, 1.0)));
        let mut s = scene(&["Shoe_Upper", "Outsole", "LACES", "UpperMesh_2"], &shared);
        let painted = apply_variant(&mut s, "Skywave");

        assert_eq!(painted.as_slice(), &[0, 3]);
        let sky = Variant::Skywave.color();
        assert_eq!(s.parts()[0].material().color(), sky);
        assert_eq!(s.parts()[1].material().color(), Color::new(0.5, 0.5, 0.5));
        assert_eq!(s.parts()[2].material().color(), Color::new(0.5, 0.5, 0.5));
        assert_eq!(shared.color(), Color::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_no_matching_names_is_noop() {
        let shared = Arc::new(Material::default());
        let mut s = scene(&["PartA", "PartB"], &shared);
        let painted = apply_variant(&mut s, "Volt");
        assert!(painted.is_empty());
        assert!(s.parts().iter().all(|p| p.material().color() == Color::WHITE));
    }

    #[test]
    fn test_idempotent() {
        let shared = Arc::new(Material::default());
        let mut s = scene(&["shoe"], &shared);
        apply_variant(&mut s, "Midnight");
        let once = s.parts()[0].material().clone();
        apply_variant(&mut s, "Midnight");
        assert_eq!(s.parts()[0].material(), &once);
    }

    #[test]
    fn test_role_tag_overrides_name() {
        let shared = Arc::new(Material::default());
        let mut s = scene(&["Shoe_Sole", "PartB"], &shared);
        s.parts_mut()[0].role = Some(PartRole::Sole);
        s.parts_mut()[1].role = Some(PartRole::Upper);
        let painted = apply_variant(&mut s, "Volt");
        assert_eq!(painted.as_slice(), &[1]);
    }

    #[test]
    fn test_alpha_preserved() {
        let shared = Arc::new(Material::new("glass", Vec4::new(1.0, 1.0, 1.0, 0.25)));
        let mut s = scene(&["upper"], &shared);
        apply_variant(&mut s, "Volt");
        assert_eq!(s.parts()[0].material().base_color.w, 0.25);
    }
}
