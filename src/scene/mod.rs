//! In-memory scene model shared by the asset loader and the viewer.
//!
//! A [`Scene`] is an arena of nodes plus a flat list of drawable parts.
//! Geometry is reference counted and never mutated after decoding, so
//! cloning a scene for a new viewer instance copies only node transforms and
//! material handles. Materials are copy-on-write: recoloring a part through
//! [`Part::material_mut`] detaches it from every other holder first.

use crate::util::{BBox3f, Mat4, Quat, Vec3, Vec4};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Linear RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (sRGB) into linear RGB.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .ok()
                .map(|v| srgb_to_linear(v as f32 / 255.0))
        };
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// RGBA with the given alpha.
    pub fn with_alpha(self, a: f32) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, a)
    }

    /// Component-wise comparison with tolerance.
    pub fn approx_eq(&self, other: &Self, eps: f32) -> bool {
        (self.r - other.r).abs() <= eps
            && (self.g - other.g).abs() <= eps
            && (self.b - other.b).abs() <= eps
    }
}

impl From<Vec4> for Color {
    fn from(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Surface parameters the viewer touches. Everything else stays in the
/// source asset.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    /// Linear RGBA base color factor.
    pub base_color: Vec4,
}

impl Material {
    pub fn new(name: impl Into<String>, base_color: Vec4) -> Self {
        Self {
            name: name.into(),
            base_color,
        }
    }

    pub fn color(&self) -> Color {
        Color::from(self.base_color)
    }

    /// Replace RGB, keep alpha.
    pub fn set_color(&mut self, color: Color) {
        self.base_color = color.with_alpha(self.base_color.w);
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", Vec4::ONE)
    }
}

/// Explicit role tag for a drawable part, read from asset metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartRole {
    /// Outer shell of the shoe; the only role variants repaint.
    Upper,
    Sole,
    Laces,
    Other,
}

impl PartRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upper" | "shell" => Some(Self::Upper),
            "sole" | "outsole" | "midsole" => Some(Self::Sole),
            "laces" | "lace" => Some(Self::Laces),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for PartRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Upper => "upper",
            Self::Sole => "sole",
            Self::Laces => "laces",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Translation / rotation / scale, applied as `T * R * S`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Hierarchy node.
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub parent: Option<usize>,
    pub local: Transform,
}

/// A drawable piece of the model: one mesh primitive under one node.
#[derive(Clone, Debug)]
pub struct Part {
    pub name: String,
    pub node: usize,
    /// Role from asset metadata, if the asset carries one.
    pub role: Option<PartRole>,
    positions: Arc<[Vec3]>,
    material: Arc<Material>,
}

impl Part {
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Mutable material; clones it first if anything else holds it.
    pub fn material_mut(&mut self) -> &mut Material {
        Arc::make_mut(&mut self.material)
    }

    /// Whether this part and `other` still point at the same material.
    pub fn shares_material_with(&self, other: &Part) -> bool {
        Arc::ptr_eq(&self.material, &other.material)
    }
}

/// Top-level transform of the model inside the viewer's world.
///
/// `centering` is applied first, in model space, so the model rotates
/// about its own bounding-box center once normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelRoot {
    pub centering: Vec3,
    pub transform: Transform,
}

impl ModelRoot {
    pub fn matrix(&self) -> Mat4 {
        self.transform.matrix() * Mat4::from_translation(self.centering)
    }

    /// Rotation about the vertical axis, in radians.
    pub fn yaw(&self) -> f32 {
        let (yaw, _, _) = self.transform.rotation.to_euler(glam::EulerRot::YXZ);
        yaw
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.transform.rotation = Quat::from_rotation_y(yaw);
    }
}

impl Default for ModelRoot {
    fn default() -> Self {
        Self {
            centering: Vec3::ZERO,
            transform: Transform::IDENTITY,
        }
    }
}

/// Node hierarchy plus drawable parts.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    parts: Vec<Part>,
    root: ModelRoot,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node. `parent` must already exist, which keeps the arena
    /// acyclic; an unknown parent leaves the node at the top level.
    pub fn add_node(&mut self, name: impl Into<String>, parent: Option<usize>, local: Transform) -> usize {
        debug_assert!(parent.is_none_or(|p| p < self.nodes.len()));
        let parent = parent.filter(|&p| p < self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            parent,
            local,
        });
        self.nodes.len() - 1
    }

    /// Attach a drawable part to an existing node.
    pub fn add_part(
        &mut self,
        node: usize,
        name: impl Into<String>,
        positions: Arc<[Vec3]>,
        material: Arc<Material>,
    ) -> usize {
        debug_assert!(node < self.nodes.len());
        self.parts.push(Part {
            name: name.into(),
            node,
            role: None,
            positions,
            material,
        });
        self.parts.len() - 1
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut [Part] {
        &mut self.parts
    }

    pub fn root(&self) -> &ModelRoot {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut ModelRoot {
        &mut self.root
    }

    pub fn vertex_count(&self) -> usize {
        self.parts.iter().map(|p| p.positions.len()).sum()
    }

    /// Accumulated local transform of every node (hierarchy only, no root).
    /// Parents always precede their children, so one forward pass resolves all.
    pub fn node_matrices(&self) -> Vec<Mat4> {
        let mut resolved: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let local = node.local.matrix();
            let m = match node.parent.and_then(|p| resolved.get(p)) {
                Some(parent) => *parent * local,
                None => local,
            };
            resolved.push(m);
        }
        resolved
    }

    /// Bounds in model space: hierarchy plus centering, without the root's
    /// translation, rotation or scale.
    pub fn model_bounds(&self) -> BBox3f {
        let centering = Mat4::from_translation(self.root.centering);
        self.bounds_with(centering)
    }

    /// Bounds after the full root transform.
    pub fn world_bounds(&self) -> BBox3f {
        self.bounds_with(self.root.matrix())
    }

    fn bounds_with(&self, root: Mat4) -> BBox3f {
        let nodes = self.node_matrices();
        self.parts
            .par_iter()
            .map(|part| {
                let m = root * nodes[part.node];
                let mut b = BBox3f::EMPTY;
                for &p in part.positions.iter() {
                    b.expand_by_point(m.transform_point3(p));
                }
                b
            })
            .reduce(
                || BBox3f::EMPTY,
                |mut a, b| {
                    a.expand_by_box(&b);
                    a
                },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(min: Vec3, max: Vec3) -> Arc<[Vec3]> {
        let mut v = Vec::with_capacity(8);
        for x in [min.x, max.x] {
            for y in [min.y, max.y] {
                for z in [min.z, max.z] {
                    v.push(Vec3::new(x, y, z));
                }
            }
        }
        v.into()
    }

    #[test]
    fn test_hex_parse() {
        let c = Color::from_hex("#ffffff").unwrap();
        assert!(c.approx_eq(&Color::WHITE, 1e-6));
        let black = Color::from_hex("000000").unwrap();
        assert_eq!(black, Color::new(0.0, 0.0, 0.0));
        assert!(Color::from_hex("#fff").is_none());
        assert!(Color::from_hex("#gg0000").is_none());
    }

    #[test]
    fn test_bounds_follow_hierarchy() {
        let mut scene = Scene::new();
        let root = scene.add_node("root", None, Transform::from_translation(Vec3::X));
        let child = scene.add_node("child", Some(root), Transform::from_translation(Vec3::Y));
        scene.add_part(child, "box", cube(Vec3::ZERO, Vec3::ONE), Arc::new(Material::default()));

        let b = scene.world_bounds();
        assert_eq!(b.min, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(b.max, Vec3::new(2.0, 2.0, 1.0));
    }

    #[test]
    fn test_deep_hierarchy_resolves_without_recursion() {
        let mut scene = Scene::new();
        let mut parent = None;
        for i in 0..50_000 {
            parent = Some(scene.add_node(format!("n{}", i), parent, Transform::from_translation(Vec3::X)));
        }
        let last = scene.node_matrices()[49_999];
        assert_eq!(last.w_axis.x, 50_000.0);
    }

    #[test]
    fn test_model_bounds_ignore_root_rotation() {
        let mut scene = Scene::new();
        let n = scene.add_node("n", None, Transform::IDENTITY);
        scene.add_part(n, "box", cube(Vec3::new(-2.0, -1.0, -1.0), Vec3::new(2.0, 1.0, 1.0)), Arc::new(Material::default()));
        scene.root_mut().set_yaw(std::f32::consts::FRAC_PI_2);

        let model = scene.model_bounds();
        assert_eq!(model.size(), Vec3::new(4.0, 2.0, 2.0));
        let world = scene.world_bounds();
        assert!((world.size().z - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_material_copy_on_write() {
        let shared = Arc::new(Material::default());
        let mut scene = Scene::new();
        let n = scene.add_node("n", None, Transform::IDENTITY);
        scene.add_part(n, "a", cube(Vec3::ZERO, Vec3::ONE), shared.clone());
        scene.add_part(n, "b", cube(Vec3::ZERO, Vec3::ONE), shared.clone());

        let template = scene.clone();
        scene.parts_mut()[0].material_mut().set_color(Color::new(1.0, 0.0, 0.0));

        assert_eq!(scene.parts()[0].material().color(), Color::new(1.0, 0.0, 0.0));
        assert_eq!(scene.parts()[1].material().color(), Color::WHITE);
        assert_eq!(template.parts()[0].material().color(), Color::WHITE);
        assert_eq!(shared.color(), Color::WHITE);
    }

    #[test]
    fn test_part_role_parse() {
        assert_eq!(PartRole::parse("Upper"), Some(PartRole::Upper));
        assert_eq!(PartRole::parse(" outsole "), Some(PartRole::Sole));
        assert_eq!(PartRole::parse("heel-counter"), None);
    }
}
