//! glTF 2.0 decoding into the viewer's [`Scene`] model.
//!
//! Accepts both `.gltf` JSON (buffers as data URIs) and binary `.glb`.
//! External buffer files are not resolved: assets are fetched by URL, and
//! anything the viewer needs must travel inside that one payload.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::scene::{Material, PartRole, Scene, Transform};
use crate::util::{Error, Quat, Result, Vec3, Vec4};

/// Role tag carried in a node's or mesh's `extras`.
#[derive(Deserialize, Default)]
struct PartExtras {
    role: Option<String>,
}

fn role_from_extras(extras: &gltf::json::Extras) -> Option<PartRole> {
    let raw = extras.as_ref()?;
    let parsed: PartExtras = serde_json::from_str(raw.get()).ok()?;
    parsed.role.as_deref().and_then(PartRole::parse)
}

/// Decode a glTF payload fetched from `url`.
pub fn decode_scene(url: &str, bytes: &[u8]) -> Result<Scene> {
    let _span = tracing::info_span!("decode_gltf", url).entered();

    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| Error::parse(url, e))?;
    let buffers = gltf::import_buffers(&gltf.document, None, gltf.blob.clone())
        .map_err(|e| Error::parse(url, e))?;
    let doc = &gltf.document;

    let root_scene = doc
        .default_scene()
        .or_else(|| doc.scenes().next())
        .ok_or_else(|| Error::EmptyScene(url.to_string()))?;

    let mut decoder = Decoder {
        url,
        buffers: &buffers,
        materials: HashMap::new(),
        visited: HashSet::new(),
        scene: Scene::new(),
    };
    for node in root_scene.nodes() {
        decoder.visit(&node, None)?;
    }

    let scene = decoder.scene;
    if scene.parts().is_empty() {
        return Err(Error::EmptyScene(url.to_string()));
    }
    debug!(
        nodes = scene.nodes().len(),
        parts = scene.parts().len(),
        vertices = scene.vertex_count(),
        "decoded glTF scene"
    );
    Ok(scene)
}

struct Decoder<'a> {
    url: &'a str,
    buffers: &'a [gltf::buffer::Data],
    /// Keyed by glTF material index; `None` is the glTF default material.
    materials: HashMap<Option<usize>, Arc<Material>>,
    /// glTF node indices already placed; a node may have only one parent.
    visited: HashSet<usize>,
    scene: Scene,
}

impl Decoder<'_> {
    fn visit(&mut self, node: &gltf::Node<'_>, parent: Option<usize>) -> Result<()> {
        if !self.visited.insert(node.index()) {
            return Err(Error::parse(
                self.url,
                format!("node {} has more than one parent or forms a cycle", node.index()),
            ));
        }
        let (t, r, s) = node.transform().decomposed();
        let local = Transform {
            translation: Vec3::from(t),
            rotation: Quat::from_array(r),
            scale: Vec3::from(s),
        };
        let node_name = node.name().map(str::to_string);
        let index = self.scene.add_node(
            node_name.clone().unwrap_or_else(|| format!("node_{}", node.index())),
            parent,
            local,
        );

        if let Some(mesh) = node.mesh() {
            let role = role_from_extras(node.extras()).or_else(|| role_from_extras(mesh.extras()));
            let base_name = node_name
                .or_else(|| mesh.name().map(str::to_string))
                .unwrap_or_else(|| format!("part_{}", self.scene.parts().len()));

            for (i, prim) in mesh.primitives().enumerate() {
                let reader = prim.reader(|b| self.buffers.get(b.index()).map(|bb| bb.0.as_slice()));
                let raw: Vec<[f32; 3]> = match reader.read_positions() {
                    Some(it) => it.collect(),
                    None => {
                        warn!(node = %base_name, primitive = i, "primitive without positions skipped");
                        continue;
                    }
                };
                let positions: Vec<Vec3> = bytemuck::allocation::cast_vec(raw);
                let material = self.material(&prim.material());
                let name = if i == 0 {
                    base_name.clone()
                } else {
                    format!("{}_{}", base_name, i)
                };
                let part = self.scene.add_part(index, name, positions.into(), material);
                self.scene.parts_mut()[part].role = role;
            }
        }

        for child in node.children() {
            self.visit(&child, Some(index))?;
        }
        Ok(())
    }

    fn material(&mut self, material: &gltf::Material<'_>) -> Arc<Material> {
        self.materials
            .entry(material.index())
            .or_insert_with(|| {
                let factor = material.pbr_metallic_roughness().base_color_factor();
                Arc::new(Material::new(
                    material.name().unwrap_or("default"),
                    Vec4::from_array(factor),
                ))
            })
            .clone()
    }
}
