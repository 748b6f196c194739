//! Scene registry
//!
//! Id-keyed storage of renderables, materials, and lights plus the
//! renderable-to-material association. Thin glue: entities are created by
//! callers (or the OBJ importer) and inserted by id. Lookups by unknown id
//! never fail hard - assignment returns a bool and material lookups return
//! an `Option`.

use std::collections::HashMap;

use cgmath::Matrix4;

use crate::gfx::mesh::Renderable;

/// Shading description attached to a renderable. The concrete material model
/// lives in the renderer consuming the scene; the registry only stores and
/// associates it.
pub trait Material {}

/// A light source. As with [`Material`], the representation is the
/// renderer's concern.
pub trait Light {}

/// Culling volume handed to the relevance queries.
///
/// Filtering against it is not implemented yet; the queries return
/// everything and callers must not assume culling occurs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub view_proj: Matrix4<f32>,
}

impl Frustum {
    pub fn from_view_proj(view_proj: Matrix4<f32>) -> Self {
        Frustum { view_proj }
    }
}

/// Seed for auto-generated ids. Per scene instance, never shared.
const DEFAULT_ID_SEED: u64 = 139280;

/// Main registry of renderables, materials, and lights.
pub struct Scene {
    renderables: HashMap<String, Box<dyn Renderable>>,
    materials: HashMap<String, Box<dyn Material>>,
    lights: HashMap<String, Box<dyn Light>>,
    /// renderable id -> material id; absent means "no material assigned"
    material_assignments: HashMap<String, String>,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Scene {
            renderables: HashMap::new(),
            materials: HashMap::new(),
            lights: HashMap::new(),
            material_assignments: HashMap::new(),
            next_id: DEFAULT_ID_SEED,
        }
    }

    /// Inserts or overwrites the renderable stored under `id`.
    pub fn add_renderable(&mut self, renderable: Box<dyn Renderable>, id: &str) {
        self.renderables.insert(id.to_owned(), renderable);
    }

    /// Inserts or overwrites the material stored under `id`.
    pub fn add_material(&mut self, material: Box<dyn Material>, id: &str) {
        self.materials.insert(id.to_owned(), material);
    }

    /// Inserts or overwrites the light stored under `id`.
    pub fn add_light(&mut self, light: Box<dyn Light>, id: &str) {
        self.lights.insert(id.to_owned(), light);
    }

    /// Associates a material with a renderable, replacing any previous
    /// assignment. Returns `false` and changes nothing when either id is
    /// unknown.
    pub fn assign_material_to_renderable(&mut self, material_id: &str, renderable_id: &str) -> bool {
        if !self.materials.contains_key(material_id) || !self.renderables.contains_key(renderable_id)
        {
            return false;
        }
        self.material_assignments
            .insert(renderable_id.to_owned(), material_id.to_owned());
        true
    }

    /// Next auto-generated id for callers that don't supply one.
    pub fn gen_default_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    pub fn get_renderable(&self, id: &str) -> Option<&dyn Renderable> {
        self.renderables.get(id).map(|r| r.as_ref())
    }

    pub fn get_renderable_mut(&mut self, id: &str) -> Option<&mut dyn Renderable> {
        match self.renderables.get_mut(id) {
            Some(r) => Some(r.as_mut()),
            None => None,
        }
    }

    /// The material assigned to a renderable, or `None` when nothing is
    /// assigned (or the ids dangle).
    pub fn get_renderable_material(&self, renderable_id: &str) -> Option<&dyn Material> {
        let material_id = self.material_assignments.get(renderable_id)?;
        self.materials.get(material_id).map(|m| m.as_ref())
    }

    pub fn renderable_ids(&self) -> Vec<&str> {
        self.renderables.keys().map(String::as_str).collect()
    }

    pub fn material_ids(&self) -> Vec<&str> {
        self.materials.keys().map(String::as_str).collect()
    }

    /// Every renderable paired with its assigned material, if any.
    ///
    /// The volume argument is a seam for future frustum culling; nothing is
    /// filtered yet.
    pub fn get_relevant_renderables(
        &self,
        _volume: &Frustum,
    ) -> Vec<(&dyn Renderable, Option<&dyn Material>)> {
        self.renderables
            .iter()
            .map(|(id, renderable)| {
                (renderable.as_ref(), self.get_renderable_material(id))
            })
            .collect()
    }

    /// Every light. Same unfiltered placeholder semantics as
    /// [`Scene::get_relevant_renderables`].
    pub fn get_relevant_lights(&self, _volume: &Frustum) -> Vec<&dyn Light> {
        self.lights.values().map(|l| l.as_ref()).collect()
    }

    /// Empties renderables, materials, lights, and assignments.
    ///
    /// Does not touch backend buffers: unload renderables first if their
    /// buffers should be reclaimed.
    pub fn clear(&mut self) {
        self.renderables.clear();
        self.materials.clear();
        self.lights.clear();
        self.material_assignments.clear();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
