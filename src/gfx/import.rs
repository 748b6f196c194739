//! OBJ text importer
//!
//! Parses a triangulated OBJ subset already in memory: `v x y z`, `vn x y z`,
//! `vt u v [w]`, and `f c1 c2 c3` with corners `v[/vt][/vn]` (1-based). Any
//! other leading token is ignored.
//!
//! The format indexes attributes per corner; the mesh indexes them per
//! vertex. Reassembly writes each corner's texcoord/normal at its vertex
//! slot, so corners that share a vertex but disagree on an attribute
//! collapse to the last corner processed. This is a deliberate
//! simplification, not a vertex-split importer - face-varying attributes are
//! not preserved.
//!
//! Import is atomic: either a fully validated mesh comes back, or an
//! [`ImportError`] with line/corner context and nothing is registered.

use cgmath::{Matrix4, SquareMatrix, Vector2, Vector3, Zero};
use log::warn;

use crate::error::ImportError;
use crate::gfx::mesh::{MeshAttribute, TriMesh};
use crate::gfx::scene::Scene;

/// Parses OBJ text into a vertex-indexed [`TriMesh`]. The mesh keeps the
/// default transform and permanence flag; callers set those afterwards.
pub fn parse_obj_str(text: &str) -> Result<TriMesh, ImportError> {
    // attribute pools, in file order
    let mut vertices: Vec<Vector3<f32>> = Vec::new();
    let mut normals: Vec<Vector3<f32>> = Vec::new();
    let mut texcoords: Vec<Vector2<f32>> = Vec::new();

    // corner index streams, 0-based after conversion
    let mut corner_vertices: Vec<usize> = Vec::new();
    let mut corner_texcoords: Vec<usize> = Vec::new();
    let mut corner_normals: Vec<usize> = Vec::new();

    for (number, raw) in text.lines().enumerate() {
        let line = number + 1;
        let mut fields = raw.split_whitespace();
        let Some(marker) = fields.next() else {
            continue;
        };
        match marker {
            "v" => vertices.push(parse_vec3(&mut fields, line)?),
            "vn" => normals.push(parse_vec3(&mut fields, line)?),
            // only the first two texcoord components are used
            "vt" => texcoords.push(parse_vec2(&mut fields, line)?),
            "f" => {
                let corners: Vec<&str> = fields.collect();
                if corners.len() != 3 {
                    warn!(
                        "line {line}: skipping face with {} corners, only triangles are accepted",
                        corners.len()
                    );
                    continue;
                }
                for (c, descriptor) in corners.iter().enumerate() {
                    let corner = c + 1;
                    let mut parts = descriptor.split('/');

                    match parts.next() {
                        Some(field) if !field.is_empty() => {
                            corner_vertices.push(resolve_index(
                                field,
                                vertices.len(),
                                MeshAttribute::Position,
                                line,
                                corner,
                            )?);
                        }
                        _ => return Err(ImportError::MissingVertexIndex { line, corner }),
                    }
                    if let Some(field) = parts.next() {
                        if !field.is_empty() {
                            corner_texcoords.push(resolve_index(
                                field,
                                texcoords.len(),
                                MeshAttribute::Texcoord,
                                line,
                                corner,
                            )?);
                        }
                    }
                    if let Some(field) = parts.next() {
                        if !field.is_empty() {
                            corner_normals.push(resolve_index(
                                field,
                                normals.len(),
                                MeshAttribute::Normal,
                                line,
                                corner,
                            )?);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    // every corner supplied the optional field, or none did
    let total = corner_vertices.len();
    if (corner_texcoords.len() != total && !corner_texcoords.is_empty())
        || (corner_normals.len() != total && !corner_normals.is_empty())
    {
        return Err(ImportError::AttributeCountMismatch {
            vertex: total,
            texcoord: corner_texcoords.len(),
            normal: corner_normals.len(),
        });
    }
    if vertices.is_empty() {
        return Err(ImportError::EmptyMesh);
    }

    // Reassemble: the vertex pool is the mesh's vertex array verbatim;
    // texcoords/normals are shifted from corner-indexed to vertex-indexed
    // slots, last corner winning on shared vertices.
    let mut mesh = TriMesh::new();
    let vertex_count = vertices.len();
    mesh.vertices = vertices;
    if !corner_normals.is_empty() {
        mesh.normals = vec![Vector3::zero(); vertex_count];
    }
    if !corner_texcoords.is_empty() {
        mesh.texcoords = vec![Vector2::zero(); vertex_count];
    }
    for (i, &v) in corner_vertices.iter().enumerate() {
        mesh.indices.push(v as u32);
        if !corner_texcoords.is_empty() {
            mesh.texcoords[v] = texcoords[corner_texcoords[i]];
        }
        if !corner_normals.is_empty() {
            mesh.normals[v] = normals[corner_normals[i]];
        }
    }

    Ok(mesh)
}

fn parse_float(field: Option<&str>, line: usize) -> Result<f32, ImportError> {
    field
        .and_then(|f| f.parse().ok())
        .ok_or(ImportError::MalformedLine { line })
}

fn parse_vec3<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vector3<f32>, ImportError> {
    Ok(Vector3::new(
        parse_float(fields.next(), line)?,
        parse_float(fields.next(), line)?,
        parse_float(fields.next(), line)?,
    ))
}

fn parse_vec2<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vector2<f32>, ImportError> {
    Ok(Vector2::new(
        parse_float(fields.next(), line)?,
        parse_float(fields.next(), line)?,
    ))
}

/// Converts a 1-based corner index field against the pool parsed so far.
fn resolve_index(
    field: &str,
    pool_len: usize,
    attribute: MeshAttribute,
    line: usize,
    corner: usize,
) -> Result<usize, ImportError> {
    let index: i64 = field
        .parse()
        .map_err(|_| ImportError::MalformedLine { line })?;
    let zero_based = index - 1;
    if zero_based < 0 || zero_based as usize >= pool_len {
        return Err(ImportError::IndexOutOfRange {
            line,
            corner,
            attribute,
            index,
        });
    }
    Ok(zero_based as usize)
}

impl Scene {
    /// Imports OBJ text, registers the mesh under `id` (or an auto-generated
    /// id), and returns the id it was registered under.
    ///
    /// `transform` defaults to identity. On error nothing is registered.
    pub fn load_from_obj_str(
        &mut self,
        id: Option<&str>,
        obj_text: &str,
        transform: Option<Matrix4<f32>>,
        is_static: bool,
    ) -> Result<String, ImportError> {
        let mut mesh = parse_obj_str(obj_text)?;
        mesh.transform = transform.unwrap_or_else(Matrix4::identity);
        mesh.is_static = is_static;

        let id = match id {
            Some(id) => id.to_owned(),
            None => self.gen_default_id(),
        };
        self.add_renderable(Box::new(mesh), &id);
        Ok(id)
    }
}
