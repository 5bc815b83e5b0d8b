//! Mesh generators for common shapes.
//!
//! Generated meshes are built through the regular [`Mesh`] API: a preset
//! vertex state is installed, vertex data is written into it and u32
//! indices are set.

use std::f32::consts::{PI, TAU};

use crate::error::MeshResult;
use crate::math::{Vec2, Vec3};

use super::data::{Mesh, SetVertexDataOptions};
use super::layout::{VertexAttributeSemantic, VertexLayout};
use super::values::VertexData;

/// Interleaved sphere vertex matching the `position_normal_uv` layout.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PnuVertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

/// Generate a UV sphere mesh.
///
/// Creates a sphere with the given radius, number of longitudinal segments,
/// and number of latitudinal rings. The mesh uses the `position_normal_uv`
/// layout (32 bytes per vertex) with u32 indices.
///
/// # Arguments
///
/// * `radius` - Sphere radius
/// * `segments` - Number of longitudinal segments (around the equator)
/// * `rings` - Number of latitudinal rings (from pole to pole)
pub fn generate_sphere(radius: f32, segments: u32, rings: u32) -> MeshResult<Mesh> {
    // The seam column is duplicated so UVs wrap cleanly.
    let columns = segments + 1;

    let vertices: Vec<PnuVertex> = (0..=rings)
        .flat_map(|ring| (0..columns).map(move |segment| (ring, segment)))
        .map(|(ring, segment)| {
            let u = segment as f32 / segments as f32;
            let v = ring as f32 / rings as f32;
            let (sin_polar, cos_polar) = (v * PI).sin_cos();
            let (sin_azimuth, cos_azimuth) = (u * TAU).sin_cos();
            let normal = Vec3::new(sin_polar * cos_azimuth, cos_polar, sin_polar * sin_azimuth);
            let position = normal * radius;
            PnuVertex {
                position: [position.x, position.y, position.z],
                normal: [normal.x, normal.y, normal.z],
                uv: [u, v],
            }
        })
        .collect();

    // Two triangles per quad between neighbouring rings.
    let indices: Vec<u32> = (0..rings)
        .flat_map(|ring| (0..segments).map(move |segment| ring * columns + segment))
        .flat_map(|top| {
            let bottom = top + columns;
            [top, bottom, top + 1, top + 1, bottom, bottom + 1]
        })
        .collect();

    let mut mesh = Mesh::new().with_label("sphere");
    mesh.set_vertex_state(Some(VertexLayout::position_normal_uv()))?;
    mesh.set_vertex_count(vertices.len() as u32);
    // Already interleaved: copy the whole buffer at once.
    mesh.set_vertex_data(
        VertexAttributeSemantic::Position,
        VertexData::Raw(bytemuck::cast_slice(&vertices)),
        SetVertexDataOptions::default(),
    )?;
    mesh.set_index_data(indices.as_slice())?;
    Ok(mesh)
}

/// Generate a quad mesh on the XY plane.
///
/// Creates a quad centered at the origin with the given half-width and
/// half-height. The mesh uses a position + texcoord layout (20 bytes per
/// vertex) with u32 indices.
///
/// UV coordinates go from (0,0) at top-left to (1,1) at bottom-right.
pub fn generate_quad(half_width: f32, half_height: f32) -> MeshResult<Mesh> {
    let positions = [
        Vec3::new(-half_width, -half_height, 0.0),
        Vec3::new(half_width, -half_height, 0.0),
        Vec3::new(half_width, half_height, 0.0),
        Vec3::new(-half_width, half_height, 0.0),
    ];
    let uvs = [
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 0.0),
    ];
    let indices: [u32; 6] = [0, 1, 2, 2, 3, 0];

    let mut mesh = Mesh::new().with_label("quad");
    mesh.set_vertex_state(Some(VertexLayout::position_uv()))?;
    mesh.set_vertex_count(positions.len() as u32);
    mesh.set_vertex_data(
        VertexAttributeSemantic::Position,
        &positions,
        SetVertexDataOptions::default(),
    )?;
    mesh.set_vertex_data(
        VertexAttributeSemantic::TexCoord0,
        &uvs,
        SetVertexDataOptions::default(),
    )?;
    mesh.set_index_data(&indices[..])?;
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{IndexFormat, VertexValue};

    #[test]
    fn test_generate_sphere() {
        let mesh = generate_sphere(1.0, 8, 4).unwrap();
        assert!(mesh.vertex_count() > 0);
        assert!(mesh.is_indexed());
        // (rings+1) * (segments+1) = 5 * 9 = 45 vertices
        assert_eq!(mesh.vertex_count(), 45);
        // rings * segments * 6 = 4 * 8 * 6 = 192 indices
        assert_eq!(mesh.index_count(), 192);
        assert_eq!(mesh.index_format(), Some(IndexFormat::Uint32));
        assert!(mesh.unused_buffers().is_empty());
    }

    #[test]
    fn test_generate_quad() {
        let mesh = generate_quad(0.5, 0.5).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert!(mesh.is_indexed());
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.label(), Some("quad"));
    }

    #[test]
    fn test_sphere_vertex_data_size() {
        let mesh = generate_sphere(1.0, 4, 2).unwrap();
        // (2+1) * (4+1) = 15 vertices * 32 bytes = 480
        assert_eq!(mesh.buffers()[0].byte_len(), 15 * 32);
    }

    #[test]
    fn test_sphere_raw_write_fills_every_attribute() {
        let mesh = generate_sphere(3.0, 4, 2).unwrap();
        let positions = mesh.vertex_data(VertexAttributeSemantic::Position).unwrap();
        let normals = mesh.vertex_data(VertexAttributeSemantic::Normal).unwrap();
        for (position, normal) in positions.zip(normals) {
            let (Some(p), Some(n)) = (position.as_vec3(), normal.as_vec3()) else {
                panic!("position and normal should decode as Vec3");
            };
            assert!((p - n * 3.0).norm() < 1e-5);
        }

        // Last vertex is the south pole end of the seam.
        let last = mesh
            .vertex_data(VertexAttributeSemantic::TexCoord0)
            .unwrap()
            .last()
            .and_then(|v| v.as_vec2())
            .unwrap();
        assert_eq!(last, Vec2::new(1.0, 1.0));

        let indices: Vec<u32> = mesh.index_data().unwrap().collect();
        assert_eq!(&indices[..6], &[0, 5, 1, 1, 5, 6]);
        assert!(indices.iter().all(|&i| i < mesh.vertex_count()));
    }

    #[test]
    fn test_quad_vertex_data_size() {
        let mesh = generate_quad(1.0, 1.0).unwrap();
        // 4 vertices * 20 bytes = 80
        assert_eq!(mesh.buffers()[0].byte_len(), 4 * 20);
    }

    #[test]
    fn test_sphere_normals_are_unit_length() {
        let mesh = generate_sphere(2.0, 6, 3).unwrap();
        let normals = mesh.vertex_data(VertexAttributeSemantic::Normal).unwrap();
        assert_eq!(normals.len(), 28);
        for normal in normals {
            let VertexValue::Vec3(n) = normal else {
                panic!("normal should decode as Vec3");
            };
            assert!((n.norm() - 1.0).abs() < 1e-5);
        }

        // North pole sits at +Y.
        let first = mesh
            .vertex_data(VertexAttributeSemantic::Position)
            .unwrap()
            .next()
            .and_then(|v| v.as_vec3())
            .unwrap();
        assert!((first - Vec3::new(0.0, 2.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_quad_uvs_decode() {
        let mesh = generate_quad(1.0, 1.0).unwrap();
        let uvs: Vec<_> = mesh
            .vertex_data(VertexAttributeSemantic::TexCoord0)
            .unwrap()
            .filter_map(|v| v.as_vec2())
            .collect();
        assert_eq!(uvs[0], Vec2::new(0.0, 1.0));
        assert_eq!(uvs[2], Vec2::new(1.0, 0.0));
    }
}
