use criterion::{Criterion, black_box, criterion_group, criterion_main};

use redlilium_geometry::math::Vec3;
use redlilium_geometry::mesh::generators::{generate_quad, generate_sphere};
use redlilium_geometry::mesh::{
    IndexData, IndexFormat, Mesh, SetVertexDataOptions, VertexAttributeSemantic, VertexLayout,
};

const VERTEX_COUNT: u32 = 10_000;

fn positions() -> Vec<Vec3> {
    (0..VERTEX_COUNT)
        .map(|i| Vec3::new(i as f32, (i * 2) as f32, (i * 3) as f32))
        .collect()
}

fn pbr_mesh() -> Mesh {
    let mut mesh = Mesh::new();
    mesh.set_vertex_state(Some(VertexLayout::pbr()))
        .expect("preset layout is valid");
    mesh.set_vertex_count(VERTEX_COUNT);
    mesh
}

// ---------------------------------------------------------------------------
// Mesh generation
// ---------------------------------------------------------------------------

fn bench_generate_sphere_low(c: &mut Criterion) {
    c.bench_function("generate_sphere_16x8", |b| {
        b.iter(|| generate_sphere(black_box(1.0), black_box(16), black_box(8)));
    });
}

fn bench_generate_sphere_high(c: &mut Criterion) {
    c.bench_function("generate_sphere_128x64", |b| {
        b.iter(|| generate_sphere(black_box(1.0), black_box(128), black_box(64)));
    });
}

fn bench_generate_quad(c: &mut Criterion) {
    c.bench_function("generate_quad", |b| {
        b.iter(|| generate_quad(black_box(0.5), black_box(0.5)));
    });
}

// ---------------------------------------------------------------------------
// Attribute packing
// ---------------------------------------------------------------------------

fn bench_write_interleaved_positions(c: &mut Criterion) {
    let mut mesh = pbr_mesh();
    let positions = positions();
    c.bench_function("write_positions_10k_pbr", |b| {
        b.iter(|| {
            mesh.set_vertex_data(
                VertexAttributeSemantic::Position,
                black_box(&positions),
                SetVertexDataOptions::default(),
            )
        });
    });
}

fn bench_read_interleaved_positions(c: &mut Criterion) {
    let mut mesh = pbr_mesh();
    mesh.set_vertex_data(
        VertexAttributeSemantic::Position,
        &positions(),
        SetVertexDataOptions::default(),
    )
    .expect("positions fit the mesh");
    c.bench_function("read_positions_10k_pbr", |b| {
        b.iter(|| {
            black_box(
                mesh.vertex_values(black_box(VertexAttributeSemantic::Position))
                    .map(|values| values.len()),
            )
        });
    });
}

fn bench_migrate_vertex_state(c: &mut Criterion) {
    let mut mesh = pbr_mesh();
    mesh.set_vertex_data(
        VertexAttributeSemantic::Position,
        &positions(),
        SetVertexDataOptions::default(),
    )
    .expect("positions fit the mesh");
    c.bench_function("migrate_pbr_to_position_normal_10k", |b| {
        b.iter(|| {
            let mut mesh = mesh.clone();
            black_box(mesh.set_vertex_state(Some(VertexLayout::position_normal())))
        });
    });
}

// ---------------------------------------------------------------------------
// Index conversion
// ---------------------------------------------------------------------------

fn bench_index_widening(c: &mut Criterion) {
    let indices: Vec<u16> = (0..u16::MAX).collect();
    let mut mesh = Mesh::new();
    c.bench_function("index_widen_64k", |b| {
        b.iter(|| {
            let _ = mesh.set_index_data(IndexData::U16(black_box(&indices)));
            black_box(mesh.set_index_format(Some(IndexFormat::Uint32)))
        });
    });
}

criterion_group!(
    benches,
    bench_generate_sphere_low,
    bench_generate_sphere_high,
    bench_generate_quad,
    bench_write_interleaved_positions,
    bench_read_interleaved_positions,
    bench_migrate_vertex_state,
    bench_index_widening,
);
criterion_main!(benches);
