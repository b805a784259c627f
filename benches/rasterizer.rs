use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use softraster::camera::{Camera, CameraSettings};
use softraster::colors;
use softraster::math::Vec3;
use softraster::mesh::{Mesh, Vertex};
use softraster::render::shader::{flat_pixel, lit_pixel, screen_space_vertices, PixelFn};
use softraster::render::{draw_triangle, ColorBuffer, DepthBuffer, RenderFlags, Renderer, Shader, ShaderContext};
use softraster::texture::TextureRegistry;

const BUFFER_WIDTH: u32 = 800;
const BUFFER_HEIGHT: u32 = 600;

fn triangle(points: [(f32, f32); 3]) -> [Vertex; 3] {
    points.map(|(x, y)| Vertex {
        position: Vec3::new(x, y, 0.5),
        normal: Vec3::new(0.0, 0.0, -1.0),
        ..Vertex::default()
    })
}

fn small_triangle() -> [Vertex; 3] {
    triangle([(100.0, 100.0), (120.0, 100.0), (110.0, 120.0)])
}

fn medium_triangle() -> [Vertex; 3] {
    triangle([(100.0, 100.0), (300.0, 100.0), (200.0, 300.0)])
}

fn large_triangle() -> [Vertex; 3] {
    triangle([(50.0, 50.0), (750.0, 100.0), (400.0, 550.0)])
}

fn benchmark_single_triangle(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_triangle");
    let view = Camera::new(&CameraSettings::default(), BUFFER_WIDTH, BUFFER_HEIGHT).view_data();

    for (shader_name, pixel) in [("flat", flat_pixel as PixelFn), ("lit", lit_pixel as PixelFn)] {
        let shader = Shader {
            vertex: screen_space_vertices,
            pixel,
        };
        for (name, tri) in [
            ("small", small_triangle()),
            ("medium", medium_triangle()),
            ("large", large_triangle()),
        ] {
            group.bench_with_input(BenchmarkId::new(shader_name, name), &tri, |b, tri| {
                let mut color = ColorBuffer::new(BUFFER_WIDTH, BUFFER_HEIGHT, colors::BACKGROUND);
                let mut depth = DepthBuffer::new(BUFFER_WIDTH, BUFFER_HEIGHT, f32::INFINITY);
                let mut ctx = ShaderContext::new(view);
                b.iter(|| {
                    depth.fill(f32::INFINITY);
                    draw_triangle(
                        &shader,
                        &mut ctx,
                        black_box(tri),
                        RenderFlags::SHADED | RenderFlags::DEPTH,
                        &mut color,
                        &mut depth,
                    )
                });
            });
        }
    }

    group.finish();
}

fn benchmark_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    let camera = Camera::new(&CameraSettings::default(), BUFFER_WIDTH, BUFFER_HEIGHT);
    let textures = TextureRegistry::new();
    let scene = [Mesh::cube()];

    for (name, flags) in [
        ("shaded", RenderFlags::SHADED | RenderFlags::DEPTH),
        ("wireframe", RenderFlags::WIREFRAME),
        ("everything", RenderFlags::all()),
    ] {
        group.bench_function(BenchmarkId::new("cube", name), |b| {
            let mut renderer = Renderer::new(BUFFER_WIDTH, BUFFER_HEIGHT);
            renderer.set_flags(flags);
            b.iter(|| renderer.draw(&camera, black_box(&scene), &textures));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_single_triangle, benchmark_frame);
criterion_main!(benches);
