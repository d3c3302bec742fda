// Surface Benchmarks
// Performance benchmarks for pixel conversion and texture uploads

use criterion::{criterion_group, criterion_main, Criterion};
use gfx_presenter::format::{cross_blit, negotiate};
use gfx_presenter::{ApiProfile, Capabilities, FrameBuffer, GlContext, Palette, PixelFormat, SoftwareDevice, Surface};
use std::hint::black_box;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 200;

/// Helper function to create an initialized context and device
fn create_device() -> (SoftwareDevice, GlContext) {
    let caps = Capabilities::desktop();
    let mut ctx = GlContext::new();
    ctx.initialize(caps);
    (SoftwareDevice::new(caps), ctx)
}

/// Helper function to create an indexed frame with a test pattern
fn create_indexed_frame() -> FrameBuffer {
    let mut frame = FrameBuffer::new(WIDTH, HEIGHT, PixelFormat::CLUT8);
    frame.test_pattern(7);
    frame
}

/// Benchmark format conversion between packed layouts
fn bench_cross_blit(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_blit");

    let src_format = PixelFormat::RGB565;
    let mut src = FrameBuffer::new(WIDTH, HEIGHT, src_format);
    src.fill(src_format.rgb_to_color(200, 100, 50));

    group.bench_function("rgb565_to_rgba8888", |b| {
        let dst_format = PixelFormat::native_rgba();
        let mut dst = FrameBuffer::new(WIDTH, HEIGHT, dst_format);
        let dst_pitch = dst.pitch();

        b.iter(|| {
            black_box(cross_blit(
                dst.as_mut_slice(),
                dst_pitch,
                &dst_format,
                src.as_slice(),
                src.pitch(),
                &src_format,
                WIDTH as usize,
                HEIGHT as usize,
            ));
        });
    });

    group.bench_function("identity_copy", |b| {
        let mut dst = FrameBuffer::new(WIDTH, HEIGHT, src_format);
        let dst_pitch = dst.pitch();

        b.iter(|| {
            black_box(cross_blit(
                dst.as_mut_slice(),
                dst_pitch,
                &src_format,
                src.as_slice(),
                src.pitch(),
                &src_format,
                WIDTH as usize,
                HEIGHT as usize,
            ));
        });
    });

    group.finish();
}

/// Benchmark full-screen uploads for each surface kind
fn bench_surface_upload(c: &mut Criterion) {
    let mut group = c.benchmark_group("surface_upload");
    group.sample_size(50);

    let frame = create_indexed_frame();

    group.bench_function("clut8_cpu_expand", |b| {
        let (mut device, ctx) = create_device();
        let virtual_format = PixelFormat::native_rgba();
        let texture_format = negotiate(&virtual_format, ApiProfile::Desktop).expect("RGBA negotiates");
        let mut surface = Surface::clut8(texture_format, virtual_format);
        surface.allocate(WIDTH, HEIGHT);
        surface.set_palette(0, Palette::ramp().as_bytes());

        b.iter(|| {
            surface.copy_rect_to_texture(0, 0, WIDTH, HEIGHT, frame.as_slice(), frame.pitch());
            surface.update_gl_texture(&mut device, &ctx).unwrap();
        });
    });

    group.bench_function("clut8_gpu_lookup", |b| {
        let (mut device, ctx) = create_device();
        let mut surface = Surface::clut8_gpu();
        surface.allocate(WIDTH, HEIGHT);
        surface.set_palette(0, Palette::ramp().as_bytes());

        b.iter(|| {
            surface.copy_rect_to_texture(0, 0, WIDTH, HEIGHT, frame.as_slice(), frame.pitch());
            surface.update_gl_texture(&mut device, &ctx).unwrap();
        });
    });

    group.bench_function("rgb555_convert", |b| {
        let (mut device, ctx) = create_device();
        let mut surface = Surface::rgb555(ApiProfile::Desktop).expect("RGB565 negotiates");
        surface.allocate(WIDTH, HEIGHT);

        b.iter(|| {
            surface.fill(PixelFormat::RGB555.rgb_to_color(31, 99, 200));
            surface.update_gl_texture(&mut device, &ctx).unwrap();
        });
    });

    group.finish();
}

/// Benchmark palette updates on an indexed surface
fn bench_palette_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("palette_update");

    group.bench_function("full_palette_cpu_expand", |b| {
        let virtual_format = PixelFormat::native_rgba();
        let texture_format = negotiate(&virtual_format, ApiProfile::Desktop).expect("RGBA negotiates");
        let mut surface = Surface::clut8(texture_format, virtual_format);
        surface.allocate(WIDTH, HEIGHT);
        let palette = Palette::ramp();

        b.iter(|| {
            surface.set_palette(0, black_box(palette.as_bytes()));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_cross_blit, bench_surface_upload, bench_palette_update);
criterion_main!(benches);
