//! Headless GPU integration tests.
//!
//! These need a GPU adapter (real or software fallback). Without one each
//! test prints a note and returns early.

use std::path::PathBuf;

use volray::*;
use volray_render::{read_texture, RenderTargets};

fn engine_or_skip(test: &str) -> Option<RenderEngine> {
    match RenderEngine::new_headless_blocking() {
        Ok(engine) => Some(engine),
        Err(e) => {
            eprintln!("Skipping {test}: no GPU adapter available ({e})");
            None
        }
    }
}

fn write_raw(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("volray_{}_{name}.raw", std::process::id()));
    std::fs::write(&path, bytes).expect("failed to write raw volume");
    path
}

fn gradient_volume(dimensions: UVec3) -> Vec<u8> {
    let mut bytes = Vec::new();
    for z in 0..dimensions.z {
        for y in 0..dimensions.y {
            for x in 0..dimensions.x {
                bytes.push(((x * 7 + y * 13 + z * 29) % 256) as u8);
            }
        }
    }
    bytes
}

fn sphere_volume(size: u32) -> Vec<u8> {
    let center = (size as f32 - 1.0) * 0.5;
    let mut bytes = Vec::new();
    for z in 0..size {
        for y in 0..size {
            for x in 0..size {
                let d = Vec3::new(x as f32, y as f32, z as f32).distance(Vec3::splat(center));
                bytes.push(if d < center * 0.8 { 200 } else { 0 });
            }
        }
    }
    bytes
}

#[test]
fn headless_draw_before_load_is_noop() {
    let Some(engine) = engine_or_skip("draw_before_load_is_noop") else {
        return;
    };
    let (device, queue) = (engine.device(), engine.queue());
    let volume = RaycastVolume::new(device, queue, OUTPUT_FORMAT, 32, 32).unwrap();
    assert!(!volume.is_drawable());

    let output = engine.create_output_texture(32, 32);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    {
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("test clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.2,
                        g: 0.4,
                        b: 0.6,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            ..Default::default()
        });
    }
    queue.submit(std::iter::once(encoder.finish()));

    let camera = Camera::new(1.0);
    let params = RenderingParams::default();
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    volume.draw(&mut encoder, &camera, &params, DrawTarget::Screen(&view));
    volume.draw(&mut encoder, &camera, &params, DrawTarget::RenderTargets);
    queue.submit(std::iter::once(encoder.finish()));

    let pixels = read_texture(device, queue, &output).unwrap();
    assert_eq!(pixels.len(), 32 * 32 * 4);
    let first = [pixels[0], pixels[1], pixels[2], pixels[3]];
    assert_eq!(first[3], 255);
    assert!(pixels.chunks(4).all(|px| px == first));

    // The deferred targets were never written either.
    let color = read_texture(device, queue, volume.color_texture().unwrap()).unwrap();
    assert!(color.iter().all(|&b| b == 0));
}

#[test]
fn headless_zero_volume_histogram() {
    let Some(engine) = engine_or_skip("zero_volume_histogram") else {
        return;
    };
    let mut volume =
        RaycastVolume::new(engine.device(), engine.queue(), OUTPUT_FORMAT, 64, 64).unwrap();
    let path = write_raw("zeros", &[0u8; 64]);

    volume.load_from_file(UVec3::splat(4), Vec3::ONE, &path, BitDepth::Eight);
    assert!(volume.is_drawable());

    let bins = volume.histogram().bins();
    assert_eq!(bins.len(), INTENSITY_BINS);
    assert_eq!(bins[0], 1.0);
    assert!(bins[1..].iter().all(|&b| b == 0.0));

    let _ = std::fs::remove_file(path);
}

#[test]
fn headless_histogram_matches_cpu_reference() {
    let Some(engine) = engine_or_skip("histogram_matches_cpu_reference") else {
        return;
    };
    let mut volume =
        RaycastVolume::new(engine.device(), engine.queue(), OUTPUT_FORMAT, 64, 64).unwrap();
    let dimensions = UVec3::new(17, 12, 10);
    let cpu = Volume::from_u8(dimensions, gradient_volume(dimensions)).unwrap();

    volume.load_volume(&cpu, Vec3::ONE).unwrap();

    assert_eq!(volume.histogram(), &Histogram::from_volume(&cpu));
    assert!(volume.histogram().bins().iter().all(|&b| (0.0..=1.0).contains(&b)));
    assert!(volume.histogram().bins().contains(&1.0));
}

#[test]
fn headless_16bit_volume_loads() {
    let Some(engine) = engine_or_skip("16bit_volume_loads") else {
        return;
    };
    let mut volume =
        RaycastVolume::new(engine.device(), engine.queue(), OUTPUT_FORMAT, 64, 64).unwrap();
    let samples: Vec<u8> = std::iter::repeat(u16::MAX.to_le_bytes())
        .take(8 * 8 * 8)
        .flatten()
        .collect();
    let path = write_raw("sixteen", &samples);

    volume
        .try_load_from_file(UVec3::splat(8), Vec3::ONE, &path, BitDepth::Sixteen)
        .unwrap();
    assert!(volume.is_drawable());
    assert_eq!(volume.histogram().bins()[255], 1.0);

    let _ = std::fs::remove_file(path);
}

#[test]
fn headless_short_file_keeps_previous_state() {
    let Some(engine) = engine_or_skip("short_file_keeps_previous_state") else {
        return;
    };
    let mut volume =
        RaycastVolume::new(engine.device(), engine.queue(), OUTPUT_FORMAT, 64, 64).unwrap();

    let short = write_raw("short", &[7u8; 63]);
    volume.load_from_file(UVec3::splat(4), Vec3::ONE, &short, BitDepth::Eight);
    assert!(!volume.is_drawable());

    let good = write_raw("good", &[0u8; 64]);
    volume.load_from_file(UVec3::splat(4), Vec3::new(1.0, 1.0, 2.0), &good, BitDepth::Eight);
    assert!(volume.is_drawable());
    let histogram = volume.histogram().clone();
    let geometry = *volume.geometry();

    volume.load_from_file(UVec3::new(8, 4, 2), Vec3::ONE, &short, BitDepth::Eight);
    assert!(volume.is_drawable());
    assert_eq!(volume.histogram(), &histogram);
    assert_eq!(volume.geometry(), &geometry);
    assert_eq!(volume.dimensions(), Some(UVec3::splat(4)));

    volume.load_from_file(UVec3::splat(4), Vec3::ONE, "/nonexistent/volray.raw", BitDepth::Eight);
    assert!(volume.is_drawable());
    assert_eq!(volume.geometry(), &geometry);

    let _ = std::fs::remove_file(short);
    let _ = std::fs::remove_file(good);
}

#[test]
fn headless_resize_recreates_targets() {
    let Some(engine) = engine_or_skip("resize_recreates_targets") else {
        return;
    };
    let mut volume =
        RaycastVolume::new(engine.device(), engine.queue(), OUTPUT_FORMAT, 800, 600).unwrap();
    let dimensions = UVec3::new(9, 7, 5);
    volume
        .load_volume(
            &Volume::from_u8(dimensions, gradient_volume(dimensions)).unwrap(),
            Vec3::ONE,
        )
        .unwrap();
    let histogram = volume.histogram().clone();
    assert_eq!(volume.render_targets().map(RenderTargets::size), Some((800, 600)));

    volume.resize(1024, 768);
    let targets = volume.render_targets().unwrap();
    assert_eq!(targets.size(), (1024, 768));
    for texture in [
        targets.front().texture(),
        targets.back().texture(),
        targets.color().texture(),
        targets.normal().texture(),
        targets.depth().texture(),
    ] {
        assert_eq!((texture.width(), texture.height()), (1024, 768));
    }

    assert!(volume.is_drawable());
    assert_eq!(volume.histogram(), &histogram);
    assert_eq!(volume.dimensions(), Some(dimensions));

    // Zero sizes are ignored.
    volume.resize(0, 768);
    assert_eq!(volume.render_targets().map(RenderTargets::size), Some((1024, 768)));
}

#[test]
fn headless_sphere_renders_content() {
    let mut viewer = match HeadlessViewer::new(96, 96) {
        Ok(viewer) => viewer,
        Err(e) => {
            eprintln!("Skipping sphere_renders_content: no GPU adapter available ({e})");
            return;
        }
    };
    let cpu = Volume::from_u8(UVec3::splat(32), sphere_volume(32)).unwrap();
    viewer.volume_mut().load_volume(&cpu, Vec3::ONE).unwrap();
    viewer.fit_camera();

    let pixels = viewer.render_to_image().unwrap();
    assert_eq!(pixels.len(), 96 * 96 * 4);
    let background = &pixels[0..4];
    assert_eq!(background, &[0, 0, 0, 255]);
    assert!(pixels.chunks(4).any(|px| px != background), "sphere should be visible");

    // Center pixel sits on the sphere.
    let center = ((48 * 96 + 48) * 4) as usize;
    assert!(pixels[center] > 0);
}

#[test]
fn headless_deferred_writes_depth() {
    let mut viewer = match HeadlessViewer::new(64, 64) {
        Ok(viewer) => viewer,
        Err(e) => {
            eprintln!("Skipping deferred_writes_depth: no GPU adapter available ({e})");
            return;
        }
    };
    let cpu = Volume::from_u8(UVec3::splat(24), sphere_volume(24)).unwrap();
    viewer.volume_mut().load_volume(&cpu, Vec3::ONE).unwrap();
    viewer.fit_camera();
    viewer.render_deferred();

    let engine = viewer.engine();
    let depth_texture = viewer.volume().depth_texture().unwrap();
    let bytes = match read_texture(engine.device(), engine.queue(), depth_texture) {
        Ok(bytes) => bytes,
        Err(RenderError::DownlevelUnsupported(flags)) => {
            eprintln!("Skipping deferred_writes_depth: adapter lacks {flags:?}");
            return;
        }
        Err(e) => panic!("depth readback failed: {e}"),
    };
    let depths: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(depths.len(), 64 * 64);
    assert!(depths.iter().all(|&d| (0.0..=1.0).contains(&d)));
    assert!(depths.iter().any(|&d| d < 1.0));
    // Corners miss the sphere.
    assert_eq!(depths[0], 1.0);
}

#[test]
fn headless_gradients_match_cpu_reference() {
    let Some(engine) = engine_or_skip("gradients_match_cpu_reference") else {
        return;
    };
    let (device, queue) = (engine.device(), engine.queue());
    let mut volume = RaycastVolume::new(device, queue, OUTPUT_FORMAT, 32, 32).unwrap();
    let dimensions = UVec3::new(11, 9, 7);
    let cpu = Volume::from_u8(dimensions, gradient_volume(dimensions)).unwrap();
    volume.load_volume(&cpu, Vec3::ONE).unwrap();

    let gpu = volume.gradients().unwrap().read_back(device, queue).unwrap();
    let reference = GradientField::compute(&cpu);
    assert_eq!(gpu.len(), reference.samples().len());

    // Half-float storage keeps about three decimal digits.
    let mut mismatched = Vec::new();
    for (index, (g, c)) in gpu.iter().zip(reference.samples()).enumerate() {
        let tolerance = 2e-3 + c.abs().max_element() * 2e-3;
        if (*g - *c).abs().max_element() > tolerance {
            mismatched.push((index, *g, *c));
        }
    }
    assert!(
        mismatched.is_empty(),
        "{} of {} voxels differ, first: {:?}",
        mismatched.len(),
        gpu.len(),
        mismatched.first()
    );
}

#[test]
fn headless_uniform_volume_has_zero_gradients() {
    let Some(engine) = engine_or_skip("uniform_volume_has_zero_gradients") else {
        return;
    };
    let (device, queue) = (engine.device(), engine.queue());
    let mut volume = RaycastVolume::new(device, queue, OUTPUT_FORMAT, 32, 32).unwrap();
    let cpu = Volume::from_u8(UVec3::new(11, 9, 7), vec![137; 11 * 9 * 7]).unwrap();
    volume.load_volume(&cpu, Vec3::ONE).unwrap();

    let gpu = volume.gradients().unwrap().read_back(device, queue).unwrap();
    assert_eq!(gpu.len(), 11 * 9 * 7);
    assert!(gpu.iter().all(|&g| g == Vec4::ZERO));
}

fn faint_haze_center(background: wgpu::Color) -> Option<[u8; 4]> {
    let mut viewer = match HeadlessViewer::new(64, 64) {
        Ok(viewer) => viewer,
        Err(e) => {
            eprintln!("Skipping faint_haze: no GPU adapter available ({e})");
            return None;
        }
    };
    let cpu = Volume::from_u8(UVec3::splat(16), vec![255; 16 * 16 * 16]).unwrap();
    viewer.volume_mut().load_volume(&cpu, Vec3::ONE).unwrap();
    let white = Vec4::new(1.0, 1.0, 1.0, 0.004);
    viewer.volume_mut().set_transfer_curve(&TransferCurve::new(
        vec![
            ControlPoint {
                intensity: 0.0,
                color: white,
            },
            ControlPoint {
                intensity: 1.0,
                color: white,
            },
        ],
        0.0,
    ));
    viewer.volume_mut().set_diffuse_shading(false);
    viewer.set_background(background);
    viewer.fit_camera();

    let pixels = viewer.render_to_image().unwrap();
    let center = ((32 * 64 + 32) * 4) as usize;
    Some([pixels[center], pixels[center + 1], pixels[center + 2], pixels[center + 3]])
}

#[test]
fn headless_faint_haze_stays_faint_over_black() {
    let Some(center) = faint_haze_center(wgpu::Color::BLACK) else {
        return;
    };
    // Straight color tone maps to about 0.8; a few percent coverage keeps it dim.
    assert!(center[0] > 0, "haze should be visible: {center:?}");
    assert!(center[0] < 30, "haze is too bright: {center:?}");
    assert_eq!(center[0], center[1]);
    assert_eq!(center[3], 255);
}

#[test]
fn headless_faint_haze_does_not_saturate_over_white() {
    let Some(center) = faint_haze_center(wgpu::Color::WHITE) else {
        return;
    };
    assert!(center[0] < 255, "haze should darken white slightly: {center:?}");
    assert!(center[0] > 200, "haze should stay mostly transparent: {center:?}");
}
