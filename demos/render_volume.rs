#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
//! Render a synthetic 16-bit volume to an image without a window.
//!
//! Run with: cargo run --example render_volume -- [output.png]
//!
//! Writes a raw file and a JSON descriptor to the temp directory, loads them,
//! renders direct and deferred frames and prints the histogram.

use std::f32::consts::PI;

use volray::*;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const SIZE: UVec3 = UVec3::new(96, 96, 48);

/// Two nested shells with a soft falloff, stored little-endian.
fn shells_volume() -> Vec<u8> {
    let center = (SIZE.as_vec3() - 1.0) * 0.5;
    let mut bytes = Vec::with_capacity((SIZE.x * SIZE.y * SIZE.z * 2) as usize);
    for z in 0..SIZE.z {
        for y in 0..SIZE.y {
            for x in 0..SIZE.x {
                // Slices are twice as thick, so z counts double.
                let p = (Vec3::new(x as f32, y as f32, z as f32) - center) * Vec3::new(1.0, 1.0, 2.0);
                let r = p.length() / center.x;
                let outer = (-((r - 0.85) * 14.0).powi(2)).exp();
                let inner = (-((r - 0.4) * 10.0).powi(2)).exp();
                let value = (0.35 * outer + inner).min(1.0);
                bytes.extend_from_slice(&((value * f32::from(u16::MAX)) as u16).to_le_bytes());
            }
        }
    }
    bytes
}

fn main() -> Result<()> {
    env_logger::init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "render_volume.png".to_string());

    let dir = std::env::temp_dir().join("volray_demo");
    std::fs::create_dir_all(&dir).map_err(VolrayError::from)?;
    std::fs::write(dir.join("shells.raw"), shells_volume()).map_err(VolrayError::from)?;

    let descriptor = VolumeDescriptor {
        path: "shells.raw".into(),
        dimensions: SIZE,
        aspect_ratios: Vec3::new(1.0, 1.0, 2.0),
        bit_depth: BitDepth::Sixteen,
    };
    std::fs::write(dir.join("shells.json"), descriptor.to_json()?).map_err(VolrayError::from)?;

    let mut viewer = HeadlessViewer::new(WIDTH, HEIGHT)?;
    viewer.load_descriptor(dir.join("shells.json"))?;

    let volume = viewer.volume_mut();
    volume.set_transfer_curve(&TransferCurve::new(
        vec![
            ControlPoint {
                intensity: 0.1,
                color: Vec4::new(0.2, 0.4, 1.0, 0.0),
            },
            ControlPoint {
                intensity: 0.35,
                color: Vec4::new(0.3, 0.6, 1.0, 0.05),
            },
            ControlPoint {
                intensity: 1.0,
                color: Vec4::new(1.0, 0.7, 0.3, 0.9),
            },
        ],
        0.05,
    ));
    volume.set_step_scale(0.5);
    volume.set_rotation(Quat::from_rotation_y(PI / 6.0) * Quat::from_rotation_x(-PI / 8.0));
    volume.set_light(Vec3::new(0.3, 0.5, 1.0), Vec3::splat(0.15), Vec3::splat(0.9));

    viewer.params_mut().set_exposure(1.5);
    viewer.camera_mut().set_fov(0.7);
    viewer.fit_camera();
    viewer.render_to_file(&output)?;
    println!("wrote {output}");

    viewer.render_deferred();
    println!("deferred targets: {:?}", viewer.volume().render_targets().map(|t| t.size()));

    let histogram = viewer.volume().histogram();
    println!("histogram: {}", histogram.to_json()?);

    Ok(())
}
