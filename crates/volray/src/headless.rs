//! Headless rendering of a volume to pixels or image files.
//!
//! [`HeadlessViewer`] owns a device, an offscreen color target and a
//! [`RaycastVolume`], and renders one frame per call without a window.

use std::path::Path;

use glam::Vec3;
use volray_core::{BitDepth, RenderingParams, VolumeDescriptor};
use volray_render::{
    read_texture, save_image, Camera, DrawTarget, RaycastVolume, RenderEngine, OUTPUT_FORMAT,
};

use crate::error::Result;

/// Offscreen renderer for a single volume.
///
/// # Example
/// ```no_run
/// use volray::*;
///
/// let mut viewer = HeadlessViewer::new(512, 512)?;
/// viewer.load_from_file(UVec3::new(256, 256, 113), Vec3::ONE, "head.raw", BitDepth::Sixteen)?;
/// viewer.fit_camera();
/// viewer.render_to_file("head.png")?;
/// # Ok::<(), ViewerError>(())
/// ```
pub struct HeadlessViewer {
    engine: RenderEngine,
    volume: RaycastVolume,
    camera: Camera,
    params: RenderingParams,
    output: wgpu::Texture,
    width: u32,
    height: u32,
    background: wgpu::Color,
}

impl HeadlessViewer {
    /// Creates a device and a `width` x `height` viewer.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let engine = RenderEngine::new_headless_blocking()?;
        let volume = RaycastVolume::new(engine.device(), engine.queue(), OUTPUT_FORMAT, width, height)?;
        let output = engine.create_output_texture(width, height);

        Ok(Self {
            engine,
            volume,
            camera: Camera::new(width as f32 / height as f32),
            params: RenderingParams::default(),
            output,
            width,
            height,
            background: wgpu::Color::BLACK,
        })
    }

    /// Loads a raw volume, returning the error instead of only logging it.
    pub fn load_from_file(
        &mut self,
        dimensions: glam::UVec3,
        aspect_ratios: Vec3,
        path: impl AsRef<Path>,
        bit_depth: BitDepth,
    ) -> Result<()> {
        self.volume
            .try_load_from_file(dimensions, aspect_ratios, path, bit_depth)?;
        Ok(())
    }

    /// Loads the volume described by a JSON descriptor file.
    pub fn load_descriptor(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let descriptor = VolumeDescriptor::from_file(path)?;
        self.volume.try_load_descriptor(&descriptor)?;
        Ok(())
    }

    /// The volume renderer.
    #[must_use]
    pub fn volume(&self) -> &RaycastVolume {
        &self.volume
    }

    /// Mutable access to the volume renderer.
    pub fn volume_mut(&mut self) -> &mut RaycastVolume {
        &mut self.volume
    }

    /// The camera.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable access to the camera.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Output tone-mapping parameters.
    #[must_use]
    pub fn params(&self) -> &RenderingParams {
        &self.params
    }

    /// Mutable access to the tone-mapping parameters.
    pub fn params_mut(&mut self) -> &mut RenderingParams {
        &mut self.params
    }

    /// The device and queue.
    #[must_use]
    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    /// Sets the color the output is cleared to before each frame.
    pub fn set_background(&mut self, color: wgpu::Color) {
        self.background = color;
    }

    /// Output size as `(width, height)`.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Resizes the output and the renderer's viewport targets.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.volume.resize(width, height);
        self.output = self.engine.create_output_texture(width, height);
        self.width = width;
        self.height = height;
        self.camera.set_aspect_ratio(width as f32 / height as f32);
    }

    /// Points the camera at the transformed, scaled cube.
    pub fn fit_camera(&mut self) {
        let model = self.volume.settings().transform.matrix();
        let scale = self.volume.geometry().scale_factor();
        let (min, max) = (0..8u32)
            .map(|i| {
                let corner = Vec3::new((i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32);
                model.transform_point3(corner * scale)
            })
            .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(lo, hi), p| {
                (lo.min(p), hi.max(p))
            });
        self.camera.look_at_box(min, max);
    }

    /// Renders one frame and returns its RGBA8 pixels, row by row from the top.
    pub fn render_to_image(&mut self) -> Result<Vec<u8>> {
        let device = self.engine.device();
        let view = self.output.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Headless Frame Encoder"),
        });
        {
            let _clear_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Background Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                ..Default::default()
            });
        }
        self.volume
            .draw(&mut encoder, &self.camera, &self.params, DrawTarget::Screen(&view));
        self.engine.queue().submit(std::iter::once(encoder.finish()));

        Ok(read_texture(device, self.engine.queue(), &self.output)?)
    }

    /// Renders one frame into the deferred color, normal and depth targets.
    pub fn render_deferred(&mut self) {
        let mut encoder = self
            .engine
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Headless Deferred Encoder"),
            });
        self.volume
            .draw(&mut encoder, &self.camera, &self.params, DrawTarget::RenderTargets);
        self.engine.queue().submit(std::iter::once(encoder.finish()));
    }

    /// Renders one frame and saves it as PNG or JPEG, chosen by extension.
    pub fn render_to_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let pixels = self.render_to_image()?;
        save_image(path, &pixels, self.width, self.height)?;
        Ok(())
    }
}
