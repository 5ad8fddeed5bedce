//! The volume renderer: owns every GPU resource and sequences the passes.

use std::path::Path;

use glam::{Quat, UVec3, Vec3};
use volray_core::{
    BitDepth, Histogram, Light, RaycastSettings, RenderingParams, TransferCurve, Volume,
    VolumeDescriptor, VolumeGeometry,
};

use crate::camera::Camera;
use crate::cube::CubeGeometry;
use crate::entry_exit_pass::{EntryExitPass, PositionUniforms};
use crate::error::{RenderError, RenderResult};
use crate::gradient_compute::{GradientCompute, GradientTexture};
use crate::histogram_compute::HistogramCompute;
use crate::noise::NoiseTexture;
use crate::raycast_pass::{RaycastBindings, RaycastPass, RaycastUniforms};
use crate::render_targets::RenderTargets;
use crate::transfer_function::{TransferFunction, TransferFunctionTexture};
use crate::volume_texture::{check_volume_limits, VolumeTexture};

/// Where [`RaycastVolume::draw`] writes its result.
pub enum DrawTarget<'a> {
    /// Blend tone-mapped color into this view. It must have the output
    /// format and the current viewport size.
    Screen(&'a wgpu::TextureView),
    /// Write linear color, normal and depth into the deferred G-buffer.
    RenderTargets,
}

/// GPU data derived from one successful load.
struct LoadedVolume {
    texture: VolumeTexture,
    gradients: GradientTexture,
}

/// A raycast volume renderer.
///
/// Nothing is drawn until a volume has loaded successfully; see
/// [`is_drawable`](Self::is_drawable).
pub struct RaycastVolume {
    device: wgpu::Device,
    queue: wgpu::Queue,
    cube: CubeGeometry,
    entry_exit_pass: EntryExitPass,
    raycast_pass: RaycastPass,
    histogram_compute: HistogramCompute,
    gradient_compute: GradientCompute,
    targets: Option<RenderTargets>,
    noise: NoiseTexture,
    default_transfer: TransferFunctionTexture,
    transfer: Option<Box<dyn TransferFunction>>,
    geometry: VolumeGeometry,
    settings: RaycastSettings,
    histogram: Histogram,
    loaded: Option<LoadedVolume>,
}

impl RaycastVolume {
    /// Creates the renderer with viewport-sized targets of `width` x `height`.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let targets = RenderTargets::new(device, width, height)?;

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            cube: CubeGeometry::new(device),
            entry_exit_pass: EntryExitPass::new(device),
            raycast_pass: RaycastPass::new(device, output_format),
            histogram_compute: HistogramCompute::new(device),
            gradient_compute: GradientCompute::new(device),
            targets: Some(targets),
            noise: NoiseTexture::random(device, queue),
            default_transfer: TransferFunctionTexture::from_curve(
                device,
                queue,
                &TransferCurve::grayscale_ramp(),
            ),
            transfer: None,
            geometry: VolumeGeometry::default(),
            settings: RaycastSettings::default(),
            histogram: Histogram::default(),
            loaded: None,
        })
    }

    /// Loads a headerless raw volume.
    ///
    /// On any failure the error is logged and the renderer is left exactly
    /// as it was, drawable or not.
    pub fn load_from_file(
        &mut self,
        dimensions: UVec3,
        aspect_ratios: Vec3,
        path: impl AsRef<Path>,
        bit_depth: BitDepth,
    ) {
        let path = path.as_ref();
        if let Err(e) = self.try_load_from_file(dimensions, aspect_ratios, path, bit_depth) {
            log::warn!("failed to load volume from {}: {e}", path.display());
        }
    }

    /// Fallible form of [`load_from_file`](Self::load_from_file).
    pub fn try_load_from_file(
        &mut self,
        dimensions: UVec3,
        aspect_ratios: Vec3,
        path: impl AsRef<Path>,
        bit_depth: BitDepth,
    ) -> RenderResult<()> {
        let volume = Volume::read_raw(path, dimensions, bit_depth)?;
        self.load_volume(&volume, aspect_ratios)
    }

    /// Loads the raw file a descriptor points at.
    pub fn try_load_descriptor(&mut self, descriptor: &VolumeDescriptor) -> RenderResult<()> {
        let volume = descriptor.read_volume()?;
        self.load_volume(&volume, descriptor.aspect_ratios)
    }

    /// Uploads an in-memory volume and derives its histogram and gradients.
    ///
    /// State is committed only after every GPU step has succeeded.
    pub fn load_volume(&mut self, volume: &Volume, aspect_ratios: Vec3) -> RenderResult<()> {
        check_volume_limits(&self.device, volume.dimensions())?;

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let texture = VolumeTexture::upload(&self.device, &self.queue, volume);
        let derived = texture.and_then(|texture| {
            let gradients = self.gradient_compute.compute(&self.device, &self.queue, &texture);
            let histogram = self.histogram_compute.compute(&self.device, &self.queue, &texture)?;
            Ok((texture, gradients, histogram))
        });

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if let Some(error) = validation.or(out_of_memory) {
            return Err(RenderError::TextureCreationFailed(error.to_string()));
        }
        let (texture, gradients, histogram) = derived?;

        self.geometry = VolumeGeometry::new(volume.dimensions(), aspect_ratios);
        self.histogram = histogram;
        self.loaded = Some(LoadedVolume { texture, gradients });

        let d = volume.dimensions();
        log::info!(
            "loaded {}x{}x{} volume ({}-bit)",
            d.x,
            d.y,
            d.z,
            volume.bit_depth().bits()
        );
        Ok(())
    }

    /// Whether a volume is loaded and [`draw`](Self::draw) will render.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.loaded.is_some()
    }

    /// Records the entry/exit pass followed by the raycast into `encoder`.
    ///
    /// Does nothing, not even a clear, while no volume is loaded. Uniforms are
    /// written through the queue, so record at most one draw per submission.
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        camera: &Camera,
        params: &RenderingParams,
        target: DrawTarget<'_>,
    ) {
        let Some(loaded) = &self.loaded else {
            return;
        };
        let Some(targets) = &self.targets else {
            log::debug!("skipping draw: no render targets");
            return;
        };

        let model = self.settings.transform.matrix();
        self.entry_exit_pass.update_uniforms(
            &self.queue,
            &PositionUniforms::new(
                model,
                camera.view_projection_matrix(),
                self.geometry.scale_factor(),
            ),
        );
        self.entry_exit_pass.render(encoder, &self.cube, targets);

        let transfer = self.transfer_function();
        self.raycast_pass.update_uniforms(
            &self.queue,
            &RaycastUniforms::new(
                &self.geometry,
                &self.settings,
                camera,
                params,
                transfer.threshold(),
            ),
        );
        let bind_group = self.raycast_pass.create_bind_group(
            &self.device,
            &RaycastBindings {
                volume: loaded.texture.view(),
                gradients: loaded.gradients.view(),
                transfer_lookup: transfer.lookup_view(),
                noise: self.noise.view(),
                targets,
            },
        );

        match target {
            DrawTarget::Screen(view) => self.raycast_pass.render_direct(encoder, view, &bind_group),
            DrawTarget::RenderTargets => {
                self.raycast_pass.render_deferred(encoder, targets, &bind_group);
            }
        }
    }

    /// Recreates the viewport-sized targets. Zero sizes are ignored.
    ///
    /// Errors are logged; on failure the renderer keeps its previous targets
    /// if the size was rejected up front, or has none until the next resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Err(e) = self.try_resize(width, height) {
            log::error!("failed to resize render targets to {width}x{height}: {e}");
        }
    }

    /// Fallible form of [`resize`](Self::resize).
    pub fn try_resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        if self.targets.as_ref().map(RenderTargets::size) == Some((width, height)) {
            return Ok(());
        }
        RenderTargets::check_size(&self.device, width, height)?;

        // Release the old set before allocating the new one.
        self.targets = None;
        self.targets = Some(RenderTargets::new(&self.device, width, height)?);
        Ok(())
    }

    /// Current viewport-sized targets, if allocated.
    #[must_use]
    pub fn render_targets(&self) -> Option<&RenderTargets> {
        self.targets.as_ref()
    }

    /// Center of the scaled cube in model space.
    #[must_use]
    pub fn center_point(&self) -> Vec3 {
        self.geometry.center_point()
    }

    /// Derived scale and step state.
    #[must_use]
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// Dimensions of the loaded volume.
    #[must_use]
    pub fn dimensions(&self) -> Option<UVec3> {
        self.loaded.as_ref().map(|loaded| loaded.texture.dimensions())
    }

    /// Smoothed gradient field of the loaded volume.
    #[must_use]
    pub fn gradients(&self) -> Option<&GradientTexture> {
        self.loaded.as_ref().map(|loaded| &loaded.gradients)
    }

    /// Current step scale.
    #[must_use]
    pub fn step_scale(&self) -> f32 {
        self.settings.step_scale()
    }

    /// Sets the step scale; values below the minimum are clamped.
    pub fn set_step_scale(&mut self, value: f32) {
        self.settings.set_step_scale(value);
    }

    /// Current voxel spacing ratios.
    #[must_use]
    pub fn aspect_ratios(&self) -> Vec3 {
        self.geometry.aspect_ratios()
    }

    /// Sets voxel spacing ratios (negative components clamp to zero).
    pub fn set_aspect_ratios(&mut self, aspect_ratios: Vec3) {
        self.geometry.set_aspect_ratios(aspect_ratios);
    }

    /// The normalized 256-bin histogram of the loaded volume.
    #[must_use]
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Sets the classification used by subsequent draws.
    pub fn set_transfer_function(&mut self, transfer: impl TransferFunction + 'static) {
        self.transfer = Some(Box::new(transfer));
    }

    /// Builds a lookup texture from `curve` and uses it for subsequent draws.
    pub fn set_transfer_curve(&mut self, curve: &TransferCurve) {
        let texture = TransferFunctionTexture::from_curve(&self.device, &self.queue, curve);
        self.set_transfer_function(texture);
    }

    /// The active classification; the grayscale ramp until one is set.
    #[must_use]
    pub fn transfer_function(&self) -> &dyn TransferFunction {
        match &self.transfer {
            Some(transfer) => transfer.as_ref(),
            None => &self.default_transfer,
        }
    }

    /// Whether gradients shade samples.
    #[must_use]
    pub fn diffuse_shading(&self) -> bool {
        self.settings.diffuse_shading
    }

    /// Enables or disables diffuse shading.
    pub fn set_diffuse_shading(&mut self, enabled: bool) {
        self.settings.diffuse_shading = enabled;
    }

    /// Current light.
    #[must_use]
    pub fn light(&self) -> Light {
        self.settings.light
    }

    /// Sets light direction (model space), ambient and diffuse colors.
    pub fn set_light(&mut self, direction: Vec3, ambient: Vec3, diffuse: Vec3) {
        self.settings.set_light(direction, ambient, diffuse);
    }

    /// Model rotation.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.settings.transform.rotation()
    }

    /// Sets the model rotation; it is normalized on store.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.settings.transform.set_rotation(rotation);
    }

    /// Model position offset.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.settings.transform.position()
    }

    /// Sets the model position offset.
    pub fn set_position(&mut self, position: Vec3) {
        self.settings.transform.set_position(position);
    }

    /// All raycast tunables.
    #[must_use]
    pub fn settings(&self) -> &RaycastSettings {
        &self.settings
    }

    /// Deferred color output.
    #[must_use]
    pub fn color_texture(&self) -> Option<&wgpu::Texture> {
        self.targets.as_ref().map(|t| t.color().texture())
    }

    /// Deferred normal output.
    #[must_use]
    pub fn normal_texture(&self) -> Option<&wgpu::Texture> {
        self.targets.as_ref().map(|t| t.normal().texture())
    }

    /// Deferred depth output.
    #[must_use]
    pub fn depth_texture(&self) -> Option<&wgpu::Texture> {
        self.targets.as_ref().map(|t| t.depth().texture())
    }

    /// Replaces the jitter noise with the luminance of an image file.
    pub fn set_noise_image(&mut self, path: impl AsRef<Path>) -> RenderResult<()> {
        self.noise = NoiseTexture::open(&self.device, &self.queue, path)?;
        Ok(())
    }
}
