//! Viewport-sized offscreen targets.
//!
//! One [`RenderTargets`] holds the entry/exit position buffers and the
//! deferred G-buffer. The whole set is replaced on resize.

use crate::error::{RenderError, RenderResult};

/// Format of the entry/exit position buffers.
pub const POSITION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Depth format used while rasterizing the proxy cube.
pub const PROXY_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;
/// Deferred color attachment format.
pub const GBUFFER_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Deferred normal attachment format.
pub const GBUFFER_NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Deferred depth attachment format.
pub const GBUFFER_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A texture together with its default view.
pub struct TargetTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl TargetTexture {
    fn new(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
        width: u32,
        height: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// The texture.
    #[must_use]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Its default view.
    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Entry/exit buffers plus the deferred color, normal and depth outputs.
pub struct RenderTargets {
    width: u32,
    height: u32,
    front: TargetTexture,
    back: TargetTexture,
    proxy_depth: TargetTexture,
    color: TargetTexture,
    normal: TargetTexture,
    depth: TargetTexture,
}

impl RenderTargets {
    /// Allocates every target at `width` x `height`.
    ///
    /// Fails without allocating if the size is zero or above the device's 2D
    /// texture limit, and after allocating if the device reports an error.
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> RenderResult<Self> {
        Self::check_size(device, width, height)?;

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let attachment = wgpu::TextureUsages::RENDER_ATTACHMENT;
        let sampled = attachment | wgpu::TextureUsages::TEXTURE_BINDING;
        let readable = sampled | wgpu::TextureUsages::COPY_SRC;

        let targets = Self {
            width,
            height,
            front: TargetTexture::new(device, "Entry Positions", POSITION_FORMAT, sampled, width, height),
            back: TargetTexture::new(device, "Exit Positions", POSITION_FORMAT, sampled, width, height),
            proxy_depth: TargetTexture::new(
                device,
                "Proxy Depth",
                PROXY_DEPTH_FORMAT,
                attachment,
                width,
                height,
            ),
            color: TargetTexture::new(
                device,
                "Deferred Color",
                GBUFFER_COLOR_FORMAT,
                readable,
                width,
                height,
            ),
            normal: TargetTexture::new(
                device,
                "Deferred Normal",
                GBUFFER_NORMAL_FORMAT,
                readable,
                width,
                height,
            ),
            depth: TargetTexture::new(
                device,
                "Deferred Depth",
                GBUFFER_DEPTH_FORMAT,
                readable,
                width,
                height,
            ),
        };

        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        if let Some(error) = validation.or(out_of_memory) {
            return Err(RenderError::TextureCreationFailed(error.to_string()));
        }

        log::debug!("created render targets at {width}x{height}");
        Ok(targets)
    }

    /// Checks that targets of this size can be allocated on `device`.
    pub fn check_size(device: &wgpu::Device, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::TextureCreationFailed(format!(
                "viewport {width}x{height} has a zero extent"
            )));
        }
        let limit = device.limits().max_texture_dimension_2d;
        let largest = width.max(height);
        if largest > limit {
            return Err(RenderError::LimitExceeded {
                what: "viewport dimension",
                requested: largest,
                limit,
            });
        }
        Ok(())
    }

    /// Current size as `(width, height)`.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Entry position buffer (front faces).
    #[must_use]
    pub fn front(&self) -> &TargetTexture {
        &self.front
    }

    /// Exit position buffer (back faces).
    #[must_use]
    pub fn back(&self) -> &TargetTexture {
        &self.back
    }

    /// Depth attachment for the proxy cube passes.
    #[must_use]
    pub fn proxy_depth(&self) -> &TargetTexture {
        &self.proxy_depth
    }

    /// Deferred color output.
    #[must_use]
    pub fn color(&self) -> &TargetTexture {
        &self.color
    }

    /// Deferred normal output.
    #[must_use]
    pub fn normal(&self) -> &TargetTexture {
        &self.normal
    }

    /// Deferred depth output.
    #[must_use]
    pub fn depth(&self) -> &TargetTexture {
        &self.depth
    }
}
