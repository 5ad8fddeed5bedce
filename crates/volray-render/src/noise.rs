//! Ray-start jitter noise.

use std::path::Path;

use rand::Rng;

use crate::error::{RenderError, RenderResult};

/// Edge length of the generated noise tile.
pub const NOISE_SIZE: u32 = 64;

/// Single-channel noise tiled across the screen to offset ray starts.
pub struct NoiseTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl NoiseTexture {
    /// Generates a uniformly random `NOISE_SIZE` x `NOISE_SIZE` tile.
    pub fn random(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let mut rng = rand::thread_rng();
        let texels: Vec<u8> = (0..NOISE_SIZE * NOISE_SIZE).map(|_| rng.gen()).collect();
        Self::from_luma(device, queue, &texels, NOISE_SIZE, NOISE_SIZE)
    }

    /// Uses the luminance of `image` as the noise tile.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &image::DynamicImage,
    ) -> RenderResult<Self> {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();
        let limit = device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 {
            return Err(RenderError::TextureCreationFailed(
                "noise image is empty".to_string(),
            ));
        }
        if width.max(height) > limit {
            return Err(RenderError::LimitExceeded {
                what: "noise image dimension",
                requested: width.max(height),
                limit,
            });
        }
        Ok(Self::from_luma(device, queue, luma.as_raw(), width, height))
    }

    /// Loads a noise tile from an image file.
    pub fn open(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
    ) -> RenderResult<Self> {
        let image = image::open(path.as_ref())?;
        Self::from_image(device, queue, &image)
    }

    fn from_luma(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texels: &[u8],
        width: u32,
        height: u32,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Noise Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            texels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// The noise texture.
    #[must_use]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Its default view.
    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Tile size as `(width, height)`.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
