//! Texture readback and image saving.

use image::{ImageBuffer, Rgba};
use std::path::Path;

use crate::buffer::map_and_read;
use crate::error::{RenderError, RenderResult};

/// Bytes per row padded to the copy alignment wgpu requires.
#[must_use]
pub fn aligned_bytes_per_row(width: u32, bytes_per_pixel: u32) -> u32 {
    let unaligned = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Copies a 2D or 3D texture back to the host, tightly packed row by row
/// and slice by slice.
///
/// Depth textures return their depth aspect only, and fail with
/// [`RenderError::DownlevelUnsupported`] on adapters that cannot copy depth
/// to a buffer. Blocks until the copy is done.
pub fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> RenderResult<Vec<u8>> {
    let format = texture.format();
    let aspect = if format.is_depth_stencil_format() {
        let required = wgpu::DownlevelFlags::DEPTH_TEXTURE_AND_BUFFER_COPIES;
        if !device.downlevel_properties().flags.contains(required) {
            return Err(RenderError::DownlevelUnsupported(required));
        }
        wgpu::TextureAspect::DepthOnly
    } else {
        wgpu::TextureAspect::All
    };
    let bytes_per_pixel = format
        .block_copy_size(Some(aspect))
        .ok_or_else(|| RenderError::TextureCreationFailed(format!("{format:?} is not copyable")))?;

    let (width, height) = (texture.width(), texture.height());
    let depth = match texture.dimension() {
        wgpu::TextureDimension::D3 => texture.depth_or_array_layers(),
        _ => 1,
    };
    let bytes_per_row = aligned_bytes_per_row(width, bytes_per_pixel);
    let rows = height * depth;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("texture readback buffer"),
        size: u64::from(bytes_per_row) * u64::from(rows),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("texture readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: depth,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let padded = map_and_read(device, &staging)?;
    Ok(strip_row_padding(&padded, width * bytes_per_pixel, bytes_per_row, rows))
}

fn strip_row_padding(padded: &[u8], row_bytes: u32, bytes_per_row: u32, height: u32) -> Vec<u8> {
    let mut result = Vec::with_capacity((row_bytes * height) as usize);
    for row in 0..height {
        let start = (row * bytes_per_row) as usize;
        result.extend_from_slice(&padded[start..start + row_bytes as usize]);
    }
    result
}

/// Saves RGBA8 pixel data to an image file.
///
/// The format follows the extension: `.png`, `.jpg` or `.jpeg`. JPEG drops alpha.
pub fn save_image(
    filename: impl AsRef<Path>,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<(), ScreenshotError> {
    let path = filename.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    // wgpu uses a top-left origin, so rows need no flip
    let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, data.to_vec())
        .ok_or(ScreenshotError::InvalidImageData)?;

    match extension.as_str() {
        "png" => {
            img.save_with_format(path, image::ImageFormat::Png)?;
        }
        "jpg" | "jpeg" => {
            let rgb_img = image::DynamicImage::ImageRgba8(img).to_rgb8();
            rgb_img.save_with_format(path, image::ImageFormat::Jpeg)?;
        }
        _ => {
            return Err(ScreenshotError::UnsupportedFormat(extension));
        }
    }

    Ok(())
}

/// Encodes RGBA8 pixel data as PNG in memory.
pub fn save_to_buffer(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ScreenshotError> {
    let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, data.to_vec())
        .ok_or(ScreenshotError::InvalidImageData)?;

    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)?;

    Ok(buffer.into_inner())
}

/// Error type for image saving.
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("Failed to save image: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid image data")]
    InvalidImageData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_bytes_per_row() {
        assert_eq!(aligned_bytes_per_row(64, 4), 256);
        assert_eq!(aligned_bytes_per_row(65, 4), 512);
        assert_eq!(aligned_bytes_per_row(1, 8), 256);
    }

    #[test]
    fn test_strip_row_padding() {
        let padded = [1, 2, 0, 0, 3, 4, 0, 0];
        assert_eq!(strip_row_padding(&padded, 2, 4, 2), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_save_to_buffer_png_signature() {
        let png = save_to_buffer(&[255; 2 * 2 * 4], 2, 2).unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_save_image_rejects_unknown_extension() {
        let path = std::env::temp_dir().join("volray_unsupported.bmpx");
        let result = save_image(&path, &[0; 4], 1, 1);
        assert!(matches!(result, Err(ScreenshotError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_save_image_rejects_short_data() {
        let path = std::env::temp_dir().join("volray_short.png");
        let result = save_image(&path, &[0; 3], 1, 1);
        assert!(matches!(result, Err(ScreenshotError::InvalidImageData)));
    }
}
