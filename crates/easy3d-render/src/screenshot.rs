//! Saving rendered frames to image files.

use std::path::Path;

use image::{GrayImage, ImageBuffer, ImageFormat, Rgba};

use crate::error::{RenderError, RenderResult};
use crate::raster::Framebuffer;

/// Image format for a file extension (case insensitive).
#[must_use]
pub fn image_format_for(path: &Path) -> Option<ImageFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "bmp" => Some(ImageFormat::Bmp),
        "tif" | "tiff" => Some(ImageFormat::Tiff),
        _ => None,
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Saves RGBA pixel data (4 bytes per pixel, top row first) to an image file.
///
/// The format follows the file extension: png, jpg/jpeg, bmp or tif/tiff.
/// Formats without alpha get the RGB channels only.
pub fn save_image(path: impl AsRef<Path>, data: &[u8], width: u32, height: u32) -> RenderResult<()> {
    let path = path.as_ref();
    let format =
        image_format_for(path).ok_or_else(|| RenderError::UnsupportedFormat(extension_of(path)))?;

    let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, data.to_vec())
        .ok_or(RenderError::InvalidImageData)?;

    match format {
        ImageFormat::Jpeg | ImageFormat::Bmp => {
            let rgb_img = image::DynamicImage::ImageRgba8(img).to_rgb8();
            rgb_img.save_with_format(path, format)?;
        }
        _ => img.save_with_format(path, format)?,
    }
    log::info!("image saved to '{}'", path.display());
    Ok(())
}

/// Saves the color plane of a framebuffer.
pub fn save_framebuffer(path: impl AsRef<Path>, fb: &Framebuffer) -> RenderResult<()> {
    if fb.width() == 0 || fb.height() == 0 {
        return Err(RenderError::EmptyFramebuffer);
    }
    save_image(path, &fb.to_rgba8(), fb.width(), fb.height())
}

/// Saves the depth plane of a framebuffer as a grayscale image.
pub fn save_depth_image(path: impl AsRef<Path>, fb: &Framebuffer) -> RenderResult<()> {
    let path = path.as_ref();
    if fb.width() == 0 || fb.height() == 0 {
        return Err(RenderError::EmptyFramebuffer);
    }
    let format =
        image_format_for(path).ok_or_else(|| RenderError::UnsupportedFormat(extension_of(path)))?;
    let img = GrayImage::from_raw(fb.width(), fb.height(), fb.depth_to_gray8())
        .ok_or(RenderError::InvalidImageData)?;
    img.save_with_format(path, format)?;
    log::info!("depth image saved to '{}'", path.display());
    Ok(())
}

/// Encodes RGBA pixel data as PNG in memory.
pub fn save_to_buffer(data: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, data.to_vec())
        .ok_or(RenderError::InvalidImageData)?;

    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("easy3d_screenshot_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(image_format_for(Path::new("a.PNG")), Some(ImageFormat::Png));
        assert_eq!(image_format_for(Path::new("a.jpeg")), Some(ImageFormat::Jpeg));
        assert_eq!(image_format_for(Path::new("a.tif")), Some(ImageFormat::Tiff));
        assert_eq!(image_format_for(Path::new("a.xyz")), None);
        assert_eq!(image_format_for(Path::new("noext")), None);
    }

    #[test]
    fn test_unsupported_and_invalid() {
        let data = vec![0u8; 4 * 4];
        assert!(matches!(
            save_image(temp_path("a.gif2"), &data, 2, 2),
            Err(RenderError::UnsupportedFormat(ext)) if ext == "gif2"
        ));
        assert!(matches!(
            save_image(temp_path("b.png"), &data, 3, 3),
            Err(RenderError::InvalidImageData)
        ));
    }

    #[test]
    fn test_save_png_and_jpg() {
        let mut fb = Framebuffer::new(4, 3);
        fb.clear(Vec4::new(1.0, 0.0, 0.0, 1.0));
        for name in ["c.png", "c.jpg", "c.bmp"] {
            let path = temp_path(name);
            save_framebuffer(&path, &fb).unwrap();
            let img = image::open(&path).unwrap();
            assert_eq!((img.width(), img.height()), (4, 3));
            let _ = std::fs::remove_file(&path);
        }
    }

    #[test]
    fn test_save_depth_image() {
        let mut fb = Framebuffer::new(2, 2);
        fb.clear(Vec4::ONE);
        let path = temp_path("depth.png");
        save_depth_image(&path, &fb).unwrap();
        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_to_buffer_png_signature() {
        let data = vec![255u8; 2 * 2 * 4];
        let bytes = save_to_buffer(&data, 2, 2).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_empty_framebuffer() {
        let fb = Framebuffer::new(0, 0);
        assert!(matches!(
            save_framebuffer(temp_path("e.png"), &fb),
            Err(RenderError::EmptyFramebuffer)
        ));
    }
}
