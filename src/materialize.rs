use tracing::trace;

use crate::bitmap::{Bitmap, Color, PixelFormat};
use crate::error::Result;

/// Turn an imported bitmap into the caller's final bitmap.
///
/// Bitmaps below 32 bits per pixel cannot carry alpha and are returned
/// unchanged. 32-bit bitmaps go through [`create_alpha_bitmap`].
pub fn materialize(imported: Bitmap) -> Result<Bitmap> {
    if imported.format().bits_per_pixel() < 32 {
        return Ok(imported);
    }
    create_alpha_bitmap(imported, PixelFormat::Argb32)
}

/// Reinterpret a 32-bit bitmap's fourth byte as alpha.
///
/// Copies every pixel into a new bitmap of `target` format. If any pixel turns
/// out to be partially transparent the copy is returned; otherwise the copy is
/// dropped and `src` comes back untouched.
pub fn create_alpha_bitmap(src: Bitmap, target: PixelFormat) -> Result<Bitmap> {
    let mut result = Bitmap::new(src.width(), src.height(), target)?;
    let mut has_alpha = false;

    {
        let src_data = src.lock_bits()?;
        let stride = src_data.stride();
        for y in 0..src_data.height() {
            for x in 0..src_data.width() {
                let offset = stride * y as usize + 4 * x as usize;
                let color = Color::from_argb(src_data.read_i32(offset)? as u32);
                if color.is_partially_transparent() {
                    has_alpha = true;
                }
                result.set_pixel(x, y, color)?;
            }
        }
    }

    trace!(
        width = src.width(),
        height = src.height(),
        has_alpha,
        "alpha scan finished"
    );

    if has_alpha { Ok(result) } else { Ok(src) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ThumbnailError;

    fn bgra(pixels: &[Color]) -> Vec<u8> {
        pixels
            .iter()
            .flat_map(|c| c.to_argb().to_le_bytes())
            .collect()
    }

    #[test]
    fn test_low_bit_depth_is_returned_as_is() {
        let src = Bitmap::from_raw(1, 1, PixelFormat::Rgb24, 4, vec![1, 2, 3, 0]).unwrap();
        let ptr = src.data().as_ptr();
        let out = materialize(src).unwrap();
        assert_eq!(out.format(), PixelFormat::Rgb24);
        assert_eq!(out.data().as_ptr(), ptr);
    }

    #[test]
    fn test_opaque_source_skips_upgrade() {
        let pixels = [
            Color::new(255, 10, 20, 30),
            Color::new(255, 40, 50, 60),
            Color::new(255, 70, 80, 90),
            Color::new(255, 1, 2, 3),
        ];
        let src = Bitmap::from_raw(2, 2, PixelFormat::Rgb32, 8, bgra(&pixels)).unwrap();
        let expected = src.clone();
        let ptr = src.data().as_ptr();

        let out = materialize(src).unwrap();
        assert_eq!(out.format(), PixelFormat::Rgb32);
        assert_eq!(out.data().as_ptr(), ptr);
        assert_eq!(out, expected);
        assert!(!out.is_locked());
    }

    #[test]
    fn test_fully_transparent_and_opaque_mix_is_not_alpha() {
        let pixels = [Color::new(0, 1, 1, 1), Color::new(255, 2, 2, 2)];
        let src = Bitmap::from_raw(2, 1, PixelFormat::Rgb32, 8, bgra(&pixels)).unwrap();
        let out = materialize(src).unwrap();
        assert_eq!(out.format(), PixelFormat::Rgb32);
    }

    #[test]
    fn test_partial_alpha_produces_argb_copy() {
        let pixels = [
            Color::new(255, 200, 0, 0),
            Color::new(0, 0, 0, 0),
            Color::new(128, 0, 200, 0),
            Color::new(1, 0, 0, 200),
            Color::new(254, 9, 8, 7),
            Color::new(255, 255, 255, 255),
        ];
        let src = Bitmap::from_raw(3, 2, PixelFormat::Rgb32, 12, bgra(&pixels)).unwrap();
        let out = materialize(src).unwrap();

        assert_eq!(out.format(), PixelFormat::Argb32);
        assert_eq!((out.width(), out.height()), (3, 2));
        for (i, expected) in pixels.iter().enumerate() {
            let (x, y) = (i as u32 % 3, i as u32 / 3);
            assert_eq!(out.pixel(x, y).unwrap(), *expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_padded_stride_is_honoured() {
        // stride of 12 bytes for a 2px row leaves 4 padding bytes per row
        let mut data = vec![0xAB; 24];
        data[0..4].copy_from_slice(&Color::new(100, 1, 2, 3).to_argb().to_le_bytes());
        data[4..8].copy_from_slice(&Color::new(255, 4, 5, 6).to_argb().to_le_bytes());
        data[12..16].copy_from_slice(&Color::new(255, 7, 8, 9).to_argb().to_le_bytes());
        data[16..20].copy_from_slice(&Color::new(0, 0, 0, 0).to_argb().to_le_bytes());
        let src = Bitmap::from_raw(2, 2, PixelFormat::Rgb32, 12, data).unwrap();

        let out = create_alpha_bitmap(src, PixelFormat::Argb32).unwrap();
        assert_eq!(out.pixel(0, 0).unwrap(), Color::new(100, 1, 2, 3));
        assert_eq!(out.pixel(1, 0).unwrap(), Color::new(255, 4, 5, 6));
        assert_eq!(out.pixel(0, 1).unwrap(), Color::new(255, 7, 8, 9));
        assert_eq!(out.pixel(1, 1).unwrap(), Color::new(0, 0, 0, 0));
    }

    #[test]
    fn test_short_rows_fail_mid_scan() {
        // 24bpp rows read as 32-bit values run off the end of the buffer
        let src = Bitmap::from_raw(2, 2, PixelFormat::Rgb24, 6, vec![0; 12]).unwrap();
        let err = create_alpha_bitmap(src, PixelFormat::Argb32).unwrap_err();
        assert!(matches!(err, ThumbnailError::InvalidBitmap { .. }));
    }
}
