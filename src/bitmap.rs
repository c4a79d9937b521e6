//! Caller-owned bitmap with GDI-style pixel layout.
//!
//! Pixels are stored the way a top-down DIB stores them: rows of `stride`
//! bytes, each pixel in blue, green, red (and alpha/reserved) order. That
//! keeps the 32-bit value of a pixel, read little-endian, equal to `0xAARRGGBB`.

use std::cell::Cell;
use std::path::Path;

use image::RgbaImage;

use crate::error::{Result, ThumbnailError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 24 bits per pixel, no alpha.
    Rgb24,
    /// 32 bits per pixel; the fourth byte is not alpha.
    Rgb32,
    /// 32 bits per pixel with a real alpha channel.
    Argb32,
}

impl PixelFormat {
    pub fn bits_per_pixel(self) -> u16 {
        match self {
            Self::Rgb24 => 24,
            Self::Rgb32 | Self::Argb32 => 32,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        usize::from(self.bits_per_pixel() / 8)
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Argb32)
    }

    /// Row stride for `width` pixels, padded to a 4-byte boundary like a DIB.
    pub fn stride_for(self, width: u32) -> usize {
        (width as usize * usize::from(self.bits_per_pixel())).div_ceil(32) * 4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Alpha strictly between fully transparent and fully opaque.
    pub const fn is_partially_transparent(self) -> bool {
        self.a > 0 && self.a < 255
    }
}

pub struct Bitmap {
    width: u32,
    height: u32,
    format: PixelFormat,
    stride: usize,
    data: Vec<u8>,
    locked: Cell<bool>,
}

impl Bitmap {
    /// Allocate a zero-filled bitmap.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        check_dimensions(width, height)?;
        let stride = format.stride_for(width);
        Ok(Self {
            width,
            height,
            format,
            stride,
            data: vec![0; stride * height as usize],
            locked: Cell::new(false),
        })
    }

    /// Adopt an existing top-down pixel buffer.
    pub fn from_raw(
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        let min_stride = width as usize * format.bytes_per_pixel();
        if stride < min_stride {
            return Err(ThumbnailError::InvalidBitmap {
                reason: format!("stride {stride} is shorter than a {width}px row"),
            });
        }
        let expected = stride * height as usize;
        if data.len() < expected {
            return Err(ThumbnailError::InvalidBitmap {
                reason: format!("buffer holds {} bytes, need {expected}", data.len()),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            stride,
            data,
            locked: Cell::new(false),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    /// Lock the pixel buffer for reading. The lock is held until the returned
    /// guard is dropped.
    pub fn lock_bits(&self) -> Result<BitmapData<'_>> {
        if self.locked.replace(true) {
            return Err(ThumbnailError::BitmapLocked);
        }
        Ok(BitmapData { bitmap: self })
    }

    pub fn pixel(&self, x: u32, y: u32) -> Result<Color> {
        let offset = self.offset(x, y)?;
        let px = &self.data[offset..offset + self.format.bytes_per_pixel()];
        Ok(match self.format {
            PixelFormat::Rgb24 | PixelFormat::Rgb32 => Color::new(255, px[2], px[1], px[0]),
            PixelFormat::Argb32 => Color::new(px[3], px[2], px[1], px[0]),
        })
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) -> Result<()> {
        if self.locked.get() {
            return Err(ThumbnailError::BitmapLocked);
        }
        let offset = self.offset(x, y)?;
        let px = &mut self.data[offset..offset + self.format.bytes_per_pixel()];
        px[0] = color.b;
        px[1] = color.g;
        px[2] = color.r;
        match self.format {
            PixelFormat::Rgb24 => {}
            PixelFormat::Rgb32 => px[3] = 0,
            PixelFormat::Argb32 => px[3] = color.a,
        }
        Ok(())
    }

    /// Convert to an `image` buffer. Formats without alpha come out opaque.
    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        let bpp = self.format.bytes_per_pixel();
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for row in self.data.chunks(self.stride).take(self.height as usize) {
            for px in row[..self.width as usize * bpp].chunks_exact(bpp) {
                let alpha = if self.format.has_alpha() { px[3] } else { 255 };
                out.extend_from_slice(&[px[2], px[1], px[0], alpha]);
            }
        }
        RgbaImage::from_raw(self.width, self.height, out).ok_or_else(|| {
            ThumbnailError::InvalidBitmap {
                reason: "pixel buffer does not match dimensions".to_string(),
            }
        })
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_rgba_image()?
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    fn offset(&self, x: u32, y: u32) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(ThumbnailError::InvalidBitmap {
                reason: format!(
                    "pixel ({x}, {y}) outside {}x{} bitmap",
                    self.width, self.height
                ),
            });
        }
        Ok(self.stride * y as usize + self.format.bytes_per_pixel() * x as usize)
    }
}

impl Clone for Bitmap {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            format: self.format,
            stride: self.stride,
            data: self.data.clone(),
            locked: Cell::new(false),
        }
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.format == other.format
            && self.stride == other.stride
            && self.data == other.data
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("stride", &self.stride)
            .field("locked", &self.locked.get())
            .finish()
    }
}

/// Read-only view of a locked bitmap's pixel buffer.
pub struct BitmapData<'a> {
    bitmap: &'a Bitmap,
}

impl BitmapData<'_> {
    pub fn width(&self) -> u32 {
        self.bitmap.width
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height
    }

    pub fn stride(&self) -> usize {
        self.bitmap.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.bitmap.format
    }

    pub fn scan0(&self) -> &[u8] {
        &self.bitmap.data
    }

    /// Little-endian 32-bit value at a byte offset into the buffer.
    pub fn read_i32(&self, offset: usize) -> Result<i32> {
        let bytes = self
            .bitmap
            .data
            .get(offset..offset + 4)
            .ok_or_else(|| ThumbnailError::InvalidBitmap {
                reason: format!("read at offset {offset} past end of pixel buffer"),
            })?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl Drop for BitmapData<'_> {
    fn drop(&mut self) {
        self.bitmap.locked.set(false);
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(ThumbnailError::InvalidSize { width, height });
    }
    Ok(())
}
