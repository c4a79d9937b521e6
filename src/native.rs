use std::mem;

use tracing::debug;
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAP, BITMAPINFO, BITMAPINFOHEADER, CreateCompatibleDC, CreatedHDC, DIB_RGB_COLORS,
    DeleteDC, DeleteObject, GetDIBits, GetObjectW, HBITMAP,
};

use crate::bitmap::{Bitmap, PixelFormat};
use crate::error::{Result, ThumbnailError};

/// An `HBITMAP` owned by Rust code. Deleted exactly once, when dropped.
#[derive(Debug)]
pub struct NativeBitmapHandle {
    hbitmap: HBITMAP,
}

impl NativeBitmapHandle {
    /// Take ownership of a bitmap handle.
    ///
    /// # Safety
    /// `hbitmap` must be a valid GDI bitmap that nothing else will delete.
    pub unsafe fn from_raw(hbitmap: HBITMAP) -> Self {
        Self { hbitmap }
    }

    pub fn as_raw(&self) -> HBITMAP {
        self.hbitmap
    }

    /// Give up ownership. The caller must eventually call `DeleteObject`.
    pub fn into_raw(self) -> HBITMAP {
        let hbitmap = self.hbitmap;
        mem::forget(self);
        hbitmap
    }
}

impl Drop for NativeBitmapHandle {
    fn drop(&mut self) {
        if !self.hbitmap.is_invalid() {
            unsafe {
                let _ = DeleteObject(self.hbitmap);
            }
        }
    }
}

struct MemoryDc(CreatedHDC);

impl MemoryDc {
    fn new() -> Result<Self> {
        let hdc = unsafe { CreateCompatibleDC(None) };
        if hdc.is_invalid() {
            return Err(ThumbnailError::BitmapImport {
                reason: "CreateCompatibleDC failed".to_string(),
            });
        }
        Ok(Self(hdc))
    }
}

impl Drop for MemoryDc {
    fn drop(&mut self) {
        unsafe {
            let _ = DeleteDC(self.0);
        }
    }
}

/// Copy a GDI bitmap's pixels into a [`Bitmap`].
///
/// 32-bit sources keep all four bytes per pixel as [`PixelFormat::Rgb32`];
/// anything shallower is read back as 24-bit RGB. The handle is only
/// borrowed.
pub fn import(handle: &NativeBitmapHandle) -> Result<Bitmap> {
    let mut header = BITMAP::default();
    let copied = unsafe {
        GetObjectW(
            handle.hbitmap,
            mem::size_of::<BITMAP>() as i32,
            Some(&mut header as *mut BITMAP as *mut _),
        )
    };
    if copied == 0 {
        return Err(ThumbnailError::BitmapImport {
            reason: "GetObjectW failed".to_string(),
        });
    }

    let width = header.bmWidth;
    let height = header.bmHeight.unsigned_abs();
    if width <= 0 || height == 0 {
        return Err(ThumbnailError::BitmapImport {
            reason: format!("bitmap has empty size {}x{}", header.bmWidth, header.bmHeight),
        });
    }
    let width = width as u32;

    let format = if header.bmBitsPixel >= 32 {
        PixelFormat::Rgb32
    } else {
        PixelFormat::Rgb24
    };
    let stride = format.stride_for(width);
    let mut pixels = vec![0u8; stride * height as usize];

    let mut bmi = BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width as i32,
            biHeight: -(height as i32), // top-down
            biPlanes: 1,
            biBitCount: format.bits_per_pixel(),
            biCompression: BI_RGB.0,
            biSizeImage: 0,
            biXPelsPerMeter: 0,
            biYPelsPerMeter: 0,
            biClrUsed: 0,
            biClrImportant: 0,
        },
        bmiColors: [Default::default()],
    };

    let dc = MemoryDc::new()?;
    let lines = unsafe {
        GetDIBits(
            dc.0,
            handle.hbitmap,
            0,
            height,
            Some(pixels.as_mut_ptr() as *mut _),
            &mut bmi,
            DIB_RGB_COLORS,
        )
    };
    drop(dc);

    if lines == 0 {
        return Err(ThumbnailError::BitmapImport {
            reason: "GetDIBits failed".to_string(),
        });
    }

    debug!(
        width,
        height,
        source_bpp = header.bmBitsPixel,
        "imported native bitmap"
    );
    Bitmap::from_raw(width, height, format, stride, pixels)
}
