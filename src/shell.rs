//! Thumbnail lookup through `IShellItemImageFactory`.

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use tracing::{debug, warn};
use windows::Win32::Foundation::{RPC_E_CHANGED_MODE, S_OK, SIZE};
use windows::Win32::Graphics::Gdi::HBITMAP;
use windows::Win32::System::Com::{
    COINIT_APARTMENTTHREADED, COINIT_DISABLE_OLE1DDE, CoInitializeEx, CoUninitialize, IBindCtx,
};
use windows::Win32::UI::Shell::{
    IShellItem2, IShellItemImageFactory, SHCreateItemFromParsingName, SIIGBF,
};
use windows::core::{ComInterface, Interface, PCWSTR};

use crate::bitmap::Bitmap;
use crate::error::{Result, ThumbnailError};
use crate::materialize::materialize;
use crate::native::{self, NativeBitmapHandle};
use crate::options::ThumbnailOptions;
use crate::request::ThumbnailRequest;

/// Keeps COM initialized on the current thread for the duration of a call.
struct ComApartment {
    initialized: bool,
}

impl ComApartment {
    fn enter() -> Result<Self> {
        match unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED | COINIT_DISABLE_OLE1DDE) } {
            Ok(()) => Ok(Self { initialized: true }),
            // The thread already runs a multithreaded apartment; the shell works there too.
            Err(e) if e.code() == RPC_E_CHANGED_MODE => Ok(Self { initialized: false }),
            Err(e) => Err(ThumbnailError::ComInit { code: e.code().0 }),
        }
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        if self.initialized {
            unsafe {
                CoUninitialize();
            }
        }
    }
}

fn to_wide(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain(std::iter::once(0)).collect()
}

fn resolve_shell_item(path: &Path) -> Result<IShellItem2> {
    let full_path = std::path::absolute(path)?;
    let wide = to_wide(full_path.as_os_str());
    debug!(path = %full_path.display(), "resolving shell item");

    unsafe { SHCreateItemFromParsingName(PCWSTR(wide.as_ptr()), None::<&IBindCtx>) }.map_err(
        |e| {
            warn!(path = %full_path.display(), error = %e, "SHCreateItemFromParsingName failed");
            ThumbnailError::ShellResolution {
                path: full_path.clone(),
                code: e.code().0,
            }
        },
    )
}

fn image_factory(item: &IShellItem2, path: &Path) -> Result<IShellItemImageFactory> {
    item.cast().map_err(|e| {
        warn!(path = %path.display(), error = %e, "shell item has no image factory");
        ThumbnailError::ShellResolution {
            path: path.to_path_buf(),
            code: e.code().0,
        }
    })
}

/// Call `GetImage` and accept nothing but `S_OK`.
///
/// The generated wrapper treats every non-negative HRESULT as success, which
/// would let `S_FALSE` through, so the vtable entry is called directly.
fn request_image(
    factory: &IShellItemImageFactory,
    path: &Path,
    size: SIZE,
    options: ThumbnailOptions,
) -> Result<NativeBitmapHandle> {
    let mut hbitmap = HBITMAP::default();
    let hr = unsafe {
        (Interface::vtable(factory).GetImage)(
            Interface::as_raw(factory),
            size,
            SIIGBF(options.bits()),
            &mut hbitmap,
        )
    };

    // Anything handed back is ours to delete, whatever the status says.
    let handle = (!hbitmap.is_invalid()).then(|| unsafe { NativeBitmapHandle::from_raw(hbitmap) });

    if hr != S_OK {
        warn!(
            path = %path.display(),
            hresult = hr.0,
            "GetImage failed"
        );
        return Err(ThumbnailError::ThumbnailUnavailable {
            path: path.to_path_buf(),
            code: hr.0,
        });
    }

    handle.ok_or_else(|| ThumbnailError::BitmapImport {
        reason: format!("shell returned no bitmap for {}", path.display()),
    })
}

impl ThumbnailRequest {
    /// Ask the shell for the thumbnail and hand back the raw bitmap.
    ///
    /// The shell item is released before this returns; the bitmap is owned
    /// by the caller.
    pub fn fetch_handle(&self) -> Result<NativeBitmapHandle> {
        let (cx, cy) = self.native_size()?;
        let _com = ComApartment::enter()?;

        let item = resolve_shell_item(self.path())?;
        let result = image_factory(&item, self.path()).and_then(|factory| {
            request_image(&factory, self.path(), SIZE { cx, cy }, self.flags())
        });
        drop(item);

        let handle = result?;
        debug!(
            path = %self.path().display(),
            width = cx,
            height = cy,
            options = ?self.flags(),
            "shell returned thumbnail"
        );
        Ok(handle)
    }

    /// Fetch the thumbnail and convert it into a [`Bitmap`].
    pub fn fetch(&self) -> Result<Bitmap> {
        let handle = self.fetch_handle()?;
        materialize_bitmap(&handle)
    }
}

/// Convert a native bitmap without taking ownership of it.
pub fn materialize_bitmap(handle: &NativeBitmapHandle) -> Result<Bitmap> {
    materialize(native::import(handle)?)
}

/// 256x256 thumbnail.
pub fn get_thumbnail<P: AsRef<Path>>(path: P, options: ThumbnailOptions) -> Result<Bitmap> {
    ThumbnailRequest::new(path).options(options).fetch()
}

pub fn get_thumbnail_sized<P: AsRef<Path>>(
    path: P,
    size: u32,
    options: ThumbnailOptions,
) -> Result<Bitmap> {
    ThumbnailRequest::with_size(path, size)
        .options(options)
        .fetch()
}

pub fn get_thumbnail_with_dimensions<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    options: ThumbnailOptions,
) -> Result<Bitmap> {
    ThumbnailRequest::with_dimensions(path, width, height)
        .options(options)
        .fetch()
}

/// 256x256 native thumbnail. The caller owns the returned handle.
pub fn get_native_thumbnail_handle<P: AsRef<Path>>(
    path: P,
    options: ThumbnailOptions,
) -> Result<NativeBitmapHandle> {
    ThumbnailRequest::new(path).options(options).fetch_handle()
}

pub fn get_native_thumbnail_handle_sized<P: AsRef<Path>>(
    path: P,
    size: u32,
    options: ThumbnailOptions,
) -> Result<NativeBitmapHandle> {
    ThumbnailRequest::with_size(path, size)
        .options(options)
        .fetch_handle()
}

pub fn get_native_thumbnail_handle_with_dimensions<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    options: ThumbnailOptions,
) -> Result<NativeBitmapHandle> {
    ThumbnailRequest::with_dimensions(path, width, height)
        .options(options)
        .fetch_handle()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wide_is_nul_terminated() {
        let wide = to_wide(OsStr::new("C:\\test\\file.txt"));
        assert_eq!(wide.len(), 17);
        assert_eq!(*wide.last().unwrap(), 0);
    }

    #[test]
    fn test_com_apartment_nests() {
        let outer = ComApartment::enter().unwrap();
        let inner = ComApartment::enter().unwrap();
        drop(inner);
        drop(outer);
    }
}
