//! Windows shell thumbnails as owned bitmaps.
//!
//! The shell's `IShellItemImageFactory` produces an `HBITMAP` for a file.
//! This crate wraps that handle so it is deleted exactly once and converts it
//! into a [`Bitmap`], keeping the alpha channel only when the image actually
//! uses it.

pub mod bitmap;
pub mod config;
pub mod error;
pub mod materialize;
pub mod options;
pub mod request;

#[cfg(windows)]
mod native;
#[cfg(windows)]
mod shell;

pub use bitmap::{Bitmap, BitmapData, Color, PixelFormat};
pub use config::{Config, load_config};
pub use error::{Result, ThumbnailError};
pub use materialize::{create_alpha_bitmap, materialize};
pub use options::ThumbnailOptions;
pub use request::{DEFAULT_THUMBNAIL_SIZE, ThumbnailRequest};

#[cfg(windows)]
pub use native::NativeBitmapHandle;
#[cfg(windows)]
pub use shell::{
    get_native_thumbnail_handle, get_native_thumbnail_handle_sized,
    get_native_thumbnail_handle_with_dimensions, get_thumbnail, get_thumbnail_sized,
    get_thumbnail_with_dimensions, materialize_bitmap,
};
