use std::path::{Path, PathBuf};

use crate::error::{Result, ThumbnailError};
use crate::options::ThumbnailOptions;

/// Edge length used when a caller does not ask for a size.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 256;

/// One thumbnail lookup: which file, how big, and which shell flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailRequest {
    path: PathBuf,
    width: u32,
    height: u32,
    options: ThumbnailOptions,
}

impl ThumbnailRequest {
    /// 256x256 with no flags.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_size(path, DEFAULT_THUMBNAIL_SIZE)
    }

    /// Square request.
    pub fn with_size<P: AsRef<Path>>(path: P, size: u32) -> Self {
        Self::with_dimensions(path, size, size)
    }

    pub fn with_dimensions<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            width,
            height,
            options: ThumbnailOptions::NONE,
        }
    }

    pub fn options(mut self, options: ThumbnailOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn flags(&self) -> ThumbnailOptions {
        self.options
    }

    /// Width and height as the shell's `SIZE` fields expect them.
    #[cfg_attr(not(windows), allow(dead_code))]
    pub(crate) fn native_size(&self) -> Result<(i32, i32)> {
        let invalid = || ThumbnailError::InvalidSize {
            width: self.width,
            height: self.height,
        };
        if self.width == 0 || self.height == 0 {
            return Err(invalid());
        }
        let cx = i32::try_from(self.width).map_err(|_| invalid())?;
        let cy = i32::try_from(self.height).map_err(|_| invalid())?;
        Ok((cx, cy))
    }
}
