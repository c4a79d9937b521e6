use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Flags forwarded to `IShellItemImageFactory::GetImage`.
    ///
    /// The values are the shell's `SIIGBF_*` constants. Their meaning belongs
    /// to the shell; this crate passes them through without looking at them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ThumbnailOptions: i32 {
        /// Shrink the bitmap as necessary to fit, preserving its aspect ratio.
        const NONE = 0x00;
        /// Allow a larger bitmap than requested.
        const BIGGER_SIZE_OK = 0x01;
        /// Do not extract or render; only return what is already in memory.
        const IN_MEMORY_ONLY = 0x02;
        /// Return only the icon, never a thumbnail.
        const ICON_ONLY = 0x04;
        /// Return only the thumbnail, never the icon.
        const THUMBNAIL_ONLY = 0x08;
        /// Only look in the thumbnail cache.
        const IN_CACHE_ONLY = 0x10;

        // Newer SIIGBF bits are passed through untouched.
        const _ = !0;
    }
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self::NONE
    }
}
