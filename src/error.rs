use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching or converting a shell thumbnail.
///
/// Failures reported by the shell keep the original HRESULT so they can be
/// looked up against the Windows documentation.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("could not resolve shell item for {path}: HRESULT {code:#010x}")]
    ShellResolution { path: PathBuf, code: i32 },

    #[error("no thumbnail available for {path}: HRESULT {code:#010x}")]
    ThumbnailUnavailable { path: PathBuf, code: i32 },

    #[error("COM initialization failed: HRESULT {code:#010x}")]
    ComInit { code: i32 },

    #[error("failed to import native bitmap: {reason}")]
    BitmapImport { reason: String },

    #[error("invalid thumbnail size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("invalid bitmap: {reason}")]
    InvalidBitmap { reason: String },

    #[error("bitmap is already locked")]
    BitmapLocked,

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl ThumbnailError {
    /// The HRESULT reported by the OS, if this error came from a shell call.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::ShellResolution { code, .. }
            | Self::ThumbnailUnavailable { code, .. }
            | Self::ComInit { code } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ThumbnailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_carried() {
        let err = ThumbnailError::ThumbnailUnavailable {
            path: PathBuf::from("a.txt"),
            code: 0x8000_4005_u32 as i32,
        };
        assert_eq!(err.code(), Some(0x8000_4005_u32 as i32));
        assert!(err.to_string().contains("0x80004005"));
    }

    #[test]
    fn test_non_os_errors_have_no_code() {
        assert_eq!(ThumbnailError::BitmapLocked.code(), None);
        let err = ThumbnailError::InvalidSize {
            width: 0,
            height: 10,
        };
        assert_eq!(err.code(), None);
    }
}
