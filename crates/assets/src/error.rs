use thiserror::Error;

use crate::paths::AssetCategory;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset path traversal blocked")]
    Traversal,
    #[error("{category} asset '{name}' not found in any asset root")]
    NotFound {
        category: AssetCategory,
        name: String,
    },
    #[error("asset too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },
    #[error("asset dimensions {width}x{height} exceed limit {max_width}x{max_height}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("image decode error: {0}")]
    Decode(String),
    #[error("{category} asset '{name}' failed to load earlier")]
    PreviouslyFailed {
        category: AssetCategory,
        name: String,
    },
}
