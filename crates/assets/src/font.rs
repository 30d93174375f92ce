use std::sync::Arc;

use crate::error::AssetError;
use crate::paths::{AssetCategory, AssetPaths};

/// Raw font file handed to the text rasterizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontFace {
    pub name: String,
    pub data: Arc<Vec<u8>>,
}

impl FontFace {
    pub fn load(paths: &AssetPaths, name: &str) -> Result<Self, AssetError> {
        let data = paths.read(AssetCategory::Fonts, name)?;
        Ok(Self {
            name: name.to_string(),
            data: Arc::new(data),
        })
    }
}
