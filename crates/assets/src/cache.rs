use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::decode::{DecodedImage, ImageDecoder, ImageHandle};
use crate::error::AssetError;
use crate::paths::{AssetCategory, AssetPaths};

/// Turns raw asset bytes into pixels.
pub trait AssetDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, AssetError>;
}

impl AssetDecoder for ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, AssetError> {
        self.decode_bytes(bytes)
    }
}

type CacheKey = (AssetCategory, String);

/// Memoizing image loader keyed by `(category, name)`.
///
/// Entries live as long as the cache; nothing is evicted. Failed lookups are
/// remembered too, so a missing sprite costs one filesystem probe rather than
/// one per frame.
#[derive(Debug)]
pub struct ResourceCache<D = ImageDecoder> {
    paths: AssetPaths,
    decoder: D,
    entries: HashMap<CacheKey, ImageHandle>,
    misses: HashSet<CacheKey>,
}

impl ResourceCache<ImageDecoder> {
    pub fn new(paths: AssetPaths) -> Self {
        Self::with_decoder(paths, ImageDecoder::default())
    }
}

impl<D: AssetDecoder> ResourceCache<D> {
    pub fn with_decoder(paths: AssetPaths, decoder: D) -> Self {
        Self {
            paths,
            decoder,
            entries: HashMap::new(),
            misses: HashSet::new(),
        }
    }

    pub fn paths(&self) -> &AssetPaths {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, category: AssetCategory, name: &str) -> bool {
        self.entries.contains_key(&(category, name.to_string()))
    }

    /// Loads and decodes an image once; later calls return the same handle.
    pub fn load(&mut self, category: AssetCategory, name: &str) -> Result<ImageHandle, AssetError> {
        let key = (category, name.to_string());
        if let Some(handle) = self.entries.get(&key) {
            return Ok(Arc::clone(handle));
        }
        if self.misses.contains(&key) {
            return Err(AssetError::PreviouslyFailed {
                category,
                name: name.to_string(),
            });
        }

        let decoded = self
            .paths
            .read(category, name)
            .and_then(|bytes| self.decoder.decode(&bytes));
        match decoded {
            Ok(image) => {
                debug!(%category, name, width = image.width, height = image.height, "cached image");
                let handle = Arc::new(image);
                self.entries.insert(key, Arc::clone(&handle));
                Ok(handle)
            }
            Err(err) => {
                self.misses.insert(key);
                Err(err)
            }
        }
    }

    /// Graceful variant of [`ResourceCache::load`]: a missing or broken image
    /// means the element is simply not drawn.
    pub fn load_or_none(&mut self, category: AssetCategory, name: &str) -> Option<ImageHandle> {
        match self.load(category, name) {
            Ok(handle) => Some(handle),
            Err(AssetError::PreviouslyFailed { .. }) => None,
            Err(err) => {
                warn!(%category, name, error = %err, "image unavailable, skipping");
                None
            }
        }
    }
}
