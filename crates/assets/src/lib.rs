//! Asset resolution, decoding and memoization for the player.
//!
//! Assets live in category folders (`images/`, `sprites/`, `sounds/`, `fonts/`)
//! under a primary root, with a second root tried when the first one misses.

mod cache;
mod codec;
mod decode;
mod error;
mod font;
mod paths;

pub use cache::{AssetDecoder, ResourceCache};
pub use codec::{wrap_vp8_frame, FrameCodec, Vp8Codec};
pub use decode::{AssetLimits, DecodedImage, ImageDecoder, ImageHandle};
pub use error::AssetError;
pub use font::FontFace;
pub use paths::{sanitize_rel_path, AssetCategory, AssetPaths};
