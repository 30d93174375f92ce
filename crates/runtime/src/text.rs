use std::sync::Arc;

use cosmic_text::fontdb::{Database, Source};
use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache};
use tracing::{debug, warn};
use vnplayer_assets::FontFace;

const LOCALE: &str = "en-US";
/// Generous single-line width; dialogue is never wrapped.
const LAYOUT_WIDTH: f32 = 8192.0;

/// Glyph rasterizer bound to one font face at a time.
pub struct TextRasterizer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    face: Option<String>,
    family: Option<String>,
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self {
            font_system: FontSystem::new_with_locale_and_db(LOCALE.to_string(), Database::new()),
            swash_cache: SwashCache::new(),
            face: None,
            family: None,
        }
    }
}

impl TextRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn bind(&mut self, face: &FontFace) {
        if self.face.as_deref() == Some(face.name.as_str()) {
            return;
        }
        let mut db = Database::new();
        db.load_font_source(Source::Binary(Arc::clone(&face.data) as Arc<dyn AsRef<[u8]> + Send + Sync>));
        self.family = db
            .faces()
            .next()
            .and_then(|info| info.families.first())
            .map(|(name, _)| name.clone());
        match &self.family {
            Some(family) => debug!(font = %face.name, family = %family, "font bound"),
            None => warn!(font = %face.name, "font data holds no usable face"),
        }
        self.font_system = FontSystem::new_with_locale_and_db(LOCALE.to_string(), db);
        self.swash_cache = SwashCache::new();
        self.face = Some(face.name.clone());
    }

    /// Shapes `text` and reports coverage spans as `(x, y, w, h, color)`
    /// relative to the baseline origin `(x, y)`.
    pub fn rasterize<F>(&mut self, face: &FontFace, text: &str, size: f32, color: Color, mut span: F)
    where
        F: FnMut(i32, i32, u32, u32, Color),
    {
        if text.is_empty() || size <= 0.0 {
            return;
        }
        self.bind(face);
        let Some(family) = self.family.as_deref() else {
            return;
        };

        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size * 1.2));
        buffer.set_size(&mut self.font_system, Some(LAYOUT_WIDTH), None);
        buffer.set_text(
            &mut self.font_system,
            text,
            Attrs::new().family(Family::Name(family)),
            Shaping::Advanced,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);

        let baseline = buffer.layout_runs().next().map_or(size, |run| run.line_y);
        let baseline = baseline.round() as i32;
        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            color,
            |x, y, w, h, color| span(x, y - baseline, w, h, color),
        );
    }
}
