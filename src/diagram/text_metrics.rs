//! Label width measurement for diagram layout.
//!
//! Loads one sans-serif face from the system font database and measures
//! text by summing glyph advances. The diagram engine cannot initialize
//! without a face — rasterization needs real metrics, and a machine with
//! no usable fonts cannot render text at all.

use ttf_parser::Face;

use super::DiagramError;

/// Average advance fallback for characters the face has no glyph for,
/// as a fraction of the font size.
const MISSING_GLYPH_ADVANCE: f32 = 0.6;

/// Measures text using a single loaded font face.
pub struct TextMeasurer {
    data: Vec<u8>,
    face_index: u32,
    family: String,
}

impl std::fmt::Debug for TextMeasurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextMeasurer")
            .field("family", &self.family)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl TextMeasurer {
    /// Load a sans-serif face from the system font database.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::FontUnavailable`] when no usable face
    /// exists — the caller degrades to showing diagram source as code.
    pub fn from_system_fonts() -> Result<Self, DiagramError> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let query = fontdb::Query {
            families: &[fontdb::Family::SansSerif],
            ..fontdb::Query::default()
        };
        let id = db
            .query(&query)
            .or_else(|| db.faces().next().map(|info| info.id))
            .ok_or(DiagramError::FontUnavailable)?;

        let family = db
            .face(id)
            .and_then(|info| info.families.first().map(|(name, _)| name.clone()))
            .unwrap_or_else(|| "sans-serif".to_string());

        let loaded = db.with_face_data(id, |data, face_index| {
            // Validate the face up front so measurement can't fail later.
            Face::parse(data, face_index)
                .ok()
                .map(|_| (data.to_vec(), face_index))
        });

        match loaded.flatten() {
            Some((data, face_index)) => Ok(Self {
                data,
                face_index,
                family,
            }),
            None => Err(DiagramError::FontUnavailable),
        }
    }

    /// The family name of the loaded face, for SVG font-family attributes.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Width of `text` in pixels at `font_size`.
    pub fn measure(&self, text: &str, font_size: f32) -> f32 {
        let Ok(face) = Face::parse(&self.data, self.face_index) else {
            return text.chars().count() as f32 * font_size * MISSING_GLYPH_ADVANCE;
        };
        let units_per_em = f32::from(face.units_per_em().max(1));

        let mut units = 0.0f32;
        for ch in text.chars() {
            let advance = face
                .glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .map_or(units_per_em * MISSING_GLYPH_ADVANCE, f32::from);
            units += advance;
        }
        units / units_per_em * font_size
    }
}
