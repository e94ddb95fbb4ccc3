//! Variation catalog: stable identifiers, display names, and colors.
//!
//! The catalog is built once from the raw snapshot and passed explicitly to
//! every pipeline call — there is no global state.

use crate::domain::RawVariation;

/// One palette entry, usable both by hex-consuming exports and RGB-consuming
/// terminal renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteColor {
    pub hex: &'static str,
    pub rgb: (u8, u8, u8),
}

/// Fixed series palette, cycled by each variation's position in the input
/// list.
pub const PALETTE: [PaletteColor; 4] = [
    PaletteColor {
        hex: "#4B5563",
        rgb: (0x4B, 0x55, 0x63),
    },
    PaletteColor {
        hex: "#2563EB",
        rgb: (0x25, 0x63, 0xEB),
    },
    PaletteColor {
        hex: "#F97316",
        rgb: (0xF9, 0x73, 0x16),
    },
    PaletteColor {
        hex: "#8B5CF6",
        rgb: (0x8B, 0x5C, 0xF6),
    },
];

/// A prepared variation: stable id, display name, per-series data key, and a
/// palette index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variation {
    id: String,
    name: String,
    data_key: String,
    color_index: usize,
}

impl Variation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color_index: usize) -> Self {
        let id = id.into();
        let data_key = format!("v{id}");
        Self {
            id,
            name: name.into(),
            data_key,
            color_index: color_index % PALETTE.len(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deterministic per-series key (`"v" + id`) used at the rendering and
    /// export boundary.
    pub fn data_key(&self) -> &str {
        &self.data_key
    }

    pub fn color_index(&self) -> usize {
        self.color_index
    }

    pub fn color(&self) -> &'static PaletteColor {
        &PALETTE[self.color_index]
    }
}

/// Ordered collection of prepared variations.
///
/// Identity is the string id; ids are assumed unique across the catalog (an
/// upstream data-quality assumption — the constructor is total and does not
/// dedupe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationCatalog {
    variations: Vec<Variation>,
}

impl VariationCatalog {
    pub fn new(variations: Vec<Variation>) -> Self {
        Self { variations }
    }

    /// Build the catalog from the snapshot's variation list.
    ///
    /// An absent numeric id falls back to `0`; colors cycle the palette by
    /// input position.
    pub fn from_raw(raw: &[RawVariation]) -> Self {
        let variations = raw
            .iter()
            .enumerate()
            .map(|(index, v)| Variation::new(v.id.unwrap_or(0).to_string(), v.name.clone(), index))
            .collect();
        Self { variations }
    }

    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    pub fn get(&self, id: &str) -> Option<&Variation> {
        self.variations.iter().find(|v| v.id() == id)
    }

    /// All ids in catalog order.
    pub fn ids(&self) -> Vec<String> {
        self.variations.iter().map(|v| v.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.variations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: Option<i64>, name: &str) -> RawVariation {
        RawVariation {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn catalog_assigns_ids_keys_and_colors() {
        let catalog = VariationCatalog::from_raw(&[
            raw(Some(3), "Control"),
            raw(Some(7), "Variant B"),
            raw(None, "Unnamed id"),
        ]);

        let vars = catalog.variations();
        assert_eq!(vars.len(), 3);

        assert_eq!(vars[0].id(), "3");
        assert_eq!(vars[0].data_key(), "v3");
        assert_eq!(vars[0].color().hex, "#4B5563");

        assert_eq!(vars[1].id(), "7");
        assert_eq!(vars[1].data_key(), "v7");
        assert_eq!(vars[1].color().hex, "#2563EB");

        // Absent id falls back to "0" rather than erroring.
        assert_eq!(vars[2].id(), "0");
        assert_eq!(vars[2].data_key(), "v0");
    }

    #[test]
    fn palette_cycles_past_its_length() {
        let raws: Vec<RawVariation> = (0..6).map(|i| raw(Some(i), "v")).collect();
        let catalog = VariationCatalog::from_raw(&raws);

        let vars = catalog.variations();
        assert_eq!(vars[4].color(), vars[0].color());
        assert_eq!(vars[5].color(), vars[1].color());
    }

    #[test]
    fn lookup_by_id() {
        let catalog = VariationCatalog::from_raw(&[raw(Some(1), "A"), raw(Some(2), "B")]);
        assert_eq!(catalog.get("2").map(|v| v.name()), Some("B"));
        assert!(catalog.get("9").is_none());
        assert_eq!(catalog.ids(), vec!["1".to_string(), "2".to_string()]);
    }
}
