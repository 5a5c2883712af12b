use std::collections::{BTreeMap, BTreeSet};

use image::Rgb;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Value;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb<u8>> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            // Start at blue so a single series gets the usual chart colour.
            let hue = 210.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            Rgb([
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            ])
        })
        .collect()
}

pub fn to_hex(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("#{r:02x}{g:02x}{b:02x}")
}

// ---------------------------------------------------------------------------
// Color mapping: group value → Rgb
// ---------------------------------------------------------------------------

/// Maps the distinct values of a grouping column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<Value, Rgb<u8>>,
    default_color: Rgb<u8>,
}

impl ColorMap {
    /// Build a colour map for the given column from its unique values.
    pub fn new(column: &str, unique_values: &BTreeSet<Value>) -> Self {
        let palette = generate_palette(unique_values.len());
        let mapping: BTreeMap<Value, Rgb<u8>> = unique_values
            .iter()
            .cloned()
            .zip(palette)
            .collect();

        ColorMap {
            column: column.to_string(),
            mapping,
            default_color: Rgb([128, 128, 128]),
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &Value) -> Rgb<u8> {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Legend entries (value label → hex colour), logged next to the chart.
    pub fn legend_entries(&self) -> Vec<(String, String)> {
        self.mapping
            .iter()
            .map(|(v, c)| (v.to_string(), to_hex(*c)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let colours = generate_palette(6);
        assert_eq!(colours.len(), 6);
        let unique: BTreeSet<[u8; 3]> = colours.iter().map(|c| c.0).collect();
        assert_eq!(unique.len(), 6);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_values_fall_back_to_grey() {
        let values: BTreeSet<Value> = ["Assam", "Bihar"]
            .iter()
            .map(|s| Value::String(s.to_string()))
            .collect();
        let map = ColorMap::new("Region", &values);
        assert_ne!(
            map.color_for(&Value::String("Assam".into())),
            map.color_for(&Value::String("Bihar".into()))
        );
        assert_eq!(map.color_for(&Value::Null), Rgb([128, 128, 128]));
        assert_eq!(map.legend_entries().len(), 2);
        assert!(map.legend_entries()[0].1.starts_with('#'));
    }
}
