use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::CellValue;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// `#rrggbb` for HTML legends.
pub fn to_hex(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the values of one categorical series to distinct colours, in the
/// order the values were given.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<CellValue, Color32>,
    order: Vec<CellValue>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a CellValue>,
    {
        let order: Vec<CellValue> = values.into_iter().cloned().collect();
        let palette = generate_palette(order.len());
        let mapping = order.iter().cloned().zip(palette).collect();

        ColorMap {
            mapping,
            order,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &CellValue) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Same colour as raw RGB, for the report images.
    pub fn rgb_for(&self, value: &CellValue) -> [u8; 3] {
        let c = self.color_for(value);
        [c.r(), c.g(), c.b()]
    }

    /// Return the legend entries (value label → colour) in series order.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.order
            .iter()
            .map(|v| (v.label(), self.color_for(v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let palette = generate_palette(5);
        assert_eq!(palette.len(), 5);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn legend_follows_given_order() {
        let values = [
            CellValue::String("Male".into()),
            CellValue::String("Female".into()),
            CellValue::Null,
        ];
        let map = ColorMap::new(&values);
        let labels: Vec<_> = map.legend_entries().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Male", "Female", "<missing>"]);
        assert_eq!(
            map.color_for(&CellValue::String("Other".into())),
            Color32::GRAY
        );
    }

    #[test]
    fn hex_format() {
        assert_eq!(to_hex(Color32::from_rgb(255, 0, 16)), "#ff0010");
    }
}
