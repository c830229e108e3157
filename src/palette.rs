use std::collections::HashMap;

/// Fill used for bars that are not grouped by a secondary attribute
pub const DEFAULT_FILL: &str = "#595959";

/// Categorical colour palette assigned to group keys in order
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<&'static str>,
}

impl ColorPalette {
    /// The ten-colour categorical palette
    pub fn category10() -> Self {
        Self {
            colors: vec![
                "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
                "#7f7f7f", "#bcbd22", "#17becf",
            ],
        }
    }

    /// Colour for the n-th key, cycling when there are more keys than colours
    pub fn color_at(&self, index: usize) -> &'static str {
        self.colors[index % self.colors.len()]
    }

    pub fn assign_colors(&self, keys: &[String]) -> HashMap<String, String> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), self.color_at(i).to_string()))
            .collect()
    }
}

/// Parse `#rrggbb` or a small set of colour names into RGB components
pub fn parse_rgb(color: &str) -> Option<(u8, u8, u8)> {
    if let Some(hex) = color.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        return Some((r, g, b));
    }

    match color.to_ascii_lowercase().as_str() {
        "red" => Some((255, 0, 0)),
        "green" => Some((0, 128, 0)),
        "blue" => Some((0, 0, 255)),
        "black" => Some((0, 0, 0)),
        "white" => Some((255, 255, 255)),
        "yellow" => Some((255, 255, 0)),
        "cyan" => Some((0, 255, 255)),
        "magenta" => Some((255, 0, 255)),
        "gray" | "grey" => Some((128, 128, 128)),
        "steelblue" => Some((70, 130, 180)),
        "orange" => Some((255, 165, 0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_colors() {
        let keys = vec!["0".to_string(), "1".to_string()];
        let map = ColorPalette::category10().assign_colors(&keys);
        assert_eq!(map["0"], "#1f77b4");
        assert_eq!(map["1"], "#ff7f0e");
    }

    #[test]
    fn test_palette_cycles() {
        let palette = ColorPalette::category10();
        assert_eq!(palette.color_at(10), palette.color_at(0));
    }

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_rgb("#ff7f0e"), Some((255, 127, 14)));
        assert_eq!(parse_rgb("steelblue"), Some((70, 130, 180)));
        assert_eq!(parse_rgb("#fff"), None);
        assert_eq!(parse_rgb("chartreuse"), None);
    }
}
