use crate::ir::{ChartBar, ChartScene};
use crate::layout::format_value;
use crate::palette::{parse_rgb, DEFAULT_FILL};
use crate::{OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

/// Canvas that turns a laid-out chart scene into encoded image bytes
pub struct Canvas {
    width: u32,
    height: u32,
    format: OutputFormat,
}

impl Canvas {
    pub fn new(options: &RenderOptions) -> Result<Self> {
        if options.width == 0 || options.height == 0 {
            anyhow::bail!(
                "Canvas size must be positive (got {}x{})",
                options.width,
                options.height
            );
        }
        Ok(Canvas {
            width: options.width,
            height: options.height,
            format: options.format.clone(),
        })
    }

    /// Draw the scene and encode it in the configured output format
    pub fn render(&self, scene: &ChartScene) -> Result<Vec<u8>> {
        match self.format {
            OutputFormat::Png => self.render_png(scene),
            OutputFormat::Svg => self.render_svg(scene),
        }
    }

    fn render_png(&self, scene: &ChartScene) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; buffer_len(self.width, self.height)];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height))
                .into_drawing_area();
            draw_scene(&root, scene)?;
            root.present().context("Failed to present drawing")?;
        }

        let mut png_bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, self.width, self.height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;

        Ok(png_bytes)
    }

    fn render_svg(&self, scene: &ChartScene) -> Result<Vec<u8>> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            draw_scene(&root, scene)?;
            root.present().context("Failed to present drawing")?;
        }
        Ok(svg.into_bytes())
    }
}

fn draw_scene<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &ChartScene) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    let primary = scene.primary_axis.range.0..scene.primary_axis.range.1;
    let value = scene.value_axis.range.0..scene.value_axis.range.1;
    let (x_range, y_range) = if scene.flipped {
        (value, primary)
    } else {
        (primary, value)
    };

    let mut builder = ChartBuilder::on(root);
    builder.margin(10).x_label_area_size(40).y_label_area_size(60);
    if let Some(title) = &scene.title {
        builder.caption(title, ("sans-serif", 20));
    }
    let mut chart = builder
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")?;

    let categories = &scene.primary_axis.categories;
    let category_formatter = |v: &f64| {
        let slot = v.round();
        if (v - slot).abs() > 1e-6 || slot < 0.0 {
            return String::new();
        }
        categories.get(slot as usize).cloned().unwrap_or_default()
    };
    let value_axis = &scene.value_axis;
    let value_formatter = |v: &f64| {
        value_axis
            .breaks
            .iter()
            .position(|b| (b - v).abs() < 1e-9)
            .and_then(|i| value_axis.tick_labels.get(i).cloned())
            .unwrap_or_else(|| format_value(*v, value_axis.format, 2))
    };

    // Twice as many primary ticks as slots so every slot centre gets one
    let category_ticks = categories.len() * 2 + 1;
    let value_ticks = value_axis.breaks.len().max(2);
    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh();
    if scene.flipped {
        mesh.x_labels(value_ticks)
            .x_label_formatter(&value_formatter)
            .x_desc(value_axis.title.as_str())
            .y_labels(category_ticks)
            .y_label_formatter(&category_formatter)
            .y_desc(scene.primary_axis.title.as_str());
    } else {
        mesh.x_labels(category_ticks)
            .x_label_formatter(&category_formatter)
            .x_desc(scene.primary_axis.title.as_str())
            .y_labels(value_ticks)
            .y_label_formatter(&value_formatter)
            .y_desc(value_axis.title.as_str());
    }
    mesh.draw().context("Failed to draw mesh")?;

    let flipped = scene.flipped;
    let alpha = scene.alpha;
    let bar_rect = move |bar: &ChartBar| {
        let (tl, br) = bar.rect(flipped);
        Rectangle::new([tl, br], to_rgb(&bar.fill).mix(alpha).filled())
    };

    match &scene.legend {
        Some(legend) => {
            for entry in &legend.entries {
                let color = to_rgb(&entry.fill);
                chart
                    .draw_series(
                        scene
                            .bars
                            .iter()
                            .filter(|b| b.secondary.as_deref() == Some(entry.label.as_str()))
                            .map(bar_rect),
                    )
                    .context("Failed to draw bars")?
                    .label(entry.label.clone())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
            }
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .context("Failed to draw legend")?;
        }
        None => {
            chart
                .draw_series(scene.bars.iter().map(bar_rect))
                .context("Failed to draw bars")?;
        }
    }

    let label_style = TextStyle::from(("sans-serif", 12).into_font()).pos(if flipped {
        Pos::new(HPos::Left, VPos::Center)
    } else {
        Pos::new(HPos::Center, VPos::Bottom)
    });
    chart
        .draw_series(scene.bars.iter().filter_map(|bar| {
            let text = bar.label.clone()?;
            Some(Text::new(text, label_anchor(bar, flipped), label_style.clone()))
        }))
        .context("Failed to draw value labels")?;

    Ok(())
}

/// Bytes in an RGB8 buffer of the given size
fn buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

/// Where a bar's value label sits: just past its top edge
fn label_anchor(bar: &ChartBar, flipped: bool) -> (f64, f64) {
    if flipped {
        (bar.top(), bar.center)
    } else {
        (bar.center, bar.top())
    }
}

fn to_rgb(fill: &str) -> RGBColor {
    let (r, g, b) = parse_rgb(fill)
        .or_else(|| parse_rgb(DEFAULT_FILL))
        .unwrap_or((89, 89, 89));
    RGBColor(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, AggregationMode};
    use crate::layout::{plan, ArrangementPolicy, LayoutOptions, OrderingPolicy};
    use crate::mtcars;

    fn scene(secondary: Option<&str>, arrangement: ArrangementPolicy, flip: bool) -> ChartScene {
        let data = mtcars::dataset().unwrap();
        let table = aggregate(&data, "cyl", secondary, AggregationMode::Count).unwrap();
        let options = LayoutOptions {
            flip,
            show_value_labels: true,
            ..Default::default()
        };
        plan(&table, OrderingPolicy::DatasetOrder, arrangement, &options).unwrap()
    }

    #[test]
    fn test_render_png_magic() {
        let canvas = Canvas::new(&RenderOptions::default()).unwrap();
        let bytes = canvas.render(&scene(None, ArrangementPolicy::None, false)).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_render_svg_grouped() {
        let options = RenderOptions {
            format: OutputFormat::Svg,
            ..Default::default()
        };
        let canvas = Canvas::new(&options).unwrap();
        let bytes = canvas
            .render(&scene(Some("am"), ArrangementPolicy::Dodged, true))
            .unwrap();
        let svg = String::from_utf8(bytes).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<rect"));
    }

    #[test]
    fn test_zero_size_canvas() {
        let options = RenderOptions {
            width: 0,
            ..Default::default()
        };
        assert!(Canvas::new(&options).is_err());
    }

    #[test]
    fn test_label_anchor_follows_flip() {
        let s = scene(None, ArrangementPolicy::None, false);
        let bar = &s.bars[0];
        assert_eq!(label_anchor(bar, false), (bar.center, bar.top()));
        assert_eq!(label_anchor(bar, true), (bar.top(), bar.center));
    }

    #[test]
    fn test_buffer_len_does_not_wrap() {
        assert_eq!(buffer_len(800, 600), 1_440_000);
        assert_eq!(buffer_len(40_000, 40_000), 4_800_000_000);
    }

    #[test]
    fn test_to_rgb_fallback() {
        assert_eq!(to_rgb("#ff0000"), RGBColor(255, 0, 0));
        assert_eq!(to_rgb("not-a-colour"), RGBColor(89, 89, 89));
    }
}
