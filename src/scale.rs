use crate::layout::AxisRange;

/// Fraction of the data span added above the tallest bar
const TOP_PADDING: f64 = 0.05;

/// Resolve the value-axis domain and tick breaks for bars reaching `max_top`
pub fn build_value_scale(max_top: f64, explicit: Option<&AxisRange>) -> ((f64, f64), Vec<f64>) {
    if let Some(range) = explicit {
        let step = range.step.unwrap_or_else(|| nice_step(range.max - range.min));
        let breaks = compute_breaks(range.min, range.max, step);
        return ((range.min, range.max), breaks);
    }

    // Bar charts always include 0
    let (min, max) = pad_range(0.0, max_top.max(0.0));
    let step = nice_step(max - min);
    ((min, max), compute_breaks(min, max, step))
}

fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min, max + 1.0)
    } else {
        (min, max + (max - min) * TOP_PADDING)
    }
}

/// A 1/2/5 x 10^k step giving roughly five intervals over `span`
pub fn nice_step(span: f64) -> f64 {
    if !(span > 0.0) || !span.is_finite() {
        return 1.0;
    }
    let raw = span / 5.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Multiples of `step` inside `[min, max]`
fn compute_breaks(min: f64, max: f64, step: f64) -> Vec<f64> {
    let mut breaks = Vec::new();
    if !(step > 0.0) {
        return breaks;
    }
    let first = (min / step).ceil() as i64;
    let last = (max / step + 1e-9).floor() as i64;
    for k in first..=last {
        // Snap away accumulated float noise (0.30000000000000004 -> 0.3)
        let v = (k as f64 * step * 1e9).round() / 1e9;
        breaks.push(v);
    }
    breaks
}
