//! Plotters-powered multi-series indicator chart for Ratatui.
//!
//! Plotters output is rendered into the Ratatui buffer through
//! `plotters-ratatui-backend`. All series and bounds are computed beforehand
//! (see `reshape`), so `render()` only draws.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use super::reshape::ChartSpec;

/// High-contrast palette; series cycle through it in selection order.
pub const PALETTE: [RGBColor; 8] = [
    RGBColor(0, 255, 255),
    RGBColor(255, 255, 0),
    RGBColor(0, 255, 0),
    RGBColor(255, 0, 255),
    RGBColor(255, 128, 0),
    RGBColor(128, 160, 255),
    RGBColor(255, 0, 0),
    RGBColor(255, 255, 255),
];

/// Ratatui color matching `PALETTE[idx]`, for the selection list.
pub fn series_color(idx: usize) -> Color {
    let RGBColor(r, g, b) = PALETTE[idx % PALETTE.len()];
    Color::Rgb(r, g, b)
}

pub struct IndicatorChart<'a> {
    pub spec: &'a ChartSpec,
    pub x_label: &'a str,
}

impl<'a> Widget for IndicatorChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.spec.x_bounds;
        let [y0, y1] = self.spec.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let spec = self.spec;
        let x_label = self.x_label;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(x_label)
                .x_labels(6)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.0}"))
                .y_label_formatter(&|v| fmt_axis_y(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for (idx, series) in spec.series.iter().enumerate() {
                let color = PALETTE[idx % PALETTE.len()];
                chart
                    .draw_series(LineSeries::new(series.points.iter().copied(), color))?
                    .label(series.name.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 12, y)], color));
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .label_font(("sans-serif", 10).into_font().color(&WHITE))
                .border_style(&WHITE)
                .draw()?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

// Indicators span from ratios (~0.1) to revenues (~1e11).
fn fmt_axis_y(v: f64) -> String {
    let a = v.abs();
    if a >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e3 {
        format!("{:.1}k", v / 1e3)
    } else {
        format!("{v:.2}")
    }
}
