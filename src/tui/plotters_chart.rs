//! Plotters-powered line chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//! - easy to extend later (legend, annotations, exportable PNG/SVG backends, etc.)
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A lightweight, render-only chart description.
///
/// The widget is intentionally data-driven: all series and bounds are computed
/// outside the render call, so the tab-switching code can be tested without a
/// terminal.
pub struct MarketPlottersChart<'a> {
    /// Main line series (daily averages, hourly profile, ...).
    pub primary: &'a [(f64, f64)],
    /// Optional companion series (moving average, off-peak, ...). Empty = none.
    pub secondary: &'a [(f64, f64)],
    /// Optional horizontal reference line (threshold, zero).
    pub baseline: Option<f64>,
    /// X bounds (day index, hour, or month index depending on the tab).
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: String,
    /// Formatting of tick labels.
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for MarketPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        // `plotters-ratatui-backend` draws Plotters primitives via Ratatui's
        // `Canvas` widget, which ultimately writes to the terminal buffer.
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Axes + tick labels; mesh lines disabled to reduce clutter in
            // low-resolution terminal rendering.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(&self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // High-contrast palette for terminal readability.
            let primary_color = RGBColor(0, 255, 255); // cyan
            let secondary_color = RGBColor(0, 255, 0); // green
            let baseline_color = RGBColor(255, 0, 0); // red

            if let Some(y) = self.baseline {
                if y > y0 && y < y1 {
                    chart.draw_series(LineSeries::new(
                        [(x0, y), (x1, y)].into_iter(),
                        &baseline_color,
                    ))?;
                }
            }

            chart.draw_series(LineSeries::new(self.primary.iter().copied(), &primary_color))?;

            if !self.secondary.is_empty() {
                chart.draw_series(LineSeries::new(
                    self.secondary.iter().copied(),
                    &secondary_color,
                ))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
