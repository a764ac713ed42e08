use crate::figure::{Color, Figure, Layer, Point};
use std::io;
use std::{fs::File, io::Write, path::Path};

const PLOT_WIDTH: f64 = 1000.0;
const PLOT_HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 55.0;

pub fn generate(figure: &Figure, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut generator = Generator::new(figure, file);
    generator.generate(figure)
}

struct Generator {
    x_range: (f64, f64),
    y_range: (f64, f64),
    file: File,
}

impl Generator {
    fn new(figure: &Figure, file: File) -> Self {
        let (x_range, y_range) = figure.bounds();
        Self {
            x_range,
            y_range,
            file,
        }
    }

    fn generate(&mut self, figure: &Figure) -> io::Result<()> {
        self.start_svg()?;
        self.add_background()?;
        self.add_axes(figure)?;
        for layer in &figure.layers {
            match layer {
                Layer::Bars {
                    points,
                    width,
                    color,
                } => self.plot_bars(points, *width, color)?,
                Layer::Line { points, color } => self.plot_line(points, color)?,
                Layer::Markers { points, color } => self.plot_markers(points, color)?,
            }
        }
        self.add_title(&figure.title)?;
        self.end_svg()
    }

    fn to_x(&self, x: f64) -> f64 {
        let span = self.x_range.1 - self.x_range.0;
        MARGIN_LEFT + (x - self.x_range.0) / span * (PLOT_WIDTH - MARGIN_LEFT - MARGIN_RIGHT)
    }

    fn to_y(&self, y: f64) -> f64 {
        let span = self.y_range.1 - self.y_range.0;
        PLOT_HEIGHT
            - MARGIN_BOTTOM
            - (y - self.y_range.0) / span * (PLOT_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM)
    }

    fn plot_bars(&mut self, points: &[Point], width: f64, color: &Color) -> io::Result<()> {
        let baseline = self.to_y(self.y_range.0.max(0.0));
        for point in points {
            let x = self.to_x(point.x - width / 2.0);
            let w = self.to_x(point.x + width / 2.0) - x;
            let y = self.to_y(point.y);
            let h = (baseline - y).max(0.0);
            writeln!(
                self.file,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" />"#,
                x, y, w, h, color
            )?;
        }
        Ok(())
    }

    fn plot_line(&mut self, points: &[Point], color: &Color) -> io::Result<()> {
        let coords = points
            .iter()
            .map(|p| format!("{:.2},{:.2}", self.to_x(p.x), self.to_y(p.y)))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            self.file,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="1.5" />"#,
            coords, color
        )
    }

    fn plot_markers(&mut self, points: &[Point], color: &Color) -> io::Result<()> {
        for point in points {
            writeln!(
                self.file,
                r#"<circle cx="{:.2}" cy="{:.2}" r="4" fill="{}" />"#,
                self.to_x(point.x),
                self.to_y(point.y),
                color
            )?;
        }
        Ok(())
    }

    fn add_axes(&mut self, figure: &Figure) -> io::Result<()> {
        let x0 = MARGIN_LEFT;
        let x1 = PLOT_WIDTH - MARGIN_RIGHT;
        let y0 = PLOT_HEIGHT - MARGIN_BOTTOM;
        let y1 = MARGIN_TOP;
        writeln!(
            self.file,
            r#"<line x1="{x0}" y1="{y0}" x2="{x1}" y2="{y0}" stroke="black" stroke-width="1" />"#
        )?;
        writeln!(
            self.file,
            r#"<line x1="{x0}" y1="{y0}" x2="{x0}" y2="{y1}" stroke="black" stroke-width="1" />"#
        )?;

        for frac in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let x_value = self.x_range.0 + frac * (self.x_range.1 - self.x_range.0);
            let y_value = self.y_range.0 + frac * (self.y_range.1 - self.y_range.0);
            let x = self.to_x(x_value);
            let y = self.to_y(y_value);
            writeln!(
                self.file,
                r#"<line x1="{x:.2}" y1="{y0}" x2="{x:.2}" y2="{}" stroke="black" stroke-width="1" />"#,
                y0 + 5.0
            )?;
            writeln!(
                self.file,
                r#"<text x="{x:.2}" y="{}" font-family="monospace" font-size="12px" text-anchor="middle">{}</text>"#,
                y0 + 20.0,
                format_tick(x_value)
            )?;
            writeln!(
                self.file,
                r#"<line x1="{}" y1="{y:.2}" x2="{x0}" y2="{y:.2}" stroke="black" stroke-width="1" />"#,
                x0 - 5.0
            )?;
            writeln!(
                self.file,
                r#"<text x="{}" y="{:.2}" font-family="monospace" font-size="12px" text-anchor="end">{}</text>"#,
                x0 - 8.0,
                y + 4.0,
                format_tick(y_value)
            )?;
        }

        writeln!(
            self.file,
            r#"<text x="{:.2}" y="{:.2}" font-family="monospace" font-size="14px" text-anchor="middle">{}</text>"#,
            (x0 + x1) / 2.0,
            PLOT_HEIGHT - 12.0,
            figure.x_label
        )?;
        writeln!(
            self.file,
            r#"<text x="16" y="{:.2}" font-family="monospace" font-size="14px" text-anchor="middle" transform="rotate(-90 16 {:.2})">{}</text>"#,
            (y0 + y1) / 2.0,
            (y0 + y1) / 2.0,
            figure.y_label
        )
    }

    fn add_title(&mut self, title: &str) -> io::Result<()> {
        writeln!(
            self.file,
            r#"<text x="{:.2}" y="24" font-family="monospace" font-size="16px" font-weight="bold" text-anchor="middle">{}</text>"#,
            PLOT_WIDTH / 2.0,
            title
        )
    }

    fn add_background(&mut self) -> io::Result<()> {
        writeln!(
            self.file,
            r#"<rect width="100%" height="100%" fill="white" />"#
        )
    }

    fn start_svg(&mut self) -> io::Result<()> {
        writeln!(
            self.file,
            "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">",
            PLOT_WIDTH, PLOT_HEIGHT
        )
    }

    fn end_svg(&mut self) -> io::Result<()> {
        writeln!(self.file, "</svg>")
    }
}

fn format_tick(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e6 {
        format!("{}", value as i64)
    } else {
        format!("{:.3}", value)
    }
}
