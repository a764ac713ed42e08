pub type Color = String;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug)]
pub enum Layer {
    /// Vertical bars centered on each point's x coordinate
    Bars {
        points: Vec<Point>,
        width: f64,
        color: Color,
    },
    /// Connected polyline through the points
    Line { points: Vec<Point>, color: Color },
    /// Circular markers at the points
    Markers { points: Vec<Point>, color: Color },
}

#[derive(Debug)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub layers: Vec<Layer>,
}

impl Figure {
    pub fn new(title: &str, x_label: &str, y_label: &str) -> Self {
        Figure {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            layers: Vec::new(),
        }
    }

    /// Bounding box over all layer points as ((x_min, x_max), (y_min, y_max))
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        let mut x_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for layer in &self.layers {
            let (points, half_width) = match layer {
                Layer::Bars { points, width, .. } => (points, width / 2.0),
                Layer::Line { points, .. } => (points, 0.0),
                Layer::Markers { points, .. } => (points, 0.0),
            };
            for point in points {
                x_min = x_min.min(point.x - half_width);
                x_max = x_max.max(point.x + half_width);
                y_min = y_min.min(point.y.min(0.0));
                y_max = y_max.max(point.y);
            }
        }
        if x_min > x_max {
            ((0.0, 1.0), (0.0, 1.0))
        } else if y_max == y_min {
            ((x_min, x_max), (y_min, y_min + 1.0))
        } else {
            ((x_min, x_max), (y_min, y_max))
        }
    }
}
