use image::DynamicImage;
use imageproc::geometry::arc_length;
use imageproc::point::Point;
use std::fmt;

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Grow by `margin` on every side, clamped to a `max_width` x `max_height` image.
    /// Returns `None` when nothing of the box remains inside the image.
    pub fn expand_within(&self, margin: u32, max_width: u32, max_height: u32) -> Option<BoundingBox> {
        let x = self.x.saturating_sub(margin);
        let y = self.y.saturating_sub(margin);
        let right = (self.x + self.width + margin).min(max_width);
        let bottom = (self.y + self.height + margin).min(max_height);

        if right <= x || bottom <= y {
            return None;
        }
        Some(BoundingBox::new(x, y, right - x, bottom - y))
    }
}

/// External border of a connected region.
#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Contour {
    /// Build a contour from its border points. Returns `None` for an empty border.
    pub fn from_points(points: Vec<Point<i32>>) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            points,
            min_x: min_x.max(0) as u32,
            min_y: min_y.max(0) as u32,
            max_x: max_x.max(0) as u32,
            max_y: max_y.max(0) as u32,
        })
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Inclusive bounding rectangle.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.min_x, self.min_y, self.width(), self.height())
    }

    /// Area enclosed by the border polygon (shoelace formula).
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    pub fn perimeter(&self) -> f64 {
        arc_length(&self.points, true)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.bounds().aspect_ratio()
    }
}

/// Absolute area of a closed polygon.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice_area as f64 / 2.0).abs()
}

/// A rectangle plus the pixels it bounds.
#[derive(Debug, Clone)]
pub struct Roi {
    pub bbox: BoundingBox,
    pub image: DynamicImage,
}

/// Card issuing scheme inferred from the leading digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardNetwork {
    AmericanExpress,
    Visa,
    MasterCard,
    Discover,
}

impl CardNetwork {
    pub fn from_leading_digit(digit: char) -> Option<Self> {
        match digit {
            '3' => Some(CardNetwork::AmericanExpress),
            '4' => Some(CardNetwork::Visa),
            '5' => Some(CardNetwork::MasterCard),
            '6' => Some(CardNetwork::Discover),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CardNetwork::AmericanExpress => "American Express",
            CardNetwork::Visa => "Visa",
            CardNetwork::MasterCard => "MasterCard",
            CardNetwork::Discover => "Discover Card",
        }
    }
}

impl fmt::Display for CardNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardReading {
    pub network: CardNetwork,
    pub digits: String,
}

/// Outcome of assembling the recognized digits of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembly {
    /// Fewer or more than 16 digits were recognized.
    NotFound,
    Recognized(CardReading),
    /// 16 digits were read but the leading digit maps to no known network.
    UnrecognizedNetwork { digits: String, leading: char },
}

impl Assembly {
    /// True when a full 16-digit number was read, whatever its network.
    pub fn found(&self) -> bool {
        !matches!(self, Assembly::NotFound)
    }

    pub fn digits(&self) -> Option<&str> {
        match self {
            Assembly::NotFound => None,
            Assembly::Recognized(reading) => Some(&reading.digits),
            Assembly::UnrecognizedNetwork { digits, .. } => Some(digits),
        }
    }

    pub fn network_label(&self) -> Option<&'static str> {
        match self {
            Assembly::Recognized(reading) => Some(reading.network.label()),
            _ => None,
        }
    }
}
