use crate::Point;
use crate::config::{SceneConfig, ViewportRect};

/// Maps unit-space scene coordinates to window (scene) pixels.
pub trait ViewportMapper {
    fn scale_unit_point_to_world(&self, unit_point: Point) -> Point;
}

/// Fixed linear mapping, `unit * size + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedViewport {
    pub size: Point,
    pub offset: Point,
}

impl FixedViewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Point::new(width, height),
            offset: Point::ZERO,
        }
    }
}

impl ViewportMapper for FixedViewport {
    fn scale_unit_point_to_world(&self, unit_point: Point) -> Point {
        unit_point * self.size + self.offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FillDimension {
    Width,
    Height,
}

/// Cover-fits the background image into a window so that a chosen viewport
/// rectangle of it fills the window's constraining dimension.
///
/// The image is scaled so the viewport rectangle spans the full window width
/// (or height), centred along the other axis, then nudged back so the
/// centring never clips the viewport rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    image_aspect_ratio: f64,
    viewport_aspect_ratio: f64,
    top_left: Point,
    bottom_right: Point,
    window: Point,
    /// Displayed size of the whole image
    size: Point,
    /// Window position of the image's top-left corner
    offset: Point,
}

impl Viewport {
    pub fn new(
        image_aspect_ratio: f64,
        rect: ViewportRect,
        viewport_aspect_ratio: f64,
        window_width: f64,
        window_height: f64,
    ) -> Self {
        let mut viewport = Self {
            image_aspect_ratio,
            viewport_aspect_ratio,
            top_left: Point::from_array(rect.top_left),
            bottom_right: Point::from_array(rect.bottom_right),
            window: Point::ZERO,
            size: Point::ZERO,
            offset: Point::ZERO,
        };
        viewport.resize(window_width, window_height);
        viewport
    }

    pub fn for_scene(config: &SceneConfig, window_width: f64, window_height: f64) -> Self {
        let aspect = config.source_aspect_ratio();
        Self::new(aspect, config.viewport, aspect, window_width, window_height)
    }

    pub fn window(&self) -> Point {
        self.window
    }

    /// Displayed size of the whole image.
    pub fn image_size(&self) -> Point {
        self.size
    }

    pub fn image_offset(&self) -> Point {
        self.offset
    }

    /// Recompute the mapping for a new window size.
    pub fn resize(&mut self, window_width: f64, window_height: f64) {
        self.window = Point::new(window_width, window_height);
        if !(window_width > 0.0 && window_height > 0.0) {
            self.size = Point::ZERO;
            self.offset = Point::ZERO;
            return;
        }

        let window_aspect_ratio = window_width / window_height;
        let span = self.bottom_right - self.top_left;

        let fill = if window_aspect_ratio < self.viewport_aspect_ratio {
            FillDimension::Width
        } else {
            FillDimension::Height
        };

        match fill {
            FillDimension::Width => {
                let width = window_width / span.x;
                let height = width / self.image_aspect_ratio;
                let size = Point::new(width, height);

                let top_left = size * self.top_left;
                let bottom_right = size * self.bottom_right;

                let center = (window_height - height) / 2.0;
                let correction = -(bottom_right.y + center - window_height).max(0.0)
                    + (top_left.y + center).min(0.0).abs();

                self.size = size;
                self.offset = Point::new(-top_left.x, center + correction);
            }
            FillDimension::Height => {
                let height = window_height / span.y;
                let width = height * self.image_aspect_ratio;
                let size = Point::new(width, height);

                let top_left = size * self.top_left;
                let bottom_right = size * self.bottom_right;

                let center = (window_width - width) / 2.0;
                let correction = -(bottom_right.x + center - window_width).max(0.0)
                    + (top_left.x + center).min(0.0).abs();

                self.size = size;
                self.offset = Point::new(center + correction, -top_left.y);
            }
        }
    }
}

impl ViewportMapper for Viewport {
    fn scale_unit_point_to_world(&self, unit_point: Point) -> Point {
        unit_point * self.size + self.offset
    }
}
