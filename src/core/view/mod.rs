//! Live view parameters shared by every coordinate conversion.

pub mod mapper;

pub use mapper::CoordinateMapper;

pub const DEFAULT_ZOOM_X: f64 = 0.1;
pub const DEFAULT_ZOOM_Y: f64 = 1.0;
pub const MIN_ZOOM_X: f64 = 0.01;
pub const MAX_ZOOM_X: f64 = 0.5;
/// Zoom change per unit of wheel delta on a pinch gesture.
pub const PINCH_ZOOM_STEP: f64 = 0.001;

/// Per-session view: world-time origin plus horizontal and vertical scale.
///
/// Never cached by readers; every conversion goes through a fresh
/// [`CoordinateMapper`] borrow so zoom and pan apply on the next call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub base_time: i64,
    zoom_x: f64,
    zoom_y: f64,
}

impl ViewState {
    pub fn new(base_time: i64) -> Self {
        Self {
            base_time,
            zoom_x: DEFAULT_ZOOM_X,
            zoom_y: DEFAULT_ZOOM_Y,
        }
    }

    pub fn with_zoom(base_time: i64, zoom_x: f64, zoom_y: f64) -> Self {
        let mut view = Self::new(base_time);
        view.set_zoom_x(zoom_x);
        view.set_zoom_y(zoom_y);
        view
    }

    pub fn zoom_x(&self) -> f64 {
        self.zoom_x
    }

    pub fn zoom_y(&self) -> f64 {
        self.zoom_y
    }

    /// Unusable values (zero, negative, NaN) reset to the default scale.
    pub fn set_zoom_x(&mut self, value: f64) {
        self.zoom_x = sanitize_scale(value, DEFAULT_ZOOM_X);
    }

    pub fn set_zoom_y(&mut self, value: f64) {
        self.zoom_y = sanitize_scale(value, DEFAULT_ZOOM_Y);
    }

    /// Apply a pinch gesture and return the new, clamped horizontal scale.
    pub fn pinch(&mut self, wheel_delta_y: f64) -> f64 {
        let next = clamp_zoom_x(self.zoom_x - wheel_delta_y * PINCH_ZOOM_STEP);
        self.zoom_x = next;
        next
    }

    pub fn mapper(&self) -> CoordinateMapper<'_> {
        CoordinateMapper::new(self)
    }
}

pub fn clamp_zoom_x(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_ZOOM_X, MAX_ZOOM_X)
    } else {
        DEFAULT_ZOOM_X
    }
}

fn sanitize_scale(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { default }
}

/// Size of the interaction surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Pixel offset of a surface-relative point from the surface center.
    pub fn offset_from_center(&self, x: f64, y: f64) -> (f64, f64) {
        let (cx, cy) = self.center();
        (x - cx, y - cy)
    }
}
