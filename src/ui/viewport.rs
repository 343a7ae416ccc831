/// Zoom and pan state for the image canvas
///
/// The image is drawn centred in the canvas, shifted by `offset` and
/// scaled by `scale`. All positions are canvas-local.

use cgmath::{Vector2, Zero};
use iced::{Point, Rectangle, Size};

/// Smallest allowed zoom
pub const MIN_SCALE: f32 = 0.1;
/// Largest allowed zoom
pub const MAX_SCALE: f32 = 10.0;
/// Zoom change per unit of scroll
pub const ZOOM_SENSITIVITY: f32 = 0.0025;
/// Total inset kept free around a fitted image (2 px per side for the border)
pub const FIT_MARGIN: f32 = 4.0;
/// Size changes at or below this are ignored
const RESIZE_THRESHOLD: f32 = 1.0;

/// Input events produced by the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Scroll by `delta` (positive zooms in) with the cursor at `cursor`
    Zoom { delta: f32, cursor: Point },
    DragStart(Point),
    DragMove(Point),
    DragEnd,
    /// The canvas was laid out with a new size
    Resized(Size),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    /// Pan offset in canvas pixels
    pub offset: Vector2<f32>,
    image_size: Option<Size>,
    view_size: Size,
    /// Last pointer position while a drag is active
    drag_from: Option<Point>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vector2::zero(),
            image_size: None,
            view_size: Size::ZERO,
            drag_from: None,
        }
    }
}

/// Scale that fits `image` inside `view` minus the margin
///
/// `None` when either size is degenerate or nothing would be visible.
pub fn fit_scale(image: Size, view: Size) -> Option<f32> {
    if image.width <= 0.0 || image.height <= 0.0 || view.width <= 0.0 || view.height <= 0.0 {
        return None;
    }
    let scale = ((view.width - FIT_MARGIN) / image.width)
        .min((view.height - FIT_MARGIN) / image.height);
    (scale > 0.0).then(|| scale.clamp(MIN_SCALE, MAX_SCALE))
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Show a different image (or none) and fit it
    pub fn set_image(&mut self, size: Option<Size>) {
        self.image_size = size;
        self.drag_from = None;
        self.reset_to_fit();
    }

    /// Fit the image to the canvas and centre it
    ///
    /// No-op while there is no image or the canvas has no area.
    pub fn reset_to_fit(&mut self) {
        let Some(image) = self.image_size else {
            return;
        };
        if let Some(scale) = fit_scale(image, self.view_size) {
            self.scale = scale;
            self.offset = Vector2::zero();
        }
    }

    /// True when `size` differs from the current canvas size by more than
    /// the resize threshold on either axis
    pub fn needs_resize(&self, size: Size) -> bool {
        (size.width - self.view_size.width).abs() > RESIZE_THRESHOLD
            || (size.height - self.view_size.height).abs() > RESIZE_THRESHOLD
    }

    /// Record a new canvas size; refits when it changed noticeably
    pub fn resize(&mut self, size: Size) -> bool {
        if !self.needs_resize(size) {
            return false;
        }
        self.view_size = size;
        self.reset_to_fit();
        true
    }

    fn center(&self) -> Point {
        Point::new(self.view_size.width / 2.0, self.view_size.height / 2.0)
    }

    /// Zoom by a scroll amount, keeping the image point under `cursor` fixed
    pub fn zoom(&mut self, delta: f32, cursor: Point) {
        let factor = 1.0 + delta * ZOOM_SENSITIVITY;
        let old_scale = self.scale;
        let new_scale = (old_scale * factor).clamp(MIN_SCALE, MAX_SCALE);

        // Cursor position in image space, relative to the image centre
        let center = self.center();
        let anchor = Vector2::new(
            (cursor.x - center.x - self.offset.x) / old_scale,
            (cursor.y - center.y - self.offset.y) / old_scale,
        );

        self.scale = new_scale;
        self.offset -= anchor * (new_scale - old_scale);
    }

    pub fn drag_start(&mut self, position: Point) {
        self.drag_from = Some(position);
    }

    /// Pan by the pointer movement since the last drag event
    pub fn drag_move(&mut self, position: Point) -> bool {
        let Some(last) = self.drag_from else {
            return false;
        };
        self.offset += Vector2::new(position.x - last.x, position.y - last.y);
        self.drag_from = Some(position);
        true
    }

    pub fn drag_end(&mut self) {
        self.drag_from = None;
    }

    pub fn apply(&mut self, event: Event) {
        match event {
            Event::Zoom { delta, cursor } => self.zoom(delta, cursor),
            Event::DragStart(position) => self.drag_start(position),
            Event::DragMove(position) => {
                self.drag_move(position);
            }
            Event::DragEnd => self.drag_end(),
            Event::Resized(size) => {
                self.resize(size);
            }
        }
    }

    /// Where the image lands in the canvas
    ///
    /// Equivalent to translating to centre + offset, scaling, then
    /// translating by minus half the image size.
    pub fn image_rect(&self) -> Option<Rectangle> {
        let image = self.image_size?;
        let width = image.width * self.scale;
        let height = image.height * self.scale;
        let center = self.center();
        Some(Rectangle {
            x: center.x + self.offset.x - width / 2.0,
            y: center.y + self.offset.y - height / 2.0,
            width,
            height,
        })
    }
}
