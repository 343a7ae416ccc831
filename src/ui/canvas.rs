use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use super::viewport::{Event, Viewport};
use crate::dataset::preview::LoadedImage;
use crate::Message;

/// Pixels of zoom input per scroll-wheel line
const PIXELS_PER_LINE: f32 = 40.0;

const BORDER_COLOR: Color = Color {
    r: 0.5,
    g: 0.5,
    b: 0.5,
    a: 1.0,
};

/// Canvas that draws the selected image with zoom and pan
///
/// The viewport lives in the application state; this program only turns
/// mouse input into viewport events.
pub struct ImageCanvas<'a> {
    pub image: &'a LoadedImage,
    pub viewport: &'a Viewport,
}

impl<'a> ImageCanvas<'a> {
    fn map_mouse(&self, event: mouse::Event, bounds: Rectangle, cursor: Cursor) -> Option<Event> {
        match event {
            // Mouse wheel for zooming
            mouse::Event::WheelScrolled { delta } => {
                let position = cursor.position_in(bounds)?;
                let delta = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => y * PIXELS_PER_LINE,
                    mouse::ScrollDelta::Pixels { y, .. } => y,
                };
                Some(Event::Zoom { delta, cursor: position })
            }

            // Mouse button press - start dragging
            mouse::Event::ButtonPressed(mouse::Button::Left) => {
                cursor.position_in(bounds).map(Event::DragStart)
            }

            // Mouse button release - stop dragging
            mouse::Event::ButtonReleased(mouse::Button::Left) => {
                self.viewport.is_dragging().then_some(Event::DragEnd)
            }

            // Mouse move - pan if dragging, even outside the canvas
            mouse::Event::CursorMoved { .. } if self.viewport.is_dragging() => {
                cursor.position_from(bounds.position()).map(Event::DragMove)
            }

            _ => None,
        }
    }
}

impl<'a> Program<Message> for ImageCanvas<'a> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let size = bounds.size();
        let mut frame = canvas::Frame::new(renderer, size);

        // The resize event may not have arrived yet; draw fitted to the real bounds
        let mut fitted;
        let viewport = if self.viewport.needs_resize(size) {
            fitted = self.viewport.clone();
            fitted.resize(size);
            &fitted
        } else {
            self.viewport
        };

        let clip = Rectangle {
            x: 1.0,
            y: 1.0,
            width: (size.width - 2.0).max(0.0),
            height: (size.height - 2.0).max(0.0),
        };

        if let Some(target) = viewport.image_rect() {
            frame.with_clip(clip, |frame| {
                // Coordinates inside the clip are relative to its top-left corner
                let target = Rectangle {
                    x: target.x - clip.x,
                    y: target.y - clip.y,
                    ..target
                };
                frame.draw_image(target, &self.image.handle);
            });
        }

        let border = Path::rectangle(
            Point::new(0.5, 0.5),
            Size::new((size.width - 1.0).max(0.0), (size.height - 1.0).max(0.0)),
        );
        frame.stroke(
            &border,
            Stroke::default().with_color(BORDER_COLOR).with_width(1.0),
        );

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        let canvas::Event::Mouse(event) = event else {
            return (canvas::event::Status::Ignored, None);
        };

        // The resize goes first so the mouse event sees the new layout
        let mut events = Vec::with_capacity(2);
        if self.viewport.needs_resize(bounds.size()) {
            events.push(Event::Resized(bounds.size()));
        }

        let status = match self.map_mouse(event, bounds, cursor) {
            Some(event) => {
                events.push(event);
                canvas::event::Status::Captured
            }
            None => canvas::event::Status::Ignored,
        };

        let message = (!events.is_empty()).then(|| Message::Viewport(events));
        (status, message)
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if self.viewport.is_dragging() {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::widget::image::Handle;

    fn image() -> LoadedImage {
        LoadedImage {
            handle: Handle::from_rgba(1, 1, vec![0u8; 4]),
            size: Size::new(800.0, 600.0),
        }
    }

    fn viewport_events(message: Option<Message>) -> Vec<Event> {
        match message {
            Some(Message::Viewport(events)) => events,
            None => Vec::new(),
            Some(_) => panic!("expected a viewport message"),
        }
    }

    #[test]
    fn test_first_scroll_resizes_and_zooms() {
        let image = image();
        let viewport = Viewport::new();
        let canvas = ImageCanvas { image: &image, viewport: &viewport };
        let bounds = Rectangle::new(Point::new(10.0, 20.0), Size::new(400.0, 400.0));
        let cursor = Cursor::Available(Point::new(210.0, 220.0));

        let (status, message) = canvas.update(
            &mut (),
            canvas::Event::Mouse(mouse::Event::WheelScrolled {
                delta: mouse::ScrollDelta::Lines { x: 0.0, y: 1.0 },
            }),
            bounds,
            cursor,
        );

        assert_eq!(status, canvas::event::Status::Captured);
        assert_eq!(
            viewport_events(message),
            vec![
                Event::Resized(Size::new(400.0, 400.0)),
                Event::Zoom { delta: PIXELS_PER_LINE, cursor: Point::new(200.0, 200.0) },
            ]
        );
    }

    #[test]
    fn test_first_press_resizes_and_starts_drag() {
        let image = image();
        let viewport = Viewport::new();
        let canvas = ImageCanvas { image: &image, viewport: &viewport };
        let bounds = Rectangle::new(Point::ORIGIN, Size::new(400.0, 300.0));

        let (status, message) = canvas.update(
            &mut (),
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)),
            bounds,
            Cursor::Available(Point::new(50.0, 60.0)),
        );

        assert_eq!(status, canvas::event::Status::Captured);
        assert_eq!(
            viewport_events(message),
            vec![
                Event::Resized(Size::new(400.0, 300.0)),
                Event::DragStart(Point::new(50.0, 60.0)),
            ]
        );
    }

    #[test]
    fn test_unmapped_event_after_layout_is_ignored() {
        let image = image();
        let mut viewport = Viewport::new();
        viewport.resize(Size::new(400.0, 300.0));
        let canvas = ImageCanvas { image: &image, viewport: &viewport };
        let bounds = Rectangle::new(Point::ORIGIN, Size::new(400.0, 300.0));

        let (status, message) = canvas.update(
            &mut (),
            canvas::Event::Mouse(mouse::Event::CursorMoved { position: Point::new(5.0, 5.0) }),
            bounds,
            Cursor::Available(Point::new(5.0, 5.0)),
        );

        assert_eq!(status, canvas::event::Status::Ignored);
        assert!(message.is_none());
    }
}
