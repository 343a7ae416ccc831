/// Image viewer widgets
///
/// - `viewport.rs` - zoom/pan transform and fit logic
/// - `canvas.rs` - iced canvas that draws the image and feeds input to the viewport

pub mod canvas;
pub mod viewport;

pub use canvas::ImageCanvas;
pub use viewport::Viewport;
