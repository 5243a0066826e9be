use crate::color::Rgba;

/// Drawing capabilities the simulation needs from a render target.
///
/// Coordinates are surface pixels with the origin at the top-left. A path is
/// started with `begin_path`, built from `arc`/`move_to`/`line_to`, and then
/// painted with `fill` (discs) or `stroke` (outlines and polylines).
pub trait Surface {
    /// Whether the surface can currently be drawn on
    fn is_available(&self) -> bool {
        true
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    fn begin_path(&mut self);

    /// Add a full circle to the current path
    fn arc(&mut self, x: f32, y: f32, radius: f32);

    fn move_to(&mut self, x: f32, y: f32);

    fn line_to(&mut self, x: f32, y: f32);

    fn set_fill_style(&mut self, color: Rgba);

    fn set_stroke_style(&mut self, color: Rgba);

    fn fill(&mut self);

    fn stroke(&mut self);
}

/// One element of a path under construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    Arc { x: f32, y: f32, radius: f32 },
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
}
