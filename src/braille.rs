use crate::color::Rgba;
use crate::surface::{PathOp, Surface};
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// Dots darker than this (per channel max) are left unlit
const MIN_VISIBLE: u8 = 8;

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// Render surface backed by a Braille dot grid; one surface pixel is one dot.
///
/// Colours are composited over black and combined per channel with `max`,
/// so faint glow never darkens a brighter body drawn on the same dot.
pub struct BrailleSurface {
    cells_wide: u16,
    cells_high: u16,
    dots_wide: usize,
    dots_high: usize,
    dots: Vec<Option<[u8; 3]>>,
    path: Vec<PathOp>,
    fill_style: Rgba,
    stroke_style: Rgba,
}

impl BrailleSurface {
    pub fn new(cells_wide: u16, cells_high: u16) -> Self {
        let (dots_wide, dots_high) = calculate_simulation_size(cells_wide, cells_high);
        Self {
            cells_wide,
            cells_high,
            dots_wide,
            dots_high,
            dots: vec![None; dots_wide * dots_high],
            path: Vec::new(),
            fill_style: Rgba::rgb(255, 255, 255),
            stroke_style: Rgba::rgb(255, 255, 255),
        }
    }

    /// Colour of the dot at (x, y), if lit
    pub fn dot(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x < self.dots_wide && y < self.dots_high {
            self.dots[y * self.dots_wide + x]
        } else {
            None
        }
    }

    fn plot(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x as usize >= self.dots_wide || y as usize >= self.dots_high {
            return;
        }
        if rgb.iter().all(|&c| c < MIN_VISIBLE) {
            return;
        }
        let slot = &mut self.dots[y as usize * self.dots_wide + x as usize];
        *slot = Some(match *slot {
            Some(prev) => [prev[0].max(rgb[0]), prev[1].max(rgb[1]), prev[2].max(rgb[2])],
            None => rgb,
        });
    }

    fn fill_disc(&mut self, cx: f32, cy: f32, radius: f32, rgb: [u8; 3]) {
        // Always light at least the centre dot
        let r = radius.max(0.5);
        let r_sq = r * r;
        let min_x = (cx - r).floor() as i64;
        let max_x = (cx + r).ceil() as i64;
        let min_y = (cy - r).floor() as i64;
        let max_y = (cy + r).ceil() as i64;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r_sq {
                    self.plot(x, y, rgb);
                }
            }
        }
    }

    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, rgb: [u8; 3]) {
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = x0 + (x1 - x0) * t;
            let y = y0 + (y1 - y0) * t;
            self.plot(x.floor() as i64, y.floor() as i64, rgb);
        }
    }

    fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, rgb: [u8; 3]) {
        let segments = ((radius * std::f32::consts::TAU).ceil() as usize).clamp(8, 256);
        let point = |i: usize| {
            let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        };
        for i in 0..segments {
            let (x0, y0) = point(i);
            let (x1, y1) = point(i + 1);
            self.stroke_line(x0, y0, x1, y1, rgb);
        }
    }

    /// Collapse the dot grid to Braille characters; only non-empty cells are emitted
    pub fn cells(&self) -> Vec<BrailleCell> {
        let mut cells = Vec::new();

        for cy in 0..self.cells_high {
            for cx in 0..self.cells_wide {
                let mut pattern: u8 = 0;
                let mut color = [0u8; 3];

                // Sample the 2x4 dots for this Braille character
                let base_x = cx as usize * 2;
                let base_y = cy as usize * 4;

                for (dx, column) in BRAILLE_DOTS.iter().enumerate() {
                    for (dy, bit) in column.iter().enumerate() {
                        if let Some(rgb) = self.dot(base_x + dx, base_y + dy) {
                            pattern |= bit;
                            for (c, v) in color.iter_mut().zip(rgb) {
                                *c = (*c).max(v);
                            }
                        }
                    }
                }

                if pattern != 0 {
                    let braille_char = char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' ');
                    cells.push(BrailleCell {
                        x: cx,
                        y: cy,
                        char: braille_char,
                        color: Color::Rgb(color[0], color[1], color[2]),
                    });
                }
            }
        }

        cells
    }
}

impl Surface for BrailleSurface {
    fn is_available(&self) -> bool {
        self.dots_wide > 0 && self.dots_high > 0
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let x0 = x.max(0.0) as usize;
        let y0 = y.max(0.0) as usize;
        let x1 = ((x + width).max(0.0).ceil() as usize).min(self.dots_wide);
        let y1 = ((y + height).max(0.0).ceil() as usize).min(self.dots_high);
        for row in y0..y1 {
            for col in x0..x1 {
                self.dots[row * self.dots_wide + col] = None;
            }
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn arc(&mut self, x: f32, y: f32, radius: f32) {
        self.path.push(PathOp::Arc { x, y, radius });
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.path.push(PathOp::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path.push(PathOp::LineTo { x, y });
    }

    fn set_fill_style(&mut self, color: Rgba) {
        self.fill_style = color;
    }

    fn set_stroke_style(&mut self, color: Rgba) {
        self.stroke_style = color;
    }

    /// Fills the discs in the current path; open polylines have no area
    fn fill(&mut self) {
        let rgb = self.fill_style.over_black();
        let discs: Vec<(f32, f32, f32)> = self
            .path
            .iter()
            .filter_map(|op| match *op {
                PathOp::Arc { x, y, radius } => Some((x, y, radius)),
                _ => None,
            })
            .collect();
        for (x, y, radius) in discs {
            self.fill_disc(x, y, radius, rgb);
        }
    }

    fn stroke(&mut self) {
        let rgb = self.stroke_style.over_black();
        let path = std::mem::take(&mut self.path);
        let mut cursor: Option<(f32, f32)> = None;
        for op in &path {
            match *op {
                PathOp::MoveTo { x, y } => cursor = Some((x, y)),
                PathOp::LineTo { x, y } => {
                    if let Some((px, py)) = cursor {
                        self.stroke_line(px, py, x, y, rgb);
                    }
                    cursor = Some((x, y));
                }
                PathOp::Arc { x, y, radius } => {
                    self.stroke_circle(x, y, radius, rgb);
                    cursor = None;
                }
            }
        }
        self.path = path;
    }
}

/// Calculate the simulation surface size for a given canvas size.
/// Braille gives 2x4 dots per character, and one dot is one surface pixel.
pub fn calculate_simulation_size(canvas_width: u16, canvas_height: u16) -> (usize, usize) {
    (canvas_width as usize * 2, canvas_height as usize * 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braille_pattern() {
        // Test that single dot patterns work correctly
        assert_eq!(BRAILLE_DOTS[0][0], 0x01); // Top-left
        assert_eq!(BRAILLE_DOTS[1][0], 0x08); // Top-right
        assert_eq!(BRAILLE_DOTS[0][3], 0x40); // Bottom-left
        assert_eq!(BRAILLE_DOTS[1][3], 0x80); // Bottom-right

        // All dots should give 0xFF
        let all_dots: u8 = BRAILLE_DOTS[0].iter().sum::<u8>() + BRAILLE_DOTS[1].iter().sum::<u8>();
        assert_eq!(all_dots, 0xFF);
    }

    #[test]
    fn test_single_dot_cell() {
        let mut surface = BrailleSurface::new(4, 2);
        surface.set_fill_style(Rgba::rgb(0, 0, 255));
        surface.begin_path();
        surface.arc(2.5, 0.5, 0.1);
        surface.fill();

        let cells = surface.cells();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].x, 1);
        assert_eq!(cells[0].y, 0);
        assert_eq!(cells[0].char, '\u{2801}');
        assert_eq!(cells[0].color, Color::Rgb(0, 0, 255));
    }

    #[test]
    fn test_fill_disc_covers_radius() {
        let mut surface = BrailleSurface::new(20, 10);
        surface.begin_path();
        surface.arc(20.0, 20.0, 3.0);
        surface.fill();
        assert!(surface.dot(20, 20).is_some());
        assert!(surface.dot(22, 20).is_some());
        assert!(surface.dot(25, 20).is_none());
    }

    #[test]
    fn test_brighter_colour_wins_per_channel() {
        let mut surface = BrailleSurface::new(4, 4);
        surface.set_fill_style(Rgba::rgb(200, 0, 0).with_alpha(0.5));
        surface.begin_path();
        surface.arc(3.5, 3.5, 0.5);
        surface.fill();
        surface.set_fill_style(Rgba::rgb(0, 0, 200));
        surface.fill();
        assert_eq!(surface.dot(3, 3), Some([100, 0, 200]));
    }

    #[test]
    fn test_stroke_polyline_and_clear() {
        let mut surface = BrailleSurface::new(10, 4);
        surface.begin_path();
        surface.move_to(0.5, 0.5);
        surface.line_to(10.5, 0.5);
        surface.line_to(10.5, 8.5);
        surface.stroke();
        for x in 0..=10 {
            assert!(surface.dot(x, 0).is_some(), "dot {} unlit", x);
        }
        assert!(surface.dot(10, 8).is_some());
        // Filling a polyline paints nothing new
        surface.clear_rect(0.0, 0.0, 20.0, 16.0);
        surface.fill();
        assert!(surface.cells().is_empty());
    }

    #[test]
    fn test_faint_and_offscreen_dots_are_ignored() {
        let mut surface = BrailleSurface::new(2, 2);
        surface.set_fill_style(Rgba::rgb(255, 255, 255).with_alpha(0.01));
        surface.begin_path();
        surface.arc(1.0, 1.0, 1.0);
        surface.arc(-50.0, 100.0, 2.0);
        surface.fill();
        assert!(surface.cells().is_empty());
    }

    #[test]
    fn test_zero_sized_surface_is_unavailable() {
        assert!(!BrailleSurface::new(0, 10).is_available());
        assert!(BrailleSurface::new(1, 1).is_available());
        assert_eq!(calculate_simulation_size(30, 10), (60, 40));
    }
}
