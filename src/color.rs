use crate::error::SimError;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An sRGB colour with straight (non-premultiplied) alpha in 0.0-1.0.
///
/// Serialized as a hex string (`#rrggbb` or `#rrggbbaa`) so config files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Same colour with its alpha multiplied by `factor`
    pub fn scaled_alpha(self, factor: f32) -> Self {
        Self {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional)
    pub fn from_hex(s: &str) -> Result<Self, SimError> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 && hex.len() != 8 {
            return Err(SimError::invalid(
                "color",
                format!("'{}' is not #rrggbb or #rrggbbaa", s),
            ));
        }
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .ok_or_else(|| SimError::invalid("color", format!("'{}' is not valid hex", s)))
        };
        let a = if hex.len() == 8 {
            channel(6)? as f32 / 255.0
        } else {
            1.0
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a,
        })
    }

    /// Hex form; alpha is only emitted when the colour is not opaque
    pub fn to_hex(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, a)
        }
    }

    /// Colour composited over a black background
    pub fn over_black(&self) -> [u8; 3] {
        let a = self.a.clamp(0.0, 1.0);
        [
            (self.r as f32 * a).round() as u8,
            (self.g as f32 * a).round() as u8,
            (self.b as f32 * a).round() as u8,
        ]
    }

    pub fn is_valid(&self) -> bool {
        self.a.is_finite() && (0.0..=1.0).contains(&self.a)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Rgba {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgba::from_hex(&value)
    }
}

impl From<Rgba> for String {
    fn from(value: Rgba) -> Self {
        value.to_hex()
    }
}

impl From<Rgba> for Color {
    fn from(value: Rgba) -> Self {
        let [r, g, b] = value.over_black();
        Color::Rgb(r, g, b)
    }
}

/// Named colours offered by the control panel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Palette {
    #[default]
    Cyan,
    Blue,
    Magenta,
    Amber,
    Lime,
    Coral,
    White,
}

impl Palette {
    pub fn name(&self) -> &str {
        match self {
            Palette::Cyan => "Cyan",
            Palette::Blue => "Blue",
            Palette::Magenta => "Magenta",
            Palette::Amber => "Amber",
            Palette::Lime => "Lime",
            Palette::Coral => "Coral",
            Palette::White => "White",
        }
    }

    pub fn color(&self) -> Rgba {
        match self {
            Palette::Cyan => Rgba::rgb(0x00, 0xff, 0xff),
            Palette::Blue => Rgba::rgb(0x00, 0x00, 0xff),
            Palette::Magenta => Rgba::rgb(0xff, 0x00, 0xff),
            Palette::Amber => Rgba::rgb(0xff, 0xbf, 0x00),
            Palette::Lime => Rgba::rgb(0x7f, 0xff, 0x00),
            Palette::Coral => Rgba::rgb(0xff, 0x7f, 0x50),
            Palette::White => Rgba::rgb(0xff, 0xff, 0xff),
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Palette::Cyan => Palette::Blue,
            Palette::Blue => Palette::Magenta,
            Palette::Magenta => Palette::Amber,
            Palette::Amber => Palette::Lime,
            Palette::Lime => Palette::Coral,
            Palette::Coral => Palette::White,
            Palette::White => Palette::Cyan,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Palette::Cyan => Palette::White,
            Palette::Blue => Palette::Cyan,
            Palette::Magenta => Palette::Blue,
            Palette::Amber => Palette::Magenta,
            Palette::Lime => Palette::Amber,
            Palette::Coral => Palette::Lime,
            Palette::White => Palette::Coral,
        }
    }

    /// Palette entry matching a colour's RGB channels, ignoring alpha
    pub fn find(color: Rgba) -> Option<Self> {
        let mut entry = Palette::Cyan;
        loop {
            let c = entry.color();
            if (c.r, c.g, c.b) == (color.r, color.g, color.b) {
                return Some(entry);
            }
            entry = entry.next();
            if entry == Palette::Cyan {
                return None;
            }
        }
    }
}
