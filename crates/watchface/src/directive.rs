//! RenderDirective - what a surface should draw for one frame

use std::fmt;

use contracts::{parse_hex_color, WeatherIcon};
use serde::Serialize;

/// 24-bit colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Parse `#RRGGBB`
    pub fn from_hex(value: &str) -> Option<Self> {
        parse_hex_color(value).map(|(r, g, b)| Rgb { r, g, b })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Interactive-mode styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub background: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Rgb {
                r: 0x02,
                g: 0x88,
                b: 0xD1,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    Themed(Rgb),
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Typeface {
    Normal,
    Condensed,
}

/// Weather area of the face
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherLine {
    /// Interactive: icon plus high and low
    Panel {
        icon: Option<WeatherIcon>,
        high: String,
        low: String,
    },
    /// Interactive, no data yet
    Placeholder,
    /// Ambient: single text line
    Summary(String),
    /// Ambient, no data: nothing drawn
    Omitted,
}

/// One frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderDirective {
    pub ambient: bool,
    pub background: Background,
    pub time_text: String,
    pub date_text: String,
    pub typeface: Typeface,
    pub anti_alias: bool,
    pub weather: WeatherLine,
}

impl fmt::Display for RenderDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.time_text, self.date_text)?;
        match &self.weather {
            WeatherLine::Panel { icon, high, low } => match icon {
                Some(icon) => write!(f, " | {icon:?} {high} {low}"),
                None => write!(f, " | {high} {low}"),
            },
            WeatherLine::Placeholder => write!(f, " | --"),
            WeatherLine::Summary(line) => write!(f, " | {line}"),
            WeatherLine::Omitted => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_hex() {
        let rgb = Rgb::from_hex("#0288D1").unwrap();
        assert_eq!(rgb, Theme::default().background);
        assert_eq!(rgb.to_string(), "#0288D1");
        assert!(Rgb::from_hex("0288D1").is_none());
    }

    #[test]
    fn test_directive_display() {
        let directive = RenderDirective {
            ambient: true,
            background: Background::Black,
            time_text: "9:05".into(),
            date_text: "Fri, Oct 16 2026".into(),
            typeface: Typeface::Condensed,
            anti_alias: true,
            weather: WeatherLine::Omitted,
        };
        assert_eq!(directive.to_string(), "9:05 | Fri, Oct 16 2026");
    }
}
