use std::fmt;
use std::str::FromStr;

use ratatui::style::Color;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
    Green,
}

/// Colors used by every widget for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub accent: Color,
    pub user: Color,
    pub ai: Color,
    pub muted: Color,
    pub code: Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme `{0}` (expected one of: light, dark, green)")]
pub struct ParseThemeError(pub String);

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Green => "green",
        }
    }

    pub fn next(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Green,
            Theme::Green => Theme::Light,
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: Color::White,
                text: Color::Black,
                accent: Color::Blue,
                user: Color::Blue,
                ai: Color::Magenta,
                muted: Color::Gray,
                code: Color::Red,
            },
            Theme::Dark => Palette {
                background: Color::Reset,
                text: Color::White,
                accent: Color::Cyan,
                user: Color::Cyan,
                ai: Color::Yellow,
                muted: Color::DarkGray,
                code: Color::LightRed,
            },
            Theme::Green => Palette {
                background: Color::Black,
                text: Color::Green,
                accent: Color::LightGreen,
                user: Color::LightGreen,
                ai: Color::Green,
                muted: Color::DarkGray,
                code: Color::LightYellow,
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "green" => Ok(Theme::Green),
            _ => Err(ParseThemeError(s.to_string())),
        }
    }
}
