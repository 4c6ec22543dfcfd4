use ratatui::style::Color;
use strum::{Display, EnumIter, EnumString};

use crate::catalog::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
    HighContrast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub focus_border: Color,
    pub muted: Color,
    pub highlight: Color,
    pub chip_selected: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub flames: Color,
    pub embers: Color,
    pub alchemy: Color,
}

impl Palette {
    pub fn category(&self, category: Option<Category>) -> Color {
        match category {
            Some(Category::Flames) => self.flames,
            Some(Category::Embers) => self.embers,
            Some(Category::Alchemy) => self.alchemy,
            None => self.muted,
        }
    }
}

impl ThemeName {
    pub fn palette(self) -> Palette {
        match self {
            ThemeName::Dark => Palette {
                accent: Color::Cyan,
                focus_border: Color::Cyan,
                muted: Color::Gray,
                highlight: Color::Yellow,
                chip_selected: Color::Green,
                selection_bg: Color::Blue,
                selection_fg: Color::Black,
                flames: Color::LightRed,
                embers: Color::Yellow,
                alchemy: Color::LightMagenta,
            },
            ThemeName::Light => Palette {
                accent: Color::Blue,
                focus_border: Color::Blue,
                muted: Color::DarkGray,
                highlight: Color::Magenta,
                chip_selected: Color::Green,
                selection_bg: Color::LightBlue,
                selection_fg: Color::Black,
                flames: Color::Red,
                embers: Color::Rgb(180, 110, 0),
                alchemy: Color::Magenta,
            },
            ThemeName::HighContrast => Palette {
                accent: Color::White,
                focus_border: Color::Yellow,
                muted: Color::White,
                highlight: Color::Yellow,
                chip_selected: Color::LightGreen,
                selection_bg: Color::White,
                selection_fg: Color::Black,
                flames: Color::LightRed,
                embers: Color::LightYellow,
                alchemy: Color::LightCyan,
            },
        }
    }
}
