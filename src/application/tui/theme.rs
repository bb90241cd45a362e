use crate::domain::DayStatus;
use crossterm::style::Color as CrosstermColor;
use ratatui::style::{Color as RatatuiColor, Modifier, Style as RatatuiStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Day states
    pub available: ColorPair,
    pub blocked: ColorPair,
    pub booked: ColorPair,
    pub selected: ColorPair,
    pub selected_range: ColorPair,
    pub disabled: ColorPair,
    pub padding: ColorPair,
    pub cursor: ColorPair,

    // UI elements
    pub header: ColorPair,
    pub weekend: ColorPair,

    // Text
    pub normal_text: ColorPair,
    pub help_text: ColorPair,
    pub error_text: ColorPair,
}

#[derive(Debug, Clone)]
pub struct ColorPair {
    pub fg: CrosstermColor,
    pub bg: Option<CrosstermColor>,
}

impl ColorPair {
    pub fn new(fg: CrosstermColor) -> Self {
        Self { fg, bg: None }
    }

    pub fn with_bg(fg: CrosstermColor, bg: CrosstermColor) -> Self {
        Self { fg, bg: Some(bg) }
    }

    /// Convert to ratatui style
    pub fn to_ratatui(&self) -> RatatuiStyle {
        let mut style = RatatuiStyle::default().fg(crossterm_to_ratatui(self.fg));
        if let Some(bg) = self.bg {
            style = style.bg(crossterm_to_ratatui(bg));
        }
        style
    }

    pub fn to_ratatui_with_modifier(&self, modifier: Modifier) -> RatatuiStyle {
        self.to_ratatui().add_modifier(modifier)
    }
}

pub fn crossterm_to_ratatui(color: CrosstermColor) -> RatatuiColor {
    match color {
        CrosstermColor::Black => RatatuiColor::Black,
        CrosstermColor::DarkRed => RatatuiColor::Red,
        CrosstermColor::DarkGreen => RatatuiColor::Green,
        CrosstermColor::DarkYellow => RatatuiColor::Yellow,
        CrosstermColor::DarkBlue => RatatuiColor::Blue,
        CrosstermColor::DarkMagenta => RatatuiColor::Magenta,
        CrosstermColor::DarkCyan => RatatuiColor::Cyan,
        CrosstermColor::Grey => RatatuiColor::Gray,
        CrosstermColor::DarkGrey => RatatuiColor::DarkGray,
        CrosstermColor::Red => RatatuiColor::LightRed,
        CrosstermColor::Green => RatatuiColor::LightGreen,
        CrosstermColor::Yellow => RatatuiColor::LightYellow,
        CrosstermColor::Blue => RatatuiColor::LightBlue,
        CrosstermColor::Magenta => RatatuiColor::LightMagenta,
        CrosstermColor::Cyan => RatatuiColor::LightCyan,
        CrosstermColor::White => RatatuiColor::White,
        CrosstermColor::Rgb { r, g, b } => RatatuiColor::Rgb(r, g, b),
        CrosstermColor::AnsiValue(v) => RatatuiColor::Indexed(v),
        _ => RatatuiColor::White,
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "Dark".to_string(),
            colors: ThemeColors {
                available: ColorPair::new(CrosstermColor::White),
                blocked: ColorPair::with_bg(CrosstermColor::White, CrosstermColor::DarkRed),
                booked: ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::DarkYellow),
                selected: ColorPair::with_bg(CrosstermColor::White, CrosstermColor::DarkBlue),
                selected_range: ColorPair::with_bg(
                    CrosstermColor::White,
                    CrosstermColor::Rgb { r: 30, g: 50, b: 90 },
                ),
                disabled: ColorPair::new(CrosstermColor::DarkGrey),
                padding: ColorPair::new(CrosstermColor::Rgb { r: 70, g: 70, b: 70 }),
                cursor: ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::Cyan),

                header: ColorPair::new(CrosstermColor::DarkCyan),
                weekend: ColorPair::new(CrosstermColor::Rgb { r: 150, g: 150, b: 150 }),

                normal_text: ColorPair::new(CrosstermColor::White),
                help_text: ColorPair::new(CrosstermColor::DarkCyan),
                error_text: ColorPair::new(CrosstermColor::Red),
            },
        }
    }

    pub fn light() -> Self {
        Self {
            name: "Light".to_string(),
            colors: ThemeColors {
                available: ColorPair::new(CrosstermColor::Black),
                blocked: ColorPair::with_bg(CrosstermColor::White, CrosstermColor::Red),
                booked: ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::Yellow),
                selected: ColorPair::with_bg(CrosstermColor::White, CrosstermColor::DarkBlue),
                selected_range: ColorPair::with_bg(
                    CrosstermColor::Black,
                    CrosstermColor::Rgb { r: 200, g: 215, b: 240 },
                ),
                disabled: ColorPair::new(CrosstermColor::Grey),
                padding: ColorPair::new(CrosstermColor::Rgb { r: 200, g: 200, b: 200 }),
                cursor: ColorPair::with_bg(CrosstermColor::White, CrosstermColor::DarkCyan),

                header: ColorPair::new(CrosstermColor::DarkBlue),
                weekend: ColorPair::new(CrosstermColor::Grey),

                normal_text: ColorPair::new(CrosstermColor::Black),
                help_text: ColorPair::new(CrosstermColor::DarkBlue),
                error_text: ColorPair::new(CrosstermColor::DarkRed),
            },
        }
    }

    pub fn minimal() -> Self {
        Self {
            name: "Minimal".to_string(),
            colors: ThemeColors {
                available: ColorPair::new(CrosstermColor::White),
                blocked: ColorPair::new(CrosstermColor::DarkGrey),
                booked: ColorPair::new(CrosstermColor::DarkGrey),
                selected: ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::White),
                selected_range: ColorPair::with_bg(CrosstermColor::White, CrosstermColor::DarkGrey),
                disabled: ColorPair::new(CrosstermColor::DarkGrey),
                padding: ColorPair::new(CrosstermColor::DarkGrey),
                cursor: ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::Grey),

                header: ColorPair::new(CrosstermColor::White),
                weekend: ColorPair::new(CrosstermColor::Grey),

                normal_text: ColorPair::new(CrosstermColor::White),
                help_text: ColorPair::new(CrosstermColor::Grey),
                error_text: ColorPair::new(CrosstermColor::White),
            },
        }
    }

    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "light" => Self::light(),
            "minimal" => Self::minimal(),
            _ => Self::dark(), // default
        }
    }

    pub fn day_style(&self, status: DayStatus, in_current_month: bool) -> RatatuiStyle {
        if !in_current_month {
            return self.colors.padding.to_ratatui();
        }
        match status {
            DayStatus::Available => self.colors.available.to_ratatui(),
            DayStatus::Blocked => self.colors.blocked.to_ratatui(),
            DayStatus::Booked => self.colors.booked.to_ratatui(),
            DayStatus::Selected => self.colors.selected.to_ratatui_with_modifier(Modifier::BOLD),
            DayStatus::SelectedRange => self.colors.selected_range.to_ratatui(),
            DayStatus::Disabled => self.colors.disabled.to_ratatui(),
        }
    }
}
