// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in themes and per-view theme configuration.

extern crate alloc;

use alloc::sync::Arc;

use peniko::Color;

/// The categorical series palette shared by both built-in themes.
const CATEGORY_PALETTE: [Color; 10] = [
    Color::from_rgb8(23, 131, 255),
    Color::from_rgb8(0, 201, 201),
    Color::from_rgb8(240, 136, 77),
    Color::from_rgb8(213, 128, 255),
    Color::from_rgb8(120, 99, 255),
    Color::from_rgb8(96, 196, 45),
    Color::from_rgb8(189, 143, 36),
    Color::from_rgb8(255, 128, 202),
    Color::from_rgb8(36, 145, 179),
    Color::from_rgb8(23, 199, 111),
];

/// Visual constants resolved once per view.
///
/// Guides, marks and interaction affordances read their colors and metrics
/// from here rather than hard-coding them.
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    /// View background fill.
    pub background: Color,
    /// Label and title text color.
    pub foreground: Color,
    /// Axis domain line and tick color.
    pub axis_line: Color,
    /// Grid line color.
    pub grid_line: Color,
    /// View frame stroke color.
    pub frame_stroke: Color,
    /// Tooltip crosshair color.
    pub crosshair: Color,
    /// Categorical series palette.
    pub palette: Arc<[Color]>,
    /// Axis tick length in pixels.
    pub tick_length: f64,
    /// Tick and legend label font size in pixels.
    pub label_size: f64,
    /// Gap between ticks and labels in pixels.
    pub label_padding: f64,
    /// Axis title font size in pixels.
    pub title_size: f64,
    /// Legend swatch side length in pixels.
    pub legend_swatch: f64,
    /// Vertical space reserved for a horizontal legend row.
    pub legend_row: f64,
    /// Default symbol radius for point marks.
    pub point_radius: f64,
    /// Tooltip marker radius in pixels.
    pub marker_radius: f64,
    /// Default stroke width for line marks.
    pub line_width: f64,
}

impl Theme {
    /// The light theme (default).
    pub fn light() -> Self {
        Self {
            background: Color::WHITE,
            foreground: Color::from_rgb8(38, 38, 38),
            axis_line: Color::from_rgb8(191, 191, 191),
            grid_line: Color::from_rgb8(232, 232, 232),
            frame_stroke: Color::from_rgb8(217, 217, 217),
            crosshair: Color::from_rgb8(153, 153, 153),
            palette: Arc::from(CATEGORY_PALETTE),
            tick_length: 5.0,
            label_size: 12.0,
            label_padding: 8.0,
            title_size: 14.0,
            legend_swatch: 12.0,
            legend_row: 24.0,
            point_radius: 3.0,
            marker_radius: 4.0,
            line_width: 2.0,
        }
    }

    /// The dark theme.
    pub fn dark() -> Self {
        Self {
            background: Color::from_rgb8(20, 20, 20),
            foreground: Color::from_rgb8(218, 218, 218),
            axis_line: Color::from_rgb8(102, 102, 102),
            grid_line: Color::from_rgb8(64, 64, 64),
            frame_stroke: Color::from_rgb8(88, 88, 88),
            crosshair: Color::from_rgb8(140, 140, 140),
            ..Self::light()
        }
    }

    /// The series color for an ordinal index, cycling through the palette.
    pub fn series_color(&self, index: usize) -> Color {
        if self.palette.is_empty() {
            return self.foreground;
        }
        self.palette[index % self.palette.len()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

/// Theme selection plus field overrides for one view.
#[derive(Clone, Debug, PartialEq)]
pub struct ThemeConfig {
    /// Registered theme name.
    pub name: Arc<str>,
    /// Override the categorical series palette.
    pub palette: Option<Arc<[Color]>>,
    /// Override the view background.
    pub background: Option<Color>,
}

impl ThemeConfig {
    /// Select a registered theme by name.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            palette: None,
            background: None,
        }
    }

    /// Override the series palette.
    pub fn with_palette(mut self, palette: impl Into<Arc<[Color]>>) -> Self {
        self.palette = Some(palette.into());
        self
    }

    /// Override the background color.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = Some(background);
        self
    }

    /// Apply the overrides to a resolved base theme.
    pub fn apply(&self, theme: &mut Theme) {
        if let Some(palette) = &self.palette {
            theme.palette = palette.clone();
        }
        if let Some(background) = self.background {
            theme.background = background;
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self::named("light")
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn palette_cycles_past_its_length() {
        let theme = Theme::light();
        assert_eq!(theme.series_color(0), theme.series_color(10));
        assert_ne!(theme.series_color(0), theme.series_color(1));
    }

    #[test]
    fn overrides_replace_only_named_fields() {
        let mut theme = Theme::dark();
        let base_foreground = theme.foreground;
        ThemeConfig::named("dark")
            .with_background(Color::BLACK)
            .with_palette([Color::WHITE])
            .apply(&mut theme);
        assert_eq!(theme.background, Color::BLACK);
        assert_eq!(theme.series_color(3), Color::WHITE);
        assert_eq!(theme.foreground, base_foreground);
    }
}
