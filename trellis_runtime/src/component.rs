// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Guide components: axes and the color legend.
//!
//! Guides are inferred from the view's resolved scales, report the margin
//! thickness they need (so the layout pass can reserve it), get placed in a
//! bounding box outside the plot rectangle, and finally render as plain scene
//! shapes that reconcile like everything else. Sizing uses theme constants;
//! label width is estimated from character count since text shaping is out
//! of scope.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Point, Rect};
use peniko::Color;
use smallvec::smallvec;
use trellis_scene::{DesiredNode, Geometry, Key, Paint, ShapeData, TextAnchor};

use crate::coord::Coordinate;
use crate::layout::Padding;
use crate::scale::{Scale, Tick};
use crate::theme::Theme;

/// What a guide component depicts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuideKind {
    /// Axis for the primary position channel.
    AxisX,
    /// Axis for the secondary position channel.
    AxisY,
    /// Color legend with one swatch per category.
    Legend,
}

impl GuideKind {
    fn label(self) -> &'static str {
        match self {
            Self::AxisX => "axis-x",
            Self::AxisY => "axis-y",
            Self::Legend => "legend",
        }
    }
}

/// The side of the plot rectangle a guide sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuideSide {
    /// Above the plot.
    Top,
    /// Below the plot.
    Bottom,
    /// Left of the plot.
    Left,
}

/// One legend entry.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendItem {
    /// Display label.
    pub label: String,
    /// Swatch color.
    pub color: Color,
}

/// An inferred guide component for one view.
#[derive(Clone, Debug, PartialEq)]
pub struct GuideComponent {
    /// What the guide depicts.
    pub kind: GuideKind,
    /// Which side of the plot it occupies.
    pub side: GuideSide,
    /// Ordinal among guides of the same kind, part of the stable key.
    pub ordinal: usize,
    /// Axis ticks in normalized scale coordinates.
    pub ticks: Vec<Tick>,
    /// Resolved field title.
    pub title: Option<Arc<str>>,
    /// Legend entries.
    pub items: Vec<LegendItem>,
    /// Margin thickness requested from layout.
    pub thickness: f64,
    /// Draw grid lines across the plot at each tick.
    pub grid: bool,
    /// Bounding box, set by [`GuideComponent::place`].
    pub bounds: Rect,
}

impl GuideComponent {
    /// Stable reconciliation key: kind plus ordinal.
    pub fn key(&self) -> Key {
        Key::name(format!("{}-{}", self.kind.label(), self.ordinal))
    }
}

/// Infers the guide set from a view's resolved scales.
///
/// The x and y scales produce axes (swapping sides under a transposed frame,
/// so the axis follows the pixel direction its channel actually runs along);
/// a discrete color or series scale produces a legend above the plot. Polar
/// frames get no axes, matching how radial plots drop them.
pub fn infer_guides(
    scales: &[(Arc<str>, Arc<Scale>)],
    coord_transposed: bool,
    coord_polar: bool,
    theme: &Theme,
) -> Vec<GuideComponent> {
    let mut out = Vec::new();
    let scale_of = |channel: &str| {
        scales
            .iter()
            .find(|(name, _)| &**name == channel)
            .map(|(_, scale)| scale)
    };

    if !coord_polar {
        if let Some(scale) = scale_of("x") {
            let side = if coord_transposed {
                GuideSide::Left
            } else {
                GuideSide::Bottom
            };
            out.push(axis_guide(GuideKind::AxisX, side, scale, false, theme));
        }
        if let Some(scale) = scale_of("y") {
            let side = if coord_transposed {
                GuideSide::Bottom
            } else {
                GuideSide::Left
            };
            out.push(axis_guide(GuideKind::AxisY, side, scale, true, theme));
        }
    }

    let legend_scale = scale_of("color").or_else(|| scale_of("series"));
    if let Some(scale) = legend_scale
        && scale.is_discrete()
    {
        let items: Vec<LegendItem> = scale
            .domain_values()
            .iter()
            .enumerate()
            .map(|(i, value)| LegendItem {
                label: value.label(),
                color: theme.series_color(i),
            })
            .collect();
        if !items.is_empty() {
            out.push(GuideComponent {
                kind: GuideKind::Legend,
                side: GuideSide::Top,
                ordinal: 0,
                ticks: Vec::new(),
                title: scale.field().cloned(),
                items,
                thickness: theme.legend_row,
                grid: false,
                bounds: Rect::ZERO,
            });
        }
    }

    out
}

const AXIS_TICK_TARGET: usize = 5;

fn axis_guide(
    kind: GuideKind,
    side: GuideSide,
    scale: &Arc<Scale>,
    grid: bool,
    theme: &Theme,
) -> GuideComponent {
    let ticks = scale.ticks(AXIS_TICK_TARGET);
    let thickness = match side {
        GuideSide::Bottom | GuideSide::Top => {
            theme.tick_length + theme.label_padding + theme.label_size
        }
        GuideSide::Left => {
            let longest = ticks.iter().map(|t| t.label.chars().count()).max();
            let label_width = 0.6 * theme.label_size * longest.unwrap_or(1) as f64;
            theme.tick_length + theme.label_padding + label_width
        }
    };
    GuideComponent {
        kind,
        side,
        ordinal: 0,
        ticks,
        title: scale.field().cloned(),
        items: Vec::new(),
        thickness,
        grid,
        bounds: Rect::ZERO,
    }
}

/// Sums the guides' requested thickness per side, for layout.
pub fn guide_margins(guides: &[GuideComponent]) -> Padding {
    let mut margins = Padding::default();
    for guide in guides {
        match guide.side {
            GuideSide::Top => margins.top += guide.thickness,
            GuideSide::Bottom => margins.bottom += guide.thickness,
            GuideSide::Left => margins.left += guide.thickness,
        }
    }
    margins
}

/// Places each guide's bounding box against the plot rectangle, stacking
/// guides that share a side outward without overlapping the plot.
pub fn place_guides(guides: &mut [GuideComponent], plot: Rect) {
    let mut used = Padding::default();
    for guide in guides {
        guide.bounds = match guide.side {
            GuideSide::Top => {
                let y1 = plot.y0 - used.top;
                used.top += guide.thickness;
                Rect::new(plot.x0, y1 - guide.thickness, plot.x1, y1)
            }
            GuideSide::Bottom => {
                let y0 = plot.y1 + used.bottom;
                used.bottom += guide.thickness;
                Rect::new(plot.x0, y0, plot.x1, y0 + guide.thickness)
            }
            GuideSide::Left => {
                let x1 = plot.x0 - used.left;
                used.left += guide.thickness;
                Rect::new(x1 - guide.thickness, plot.y0, x1, plot.y1)
            }
        };
    }
}

impl GuideComponent {
    /// Renders the guide as desired scene shapes, keyed by emission order.
    pub fn render(&self, coord: &Coordinate, theme: &Theme) -> Vec<DesiredNode> {
        match self.kind {
            GuideKind::AxisX | GuideKind::AxisY => self.render_axis(coord, theme),
            GuideKind::Legend => self.render_legend(theme),
        }
    }

    fn render_axis(&self, coord: &Coordinate, theme: &Theme) -> Vec<DesiredNode> {
        let plot = coord.plot();
        let mut out = Vec::new();
        let mut key = 0_u64;
        let mut push = |out: &mut Vec<DesiredNode>, shape: ShapeData| {
            out.push(DesiredNode::shape(Key::index(key), shape));
            key += 1;
        };

        let rule = |a: Point, b: Point, color: Color| ShapeData {
            geometry: Geometry::Polyline(smallvec![a, b]),
            paint: Paint::stroke(color, 1.0),
        };
        let label = |pos: Point, text: &str, anchor: TextAnchor| ShapeData {
            geometry: Geometry::Text {
                pos,
                text: String::from(text),
                size: theme.label_size,
                anchor,
                angle: 0.0,
            },
            paint: Paint::fill(theme.foreground),
        };

        match self.side {
            GuideSide::Bottom | GuideSide::Top => {
                let y = self.bounds.y0;
                push(&mut out, rule(
                    Point::new(self.bounds.x0, y),
                    Point::new(self.bounds.x1, y),
                    theme.axis_line,
                ));
                for tick in &self.ticks {
                    let x = plot.x0 + tick.position * plot.width();
                    if self.grid {
                        push(&mut out, rule(
                            Point::new(x, plot.y0),
                            Point::new(x, plot.y1),
                            theme.grid_line,
                        ));
                    }
                    push(&mut out, rule(
                        Point::new(x, y),
                        Point::new(x, y + theme.tick_length),
                        theme.axis_line,
                    ));
                    push(&mut out, label(
                        Point::new(x, y + theme.tick_length + theme.label_padding),
                        &tick.label,
                        TextAnchor::Middle,
                    ));
                }
            }
            GuideSide::Left => {
                let x = self.bounds.x1;
                push(&mut out, rule(
                    Point::new(x, self.bounds.y0),
                    Point::new(x, self.bounds.y1),
                    theme.axis_line,
                ));
                for tick in &self.ticks {
                    // Normalized positions grow upward; pixel y grows downward.
                    let y = plot.y1 - tick.position * plot.height();
                    if self.grid {
                        push(&mut out, rule(
                            Point::new(plot.x0, y),
                            Point::new(plot.x1, y),
                            theme.grid_line,
                        ));
                    }
                    push(&mut out, rule(
                        Point::new(x - theme.tick_length, y),
                        Point::new(x, y),
                        theme.axis_line,
                    ));
                    push(&mut out, label(
                        Point::new(x - theme.tick_length - theme.label_padding, y),
                        &tick.label,
                        TextAnchor::End,
                    ));
                }
            }
        }
        out
    }

    fn render_legend(&self, theme: &Theme) -> Vec<DesiredNode> {
        let mut out = Vec::new();
        let swatch = theme.legend_swatch;
        let mut x = self.bounds.x0;
        let y = self.bounds.center().y - 0.5 * swatch;
        for (i, item) in self.items.iter().enumerate() {
            out.push(DesiredNode::shape(
                Key::index(2 * i as u64),
                ShapeData {
                    geometry: Geometry::Polygon(smallvec![
                        Point::new(x, y),
                        Point::new(x + swatch, y),
                        Point::new(x + swatch, y + swatch),
                        Point::new(x, y + swatch),
                    ]),
                    paint: Paint::fill(item.color),
                },
            ));
            out.push(DesiredNode::shape(
                Key::index(2 * i as u64 + 1),
                ShapeData {
                    geometry: Geometry::Text {
                        pos: Point::new(x + swatch + 4.0, y + 0.5 * swatch),
                        text: item.label.clone(),
                        size: theme.label_size,
                        anchor: TextAnchor::Start,
                        angle: 0.0,
                    },
                    paint: Paint::fill(theme.foreground),
                },
            ));
            // Advance past the swatch, an estimated label width and a gap.
            x += swatch + 4.0 + 0.6 * theme.label_size * item.label.chars().count() as f64 + 16.0;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::scale::{ScaleLinear, ScalePoint};
    use crate::value::FieldValue;

    fn scales() -> Vec<(Arc<str>, Arc<Scale>)> {
        Vec::from([
            (
                Arc::<str>::from("x"),
                Arc::new(Scale::Point(ScalePoint {
                    values: Vec::from([FieldValue::from("a"), FieldValue::from("b")]),
                    padding: 0.5,
                    field: Some(Arc::from("month")),
                })),
            ),
            (
                Arc::<str>::from("y"),
                Arc::new(Scale::Linear(ScaleLinear {
                    domain: [0.0, 30.0],
                    field: Some(Arc::from("temperature")),
                })),
            ),
            (
                Arc::<str>::from("color"),
                Arc::new(Scale::Point(ScalePoint {
                    values: Vec::from([FieldValue::from("London"), FieldValue::from("Berlin")]),
                    padding: 0.5,
                    field: Some(Arc::from("city")),
                })),
            ),
        ])
    }

    #[test]
    fn infers_axes_and_legend_with_stable_keys() {
        let theme = Theme::light();
        let guides = infer_guides(&scales(), false, false, &theme);
        assert_eq!(guides.len(), 3);
        assert_eq!(guides[0].key(), Key::name("axis-x-0"));
        assert_eq!(guides[0].side, GuideSide::Bottom);
        assert_eq!(guides[1].key(), Key::name("axis-y-0"));
        assert_eq!(guides[1].side, GuideSide::Left);
        assert_eq!(guides[2].key(), Key::name("legend-0"));
        assert_eq!(guides[2].items.len(), 2);
        assert_eq!(guides[2].items[0].label, "London");
    }

    #[test]
    fn transpose_swaps_axis_sides() {
        let theme = Theme::light();
        let guides = infer_guides(&scales(), true, false, &theme);
        assert_eq!(guides[0].side, GuideSide::Left);
        assert_eq!(guides[1].side, GuideSide::Bottom);
    }

    #[test]
    fn polar_drops_axes_but_keeps_the_legend() {
        let theme = Theme::light();
        let guides = infer_guides(&scales(), false, true, &theme);
        assert_eq!(guides.len(), 1);
        assert_eq!(guides[0].kind, GuideKind::Legend);
    }

    #[test]
    fn placement_stays_outside_the_plot() {
        let theme = Theme::light();
        let mut guides = infer_guides(&scales(), false, false, &theme);
        let plot = Rect::new(60.0, 40.0, 400.0, 300.0);
        place_guides(&mut guides, plot);
        let margins = guide_margins(&guides);
        assert!(margins.bottom > 0.0 && margins.left > 0.0 && margins.top > 0.0);
        for guide in &guides {
            let b = guide.bounds;
            let overlaps = b.x0 < plot.x1 && b.x1 > plot.x0 && b.y0 < plot.y1 && b.y1 > plot.y0;
            assert!(!overlaps, "{:?} overlaps the plot", guide.kind);
        }
    }
}
