// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mark initialization: channel resolution, visual rows and the mark and
//! shape extension traits.
//!
//! A mark definition turns scaled channel values into [`VisualRow`]s, the
//! renderable elements of one layer. Shape renderers then turn a visual row
//! into drawable scene content. Both are registered by tag, so new mark and
//! shape types plug in without touching the pipeline.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Affine, Point};
use peniko::Color;
use trellis_scene::{Key, ShapeData};

use crate::coord::Coordinate;
use crate::scale::{Scale, ScaleKind};
use crate::spec::{MarkSpec, StyleSpec, TOOLTIP_PREFIX};
use crate::theme::Theme;
use crate::value::{FieldValue, Record};

/// Primary position channel.
pub const CHANNEL_X: &str = "x";
/// Secondary position channel.
pub const CHANNEL_Y: &str = "y";
/// Optional baseline channel for range-like marks; shares the `y` scale.
pub const CHANNEL_Y1: &str = "y1";
/// Categorical color channel.
pub const CHANNEL_COLOR: &str = "color";
/// Series grouping channel; falls back to `color` when absent.
pub const CHANNEL_SERIES: &str = "series";
/// Explicit element key channel.
pub const CHANNEL_KEY: &str = "key";

/// The scale a channel reads from: `y1` aligns with `y` so baselines and
/// values share one domain.
pub fn scale_channel(channel: &str) -> &str {
    match channel {
        CHANNEL_Y1 => CHANNEL_Y,
        "x1" => CHANNEL_X,
        other => other,
    }
}

/// Whether a channel participates in positional row filtering.
pub fn is_position_channel(channel: &str) -> bool {
    matches!(channel, CHANNEL_X | CHANNEL_Y)
}

/// One channel's resolved values for a mark, for one view evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelValues {
    /// Channel name.
    pub channel: Arc<str>,
    /// Resolved field label, absent for constant and computed encodings.
    pub field: Option<Arc<str>>,
    /// One abstract value per source row.
    pub values: Vec<FieldValue>,
}

/// Mutable companion to a mark spec, created once per view evaluation and
/// replaced wholesale on re-evaluation.
#[derive(Clone, Debug)]
pub struct MarkState {
    /// Row ids into the mark's data, post filtering and regrouping.
    pub index: Vec<usize>,
    /// Channel value arrays in declaration order.
    pub channels: Vec<ChannelValues>,
    /// The mark definition's default shape tag.
    pub default_shape: Arc<str>,
    /// Renderable elements, populated by geometry.
    pub visual: Vec<VisualRow>,
}

impl MarkState {
    /// Reads every encoded channel from the mark's rows.
    pub fn init(spec: &MarkSpec, rows: &[Record], default_shape: Arc<str>) -> Self {
        let channels = spec
            .encode
            .iter()
            .map(|(channel, encoding)| ChannelValues {
                channel: channel.clone(),
                field: encoding.field_name().cloned(),
                values: rows.iter().map(|row| encoding.read(row)).collect(),
            })
            .collect();
        Self {
            index: (0..rows.len()).collect(),
            channels,
            default_shape,
            visual: Vec::new(),
        }
    }

    /// Look up a channel by name.
    pub fn channel(&self, name: &str) -> Option<&ChannelValues> {
        self.channels.iter().find(|c| &*c.channel == name)
    }

    /// One channel value for one row.
    pub fn value(&self, channel: &str, row: usize) -> Option<&FieldValue> {
        self.channel(channel).and_then(|c| c.values.get(row))
    }
}

/// One channel value carried on a visual row for interaction code.
#[derive(Clone, Debug, PartialEq)]
pub struct RowValue {
    /// Channel name; a [`TOOLTIP_PREFIX`] prefix marks display channels.
    pub channel: Arc<str>,
    /// Resolved field label for display.
    pub field: Option<Arc<str>>,
    /// Abstract value.
    pub value: FieldValue,
}

/// One renderable element produced by mark geometry.
///
/// The scene binds each element node to its row, so interaction code reads
/// geometry and values straight from the tree it hit-tests.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualRow {
    /// Stable reconciliation key among the mark's elements.
    pub key: Key,
    /// Pixel-space geometry control points.
    pub points: Vec<Point>,
    /// Optional affine produced by adjustment.
    pub transform: Option<Affine>,
    /// Normalized scaled values per channel.
    pub scaled: Vec<(Arc<str>, f64)>,
    /// Abstract channel values carried through for interaction.
    pub values: Vec<RowValue>,
    /// Resolved shape tag.
    pub shape: Arc<str>,
    /// Enter-animation tag, replayed only when the element enters.
    pub animation: Option<Arc<str>>,
    /// Source rows drawn by this element, in point order.
    ///
    /// Single-datum elements hold their one row; series polylines hold one
    /// row per point so interaction code can read per-point values.
    pub series_rows: Vec<usize>,
    /// Resolved series color.
    pub color: Color,
    /// Display title value, from the primary position channel.
    pub title: FieldValue,
}

impl VisualRow {
    /// The normalized scaled value for a channel.
    pub fn scaled(&self, channel: &str) -> Option<f64> {
        self.scaled
            .iter()
            .find(|(name, _)| &**name == channel)
            .map(|(_, v)| *v)
    }

    /// The carried abstract value for a channel.
    pub fn value(&self, channel: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|v| &*v.channel == channel)
            .map(|v| &v.value)
    }

    /// The carried abstract value for a source field.
    pub fn value_by_field(&self, field: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|v| v.field.as_deref() == Some(field))
            .map(|v| &v.value)
    }

    /// The carried channels whose name starts with the tooltip prefix.
    pub fn tooltip_values(&self) -> impl Iterator<Item = &RowValue> {
        self.values
            .iter()
            .filter(|v| v.channel.starts_with(TOOLTIP_PREFIX))
    }
}

/// Datum bound to element scene nodes, read back by interaction code.
#[derive(Clone, Debug)]
pub struct ElementDatum {
    /// Key of the mark layer that produced the element.
    pub mark: Arc<str>,
    /// The element's visual row.
    pub row: VisualRow,
}

/// Everything mark geometry needs for one view evaluation.
pub struct GeometryInput<'a> {
    /// Rows that survived positional and facet filtering.
    pub rows: &'a [usize],
    /// Channel value arrays in declaration order.
    pub channels: &'a [ChannelValues],
    /// Normalized scaled values per channel, aligned with the source rows.
    pub scaled: &'a [(Arc<str>, Vec<Option<f64>>)],
    /// The view's channel scales.
    pub scales: &'a [(Arc<str>, Arc<Scale>)],
    /// The view's coordinate.
    pub coord: &'a Coordinate,
    /// The view's theme.
    pub theme: &'a Theme,
    /// The mark's style.
    pub style: &'a StyleSpec,
    /// Resolved shape tag (declared or the mark's default).
    pub shape: &'a Arc<str>,
    /// Declared enter animation.
    pub animation: Option<&'a Arc<str>>,
}

impl GeometryInput<'_> {
    /// The normalized scaled value of a channel for one row.
    pub fn scaled(&self, channel: &str, row: usize) -> Option<f64> {
        self.scaled
            .iter()
            .find(|(name, _)| &**name == channel)
            .and_then(|(_, values)| values.get(row).copied().flatten())
    }

    /// The abstract value of a channel for one row.
    pub fn value(&self, channel: &str, row: usize) -> Option<&FieldValue> {
        self.channels
            .iter()
            .find(|c| &*c.channel == channel)
            .and_then(|c| c.values.get(row))
    }

    /// The resolved field label of a channel.
    pub fn field(&self, channel: &str) -> Option<&Arc<str>> {
        self.channels
            .iter()
            .find(|c| &*c.channel == channel)
            .and_then(|c| c.field.as_ref())
    }

    /// The scale a channel reads from.
    pub fn scale(&self, channel: &str) -> Option<&Arc<Scale>> {
        let name = scale_channel(channel);
        self.scales
            .iter()
            .find(|(scale_name, _)| &**scale_name == name)
            .map(|(_, scale)| scale)
    }

    /// Projects a normalized position through the view's coordinate.
    pub fn position(&self, u: f64, v: f64) -> Point {
        self.coord.map(u, v)
    }

    /// The series value of a row: the `series` channel, else `color`.
    pub fn series_value(&self, row: usize) -> Option<&FieldValue> {
        self.value(CHANNEL_SERIES, row)
            .or_else(|| self.value(CHANNEL_COLOR, row))
            .filter(|v| !v.is_null())
    }

    /// The resolved series color for one row.
    ///
    /// A style fill override wins; otherwise the series value's ordinal
    /// index picks from the theme palette.
    pub fn color(&self, row: usize) -> Color {
        if let Some(fill) = self.style.fill {
            return fill;
        }
        let index = self.series_value(row).and_then(|value| {
            let scale = self
                .scale(CHANNEL_SERIES)
                .or_else(|| self.scale(CHANNEL_COLOR))?;
            scale.index_of(value)
        });
        self.theme.series_color(index.unwrap_or(0))
    }

    /// The stable element key for one row.
    ///
    /// An explicit `key` channel wins; otherwise categorical position and
    /// series values name the element; otherwise the row index does.
    pub fn key(&self, row: usize) -> Key {
        if let Some(v) = self.value(CHANNEL_KEY, row)
            && !v.is_null()
        {
            return Key::name(v.label());
        }
        let x = self.value(CHANNEL_X, row);
        let series = self.series_value(row);
        match (x, series) {
            (Some(FieldValue::Str(x)), Some(series)) => {
                Key::name(alloc::format!("{x}/{}", series.label()))
            }
            (Some(FieldValue::Str(x)), None) => Key::Name(x.clone()),
            _ => Key::index(row as u64),
        }
    }

    /// Every channel value of one row, carried onto the visual row.
    pub fn carried(&self, row: usize) -> Vec<RowValue> {
        self.channels
            .iter()
            .filter_map(|c| {
                let value = c.values.get(row)?;
                Some(RowValue {
                    channel: c.channel.clone(),
                    field: c.field.clone(),
                    value: value.clone(),
                })
            })
            .collect()
    }

    /// The scaled `(channel, value)` pairs of one row.
    pub fn scaled_row(&self, row: usize) -> Vec<(Arc<str>, f64)> {
        self.scaled
            .iter()
            .filter_map(|(channel, values)| {
                let v = values.get(row).copied().flatten()?;
                Some((channel.clone(), v))
            })
            .collect()
    }

    /// The display title of one row: its primary position value.
    pub fn title(&self, row: usize) -> FieldValue {
        self.value(CHANNEL_X, row).cloned().unwrap_or(FieldValue::Null)
    }

    /// Assembles a single-datum visual row around the given points.
    pub fn datum_row(&self, row: usize, points: Vec<Point>) -> VisualRow {
        VisualRow {
            key: self.key(row),
            points,
            transform: None,
            scaled: self.scaled_row(row),
            values: self.carried(row),
            shape: self.shape.clone(),
            animation: self.animation.cloned(),
            series_rows: Vec::from([row]),
            color: self.color(row),
            title: self.title(row),
        }
    }
}

/// A mark type: channel contract plus geometry.
pub trait MarkDefinition {
    /// Registry tag.
    fn tag(&self) -> &'static str;

    /// Default shape tag for rendered rows.
    fn default_shape(&self) -> &'static str;

    /// Preferred discrete scale family for position channels.
    fn discrete_position(&self) -> ScaleKind {
        ScaleKind::Point
    }

    /// Whether inferred continuous position domains extend to zero.
    fn includes_zero(&self) -> bool {
        false
    }

    /// Computes the renderable elements for this mark.
    fn build(&self, input: &GeometryInput<'_>) -> Vec<VisualRow>;
}

/// A statistical adjustment applied to a mark's produced rows.
///
/// Runs between geometry and visual-data finalization, so an adjuster sees
/// pixel-space points and may move them or set a per-row transform. The
/// runtime ships the hook only; implementations register through the
/// registry's adjust table.
pub trait Adjust {
    /// Registry tag.
    fn tag(&self) -> &'static str;

    /// Adjusts the produced rows in place.
    fn apply(&self, rows: &mut [VisualRow]);
}

/// Turns one visual row into drawable scene content.
pub trait ShapeRenderer {
    /// Registry tag.
    fn tag(&self) -> &'static str;

    /// Renders the row's geometry and paint.
    fn render(&self, row: &VisualRow, theme: &Theme, style: &StyleSpec) -> ShapeData;
}
