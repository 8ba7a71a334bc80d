// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `line` mark: one polyline element per series.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use smallvec::SmallVec;
use trellis_scene::{Geometry, Key, Paint, ShapeData};

use crate::mark::{
    CHANNEL_X, CHANNEL_Y, GeometryInput, MarkDefinition, ShapeRenderer, VisualRow,
};
use crate::spec::StyleSpec;
use crate::theme::Theme;
use crate::value::FieldValue;

/// Line mark: rows are grouped by the series (else color) channel and each
/// group becomes a single polyline element through its points in row order.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineMark;

impl MarkDefinition for LineMark {
    fn tag(&self) -> &'static str {
        "line"
    }

    fn default_shape(&self) -> &'static str {
        "line"
    }

    fn build(&self, input: &GeometryInput<'_>) -> Vec<VisualRow> {
        // Group filtered rows by series value, preserving row order within
        // and first-seen order across groups.
        let mut groups: Vec<(FieldValue, Vec<usize>)> = Vec::new();
        for &row in input.rows {
            let series = input.series_value(row).cloned().unwrap_or(FieldValue::Null);
            match groups.iter_mut().find(|(value, _)| *value == series) {
                Some((_, rows)) => rows.push(row),
                None => groups.push((series, Vec::from([row]))),
            }
        }

        groups
            .into_iter()
            .filter_map(|(series, rows)| {
                let first = *rows.first()?;
                let mut points = Vec::with_capacity(rows.len());
                for &row in &rows {
                    let u = input.scaled(CHANNEL_X, row)?;
                    let v = input.scaled(CHANNEL_Y, row)?;
                    points.push(input.position(u, v));
                }
                let key = match &series {
                    FieldValue::Null => Key::index(first as u64),
                    value => Key::name(value.label()),
                };
                let mut element = input.datum_row(first, points);
                element.key = key;
                element.series_rows = rows;
                Some(element)
            })
            .collect()
    }
}

/// Shape renderer for polyline elements.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineShape;

impl ShapeRenderer for LineShape {
    fn tag(&self) -> &'static str {
        "line"
    }

    fn render(&self, row: &VisualRow, theme: &Theme, style: &StyleSpec) -> ShapeData {
        let stroke = style.stroke.unwrap_or(row.color);
        let width = style.stroke_width.unwrap_or(theme.line_width);
        let mut paint = Paint::stroke(stroke, width);
        paint.opacity = style.opacity.unwrap_or(1.0);
        ShapeData {
            geometry: Geometry::Polyline(SmallVec::from_slice(&row.points)),
            paint,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec::Vec;

    use kurbo::Rect;

    use super::*;
    use crate::coord::Coordinate;
    use crate::mark::{CHANNEL_COLOR, MarkState};
    use crate::scale::{Scale, ScalePoint};
    use crate::spec::MarkSpec;
    use crate::value::Record;

    #[test]
    fn one_polyline_per_series_in_first_seen_order() {
        let rows = Vec::from([
            Record::new().with("month", "Jan.").with("value", 1.0).with("city", "London"),
            Record::new().with("month", "Jan.").with("value", 2.0).with("city", "Berlin"),
            Record::new().with("month", "Feb.").with("value", 3.0).with("city", "London"),
            Record::new().with("month", "Feb.").with("value", 4.0).with("city", "Berlin"),
        ]);
        let spec = MarkSpec::new("line")
            .with_encode(CHANNEL_X, "month")
            .with_encode(CHANNEL_Y, "value")
            .with_encode(CHANNEL_COLOR, "city");
        let state = MarkState::init(&spec, &rows, Arc::from("line"));

        let scaled = Vec::from([
            (
                Arc::<str>::from(CHANNEL_X),
                Vec::from([Some(0.0), Some(0.0), Some(1.0), Some(1.0)]),
            ),
            (
                Arc::<str>::from(CHANNEL_Y),
                Vec::from([Some(0.1), Some(0.2), Some(0.3), Some(0.4)]),
            ),
        ]);
        let color_scale = Arc::new(Scale::Point(ScalePoint {
            values: Vec::from([FieldValue::from("London"), FieldValue::from("Berlin")]),
            padding: 0.5,
            field: Some(Arc::from("city")),
        }));
        let scales = Vec::from([(Arc::<str>::from(CHANNEL_COLOR), color_scale)]);
        let coord = Coordinate::new(Rect::new(0.0, 0.0, 100.0, 100.0), []);
        let theme = Theme::light();
        let filtered = [0, 1, 2, 3];
        let shape: Arc<str> = Arc::from("line");
        let input = GeometryInput {
            rows: &filtered,
            channels: &state.channels,
            scaled: &scaled,
            scales: &scales,
            coord: &coord,
            theme: &theme,
            style: &StyleSpec::default(),
            shape: &shape,
            animation: None,
        };

        let visual = LineMark.build(&input);
        assert_eq!(visual.len(), 2);
        assert_eq!(visual[0].key, Key::name("London"));
        assert_eq!(visual[1].key, Key::name("Berlin"));
        assert_eq!(visual[0].series_rows, [0, 2]);
        assert_eq!(visual[1].series_rows, [1, 3]);
        assert_eq!(visual[0].points.len(), 2);
        assert_ne!(visual[0].color, visual[1].color);
    }
}
