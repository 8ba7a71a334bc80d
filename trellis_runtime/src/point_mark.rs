// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `point` mark: one symbol per row.

extern crate alloc;

use alloc::vec::Vec;

use trellis_scene::{Geometry, Paint, ShapeData};

use crate::mark::{CHANNEL_X, CHANNEL_Y, GeometryInput, MarkDefinition, ShapeRenderer, VisualRow};
use crate::spec::StyleSpec;
use crate::theme::Theme;

/// Point mark.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointMark;

impl MarkDefinition for PointMark {
    fn tag(&self) -> &'static str {
        "point"
    }

    fn default_shape(&self) -> &'static str {
        "symbol"
    }

    fn build(&self, input: &GeometryInput<'_>) -> Vec<VisualRow> {
        input
            .rows
            .iter()
            .filter_map(|&row| {
                let u = input.scaled(CHANNEL_X, row)?;
                let v = input.scaled(CHANNEL_Y, row)?;
                Some(input.datum_row(row, Vec::from([input.position(u, v)])))
            })
            .collect()
    }
}

/// Shape renderer for circle symbol elements.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymbolShape;

impl ShapeRenderer for SymbolShape {
    fn tag(&self) -> &'static str {
        "symbol"
    }

    fn render(&self, row: &VisualRow, theme: &Theme, style: &StyleSpec) -> ShapeData {
        let center = row.points.first().copied().unwrap_or_default();
        let radius = style.radius.unwrap_or(theme.point_radius);
        let mut paint = Paint::fill(row.color);
        paint.stroke = style.stroke;
        paint.opacity = style.opacity.unwrap_or(1.0);
        ShapeData {
            geometry: Geometry::Circle { center, radius },
            paint,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use kurbo::{Point, Rect};

    use super::*;
    use crate::coord::Coordinate;
    use crate::mark::MarkState;
    use crate::spec::MarkSpec;
    use crate::value::Record;

    #[test]
    fn rows_without_positions_produce_no_symbol() {
        let rows = Vec::from([
            Record::new().with("x", 1.0).with("y", 2.0),
            Record::new().with("x", 3.0),
        ]);
        let spec = MarkSpec::new("point")
            .with_encode(CHANNEL_X, "x")
            .with_encode(CHANNEL_Y, "y");
        let state = MarkState::init(&spec, &rows, Arc::from("symbol"));

        let scaled = Vec::from([
            (Arc::<str>::from(CHANNEL_X), Vec::from([Some(0.0), Some(1.0)])),
            (Arc::<str>::from(CHANNEL_Y), Vec::from([Some(1.0), None])),
        ]);
        let coord = Coordinate::new(Rect::new(0.0, 0.0, 10.0, 10.0), []);
        let theme = Theme::light();
        let filtered = [0, 1];
        let shape: Arc<str> = Arc::from("symbol");
        let input = GeometryInput {
            rows: &filtered,
            channels: &state.channels,
            scaled: &scaled,
            scales: &[],
            coord: &coord,
            theme: &theme,
            style: &StyleSpec::default(),
            shape: &shape,
            animation: None,
        };

        let visual = PointMark.build(&input);
        assert_eq!(visual.len(), 1);
        assert_eq!(visual[0].points, [Point::new(0.0, 0.0)]);
    }
}
