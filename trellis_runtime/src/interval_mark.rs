// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `interval` mark: one four-corner quad per row.
//!
//! The x channel prefers a band scale; each row spans its band from a
//! baseline to its y value. An optional `y1` channel moves the baseline,
//! which is what waterfall-style ranges use. Corners are emitted in
//! top-left, top-right, bottom-right, bottom-left order so the tooltip
//! resolver's first/third-point average lands on the quad center.

extern crate alloc;

use alloc::vec::Vec;

use smallvec::SmallVec;
use trellis_scene::{Geometry, Paint, ShapeData};

use crate::mark::{
    CHANNEL_X, CHANNEL_Y, CHANNEL_Y1, GeometryInput, MarkDefinition, ShapeRenderer, VisualRow,
};
use crate::scale::ScaleKind;
use crate::spec::StyleSpec;
use crate::theme::Theme;
use crate::value::FieldValue;

/// Interval mark.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntervalMark;

impl MarkDefinition for IntervalMark {
    fn tag(&self) -> &'static str {
        "interval"
    }

    fn default_shape(&self) -> &'static str {
        "rect"
    }

    fn discrete_position(&self) -> ScaleKind {
        ScaleKind::Band
    }

    fn includes_zero(&self) -> bool {
        true
    }

    fn build(&self, input: &GeometryInput<'_>) -> Vec<VisualRow> {
        let band = input
            .scale(CHANNEL_X)
            .and_then(|scale| scale.band_width())
            .unwrap_or(0.0);

        input
            .rows
            .iter()
            .filter_map(|&row| {
                let u0 = input.scaled(CHANNEL_X, row)?;
                let v1 = input.scaled(CHANNEL_Y, row)?;
                let v0 = input.scaled(CHANNEL_Y1, row).unwrap_or_else(|| {
                    input
                        .scale(CHANNEL_Y)
                        .and_then(|scale| scale.map(&FieldValue::Number(0.0)))
                        .unwrap_or(0.0)
                });
                let u1 = u0 + band;
                let points = Vec::from([
                    input.position(u0, v1),
                    input.position(u1, v1),
                    input.position(u1, v0),
                    input.position(u0, v0),
                ]);
                Some(input.datum_row(row, points))
            })
            .collect()
    }
}

/// Shape renderer for filled quad elements.
#[derive(Clone, Copy, Debug, Default)]
pub struct RectShape;

impl ShapeRenderer for RectShape {
    fn tag(&self) -> &'static str {
        "rect"
    }

    fn render(&self, row: &VisualRow, _theme: &Theme, style: &StyleSpec) -> ShapeData {
        let mut paint = Paint::fill(row.color);
        paint.stroke = style.stroke;
        if let Some(width) = style.stroke_width {
            paint.stroke_width = width;
        }
        paint.opacity = style.opacity.unwrap_or(1.0);
        ShapeData {
            geometry: Geometry::Polygon(SmallVec::from_slice(&row.points)),
            paint,
        }
    }
}
