// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tooltip resolution: nearest-datum search and the tooltip action.
//!
//! Resolution is a pure function from the rendered elements and the pointer
//! position to a display payload. Distance is measured along the primary
//! axis only (pixel x, or pixel y under a transposed frame), so series
//! stacked at one x are equally near and cluster into a single tooltip.
//! The action that renders the result owns all side effects: crosshair and
//! marker nodes in the view's transient layer, hidden (not removed) on a
//! miss or on pointer leave.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Point;
use peniko::Color;
use smallvec::smallvec;
use trellis_scene::{Geometry, Paint, ShapeData};

use crate::error::ChartError;
use crate::interaction::{Action, ActionBuilder, ActionScope};
use crate::mark::{CHANNEL_X, ElementDatum, VisualRow};
use crate::pipeline::View;
use crate::spec::{InteractionSpec, TOOLTIP_PREFIX};
use crate::value::FieldValue;

/// One displayable field at the tooltip position.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipItem {
    /// Display name, from the field's resolved label.
    pub name: String,
    /// Formatted value.
    pub value: String,
    /// Series color of the element that produced the item.
    pub color: Color,
    /// The item's own title (its primary-axis value).
    pub title: String,
    /// Pixel x of the item's representative point.
    pub x: f64,
    /// Pixel y of the item's representative point.
    pub y: f64,
}

/// The aggregate payload for the nearest-datum cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipData {
    /// De-duplicated, comma-joined per-item titles.
    pub title: String,
    /// Pixel x of the nearest candidate.
    pub x: f64,
    /// Pixel y of the nearest candidate.
    pub y: f64,
    /// One item per clustered field, in candidate iteration order.
    pub items: Vec<TooltipItem>,
}

/// Tooltip behavior options.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TooltipOptions {
    /// Consider every rendered element, not just the current selection, and
    /// show one entry per series at the matched position.
    pub shared: bool,
}

/// An element's datum expanded into one nearest-neighbor candidate.
struct Candidate {
    point: Point,
    x_value: FieldValue,
    title: String,
    items: Vec<TooltipItem>,
}

/// A datum with more than this many points is treated as polyline-like and
/// expanded per point; at or below it, as a simple or quad datum with one
/// representative point.
const POLYLINE_POINTS: usize = 4;

/// Resolves the tooltip payload for the given elements and pointer position.
///
/// Pure: rendering and hiding are the action's concern. Returns `None` when
/// no clustered item survives (no element carries a tooltip channel, or the
/// candidate set is empty).
pub fn resolve_tooltip(
    view: &View,
    elements: &[ElementDatum],
    pointer: Point,
) -> Option<TooltipData> {
    let mut candidates = Vec::new();
    for datum in elements {
        expand_element(view, datum, &mut candidates);
    }
    if candidates.is_empty() {
        return None;
    }

    let transposed = view.coord.is_transpose();
    let axis = |p: Point| if transposed { p.y } else { p.x };
    let target = axis(pointer);

    // 1-D nearest along the primary axis; strict `<` keeps the first of an
    // exact tie in iteration order.
    let mut least = 0_usize;
    let mut least_d = f64::INFINITY;
    for (i, candidate) in candidates.iter().enumerate() {
        let d = axis(candidate.point) - target;
        let d = d * d;
        if d < least_d {
            least_d = d;
            least = i;
        }
    }

    let nearest_x = candidates[least].x_value.clone();
    let nearest_point = candidates[least].point;

    let mut titles: Vec<String> = Vec::new();
    let mut items = Vec::new();
    for candidate in &candidates {
        if candidate.x_value != nearest_x {
            continue;
        }
        if !candidate.items.is_empty() && !titles.contains(&candidate.title) {
            titles.push(candidate.title.clone());
        }
        items.extend(candidate.items.iter().cloned());
    }
    if items.is_empty() {
        return None;
    }

    Some(TooltipData {
        title: titles.join(", "),
        x: nearest_point.x,
        y: nearest_point.y,
        items,
    })
}

fn expand_element(view: &View, datum: &ElementDatum, out: &mut Vec<Candidate>) {
    let row = &datum.row;
    if row.points.len() > POLYLINE_POINTS {
        expand_polyline(view, datum, out);
    } else if let Some(candidate) = simple_candidate(view, row) {
        out.push(candidate);
    }
}

/// Expands a polyline element into one pseudo-candidate per point, with the
/// synthetic `x_value` read positionally from the x scale's domain.
fn expand_polyline(view: &View, datum: &ElementDatum, out: &mut Vec<Candidate>) {
    let row = &datum.row;
    let domain = view
        .scale(CHANNEL_X)
        .map(|scale| scale.domain_values())
        .unwrap_or_default();
    let state = view.mark(&datum.mark).map(|mark| &mark.state);

    for (i, &point) in row.points.iter().enumerate() {
        let x_value = domain.get(i).cloned().unwrap_or(FieldValue::Null);
        let title = x_value.label();
        let mut items = Vec::new();
        if let (Some(state), Some(&source)) = (state, row.series_rows.get(i)) {
            for channel in &state.channels {
                if !channel.channel.starts_with(TOOLTIP_PREFIX) {
                    continue;
                }
                let Some(value) = channel.values.get(source) else {
                    continue;
                };
                if value.is_null() {
                    continue;
                }
                items.push(TooltipItem {
                    name: display_name(channel.field.as_deref(), &channel.channel),
                    value: value.label(),
                    color: row.color,
                    title: title.clone(),
                    x: point.x,
                    y: point.y,
                });
            }
        }
        out.push(Candidate {
            point,
            x_value,
            title,
            items,
        });
    }
}

/// Reduces a simple or quad datum to its centroid-weighted representative
/// point (average of the first and, if present, third point).
fn simple_candidate(view: &View, row: &VisualRow) -> Option<Candidate> {
    let first = *row.points.first()?;
    let point = match row.points.get(2) {
        Some(third) => Point::new(0.5 * (first.x + third.x), 0.5 * (first.y + third.y)),
        None => first,
    };

    let x_value = match (view.scale(CHANNEL_X), row.scaled(CHANNEL_X)) {
        (Some(scale), Some(scaled)) => scale.invert(scaled),
        _ => row.value(CHANNEL_X).cloned().unwrap_or(FieldValue::Null),
    };
    let title = row.title.label();

    let items = row
        .tooltip_values()
        .filter(|v| !v.value.is_null())
        .map(|v| TooltipItem {
            name: display_name(v.field.as_deref(), &v.channel),
            value: v.value.label(),
            color: row.color,
            title: title.clone(),
            x: point.x,
            y: point.y,
        })
        .collect();

    Some(Candidate {
        point,
        x_value,
        title,
        items,
    })
}

fn display_name(field: Option<&str>, channel: &str) -> String {
    match field {
        Some(field) => String::from(field),
        None => String::from(channel),
    }
}

/// Builder for the `tooltip` action.
///
/// Options: `shared` (bool, default false).
#[derive(Clone, Copy, Debug, Default)]
pub struct TooltipBuilder;

impl ActionBuilder for TooltipBuilder {
    fn tag(&self) -> &'static str {
        "tooltip"
    }

    fn build(&self, spec: &InteractionSpec) -> alloc::sync::Arc<dyn Action> {
        alloc::sync::Arc::new(TooltipAction {
            options: TooltipOptions {
                shared: spec.bool_param("shared", false),
            },
        })
    }
}

/// The tooltip action: resolves the payload and renders the affordances.
#[derive(Clone, Copy, Debug)]
pub struct TooltipAction {
    options: TooltipOptions,
}

const CROSSHAIR_CLASS: &str = "crosshair";
const MARKER_CLASS: &str = "marker";

impl Action for TooltipAction {
    fn run(&self, scope: &mut ActionScope<'_>) -> Result<(), ChartError> {
        let Some(pointer) = scope.event.position() else {
            hide(scope);
            return Ok(());
        };

        let nodes = if self.options.shared {
            scope
                .scene
                .descendants_of_class(scope.layers.plot, "element", true)
        } else {
            scope.shared.selected_elements.clone()
        };
        let elements: Vec<ElementDatum> = nodes
            .iter()
            .filter_map(|id| scope.scene.get(*id))
            .filter_map(|node| node.datum_ref::<ElementDatum>().cloned())
            .collect();

        match resolve_tooltip(scope.view, &elements, pointer) {
            Some(data) => {
                show(scope, &data);
                *scope.tooltip = Some(data);
            }
            None => hide(scope),
        }
        Ok(())
    }
}

fn hide(scope: &mut ActionScope<'_>) {
    let transient = scope.layers.transient;
    scope.scene.set_class_visible(transient, CROSSHAIR_CLASS, false);
    scope.scene.set_class_visible(transient, MARKER_CLASS, false);
    *scope.tooltip = None;
}

fn show(scope: &mut ActionScope<'_>, data: &TooltipData) {
    let plot = scope.view.coord.plot();
    let theme = &scope.view.theme;
    let transient = scope.layers.transient;

    // Markers are keyed by index among this call's visible items; hide the
    // whole class first so stale indices from a larger previous cluster do
    // not linger.
    scope.scene.set_class_visible(transient, MARKER_CLASS, false);

    let crosshair = if scope.view.coord.is_transpose() {
        smallvec![Point::new(plot.x0, data.y), Point::new(plot.x1, data.y)]
    } else {
        smallvec![Point::new(data.x, plot.y0), Point::new(data.x, plot.y1)]
    };
    scope.scene.upsert_shape(
        transient,
        "crosshair-0",
        CROSSHAIR_CLASS,
        ShapeData {
            geometry: Geometry::Polyline(crosshair),
            paint: Paint::stroke(theme.crosshair, 1.0),
        },
    );

    for (i, item) in data.items.iter().enumerate() {
        scope.scene.upsert_shape(
            transient,
            alloc::format!("marker-{i}").as_str(),
            MARKER_CLASS,
            ShapeData {
                geometry: Geometry::Circle {
                    center: Point::new(item.x, item.y),
                    radius: theme.marker_radius,
                },
                paint: Paint::fill(item.color),
            },
        );
    }
}
