// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The view pipeline: one leaf specification node to one resolved [`View`].
//!
//! `initialize_view` runs the staged resolution the runtime is built around:
//! theme, mark initialization, per-channel scale union, guide inference,
//! layout, coordinate construction, scale application, row filtering,
//! geometry, adjustment, and derived children. Configuration errors (unknown
//! mark/shape/adjust/theme tags) are fatal and stop the whole pipeline; a
//! view that merely renders nothing is not an error.

extern crate alloc;

use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::component::{GuideComponent, guide_margins, infer_guides, place_guides};
use crate::coord::{CoordDirective, Coordinate};
use crate::error::ChartError;
use crate::layout::{LayoutSpec, ViewLayout};
use crate::mark::{
    CHANNEL_KEY, CHANNEL_X, CHANNEL_Y, CHANNEL_Y1, ChannelValues, GeometryInput, MarkState,
    is_position_channel, scale_channel,
};
use crate::registry::Registry;
use crate::scale::{Scale, ScaleConfig, ScaleDescriptor, ScaleKind};
use crate::spec::{InteractionSpec, MarkSpec, SpecNode, StyleSpec, TOOLTIP_PREFIX};
use crate::theme::Theme;
use crate::value::Record;

/// One resolved mark layer within a view.
#[derive(Clone, Debug)]
pub struct MarkRender {
    /// Stable layer key among the view's marks.
    pub key: Arc<str>,
    /// Mark type tag.
    pub mark_type: Arc<str>,
    /// Style attributes.
    pub style: StyleSpec,
    /// The layer's resolved state and visual data.
    pub state: MarkState,
}

/// The resolved, renderable unit for one leaf specification node.
///
/// Owned by the pipeline, read by the reconciler and the interaction engine
/// for the lifetime of one render pass, superseded (not mutated) on the next.
#[derive(Clone, Debug)]
pub struct View {
    /// Stable identity across renders.
    pub key: Arc<str>,
    /// Resolved outer bounds, plot rectangle and padding.
    pub layout: ViewLayout,
    /// Resolved theme.
    pub theme: Theme,
    /// Resolved coordinate system.
    pub coord: Coordinate,
    /// Channel name to shared scale instance.
    pub scales: Vec<(Arc<str>, Arc<Scale>)>,
    /// Inferred guide components, placed.
    pub components: Vec<GuideComponent>,
    /// Mark layers in paint order.
    pub marks: Vec<MarkRender>,
    /// Interaction directives, in declared order.
    pub interactions: Vec<InteractionSpec>,
    /// Whether to draw a frame around the view bounds.
    pub frame: bool,
}

impl View {
    /// The shared scale a channel reads from (`y1` aligns with `y`).
    pub fn scale(&self, channel: &str) -> Option<&Arc<Scale>> {
        let name = scale_channel(channel);
        self.scales
            .iter()
            .find(|(scale_name, _)| &**scale_name == name)
            .map(|(_, scale)| scale)
    }

    /// Look up a mark layer by key.
    pub fn mark(&self, key: &str) -> Option<&MarkRender> {
        self.marks.iter().find(|mark| &*mark.key == key)
    }
}

/// Whether a channel gets a scale at all.
///
/// Tooltip and key channels are passthrough: their values ride on visual
/// rows for interaction code but never map to a visual property.
fn is_scaled_channel(channel: &str) -> bool {
    !channel.starts_with(TOOLTIP_PREFIX) && channel != CHANNEL_KEY
}

/// Resolves one leaf node into a view plus any derived child nodes.
pub fn initialize_view(
    node: &SpecNode,
    registry: &Registry,
) -> Result<(View, Vec<SpecNode>), ChartError> {
    // 1. Theme.
    let mut theme = registry
        .theme(&node.theme.name)
        .ok_or_else(|| ChartError::UnknownTheme {
            name: node.theme.name.clone(),
        })?
        .clone();
    node.theme.apply(&mut theme);

    // 2. Mark initialization and per-channel scale union.
    struct MarkInit<'a> {
        spec: &'a MarkSpec,
        rows: Arc<[Record]>,
        state: MarkState,
    }

    let mut inits: Vec<MarkInit<'_>> = Vec::with_capacity(node.marks.len());
    let mut descriptors: Vec<(Arc<str>, ScaleDescriptor, Option<Arc<str>>)> = Vec::new();

    for spec in &node.marks {
        let definition = registry
            .mark(&spec.mark_type)
            .ok_or_else(|| ChartError::UnknownMark {
                tag: spec.mark_type.clone(),
            })?;
        let rows = spec
            .data
            .clone()
            .or_else(|| node.data.clone())
            .unwrap_or_else(|| Arc::from(Vec::new()));
        let state = MarkState::init(spec, &rows, Arc::from(definition.default_shape()));

        for channel in &state.channels {
            if !is_scaled_channel(&channel.channel) {
                continue;
            }
            let scale_name = scale_channel(&channel.channel);
            let config = spec
                .scale_config(&channel.channel)
                .or_else(|| spec.scale_config(scale_name))
                .cloned()
                .unwrap_or_default();
            let discrete = if is_position_channel(scale_name) {
                definition.discrete_position()
            } else {
                ScaleKind::Point
            };
            let zero = definition.includes_zero() && scale_name == CHANNEL_Y;
            let descriptor = ScaleDescriptor::infer(&channel.values, &config, discrete, zero);
            merge_descriptor(&mut descriptors, scale_name, descriptor, channel.field.clone());
        }

        inits.push(MarkInit { spec, rows, state });
    }

    // Materialize one shared instance per channel.
    let scales: Vec<(Arc<str>, Arc<Scale>)> = descriptors
        .iter()
        .map(|(name, descriptor, field)| {
            (name.clone(), Arc::new(descriptor.materialize(field.clone())))
        })
        .collect();

    // 3. Guides, layout, coordinate.
    let transposed = node
        .coordinate
        .iter()
        .filter(|d| matches!(d, CoordDirective::Transpose))
        .count()
        % 2
        == 1;
    let polar = node
        .coordinate
        .iter()
        .any(|d| matches!(d, CoordDirective::Polar { .. }));
    let mut components = infer_guides(&scales, transposed, polar, &theme);
    let layout = ViewLayout::arrange(&LayoutSpec {
        origin: node.origin,
        size: node.size.unwrap_or_default(),
        guides: guide_margins(&components),
        padding: node.padding,
        ..LayoutSpec::default()
    });
    let coord = Coordinate::new(layout.plot, node.coordinate.clone());

    // 4. Component placement.
    place_guides(&mut components, layout.plot);

    // 5. Scale application, filtering, geometry, adjustment.
    let mut marks = Vec::with_capacity(inits.len());
    let mut children = Vec::new();

    for (ordinal, init) in inits.into_iter().enumerate() {
        let MarkInit {
            spec,
            rows,
            mut state,
        } = init;
        let definition = registry
            .mark(&spec.mark_type)
            .ok_or_else(|| ChartError::UnknownMark {
                tag: spec.mark_type.clone(),
            })?;

        let scaled = apply_scales(&state.channels, &scales);
        let filtered = filter_rows(&state.channels, &scaled, spec, &rows);

        let shape: Arc<str> = spec.shape.clone().unwrap_or_else(|| state.default_shape.clone());
        if registry.shape(&shape).is_none() {
            return Err(ChartError::UnknownShape { tag: shape });
        }

        let input = GeometryInput {
            rows: &filtered,
            channels: &state.channels,
            scaled: &scaled,
            scales: &scales,
            coord: &coord,
            theme: &theme,
            style: &spec.style,
            shape: &shape,
            animation: spec.animation.as_ref(),
        };
        let mut visual = definition.build(&input);

        if let Some(tag) = &spec.adjust {
            let adjust = registry
                .adjust(tag)
                .ok_or_else(|| ChartError::UnknownAdjust { tag: tag.clone() })?;
            adjust.apply(&mut visual);
        }

        // Post-regroup index: one entry per element, its leading source row.
        state.index = visual
            .iter()
            .map(|row| row.series_rows.first().copied().unwrap_or(0))
            .collect();
        state.visual = visual;

        // 6. Derived children.
        if let Some(produce) = &spec.children {
            for mut child in produce(&rows, &state.visual) {
                if child.data.is_none() {
                    child.data = Some(rows.clone());
                }
                children.push(child);
            }
        }

        marks.push(MarkRender {
            key: spec
                .key
                .clone()
                .unwrap_or_else(|| Arc::from(format!("mark-{ordinal}"))),
            mark_type: spec.mark_type.clone(),
            style: spec.style,
            state,
        });
    }

    let view = View {
        key: node.key.clone().unwrap_or_else(|| Arc::from("view")),
        layout,
        theme,
        coord,
        scales,
        components,
        marks,
        interactions: node.interactions.clone(),
        frame: node.frame,
    };
    Ok((view, children))
}

fn merge_descriptor(
    descriptors: &mut Vec<(Arc<str>, ScaleDescriptor, Option<Arc<str>>)>,
    name: &str,
    descriptor: ScaleDescriptor,
    field: Option<Arc<str>>,
) {
    match descriptors.iter_mut().find(|(n, _, _)| &**n == name) {
        Some((_, existing, existing_field)) => {
            existing.merge(&descriptor);
            if existing_field.is_none() {
                *existing_field = field;
            }
        }
        None => descriptors.push((Arc::from(name), descriptor, field)),
    }
}

/// Maps every scaled channel's abstract values to normalized positions.
fn apply_scales(
    channels: &[ChannelValues],
    scales: &[(Arc<str>, Arc<Scale>)],
) -> Vec<(Arc<str>, Vec<Option<f64>>)> {
    channels
        .iter()
        .filter(|c| is_scaled_channel(&c.channel))
        .filter_map(|c| {
            let name = scale_channel(&c.channel);
            let (_, scale) = scales.iter().find(|(n, _)| &**n == name)?;
            let values = c.values.iter().map(|v| scale.map(v)).collect();
            Some((c.channel.clone(), values))
        })
        .collect()
}

/// Keeps rows whose encoded position channels all resolved and whose facet
/// predicate (if any) accepts the source record.
fn filter_rows(
    channels: &[ChannelValues],
    scaled: &[(Arc<str>, Vec<Option<f64>>)],
    spec: &MarkSpec,
    rows: &[Record],
) -> Vec<usize> {
    let positions: Vec<&(Arc<str>, Vec<Option<f64>>)> = scaled
        .iter()
        .filter(|(name, _)| {
            matches!(&**name, CHANNEL_X | CHANNEL_Y | CHANNEL_Y1)
                && channels.iter().any(|c| c.channel == *name)
        })
        .collect();

    (0..rows.len())
        .filter(|&row| {
            let defined = positions
                .iter()
                .all(|(_, values)| values.get(row).copied().flatten().is_some());
            let kept = spec.filter.as_ref().is_none_or(|f| f(&rows[row]));
            defined && kept
        })
        .collect()
}
