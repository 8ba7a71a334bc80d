// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The chart driver: owns the specification, the scene tree and the per-view
//! interaction contexts, and keeps them consistent.
//!
//! [`Chart::render`] resolves the specification into views and reconciles
//! each view's subtree against the scene, so repeated renders of an unchanged
//! specification produce only in-place updates. [`Chart::pointer`] routes
//! canvas events to the view under the pointer (and a leave to the others)
//! and runs that view's action chain; actions may file specification edits,
//! which the driver applies synchronously before the chain continues.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

use kurbo::Point;
use smallvec::smallvec;
use trellis_scene::{
    DesiredNode, Geometry, Key, NodeDiff, NodeId, Paint, SceneTree, ShapeData,
};

use crate::composition::resolve_views;
use crate::error::ChartError;
use crate::interaction::{
    Action, ActionScope, InteractionContext, Layers, PointerEvent, SharedState, TriggerInfo,
    UpdateRequest,
};
use crate::mark::ElementDatum;
use crate::pipeline::{View, initialize_view};
use crate::registry::Registry;
use crate::spec::{InteractionSpec, SpecNode};
use crate::tooltip::TooltipData;

/// Reconciliation counts for one render pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Resolved leaf views.
    pub views: usize,
    /// Nodes created.
    pub enters: usize,
    /// Nodes retained.
    pub updates: usize,
    /// Retained nodes whose content actually differed.
    pub changed: usize,
    /// Nodes removed.
    pub exits: usize,
}

impl RenderStats {
    fn accumulate(&mut self, diffs: &[NodeDiff]) {
        for diff in diffs {
            match diff {
                NodeDiff::Enter { .. } => self.enters += 1,
                NodeDiff::Update { changed, .. } => {
                    self.updates += 1;
                    if *changed {
                        self.changed += 1;
                    }
                }
                NodeDiff::Exit { .. } => self.exits += 1,
            }
        }
    }
}

/// One currently rendered view: its leaf specification, resolved state,
/// scene handles and interaction context.
struct RenderedView {
    node: SpecNode,
    view: View,
    layers: Layers,
    context: InteractionContext,
}

/// A renderable, interactive chart.
pub struct Chart {
    registry: Registry,
    spec: SpecNode,
    scene: SceneTree,
    views: Vec<RenderedView>,
}

impl fmt::Debug for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chart")
            .field("scene", &self.scene)
            .field(
                "views",
                &self.views.iter().map(|r| &r.view.key).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Chart {
    /// A chart over the built-in registry.
    pub fn new(spec: SpecNode) -> Self {
        Self::with_registry(spec, Registry::with_defaults())
    }

    /// A chart over a caller-assembled registry.
    pub fn with_registry(spec: SpecNode, registry: Registry) -> Self {
        Self {
            registry,
            spec,
            scene: SceneTree::new(),
            views: Vec::new(),
        }
    }

    /// The scene tree, for embedders to paint.
    pub fn scene(&self) -> &SceneTree {
        &self.scene
    }

    /// The root specification, for edits between renders.
    pub fn spec_mut(&mut self) -> &mut SpecNode {
        &mut self.spec
    }

    /// A rendered view by key.
    pub fn view(&self, key: &str) -> Option<&View> {
        self.views
            .iter()
            .find(|r| &*r.view.key == key)
            .map(|r| &r.view)
    }

    /// The element nodes currently selected in a view, for embedders to
    /// highlight.
    pub fn selection(&self, key: &str) -> &[NodeId] {
        self.views
            .iter()
            .find(|r| &*r.view.key == key)
            .map(|r| r.context.shared.selected_elements.as_slice())
            .unwrap_or(&[])
    }

    /// The last resolved tooltip payload of a view.
    pub fn tooltip(&self, key: &str) -> Option<&TooltipData> {
        self.views
            .iter()
            .find(|r| &*r.view.key == key)
            .and_then(|r| r.context.tooltip.as_ref())
    }

    /// Resolves the specification and reconciles the scene against it.
    ///
    /// Views keep their interaction state (selection, triggers, tooltip)
    /// across renders as long as their key survives; action chains are
    /// rebuilt from the current directives.
    pub fn render(&mut self) -> Result<RenderStats, ChartError> {
        let resolved = resolve_views(&self.spec, &self.registry)?;
        let mut stats = RenderStats {
            views: resolved.len(),
            ..RenderStats::default()
        };

        let root = self.scene.root();
        let desired = resolved
            .iter()
            .map(|(_, view)| DesiredNode::group(view.key.clone()))
            .collect();
        stats.accumulate(&self.scene.reconcile_children(root, "view", desired));

        let mut previous = mem::take(&mut self.views);
        for (node, view) in resolved {
            let view_id = self
                .scene
                .child_by_key(root, &Key::Name(view.key.clone()))
                .ok_or_else(|| ChartError::UnknownView {
                    key: view.key.clone(),
                })?;
            let layers =
                render_view(&mut self.scene, &self.registry, &view, view_id, &mut stats)?;

            let mut context = match previous
                .iter()
                .position(|r| r.context.view_key == view.key)
            {
                Some(i) => previous.swap_remove(i).context,
                None => InteractionContext {
                    view_key: view.key.clone(),
                    actions: Vec::new(),
                    shared: SharedState::default(),
                    tooltip: None,
                },
            };
            context.actions = build_actions(&self.registry, &view.interactions)?;

            self.views.push(RenderedView {
                node,
                view,
                layers,
                context,
            });
        }

        Ok(stats)
    }

    /// Routes a canvas event: the view containing the position receives it,
    /// every other view receives a leave. A leave (or a position over no
    /// view) goes to all views, so stale affordances clear.
    pub fn pointer(&mut self, event: PointerEvent) -> Result<(), ChartError> {
        let hit = event.position().and_then(|p| {
            self.views
                .iter()
                .position(|r| r.view.layout.view.contains(p))
        });
        for index in 0..self.views.len() {
            if Some(index) == hit {
                self.dispatch(index, event)?;
            } else {
                self.dispatch(index, PointerEvent::Leave)?;
            }
        }
        Ok(())
    }

    /// Dispatches an event to one view by key, bypassing position routing.
    pub fn dispatch_to(&mut self, key: &str, event: PointerEvent) -> Result<(), ChartError> {
        let index = self.view_index(key)?;
        self.dispatch(index, event)
    }

    /// Replaces a view's external selection triggers.
    ///
    /// Triggers persist until replaced; the next dispatched event resolves
    /// them through the selection action.
    pub fn set_trigger_info(
        &mut self,
        key: &str,
        triggers: Vec<TriggerInfo>,
    ) -> Result<(), ChartError> {
        let index = self.view_index(key)?;
        self.views[index].context.shared.trigger_info = triggers;
        Ok(())
    }

    fn view_index(&self, key: &str) -> Result<usize, ChartError> {
        self.views
            .iter()
            .position(|r| &*r.view.key == key)
            .ok_or_else(|| ChartError::UnknownView {
                key: Arc::from(key),
            })
    }

    /// Runs one view's action chain for an event, applying any filed
    /// specification edit between actions.
    fn dispatch(&mut self, index: usize, event: PointerEvent) -> Result<(), ChartError> {
        self.views[index]
            .context
            .shared
            .begin_event(event.position());
        let actions: Vec<(Arc<str>, Arc<dyn Action>)> =
            self.views[index].context.actions.clone();

        for (tag, action) in actions {
            let mut update: Option<UpdateRequest> = None;
            {
                let RenderedView {
                    view,
                    layers,
                    context,
                    ..
                } = &mut self.views[index];
                let mut scope = ActionScope::new(
                    &event,
                    view,
                    *layers,
                    &mut self.scene,
                    &mut context.shared,
                    &mut context.tooltip,
                    &mut update,
                );
                action
                    .run(&mut scope)
                    .map_err(|_| ChartError::ActionFailed { action: tag })?;
            }
            if let Some(edit) = update {
                self.apply_update(index, edit)?;
            }
        }
        Ok(())
    }

    /// Applies an edit to a view's leaf specification, re-runs its pipeline
    /// and re-reconciles its subtree in place.
    fn apply_update(&mut self, index: usize, edit: UpdateRequest) -> Result<(), ChartError> {
        edit(&mut self.views[index].node);
        let (view, _) = initialize_view(&self.views[index].node, &self.registry)?;
        let layers = self.views[index].layers;
        let mut stats = RenderStats::default();
        render_view(&mut self.scene, &self.registry, &view, layers.view, &mut stats)?;
        let actions = build_actions(&self.registry, &view.interactions)?;
        let rendered = &mut self.views[index];
        rendered.view = view;
        rendered.context.actions = actions;
        Ok(())
    }
}

fn build_actions(
    registry: &Registry,
    interactions: &[InteractionSpec],
) -> Result<Vec<(Arc<str>, Arc<dyn Action>)>, ChartError> {
    interactions
        .iter()
        .map(|spec| {
            let builder =
                registry
                    .action(&spec.action)
                    .ok_or_else(|| ChartError::UnknownAction {
                        tag: spec.action.clone(),
                    })?;
            Ok((spec.action.clone(), builder.build(spec)))
        })
        .collect()
}

/// Reconciles one view's subtree: frame, guide components, plot layers and
/// the persistent interaction layers, in paint order.
fn render_view(
    scene: &mut SceneTree,
    registry: &Registry,
    view: &View,
    view_id: NodeId,
    stats: &mut RenderStats,
) -> Result<Layers, ChartError> {
    let plot = ensure_group(scene, view_id, "plot", "plot");
    let selection = ensure_group(scene, view_id, "selection", "selection");
    let transient = ensure_group(scene, view_id, "transient", "transient");

    stats.accumulate(&scene.reconcile_children(view_id, "frame", frame_shapes(view)));

    let components = view
        .components
        .iter()
        .map(|guide| DesiredNode::group(guide.key()))
        .collect();
    stats.accumulate(&scene.reconcile_children(view_id, "component", components));
    for guide in &view.components {
        if let Some(group) = scene.child_by_key(view_id, &guide.key()) {
            let shapes = guide.render(&view.coord, &view.theme);
            stats.accumulate(&scene.reconcile_children(group, "guide", shapes));
        }
    }

    // Classes reconciled above were re-appended after the persistent groups;
    // restore paint order with the interaction layers on top.
    scene.raise(plot);
    scene.raise(selection);
    scene.raise(transient);

    let layer_groups = view
        .marks
        .iter()
        .map(|mark| DesiredNode::group(mark.key.clone()))
        .collect();
    stats.accumulate(&scene.reconcile_children(plot, "layer", layer_groups));
    for mark in &view.marks {
        let Some(group) = scene.child_by_key(plot, &Key::Name(mark.key.clone())) else {
            continue;
        };
        let mut elements = Vec::with_capacity(mark.state.visual.len());
        for row in &mark.state.visual {
            let renderer =
                registry
                    .shape(&row.shape)
                    .ok_or_else(|| ChartError::UnknownShape {
                        tag: row.shape.clone(),
                    })?;
            let mut desired = DesiredNode::shape(
                row.key.clone(),
                renderer.render(row, &view.theme, &mark.style),
            )
            .with_datum(ElementDatum {
                mark: mark.key.clone(),
                row: row.clone(),
            });
            if let Some(transform) = row.transform {
                desired = desired.with_transform(transform);
            }
            elements.push(desired);
        }
        stats.accumulate(&scene.reconcile_children(group, "element", elements));
    }

    Ok(Layers {
        view: view_id,
        plot,
        selection,
        transient,
    })
}

/// The view's background fill and optional frame stroke.
fn frame_shapes(view: &View) -> Vec<DesiredNode> {
    let bounds = view.layout.view;
    let corners = || {
        smallvec![
            Point::new(bounds.x0, bounds.y0),
            Point::new(bounds.x1, bounds.y0),
            Point::new(bounds.x1, bounds.y1),
            Point::new(bounds.x0, bounds.y1),
        ]
    };
    let mut out = Vec::from([DesiredNode::shape(
        "background",
        ShapeData {
            geometry: Geometry::Polygon(corners()),
            paint: Paint::fill(view.theme.background),
        },
    )]);
    if view.frame {
        out.push(DesiredNode::shape(
            "border",
            ShapeData {
                geometry: Geometry::Polygon(corners()),
                paint: Paint::stroke(view.theme.frame_stroke, 1.0),
            },
        ));
    }
    out
}

fn ensure_group(scene: &mut SceneTree, parent: NodeId, key: &str, class: &str) -> NodeId {
    if let Some(id) = scene.child_by_key(parent, &Key::name(key)) {
        return id;
    }
    scene.insert_group(parent, key, class).unwrap_or(parent)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::mark::{CHANNEL_COLOR, CHANNEL_X, CHANNEL_Y};
    use crate::spec::MarkSpec;
    use crate::value::{FieldValue, Record};

    fn weather() -> Vec<Record> {
        let mut rows = Vec::new();
        for (city, values) in [
            ("London", [4.0, 5.0, 8.0, 11.0, 15.0, 17.0]),
            ("Berlin", [1.0, 2.0, 6.0, 10.0, 14.0, 18.0]),
        ] {
            for (month, value) in ["Jan.", "Feb.", "Mar.", "Apr.", "May.", "Jun."]
                .iter()
                .zip(values)
            {
                rows.push(
                    Record::new()
                        .with("month", *month)
                        .with("temperature", value)
                        .with("city", city),
                );
            }
        }
        rows
    }

    fn line_spec() -> SpecNode {
        SpecNode::view()
            .with_data(weather())
            .with_size(480.0, 320.0)
            .with_mark(
                MarkSpec::new("line")
                    .with_encode(CHANNEL_X, "month")
                    .with_encode(CHANNEL_Y, "temperature")
                    .with_encode(CHANNEL_COLOR, "city")
                    .with_encode("tooltip", "temperature"),
            )
            .with_interaction(InteractionSpec::new("tooltip").with_param("shared", true))
    }

    fn month_pixel(chart: &Chart, key: &str, month: &str) -> Point {
        let view = chart.view(key).unwrap();
        let u = view
            .scale(CHANNEL_X)
            .unwrap()
            .map(&FieldValue::from(month))
            .unwrap();
        view.coord.map(u, 0.5)
    }

    #[test]
    fn rerendering_an_unchanged_spec_only_updates() {
        let mut chart = Chart::new(line_spec());
        let first = chart.render().unwrap();
        assert_eq!(first.views, 1);
        assert!(first.enters > 0);
        assert_eq!(first.exits, 0);

        let second = chart.render().unwrap();
        assert_eq!(second.enters, 0);
        assert_eq!(second.exits, 0);
        assert_eq!(second.changed, 0);
        assert_eq!(second.updates, first.enters);
    }

    #[test]
    fn data_edits_flow_through_reconciliation() {
        let mut chart = Chart::new(line_spec());
        chart.render().unwrap();

        let mut rows = weather();
        for row in &mut rows {
            if row.get("month") == Some(&FieldValue::from("Jun.")) {
                row.set("temperature", 25.0);
            }
        }
        chart.spec_mut().data = Some(Arc::from(rows));
        let stats = chart.render().unwrap();
        // Same keys everywhere: geometry moved, nothing entered or left.
        assert_eq!(stats.enters, 0);
        assert_eq!(stats.exits, 0);
        assert!(stats.changed > 0);
    }

    #[test]
    fn pointer_moves_resolve_a_shared_tooltip() {
        let mut chart = Chart::new(line_spec());
        chart.render().unwrap();

        let p = month_pixel(&chart, "view-0", "Apr.");
        chart.pointer(PointerEvent::Move(p)).unwrap();
        let data = chart.tooltip("view-0").unwrap();
        assert_eq!(data.title, "Apr.");
        assert_eq!(data.items.len(), 2);
        let values: Vec<_> = data.items.iter().map(|i| i.value.as_str()).collect();
        assert!(values.contains(&"11"));
        assert!(values.contains(&"10"));

        chart.pointer(PointerEvent::Leave).unwrap();
        assert!(chart.tooltip("view-0").is_none());
    }

    #[test]
    fn interaction_layers_stay_on_top_across_renders() {
        let mut chart = Chart::new(line_spec());
        chart.render().unwrap();
        chart.render().unwrap();

        let root = chart.scene.root();
        let view_id = chart.scene.child_by_key(root, &Key::name("view-0")).unwrap();
        let children: Vec<_> = chart
            .scene
            .get(view_id)
            .unwrap()
            .children()
            .iter()
            .map(|id| chart.scene.get(*id).unwrap().class.clone())
            .collect();
        let last_two: Vec<&str> = children[children.len() - 2..]
            .iter()
            .map(|c| &**c)
            .collect();
        assert_eq!(last_two, ["selection", "transient"]);
        let plot_pos = children.iter().position(|c| &**c == "plot").unwrap();
        let frame_pos = children.iter().position(|c| &**c == "frame").unwrap();
        assert!(frame_pos < plot_pos);
    }

    #[test]
    fn dispatching_to_a_missing_view_is_an_error() {
        let mut chart = Chart::new(line_spec());
        chart.render().unwrap();
        let err = chart
            .dispatch_to("absent", PointerEvent::Leave)
            .unwrap_err();
        assert_eq!(
            err,
            ChartError::UnknownView {
                key: Arc::from("absent")
            }
        );
    }

    #[test]
    fn triggers_drive_selection_without_a_hit() {
        let mut chart = Chart::new(
            line_spec().with_interaction(InteractionSpec::new("select")),
        );
        chart.render().unwrap();
        chart
            .set_trigger_info(
                "view-0",
                Vec::from([TriggerInfo {
                    channel: Arc::from(CHANNEL_COLOR),
                    id: FieldValue::from("Berlin"),
                }]),
            )
            .unwrap();
        // Dispatch anywhere; trigger mode ignores the pointer.
        chart
            .dispatch_to("view-0", PointerEvent::Move(Point::new(0.0, 0.0)))
            .unwrap();
        assert_eq!(
            chart.selection("view-0").len(),
            1,
            "one polyline per series"
        );
    }
}
