// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element selection: hit-testing and trigger-driven highlighting.
//!
//! Selection resolves the elements under (or equivalent to) the pointer and
//! publishes them through the view's shared state, where later actions in
//! the chain (tooltip, custom highlighters) read them. Two resolution modes:
//! an externally supplied trigger matches elements by a channel's domain
//! value, and the default mode hit-tests the plot, optionally widened to
//! every element sharing a field value with the hit.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use trellis_scene::NodeId;

use crate::error::ChartError;
use crate::interaction::{Action, ActionBuilder, ActionScope};
use crate::mark::ElementDatum;
use crate::spec::InteractionSpec;

/// Builder for the `select` action.
///
/// Options: `filter_by` (field name; widens a hit to every element whose
/// value for that field equals the hit element's).
#[derive(Clone, Copy, Debug, Default)]
pub struct ElementSelectBuilder;

impl ActionBuilder for ElementSelectBuilder {
    fn tag(&self) -> &'static str {
        "select"
    }

    fn build(&self, spec: &InteractionSpec) -> Arc<dyn Action> {
        Arc::new(ElementSelectAction {
            filter_by: spec.str_param("filter_by"),
        })
    }
}

/// The selection action: writes `selected_elements` on the shared state.
#[derive(Clone, Debug)]
pub struct ElementSelectAction {
    filter_by: Option<Arc<str>>,
}

impl Action for ElementSelectAction {
    fn run(&self, scope: &mut ActionScope<'_>) -> Result<(), ChartError> {
        let elements = scope
            .scene
            .descendants_of_class(scope.layers.plot, "element", true);

        if !scope.shared.trigger_info.is_empty() {
            scope.shared.selected_elements = self.by_trigger(scope, &elements);
            return Ok(());
        }

        let Some(pointer) = scope.event.position() else {
            scope.shared.selected_elements.clear();
            return Ok(());
        };

        // Tolerance widens thin strokes to a clickable band.
        let tolerance = scope.view.theme.line_width.max(1.0);
        let Some(hit) = scope
            .scene
            .hit_test(scope.layers.plot, "element", pointer, tolerance)
        else {
            scope.shared.selected_elements.clear();
            return Ok(());
        };

        scope.shared.selected_elements = self.widen(scope, &elements, hit);
        Ok(())
    }
}

impl ElementSelectAction {
    /// Matches elements whose channel value, inverted through that channel's
    /// scale, equals a trigger id.
    fn by_trigger(&self, scope: &ActionScope<'_>, elements: &[NodeId]) -> Vec<NodeId> {
        elements
            .iter()
            .copied()
            .filter(|id| {
                let Some(datum) = datum_of(scope, *id) else {
                    return false;
                };
                scope.shared.trigger_info.iter().any(|trigger| {
                    let Some(scale) = scope.view.scale(&trigger.channel) else {
                        return false;
                    };
                    datum
                        .row
                        .scaled(&trigger.channel)
                        .is_some_and(|scaled| scale.invert(scaled) == trigger.id)
                })
            })
            .collect()
    }

    /// The hit element, widened by `filter_by` to every element sharing its
    /// field value.
    fn widen(&self, scope: &ActionScope<'_>, elements: &[NodeId], hit: NodeId) -> Vec<NodeId> {
        let Some(field) = self.filter_by.as_deref() else {
            return Vec::from([hit]);
        };
        let Some(value) = datum_of(scope, hit)
            .and_then(|datum| datum.row.value_by_field(field).cloned())
        else {
            return Vec::from([hit]);
        };
        elements
            .iter()
            .copied()
            .filter(|id| {
                datum_of(scope, *id)
                    .and_then(|datum| datum.row.value_by_field(field))
                    == Some(&value)
            })
            .collect()
    }
}

fn datum_of<'a>(scope: &'a ActionScope<'_>, id: NodeId) -> Option<&'a ElementDatum> {
    scope.scene.get(id)?.datum_ref::<ElementDatum>()
}

#[cfg(test)]
mod tests {
    extern crate std;

    use kurbo::Point;
    use trellis_scene::{DesiredNode, SceneTree};

    use super::*;
    use crate::interaction::{Layers, PointerEvent, SharedState, TriggerInfo, UpdateRequest};
    use crate::mark::{CHANNEL_COLOR, CHANNEL_X, CHANNEL_Y};
    use crate::pipeline::{View, initialize_view};
    use crate::registry::Registry;
    use crate::spec::{MarkSpec, SpecNode};
    use crate::tooltip::TooltipData;
    use crate::value::{FieldValue, Record};

    fn fixture() -> (View, SceneTree, Layers) {
        let rows = Vec::from([
            Record::new().with("month", "Jan.").with("value", 3.0).with("city", "London"),
            Record::new().with("month", "Feb.").with("value", 5.0).with("city", "London"),
            Record::new().with("month", "Mar.").with("value", 7.0).with("city", "London"),
            Record::new().with("month", "Jan.").with("value", 2.0).with("city", "Berlin"),
        ]);
        let node = SpecNode::view()
            .with_data(rows)
            .with_size(300.0, 200.0)
            .with_mark(
                MarkSpec::new("point")
                    .with_encode(CHANNEL_X, "month")
                    .with_encode(CHANNEL_Y, "value")
                    .with_encode(CHANNEL_COLOR, "city"),
            );
        let registry = Registry::with_defaults();
        let (view, _) = initialize_view(&node, &registry).unwrap();

        let mut scene = SceneTree::new();
        let root = scene.root();
        let view_id = scene.insert_group(root, "view", "view").unwrap();
        let plot = scene.insert_group(view_id, "plot", "plot").unwrap();
        let selection = scene.insert_group(view_id, "selection", "selection").unwrap();
        let transient = scene.insert_group(view_id, "transient", "transient").unwrap();

        let mark = &view.marks[0];
        let renderer = registry.shape("symbol").unwrap().clone();
        let desired = mark
            .state
            .visual
            .iter()
            .map(|row| {
                DesiredNode::shape(
                    row.key.clone(),
                    renderer.render(row, &view.theme, &mark.style),
                )
                .with_datum(ElementDatum {
                    mark: mark.key.clone(),
                    row: row.clone(),
                })
            })
            .collect();
        scene.reconcile_children(plot, "element", desired);

        let layers = Layers {
            view: view_id,
            plot,
            selection,
            transient,
        };
        (view, scene, layers)
    }

    fn run(
        action: &ElementSelectAction,
        event: PointerEvent,
        view: &View,
        scene: &mut SceneTree,
        layers: Layers,
        shared: &mut SharedState,
    ) {
        let mut tooltip: Option<TooltipData> = None;
        let mut update: Option<UpdateRequest> = None;
        let mut scope = ActionScope::new(
            &event, view, layers, scene, shared, &mut tooltip, &mut update,
        );
        action.run(&mut scope).unwrap();
    }

    fn point_of(view: &View, index: usize) -> Point {
        view.marks[0].state.visual[index].points[0]
    }

    #[test]
    fn a_plain_hit_selects_one_element() {
        let (view, mut scene, layers) = fixture();
        let action = ElementSelectAction { filter_by: None };
        let mut shared = SharedState::default();
        let target = point_of(&view, 1);
        run(
            &action,
            PointerEvent::Move(target),
            &view,
            &mut scene,
            layers,
            &mut shared,
        );
        assert_eq!(shared.selected_elements.len(), 1);
    }

    #[test]
    fn filter_by_widens_to_the_shared_field_value() {
        let (view, mut scene, layers) = fixture();
        let action = ElementSelectAction {
            filter_by: Some(Arc::from("city")),
        };
        let mut shared = SharedState::default();
        run(
            &action,
            PointerEvent::Move(point_of(&view, 0)),
            &view,
            &mut scene,
            layers,
            &mut shared,
        );
        // The three London points, not the Berlin one.
        assert_eq!(shared.selected_elements.len(), 3);
    }

    #[test]
    fn misses_and_leave_clear_the_selection() {
        let (view, mut scene, layers) = fixture();
        let action = ElementSelectAction { filter_by: None };
        let mut shared = SharedState::default();
        shared.selected_elements.push(NodeId(99));
        run(
            &action,
            PointerEvent::Move(Point::new(-50.0, -50.0)),
            &view,
            &mut scene,
            layers,
            &mut shared,
        );
        assert!(shared.selected_elements.is_empty());

        shared.selected_elements.push(NodeId(99));
        run(
            &action,
            PointerEvent::Leave,
            &view,
            &mut scene,
            layers,
            &mut shared,
        );
        assert!(shared.selected_elements.is_empty());
    }

    #[test]
    fn triggers_select_by_inverted_channel_value() {
        let (view, mut scene, layers) = fixture();
        let action = ElementSelectAction { filter_by: None };
        let mut shared = SharedState::default();
        shared.trigger_info.push(TriggerInfo {
            channel: Arc::from(CHANNEL_COLOR),
            id: FieldValue::from("London"),
        });
        // Pointer position is irrelevant in trigger mode.
        run(
            &action,
            PointerEvent::Move(Point::new(-50.0, -50.0)),
            &view,
            &mut scene,
            layers,
            &mut shared,
        );
        assert_eq!(shared.selected_elements.len(), 3);
    }
}
