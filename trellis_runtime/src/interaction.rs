// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The interaction engine: pointer events, per-view context, and the action
//! chain.
//!
//! Each rendered view owns one [`InteractionContext`], created when the view
//! enters and refreshed when it re-renders. An event dispatch updates the
//! context's [`SharedState`] and runs the view's configured actions in
//! declared order; actions communicate with each other only through that
//! shared state ("write before read, in declared order"). An action may also
//! file an update request — an edit to the view's stored specification — which
//! the chart driver applies synchronously, re-running the pipeline for the
//! view and re-reconciling its subtree, before the next action runs.

extern crate alloc;

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;
use trellis_scene::{NodeId, SceneTree};

use crate::error::ChartError;
use crate::pipeline::View;
use crate::spec::{InteractionSpec, SpecNode};
use crate::tooltip::TooltipData;
use crate::value::FieldValue;

/// A pointer event routed to a view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    /// Pointer moved to a canvas position.
    Move(Point),
    /// Primary button pressed at a canvas position.
    Down(Point),
    /// Primary button released at a canvas position.
    Up(Point),
    /// Pointer left the canvas.
    Leave,
}

impl PointerEvent {
    /// The event's canvas position, absent for [`PointerEvent::Leave`].
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::Move(p) | Self::Down(p) | Self::Up(p) => Some(*p),
            Self::Leave => None,
        }
    }
}

/// Externally supplied selection trigger: select every element whose value
/// for `channel`, inverted through that channel's scale, equals `id`.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerInfo {
    /// The channel whose scale resolves the id.
    pub channel: Arc<str>,
    /// The domain value to match.
    pub id: FieldValue,
}

/// Cross-action state for one view, versioned by event generation.
///
/// The only state multiple actions write within one event. Fields are named
/// per producer/consumer pair: selection actions write `selected_elements`,
/// tooltip reads it; embedders write `trigger_info`, selection reads it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SharedState {
    /// Bumped once per dispatched event.
    pub generation: u64,
    /// Current pointer position, cleared on leave.
    pub pointer: Option<Point>,
    /// Elements resolved by the most recent selection action.
    pub selected_elements: Vec<NodeId>,
    /// Externally supplied selection triggers; survive across events until
    /// replaced.
    pub trigger_info: Vec<TriggerInfo>,
}

impl SharedState {
    /// Starts a new event: records the pointer and bumps the generation.
    pub fn begin_event(&mut self, pointer: Option<Point>) {
        self.generation += 1;
        self.pointer = pointer;
    }
}

/// The scene subtree handles of one rendered view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layers {
    /// The view's group node.
    pub view: NodeId,
    /// The plot group holding the main layers.
    pub plot: NodeId,
    /// Layer for selection affordances.
    pub selection: NodeId,
    /// Layer for transient interaction-only graphics (crosshair, markers).
    pub transient: NodeId,
}

/// An edit to a view's stored specification, applied by the chart driver.
pub type UpdateRequest = Box<dyn FnOnce(&mut SpecNode)>;

/// Everything one action invocation may touch.
pub struct ActionScope<'a> {
    /// The event being dispatched.
    pub event: &'a PointerEvent,
    /// The resolved view (scales, coordinate, marks, theme).
    pub view: &'a View,
    /// The view's scene layer handles.
    pub layers: Layers,
    /// The scene tree, mutable through the layer handles.
    pub scene: &'a mut SceneTree,
    /// Cross-action shared state.
    pub shared: &'a mut SharedState,
    /// The view's last resolved tooltip, written by the tooltip action.
    pub tooltip: &'a mut Option<TooltipData>,
    update: &'a mut Option<UpdateRequest>,
}

impl fmt::Debug for ActionScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionScope")
            .field("event", &self.event)
            .field("view", &self.view.key)
            .field("layers", &self.layers)
            .field("shared", &self.shared)
            .field("update", &self.update.as_ref().map(|_| "<pending>"))
            .finish()
    }
}

impl<'a> ActionScope<'a> {
    /// Assembles a scope for one action invocation.
    pub fn new(
        event: &'a PointerEvent,
        view: &'a View,
        layers: Layers,
        scene: &'a mut SceneTree,
        shared: &'a mut SharedState,
        tooltip: &'a mut Option<TooltipData>,
        update: &'a mut Option<UpdateRequest>,
    ) -> Self {
        Self {
            event,
            view,
            layers,
            scene,
            shared,
            tooltip,
            update,
        }
    }

    /// Requests a re-render of this view with an edited specification.
    ///
    /// The driver applies the edit, re-runs the pipeline and re-reconciles
    /// the view's subtree before the next action in the chain runs. A second
    /// request within one action replaces the first.
    pub fn request_update(&mut self, edit: impl FnOnce(&mut SpecNode) + 'static) {
        *self.update = Some(Box::new(edit));
    }
}

/// One interaction behavior, invoked per dispatched event.
///
/// An error aborts the remaining chain for the event and propagates; scene
/// mutations already applied stand.
pub trait Action {
    /// Runs the action against the view's scope.
    fn run(&self, scope: &mut ActionScope<'_>) -> Result<(), ChartError>;
}

/// Builds a configured [`Action`] from its interaction directive.
pub trait ActionBuilder {
    /// Registry tag.
    fn tag(&self) -> &'static str;

    /// Builds the action with the directive's options applied.
    fn build(&self, spec: &InteractionSpec) -> Arc<dyn Action>;
}

/// Per-view interaction state: the built action chain plus everything that
/// survives across events.
pub struct InteractionContext {
    /// The view's stable key.
    pub view_key: Arc<str>,
    /// Built actions in declared order, with their registered tags.
    pub actions: Vec<(Arc<str>, Arc<dyn Action>)>,
    /// Cross-action shared state, reused across events.
    pub shared: SharedState,
    /// The last resolved tooltip payload, for the embedder to present.
    pub tooltip: Option<TooltipData>,
}

impl fmt::Debug for InteractionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionContext")
            .field("view_key", &self.view_key)
            .field(
                "actions",
                &self.actions.iter().map(|(tag, _)| tag).collect::<Vec<_>>(),
            )
            .field("shared", &self.shared)
            .field("tooltip", &self.tooltip)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn events_expose_positions_except_leave() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(PointerEvent::Move(p).position(), Some(p));
        assert_eq!(PointerEvent::Down(p).position(), Some(p));
        assert_eq!(PointerEvent::Leave.position(), None);
    }

    #[test]
    fn begin_event_bumps_the_generation() {
        let mut shared = SharedState::default();
        shared.selected_elements.push(NodeId(7));
        shared.begin_event(Some(Point::new(1.0, 2.0)));
        assert_eq!(shared.generation, 1);
        assert_eq!(shared.pointer, Some(Point::new(1.0, 2.0)));
        // Selection persists across events until a selection action rewrites it.
        assert_eq!(shared.selected_elements, [NodeId(7)]);

        shared.begin_event(None);
        assert_eq!(shared.generation, 2);
        assert_eq!(shared.pointer, None);
    }
}
