// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `trellis_scene`: an owned render tree with keyed reconciliation.
//!
//! This crate provides:
//! - a tree of nodes with parent-owns-children ownership ([`SceneTree`])
//! - stable per-parent identity ([`Key`])
//! - keyed enter/update/exit reconciliation ([`SceneTree::reconcile_children`], [`NodeDiff`])
//! - shape geometry with pixel-space hit-testing ([`Geometry`])
//! - visibility toggling that retains nodes ([`SceneTree::set_visible`])
//!
//! It intentionally does NOT provide rasterization or a visualization grammar.
//!
//! Conceptually, a chart runtime can:
//! - mirror each resolved view into a subtree of groups and shapes
//! - reconcile every container against the previous render by stable [`Key`]
//! - bind per-element data ([`SceneNode::datum`]) for interaction code
//! - answer "what is under the cursor" via [`SceneTree::hit_test`].

#![no_std]

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;
use hashbrown::HashMap;
use kurbo::{Affine, Point, Rect};
use peniko::Color;
use smallvec::SmallVec;

/// Stable identity for a node among the siblings of one class.
///
/// Keys must remain stable across renders for the same conceptual entity; this is what
/// enables `Enter/Update/Exit` reconciliation and object identity across re-renders.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Ordinal identity, for nodes keyed by position or row index.
    Index(u64),
    /// Named identity, for nodes keyed by category values.
    Name(Arc<str>),
}

impl Key {
    /// Create a named key.
    pub fn name(name: impl Into<Arc<str>>) -> Self {
        Self::Name(name.into())
    }

    /// Create an ordinal key.
    pub const fn index(index: u64) -> Self {
        Self::Index(index)
    }
}

impl From<u64> for Key {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(Arc::from(name))
    }
}

impl From<Arc<str>> for Key {
    fn from(name: Arc<str>) -> Self {
        Self::Name(name)
    }
}

/// Handle to a node in a [`SceneTree`].
///
/// Handles are never reused within one tree; a removed node's id stays dead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Horizontal anchoring for text, relative to its position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextAnchor {
    /// Anchor at the start (left in LTR).
    Start,
    /// Anchor in the middle.
    Middle,
    /// Anchor at the end (right in LTR).
    End,
}

/// Shape geometry in pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// An open polyline through the given points.
    Polyline(SmallVec<[Point; 8]>),
    /// A closed, fillable polygon with the given vertices.
    Polygon(SmallVec<[Point; 8]>),
    /// A circle symbol.
    Circle {
        /// Center in pixel coordinates.
        center: Point,
        /// Radius in pixels.
        radius: f64,
    },
    /// Unshaped text anchored at a point.
    Text {
        /// Anchor position in pixel coordinates.
        pos: Point,
        /// Text content (unshaped).
        text: String,
        /// Font size in pixels.
        size: f64,
        /// Horizontal anchoring relative to `pos`.
        anchor: TextAnchor,
        /// Rotation angle in degrees, positive clockwise.
        angle: f64,
    },
}

impl Geometry {
    /// Axis-aligned bounding box of the geometry.
    ///
    /// Text bounds are its anchor point; shaping is downstream.
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Polyline(points) | Self::Polygon(points) => bounds_of(points),
            Self::Circle { center, radius } => Rect::new(
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            ),
            Self::Text { pos, .. } => Rect::from_points(*pos, *pos),
        }
    }

    /// Pixel hit test.
    ///
    /// Polygons hit on containment (even-odd), polylines within `tolerance` of any
    /// segment, circles within `radius + tolerance`. Text never hits (no shaping here).
    pub fn hit(&self, p: Point, tolerance: f64) -> bool {
        match self {
            Self::Polyline(points) => {
                let tol_sq = tolerance * tolerance;
                points
                    .windows(2)
                    .any(|seg| dist_sq_to_segment(p, seg[0], seg[1]) <= tol_sq)
            }
            Self::Polygon(points) => point_in_polygon(p, points),
            Self::Circle { center, radius } => {
                let dx = p.x - center.x;
                let dy = p.y - center.y;
                let reach = radius + tolerance;
                dx * dx + dy * dy <= reach * reach
            }
            Self::Text { .. } => false,
        }
    }
}

fn bounds_of(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    let mut rect = Rect::from_points(*first, *first);
    for p in &points[1..] {
        rect = rect.union_pt(*p);
    }
    rect
}

fn dist_sq_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let wx = p.x - a.x;
    let wy = p.y - a.y;
    let len_sq = vx * vx + vy * vy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0)
    };
    let dx = p.x - (a.x + t * vx);
    let dy = p.y - (a.y + t * vy);
    dx * dx + dy * dy
}

fn point_in_polygon(p: Point, points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = points[i];
        let b = points[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Paint attributes for a shape node.
#[derive(Clone, Debug, PartialEq)]
pub struct Paint {
    /// Fill color, if filled.
    pub fill: Option<Color>,
    /// Stroke color, if stroked.
    pub stroke: Option<Color>,
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// Uniform opacity in `[0, 1]`.
    pub opacity: f64,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
        }
    }
}

impl Paint {
    /// A solid fill with no stroke.
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    /// A stroke with no fill.
    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            stroke: Some(color),
            stroke_width: width,
            ..Self::default()
        }
    }
}

/// A drawable shape: geometry plus paint.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeData {
    /// Geometry in pixel coordinates.
    pub geometry: Geometry,
    /// Paint attributes.
    pub paint: Paint,
}

/// What a node holds: a pure grouping node or a drawable shape.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeContent {
    /// A grouping node with no visual of its own.
    Group,
    /// A drawable shape.
    Shape(ShapeData),
}

impl NodeContent {
    /// Return the kind of this content.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Group => NodeKind::Group,
            Self::Shape(_) => NodeKind::Shape,
        }
    }
}

/// The structural kind of a node.
///
/// A key whose kind changes between renders exits and re-enters rather than updating,
/// since the node's subtree shape is not comparable across kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A grouping node.
    Group,
    /// A shape node.
    Shape,
}

type Datum = Arc<dyn Any>;

/// One node in the scene tree.
pub struct SceneNode {
    /// Stable identity among siblings of the same class.
    pub key: Key,
    /// Role tag used to scope keyed joins and queries (e.g. `"element"`).
    pub class: Arc<str>,
    /// Group or shape content.
    pub content: NodeContent,
    /// Whether the node (and its subtree) is shown. Hidden nodes stay in the tree.
    pub visible: bool,
    /// Local transform applied to this node and its subtree.
    pub transform: Affine,
    /// Data bound to this node, readable via [`SceneNode::datum_ref`].
    pub datum: Option<Datum>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("key", &self.key)
            .field("class", &self.class)
            .field("content", &self.content)
            .field("visible", &self.visible)
            .field("transform", &self.transform)
            .field("datum", &self.datum.as_ref().map(|_| "<datum>"))
            .field("children_len", &self.children.len())
            .finish()
    }
}

impl SceneNode {
    fn new(key: Key, class: Arc<str>, content: NodeContent) -> Self {
        Self {
            key,
            class,
            content,
            visible: true,
            transform: Affine::IDENTITY,
            datum: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// The node's parent, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The node's children, in paint order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Downcast the bound datum, if present and of type `T`.
    pub fn datum_ref<T: 'static>(&self) -> Option<&T> {
        self.datum.as_deref().and_then(|d| d.downcast_ref::<T>())
    }

    /// The node's shape content, if it is a shape.
    pub fn shape(&self) -> Option<&ShapeData> {
        match &self.content {
            NodeContent::Shape(s) => Some(s),
            NodeContent::Group => None,
        }
    }
}

/// Desired state of one child in a keyed join (see [`SceneTree::reconcile_children`]).
pub struct DesiredNode {
    /// Stable identity among siblings of the join's class.
    pub key: Key,
    /// Group or shape content.
    pub content: NodeContent,
    /// Local transform.
    pub transform: Affine,
    /// Data to bind to the node.
    pub datum: Option<Datum>,
    /// Visibility to apply.
    pub visible: bool,
}

impl fmt::Debug for DesiredNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesiredNode")
            .field("key", &self.key)
            .field("content", &self.content)
            .field("transform", &self.transform)
            .field("datum", &self.datum.as_ref().map(|_| "<datum>"))
            .field("visible", &self.visible)
            .finish()
    }
}

impl DesiredNode {
    /// A desired group node.
    pub fn group(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            content: NodeContent::Group,
            transform: Affine::IDENTITY,
            datum: None,
            visible: true,
        }
    }

    /// A desired shape node.
    pub fn shape(key: impl Into<Key>, shape: ShapeData) -> Self {
        Self {
            key: key.into(),
            content: NodeContent::Shape(shape),
            transform: Affine::IDENTITY,
            datum: None,
            visible: true,
        }
    }

    /// Set the local transform.
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    /// Bind a datum.
    pub fn with_datum(mut self, datum: impl Any) -> Self {
        self.datum = Some(Arc::new(datum));
        self
    }
}

/// The operation applied to one child during reconciliation.
///
/// Re-rendering unchanged content yields only `Update`s with `changed == false`;
/// `Enter`/`Exit` appear exactly for previously-absent and removed keys.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeDiff {
    /// A child with a previously unseen key was created.
    Enter {
        /// Handle of the created node.
        id: NodeId,
        /// The child's key.
        key: Key,
    },
    /// An existing child was kept; its content was overwritten in place.
    Update {
        /// Handle of the retained node.
        id: NodeId,
        /// The child's key.
        key: Key,
        /// Whether content, transform or visibility actually differed.
        changed: bool,
    },
    /// A child whose key is gone was removed along with its subtree.
    Exit {
        /// The removed child's key.
        key: Key,
    },
}

/// An owned tree of scene nodes with keyed reconciliation.
pub struct SceneTree {
    nodes: HashMap<NodeId, SceneNode>,
    root: NodeId,
    next_id: u64,
}

impl fmt::Debug for SceneTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneTree")
            .field("nodes_len", &self.nodes.len())
            .field("root", &self.root)
            .finish()
    }
}

impl SceneTree {
    /// Create a tree containing only the root group.
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            SceneNode::new(Key::name("root"), Arc::from("root"), NodeContent::Group),
        );
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    /// The root group.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Borrow a node.
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Borrow a node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    fn alloc(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a new group node under `parent`. Returns the new handle, or `None`
    /// if `parent` is not a live node.
    pub fn insert_group(
        &mut self,
        parent: NodeId,
        key: impl Into<Key>,
        class: impl Into<Arc<str>>,
    ) -> Option<NodeId> {
        self.insert(parent, key.into(), class.into(), NodeContent::Group)
    }

    /// Append a new shape node under `parent`. Returns the new handle, or `None`
    /// if `parent` is not a live node.
    pub fn insert_shape(
        &mut self,
        parent: NodeId,
        key: impl Into<Key>,
        class: impl Into<Arc<str>>,
        shape: ShapeData,
    ) -> Option<NodeId> {
        self.insert(parent, key.into(), class.into(), NodeContent::Shape(shape))
    }

    fn insert(
        &mut self,
        parent: NodeId,
        key: Key,
        class: Arc<str>,
        content: NodeContent,
    ) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = self.alloc();
        let mut node = SceneNode::new(key, class, content);
        node.parent = Some(parent);
        self.nodes.insert(id, node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Some(id)
    }

    /// Remove a node and its entire subtree. Removing the root is a no-op.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let parent = node.parent;
        if let Some(parent) = parent
            && let Some(p) = self.nodes.get_mut(&parent)
        {
            p.children.retain(|c| *c != id);
        }
        let mut stack = Vec::from([id]);
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
        }
    }

    /// Set a node's visibility. Hidden nodes (and their subtrees) stay in the tree.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.visible = visible;
        }
    }

    /// Set visibility on every direct child of `parent` with the given class.
    pub fn set_class_visible(&mut self, parent: NodeId, class: &str, visible: bool) {
        let ids: Vec<NodeId> = self.children_of_class(parent, class).collect();
        for id in ids {
            self.set_visible(id, visible);
        }
    }

    /// Move a node to the end of its parent's child list (topmost in paint order).
    pub fn raise(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != id);
            p.children.push(id);
        }
    }

    /// Find a direct child of `parent` by key, regardless of class.
    pub fn child_by_key(&self, parent: NodeId, key: &Key) -> Option<NodeId> {
        let parent = self.nodes.get(&parent)?;
        parent
            .children
            .iter()
            .copied()
            .find(|c| self.nodes.get(c).is_some_and(|n| n.key == *key))
    }

    /// Find a direct child of `parent` by class (the first in paint order).
    pub fn child_by_class(&self, parent: NodeId, class: &str) -> Option<NodeId> {
        self.children_of_class(parent, class).next()
    }

    /// Iterate the direct children of `parent` with the given class, in paint order.
    pub fn children_of_class<'a>(
        &'a self,
        parent: NodeId,
        class: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes
            .get(&parent)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(move |c| self.nodes.get(c).is_some_and(|n| &*n.class == class))
    }

    /// Collect every descendant of `from` (excluding `from`) with the given class,
    /// in paint (pre-)order. Hidden subtrees are skipped when `visible_only` is set.
    pub fn descendants_of_class(
        &self,
        from: NodeId,
        class: &str,
        visible_only: bool,
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        if let Some(node) = self.nodes.get(&from) {
            stack.extend(node.children.iter().rev().copied());
        }
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if visible_only && !node.visible {
                continue;
            }
            if &*node.class == class {
                out.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Hit-test the visible descendants of `from` with the given class, topmost first.
    ///
    /// "Topmost" is reverse paint order: the last matching node painted wins, so
    /// overlapping shapes resolve to the one drawn above.
    pub fn hit_test(&self, from: NodeId, class: &str, p: Point, tolerance: f64) -> Option<NodeId> {
        let candidates = self.descendants_of_class(from, class, true);
        for id in candidates.iter().rev() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if let NodeContent::Shape(shape) = &node.content {
                let local = self.to_local(*id, p);
                if shape.geometry.hit(local, tolerance) {
                    return Some(*id);
                }
            }
        }
        None
    }

    /// Map a point from tree coordinates into a node's local coordinates by
    /// inverting the transforms on its ancestor chain.
    pub fn to_local(&self, id: NodeId, p: Point) -> Point {
        let mut chain = SmallVec::<[Affine; 8]>::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let Some(node) = self.nodes.get(&c) else {
                break;
            };
            chain.push(node.transform);
            current = node.parent;
        }
        let mut local = p;
        for transform in chain.iter().rev() {
            local = transform.inverse() * local;
        }
        local
    }

    /// Insert or overwrite a shape child of `parent` keyed by `key`.
    ///
    /// Unlike [`SceneTree::reconcile_children`], absent keys are left alone; this is
    /// the primitive for interaction affordances that are hidden rather than removed.
    pub fn upsert_shape(
        &mut self,
        parent: NodeId,
        key: impl Into<Key>,
        class: impl Into<Arc<str>>,
        shape: ShapeData,
    ) -> Option<NodeId> {
        let key = key.into();
        if let Some(id) = self.child_by_key(parent, &key) {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.content = NodeContent::Shape(shape);
                node.visible = true;
            }
            return Some(id);
        }
        self.insert_shape(parent, key, class, shape)
    }

    /// Reconcile the children of `parent` that carry `class` against a desired list.
    ///
    /// The desired list is the complete current set for that `(parent, class)`:
    /// - desired keys not present enter (a node is created, in list order);
    /// - present keys update in place, keeping the node's handle and subtree
    ///   (content, transform, datum and visibility are overwritten);
    /// - present keys whose [`NodeKind`] changed exit and re-enter, since the
    ///   subtree is not comparable across kinds;
    /// - existing keys not desired exit (the subtree is removed).
    ///
    /// Children of other classes are untouched. Reconciled children are re-appended
    /// in desired order, so a driver that reconciles each class of a container once
    /// per pass, in paint order, fully determines sibling order.
    pub fn reconcile_children(
        &mut self,
        parent: NodeId,
        class: &str,
        desired: Vec<DesiredNode>,
    ) -> Vec<NodeDiff> {
        let mut diffs = Vec::new();
        if !self.nodes.contains_key(&parent) {
            return diffs;
        }

        let mut old: HashMap<Key, NodeId> = HashMap::new();
        for id in self.children_of_class(parent, class).collect::<Vec<_>>() {
            if let Some(node) = self.nodes.get(&id) {
                old.insert(node.key.clone(), id);
            }
        }

        let class: Arc<str> = Arc::from(class);
        let mut ordered = Vec::with_capacity(desired.len());

        for want in desired {
            let retained = old.remove(&want.key).and_then(|id| {
                let node = self.nodes.get(&id)?;
                if node.content.kind() == want.content.kind() {
                    Some(id)
                } else {
                    self.remove(id);
                    diffs.push(NodeDiff::Exit {
                        key: want.key.clone(),
                    });
                    None
                }
            });

            match retained {
                Some(id) => {
                    let node = self.nodes.get_mut(&id).expect("retained node is live");
                    let changed = node.content != want.content
                        || node.transform != want.transform
                        || node.visible != want.visible;
                    node.content = want.content;
                    node.transform = want.transform;
                    node.visible = want.visible;
                    node.datum = want.datum;
                    diffs.push(NodeDiff::Update {
                        id,
                        key: want.key,
                        changed,
                    });
                    ordered.push(id);
                }
                None => {
                    let id = self
                        .insert(parent, want.key.clone(), class.clone(), want.content)
                        .expect("parent is live");
                    let node = self.nodes.get_mut(&id).expect("inserted node is live");
                    node.transform = want.transform;
                    node.visible = want.visible;
                    node.datum = want.datum;
                    diffs.push(NodeDiff::Enter { id, key: want.key });
                    ordered.push(id);
                }
            }
        }

        for (key, id) in old {
            self.remove(id);
            diffs.push(NodeDiff::Exit { key });
        }

        // Re-append this class's children in desired order; other classes keep
        // their relative positions ahead of them.
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| !ordered.contains(c));
            p.children.extend(ordered);
        }

        diffs
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use smallvec::smallvec;

    fn quad(x0: f64, y0: f64, x1: f64, y1: f64) -> ShapeData {
        ShapeData {
            geometry: Geometry::Polygon(smallvec![
                Point::new(x0, y0),
                Point::new(x1, y0),
                Point::new(x1, y1),
                Point::new(x0, y1),
            ]),
            paint: Paint::fill(Color::from_rgba8(0, 0, 0, 255)),
        }
    }

    fn enters(diffs: &[NodeDiff]) -> usize {
        diffs
            .iter()
            .filter(|d| matches!(d, NodeDiff::Enter { .. }))
            .count()
    }

    fn exits(diffs: &[NodeDiff]) -> usize {
        diffs
            .iter()
            .filter(|d| matches!(d, NodeDiff::Exit { .. }))
            .count()
    }

    #[test]
    fn keyed_join_enter_update_exit() {
        let mut tree = SceneTree::new();
        let root = tree.root();

        let diffs = tree.reconcile_children(
            root,
            "element",
            Vec::from([
                DesiredNode::shape(Key::name("a"), quad(0.0, 0.0, 1.0, 1.0)),
                DesiredNode::shape(Key::name("b"), quad(1.0, 0.0, 2.0, 1.0)),
            ]),
        );
        assert_eq!(enters(&diffs), 2);
        assert_eq!(exits(&diffs), 0);

        // Same keys, same content: updates only, nothing changed.
        let diffs = tree.reconcile_children(
            root,
            "element",
            Vec::from([
                DesiredNode::shape(Key::name("a"), quad(0.0, 0.0, 1.0, 1.0)),
                DesiredNode::shape(Key::name("b"), quad(1.0, 0.0, 2.0, 1.0)),
            ]),
        );
        assert_eq!(enters(&diffs), 0);
        assert_eq!(exits(&diffs), 0);
        assert!(diffs
            .iter()
            .all(|d| matches!(d, NodeDiff::Update { changed: false, .. })));

        // Drop "a", add "c": one exit, one enter, one update.
        let diffs = tree.reconcile_children(
            root,
            "element",
            Vec::from([
                DesiredNode::shape(Key::name("b"), quad(1.0, 0.0, 2.0, 2.0)),
                DesiredNode::shape(Key::name("c"), quad(2.0, 0.0, 3.0, 1.0)),
            ]),
        );
        assert_eq!(enters(&diffs), 1);
        assert_eq!(exits(&diffs), 1);
        let [NodeDiff::Update { key, changed, .. }, NodeDiff::Enter { .. }, NodeDiff::Exit { .. }] =
            &diffs[..]
        else {
            panic!("expected update, enter, then trailing exit");
        };
        assert_eq!(*key, Key::name("b"));
        assert!(*changed);
    }

    #[test]
    fn update_keeps_node_identity_and_subtree() {
        let mut tree = SceneTree::new();
        let root = tree.root();

        let diffs =
            tree.reconcile_children(root, "view", Vec::from([DesiredNode::group(Key::name("v"))]));
        let [NodeDiff::Enter { id: view, .. }] = &diffs[..] else {
            panic!("expected a single enter");
        };
        let view = *view;
        let child = tree
            .insert_shape(view, 0_u64, "element", quad(0.0, 0.0, 1.0, 1.0))
            .unwrap();

        let diffs =
            tree.reconcile_children(root, "view", Vec::from([DesiredNode::group(Key::name("v"))]));
        let [NodeDiff::Update { id, .. }] = &diffs[..] else {
            panic!("expected a single update");
        };
        assert_eq!(*id, view);
        assert!(tree.get(child).is_some());
        assert_eq!(tree.get(view).unwrap().children(), &[child]);
    }

    #[test]
    fn kind_change_exits_and_reenters() {
        let mut tree = SceneTree::new();
        let root = tree.root();

        let _ = tree.reconcile_children(
            root,
            "layer",
            Vec::from([DesiredNode::group(Key::name("k"))]),
        );
        let diffs = tree.reconcile_children(
            root,
            "layer",
            Vec::from([DesiredNode::shape(
                Key::name("k"),
                quad(0.0, 0.0, 1.0, 1.0),
            )]),
        );
        assert_eq!(exits(&diffs), 1);
        assert_eq!(enters(&diffs), 1);
    }

    #[test]
    fn join_is_scoped_to_class() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let other = tree.insert_group(root, Key::name("frame"), "frame").unwrap();

        let diffs = tree.reconcile_children(
            root,
            "view",
            Vec::from([DesiredNode::group(Key::name("v"))]),
        );
        assert_eq!(enters(&diffs), 1);
        assert_eq!(exits(&diffs), 0);
        assert!(tree.get(other).is_some());
    }

    #[test]
    fn hidden_nodes_survive_visibility_toggles() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree
            .insert_shape(root, Key::name("crosshair-0"), "crosshair", quad(0.0, 0.0, 1.0, 1.0))
            .unwrap();
        let b = tree
            .insert_shape(root, Key::name("marker-0"), "marker", quad(1.0, 0.0, 2.0, 1.0))
            .unwrap();

        tree.set_class_visible(root, "crosshair", false);
        tree.set_class_visible(root, "marker", false);
        assert!(!tree.get(a).unwrap().visible);
        assert!(!tree.get(b).unwrap().visible);
        assert_eq!(tree.len(), 3);

        tree.set_visible(a, true);
        assert!(tree.get(a).unwrap().visible);
    }

    #[test]
    fn raise_moves_a_child_to_the_top() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree.insert_group(root, Key::name("a"), "layer").unwrap();
        let b = tree.insert_group(root, Key::name("b"), "layer").unwrap();
        let c = tree.insert_group(root, Key::name("c"), "layer").unwrap();

        tree.raise(a);
        assert_eq!(tree.get(root).unwrap().children(), &[b, c, a]);
    }

    #[test]
    fn remove_drops_whole_subtree() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let g = tree.insert_group(root, Key::name("g"), "group").unwrap();
        let inner = tree.insert_group(g, Key::name("inner"), "group").unwrap();
        let leaf = tree
            .insert_shape(inner, 0_u64, "element", quad(0.0, 0.0, 1.0, 1.0))
            .unwrap();

        tree.remove(g);
        assert!(tree.get(g).is_none());
        assert!(tree.get(inner).is_none());
        assert!(tree.get(leaf).is_none());
        assert!(tree.is_empty());
    }

    #[test]
    fn hit_test_topmost_wins() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let below = tree
            .insert_shape(root, 0_u64, "element", quad(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let above = tree
            .insert_shape(root, 1_u64, "element", quad(5.0, 5.0, 15.0, 15.0))
            .unwrap();

        assert_eq!(
            tree.hit_test(root, "element", Point::new(7.0, 7.0), 0.0),
            Some(above)
        );
        assert_eq!(
            tree.hit_test(root, "element", Point::new(2.0, 2.0), 0.0),
            Some(below)
        );
        assert_eq!(tree.hit_test(root, "element", Point::new(20.0, 20.0), 0.0), None);

        tree.set_visible(above, false);
        assert_eq!(
            tree.hit_test(root, "element", Point::new(7.0, 7.0), 0.0),
            Some(below)
        );
    }

    #[test]
    fn polyline_hits_within_tolerance() {
        let line = Geometry::Polyline(smallvec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]);
        assert!(line.hit(Point::new(5.0, 1.0), 2.0));
        assert!(line.hit(Point::new(10.5, 5.0), 1.0));
        assert!(!line.hit(Point::new(5.0, 5.0), 2.0));
    }

    #[test]
    fn transformed_subtree_hit_test() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let g = tree.insert_group(root, Key::name("g"), "group").unwrap();
        tree.get_mut(g).unwrap().transform = Affine::translate((100.0, 0.0));
        let shape = tree
            .insert_shape(g, 0_u64, "element", quad(0.0, 0.0, 10.0, 10.0))
            .unwrap();

        assert_eq!(
            tree.hit_test(root, "element", Point::new(105.0, 5.0), 0.0),
            Some(shape)
        );
        assert_eq!(tree.hit_test(root, "element", Point::new(5.0, 5.0), 0.0), None);
    }

    #[test]
    fn datum_roundtrip() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let diffs = tree.reconcile_children(
            root,
            "element",
            Vec::from([
                DesiredNode::shape(0_u64, quad(0.0, 0.0, 1.0, 1.0)).with_datum(42_u32)
            ]),
        );
        let [NodeDiff::Enter { id, .. }] = &diffs[..] else {
            panic!("expected enter");
        };
        assert_eq!(tree.get(*id).unwrap().datum_ref::<u32>(), Some(&42));
        assert_eq!(tree.get(*id).unwrap().datum_ref::<u64>(), None);
    }
}
