// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition resolution: expanding the specification tree into leaf views.
//!
//! A breadth-first worklist dequeues nodes until only views remain. Mark-tag
//! nodes are wrapped as single-layer views; `"view"` nodes run the pipeline
//! (children it derives go back on the worklist); any other tag routes to a
//! registered composite handler, which replaces the node with its expansion.
//! Traversal order is paint order.

extern crate alloc;

use alloc::collections::VecDeque;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::error::ChartError;
use crate::pipeline::{View, initialize_view};
use crate::registry::Registry;
use crate::spec::{SpecNode, VIEW};
use crate::value::{FieldValue, Record};

/// Expansion depth at which composite resolution gives up.
///
/// The worklist has no revisit detection; a composite that (directly or
/// through a cycle) re-emits itself would otherwise expand forever. Well
/// beyond any legitimate nesting.
pub const MAX_COMPOSITE_DEPTH: usize = 64;

/// A non-leaf specification node handler.
pub trait Composite {
    /// Registry tag.
    fn tag(&self) -> &'static str;

    /// Expands the node into replacement child nodes.
    fn expand(&self, node: &SpecNode) -> Result<Vec<SpecNode>, ChartError>;
}

/// Expands a specification tree into resolved views, leaf node alongside.
///
/// The leaf `SpecNode` of each view is kept so interaction updates can edit
/// it and re-run the pipeline for that view alone. Views without a declared
/// key are assigned one from their traversal ordinal.
pub fn resolve_views(
    root: &SpecNode,
    registry: &Registry,
) -> Result<Vec<(SpecNode, View)>, ChartError> {
    let mut out = Vec::new();
    let mut worklist: VecDeque<(SpecNode, usize)> = VecDeque::new();
    worklist.push_back((root.clone(), 0));
    let mut ordinal = 0_usize;

    while let Some((mut node, depth)) = worklist.pop_front() {
        if depth > MAX_COMPOSITE_DEPTH {
            return Err(ChartError::CompositeDepthExceeded {
                tag: node.node_type.clone(),
            });
        }

        let is_leaf = node.is_view() || registry.mark(&node.node_type).is_some();
        if is_leaf {
            if !node.is_view() {
                // A bare mark node is shorthand for a single-layer view.
                node.node_type = Arc::from(VIEW);
            }
            if node.key.is_none() {
                node.key = Some(Arc::from(format!("view-{ordinal}")));
            }
            ordinal += 1;
            let (view, children) = initialize_view(&node, registry)?;
            for child in children {
                worklist.push_back((child, depth + 1));
            }
            out.push((node, view));
            continue;
        }

        let composite = registry
            .composite(&node.node_type)
            .ok_or_else(|| ChartError::UnknownComposite {
                tag: node.node_type.clone(),
            })?;
        for child in composite.expand(&node)? {
            worklist.push_back((child, depth + 1));
        }
    }

    Ok(out)
}

/// The built-in `facet` composite: partitions the node's rows by a field
/// into side-by-side child views.
///
/// Reads the `by` param for the partition field. Children share the parent's
/// marks, coordinate, interactions and theme; each gets the matching subset
/// of rows, an equal slice of the parent's width, and a key derived from its
/// facet value.
#[derive(Clone, Copy, Debug, Default)]
pub struct FacetComposite;

impl Composite for FacetComposite {
    fn tag(&self) -> &'static str {
        "facet"
    }

    fn expand(&self, node: &SpecNode) -> Result<Vec<SpecNode>, ChartError> {
        let Some(FieldValue::Str(field)) = node.param("by") else {
            // No partition field: degrade to a single unfaceted view.
            let mut child = node.clone();
            child.node_type = Arc::from(VIEW);
            child.params.clear();
            return Ok(Vec::from([child]));
        };

        let rows: &[Record] = node.data.as_deref().unwrap_or(&[]);
        let mut partitions: Vec<(FieldValue, Vec<Record>)> = Vec::new();
        for row in rows {
            let value = row.get(field).cloned().unwrap_or(FieldValue::Null);
            match partitions.iter_mut().find(|(v, _)| *v == value) {
                Some((_, subset)) => subset.push(row.clone()),
                None => partitions.push((value, Vec::from([row.clone()]))),
            }
        }

        let count = partitions.len().max(1);
        let parent_size = node.size.unwrap_or_default();
        #[allow(
            clippy::cast_precision_loss,
            reason = "facet counts are far below 2^52"
        )]
        let width = parent_size.width / count as f64;
        let base_key = node.key.clone().unwrap_or_else(|| Arc::from("facet"));

        Ok(partitions
            .into_iter()
            .enumerate()
            .map(|(i, (value, subset))| {
                let mut child = node.clone();
                child.node_type = Arc::from(VIEW);
                child.params.clear();
                child.data = Some(Arc::from(subset));
                child.size = Some(crate::layout::Size {
                    width,
                    height: parent_size.height,
                });
                #[allow(
                    clippy::cast_precision_loss,
                    reason = "facet counts are far below 2^52"
                )]
                let dx = i as f64 * width;
                child.origin = kurbo::Point::new(node.origin.x + dx, node.origin.y);
                child.key = Some(Arc::from(format!("{base_key}/{}", value.label())));
                child.frame = true;
                child
            })
            .collect())
    }
}
