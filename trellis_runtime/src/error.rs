// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors surfaced by chart resolution and interaction dispatch.

extern crate alloc;

use alloc::sync::Arc;

/// A fatal configuration or dispatch error.
///
/// Configuration errors abort the render pass that detected them and are
/// never retried; a re-render with a corrected specification starts clean.
/// Queries that merely match nothing (tooltip misses, empty selections) are
/// not errors and resolve to `None` or an empty set instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChartError {
    /// A specification node's type tag matched no registered mark or composite.
    UnknownComposite {
        /// The unrecognized node type tag.
        tag: Arc<str>,
    },
    /// A mark specification named a type with no registered definition.
    UnknownMark {
        /// The unrecognized mark type tag.
        tag: Arc<str>,
    },
    /// A visual row declared a shape with no registered renderer.
    UnknownShape {
        /// The unrecognized shape tag.
        tag: Arc<str>,
    },
    /// An interaction directive named an action with no registered builder.
    UnknownAction {
        /// The unrecognized action tag.
        tag: Arc<str>,
    },
    /// A node configured a theme name with no registered theme.
    UnknownTheme {
        /// The unrecognized theme name.
        name: Arc<str>,
    },
    /// A mark declared an adjustment with no registered adjuster.
    UnknownAdjust {
        /// The unrecognized adjustment tag.
        tag: Arc<str>,
    },
    /// Composite expansion exceeded [`crate::composition::MAX_COMPOSITE_DEPTH`].
    ///
    /// A composite that re-emits itself (directly or through a cycle) would
    /// otherwise expand forever.
    CompositeDepthExceeded {
        /// The tag of the node that crossed the limit.
        tag: Arc<str>,
    },
    /// An event was dispatched to a view key that is not currently rendered.
    UnknownView {
        /// The missing view key.
        key: Arc<str>,
    },
    /// An action aborted the remaining chain for the current event.
    ActionFailed {
        /// The registered tag of the failing action.
        action: Arc<str>,
    },
}
