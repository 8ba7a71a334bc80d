// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `trellis_runtime`: a declarative chart runtime over `trellis_scene`.
//!
//! A chart is authored as a tree of [`SpecNode`]s: leaf `"view"` nodes carry
//! mark layers, encodings, coordinate directives and interaction directives;
//! non-leaf nodes route to registered composite handlers that expand into
//! child views. The runtime:
//! - resolves the tree into views ([`resolve_views`]) and runs each through
//!   the staged view pipeline ([`initialize_view`]): theme, scales, guides,
//!   layout, coordinate, geometry
//! - mirrors every view into the scene tree with keyed reconciliation, so
//!   re-rendering an unchanged specification touches nothing ([`Chart`])
//! - routes pointer events to the view under the cursor and runs its
//!   configured action chain (tooltip, selection) against the live scene.
//!
//! Rasterization is out of scope: embedders walk the resulting
//! [`trellis_scene::SceneTree`] and paint it with their own backend.

#![no_std]

extern crate alloc;

mod chart;
mod component;
mod composition;
mod coord;
mod error;
#[cfg(not(feature = "std"))]
mod float;
mod format;
mod interaction;
mod interval_mark;
mod layout;
mod line_mark;
mod mark;
mod pipeline;
mod point_mark;
mod registry;
mod scale;
#[cfg(test)]
mod scenario_tests;
mod select;
mod spec;
mod theme;
mod tooltip;
mod value;

pub use chart::{Chart, RenderStats};
pub use component::{
    GuideComponent, GuideKind, GuideSide, LegendItem, guide_margins, infer_guides, place_guides,
};
pub use composition::{Composite, FacetComposite, MAX_COMPOSITE_DEPTH, resolve_views};
pub use coord::{CoordDirective, Coordinate};
pub use error::ChartError;
pub use interaction::{
    Action, ActionBuilder, ActionScope, InteractionContext, Layers, PointerEvent, SharedState,
    TriggerInfo, UpdateRequest,
};
pub use interval_mark::{IntervalMark, RectShape};
pub use layout::{DEFAULT_SIZE, LayoutSpec, Padding, Size, ViewLayout};
pub use line_mark::{LineMark, LineShape};
pub use mark::{
    Adjust, CHANNEL_COLOR, CHANNEL_KEY, CHANNEL_SERIES, CHANNEL_X, CHANNEL_Y, CHANNEL_Y1,
    ChannelValues, ElementDatum, GeometryInput, MarkDefinition, MarkState, RowValue,
    ShapeRenderer, VisualRow, is_position_channel, scale_channel,
};
pub use pipeline::{MarkRender, View, initialize_view};
pub use point_mark::{PointMark, SymbolShape};
pub use registry::Registry;
pub use scale::{
    Scale, ScaleBand, ScaleConfig, ScaleDescriptor, ScaleKind, ScaleLinear, ScalePoint, Tick,
};
pub use select::{ElementSelectAction, ElementSelectBuilder};
pub use spec::{
    Encoding, InteractionSpec, MarkSpec, SpecNode, StyleSpec, TOOLTIP_PREFIX, VIEW,
};
pub use theme::{Theme, ThemeConfig};
pub use tooltip::{
    TooltipAction, TooltipBuilder, TooltipData, TooltipItem, TooltipOptions, resolve_tooltip,
};
pub use value::{FieldValue, Record};
