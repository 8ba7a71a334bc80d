// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The declarative specification tree.
//!
//! A chart is authored as a tree of [`SpecNode`]s. Leaf nodes carry the
//! `"view"` tag (or a mark tag, shorthand for a single-mark view) and are
//! rendered by the view pipeline; any other tag routes to a registered
//! composite handler that expands the node into children. Nodes are immutable
//! as authored: expansion produces new nodes and shares row data by `Arc`.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;
use peniko::Color;

use crate::coord::CoordDirective;
use crate::layout::{Padding, Size};
use crate::mark::VisualRow;
use crate::scale::ScaleConfig;
use crate::theme::ThemeConfig;
use crate::value::{FieldValue, Record};

/// The leaf node tag.
pub const VIEW: &str = "view";

/// Channel names with this prefix are carried into tooltip items.
pub const TOOLTIP_PREFIX: &str = "tooltip";

/// How one visual channel reads its value per row.
#[derive(Clone)]
pub enum Encoding {
    /// Read the named field from each row.
    Field(Arc<str>),
    /// Use one constant value for every row.
    Constant(FieldValue),
    /// Compute the value from the row.
    Computed(Arc<dyn Fn(&Record) -> FieldValue>),
}

impl Encoding {
    /// Encode from a named field.
    pub fn field(name: impl Into<Arc<str>>) -> Self {
        Self::Field(name.into())
    }

    /// Encode a constant value.
    pub fn constant(value: impl Into<FieldValue>) -> Self {
        Self::Constant(value.into())
    }

    /// Encode a computed value.
    pub fn computed(f: impl Fn(&Record) -> FieldValue + 'static) -> Self {
        Self::Computed(Arc::new(f))
    }

    /// The source field name, for field encodings.
    pub fn field_name(&self) -> Option<&Arc<str>> {
        match self {
            Self::Field(name) => Some(name),
            _ => None,
        }
    }

    /// Reads the channel value for one row.
    pub fn read(&self, row: &Record) -> FieldValue {
        match self {
            Self::Field(name) => row.get(name).cloned().unwrap_or(FieldValue::Null),
            Self::Constant(value) => value.clone(),
            Self::Computed(f) => f(row),
        }
    }
}

impl From<&str> for Encoding {
    fn from(name: &str) -> Self {
        Self::field(name)
    }
}

impl fmt::Debug for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

/// Style attributes applied to a mark's rendered shapes.
///
/// Unset fields fall back to theme defaults and the series color.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StyleSpec {
    /// Fill color override.
    pub fill: Option<Color>,
    /// Stroke color override.
    pub stroke: Option<Color>,
    /// Stroke width override.
    pub stroke_width: Option<f64>,
    /// Uniform opacity override.
    pub opacity: Option<f64>,
    /// Symbol radius override, for point-like shapes.
    pub radius: Option<f64>,
}

type ChildrenFn = dyn Fn(&[Record], &[VisualRow]) -> Vec<SpecNode>;
type FilterFn = dyn Fn(&Record) -> bool;

/// One visual layer within a view.
#[derive(Clone)]
pub struct MarkSpec {
    /// Mark type tag resolved through the mark registry.
    pub mark_type: Arc<str>,
    /// Mark-local rows; falls back to the view's data when `None`.
    pub data: Option<Arc<[Record]>>,
    /// Channel encodings in declaration order.
    pub encode: Vec<(Arc<str>, Encoding)>,
    /// Per-channel scale overrides.
    pub scale: Vec<(Arc<str>, ScaleConfig)>,
    /// Style attributes.
    pub style: StyleSpec,
    /// Per-row facet predicate; rows failing it are dropped from visual data.
    pub filter: Option<Arc<FilterFn>>,
    /// Callback producing derived child nodes after geometry.
    pub children: Option<Arc<ChildrenFn>>,
    /// Statistical adjustment applied to produced rows.
    pub adjust: Option<Arc<str>>,
    /// Shape tag overriding the mark's default shape.
    pub shape: Option<Arc<str>>,
    /// Enter-animation tag recorded on entering elements.
    pub animation: Option<Arc<str>>,
    /// Stable key for reconciliation; falls back to the layer's ordinal.
    pub key: Option<Arc<str>>,
}

impl MarkSpec {
    /// A mark of the given registered type.
    pub fn new(mark_type: impl Into<Arc<str>>) -> Self {
        Self {
            mark_type: mark_type.into(),
            data: None,
            encode: Vec::new(),
            scale: Vec::new(),
            style: StyleSpec::default(),
            filter: None,
            children: None,
            adjust: None,
            shape: None,
            animation: None,
            key: None,
        }
    }

    /// Attach mark-local rows.
    pub fn with_data(mut self, data: impl Into<Arc<[Record]>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Add a channel encoding.
    pub fn with_encode(mut self, channel: impl Into<Arc<str>>, encoding: impl Into<Encoding>) -> Self {
        self.encode.push((channel.into(), encoding.into()));
        self
    }

    /// Add a per-channel scale override.
    pub fn with_scale(mut self, channel: impl Into<Arc<str>>, config: ScaleConfig) -> Self {
        self.scale.push((channel.into(), config));
        self
    }

    /// Set style attributes.
    pub fn with_style(mut self, style: StyleSpec) -> Self {
        self.style = style;
        self
    }

    /// Set the facet predicate.
    pub fn with_filter(mut self, filter: impl Fn(&Record) -> bool + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Set the children callback.
    pub fn with_children(
        mut self,
        children: impl Fn(&[Record], &[VisualRow]) -> Vec<SpecNode> + 'static,
    ) -> Self {
        self.children = Some(Arc::new(children));
        self
    }

    /// Declare a statistical adjustment by registered tag.
    pub fn with_adjust(mut self, adjust: impl Into<Arc<str>>) -> Self {
        self.adjust = Some(adjust.into());
        self
    }

    /// Override the mark's default shape.
    pub fn with_shape(mut self, shape: impl Into<Arc<str>>) -> Self {
        self.shape = Some(shape.into());
        self
    }

    /// Declare the enter animation.
    pub fn with_animation(mut self, animation: impl Into<Arc<str>>) -> Self {
        self.animation = Some(animation.into());
        self
    }

    /// Set the stable reconciliation key.
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Look up a channel encoding by name.
    pub fn encoding(&self, channel: &str) -> Option<&Encoding> {
        self.encode
            .iter()
            .find(|(name, _)| &**name == channel)
            .map(|(_, encoding)| encoding)
    }

    /// Look up a channel's scale override.
    pub fn scale_config(&self, channel: &str) -> Option<&ScaleConfig> {
        self.scale
            .iter()
            .find(|(name, _)| &**name == channel)
            .map(|(_, config)| config)
    }
}

impl fmt::Debug for MarkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkSpec")
            .field("mark_type", &self.mark_type)
            .field("rows", &self.data.as_ref().map_or(0, |d| d.len()))
            .field("encode", &self.encode)
            .field("scale", &self.scale)
            .field("style", &self.style)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .field("children", &self.children.as_ref().map(|_| "<fn>"))
            .field("adjust", &self.adjust)
            .field("shape", &self.shape)
            .field("animation", &self.animation)
            .field("key", &self.key)
            .finish()
    }
}

/// One configured interaction behavior: a registered action plus parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionSpec {
    /// Registered action tag.
    pub action: Arc<str>,
    /// Free-form parameters read by the action's builder.
    pub params: Vec<(Arc<str>, FieldValue)>,
}

impl InteractionSpec {
    /// An interaction naming a registered action.
    pub fn new(action: impl Into<Arc<str>>) -> Self {
        Self {
            action: action.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, name: impl Into<Arc<str>>, value: impl Into<FieldValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&FieldValue> {
        self.params
            .iter()
            .find(|(param, _)| &**param == name)
            .map(|(_, value)| value)
    }

    /// A boolean parameter with a default.
    pub fn bool_param(&self, name: &str, default: bool) -> bool {
        self.param(name).and_then(FieldValue::as_bool).unwrap_or(default)
    }

    /// A string parameter.
    pub fn str_param(&self, name: &str) -> Option<Arc<str>> {
        match self.param(name) {
            Some(FieldValue::Str(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

/// A node in the declarative specification tree.
#[derive(Clone, Debug)]
pub struct SpecNode {
    /// Node type tag: a mark type, a composite type, or [`VIEW`].
    pub node_type: Arc<str>,
    /// Rows attached to this node, shared with expanded children.
    pub data: Option<Arc<[Record]>>,
    /// Declared outer size; defaults apply when unset.
    pub size: Option<Size>,
    /// Origin of the node's frame in canvas space.
    pub origin: Point,
    /// Explicit padding override.
    pub padding: Option<Padding>,
    /// Ordered coordinate transform directives.
    pub coordinate: Vec<CoordDirective>,
    /// Mark layers, painted in order.
    pub marks: Vec<MarkSpec>,
    /// Ordered interaction directives.
    pub interactions: Vec<InteractionSpec>,
    /// Theme selection and overrides.
    pub theme: ThemeConfig,
    /// Stable identity across renders; defaults to the traversal ordinal.
    pub key: Option<Arc<str>>,
    /// Draw a frame around the view bounds.
    pub frame: bool,
    /// Free-form parameters consumed by composite handlers.
    pub params: Vec<(Arc<str>, FieldValue)>,
}

impl SpecNode {
    /// A node with the given type tag.
    pub fn new(node_type: impl Into<Arc<str>>) -> Self {
        Self {
            node_type: node_type.into(),
            data: None,
            size: None,
            origin: Point::ZERO,
            padding: None,
            coordinate: Vec::new(),
            marks: Vec::new(),
            interactions: Vec::new(),
            theme: ThemeConfig::default(),
            key: None,
            frame: false,
            params: Vec::new(),
        }
    }

    /// A leaf view node.
    pub fn view() -> Self {
        Self::new(VIEW)
    }

    /// A single-mark node; the resolver treats it as a one-layer view.
    pub fn from_mark(mark: MarkSpec) -> Self {
        let mut node = Self::new(mark.mark_type.clone());
        node.marks.push(mark);
        node
    }

    /// Attach rows.
    pub fn with_data(mut self, data: impl Into<Arc<[Record]>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Declare the outer size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Some(Size { width, height });
        self
    }

    /// Place the node's frame at a canvas position.
    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.origin = Point::new(x, y);
        self
    }

    /// Override the inferred padding.
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = Some(padding);
        self
    }

    /// Append a coordinate directive.
    pub fn with_coordinate(mut self, directive: CoordDirective) -> Self {
        self.coordinate.push(directive);
        self
    }

    /// Append a mark layer.
    pub fn with_mark(mut self, mark: MarkSpec) -> Self {
        self.marks.push(mark);
        self
    }

    /// Append an interaction directive.
    pub fn with_interaction(mut self, interaction: InteractionSpec) -> Self {
        self.interactions.push(interaction);
        self
    }

    /// Select the theme.
    pub fn with_theme(mut self, theme: ThemeConfig) -> Self {
        self.theme = theme;
        self
    }

    /// Set the stable key.
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Draw a frame around the view bounds.
    pub fn with_frame(mut self, frame: bool) -> Self {
        self.frame = frame;
        self
    }

    /// Add a composite parameter.
    pub fn with_param(mut self, name: impl Into<Arc<str>>, value: impl Into<FieldValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Look up a composite parameter by name.
    pub fn param(&self, name: &str) -> Option<&FieldValue> {
        self.params
            .iter()
            .find(|(param, _)| &**param == name)
            .map(|(_, value)| value)
    }

    /// Whether this node carries the leaf view tag.
    pub fn is_view(&self) -> bool {
        &*self.node_type == VIEW
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn encodings_read_fields_constants_and_computed_values() {
        let row = Record::new().with("temperature", 18.0).with("city", "London");

        let field = Encoding::from("temperature");
        assert_eq!(field.read(&row), FieldValue::Number(18.0));
        assert_eq!(field.field_name().map(|f| &**f), Some("temperature"));

        let constant = Encoding::constant("fixed");
        assert_eq!(constant.read(&row), FieldValue::from("fixed"));
        assert_eq!(constant.field_name(), None);

        let computed = Encoding::computed(|row| {
            let v = row.get("temperature").and_then(FieldValue::as_f64);
            FieldValue::Number(v.unwrap_or(0.0) * 2.0)
        });
        assert_eq!(computed.read(&row), FieldValue::Number(36.0));
    }

    #[test]
    fn missing_fields_read_as_null() {
        let row = Record::new().with("city", "Berlin");
        assert_eq!(Encoding::from("temperature").read(&row), FieldValue::Null);
    }

    #[test]
    fn interaction_params_have_typed_accessors() {
        let spec = InteractionSpec::new("tooltip")
            .with_param("shared", true)
            .with_param("filter_by", "city");
        assert!(spec.bool_param("shared", false));
        assert!(!spec.bool_param("absent", false));
        assert_eq!(spec.str_param("filter_by").as_deref(), Some("city"));
        assert_eq!(spec.str_param("shared"), None);
    }

    #[test]
    fn mark_nodes_carry_their_layer() {
        let node = SpecNode::from_mark(MarkSpec::new("line").with_encode("x", "month"));
        assert_eq!(&*node.node_type, "line");
        assert_eq!(node.marks.len(), 1);
        assert!(!node.is_view());
        assert!(SpecNode::view().is_view());
    }
}
