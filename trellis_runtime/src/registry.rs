// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The collaborator registry: one typed, open registration table per
//! extension category.
//!
//! The pipeline never hardcodes concrete collaborators; it looks marks,
//! shapes, composites, adjusts, actions and themes up by tag. The built-ins
//! arrive through [`Registry::with_defaults`], and external code registers
//! its own implementations the same way. Scales and coordinates are
//! configured through spec enums instead — their variants are part of the
//! geometry contract, not a plugin surface.

extern crate alloc;

use alloc::sync::Arc;

use hashbrown::HashMap;

use crate::composition::{Composite, FacetComposite};
use crate::interaction::ActionBuilder;
use crate::interval_mark::{IntervalMark, RectShape};
use crate::line_mark::{LineMark, LineShape};
use crate::mark::{Adjust, MarkDefinition, ShapeRenderer};
use crate::point_mark::{PointMark, SymbolShape};
use crate::select::ElementSelectBuilder;
use crate::theme::Theme;
use crate::tooltip::TooltipBuilder;

/// Typed registration tables for every extension category.
pub struct Registry {
    marks: HashMap<Arc<str>, Arc<dyn MarkDefinition>>,
    shapes: HashMap<Arc<str>, Arc<dyn ShapeRenderer>>,
    composites: HashMap<Arc<str>, Arc<dyn Composite>>,
    adjusts: HashMap<Arc<str>, Arc<dyn Adjust>>,
    actions: HashMap<Arc<str>, Arc<dyn ActionBuilder>>,
    themes: HashMap<Arc<str>, Theme>,
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("marks", &self.marks.len())
            .field("shapes", &self.shapes.len())
            .field("composites", &self.composites.len())
            .field("adjusts", &self.adjusts.len())
            .field("actions", &self.actions.len())
            .field("themes", &self.themes.len())
            .finish()
    }
}

impl Registry {
    /// An empty registry with no collaborators at all.
    pub fn empty() -> Self {
        Self {
            marks: HashMap::new(),
            shapes: HashMap::new(),
            composites: HashMap::new(),
            adjusts: HashMap::new(),
            actions: HashMap::new(),
            themes: HashMap::new(),
        }
    }

    /// A registry pre-populated with the built-in collaborators:
    /// `line`/`interval`/`point` marks and their shapes, the `facet`
    /// composite, the `tooltip` and `select` actions, and the `light` and
    /// `dark` themes.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register_mark(Arc::new(LineMark));
        registry.register_mark(Arc::new(IntervalMark));
        registry.register_mark(Arc::new(PointMark));
        registry.register_shape(Arc::new(LineShape));
        registry.register_shape(Arc::new(RectShape));
        registry.register_shape(Arc::new(SymbolShape));
        registry.register_composite(Arc::new(FacetComposite));
        registry.register_action(Arc::new(TooltipBuilder));
        registry.register_action(Arc::new(ElementSelectBuilder));
        registry.register_theme("light", Theme::light());
        registry.register_theme("dark", Theme::dark());
        registry
    }

    /// Register a mark definition under its tag.
    pub fn register_mark(&mut self, mark: Arc<dyn MarkDefinition>) {
        self.marks.insert(Arc::from(mark.tag()), mark);
    }

    /// Register a shape renderer under its tag.
    pub fn register_shape(&mut self, shape: Arc<dyn ShapeRenderer>) {
        self.shapes.insert(Arc::from(shape.tag()), shape);
    }

    /// Register a composite handler under its tag.
    pub fn register_composite(&mut self, composite: Arc<dyn Composite>) {
        self.composites.insert(Arc::from(composite.tag()), composite);
    }

    /// Register an adjuster under its tag.
    pub fn register_adjust(&mut self, adjust: Arc<dyn Adjust>) {
        self.adjusts.insert(Arc::from(adjust.tag()), adjust);
    }

    /// Register an action builder under its tag.
    pub fn register_action(&mut self, action: Arc<dyn ActionBuilder>) {
        self.actions.insert(Arc::from(action.tag()), action);
    }

    /// Register a theme under a name.
    pub fn register_theme(&mut self, name: impl Into<Arc<str>>, theme: Theme) {
        self.themes.insert(name.into(), theme);
    }

    /// Look up a mark definition.
    pub fn mark(&self, tag: &str) -> Option<&Arc<dyn MarkDefinition>> {
        self.marks.get(tag)
    }

    /// Look up a shape renderer.
    pub fn shape(&self, tag: &str) -> Option<&Arc<dyn ShapeRenderer>> {
        self.shapes.get(tag)
    }

    /// Look up a composite handler.
    pub fn composite(&self, tag: &str) -> Option<&Arc<dyn Composite>> {
        self.composites.get(tag)
    }

    /// Look up an adjuster.
    pub fn adjust(&self, tag: &str) -> Option<&Arc<dyn Adjust>> {
        self.adjusts.get(tag)
    }

    /// Look up an action builder.
    pub fn action(&self, tag: &str) -> Option<&Arc<dyn ActionBuilder>> {
        self.actions.get(tag)
    }

    /// Look up a theme by name.
    pub fn theme(&self, name: &str) -> Option<&Theme> {
        self.themes.get(name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn defaults_cover_the_built_ins() {
        let registry = Registry::with_defaults();
        for tag in ["line", "interval", "point"] {
            assert!(registry.mark(tag).is_some(), "missing mark {tag}");
        }
        for tag in ["line", "rect", "symbol"] {
            assert!(registry.shape(tag).is_some(), "missing shape {tag}");
        }
        assert!(registry.composite("facet").is_some());
        assert!(registry.action("tooltip").is_some());
        assert!(registry.action("select").is_some());
        assert!(registry.theme("light").is_some());
        assert!(registry.theme("dark").is_some());
        assert!(registry.mark("sankey").is_none());
    }

    #[test]
    fn registration_is_open() {
        use crate::mark::{GeometryInput, VisualRow};
        use alloc::vec::Vec;

        struct AreaMark;
        impl MarkDefinition for AreaMark {
            fn tag(&self) -> &'static str {
                "area"
            }
            fn default_shape(&self) -> &'static str {
                "rect"
            }
            fn build(&self, _input: &GeometryInput<'_>) -> Vec<VisualRow> {
                Vec::new()
            }
        }

        let mut registry = Registry::with_defaults();
        assert!(registry.mark("area").is_none());
        registry.register_mark(Arc::new(AreaMark));
        assert!(registry.mark("area").is_some());
    }
}
