// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View layout: from declared size and guide margins to the plot rectangle.
//!
//! The arrange pass is deliberately small: guides report a desired thickness
//! per side, the view reserves those margins (plus uniform outer padding),
//! and whatever is left becomes the plot rectangle marks draw into. An
//! explicit padding override on the specification wins over inference.

use kurbo::{Point, Rect};

/// A width/height pair in canvas units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    /// Width in canvas units.
    pub width: f64,
    /// Height in canvas units.
    pub height: f64,
}

/// The declared size used when a view does not set one.
pub const DEFAULT_SIZE: Size = Size {
    width: 640.0,
    height: 480.0,
};

impl Default for Size {
    fn default() -> Self {
        DEFAULT_SIZE
    }
}

/// Margin thicknesses reserved around the plot rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Padding {
    /// Margin above the plot.
    pub top: f64,
    /// Margin right of the plot.
    pub right: f64,
    /// Margin below the plot.
    pub bottom: f64,
    /// Margin left of the plot.
    pub left: f64,
}

impl Padding {
    /// A uniform padding on all sides.
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// Layout inputs for one view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutSpec {
    /// Origin of the view in canvas space.
    pub origin: Point,
    /// Declared outer size.
    pub size: Size,
    /// Uniform padding applied outside the guides.
    pub outer_padding: f64,
    /// Margins requested by inferred guides, per side.
    pub guides: Padding,
    /// Explicit padding override; when set, guides and outer padding are
    /// ignored for margin computation (guides still render inside it).
    pub padding: Option<Padding>,
}

impl Default for LayoutSpec {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            size: DEFAULT_SIZE,
            outer_padding: 10.0,
            guides: Padding::default(),
            padding: None,
        }
    }
}

/// Output of the arrange pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewLayout {
    /// Outer view bounds in canvas space.
    pub view: Rect,
    /// Inner plotting rectangle.
    pub plot: Rect,
    /// Reserved margins between `view` and `plot`.
    pub padding: Padding,
}

impl ViewLayout {
    /// Computes a layout from the provided specification.
    pub fn arrange(spec: &LayoutSpec) -> Self {
        let outer = spec.outer_padding.max(0.0);
        let padding = spec.padding.unwrap_or(Padding {
            top: outer + spec.guides.top.max(0.0),
            right: outer + spec.guides.right.max(0.0),
            bottom: outer + spec.guides.bottom.max(0.0),
            left: outer + spec.guides.left.max(0.0),
        });

        let width = spec.size.width.max(0.0);
        let height = spec.size.height.max(0.0);
        let view = Rect::new(
            spec.origin.x,
            spec.origin.y,
            spec.origin.x + width,
            spec.origin.y + height,
        );

        let plot_w = (width - padding.left - padding.right).max(0.0);
        let plot_h = (height - padding.top - padding.bottom).max(0.0);
        let plot = Rect::new(
            view.x0 + padding.left,
            view.y0 + padding.top,
            view.x0 + padding.left + plot_w,
            view.y0 + padding.top + plot_h,
        );

        Self {
            view,
            plot,
            padding,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn guides_reserve_margins_around_the_plot() {
        let spec = LayoutSpec {
            origin: Point::new(5.0, 7.0),
            size: Size {
                width: 200.0,
                height: 100.0,
            },
            outer_padding: 10.0,
            guides: Padding {
                top: 24.0,
                right: 0.0,
                bottom: 30.0,
                left: 40.0,
            },
            padding: None,
        };
        let layout = ViewLayout::arrange(&spec);
        assert_eq!(layout.view, Rect::new(5.0, 7.0, 205.0, 107.0));
        assert_eq!(layout.plot.x0, 5.0 + 10.0 + 40.0);
        assert_eq!(layout.plot.y0, 7.0 + 10.0 + 24.0);
        assert_eq!(layout.plot.x1, 205.0 - 10.0);
        assert_eq!(layout.plot.y1, 107.0 - 10.0 - 30.0);
    }

    #[test]
    fn explicit_padding_overrides_inference() {
        let spec = LayoutSpec {
            size: Size {
                width: 100.0,
                height: 100.0,
            },
            guides: Padding::uniform(30.0),
            padding: Some(Padding::uniform(5.0)),
            ..LayoutSpec::default()
        };
        let layout = ViewLayout::arrange(&spec);
        assert_eq!(layout.plot, Rect::new(5.0, 5.0, 95.0, 95.0));
    }

    #[test]
    fn oversized_margins_clamp_the_plot_to_empty() {
        let spec = LayoutSpec {
            size: Size {
                width: 30.0,
                height: 30.0,
            },
            guides: Padding::uniform(40.0),
            ..LayoutSpec::default()
        };
        let layout = ViewLayout::arrange(&spec);
        assert_eq!(layout.plot.width(), 0.0);
        assert_eq!(layout.plot.height(), 0.0);
    }
}
