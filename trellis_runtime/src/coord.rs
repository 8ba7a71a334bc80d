// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate systems: projecting normalized positions onto the plot.
//!
//! Scales produce normalized `[0, 1]` values; a [`Coordinate`] owns the plot
//! rectangle and an ordered list of transform directives that reinterpret
//! those values before projection. Directives compose left-to-right, so
//! `[Transpose, Polar]` and `[Polar, Transpose]` are distinct frames.

extern crate alloc;

use alloc::vec::Vec;
use core::f64::consts::{FRAC_PI_2, PI, TAU};

use kurbo::{Point, Rect};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// One coordinate transform directive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CoordDirective {
    /// Swap the roles of the two positional dimensions.
    Transpose,
    /// Wrap the plot into polar angle/radius space.
    Polar {
        /// Sweep start angle in radians (`-PI/2` is 12 o'clock).
        start_angle: f64,
        /// Sweep end angle in radians.
        end_angle: f64,
        /// Inner radius as a fraction of the outer radius.
        inner_radius: f64,
        /// Outer radius as a fraction of the plot's half-extent.
        outer_radius: f64,
    },
}

impl CoordDirective {
    /// A full-circle polar frame starting at 12 o'clock, sweeping clockwise.
    pub fn polar() -> Self {
        Self::Polar {
            start_angle: -FRAC_PI_2,
            end_angle: PI + FRAC_PI_2,
            inner_radius: 0.0,
            outer_radius: 1.0,
        }
    }
}

/// A pixel-space plotting frame with an ordered transform list.
#[derive(Clone, Debug, PartialEq)]
pub struct Coordinate {
    plot: Rect,
    directives: Vec<CoordDirective>,
}

impl Coordinate {
    /// A coordinate over the given plot rectangle.
    pub fn new(plot: Rect, directives: impl Into<Vec<CoordDirective>>) -> Self {
        Self {
            plot,
            directives: directives.into(),
        }
    }

    /// The plot rectangle.
    pub fn plot(&self) -> Rect {
        self.plot
    }

    /// The plot center.
    pub fn center(&self) -> Point {
        self.plot.center()
    }

    /// Whether the frame swaps the positional dimensions overall.
    ///
    /// Interaction code uses this to pick which pixel axis tracks the primary
    /// position channel.
    pub fn is_transpose(&self) -> bool {
        let transposes = self
            .directives
            .iter()
            .filter(|d| matches!(d, CoordDirective::Transpose))
            .count();
        transposes % 2 == 1
    }

    /// Whether any polar directive is present.
    pub fn is_polar(&self) -> bool {
        self.directives
            .iter()
            .any(|d| matches!(d, CoordDirective::Polar { .. }))
    }

    /// Projects a normalized position onto the plot, in pixels.
    ///
    /// In the base frame `u` runs left to right and `v` bottom to top.
    pub fn map(&self, u: f64, v: f64) -> Point {
        let (mut u, mut v) = (u, v);
        let mut screen = false;
        for directive in &self.directives {
            match directive {
                CoordDirective::Transpose => core::mem::swap(&mut u, &mut v),
                CoordDirective::Polar {
                    start_angle,
                    end_angle,
                    inner_radius,
                    outer_radius,
                } => {
                    let angle = start_angle + u * (end_angle - start_angle);
                    let r = inner_radius + v * (outer_radius - inner_radius);
                    u = 0.5 + 0.5 * r * angle.cos();
                    v = 0.5 + 0.5 * r * angle.sin();
                    screen = true;
                }
            }
        }
        if screen {
            // The polar unit square projects onto the centered square of side
            // `2 * half_extent` so circles stay circular in non-square plots.
            let half = self.half_extent();
            let c = self.center();
            Point::new(c.x + (u - 0.5) * 2.0 * half, c.y + (v - 0.5) * 2.0 * half)
        } else {
            let w = self.plot.width();
            let h = self.plot.height();
            Point::new(self.plot.x0 + u * w, self.plot.y1 - v * h)
        }
    }

    /// Maps a pixel position back to normalized coordinates.
    pub fn invert(&self, p: Point) -> (f64, f64) {
        let (mut u, mut v) = if self.is_polar() {
            let half = self.half_extent();
            let c = self.center();
            if half == 0.0 {
                (0.5, 0.5)
            } else {
                (
                    (p.x - c.x) / (2.0 * half) + 0.5,
                    (p.y - c.y) / (2.0 * half) + 0.5,
                )
            }
        } else {
            let w = self.plot.width();
            let h = self.plot.height();
            (
                if w == 0.0 { 0.0 } else { (p.x - self.plot.x0) / w },
                if h == 0.0 { 0.0 } else { (self.plot.y1 - p.y) / h },
            )
        };
        for directive in self.directives.iter().rev() {
            match directive {
                CoordDirective::Transpose => core::mem::swap(&mut u, &mut v),
                CoordDirective::Polar {
                    start_angle,
                    end_angle,
                    inner_radius,
                    outer_radius,
                } => {
                    let dx = u - 0.5;
                    let dy = v - 0.5;
                    let r = 2.0 * (dx * dx + dy * dy).sqrt();
                    let mut angle = dy.atan2(dx);
                    let sweep = end_angle - start_angle;
                    while angle < *start_angle {
                        angle += TAU;
                    }
                    while angle >= start_angle + TAU {
                        angle -= TAU;
                    }
                    u = if sweep == 0.0 {
                        0.0
                    } else {
                        (angle - start_angle) / sweep
                    };
                    let depth = outer_radius - inner_radius;
                    v = if depth == 0.0 {
                        0.0
                    } else {
                        (r - inner_radius) / depth
                    };
                }
            }
        }
        (u, v)
    }

    fn half_extent(&self) -> f64 {
        0.5 * self.plot.width().min(self.plot.height())
    }
}
