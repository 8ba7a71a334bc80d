// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scales: reversible mappings from abstract domain values to normalized
//! visual values in `[0, 1]`.
//!
//! A scale owns one channel's domain. Pixel placement is not its concern;
//! the coordinate system projects normalized values onto the plot rectangle,
//! so the same scale works unchanged under transposed and polar frames.
//!
//! Scales are inferred per channel from the encoded values (a
//! [`ScaleDescriptor`] is the mergeable intermediate), then materialized once
//! per view and shared by reference across that view's marks.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::format::format_tick_with_step;
use crate::value::FieldValue;

/// The scale families understood by channel configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleKind {
    /// Continuous numeric mapping.
    Linear,
    /// Discrete bands with padding, for interval-like marks.
    Band,
    /// Discrete points spread across the range.
    Point,
}

/// Authored per-channel scale overrides.
///
/// Everything here is optional; unset fields are inferred from the encoded
/// values and the mark's channel contract.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScaleConfig {
    /// Force a scale kind instead of inferring one from the data.
    pub kind: Option<ScaleKind>,
    /// Explicit domain override.
    pub domain: Option<Vec<FieldValue>>,
    /// Round an inferred continuous domain outward to tick-friendly values.
    pub nice: bool,
    /// Band/point padding override.
    pub padding: Option<f64>,
}

impl ScaleConfig {
    /// Force a scale kind.
    pub fn with_kind(mut self, kind: ScaleKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Override the domain.
    pub fn with_domain(mut self, domain: impl IntoIterator<Item = FieldValue>) -> Self {
        self.domain = Some(domain.into_iter().collect());
        self
    }

    /// Round an inferred continuous domain to tick-friendly values.
    pub fn with_nice(mut self, nice: bool) -> Self {
        self.nice = nice;
        self
    }

    /// Override band/point padding.
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = Some(padding);
        self
    }
}

const DEFAULT_BAND_PADDING: f64 = 0.1;
const DEFAULT_POINT_PADDING: f64 = 0.5;

/// A channel's domain before materialization, mergeable across marks.
///
/// Two marks encoding the same channel contribute one descriptor each; the
/// pipeline merges them so both marks end up sharing a single scale whose
/// domain covers the union of their data.
#[derive(Clone, Debug, PartialEq)]
pub enum ScaleDescriptor {
    /// Continuous numeric domain.
    Linear {
        /// Smallest observed or configured value.
        min: f64,
        /// Largest observed or configured value.
        max: f64,
        /// Round the domain outward to tick-friendly values.
        nice: bool,
        /// Extend the domain to include zero.
        zero: bool,
    },
    /// Discrete banded domain.
    Band {
        /// Category values in first-seen order.
        values: Vec<FieldValue>,
        /// Inner and outer padding as a fraction of the band step.
        padding: f64,
    },
    /// Discrete point domain.
    Point {
        /// Category values in first-seen order.
        values: Vec<FieldValue>,
        /// Outer padding as a fraction of the point step.
        padding: f64,
    },
}

impl ScaleDescriptor {
    /// Infers a descriptor from one channel's values.
    ///
    /// Numeric (and all-null) columns infer linear; columns containing any
    /// string or boolean infer `discrete`, the mark's preferred discrete
    /// family for the channel. `zero` extends an inferred linear domain to
    /// include the baseline, which interval-like marks require.
    pub fn infer(
        values: &[FieldValue],
        config: &ScaleConfig,
        discrete: ScaleKind,
        zero: bool,
    ) -> Self {
        let has_category = values
            .iter()
            .any(|v| matches!(v, FieldValue::Str(_) | FieldValue::Bool(_)));
        let kind = config.kind.unwrap_or(if has_category {
            discrete
        } else {
            ScaleKind::Linear
        });

        match kind {
            ScaleKind::Linear => {
                let configured = config.domain.as_ref().map(|domain| {
                    let numbers: Vec<f64> = domain.iter().filter_map(FieldValue::as_f64).collect();
                    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    (min, max)
                });
                let (min, max) = configured.unwrap_or_else(|| infer_extent(values));
                let (min, max) = if zero && config.domain.is_none() {
                    (min.min(0.0), max.max(0.0))
                } else {
                    (min, max)
                };
                Self::Linear {
                    min,
                    max,
                    nice: config.nice,
                    zero,
                }
            }
            ScaleKind::Band => Self::Band {
                values: configured_categories(values, config),
                padding: config.padding.unwrap_or(DEFAULT_BAND_PADDING),
            },
            ScaleKind::Point => Self::Point {
                values: configured_categories(values, config),
                padding: config.padding.unwrap_or(DEFAULT_POINT_PADDING),
            },
        }
    }

    /// Merges another mark's descriptor for the same channel into this one.
    ///
    /// Matching kinds union their domains. On a kind mismatch the first
    /// descriptor wins unchanged; the first mark to touch a channel fixes its
    /// family.
    pub fn merge(&mut self, other: &Self) {
        match (self, other) {
            (
                Self::Linear {
                    min, max, nice, zero, ..
                },
                Self::Linear {
                    min: other_min,
                    max: other_max,
                    nice: other_nice,
                    zero: other_zero,
                },
            ) => {
                *min = min.min(*other_min);
                *max = max.max(*other_max);
                *nice |= *other_nice;
                *zero |= *other_zero;
            }
            (
                Self::Band { values, .. } | Self::Point { values, .. },
                Self::Band {
                    values: other_values,
                    ..
                }
                | Self::Point {
                    values: other_values,
                    ..
                },
            ) => {
                for v in other_values {
                    if !values.contains(v) {
                        values.push(v.clone());
                    }
                }
            }
            _ => {}
        }
    }

    /// Materializes the descriptor into a scale instance.
    pub fn materialize(&self, field: Option<Arc<str>>) -> Scale {
        match self {
            Self::Linear { min, max, nice, .. } => {
                let mut domain = if min.is_finite() && max.is_finite() {
                    [*min, *max]
                } else {
                    [0.0, 1.0]
                };
                if *nice {
                    domain = nice_domain(domain, DEFAULT_TICK_COUNT);
                }
                Scale::Linear(ScaleLinear { domain, field })
            }
            Self::Band { values, padding } => Scale::Band(ScaleBand {
                values: values.clone(),
                padding: padding.clamp(0.0, 1.0),
                field,
            }),
            Self::Point { values, padding } => Scale::Point(ScalePoint {
                values: values.clone(),
                padding: padding.max(0.0),
                field,
            }),
        }
    }
}

fn infer_extent(values: &[FieldValue]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        if let Some(n) = v.as_f64()
            && n.is_finite()
        {
            min = min.min(n);
            max = max.max(n);
        }
    }
    if min.is_finite() { (min, max) } else { (0.0, 1.0) }
}

fn configured_categories(values: &[FieldValue], config: &ScaleConfig) -> Vec<FieldValue> {
    if let Some(domain) = &config.domain {
        return domain.clone();
    }
    let mut out = Vec::new();
    for v in values {
        if !v.is_null() && !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}

/// One tick: a normalized position plus its display label.
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    /// Position in normalized `[0, 1]` range coordinates.
    pub position: f64,
    /// Display label.
    pub label: String,
}

/// A resolved scale: abstract domain value to normalized `[0, 1]` and back.
#[derive(Clone, Debug, PartialEq)]
pub enum Scale {
    /// Continuous linear mapping.
    Linear(ScaleLinear),
    /// Discrete bands with padding.
    Band(ScaleBand),
    /// Discrete points spread across the range.
    Point(ScalePoint),
}

impl Scale {
    /// The scale's family.
    pub fn kind(&self) -> ScaleKind {
        match self {
            Self::Linear(_) => ScaleKind::Linear,
            Self::Band(_) => ScaleKind::Band,
            Self::Point(_) => ScaleKind::Point,
        }
    }

    /// Whether the domain is a category list.
    pub fn is_discrete(&self) -> bool {
        !matches!(self, Self::Linear(_))
    }

    /// Maps a domain value to a normalized position.
    ///
    /// `None` means the value has no defined position on this scale (null,
    /// an unknown category, or a non-number on a continuous scale); rows with
    /// undefined positions are excluded from visual data.
    pub fn map(&self, value: &FieldValue) -> Option<f64> {
        match self {
            Self::Linear(s) => s.map(value),
            Self::Band(s) => s.map(value),
            Self::Point(s) => s.map(value),
        }
    }

    /// Maps a normalized position back to a domain value.
    ///
    /// Discrete scales return the nearest category; continuous scales
    /// interpolate.
    pub fn invert(&self, position: f64) -> FieldValue {
        match self {
            Self::Linear(s) => FieldValue::Number(s.invert(position)),
            Self::Band(s) => s.invert(position),
            Self::Point(s) => s.invert(position),
        }
    }

    /// The resolved field label, used for guide and tooltip titles.
    pub fn field(&self) -> Option<&Arc<str>> {
        match self {
            Self::Linear(s) => s.field.as_ref(),
            Self::Band(s) => s.field.as_ref(),
            Self::Point(s) => s.field.as_ref(),
        }
    }

    /// The domain as a value list: `[min, max]` for continuous scales, the
    /// category list for discrete ones.
    pub fn domain_values(&self) -> Vec<FieldValue> {
        match self {
            Self::Linear(s) => Vec::from([
                FieldValue::Number(s.domain[0]),
                FieldValue::Number(s.domain[1]),
            ]),
            Self::Band(s) => s.values.clone(),
            Self::Point(s) => s.values.clone(),
        }
    }

    /// The ordinal index of a category, used for palette assignment.
    pub fn index_of(&self, value: &FieldValue) -> Option<usize> {
        match self {
            Self::Linear(_) => None,
            Self::Band(s) => s.index_of(value),
            Self::Point(s) => s.index_of(value),
        }
    }

    /// The normalized band width, for banded scales.
    pub fn band_width(&self) -> Option<f64> {
        match self {
            Self::Band(s) => Some(s.band_width()),
            _ => None,
        }
    }

    /// Tick positions and labels for guides.
    ///
    /// `count` is a target for continuous scales; discrete scales return one
    /// tick per category at its center.
    pub fn ticks(&self, count: usize) -> Vec<Tick> {
        match self {
            Self::Linear(s) => s.ticks(count),
            Self::Band(s) => s
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| Tick {
                    position: s.position(i) + 0.5 * s.band_width(),
                    label: v.label(),
                })
                .collect(),
            Self::Point(s) => s
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| Tick {
                    position: s.position(i),
                    label: v.label(),
                })
                .collect(),
        }
    }
}

/// Continuous linear scale over a numeric domain.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleLinear {
    /// Domain endpoints.
    pub domain: [f64; 2],
    /// Resolved field label.
    pub field: Option<Arc<str>>,
}

const DEFAULT_TICK_COUNT: usize = 5;

impl ScaleLinear {
    fn map(&self, value: &FieldValue) -> Option<f64> {
        let v = value.as_f64()?;
        if !v.is_finite() {
            return None;
        }
        let span = self.domain[1] - self.domain[0];
        if span == 0.0 {
            return Some(0.0);
        }
        Some((v - self.domain[0]) / span)
    }

    fn invert(&self, position: f64) -> f64 {
        self.domain[0] + position * (self.domain[1] - self.domain[0])
    }

    fn ticks(&self, count: usize) -> Vec<Tick> {
        let (values, step) = nice_ticks(self.domain, count);
        values
            .into_iter()
            .filter_map(|v| {
                let position = self.map(&FieldValue::Number(v))?;
                Some(Tick {
                    position,
                    label: format_tick_with_step(v, step),
                })
            })
            .collect()
    }
}

/// Discrete band scale: each category owns a band of the range.
///
/// `map` returns the band start; interval-like marks span
/// `start..start + band_width`, and tick centers sit half a band further.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleBand {
    /// Category values in domain order.
    pub values: Vec<FieldValue>,
    /// Inner and outer padding as a fraction of the step.
    pub padding: f64,
    /// Resolved field label.
    pub field: Option<Arc<str>>,
}

impl ScaleBand {
    /// Distance between consecutive band starts, in normalized units.
    pub fn step(&self) -> f64 {
        #[allow(
            clippy::cast_precision_loss,
            reason = "domain sizes are far below 2^52"
        )]
        let n = self.values.len() as f64;
        if n == 0.0 {
            return 0.0;
        }
        1.0 / (n + self.padding)
    }

    /// Width of one band, in normalized units.
    pub fn band_width(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    /// Start of the band at a domain index.
    pub fn position(&self, index: usize) -> f64 {
        #[allow(
            clippy::cast_precision_loss,
            reason = "domain sizes are far below 2^52"
        )]
        let i = index as f64;
        (self.padding + i) * self.step()
    }

    fn index_of(&self, value: &FieldValue) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }

    fn map(&self, value: &FieldValue) -> Option<f64> {
        self.index_of(value).map(|i| self.position(i))
    }

    fn invert(&self, position: f64) -> FieldValue {
        nearest_category(&self.values, position, |i| {
            self.position(i) + 0.5 * self.band_width()
        })
    }
}

/// Discrete point scale: categories at evenly spaced positions.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalePoint {
    /// Category values in domain order.
    pub values: Vec<FieldValue>,
    /// Outer padding as a fraction of the step.
    pub padding: f64,
    /// Resolved field label.
    pub field: Option<Arc<str>>,
}

impl ScalePoint {
    /// Distance between consecutive points, in normalized units.
    pub fn step(&self) -> f64 {
        #[allow(
            clippy::cast_precision_loss,
            reason = "domain sizes are far below 2^52"
        )]
        let n = self.values.len() as f64;
        let denom = n - 1.0 + 2.0 * self.padding;
        if denom <= 0.0 {
            return 0.0;
        }
        1.0 / denom
    }

    /// Position of the point at a domain index.
    pub fn position(&self, index: usize) -> f64 {
        if self.values.len() == 1 {
            return 0.5;
        }
        #[allow(
            clippy::cast_precision_loss,
            reason = "domain sizes are far below 2^52"
        )]
        let i = index as f64;
        (self.padding + i) * self.step()
    }

    fn index_of(&self, value: &FieldValue) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }

    fn map(&self, value: &FieldValue) -> Option<f64> {
        self.index_of(value).map(|i| self.position(i))
    }

    fn invert(&self, position: f64) -> FieldValue {
        nearest_category(&self.values, position, |i| self.position(i))
    }
}

fn nearest_category(
    values: &[FieldValue],
    position: f64,
    center: impl Fn(usize) -> f64,
) -> FieldValue {
    let mut best: Option<(f64, usize)> = None;
    for i in 0..values.len() {
        let d = (center(i) - position).abs();
        if best.is_none_or(|(best_d, _)| d < best_d) {
            best = Some((d, i));
        }
    }
    match best {
        Some((_, i)) => values[i].clone(),
        None => FieldValue::Null,
    }
}

/// Rounds a domain outward to multiples of the nice tick step.
fn nice_domain(domain: [f64; 2], count: usize) -> [f64; 2] {
    let span = domain[1] - domain[0];
    if span <= 0.0 || !span.is_finite() {
        return domain;
    }
    let step = nice_step(span, count);
    [
        (domain[0] / step).floor() * step,
        (domain[1] / step).ceil() * step,
    ]
}

/// Tick values within a domain at a nice step, plus the step for formatting.
fn nice_ticks(domain: [f64; 2], count: usize) -> (Vec<f64>, f64) {
    let span = domain[1] - domain[0];
    if span <= 0.0 || !span.is_finite() {
        return (Vec::from([domain[0]]), 1.0);
    }
    let step = nice_step(span, count.max(1));
    let start = (domain[0] / step).ceil();
    let end = (domain[1] / step).floor();
    let mut out = Vec::new();
    let mut tick = start;
    // Hard cap guards against degenerate steps from float underflow.
    while tick <= end && out.len() < 10_000 {
        out.push(tick * step);
        tick += 1.0;
    }
    (out, step)
}

/// The largest "nice" step (1/2/5 times a power of ten) producing at most
/// about `count` intervals over `span`.
fn nice_step(span: f64, count: usize) -> f64 {
    #[allow(
        clippy::cast_precision_loss,
        reason = "tick counts are far below 2^52"
    )]
    let raw = span / count.max(1) as f64;
    let magnitude = 10_f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let factor = if residual >= 7.5 {
        10.0
    } else if residual >= 3.5 {
        5.0
    } else if residual >= 1.5 {
        2.0
    } else {
        1.0
    };
    factor * magnitude
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    fn months() -> Vec<FieldValue> {
        ["Jan.", "Feb.", "Mar.", "Apr."]
            .iter()
            .map(|m| FieldValue::from(*m))
            .collect()
    }

    #[test]
    fn linear_maps_and_inverts_across_the_domain() {
        let scale = Scale::Linear(ScaleLinear {
            domain: [10.0, 30.0],
            field: None,
        });
        assert_eq!(scale.map(&FieldValue::Number(10.0)), Some(0.0));
        assert_eq!(scale.map(&FieldValue::Number(20.0)), Some(0.5));
        assert_eq!(scale.map(&FieldValue::Number(30.0)), Some(1.0));
        assert_eq!(scale.map(&FieldValue::from("Jan.")), None);
        assert_eq!(scale.invert(0.25), FieldValue::Number(15.0));
    }

    #[test]
    fn degenerate_linear_domain_maps_to_zero() {
        let scale = Scale::Linear(ScaleLinear {
            domain: [5.0, 5.0],
            field: None,
        });
        assert_eq!(scale.map(&FieldValue::Number(5.0)), Some(0.0));
    }

    #[test]
    fn point_scale_positions_are_monotonic() {
        let scale = ScalePoint {
            values: months(),
            padding: 0.5,
            field: None,
        };
        let mut last = f64::NEG_INFINITY;
        for i in 0..4 {
            let x = scale.position(i);
            assert!(x > last);
            assert!((0.0..=1.0).contains(&x));
            last = x;
        }
    }

    #[test]
    fn band_positions_leave_padding_at_both_ends() {
        let scale = ScaleBand {
            values: months(),
            padding: 0.1,
            field: None,
        };
        let first = scale.position(0);
        let last_end = scale.position(3) + scale.band_width();
        assert!(first > 0.0);
        assert!(last_end < 1.0);
        assert!((first - (1.0 - last_end)).abs() < 1e-9);
    }

    #[test]
    fn discrete_invert_returns_the_nearest_category() {
        let scale = Scale::Point(ScalePoint {
            values: months(),
            padding: 0.5,
            field: None,
        });
        let feb = scale.map(&FieldValue::from("Feb.")).expect("in domain");
        assert_eq!(scale.invert(feb + 0.01), FieldValue::from("Feb."));
        assert_eq!(scale.invert(0.0), FieldValue::from("Jan."));
        assert_eq!(scale.invert(1.0), FieldValue::from("Apr."));
    }

    #[test]
    fn inference_prefers_linear_for_numbers_and_discrete_for_strings() {
        let numbers = [FieldValue::Number(3.0), FieldValue::Null, 7.0.into()];
        let inferred =
            ScaleDescriptor::infer(&numbers, &ScaleConfig::default(), ScaleKind::Point, false);
        let ScaleDescriptor::Linear { min, max, .. } = inferred else {
            panic!("expected a linear descriptor");
        };
        assert_eq!((min, max), (3.0, 7.0));

        let mixed = [FieldValue::from("a"), FieldValue::Number(1.0)];
        let inferred =
            ScaleDescriptor::infer(&mixed, &ScaleConfig::default(), ScaleKind::Band, false);
        assert!(matches!(inferred, ScaleDescriptor::Band { .. }));
    }

    #[test]
    fn zero_extends_inferred_domains_only() {
        let values = [FieldValue::Number(5.0), FieldValue::Number(9.0)];
        let inferred =
            ScaleDescriptor::infer(&values, &ScaleConfig::default(), ScaleKind::Band, true);
        let ScaleDescriptor::Linear { min, max, .. } = inferred else {
            panic!("expected a linear descriptor");
        };
        assert_eq!((min, max), (0.0, 9.0));

        let config = ScaleConfig::default().with_domain([2.0.into(), 9.0.into()]);
        let inferred = ScaleDescriptor::infer(&values, &config, ScaleKind::Band, true);
        let ScaleDescriptor::Linear { min, .. } = inferred else {
            panic!("expected a linear descriptor");
        };
        assert_eq!(min, 2.0);
    }

    #[test]
    fn merging_unions_linear_extents_and_category_lists() {
        let mut linear = ScaleDescriptor::Linear {
            min: 2.0,
            max: 5.0,
            nice: false,
            zero: false,
        };
        linear.merge(&ScaleDescriptor::Linear {
            min: -1.0,
            max: 4.0,
            nice: true,
            zero: false,
        });
        assert_eq!(
            linear,
            ScaleDescriptor::Linear {
                min: -1.0,
                max: 5.0,
                nice: true,
                zero: false,
            }
        );

        let mut band = ScaleDescriptor::Band {
            values: Vec::from([FieldValue::from("a")]),
            padding: 0.1,
        };
        band.merge(&ScaleDescriptor::Point {
            values: Vec::from([FieldValue::from("b"), FieldValue::from("a")]),
            padding: 0.5,
        });
        let ScaleDescriptor::Band { values, .. } = band else {
            panic!("expected the band descriptor to keep its kind");
        };
        assert_eq!(values, [FieldValue::from("a"), FieldValue::from("b")]);
    }

    #[test]
    fn nice_ticks_cover_the_domain_with_round_steps() {
        let (ticks, step) = nice_ticks([0.0, 30.0], 5);
        assert_eq!(step, 5.0);
        assert_eq!(ticks, [0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0]);

        let (ticks, _) = nice_ticks([13.0, 18.5], 5);
        assert!(ticks.iter().all(|t| (13.0..=18.5).contains(t)));
    }

    #[test]
    fn linear_ticks_carry_step_formatted_labels() {
        let scale = ScaleLinear {
            domain: [0.0, 1.0],
            field: None,
        };
        let ticks = scale.ticks(4);
        assert!(!ticks.is_empty());
        assert_eq!(ticks[0].label, "0.0");
        assert_eq!(ticks.last().expect("nonempty").label, "1.0");
    }
}
