// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end scenarios exercising the full path from specification to
//! scene, pointer dispatch and interaction output.

extern crate alloc;
extern crate std;

use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::Point;
use trellis_scene::Key;

use crate::chart::Chart;
use crate::coord::CoordDirective;
use crate::interaction::PointerEvent;
use crate::mark::{CHANNEL_COLOR, CHANNEL_X, CHANNEL_Y};
use crate::spec::{InteractionSpec, MarkSpec, SpecNode};
use crate::value::{FieldValue, Record};

fn two_city_weather() -> Vec<Record> {
    let months = ["Jan.", "Feb.", "Mar.", "Apr.", "May.", "Jun.", "Jul.", "Aug."];
    let mut rows = Vec::new();
    for (city, values) in [
        ("London", [4.0, 5.0, 8.0, 11.0, 15.0, 17.0, 17.0, 16.0]),
        ("Berlin", [1.0, 2.0, 6.0, 10.0, 14.0, 17.0, 18.0, 18.0]),
    ] {
        for (month, value) in months.iter().zip(values) {
            rows.push(
                Record::new()
                    .with("month", *month)
                    .with("temperature", value)
                    .with("city", city),
            );
        }
    }
    rows
}

fn line_mark() -> MarkSpec {
    MarkSpec::new("line")
        .with_encode(CHANNEL_X, "month")
        .with_encode(CHANNEL_Y, "temperature")
        .with_encode(CHANNEL_COLOR, "city")
        .with_encode("tooltip", "temperature")
}

/// Pixel position of a categorical x value in a rendered view.
fn category_pixel(chart: &Chart, key: &str, value: &str) -> Point {
    let view = chart.view(key).unwrap();
    let u = view
        .scale(CHANNEL_X)
        .unwrap()
        .map(&FieldValue::from(value))
        .unwrap();
    view.coord.map(u, 0.5)
}

#[test]
fn two_city_line_chart_answers_a_july_tooltip() {
    let spec = SpecNode::view()
        .with_data(two_city_weather())
        .with_size(640.0, 400.0)
        .with_mark(line_mark())
        .with_interaction(InteractionSpec::new("tooltip").with_param("shared", true));
    let mut chart = Chart::new(spec);
    chart.render().unwrap();

    // Slightly off the exact July pixel still snaps to July.
    let mut p = category_pixel(&chart, "view-0", "Jul.");
    p.x += 3.0;
    chart.pointer(PointerEvent::Move(p)).unwrap();

    let data = chart.tooltip("view-0").unwrap();
    assert_eq!(data.title, "Jul.");
    assert_eq!(data.items.len(), 2);
    let values: Vec<&str> = data.items.iter().map(|i| i.value.as_str()).collect();
    assert_eq!(values, ["17", "18"]);
    assert_ne!(data.items[0].color, data.items[1].color);

    // The crosshair and one marker per item sit in the transient layer.
    let scene = chart.scene();
    let view_group = scene.child_by_key(scene.root(), &Key::name("view-0")).unwrap();
    let transient = scene.child_by_key(view_group, &Key::name("transient")).unwrap();
    let crosshairs: Vec<_> = scene.children_of_class(transient, "crosshair").collect();
    assert_eq!(crosshairs.len(), 1);
    assert!(scene.get(crosshairs[0]).unwrap().visible);
    let markers: Vec<_> = scene.children_of_class(transient, "marker").collect();
    assert_eq!(markers.len(), 2);

    // Leaving hides the affordances without removing them.
    chart.pointer(PointerEvent::Leave).unwrap();
    assert!(chart.tooltip("view-0").is_none());
    assert!(!scene_visible(&chart, crosshairs[0]));
    assert_eq!(
        chart
            .scene()
            .children_of_class(transient, "marker")
            .count(),
        2
    );
}

fn scene_visible(chart: &Chart, id: trellis_scene::NodeId) -> bool {
    chart.scene().get(id).is_some_and(|n| n.visible)
}

#[test]
fn facets_expand_into_side_by_side_framed_views() {
    let spec = SpecNode::new("facet")
        .with_data(two_city_weather())
        .with_size(800.0, 300.0)
        .with_param("by", "city")
        .with_mark(
            MarkSpec::new("point")
                .with_encode(CHANNEL_X, "month")
                .with_encode(CHANNEL_Y, "temperature"),
        );
    let mut chart = Chart::new(spec.with_key("facet"));
    let stats = chart.render().unwrap();
    assert_eq!(stats.views, 2);

    let london = chart.view("facet/London").unwrap();
    let berlin = chart.view("facet/Berlin").unwrap();
    assert_eq!(london.marks[0].state.visual.len(), 8);
    assert_eq!(berlin.marks[0].state.visual.len(), 8);
    assert!(berlin.layout.view.x0 >= london.layout.view.x1);
    assert!(london.frame && berlin.frame);

    let scene = chart.scene();
    assert_eq!(scene.children_of_class(scene.root(), "view").count(), 2);
}

#[test]
fn pointer_routing_reaches_only_the_view_under_the_cursor() {
    let spec = SpecNode::new("facet")
        .with_data(two_city_weather())
        .with_size(800.0, 300.0)
        .with_param("by", "city")
        .with_key("facet")
        .with_mark(line_mark())
        .with_interaction(InteractionSpec::new("tooltip").with_param("shared", true));
    let mut chart = Chart::new(spec);
    chart.render().unwrap();

    let p = category_pixel(&chart, "facet/Berlin", "Mar.");
    chart.pointer(PointerEvent::Move(p)).unwrap();
    assert!(chart.tooltip("facet/London").is_none());
    let data = chart.tooltip("facet/Berlin").unwrap();
    assert_eq!(data.title, "Mar.");
    assert_eq!(data.items.len(), 1);
    assert_eq!(data.items[0].value, "6");
}

#[test]
fn bar_selection_widens_across_a_shared_attribute() {
    let mut rows = Vec::new();
    for (month, london, berlin) in [("Jan.", 4.0, 1.0), ("Feb.", 5.0, 2.0), ("Mar.", 8.0, 6.0)] {
        rows.push(
            Record::new()
                .with("month", month)
                .with("sold", london)
                .with("city", "London"),
        );
        rows.push(
            Record::new()
                .with("month", month)
                .with("sold", berlin)
                .with("city", "Berlin"),
        );
    }
    let spec = SpecNode::view()
        .with_data(rows)
        .with_size(480.0, 320.0)
        .with_mark(
            MarkSpec::new("interval")
                .with_encode(CHANNEL_X, "month")
                .with_encode(CHANNEL_Y, "sold")
                .with_encode(CHANNEL_COLOR, "city"),
        )
        .with_interaction(InteractionSpec::new("select").with_param("filter_by", "city"));
    let mut chart = Chart::new(spec);
    chart.render().unwrap();

    // Quad centers carry the element; hit the first London bar.
    let view = chart.view("view-0").unwrap();
    let row = &view.marks[0].state.visual[0];
    assert_eq!(row.value_by_field("city"), Some(&FieldValue::from("London")));
    let center = Point::new(
        0.5 * (row.points[0].x + row.points[2].x),
        0.5 * (row.points[0].y + row.points[2].y),
    );
    chart.pointer(PointerEvent::Down(center)).unwrap();
    assert_eq!(chart.selection("view-0").len(), 3);

    // A miss clears it.
    chart
        .pointer(PointerEvent::Down(Point::new(1.0, 1.0)))
        .unwrap();
    assert!(chart.selection("view-0").is_empty());
}

#[test]
fn transposed_views_measure_tooltip_distance_along_y() {
    let spec = SpecNode::view()
        .with_data(two_city_weather())
        .with_size(400.0, 500.0)
        .with_coordinate(CoordDirective::Transpose)
        .with_mark(line_mark())
        .with_interaction(InteractionSpec::new("tooltip").with_param("shared", true));
    let mut chart = Chart::new(spec);
    chart.render().unwrap();

    // Under a transposed frame the category runs along pixel y; a pointer
    // far away in x but close in y still snaps to the category.
    let view = chart.view("view-0").unwrap();
    assert!(view.coord.is_transpose());
    let feb = category_pixel(&chart, "view-0", "Feb.");
    let probe = Point::new(view.layout.plot.center().x, feb.y + 2.0);
    chart.pointer(PointerEvent::Move(probe)).unwrap();

    let data = chart.tooltip("view-0").unwrap();
    assert_eq!(data.title, "Feb.");
    assert_eq!(data.items.len(), 2);
}

#[test]
fn layered_marks_share_scales_and_reconcile_together() {
    let point_layer = MarkSpec::new("point")
        .with_encode(CHANNEL_X, "month")
        .with_encode(CHANNEL_Y, "temperature")
        .with_encode(CHANNEL_COLOR, "city");
    let spec = SpecNode::view()
        .with_data(two_city_weather())
        .with_size(640.0, 400.0)
        .with_mark(line_mark())
        .with_mark(point_layer);
    let mut chart = Chart::new(spec);
    let first = chart.render().unwrap();

    let view = chart.view("view-0").unwrap();
    assert_eq!(view.marks.len(), 2);
    // One scale instance per channel, shared by both layers.
    assert_eq!(
        view.scales
            .iter()
            .filter(|(name, _)| &**name == CHANNEL_X)
            .count(),
        1
    );
    // 2 polylines + 16 symbols.
    let elements: usize = view.marks.iter().map(|m| m.state.visual.len()).sum();
    assert_eq!(elements, 18);

    let second = chart.render().unwrap();
    assert_eq!(second.enters, 0);
    assert_eq!(second.exits, 0);
    assert_eq!(second.updates, first.enters);
}
