// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interactive chart demo for `trellis_runtime`.
//!
//! Renders a two-city temperature line chart, sweeps a simulated pointer
//! across it printing the resolved tooltips, and dumps the final scene
//! (crosshair and markers included) as an SVG file.

mod svg;

use kurbo::Point;
use trellis_runtime::{
    CHANNEL_COLOR, CHANNEL_X, CHANNEL_Y, Chart, FieldValue, InteractionSpec, MarkSpec,
    PointerEvent, Record, SpecNode,
};

const MONTHS: [&str; 8] = [
    "Jan.", "Feb.", "Mar.", "Apr.", "May.", "Jun.", "Jul.", "Aug.",
];

fn weather() -> Vec<Record> {
    let mut rows = Vec::new();
    for (city, values) in [
        ("London", [4.0, 5.0, 8.0, 11.0, 15.0, 17.0, 17.0, 16.0]),
        ("Berlin", [1.0, 2.0, 6.0, 10.0, 14.0, 17.0, 18.0, 18.0]),
    ] {
        for (month, value) in MONTHS.iter().zip(values) {
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

fn main() {
    let spec = SpecNode::view()
        .with_data(weather())
        .with_size(640.0, 400.0)
        .with_mark(
            MarkSpec::new("line")
                .with_encode(CHANNEL_X, "month")
                .with_encode(CHANNEL_Y, "temperature")
                .with_encode(CHANNEL_COLOR, "city")
                .with_encode("tooltip", "temperature"),
        )
        .with_mark(
            MarkSpec::new("point")
                .with_encode(CHANNEL_X, "month")
                .with_encode(CHANNEL_Y, "temperature")
                .with_encode(CHANNEL_COLOR, "city"),
        )
        .with_interaction(InteractionSpec::new("tooltip").with_param("shared", true));

    let mut chart = Chart::new(spec);
    let stats = chart.render().expect("initial render");
    println!(
        "rendered {} view(s): {} nodes entered",
        stats.views, stats.enters
    );

    // Sweep the pointer across the month positions and print what the
    // tooltip resolver answers at each stop.
    let view = chart.view("view-0").expect("rendered view").clone();
    for month in MONTHS {
        let u = view
            .scale(CHANNEL_X)
            .and_then(|scale| scale.map(&FieldValue::from(month)))
            .expect("month on the x scale");
        let p = view.coord.map(u, 0.5);
        // Probe slightly off-center to show snapping.
        chart
            .pointer(PointerEvent::Move(Point::new(p.x + 4.0, p.y)))
            .expect("dispatch move");
        match chart.tooltip("view-0") {
            Some(data) => {
                let items: Vec<String> = data
                    .items
                    .iter()
                    .map(|item| format!("{}={}", item.name, item.value))
                    .collect();
                println!("{:<5} -> {}", data.title, items.join("  "));
            }
            None => println!("{month:<5} -> (no tooltip)"),
        }
    }

    let svg = svg::scene_to_svg(chart.scene(), view.layout.view);
    std::fs::write("trellis_demo.svg", &svg).expect("write trellis_demo.svg");
    println!("wrote trellis_demo.svg ({} bytes)", svg.len());

    // Leaving clears the tooltip and hides the crosshair and markers.
    chart.pointer(PointerEvent::Leave).expect("dispatch leave");
    assert!(chart.tooltip("view-0").is_none());
    println!("pointer left: tooltip cleared");
}
