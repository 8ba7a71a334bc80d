// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal SVG dump of a [`SceneTree`] for `trellis_demo`.

use kurbo::{Affine, Point, Rect};
use peniko::Color;
use trellis_scene::{Geometry, NodeId, Paint, SceneTree, TextAnchor};

/// Serializes the visible scene content in paint order.
pub(crate) fn scene_to_svg(scene: &SceneTree, view_box: Rect) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}" width="{}" height="{}">"#,
        view_box.x0,
        view_box.y0,
        view_box.width(),
        view_box.height(),
        view_box.width(),
        view_box.height()
    ));
    out.push('\n');
    write_children(scene, scene.root(), &mut out);
    out.push_str("</svg>\n");
    out
}

fn write_children(scene: &SceneTree, id: NodeId, out: &mut String) {
    let Some(node) = scene.get(id) else {
        return;
    };
    for child in node.children() {
        write_node(scene, *child, out);
    }
}

fn write_node(scene: &SceneTree, id: NodeId, out: &mut String) {
    let Some(node) = scene.get(id) else {
        return;
    };
    // Hidden subtrees are skipped entirely, mirroring the tree's semantics.
    if !node.visible {
        return;
    }
    let wrapped = node.transform != Affine::IDENTITY;
    if wrapped {
        let c = node.transform.as_coeffs();
        out.push_str(&format!(
            r#"<g transform="matrix({} {} {} {} {} {})">"#,
            c[0], c[1], c[2], c[3], c[4], c[5]
        ));
        out.push('\n');
    }
    if let Some(shape) = node.shape() {
        write_shape(out, &shape.geometry, &shape.paint);
    }
    write_children(scene, id, out);
    if wrapped {
        out.push_str("</g>\n");
    }
}

fn write_shape(out: &mut String, geometry: &Geometry, paint: &Paint) {
    match geometry {
        Geometry::Polyline(points) => {
            out.push_str(&format!(r#"<polyline points="{}""#, point_list(points)));
            write_paint(out, paint);
            out.push_str("/>\n");
        }
        Geometry::Polygon(points) => {
            out.push_str(&format!(r#"<polygon points="{}""#, point_list(points)));
            write_paint(out, paint);
            out.push_str("/>\n");
        }
        Geometry::Circle { center, radius } => {
            out.push_str(&format!(
                r#"<circle cx="{}" cy="{}" r="{radius}""#,
                center.x, center.y
            ));
            write_paint(out, paint);
            out.push_str("/>\n");
        }
        Geometry::Text {
            pos,
            text,
            size,
            anchor,
            angle,
        } => {
            out.push_str(&format!(
                r#"<text x="{}" y="{}" font-size="{size}" dominant-baseline="middle""#,
                pos.x, pos.y
            ));
            out.push_str(match anchor {
                TextAnchor::Start => r#" text-anchor="start""#,
                TextAnchor::Middle => r#" text-anchor="middle""#,
                TextAnchor::End => r#" text-anchor="end""#,
            });
            if *angle != 0.0 {
                out.push_str(&format!(
                    r#" transform="rotate({angle} {} {})""#,
                    pos.x, pos.y
                ));
            }
            write_paint(out, paint);
            out.push('>');
            out.push_str(&escape_xml(text));
            out.push_str("</text>\n");
        }
    }
}

fn point_list(points: &[Point]) -> String {
    let mut list = String::new();
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            list.push(' ');
        }
        list.push_str(&format!("{},{}", p.x, p.y));
    }
    list
}

fn write_paint(out: &mut String, paint: &Paint) {
    out.push_str(&format!(r#" fill="{}""#, css_color(paint.fill)));
    if let Some(stroke) = paint.stroke {
        out.push_str(&format!(
            r#" stroke="{}" stroke-width="{}""#,
            css_color(Some(stroke)),
            paint.stroke_width
        ));
    }
    if paint.opacity < 1.0 {
        out.push_str(&format!(r#" opacity="{}""#, paint.opacity));
    }
}

fn css_color(color: Option<Color>) -> String {
    match color {
        Some(color) => {
            let rgba = color.to_rgba8();
            format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
        }
        None => String::from("none"),
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
