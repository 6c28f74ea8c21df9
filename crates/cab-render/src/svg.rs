//! SVG emission for a sampled `Frame`.
//!
//! Output has two layers, links under nodes. Each node is a group
//! translated to its center holding a rounded box and its label lines.
//! Visible detail panels are painted last so they sit above every box.

use crate::diff::{Frame, NodeFrame, Phase};
use crate::overlay::DetailOverlay;
use cab_core::ActionTree;
use std::fmt::Write as _;

/// Colours and type settings.
#[derive(Debug, Clone, Copy)]
pub struct SvgTheme {
    pub link_stroke: &'static str,
    pub link_opacity: f64,
    pub link_width: f64,
    pub node_stroke: &'static str,
    pub text_fill: &'static str,
    pub font_family: &'static str,
    pub font_size: f64,
    pub line_height: f64,
    pub corner_radius: f64,
    pub panel_fill: &'static str,
    pub panel_stroke: &'static str,
}

impl Default for SvgTheme {
    fn default() -> Self {
        Self::light()
    }
}

impl SvgTheme {
    pub fn light() -> Self {
        Self {
            link_stroke: "gray",
            link_opacity: 0.4,
            link_width: 1.5,
            node_stroke: "steelblue",
            text_fill: "black",
            font_family: "sans-serif",
            font_size: 10.0,
            line_height: 11.0,
            corner_radius: 5.0,
            panel_fill: "white",
            panel_stroke: "gray",
        }
    }
}

/// Escape text for element content and attribute values.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Render a frame. Pass the overlay to include revealed detail panels.
pub fn render_svg(
    frame: &Frame,
    tree: &ActionTree,
    overlay: Option<&DetailOverlay>,
    theme: &SvgTheme,
) -> String {
    let vb = frame.view_box;
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"{x} {y} {w} {h}\" font-family=\"{font}\" font-size=\"{size}\">",
        x = vb.x0,
        y = vb.y0,
        w = vb.width(),
        h = vb.height(),
        font = theme.font_family,
        size = theme.font_size,
    );

    // ─── Links ───
    let _ = writeln!(
        svg,
        "<g class=\"links\" fill=\"none\" stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{}\">",
        theme.link_stroke, theme.link_opacity, theme.link_width
    );
    for link in &frame.links {
        let _ = writeln!(
            svg,
            "  <path data-node=\"{}\" d=\"{}\" />",
            link.id.order(),
            link.path.to_svg()
        );
    }
    svg.push_str("</g>\n");

    // ─── Nodes ───
    svg.push_str("<g class=\"nodes\">\n");
    for node in &frame.nodes {
        render_node(&mut svg, node, frame, tree, theme);
    }
    svg.push_str("</g>\n");

    // ─── Detail panels ───
    if let Some(overlay) = overlay {
        let config = overlay.config();
        for panel in overlay.visible_panels() {
            let Some(node) = frame.node(panel.node) else {
                continue;
            };
            let left = node.center.x + config.text_x - 5.0;
            let first = config.line_offsets.first().copied().unwrap_or_default();
            let last = config
                .line_offsets
                .get(panel.lines.len().saturating_sub(1))
                .copied()
                .unwrap_or(first);
            let top = node.center.y + first - theme.font_size - 2.0;
            let height = last - first + theme.font_size + 8.0;
            let _ = writeln!(
                svg,
                "<g class=\"detail\" data-node=\"{}\">\n  <rect x=\"{left}\" y=\"{top}\" width=\"{}\" height=\"{height}\" rx=\"3\" fill=\"{}\" stroke=\"{}\" />",
                panel.node.order(),
                config.panel_width,
                theme.panel_fill,
                theme.panel_stroke,
            );
            for (line, dy) in panel.lines.iter().zip(&config.line_offsets) {
                let _ = writeln!(
                    svg,
                    "  <text x=\"{}\" y=\"{}\" fill=\"{}\">{}</text>",
                    node.center.x + config.text_x,
                    node.center.y + dy,
                    theme.text_fill,
                    xml_escape(line)
                );
            }
            svg.push_str("</g>\n");
        }
    }

    svg.push_str("</svg>");
    svg
}

fn render_node(out: &mut String, node: &NodeFrame, frame: &Frame, tree: &ActionTree, theme: &SvgTheme) {
    let kind = &tree.node(node.idx).kind;
    let (w, h) = (frame.box_size.width, frame.box_size.height);
    let class = match node.phase {
        Phase::Entering => "node entering",
        Phase::Updating => "node",
        Phase::Exiting => "node exiting",
    };
    let cursor = if kind.is_drillable() {
        " cursor=\"pointer\""
    } else {
        ""
    };
    let _ = writeln!(
        out,
        "<g class=\"{class}\" data-node=\"{}\" transform=\"translate({},{})\" opacity=\"{}\"{cursor}>",
        node.id.order(),
        node.center.x,
        node.center.y,
        node.opacity
    );
    let _ = writeln!(
        out,
        "  <rect x=\"{}\" y=\"{}\" width=\"{w}\" height=\"{h}\" rx=\"{r}\" ry=\"{r}\" fill=\"{}\" stroke=\"{}\" />",
        -w / 2.0,
        -h / 2.0,
        kind.fill(),
        theme.node_stroke,
        r = theme.corner_radius,
    );

    let lines = kind.label_lines();
    let n = lines.len() as f64;
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        // Center the block of lines on the box, baseline nudged down by a third of the font.
        let dy = (i as f64 - (n - 1.0) / 2.0) * theme.line_height + theme.font_size / 3.0;
        let _ = writeln!(
            out,
            "  <text y=\"{dy}\" text-anchor=\"middle\" fill=\"{}\">{}</text>",
            theme.text_fill,
            xml_escape(line)
        );
    }
    out.push_str("</g>\n");
}
