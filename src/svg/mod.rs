//! SVG document -> line-list geometry.
//!
//! This is the viewer's geometry provider. It reads a markup document and produces:
//! - a `Viewbox` (from the root `viewBox`, or the caller's fallback when absent)
//! - a `Geometry`: line segments with per-vertex colors
//!
//! Supported elements:
//! - `line`, `polyline`, `polygon`, `rect` (outline only)
//! - `path`: straight segments are emitted as-is; curves and arcs are flattened into
//!   segments with lyon at `ParseOptions::tolerance`
//!
//! Strokes only: fills, gradients, transforms and styling beyond `stroke` /
//! `stroke-opacity` are ignored. Both are inherited from ancestor elements such as
//! `<g>`. Unknown elements are skipped.

use std::path::Path as FsPath;
use std::str::FromStr;

use lyon::math::point;
use lyon::path::iterator::PathIterator;
use lyon::path::{Path, PathEvent};
use svgtypes::{SimplePathSegment, SimplifyingPathParser};

use crate::scene::{Document, Geometry, Rgba, Viewbox};

/// Errors produced while turning a file into geometry.
#[derive(thiserror::Error, Debug)]
pub enum SvgError {
    #[error("the input must be a .svg file (got {0:?})")]
    WrongFileType(String),

    #[error("malformed markup: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("root element is <{0}>, expected <svg>")]
    NotSvg(String),

    #[error("invalid viewBox {0:?}")]
    InvalidViewbox(String),

    #[error("invalid {attribute} on <{element}>: {value:?}")]
    InvalidAttribute {
        element: String,
        attribute: &'static str,
        value: String,
    },

    #[error("invalid path data: {0}")]
    PathData(String),
}

#[derive(Debug, Copy, Clone)]
pub struct ParseOptions {
    /// Color used when an element has no `stroke`.
    pub default_color: Rgba,
    /// Curve flattening tolerance in document units.
    pub tolerance: f32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_color: Rgba::BLACK,
            tolerance: 0.25,
        }
    }
}

/// Accept only `.svg` files (case-insensitive).
pub fn check_extension(path: &FsPath) -> Result<(), SvgError> {
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    if is_svg {
        Ok(())
    } else {
        Err(SvgError::WrongFileType(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ))
    }
}

/// Parse a whole document.
///
/// `fallback` is used as the viewbox only when the root has no `viewBox` attribute; a
/// present but unusable `viewBox` is an error.
pub fn parse_document(
    text: &str,
    fallback: Viewbox,
    opts: &ParseOptions,
) -> Result<Document, SvgError> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();

    if root.tag_name().name() != "svg" {
        return Err(SvgError::NotSvg(root.tag_name().name().to_string()));
    }

    let viewbox = match root.attribute("viewBox") {
        Some(raw) => parse_viewbox(raw)?,
        None => fallback,
    };

    let mut geometry = Geometry::new();
    for node in root.descendants().filter(|n| n.is_element()) {
        append_element(&mut geometry, node, opts)?;
    }

    Ok(Document { viewbox, geometry })
}

/// `"min-x min-y width height"`, separated by whitespace and/or commas.
pub fn parse_viewbox(raw: &str) -> Result<Viewbox, SvgError> {
    let nums = parse_number_list(raw).ok_or_else(|| SvgError::InvalidViewbox(raw.to_string()))?;

    let [min_x, min_y, width, height] = nums[..] else {
        return Err(SvgError::InvalidViewbox(raw.to_string()));
    };
    if !(width > 0.0 && height > 0.0) {
        return Err(SvgError::InvalidViewbox(raw.to_string()));
    }

    Ok(Viewbox::new(min_x, min_y, width, height))
}

fn parse_number_list(raw: &str) -> Option<Vec<f32>> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect()
}

fn append_element(
    out: &mut Geometry,
    node: roxmltree::Node<'_, '_>,
    opts: &ParseOptions,
) -> Result<(), SvgError> {
    let name = node.tag_name().name();
    if !matches!(name, "line" | "polyline" | "polygon" | "rect" | "path") {
        return Ok(());
    }

    let Some(color) = stroke_color(node, opts.default_color) else {
        // stroke="none"
        return Ok(());
    };

    match name {
        "line" => {
            let a = [num_attr(node, "x1")?, num_attr(node, "y1")?];
            let b = [num_attr(node, "x2")?, num_attr(node, "y2")?];
            out.push_segment(a, b, color);
        }
        "polyline" | "polygon" => {
            let raw = node.attribute("points").unwrap_or_default();
            let nums = parse_number_list(raw)
                .filter(|n| n.len() % 2 == 0)
                .ok_or_else(|| invalid_attr(node, "points", raw))?;
            let points: Vec<[f32; 2]> = nums.chunks_exact(2).map(|p| [p[0], p[1]]).collect();
            push_polyline(out, &points, name == "polygon", color);
        }
        "rect" => {
            let x = num_attr(node, "x")?;
            let y = num_attr(node, "y")?;
            let w = num_attr(node, "width")?;
            let h = num_attr(node, "height")?;
            if w > 0.0 && h > 0.0 {
                let corners = [[x, y], [x + w, y], [x + w, y + h], [x, y + h]];
                push_polyline(out, &corners, true, color);
            }
        }
        "path" => {
            let d = node.attribute("d").unwrap_or_default();
            let path = build_path(d)?;
            flatten_into(out, &path, opts.tolerance, color);
        }
        _ => {}
    }

    Ok(())
}

fn push_polyline(out: &mut Geometry, points: &[[f32; 2]], closed: bool, color: Rgba) {
    for pair in points.windows(2) {
        out.push_segment(pair[0], pair[1], color);
    }
    if closed && points.len() > 2 {
        out.push_segment(points[points.len() - 1], points[0], color);
    }
}

/// Numeric attribute; absent means `0`, like SVG's initial values for these attributes.
fn num_attr(node: roxmltree::Node<'_, '_>, attribute: &'static str) -> Result<f32, SvgError> {
    let Some(raw) = node.attribute(attribute) else {
        return Ok(0.0);
    };
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix("px").unwrap_or(trimmed);
    trimmed
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid_attr(node, attribute, raw))
}

fn invalid_attr(node: roxmltree::Node<'_, '_>, attribute: &'static str, value: &str) -> SvgError {
    SvgError::InvalidAttribute {
        element: node.tag_name().name().to_string(),
        attribute,
        value: value.to_string(),
    }
}

/// Presentation property set on `node` itself: inline `style` wins over the attribute.
fn own_property<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    let from_style = node.attribute("style").and_then(|style| {
        style.split(';').find_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            (k.trim() == name).then(|| v.trim())
        })
    });
    from_style.or_else(|| node.attribute(name).map(str::trim))
}

/// Inherited presentation property: the nearest element (starting at `node`) that sets
/// it to something other than `inherit`.
fn property<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.ancestors()
        .filter(|n| n.is_element())
        .find_map(|n| own_property(n, name).filter(|v| *v != "inherit"))
}

/// Resolve the stroke color of an element.
///
/// Returns `None` for `stroke="none"`. Missing or unparsable values fall back to
/// `default`.
fn stroke_color(node: roxmltree::Node<'_, '_>, default: Rgba) -> Option<Rgba> {
    let mut color = match property(node, "stroke") {
        Some("none") => return None,
        Some(raw) => svgtypes::Color::from_str(raw)
            .map(|c| Rgba::from_rgba8(c.red, c.green, c.blue, c.alpha))
            .unwrap_or(default),
        None => default,
    };

    if let Some(opacity) = property(node, "stroke-opacity").and_then(|v| v.parse::<f32>().ok()) {
        color.a *= opacity.clamp(0.0, 1.0);
    }
    Some(color)
}

/// Build a lyon path from SVG path data.
///
/// `SimplifyingPathParser` resolves relative, horizontal/vertical, smooth and arc
/// commands into absolute move/line/quadratic/cubic segments.
fn build_path(d: &str) -> Result<Path, SvgError> {
    let mut builder = Path::builder();
    let mut open = false;
    let mut first = point(0.0, 0.0);

    for segment in SimplifyingPathParser::from(d) {
        let segment = segment.map_err(|e| SvgError::PathData(e.to_string()))?;
        match segment {
            SimplePathSegment::MoveTo { x, y } => {
                if open {
                    builder.end(false);
                }
                first = point(x as f32, y as f32);
                builder.begin(first);
                open = true;
            }
            SimplePathSegment::LineTo { x, y } => {
                if !open {
                    builder.begin(first);
                    open = true;
                }
                builder.line_to(point(x as f32, y as f32));
            }
            SimplePathSegment::Quadratic { x1, y1, x, y } => {
                if !open {
                    builder.begin(first);
                    open = true;
                }
                builder.quadratic_bezier_to(
                    point(x1 as f32, y1 as f32),
                    point(x as f32, y as f32),
                );
            }
            SimplePathSegment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                if !open {
                    builder.begin(first);
                    open = true;
                }
                builder.cubic_bezier_to(
                    point(x1 as f32, y1 as f32),
                    point(x2 as f32, y2 as f32),
                    point(x as f32, y as f32),
                );
            }
            SimplePathSegment::ClosePath => {
                if open {
                    builder.close();
                    open = false;
                }
            }
        }
    }

    if open {
        builder.end(false);
    }
    Ok(builder.build())
}

/// Emit every flattened line of `path` as a segment, including closing edges.
fn flatten_into(out: &mut Geometry, path: &Path, tolerance: f32, color: Rgba) {
    for event in path.iter().flattened(tolerance) {
        match event {
            PathEvent::Line { from, to } => {
                out.push_segment([from.x, from.y], [to.x, to.y], color);
            }
            PathEvent::End {
                last,
                first,
                close: true,
            } if last != first => {
                out.push_segment([last.x, last.y], [first.x, first.y], color);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: Viewbox = Viewbox {
        min_x: 0.0,
        min_y: 0.0,
        width: 640.0,
        height: 480.0,
    };

    fn parse(text: &str) -> Result<Document, SvgError> {
        parse_document(text, FALLBACK, &ParseOptions::default())
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(check_extension(FsPath::new("drawing.svg")).is_ok());
        assert!(check_extension(FsPath::new("/tmp/DRAWING.SVG")).is_ok());
        assert!(matches!(
            check_extension(FsPath::new("drawing.png")),
            Err(SvgError::WrongFileType(name)) if name == "drawing.png"
        ));
        assert!(check_extension(FsPath::new("svg")).is_err());
    }

    #[test]
    fn single_line_with_viewbox() {
        let doc = parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
                 <line x1="0" y1="0" x2="10" y2="10"/>
               </svg>"#,
        )
        .unwrap();

        assert_eq!(doc.viewbox, Viewbox::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(doc.geometry.vertices(), &[[0.0, 0.0], [10.0, 10.0]]);
        assert_eq!(doc.geometry.colors(), &[Rgba::BLACK, Rgba::BLACK]);
    }

    #[test]
    fn missing_viewbox_uses_fallback() {
        let doc = parse(r#"<svg><line x1="1" y1="2" x2="3" y2="4"/></svg>"#).unwrap();
        assert_eq!(doc.viewbox, FALLBACK);
    }

    #[test]
    fn viewbox_accepts_commas() {
        assert_eq!(
            parse_viewbox("-5,10, 200 100").unwrap(),
            Viewbox::new(-5.0, 10.0, 200.0, 100.0)
        );
    }

    #[test]
    fn malformed_viewbox_fails_the_load() {
        for raw in ["0 0 10", "0 0 ten 10", "0 0 0 10", "0 0 10 -1", ""] {
            let text = format!(r#"<svg viewBox="{raw}"><line x2="1"/></svg>"#);
            assert!(
                matches!(parse(&text), Err(SvgError::InvalidViewbox(_))),
                "viewBox {raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn malformed_markup_is_an_error() {
        assert!(matches!(parse("<svg><line></svg>"), Err(SvgError::Xml(_))));
    }

    #[test]
    fn non_svg_root_is_rejected() {
        assert!(matches!(
            parse("<html><line x2='1'/></html>"),
            Err(SvgError::NotSvg(name)) if name == "html"
        ));
    }

    #[test]
    fn stroke_colors_follow_attribute_and_style() {
        let doc = parse(
            r##"<svg viewBox="0 0 10 10">
                 <line x2="1" stroke="#ff0000"/>
                 <line x2="1" style="stroke: blue; fill: none"/>
                 <line x2="1" stroke="lime" stroke-opacity="0.5"/>
                 <line x2="1" stroke="none"/>
               </svg>"##,
        )
        .unwrap();

        let colors = doc.geometry.colors();
        assert_eq!(colors.len(), 6);
        assert_eq!(colors[0], Rgba::from_rgba8(255, 0, 0, 255));
        assert_eq!(colors[2], Rgba::from_rgba8(0, 0, 255, 255));
        assert_eq!(colors[4].g, 1.0);
        assert!((colors[4].a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn stroke_is_inherited_from_ancestor_groups() {
        let doc = parse(
            r##"<svg viewBox="0 0 10 10">
                 <g stroke="red" stroke-opacity="0.5">
                   <line x2="1"/>
                   <g style="stroke: blue">
                     <line x2="1"/>
                     <line x2="1" stroke="inherit"/>
                   </g>
                   <line x2="1" stroke="lime" stroke-opacity="1"/>
                 </g>
                 <g stroke="none"><line x2="1"/></g>
                 <line x2="1"/>
               </svg>"##,
        )
        .unwrap();

        let colors = doc.geometry.colors();
        assert_eq!(colors.len(), 10);
        let half = |r, g, b| Rgba { r, g, b, a: 0.5 };
        assert_eq!(colors[0], half(1.0, 0.0, 0.0));
        assert_eq!(colors[2], half(0.0, 0.0, 1.0));
        assert_eq!(colors[4], colors[2]);
        assert_eq!(colors[6], Rgba::from_rgba8(0, 255, 0, 255));
        // The group with stroke="none" contributes nothing; the last line is default.
        assert_eq!(colors[8], Rgba::BLACK);
    }

    #[test]
    fn default_color_is_configurable() {
        let opts = ParseOptions {
            default_color: Rgba::WHITE,
            ..Default::default()
        };
        let doc = parse_document(r#"<svg><line x2="1"/></svg>"#, FALLBACK, &opts).unwrap();
        assert_eq!(doc.geometry.colors()[0], Rgba::WHITE);
    }

    #[test]
    fn polyline_and_polygon_segments() {
        let doc = parse(
            r#"<svg viewBox="0 0 10 10">
                 <polyline points="0,0 5,0 5,5"/>
                 <polygon points="0 0 1 0 1 1"/>
               </svg>"#,
        )
        .unwrap();

        // Polyline: 2 segments. Polygon: 3 (closed).
        assert_eq!(doc.geometry.segment_count(), 5);
        let v = doc.geometry.vertices();
        assert_eq!(&v[8..10], &[[1.0, 1.0], [0.0, 0.0]]);
    }

    #[test]
    fn odd_point_count_is_invalid() {
        assert!(matches!(
            parse(r#"<svg><polyline points="0 0 1"/></svg>"#),
            Err(SvgError::InvalidAttribute { attribute: "points", .. })
        ));
    }

    #[test]
    fn non_numeric_coordinate_is_invalid() {
        assert!(matches!(
            parse(r#"<svg><line x1="a" x2="1"/></svg>"#),
            Err(SvgError::InvalidAttribute { attribute: "x1", .. })
        ));
    }

    #[test]
    fn rect_outline_is_four_segments() {
        let doc = parse(r#"<svg><rect x="1" y="2" width="3" height="4"/></svg>"#).unwrap();
        assert_eq!(doc.geometry.segment_count(), 4);
        assert_eq!(doc.geometry.vertices()[0], [1.0, 2.0]);
        assert_eq!(doc.geometry.vertices()[5], [1.0, 6.0]);
    }

    #[test]
    fn straight_path_commands_map_one_to_one() {
        let doc = parse(r#"<svg><path d="M0 0 H10 V10 l-10 0 Z"/></svg>"#).unwrap();
        let v = doc.geometry.vertices();
        assert_eq!(
            v,
            &[
                [0.0, 0.0],
                [10.0, 0.0],
                [10.0, 0.0],
                [10.0, 10.0],
                [10.0, 10.0],
                [0.0, 10.0],
                [0.0, 10.0],
                [0.0, 0.0],
            ]
        );
    }

    #[test]
    fn multiple_subpaths_are_not_joined() {
        let doc = parse(r#"<svg><path d="M0 0 L1 0 M5 5 L6 5"/></svg>"#).unwrap();
        assert_eq!(doc.geometry.segment_count(), 2);
        assert_eq!(doc.geometry.vertices()[2], [5.0, 5.0]);
    }

    #[test]
    fn curves_are_flattened_into_segments() {
        let doc = parse(r#"<svg><path d="M0 0 Q50 100 100 0"/></svg>"#).unwrap();
        let g = &doc.geometry;

        assert!(g.segment_count() > 4);
        assert_eq!(g.vertices()[0], [0.0, 0.0]);
        let last = g.vertices()[g.vertex_count() - 1];
        assert!((last[0] - 100.0).abs() < 1e-3 && last[1].abs() < 1e-3);
    }

    #[test]
    fn bad_path_data_is_an_error() {
        assert!(matches!(
            parse(r#"<svg><path d="M0 0 X 10 10"/></svg>"#),
            Err(SvgError::PathData(_))
        ));
    }

    #[test]
    fn unsupported_elements_are_skipped() {
        let doc = parse(
            r#"<svg viewBox="0 0 1 1"><circle r="5"/><text>hi</text><g><line x2="1"/></g></svg>"#,
        )
        .unwrap();
        assert_eq!(doc.geometry.segment_count(), 1);
    }
}
