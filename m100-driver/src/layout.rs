//! Generate an HTML/SVG visualization of the Model 100 key matrix.
//! Keys are drawn in matrix order, one rectangle per row/column crossing.

use m100_keymap::{code_combo, lookup, modifier_at, Modifier, COLS, ROWS};

/// Key unit size in SVG pixels.
const U: f64 = 54.0;
/// Gap between keys.
const GAP: f64 = 4.0;
/// Step: key + gap.
const S: f64 = U + GAP;
/// Key corner radius.
const R: f64 = 4.0;
/// Extra gap separating the modifier column from the rest.
const MOD_GAP: f64 = 24.0;
/// Space reserved for the row and column headers.
const HEADER: f64 = 24.0;
/// Margin around the SVG content.
const MARGIN: f64 = 20.0;

/// Top-left corner of the key at `(row, col)`.
fn key_origin(row: usize, col: usize) -> (f64, f64) {
    let mut x = HEADER + col as f64 * S;
    if col == COLS - 1 {
        x += MOD_GAP;
    }
    (x, HEADER + row as f64 * S)
}

fn key_class(row: usize, col: usize) -> &'static str {
    match modifier_at(row, col) {
        Some(Modifier::Code) => "key code",
        Some(_) => "key modifier",
        None if code_combo(row, col).is_some() => "key combo",
        None => "key",
    }
}

/// Render the matrix as an SVG group.
fn render_matrix() -> String {
    let mut svg = String::new();

    svg.push_str(&format!(r#"<g transform="translate({MARGIN}, {MARGIN})">"#));

    for col in 0..COLS {
        let (x, _) = key_origin(0, col);
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" class="header">C{col}</text>"#,
            x + U / 2.0,
            HEADER / 2.0,
        ));
    }

    for row in 0..ROWS {
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" class="header">R{row}</text>"#,
            HEADER / 2.0 - 2.0,
            HEADER + row as f64 * S + U / 2.0,
        ));

        for col in 0..COLS {
            let (x, y) = key_origin(row, col);
            svg.push_str(&format!(
                r#"<rect x="{x}" y="{y}" width="{U}" height="{U}" rx="{R}" class="{}"/>"#,
                key_class(row, col),
            ));

            let label = match modifier_at(row, col) {
                Some(Modifier::Code) => "CODE",
                _ => lookup(row, col).map_or("", |kc| kc.display_name()),
            };
            if !label.is_empty() {
                let font_class = if label.len() > 3 { " small" } else { "" };
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" class="label{font_class}">{}</text>"#,
                    x + U / 2.0,
                    y + U / 2.0 + 1.0,
                    html_escape(label),
                ));
            }

            // CODE layer legend in the corner
            if let Some(kc) = code_combo(row, col) {
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" class="label alt">{}</text>"#,
                    x + U / 2.0,
                    y + U - 8.0,
                    html_escape(kc.display_name()),
                ));
            }
        }
    }

    svg.push_str("</g>");
    svg
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Generate the complete HTML document with inline SVG.
pub fn generate_html() -> String {
    let (right, bottom) = key_origin(ROWS - 1, COLS - 1);
    let total_width = right + U + 2.0 * MARGIN;
    let total_height = bottom + U + 2.0 * MARGIN;

    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>TRS-80 Model 100 Matrix</title>
<style>
  body {{
    background: #1a1a2e;
    color: #eee;
    font-family: system-ui, -apple-system, sans-serif;
    display: flex;
    justify-content: center;
    padding: 2em;
  }}
  .key {{
    fill: #16213e;
    stroke: #0f3460;
    stroke-width: 1.5;
  }}
  .key.modifier {{
    fill: #1b2e4e;
    stroke: #53a8b6;
  }}
  .key.code {{
    fill: #2d1b4e;
    stroke: #e94560;
    stroke-width: 2;
  }}
  .key.combo {{
    stroke: #e94560;
    stroke-dasharray: 3 3;
  }}
  .label {{
    fill: #eee;
    font-family: "JetBrains Mono", "Fira Code", monospace;
    font-size: 13px;
    text-anchor: middle;
    dominant-baseline: middle;
    pointer-events: none;
  }}
  .label.small {{
    font-size: 10px;
  }}
  .label.alt {{
    fill: #e94560;
    font-size: 9px;
  }}
  .header {{
    fill: #888;
    font-size: 11px;
    text-anchor: middle;
    dominant-baseline: middle;
  }}
</style>
</head>
<body>
<svg width="{total_width}" height="{total_height}" xmlns="http://www.w3.org/2000/svg">
"#
    );

    html.push_str(&render_matrix());
    html.push_str("\n</svg>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_drawn() {
        let html = generate_html();
        assert_eq!(html.matches("<rect ").count(), ROWS * COLS);
        assert!(html.contains(">CODE<"));
        assert!(html.contains(">PgUp<"));
        assert!(html.contains(">PgDn<"));
    }

    #[test]
    fn test_key_classes() {
        assert_eq!(key_class(0, 8), "key modifier");
        assert_eq!(key_class(3, 8), "key code");
        assert_eq!(key_class(6, 5), "key combo");
        assert_eq!(key_class(0, 0), "key");
    }

    #[test]
    fn test_escape() {
        assert_eq!(html_escape("<&>"), "&lt;&amp;&gt;");
    }
}
