//! Scene rasterization.
//!
//! A scene is drawn as an SVG document (crossroad, two light discs, labels,
//! countdown boxes) and rasterized with `resvg` into premultiplied RGBA8.
//! Every position derives from the canvas size, so any resolution yields the
//! same composition.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::core::{Canvas, FrameRgba};
use crate::error::{SignalgenError, SignalgenResult};
use crate::model::{Light, LightState, Scene};

/// Anything that can turn a scene into a frame. The frame sequencer is
/// generic over this so tests can swap in a cheap stub.
pub trait RenderScene {
    fn render(&self, scene: Scene) -> SignalgenResult<FrameRgba>;
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub canvas: Canvas,
    /// Also draw the countdown box when the value has reached 0.
    pub show_zero_countdown: bool,
    /// Extra font directory loaded on top of the system fonts.
    pub font_dir: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 600,
                height: 600,
            },
            show_zero_countdown: false,
            font_dir: None,
        }
    }
}

/// SVG-backed renderer. The font database is built once at construction and
/// shared by every render call, so one instance renders reproducibly.
pub struct SceneRenderer {
    opts: RenderOptions,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl SceneRenderer {
    pub fn new(opts: RenderOptions) -> Self {
        let fontdb = build_fontdb(opts.font_dir.as_deref());
        Self { opts, fontdb }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.opts
    }
}

impl RenderScene for SceneRenderer {
    fn render(&self, scene: Scene) -> SignalgenResult<FrameRgba> {
        let svg = scene_svg(scene, self.opts.canvas, self.opts.show_zero_countdown);

        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            font_resolver: sans_fallback_resolver(),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_data(svg.as_bytes(), &opts).context("parse scene svg")?;

        rasterize(&tree, self.opts.canvas.width, self.opts.canvas.height)
    }
}

fn rasterize(tree: &usvg::Tree, width: u32, height: u32) -> SignalgenResult<FrameRgba> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| SignalgenError::evaluation("failed to allocate scene pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());

    Ok(FrameRgba {
        width,
        height,
        data: pixmap.data().to_vec(),
        premultiplied: true,
    })
}

/// Build the SVG markup for one scene.
///
/// Layout ratios: road width w/4, light radius w/12, margin w/8. Light A sits
/// on the left arm, light B on the right, both on the horizontal road axis.
fn scene_svg(scene: Scene, canvas: Canvas, show_zero: bool) -> String {
    let (w, h) = (canvas.width, canvas.height);
    let road = w / 4;
    let radius = w / 12;
    let margin = w / 8;
    let cy = h / 2;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );

    // Backdrop and the two road arms.
    let _ = write!(
        svg,
        r#"<rect width="{w}" height="{h}" fill="rgb(240,240,235)"/>"#
    );
    // Positions are signed: an extreme aspect ratio pushes an arm off the
    // canvas instead of underflowing.
    let _ = write!(
        svg,
        r#"<rect x="0" y="{}" width="{w}" height="{road}" fill="rgb(60,60,60)"/>"#,
        i64::from(h / 2) - i64::from(road / 2)
    );
    let _ = write!(
        svg,
        r#"<rect x="{}" y="0" width="{road}" height="{h}" fill="rgb(60,60,60)"/>"#,
        i64::from(w / 2) - i64::from(road / 2)
    );

    // Dashed center lines, dash 20 gap 10 from the canvas edge.
    let _ = write!(
        svg,
        r#"<line x1="0" y1="{cy}" x2="{w}" y2="{cy}" stroke="rgb(255,255,255)" stroke-width="2" stroke-dasharray="20 10"/>"#
    );
    let _ = write!(
        svg,
        r#"<line x1="{x}" y1="0" x2="{x}" y2="{h}" stroke="rgb(255,255,255)" stroke-width="2" stroke-dasharray="20 10"/>"#,
        x = w / 2
    );

    push_light(&mut svg, margin + radius, cy, radius, scene.light_a, 'A', show_zero);
    push_light(&mut svg, w - margin - radius, cy, radius, scene.light_b, 'B', show_zero);

    svg.push_str("</svg>");
    svg
}

fn push_light(
    svg: &mut String,
    cx: u32,
    cy: u32,
    radius: u32,
    light: Light,
    label: char,
    show_zero: bool,
) {
    let fill = match light.state {
        LightState::Red => "rgb(255,0,0)",
        LightState::Green => "rgb(0,200,0)",
    };
    let _ = write!(
        svg,
        r#"<circle cx="{cx}" cy="{cy}" r="{radius}" fill="{fill}" stroke="rgb(0,0,0)" stroke-width="3"/>"#
    );

    // Label baseline sits 10px above the circle top.
    let _ = write!(
        svg,
        r#"<text x="{cx}" y="{y}" font-family="sans-serif" font-size="{fs}" text-anchor="middle" fill="rgb(0,0,0)">Traffic {label}</text>"#,
        y = i64::from(cy) - i64::from(radius) - 10,
        fs = radius / 2
    );

    if light.countdown > 0 || show_zero {
        let text = light.countdown.to_string();
        let fs = radius as f64;
        // Glyph metrics are not measured here; digit advance ~0.6em and cap
        // height ~0.72em size the box, the 5px padding absorbs the rest.
        let tw = text.len() as f64 * fs * 0.6;
        let th = fs * 0.72;
        let top = (cy + radius + 15) as f64;

        let _ = write!(
            svg,
            r#"<rect x="{x}" y="{y}" width="{bw}" height="{bh}" fill="rgb(255,255,255)" stroke="rgb(0,0,0)" stroke-width="2"/>"#,
            x = cx as f64 - tw / 2.0 - 5.0,
            y = top - 5.0,
            bw = tw + 10.0,
            bh = th + 10.0
        );
        let _ = write!(
            svg,
            r#"<text x="{cx}" y="{y}" font-family="sans-serif" font-size="{fs}" text-anchor="middle" fill="rgb(0,0,0)">{text}</text>"#,
            y = top + th
        );
    }
}

fn build_fontdb(extra_dir: Option<&Path>) -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    if let Some(dir) = extra_dir {
        load_fonts_from_dir(&mut db, dir);
    }
    Arc::new(db)
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        let _ = db.load_font_file(&path);
    }
}

/// Font selection with a hard fallback chain, so text survives hosts where
/// the requested family is missing.
fn sans_fallback_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }

            families.push(usvg::fontdb::Family::SansSerif);
            families.push(usvg::fontdb::Family::Serif);
            families.push(usvg::fontdb::Family::Monospace);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            if let Some(id) = fontdb.query(&query) {
                return Some(id);
            }
            fontdb.faces().next().map(|f| f.id)
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}
