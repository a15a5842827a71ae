//! Caption banner rasterization.
//!
//! The caption is word-wrapped and rasterized once into a transparent RGBA
//! banner; FFmpeg then scrolls that banner over the composite. The measured
//! banner height is what drives the total render duration.

use std::path::{Path, PathBuf};

use fontdue::layout::{CoordinateSystem, HorizontalAlign, Layout, LayoutSettings, TextStyle, WrapStyle};
use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};
use tracing::debug;

use scrollcast_models::{Color, RenderRequest};

use crate::error::{MediaError, MediaResult};

/// Padding around the rasterized text, sized to keep shadow passes inside
/// the banner.
const BANNER_PAD: u32 = 2;

/// System font locations checked when no font is configured.
const FONT_FALLBACK_PATHS: &[&str] = &[
    "assets/fonts/NotoSans-Bold.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
];

/// A rendered caption banner on disk.
#[derive(Debug, Clone)]
pub struct TextBanner {
    /// PNG path in the job workdir
    pub path: PathBuf,
    /// Banner width in pixels
    pub width: u32,
    /// Banner height in pixels; feeds the layout plan
    pub height: u32,
}

/// Resolve the font to rasterize with: explicit path, `SCROLLCAST_FONT`,
/// then common system locations.
pub fn resolve_font_path(explicit: Option<&Path>) -> MediaResult<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(MediaError::asset_unreadable(path, "configured font missing"));
    }

    if let Ok(env_path) = std::env::var("SCROLLCAST_FONT") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(MediaError::asset_unreadable(path, "SCROLLCAST_FONT missing"));
    }

    for candidate in FONT_FALLBACK_PATHS {
        let path = Path::new(candidate);
        if path.exists() {
            debug!(path = candidate, "Using fallback font");
            return Ok(path.to_path_buf());
        }
    }

    Err(MediaError::FontNotFound)
}

/// Load a font file for rasterization.
pub fn load_font(path: &Path) -> MediaResult<Font> {
    let bytes = std::fs::read(path)?;
    Font::from_bytes(bytes, FontSettings::default())
        .map_err(|e| MediaError::asset_unreadable(path, e))
}

/// Word-wrap and rasterize the caption into a transparent RGBA banner.
///
/// Lines are centered; shadow passes (per the request's shadow style) are
/// drawn under the main pass at their configured offsets.
pub fn rasterize_banner(request: &RenderRequest, text_width: u32, font: &Font) -> RgbaImage {
    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings {
        max_width: Some(text_width as f32),
        horizontal_align: HorizontalAlign::Center,
        wrap_style: WrapStyle::Word,
        ..LayoutSettings::default()
    });
    layout.append(
        &[font],
        &TextStyle::new(&request.text, request.font_size as f32, 0),
    );

    let text_height = layout.height().ceil() as u32;
    let banner_w = text_width + 2 * BANNER_PAD;
    let banner_h = text_height + 2 * BANNER_PAD;
    let mut banner = RgbaImage::from_pixel(banner_w, banner_h, Rgba([0, 0, 0, 0]));

    let shadow_color = request.effective_shadow_color();
    for (dx, dy) in request.shadow_style.offsets() {
        blit_glyphs(&mut banner, &layout, font, shadow_color, *dx, *dy);
    }
    blit_glyphs(&mut banner, &layout, font, request.main_color, 0, 0);

    banner
}

/// Rasterize the banner and write it as a PNG next to the other job files.
pub fn render_banner(
    request: &RenderRequest,
    text_width: u32,
    font: &Font,
    out_path: &Path,
) -> MediaResult<TextBanner> {
    let banner = rasterize_banner(request, text_width, font);
    let (width, height) = banner.dimensions();

    banner
        .save(out_path)
        .map_err(|e| MediaError::internal(format!("Failed to write banner PNG: {}", e)))?;

    debug!(
        path = %out_path.display(),
        width,
        height,
        "Caption banner rendered"
    );

    Ok(TextBanner {
        path: out_path.to_path_buf(),
        width,
        height,
    })
}

/// Draw every laid-out glyph onto the banner with an offset and color.
fn blit_glyphs(
    banner: &mut RgbaImage,
    layout: &Layout,
    font: &Font,
    color: Color,
    dx: i32,
    dy: i32,
) {
    let (banner_w, banner_h) = banner.dimensions();
    let [r, g, b, _] = color.to_rgba();

    for glyph in layout.glyphs() {
        if glyph.width == 0 || glyph.height == 0 {
            continue;
        }

        let (_, coverage) = font.rasterize_config(glyph.key);
        let x0 = glyph.x as i32 + BANNER_PAD as i32 + dx;
        let y0 = glyph.y as i32 + BANNER_PAD as i32 + dy;

        for row in 0..glyph.height {
            for col in 0..glyph.width {
                let alpha = coverage[row * glyph.width + col];
                if alpha == 0 {
                    continue;
                }
                let px = x0 + col as i32;
                let py = y0 + row as i32;
                if px < 0 || py < 0 || px as u32 >= banner_w || py as u32 >= banner_h {
                    continue;
                }
                blend_over(banner.get_pixel_mut(px as u32, py as u32), r, g, b, alpha);
            }
        }
    }
}

/// Source-over blend of a glyph pixel onto the banner.
fn blend_over(dst: &mut Rgba<u8>, r: u8, g: u8, b: u8, alpha: u8) {
    let a = alpha as u32;
    let inv = 255 - a;
    dst.0 = [
        ((r as u32 * a + dst.0[0] as u32 * inv) / 255) as u8,
        ((g as u32 * a + dst.0[1] as u32 * inv) / 255) as u8,
        ((b as u32 * a + dst.0[2] as u32 * inv) / 255) as u8,
        (a + (dst.0[3] as u32 * inv) / 255).min(255) as u8,
    ];
}
