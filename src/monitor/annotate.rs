//! Display compositing: dimmed background, region borders and index labels.

use crate::image::{Frame, FrameView, Region, CHANNELS};

/// Overlay parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnotateStyle {
    /// Background dimming factor; outside pixels become `(v + alpha) / (1 + alpha)`.
    pub alpha: f32,
    /// Border thickness in pixels, drawn just outside each region.
    pub border: usize,
    /// Border and label colour.
    pub color: [f32; CHANNELS],
    /// Pixel size of one font cell.
    pub label_scale: usize,
    /// Label offset from the region origin.
    pub label_offset: (usize, usize),
}

impl Default for AnnotateStyle {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            border: 3,
            color: [1.0, 0.0, 0.0],
            label_scale: 2,
            label_offset: (3, 3),
        }
    }
}

// 3x5 digit glyphs, one row per byte, MSB-first in the low three bits.
const GLYPHS: [[u8; GLYPH_HEIGHT]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

const GLYPH_WIDTH: usize = 3;
const GLYPH_HEIGHT: usize = 5;

/// Composites the display frame for one cycle.
///
/// Regions are labelled `1..=n` in the order given.
pub fn annotate(frame: FrameView<'_>, regions: &[Region], style: &AnnotateStyle) -> Frame {
    let mut out = frame.to_frame();
    let alpha = style.alpha;
    out.map_pixels(|x, y, px| {
        if regions.iter().any(|r| r.contains(x, y)) {
            px
        } else {
            px.map(|v| (v + alpha) / (1.0 + alpha))
        }
    });

    for region in regions {
        draw_border(&mut out, *region, style.border, style.color);
    }
    for (idx, region) in regions.iter().enumerate() {
        let x = region.x() + style.label_offset.0;
        let y = region.y() + style.label_offset.1;
        draw_number(&mut out, x, y, idx + 1, style.label_scale, style.color);
    }
    out
}

fn draw_border(out: &mut Frame, region: Region, border: usize, color: [f32; CHANNELS]) {
    if border == 0 {
        return;
    }
    let (Some(right), Some(bottom)) = (region.right(), region.bottom()) else {
        return;
    };
    let x0 = region.x().saturating_sub(border);
    let y0 = region.y().saturating_sub(border);
    let x1 = right.saturating_add(border).min(out.width());
    let y1 = bottom.saturating_add(border).min(out.height());
    for y in y0..y1 {
        for x in x0..x1 {
            if !region.contains(x, y) {
                out.put_pixel(x, y, color);
            }
        }
    }
}

fn draw_number(
    out: &mut Frame,
    x: usize,
    y: usize,
    number: usize,
    scale: usize,
    color: [f32; CHANNELS],
) {
    let scale = scale.max(1);
    let advance = (GLYPH_WIDTH + 1) * scale;
    for (pos, digit) in number.to_string().bytes().enumerate() {
        let glyph = &GLYPHS[usize::from(digit - b'0')];
        let gx = x + pos * advance;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        out.put_pixel(gx + col * scale + sx, y + row * scale + sy, color);
                    }
                }
            }
        }
    }
}
