//! Output canvas and alpha compositing.

use image::{Rgba, RgbaImage};

/// RGBA8 output canvas, initialised to transparent black.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Consumes the canvas, handing the pixels to the encoder.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Composites a tile with its top-left corner at `(x, y)`.
    ///
    /// The offset may be negative or extend past the canvas; pixels landing
    /// outside are discarded. Returns the number of pixels written.
    pub fn place_tile(&mut self, tile: &RgbaImage, x: i64, y: i64) -> u64 {
        let canvas_w = i64::from(self.image.width());
        let canvas_h = i64::from(self.image.height());

        let src_x0 = (-x).max(0);
        let src_y0 = (-y).max(0);
        let src_x1 = i64::from(tile.width()).min(canvas_w - x);
        let src_y1 = i64::from(tile.height()).min(canvas_h - y);

        if src_x0 >= src_x1 || src_y0 >= src_y1 {
            return 0;
        }

        for sy in src_y0..src_y1 {
            let dy = (sy + y) as u32;
            for sx in src_x0..src_x1 {
                let dx = (sx + x) as u32;
                let src = *tile.get_pixel(sx as u32, sy as u32);
                let dst = self.image.get_pixel_mut(dx, dy);
                *dst = blend_over(src, *dst);
            }
        }

        ((src_x1 - src_x0) * (src_y1 - src_y0)) as u64
    }
}

/// Porter-Duff source-over on straight (non-premultiplied) RGBA8.
///
/// `src` is the tile being placed and lands on top, so of two overlapping
/// tiles the one placed later wins. Channels are rounded, not truncated.
///
/// ```text
/// a_out = as + ad * (1 - as)
/// c_out = (cs * as + cd * ad * (1 - as)) / a_out
/// ```
///
/// A zero output alpha yields transparent black.
#[inline]
pub fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match src[3] {
        255 => return src,
        0 => return dst,
        _ => {}
    }

    let sa = f32::from(src[3]) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let dst_weight = da * (1.0 - sa);
    let out_a = sa + dst_weight;

    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let c = (f32::from(src[i]) * sa + f32::from(dst[i]) * dst_weight) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(size: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba(color))
    }

    #[test]
    fn test_new_canvas_is_transparent() {
        let canvas = Canvas::new(3, 2);
        assert_eq!((canvas.width(), canvas.height()), (3, 2));
        assert!(canvas.image().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_place_inside_canvas() {
        let mut canvas = Canvas::new(8, 8);
        let written = canvas.place_tile(&solid(4, [255, 0, 0, 255]), 2, 2);

        assert_eq!(written, 16);
        assert_eq!(canvas.image().get_pixel(2, 2).0, [255, 0, 0, 255]);
        assert_eq!(canvas.image().get_pixel(5, 5).0, [255, 0, 0, 255]);
        assert_eq!(canvas.image().get_pixel(6, 6).0, [0, 0, 0, 0]);
        assert_eq!(canvas.image().get_pixel(1, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_place_clips_negative_offset() {
        let mut canvas = Canvas::new(4, 4);
        let written = canvas.place_tile(&solid(4, [0, 255, 0, 255]), -3, -1);

        assert_eq!(written, 3);
        assert_eq!(canvas.image().get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(canvas.image().get_pixel(0, 2).0, [0, 255, 0, 255]);
        assert_eq!(canvas.image().get_pixel(1, 0).0, [0, 0, 0, 0]);
        assert_eq!(canvas.image().get_pixel(0, 3).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_place_clips_far_edge() {
        let mut canvas = Canvas::new(4, 4);
        let written = canvas.place_tile(&solid(4, [0, 0, 255, 255]), 3, 2);

        assert_eq!(written, 2);
        assert_eq!(canvas.image().get_pixel(3, 2).0, [0, 0, 255, 255]);
        assert_eq!(canvas.image().get_pixel(3, 3).0, [0, 0, 255, 255]);
        assert_eq!(canvas.image().get_pixel(2, 3).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_place_entirely_outside() {
        let mut canvas = Canvas::new(4, 4);
        assert_eq!(canvas.place_tile(&solid(4, [1, 1, 1, 255]), 4, 0), 0);
        assert_eq!(canvas.place_tile(&solid(4, [1, 1, 1, 255]), -4, 0), 0);
        assert!(canvas.image().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_opaque_source_replaces() {
        let out = blend_over(Rgba([10, 20, 30, 255]), Rgba([200, 200, 200, 255]));
        assert_eq!(out.0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_transparent_source_keeps_destination() {
        let out = blend_over(Rgba([10, 20, 30, 0]), Rgba([200, 100, 50, 128]));
        assert_eq!(out.0, [200, 100, 50, 128]);
    }

    #[test]
    fn test_half_alpha_over_opaque() {
        let out = blend_over(Rgba([255, 0, 0, 128]), Rgba([0, 0, 255, 255]));
        assert_eq!(out[3], 255);
        assert_eq!(out[0], 128);
        assert_eq!(out[1], 0);
        assert_eq!(out[2], 127);
    }

    #[test]
    fn test_partial_alpha_over_transparent_keeps_color() {
        let out = blend_over(Rgba([40, 80, 120, 100]), Rgba([0, 0, 0, 0]));
        assert_eq!(out.0, [40, 80, 120, 100]);
    }

    #[test]
    fn test_two_half_alphas_accumulate() {
        let out = blend_over(Rgba([0, 0, 0, 128]), Rgba([0, 0, 0, 128]));
        // 0.502 + 0.502 * 0.498 = 0.752
        assert_eq!(out[3], 192);
    }

    #[test]
    fn test_overlapping_opaque_later_wins() {
        let mut canvas = Canvas::new(6, 6);
        canvas.place_tile(&solid(4, [255, 0, 0, 255]), 0, 0);
        canvas.place_tile(&solid(4, [0, 255, 0, 255]), 2, 2);

        assert_eq!(canvas.image().get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(canvas.image().get_pixel(3, 3).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_translucent_later_tile_lands_on_top() {
        let mut canvas = Canvas::new(4, 4);
        canvas.place_tile(&solid(4, [0, 0, 255, 255]), 0, 0);
        canvas.place_tile(&solid(4, [255, 0, 0, 128]), 0, 0);

        // destination-over would leave the opaque blue untouched
        assert_eq!(canvas.image().get_pixel(0, 0).0, [128, 0, 127, 255]);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_disjoint_opaque_placement_order_independent(
                a in any::<[u8; 3]>(),
                b in any::<[u8; 3]>(),
                ax in -4i64..4,
                ay in -4i64..8,
            ) {
                // Tile B sits directly right of tile A, so they never overlap
                let tile_a = solid(4, [a[0], a[1], a[2], 255]);
                let tile_b = solid(4, [b[0], b[1], b[2], 255]);

                let mut first = Canvas::new(8, 8);
                first.place_tile(&tile_a, ax, ay);
                first.place_tile(&tile_b, ax + 4, ay);

                let mut second = Canvas::new(8, 8);
                second.place_tile(&tile_b, ax + 4, ay);
                second.place_tile(&tile_a, ax, ay);

                prop_assert_eq!(first.image().as_raw(), second.image().as_raw());
            }

            #[test]
            fn test_blend_alpha_never_decreases(
                src in any::<[u8; 4]>(),
                dst in any::<[u8; 4]>(),
            ) {
                let out = blend_over(Rgba(src), Rgba(dst));
                prop_assert!(out[3] >= src[3].max(dst[3]).saturating_sub(1));
            }
        }
    }
}
