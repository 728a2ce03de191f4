//! RGBA8 pixel blending and surface fitting.

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Straight-alpha RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Straight-alpha source-over of `src` onto `dst`, with `src` alpha
/// further scaled by `opacity`.
///
/// `out_a = sa + da(1 - sa)` and `out_c = (sc sa + dc da (1 - sa)) / out_a`.
pub fn over(dst: Rgba8, src: Rgba8, opacity: f32) -> Rgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u32;
    let sa = mul_div255(u32::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    // Destination weight left after the source covers `sa` of the pixel.
    let dw = mul_div255(u32::from(dst[3]), 255 - sa);
    let out_a = sa + dw;

    let mut out = [0u8; 4];
    for i in 0..3 {
        let weighted = u32::from(src[i]) * sa + u32::from(dst[i]) * dw;
        out[i] = ((weighted + out_a / 2) / out_a).min(255) as u8;
    }
    out[3] = out_a.min(255) as u8;
    out
}

/// Blend `src` over `dst` pixel by pixel. Both images must share dimensions.
pub fn over_in_place(dst: &mut RgbaImage, src: &RgbaImage, opacity: f32) {
    debug_assert_eq!(dst.dimensions(), src.dimensions());
    for (d, s) in dst.pixels_mut().zip(src.pixels()) {
        d.0 = over(d.0, s.0, opacity);
    }
}

/// Scale `image` to exactly `width` x `height`, ignoring aspect ratio.
/// Returns a plain copy when the size already matches.
pub fn fit_to(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Triangle)
}

fn mul_div255(x: u32, y: u32) -> u32 {
    (x * y + 127) / 255
}
