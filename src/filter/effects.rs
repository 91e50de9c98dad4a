//! 内置滤镜算子。
//!
//! 所有算子输入输出均为 RGBA8，输出尺寸与输入一致。
//! 棕褐色与马赛克委托 `photon_rs`，边缘检测委托 `imageproc`，模糊类使用 `image::imageops`；
//! 晶格化与暗角没有现成实现，在本模块中逐像素完成。
//! 参数为 0（或小于 1 个像素）时退化为恒等变换。

use image::{Rgba, RgbaImage, imageops};
use imageproc::gradients::sobel_gradients;
use photon_rs::{PhotonImage, effects as photon_effects, monochrome};

/// 暗角半径达到该值时覆盖到角点。
const VIGNETTE_FULL_RADIUS: f32 = 200.0;

#[inline]
fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// 逐像素变换，闭包只处理 RGB。
fn map_rgb<F>(src: &RgbaImage, mut f: F) -> RgbaImage
where
    F: FnMut(u32, u32, [f32; 3]) -> [f32; 3],
{
    let mut out = src.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let [nr, ng, nb] = f(x, y, [r as f32, g as f32, b as f32]);
        *pixel = Rgba([to_u8(nr), to_u8(ng), to_u8(nb), a]);
    }
    out
}

/// 把位图交给 `photon_rs` 处理后再取回。
fn with_photon<F>(src: &RgbaImage, apply: F) -> Option<RgbaImage>
where
    F: FnOnce(&mut PhotonImage),
{
    let (width, height) = src.dimensions();
    let mut photon_img = PhotonImage::new(src.as_raw().clone(), width, height);
    apply(&mut photon_img);
    RgbaImage::from_raw(width, height, photon_img.get_raw_pixels())
}

/// 高斯模糊，半径即标准差。
pub fn gaussian_blur(src: &RgbaImage, radius: f32) -> RgbaImage {
    if radius <= 0.0 {
        return src.clone();
    }
    imageops::blur(src, radius)
}

/// 反锐化掩模：`src + intensity * (src - blur(src))`。
pub fn unsharp_mask(src: &RgbaImage, radius: f32, intensity: f32) -> RgbaImage {
    if radius <= 0.0 || intensity == 0.0 {
        return src.clone();
    }

    let blurred = imageops::blur(src, radius);
    map_rgb(src, |x, y, rgb| {
        let b = blurred.get_pixel(x, y).0;
        [
            rgb[0] + intensity * (rgb[0] - b[0] as f32),
            rgb[1] + intensity * (rgb[1] - b[1] as f32),
            rgb[2] + intensity * (rgb[2] - b[2] as f32),
        ]
    })
}

/// 棕褐色调：`photon_rs` 全强度着色后按强度与原图线性混合，alpha 取原图。
pub fn sepia_tone(src: &RgbaImage, intensity: f32) -> Option<RgbaImage> {
    if intensity == 0.0 {
        return Some(src.clone());
    }

    let toned = with_photon(src, monochrome::sepia)?;
    Some(map_rgb(src, |x, y, rgb| {
        let sepia = toned.get_pixel(x, y).0;
        [
            rgb[0] + intensity * (sepia[0] as f32 - rgb[0]),
            rgb[1] + intensity * (sepia[1] as f32 - rgb[1]),
            rgb[2] + intensity * (sepia[2] as f32 - rgb[2]),
        ]
    }))
}

/// 亮度 Sobel 梯度幅值乘以强度，输出灰度，alpha 取原图。
pub fn edges(src: &RgbaImage, intensity: f32) -> RgbaImage {
    let gray = imageops::grayscale(src);
    let gradients = sobel_gradients(&gray);

    let mut out = src.clone();
    for (pixel, magnitude) in out.pixels_mut().zip(gradients.pixels()) {
        let value = to_u8(magnitude.0[0] as f32 * intensity);
        *pixel = Rgba([value, value, value, pixel.0[3]]);
    }
    out
}

/// 马赛克：以 `scale` 像素为边长分块，每块填充单一颜色。
pub fn pixellate(src: &RgbaImage, scale: f32) -> Option<RgbaImage> {
    let block = scale.round();
    if block <= 1.0 {
        return Some(src.clone());
    }
    with_photon(src, |img| photon_effects::pixelize(img, block as i32))
}

/// 确定性哈希，把网格坐标映射为 [0, 1) 内的两个抖动量。
fn cell_jitter(cx: i64, cy: i64) -> (f32, f32) {
    let mut z = (cx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (cy as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;

    let jx = (z >> 40) as f32 / (1u64 << 24) as f32;
    let jy = ((z >> 16) & 0xFF_FFFF) as f32 / (1u64 << 24) as f32;
    (jx, jy)
}

/// 晶格化：抖动网格上的种子点构成 Voronoi 单元，单元内填充种子处的颜色。
pub fn crystallize(src: &RgbaImage, radius: f32) -> RgbaImage {
    if radius < 1.0 {
        return src.clone();
    }

    let (width, height) = src.dimensions();
    let seed_of = |cx: i64, cy: i64| {
        let (jx, jy) = cell_jitter(cx, cy);
        ((cx as f32 + jx) * radius, (cy as f32 + jy) * radius)
    };

    let mut out = RgbaImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let fx = x as f32 + 0.5;
        let fy = y as f32 + 0.5;
        let gx = (fx / radius).floor() as i64;
        let gy = (fy / radius).floor() as i64;

        let mut best = (f32::MAX, fx, fy);
        for cy in gy - 1..=gy + 1 {
            for cx in gx - 1..=gx + 1 {
                let (sx, sy) = seed_of(cx, cy);
                let dist = (sx - fx).powi(2) + (sy - fy).powi(2);
                if dist < best.0 {
                    best = (dist, sx, sy);
                }
            }
        }

        let sample_x = (best.1.max(0.0) as u32).min(width - 1);
        let sample_y = (best.2.max(0.0) as u32).min(height - 1);
        *pixel = *src.get_pixel(sample_x, sample_y);
    }

    out
}

/// 暗角：`radius` 取 0..200，对应从中心到角点的归一化距离；
/// 超过该距离后按 smoothstep 压暗，半径 ≥ 200 时不压暗。
///
/// 强度为负时提亮边缘。
pub fn vignette(src: &RgbaImage, radius: f32, intensity: f32) -> RgbaImage {
    if intensity == 0.0 {
        return src.clone();
    }

    let (width, height) = src.dimensions();
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let half_diagonal = cx.hypot(cy).max(f32::EPSILON);
    let inner = (radius / VIGNETTE_FULL_RADIUS).clamp(0.0, 1.0);

    map_rgb(src, |x, y, rgb| {
        let r = (x as f32 + 0.5 - cx).hypot(y as f32 + 0.5 - cy) / half_diagonal;
        if inner >= 1.0 || r <= inner {
            return rgb;
        }
        let t = ((r - inner) / (1.0 - inner)).min(1.0);
        let factor = 1.0 - intensity * t * t * (3.0 - 2.0 * t);
        rgb.map(|c| c * factor)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 17 % 256) as u8, (y * 29 % 256) as u8, ((x + y) * 7 % 256) as u8, 200])
        })
    }

    #[test]
    fn zero_parameters_are_identity() {
        let src = gradient(16, 12);
        assert_eq!(gaussian_blur(&src, 0.0), src);
        assert_eq!(unsharp_mask(&src, 0.0, 1.0), src);
        assert_eq!(sepia_tone(&src, 0.0), Some(src.clone()));
        assert_eq!(pixellate(&src, 0.0), Some(src.clone()));
        assert_eq!(crystallize(&src, 0.0), src);
        assert_eq!(vignette(&src, 0.5, 0.0), src);
    }

    #[test]
    fn sepia_warms_grey_and_keeps_alpha() {
        let src = RgbaImage::from_pixel(3, 2, Rgba([100, 100, 100, 77]));
        let out = sepia_tone(&src, 1.0).expect("sepia output");
        let [r, g, b, a] = out.get_pixel(1, 1).0;
        assert!(r > g && g >= b, "not a warm tone: {r} {g} {b}");
        assert_eq!(a, 77);
    }

    #[test]
    fn sepia_half_intensity_lies_between_source_and_full() {
        let src = gradient(6, 4);
        let full = sepia_tone(&src, 1.0).expect("full");
        let half = sepia_tone(&src, 0.5).expect("half");
        for ((s, f), h) in src.pixels().zip(full.pixels()).zip(half.pixels()) {
            for c in 0..3 {
                let (lo, hi) = (s.0[c].min(f.0[c]), s.0[c].max(f.0[c]));
                assert!((lo..=hi).contains(&h.0[c]));
            }
        }
    }

    #[test]
    fn edges_of_flat_image_are_black() {
        let src = RgbaImage::from_pixel(5, 5, Rgba([120, 40, 220, 255]));
        let out = edges(&src, 1.0);
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 255]));
        assert_eq!(edges(&gradient(4, 4), 0.0).get_pixel(1, 1).0, [0, 0, 0, 200]);
    }

    #[test]
    fn edges_detect_vertical_step() {
        let src = RgbaImage::from_fn(6, 3, |x, _| {
            if x < 3 { Rgba([0, 0, 0, 255]) } else { Rgba([255, 255, 255, 255]) }
        });
        let out = edges(&src, 1.0);
        assert_eq!(out.get_pixel(2, 1).0[0], 255);
        assert_eq!(out.get_pixel(0, 1).0[0], 0);
    }

    #[test]
    fn pixellate_fills_blocks_uniformly() {
        let src = gradient(8, 6);
        let out = pixellate(&src, 2.0).expect("pixellate output");
        for (x, y, pixel) in out.enumerate_pixels() {
            assert_eq!(pixel, out.get_pixel(x - x % 2, y - y % 2));
        }
        assert_ne!(out, src);
    }

    #[test]
    fn pixellate_handles_partial_edge_blocks() {
        let src = gradient(5, 5);
        let out = pixellate(&src, 4.0).expect("pixellate output");
        assert_eq!(out.dimensions(), (5, 5));
        assert_eq!(out.get_pixel(4, 4), src.get_pixel(4, 4));
    }

    #[test]
    fn crystallize_only_uses_source_colours() {
        let src = gradient(20, 20);
        let out = crystallize(&src, 5.0);
        for pixel in out.pixels() {
            assert!(src.pixels().any(|p| p == pixel));
        }
        assert_eq!(crystallize(&src, 5.0), out);
    }

    #[test]
    fn vignette_darkens_corners_not_centre() {
        let src = RgbaImage::from_pixel(21, 21, Rgba([200, 200, 200, 255]));
        let out = vignette(&src, 0.5, 1.0);
        assert_eq!(out.get_pixel(10, 10).0, [200, 200, 200, 255]);
        assert!(out.get_pixel(0, 0).0[0] < 50);
    }

    #[test]
    fn vignette_radius_spans_centre_to_corner() {
        let src = RgbaImage::from_pixel(21, 21, Rgba([200, 200, 200, 255]));

        let halfway = vignette(&src, 100.0, 1.0);
        assert_eq!(halfway.get_pixel(10, 10).0, [200, 200, 200, 255]);
        assert!(halfway.get_pixel(0, 0).0[0] < 50);

        assert_eq!(vignette(&src, 200.0, 1.0), src);
    }

    #[test]
    fn unsharp_increases_local_contrast() {
        let src = RgbaImage::from_fn(9, 3, |x, _| {
            if x < 4 { Rgba([100, 100, 100, 255]) } else { Rgba([150, 150, 150, 255]) }
        });
        let out = unsharp_mask(&src, 1.5, 1.0);
        assert!(out.get_pixel(3, 1).0[0] < 100);
        assert!(out.get_pixel(4, 1).0[0] > 150);
    }
}
