use super::{homography::Homography, types::*};
use image::Luma;
use nalgebra::{point, Point2};
use rand::Rng;

/// The exact corners of a `width` by `height` image
pub fn image_corners(width: u32, height: u32) -> Quad<f64> {
    let (w, h) = (width as f64, height as f64);
    [point!(0., 0.), point!(w, 0.), point!(w, h), point!(0., h)]
}

/// Pulls every image corner inward by a random offset of at most `strength`
/// times the image dimension. Eight draws are taken, an x/y pair per corner
/// in corner order, each uniform in `[0, max)`
pub fn random_quad<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    strength: f64,
    rng: &mut R,
) -> Quad<f64> {
    let (w, h) = (width as f64, height as f64);
    let (max_dx, max_dy) = (w * strength, h * strength);

    let mut offset = |max: f64| rng.gen::<f64>() * max;
    let mut pair = || (offset(max_dx), offset(max_dy));
    let [(dx0, dy0), (dx1, dy1), (dx2, dy2), (dx3, dy3)] = [pair(), pair(), pair(), pair()];

    [
        point!(dx0, dy0),
        point!(w - dx1, dy1),
        point!(w - dx2, h - dy2),
        point!(dx3, h - dy3),
    ]
}

/// Resamples `image` through `transform` into a raster of the same size.
///
/// Every output pixel is mapped back through the inverse transform and
/// sampled bilinearly. Samples falling outside the source take the `fill`
/// value, including the missing neighbours of pixels near the border
pub fn warp_perspective(
    image: &LumaImg<u8>,
    transform: &Homography,
    fill: Luma<u8>,
) -> core::result::Result<LumaImg<u8>, &'static str> {
    let inverse = transform.inverse().ok_or("homography is not invertible")?;
    let (width, height) = image.dimensions();

    Ok(LumaImg::from_fn(width, height, |x, y| {
        let value = inverse
            .apply(point!(x as f64, y as f64))
            .map_or(fill[0], |src| sample_bilinear(image, src, fill[0]));
        Luma([value])
    }))
}

fn sample_bilinear(image: &LumaImg<u8>, at: Point2<f64>, fill: u8) -> u8 {
    let (width, height) = (image.width() as i64, image.height() as i64);
    if !(at.x.is_finite() && at.y.is_finite()) {
        return fill;
    }

    let (x0, y0) = (at.x.floor(), at.y.floor());
    if x0 < -1. || y0 < -1. || x0 >= width as f64 || y0 >= height as f64 {
        return fill;
    }

    let (fx, fy) = (at.x - x0, at.y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);
    let raw = image.as_raw();
    let get = |x: i64, y: i64| {
        if x < 0 || y < 0 || x >= width || y >= height {
            fill as f64
        } else {
            raw[(y * width + x) as usize] as f64
        }
    };

    let (p00, p10) = (get(x0, y0), get(x0 + 1, y0));
    let (p01, p11) = (get(x0, y0 + 1), get(x0 + 1, y0 + 1));

    let top = p00 + fx * (p10 - p00);
    let bottom = p01 + fx * (p11 - p01);
    (top + fy * (bottom - top)).round().clamp(0., 255.) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{board, config::BoardConfig};
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn zero_strength_keeps_the_corners() {
        let mut rng = Pcg64::seed_from_u64(3);
        let quad = random_quad(960, 720, 0.0, &mut rng);
        assert_eq!(quad, image_corners(960, 720));
    }

    #[test]
    fn corners_move_inward_within_bounds() {
        let (w, h, strength) = (400., 300., 0.25);
        let mut rng = Pcg64::seed_from_u64(0xC0FFEE);

        for _ in 0..200 {
            let [tl, tr, br, bl] = random_quad(400, 300, strength, &mut rng);
            let (max_dx, max_dy) = (w * strength, h * strength);

            assert!((0.0..max_dx).contains(&tl.x) && (0.0..max_dy).contains(&tl.y));
            assert!(tr.x > w - max_dx && tr.x <= w && (0.0..max_dy).contains(&tr.y));
            assert!(br.x > w - max_dx && br.x <= w && br.y > h - max_dy && br.y <= h);
            assert!((0.0..max_dx).contains(&bl.x) && bl.y > h - max_dy && bl.y <= h);
        }
    }

    #[test]
    fn draws_follow_corner_order() {
        let (w, h, strength) = (100., 50., 0.5);
        let quad = random_quad(100, 50, strength, &mut Pcg64::seed_from_u64(11));

        let mut rng = Pcg64::seed_from_u64(11);
        let mut draws = [0.; 8];
        draws.iter_mut().for_each(|d| *d = rng.gen::<f64>());
        let (mx, my) = (w * strength, h * strength);

        assert_relative_eq!(quad[0], point!(draws[0] * mx, draws[1] * my));
        assert_relative_eq!(quad[1], point!(w - draws[2] * mx, draws[3] * my));
        assert_relative_eq!(quad[2], point!(w - draws[4] * mx, h - draws[5] * my));
        assert_relative_eq!(quad[3], point!(draws[6] * mx, h - draws[7] * my));
    }

    #[test]
    fn identity_warp_reproduces_the_image() {
        let config = BoardConfig::new(6, 4, 9).with_margin(0);
        let canvas = board::build_canvas(&config).unwrap();

        let corners = image_corners(canvas.width(), canvas.height());
        let h = Homography::from_quads(&corners, &corners).unwrap();
        let warped = warp_perspective(&canvas, &h, board::WHITE).unwrap();

        assert_eq!(warped.dimensions(), canvas.dimensions());
        assert_eq!(warped.as_raw(), canvas.as_raw());
    }

    #[test]
    fn translation_fills_uncovered_area_white() {
        let canvas = LumaImg::from_pixel(20, 10, Luma([0u8]));
        #[rustfmt::skip]
        let shift = Homography(nalgebra::Matrix3::new(
            1., 0., 5.,
            0., 1., 0.,
            0., 0., 1.,
        ));
        let warped = warp_perspective(&canvas, &shift, board::WHITE).unwrap();

        for y in 0..10 {
            for x in 0..4 {
                assert_eq!(warped.get_pixel(x, y)[0], 255, "pixel ({x}, {y})");
            }
            for x in 5..20 {
                assert_eq!(warped.get_pixel(x, y)[0], 0, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn half_pixel_shift_blends_neighbours() {
        let mut canvas = LumaImg::from_pixel(4, 1, Luma([0u8]));
        canvas.put_pixel(2, 0, Luma([200]));
        #[rustfmt::skip]
        let shift = Homography(nalgebra::Matrix3::new(
            1., 0., -0.5,
            0., 1., 0.,
            0., 0., 1.,
        ));
        let warped = warp_perspective(&canvas, &shift, board::WHITE).unwrap();

        // output x samples the source at x + 0.5
        assert_eq!(warped.get_pixel(0, 0)[0], 0);
        assert_eq!(warped.get_pixel(1, 0)[0], 100);
        assert_eq!(warped.get_pixel(2, 0)[0], 100);
        assert_eq!(warped.get_pixel(3, 0)[0], 128);
    }

    #[test]
    fn singular_transform_is_rejected() {
        let canvas = LumaImg::from_pixel(4, 4, Luma([0u8]));
        let flat = Homography(nalgebra::Matrix3::zeros());
        assert!(warp_perspective(&canvas, &flat, board::WHITE).is_err());
    }
}
