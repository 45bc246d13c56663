use super::types::Quad;
use itertools::izip;
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector2, SVD};

/// Projective transform between two planes, normalized so that `h[(2, 2)] == 1`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography(pub Matrix3<f64>);

impl Homography {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// Attempts to calculate the unique projection matrix that maps each
    /// corner of `src` onto the matching corner of `dst`
    pub fn from_quads(src: &Quad<f64>, dst: &Quad<f64>) -> Result<Self, &'static str> {
        if is_degenerate(src) {
            return Err("source corners are collinear");
        }
        if is_degenerate(dst) {
            return Err("destination corners are collinear");
        }

        let (t_src, t_dst) = (normalization(src), normalization(dst));

        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for (i, f, t) in izip!(0.., src, dst) {
            let (f, t) = (t_src.transform_point(f), t_dst.transform_point(t));
            let (rx, ry) = (2 * i, 2 * i + 1);
            let x_row = [f.x, f.y, 1., 0., 0., 0., -t.x * f.x, -t.x * f.y];
            let y_row = [0., 0., 0., f.x, f.y, 1., -t.y * f.x, -t.y * f.y];
            for (j, (xv, yv)) in x_row.into_iter().zip(y_row).enumerate() {
                a[(rx, j)] = xv;
                a[(ry, j)] = yv;
            }
            b[rx] = t.x;
            b[ry] = t.y;
        }

        let svd = SVD::try_new(a, true, true, f64::EPSILON, 0)
            .ok_or("could not compute the singular value decomposition")?;

        let sv = &svd.singular_values;
        if sv.min() <= sv.max() * 1e-12 {
            return Err("corner correspondences do not determine a unique homography");
        }

        let h = svd.solve(&b, f64::EPSILON)?;
        let hn = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);

        // undo the normalization: H = T_dst^-1 * Hn * T_src
        let t_dst_inv = t_dst
            .try_inverse()
            .ok_or("destination normalization is singular")?;
        let m = t_dst_inv * hn * t_src;
        let w = m[(2, 2)];
        if w.abs() < f64::EPSILON {
            return Err("homography sends the origin to infinity");
        }
        let m = m / w;

        if !m.iter().all(|v| v.is_finite()) {
            return Err("homography has non-finite coefficients");
        }
        if m.try_inverse().is_none() {
            return Err("homography is singular");
        }

        log::trace!("solved homography {m}");
        Ok(Self(m))
    }

    /// Maps a point through the transform, `None` when it lands on the line at infinity
    pub fn apply(&self, p: Point2<f64>) -> Option<Point2<f64>> {
        Point2::from_homogeneous(self.0 * p.to_homogeneous())
    }

    pub fn inverse(&self) -> Option<Self> {
        let inv = self.0.try_inverse()?;
        let w = inv[(2, 2)];
        if w.abs() < f64::EPSILON {
            return Some(Self(inv));
        }
        Some(Self(inv / w))
    }
}

/// Conditioning transform: moves the centroid to the origin and scales each
/// axis so the mean absolute deviation becomes one
fn normalization(quad: &Quad<f64>) -> Matrix3<f64> {
    let c = quad.iter().map(|p| p.coords).sum::<Vector2<f64>>() / 4.;
    let s = quad.iter().map(|p| (p.coords - c).abs()).sum::<Vector2<f64>>() / 4.;
    let (sx, sy) = (1. / s.x, 1. / s.y);
    Matrix3::new(sx, 0., -c.x * sx, 0., sy, -c.y * sy, 0., 0., 1.)
}

/// A quad is unusable for a 4-point solve when any three of its corners are collinear
fn is_degenerate(quad: &Quad<f64>) -> bool {
    let (min, max) = quad.iter().fold(
        (Point2::new(f64::MAX, f64::MAX), Point2::new(f64::MIN, f64::MIN)),
        |(lo, hi), p| (lo.inf(p), hi.sup(p)),
    );
    let extent = (max - min).norm_squared();
    if extent <= f64::EPSILON {
        return true;
    }

    let cross = |a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>| {
        let (u, v) = (b - a, c - a);
        (u.x * v.y - u.y * v.x).abs()
    };

    let [p0, p1, p2, p3] = quad;
    [(p0, p1, p2), (p1, p2, p3), (p2, p3, p0), (p3, p0, p1)]
        .into_iter()
        .any(|(a, b, c)| cross(a, b, c) <= 1e-9 * extent)
}
