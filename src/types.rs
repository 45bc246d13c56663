use image::{ImageBuffer, Luma};
use nalgebra::Point2;

pub type Result<A> = core::result::Result<A, crate::Error>;
/// Corners ordered top-left, top-right, bottom-right, bottom-left
pub type Quad<A> = [Point2<A>; 4];
pub type LumaImg<A> = ImageBuffer<Luma<A>, Vec<A>>;
