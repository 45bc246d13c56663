use super::{config::BoardConfig, types::*};
use image::Luma;
use imageproc::{drawing, rect::Rect};

pub const WHITE: Luma<u8> = Luma([u8::MAX]);
pub const BLACK: Luma<u8> = Luma([u8::MIN]);

/// Draws the checkerboard described by `config` on a white canvas. Cell
/// `(0, 0)` stays white and every cell with odd `x + y` is filled black
pub fn build_canvas(config: &BoardConfig) -> Result<LumaImg<u8>> {
    config.validate()?;
    let (width, height) = config.canvas_size()?;

    let mut canvas = LumaImg::from_pixel(width, height, WHITE);
    for y in 0..config.squares_y {
        for x in 0..config.squares_x {
            if (x + y) % 2 == 1 {
                let (px, py) = config.cell_origin(x, y);
                let cell = Rect::at(px as i32, py as i32)
                    .of_size(config.square_size, config.square_size);
                drawing::draw_filled_rect_mut(&mut canvas, cell, BLACK);
            }
        }
    }

    log::debug!(
        "drew {}x{} board on a {width}x{height} canvas",
        config.squares_x,
        config.squares_y
    );
    Ok(canvas)
}
