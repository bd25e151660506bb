mod app;
mod theme;
mod views;

pub use app::TimeTrackerApp;
pub use theme::{setup_fonts, setup_theme};

const ICON_SIZE: u32 = 32;

/// Clock-face icon shared by the window and the tray, as raw RGBA.
pub fn icon_rgba() -> (Vec<u8>, u32, u32) {
    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let radius = ICON_SIZE as f32 / 2.0 - 1.0;
    let image = image::RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let dist = (dx * dx + dy * dy).sqrt();
        let on_hour_hand = dx.abs() < 1.5 && dy <= 0.0 && -dy < radius * 0.55;
        let on_minute_hand = dy.abs() < 1.5 && dx >= 0.0 && dx < radius * 0.75;

        if dist > radius {
            image::Rgba([0, 0, 0, 0])
        } else if dist > radius - 2.5 || on_hour_hand || on_minute_hand {
            image::Rgba([240, 240, 240, 255])
        } else {
            image::Rgba([19, 152, 244, 255])
        }
    });
    (image.into_raw(), ICON_SIZE, ICON_SIZE)
}
