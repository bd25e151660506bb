use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

pub const ERROR_COLOR: Color32 = Color32::from_rgb(0xff, 0x44, 0x44);
pub const SUCCESS_COLOR: Color32 = Color32::from_rgb(0x65, 0xba, 0x43);
pub const ACCENT_COLOR: Color32 = Color32::from_rgb(19, 152, 244);

pub fn setup_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    // Phosphor icons as fallback in the Proportional family
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);

    ctx.set_fonts(fonts);
}

pub fn setup_theme(ctx: &egui::Context) {
    let mut style = Style::default();

    let mut visuals = Visuals::dark();

    let bg = Color32::from_rgb(30, 30, 30);
    let fg = Color32::from_rgb(240, 240, 240);
    visuals.panel_fill = bg;
    visuals.window_fill = bg;
    visuals.faint_bg_color = Color32::from_rgb(36, 36, 36);
    visuals.extreme_bg_color = Color32::from_rgb(40, 40, 40); // text inputs
    visuals.override_text_color = Some(fg);

    visuals.widgets.noninteractive.bg_fill = bg;
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, fg);

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(60, 60, 60);
    visuals.widgets.inactive.weak_bg_fill = Color32::from_rgb(60, 60, 60);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, fg);

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(80, 80, 80);
    visuals.widgets.hovered.weak_bg_fill = Color32::from_rgb(80, 80, 80);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.widgets.active.bg_fill = ACCENT_COLOR;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.selection.bg_fill = ACCENT_COLOR;
    visuals.selection.stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.widgets.noninteractive.rounding = Rounding::same(4.0);
    visuals.widgets.inactive.rounding = Rounding::same(4.0);
    visuals.widgets.hovered.rounding = Rounding::same(4.0);
    visuals.widgets.active.rounding = Rounding::same(4.0);
    visuals.window_rounding = Rounding::same(6.0);

    style.visuals = visuals;

    style.text_styles = [
        (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(16.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(14.0, FontFamily::Monospace)),
    ]
    .into();

    style.spacing.item_spacing = egui::vec2(10.0, 6.0);
    style.spacing.button_padding = egui::vec2(12.0, 8.0);
    style.spacing.window_margin = egui::Margin::same(16.0);

    ctx.set_style(style);
}

/// Returns (content_bg, frame_color) for dialogs
pub fn dialog_colors() -> (Color32, Color32) {
    (
        Color32::from_rgb(30, 30, 30),
        Color32::from_rgb(60, 60, 60),
    )
}

pub fn dialog_frame() -> egui::Frame {
    let (content_bg, frame_color) = dialog_colors();
    egui::Frame::none()
        .fill(content_bg)
        .stroke(Stroke::new(2.0, frame_color))
        .rounding(Rounding::same(8.0))
        .inner_margin(egui::Margin::same(20.0))
}
