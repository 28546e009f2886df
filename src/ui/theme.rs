use egui::{
    style::{Selection, Visuals, WidgetVisuals, Widgets},
    Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle,
};

/// Application chrome for the given mode.
pub fn style(ctx: &egui::Context, dark_mode: bool) -> Style {
    if dark_mode {
        dark_style(ctx)
    } else {
        let mut style = (*ctx.style()).clone();
        style.text_styles = text_styles();
        style.visuals = Visuals::light();
        style
    }
}

fn text_styles() -> std::collections::BTreeMap<TextStyle, FontId> {
    [
        (TextStyle::Heading, FontId::new(20.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(15.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(14.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(15.0, FontFamily::Proportional)),
        (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
    ]
    .into()
}

fn widget(bg_fill: Color32, bg_stroke: Stroke, fg: Color32, expansion: f32) -> WidgetVisuals {
    WidgetVisuals {
        bg_fill,
        weak_bg_fill: Color32::from_gray(32),
        bg_stroke,
        fg_stroke: Stroke::new(1.0, fg),
        rounding: Rounding::same(4.0),
        expansion,
    }
}

fn dark_style(ctx: &egui::Context) -> Style {
    let mut style = (*ctx.style()).clone();
    style.text_styles = text_styles();

    let primary_bg_color = Color32::from_rgb(32, 33, 36);

    style.visuals = Visuals::dark();
    style.visuals.override_text_color = Some(Color32::LIGHT_GRAY);
    style.visuals.widgets = Widgets {
        noninteractive: widget(primary_bg_color, Stroke::new(1.0, Color32::from_gray(60)), Color32::LIGHT_GRAY, 0.0),
        inactive: widget(primary_bg_color, Stroke::new(1.0, Color32::from_gray(75)), Color32::LIGHT_GRAY, 0.0),
        hovered: widget(Color32::from_rgb(50, 50, 50), Stroke::new(1.0, Color32::WHITE), Color32::WHITE, 0.5),
        active: widget(Color32::from_rgb(60, 60, 60), Stroke::new(1.0, Color32::WHITE), Color32::WHITE, 2.0),
        open: widget(Color32::from_rgb(40, 40, 40), Stroke::new(1.0, Color32::WHITE), Color32::WHITE, 0.0),
    };

    style.visuals.selection = Selection {
        bg_fill: Color32::from_rgb(75, 75, 75),
        stroke: Stroke::new(1.0, Color32::WHITE),
    };

    style.visuals.window_rounding = Rounding::same(6.0);
    style.visuals.window_shadow = egui::Shadow {
        offset: egui::vec2(0.0, 1.0),
        blur: 3.0,
        spread: 0.0,
        color: Color32::from_black_alpha(128),
    };
    style.visuals.window_fill = primary_bg_color;
    style.visuals.window_stroke = Stroke::new(1.0, Color32::from_gray(60));
    style.visuals.panel_fill = primary_bg_color;

    style.spacing.window_margin = egui::Margin::same(8.0);

    style
}
