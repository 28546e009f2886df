use egui::{Color32, Sense, Ui, Vec2};

use crate::map::country::RiskTier;
use crate::map::style::{risk_color, CASE_SCALE};

fn swatch(ui: &mut Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(Vec2::new(14.0, 14.0), Sense::hover());
    ui.painter().rect_filled(rect, 2.0, color);
}

/// Case-count colour scale, darkest bucket first.
pub fn show_case_scale(ui: &mut Ui) {
    ui.label("Confirmed cases");
    for (threshold, color) in CASE_SCALE {
        ui.horizontal(|ui| {
            swatch(ui, color);
            if threshold == 0 {
                ui.label("up to 1000");
            } else {
                ui.label(format!("more than {}", threshold));
            }
        });
    }
}

pub fn show_risk_levels(ui: &mut Ui) {
    ui.label("Risk level");
    for tier in [RiskTier::High, RiskTier::Medium, RiskTier::Low] {
        ui.horizontal(|ui| {
            swatch(ui, risk_color(tier));
            ui.label(tier.as_str());
        });
    }
}
