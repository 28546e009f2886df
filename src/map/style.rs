use egui::Color32;

use super::country::{RiskFilter, RiskTier};

/// Case-count colour scale, darkest first. A count strictly greater than the
/// threshold takes the colour; the last entry catches everything else.
pub const CASE_SCALE: [(u64, Color32); 7] = [
    (1_000_000, Color32::from_rgb(0x80, 0x00, 0x26)),
    (500_000, Color32::from_rgb(0xBD, 0x00, 0x26)),
    (100_000, Color32::from_rgb(0xE3, 0x1A, 0x1C)),
    (50_000, Color32::from_rgb(0xFC, 0x4E, 0x2A)),
    (10_000, Color32::from_rgb(0xFD, 0x8D, 0x3C)),
    (1_000, Color32::from_rgb(0xFE, 0xB2, 0x4C)),
    (0, Color32::from_rgb(0xFF, 0xED, 0xA0)),
];

pub const DASH_LENGTH: f32 = 3.0;

/// How one country shape is painted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureStyle {
    pub fill_color: Color32,
    pub fill_opacity: f32,
    pub stroke_color: Color32,
    pub stroke_opacity: f32,
    pub weight: f32,
    pub dashed: bool,
}

impl FeatureStyle {
    pub fn fill(&self) -> Color32 {
        self.fill_color.gamma_multiply(self.fill_opacity)
    }

    pub fn stroke(&self) -> egui::Stroke {
        egui::Stroke::new(self.weight, self.stroke_color.gamma_multiply(self.stroke_opacity))
    }

    /// Overwrites only the fields the override sets.
    pub fn apply(&mut self, o: &StyleOverride) {
        if let Some(v) = o.fill_opacity {
            self.fill_opacity = v;
        }
        if let Some(v) = o.stroke_color {
            self.stroke_color = v;
        }
        if let Some(v) = o.stroke_opacity {
            self.stroke_opacity = v;
        }
        if let Some(v) = o.weight {
            self.weight = v;
        }
        if let Some(v) = o.dashed {
            self.dashed = v;
        }
    }
}

/// Partial style update layered over a feature's current style.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StyleOverride {
    pub fill_opacity: Option<f32>,
    pub stroke_color: Option<Color32>,
    pub stroke_opacity: Option<f32>,
    pub weight: Option<f32>,
    pub dashed: Option<bool>,
}

/// Colour bucket for a case count.
pub fn case_color(cases: u64) -> Color32 {
    CASE_SCALE
        .iter()
        .find(|(threshold, _)| cases > *threshold)
        .map(|(_, color)| *color)
        .unwrap_or(CASE_SCALE[CASE_SCALE.len() - 1].1)
}

/// Default style of a country shape with the given case count.
pub fn style_for(cases: u64) -> FeatureStyle {
    FeatureStyle {
        fill_color: case_color(cases),
        fill_opacity: 0.7,
        stroke_color: Color32::WHITE,
        stroke_opacity: 1.0,
        weight: 1.0,
        dashed: true,
    }
}

/// Emphasis colour for selected or filtered-in shapes; follows the theme.
pub fn highlight_color(dark_mode: bool) -> Color32 {
    if dark_mode {
        Color32::WHITE
    } else {
        Color32::BLACK
    }
}

pub fn selection_style(dark_mode: bool) -> StyleOverride {
    StyleOverride {
        fill_opacity: Some(0.9),
        stroke_color: Some(highlight_color(dark_mode)),
        weight: Some(2.0),
        ..Default::default()
    }
}

/// Style a feature of tier `tier` gets while `filter` is active.
pub fn filter_style(filter: RiskFilter, tier: RiskTier, dark_mode: bool) -> StyleOverride {
    match filter.tier() {
        None => StyleOverride {
            stroke_opacity: Some(1.0),
            fill_opacity: Some(0.7),
            ..Default::default()
        },
        Some(wanted) if wanted == tier => StyleOverride {
            stroke_opacity: Some(1.0),
            fill_opacity: Some(0.9),
            weight: Some(2.0),
            stroke_color: Some(highlight_color(dark_mode)),
            dashed: Some(false),
        },
        Some(_) => StyleOverride {
            stroke_opacity: Some(0.2),
            fill_opacity: Some(0.1),
            weight: Some(1.0),
            stroke_color: Some(Color32::WHITE),
            dashed: Some(true),
        },
    }
}

/// Swatch colour for a risk tier in the filter control and legend.
pub fn risk_color(tier: RiskTier) -> Color32 {
    match tier {
        RiskTier::High => Color32::from_rgb(0xff, 0x44, 0x44),
        RiskTier::Medium => Color32::from_rgb(0xff, 0xa7, 0x26),
        RiskTier::Low => Color32::from_rgb(0x66, 0xbb, 0x6a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(cases: u64) -> usize {
        let color = style_for(cases).fill_color;
        CASE_SCALE.iter().position(|(_, c)| *c == color).unwrap()
    }

    #[test]
    fn breakpoints_are_strictly_greater_than() {
        assert_eq!(bucket(1_000_001), 0);
        assert_eq!(bucket(1_000_000), 1);
        assert_eq!(bucket(500_001), 1);
        assert_eq!(bucket(500_000), 2);
        assert_eq!(bucket(100_001), 2);
        assert_eq!(bucket(100_000), 3);
        assert_eq!(bucket(50_001), 3);
        assert_eq!(bucket(50_000), 4);
        assert_eq!(bucket(10_001), 4);
        assert_eq!(bucket(10_000), 5);
        assert_eq!(bucket(1_001), 5);
        assert_eq!(bucket(1_000), 6);
        assert_eq!(bucket(0), 6);
    }

    #[test]
    fn darkest_and_lightest_ends() {
        assert_eq!(style_for(u64::MAX).fill_color, Color32::from_rgb(0x80, 0x00, 0x26));
        assert_eq!(style_for(0).fill_color, Color32::from_rgb(0xFF, 0xED, 0xA0));
    }

    #[test]
    fn every_count_maps_to_one_of_seven_colors() {
        let mut seen = std::collections::HashSet::new();
        for cases in (0..2_000_000).step_by(997) {
            let style = style_for(cases);
            assert_eq!(style, style_for(cases));
            seen.insert(style.fill_color);
        }
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn base_style_matches_default_look() {
        let style = style_for(42);
        assert_eq!(style.fill_opacity, 0.7);
        assert_eq!(style.weight, 1.0);
        assert_eq!(style.stroke_color, Color32::WHITE);
        assert!(style.dashed);
    }

    #[test]
    fn override_only_touches_set_fields() {
        let mut style = style_for(0);
        style.apply(&selection_style(false));
        assert_eq!(style.fill_opacity, 0.9);
        assert_eq!(style.weight, 2.0);
        assert_eq!(style.stroke_color, Color32::BLACK);
        assert_eq!(style.stroke_opacity, 1.0);
        assert!(style.dashed);
        assert_eq!(style.fill_color, style_for(0).fill_color);
    }

    #[test]
    fn filter_styles() {
        let matched = filter_style(RiskFilter::High, RiskTier::High, true);
        assert_eq!(matched.fill_opacity, Some(0.9));
        assert_eq!(matched.stroke_color, Some(Color32::WHITE));

        let dimmed = filter_style(RiskFilter::High, RiskTier::Low, true);
        assert_eq!(dimmed.stroke_opacity, Some(0.2));
        assert_eq!(dimmed.fill_opacity, Some(0.1));

        let all = filter_style(RiskFilter::All, RiskTier::Medium, false);
        assert_eq!(all.stroke_opacity, Some(1.0));
        assert_eq!(all.fill_opacity, Some(0.7));
        assert_eq!(all.weight, None);
    }

    #[test]
    fn every_risk_tier_has_its_own_color() {
        let colors = [RiskTier::Low, RiskTier::Medium, RiskTier::High].map(risk_color);
        assert_eq!(colors[2], Color32::from_rgb(0xff, 0x44, 0x44));
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
    }
}
