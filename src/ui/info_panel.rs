use egui::{Grid, RichText, Ui};

use crate::map::country::CountryFeature;

pub const UNKNOWN_LOCATION: &str = "Unknown";
pub const NO_DATA: &str = "No data";

/// Values for the info panel. Anything left `None` shows its fallback text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelFields<'a> {
    pub location: Option<&'a str>,
    pub disease: Option<&'a str>,
    pub cases: Option<u64>,
    pub deaths: Option<u64>,
    pub recovered: Option<u64>,
}

impl<'a> PanelFields<'a> {
    pub fn from_feature(feature: &'a CountryFeature, disease: &'a str) -> Self {
        Self {
            location: feature.name.as_deref(),
            disease: Some(disease),
            cases: Some(feature.cases),
            deaths: Some(feature.deaths),
            recovered: Some(feature.recovered),
        }
    }
}

/// Text shown for the selected country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoPanel {
    location: String,
    disease: String,
    cases: String,
    deaths: Option<String>,
    recovered: Option<String>,
}

impl Default for InfoPanel {
    fn default() -> Self {
        Self {
            location: "Select a country".to_string(),
            disease: NO_DATA.to_string(),
            cases: "0".to_string(),
            deaths: None,
            recovered: None,
        }
    }
}

impl InfoPanel {
    /// Overwrites every field.
    pub fn update(&mut self, fields: &PanelFields<'_>) {
        self.location = fields.location.unwrap_or(UNKNOWN_LOCATION).to_string();
        self.disease = fields.disease.unwrap_or(NO_DATA).to_string();
        self.cases = fields.cases.map(|c| c.to_string()).unwrap_or_else(|| "0".to_string());
        self.deaths = fields.deaths.map(|d| d.to_string());
        self.recovered = fields.recovered.map(|r| r.to_string());
    }

    #[cfg(test)]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[cfg(test)]
    pub fn disease(&self) -> &str {
        &self.disease
    }

    #[cfg(test)]
    pub fn cases(&self) -> &str {
        &self.cases
    }

    pub fn show(&self, ui: &mut Ui) {
        ui.heading("Selected region");
        ui.add_space(4.0);
        Grid::new("info_panel_grid")
            .num_columns(2)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                ui.label("Location");
                ui.label(RichText::new(&self.location).strong());
                ui.end_row();

                ui.label("Disease");
                ui.label(&self.disease);
                ui.end_row();

                ui.label("Cases");
                ui.label(RichText::new(&self.cases).monospace());
                ui.end_row();

                if let Some(deaths) = &self.deaths {
                    ui.label("Deaths");
                    ui.label(RichText::new(deaths).monospace());
                    ui.end_row();
                }
                if let Some(recovered) = &self.recovered {
                    ui.label("Recovered");
                    ui.label(RichText::new(recovered).monospace());
                    ui.end_row();
                }
            });
    }
}
