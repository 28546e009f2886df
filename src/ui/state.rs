use crate::config::MapOptions;
use crate::error::MapError;
use crate::map::country::{CountryFeature, RiskFilter};
use crate::map::fit::{fit_target, FitTarget};
use crate::map::layer::CountryLayer;
use crate::map::map::MapView;
use crate::map::style::selection_style;
use crate::maps_api::loader::LoadProgress;

use super::info_panel::{InfoPanel, PanelFields};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load map data.";

/// What the loading indicator shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading { message: String },
    Ready,
    Failed { message: String, retry: bool },
}

/// Sent from a loader task back to the UI thread.
#[derive(Debug)]
pub enum LoaderEvent {
    Progress {
        generation: u64,
        progress: LoadProgress,
    },
    Finished {
        generation: u64,
        result: Result<Vec<CountryFeature>, MapError>,
    },
}

/// Everything the map operations read and write, owned by the app
/// controller and only touched from the UI thread.
pub struct MapViewState {
    options: MapOptions,
    disease: String,
    view: Option<MapView>,
    layer: Option<CountryLayer>,
    risk_filter: RiskFilter,
    load: LoadState,
    /// Bumped by every load; events from older loads are dropped.
    generation: u64,
    selected: Option<usize>,
    info: InfoPanel,
}

impl MapViewState {
    pub fn new(options: MapOptions, disease: String) -> Self {
        Self {
            options,
            disease,
            view: None,
            layer: None,
            risk_filter: RiskFilter::All,
            load: LoadState::Idle,
            generation: 0,
            selected: None,
            info: InfoPanel::default(),
        }
    }

    /// Tears down the current map view, if any, builds a fresh one and starts
    /// a new load. Returns the generation the caller must run the loader for.
    ///
    /// A load still in flight from before is superseded, not awaited.
    pub fn bootstrap(&mut self) -> u64 {
        if self.view.take().is_some() {
            log::info!("Removing previous map instance");
        }
        self.layer = None;
        self.selected = None;
        self.info = InfoPanel::default();
        self.view = Some(MapView::new(self.options.clone()));
        self.start_load()
    }

    /// Manual retry. Refused while a load is in flight.
    pub fn request_retry(&mut self) -> Option<u64> {
        if self.is_loading() {
            log::debug!("Ignoring retry while generation {} is loading", self.generation);
            return None;
        }
        Some(self.start_load())
    }

    fn start_load(&mut self) -> u64 {
        self.generation += 1;
        self.load = LoadState::Loading {
            message: LoadProgress::Loading.message(),
        };
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.load, LoadState::Loading { .. })
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn risk_filter(&self) -> RiskFilter {
        self.risk_filter
    }

    #[cfg(test)]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn info(&self) -> &InfoPanel {
        &self.info
    }

    #[cfg(test)]
    pub fn layer(&self) -> Option<&CountryLayer> {
        self.layer.as_ref()
    }

    #[cfg(test)]
    pub fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    pub fn view_mut(&mut self) -> Option<&mut MapView> {
        self.view.as_mut()
    }

    /// The map view together with the shapes it should draw.
    pub fn map_parts(&mut self) -> Option<(&mut MapView, Option<&CountryLayer>)> {
        let layer = self.layer.as_ref();
        self.view.as_mut().map(|view| (view, layer))
    }

    /// Applies a loader event. Returns false when it belonged to an older
    /// load and was dropped.
    pub fn handle_event(&mut self, event: LoaderEvent, dark_mode: bool) -> bool {
        match event {
            LoaderEvent::Progress { generation, progress } => {
                if generation != self.generation || !self.is_loading() {
                    return false;
                }
                self.load = LoadState::Loading {
                    message: progress.message(),
                };
                true
            }
            LoaderEvent::Finished { generation, result } => {
                if generation != self.generation {
                    log::debug!("Dropping result of superseded load {}", generation);
                    return false;
                }
                match result {
                    Ok(features) => {
                        log::info!("Rendering {} countries", features.len());
                        self.layer = Some(CountryLayer::new(features, generation));
                        self.selected = None;
                        self.apply_risk_filter(RiskFilter::All, dark_mode);
                        self.load = LoadState::Ready;
                    }
                    Err(e) => {
                        log::error!("Map data load failed: {}", e);
                        self.load = LoadState::Failed {
                            message: LOAD_FAILED_MESSAGE.to_string(),
                            retry: e.offers_manual_retry(),
                        };
                    }
                }
                true
            }
        }
    }

    /// Stores the filter and restyles the rendered countries for it.
    pub fn apply_risk_filter(&mut self, filter: RiskFilter, dark_mode: bool) {
        self.risk_filter = filter;
        if let Some(layer) = self.layer.as_mut() {
            layer.apply_risk_filter(filter, dark_mode);
        }
    }

    /// Re-applies the current filter, or the selection highlight when a
    /// country is selected, after the theme changed.
    pub fn restyle(&mut self, dark_mode: bool) {
        let Some(layer) = self.layer.as_mut() else {
            return;
        };
        match self.selected {
            Some(index) => {
                layer.reset_all_styles();
                layer.set_style(index, &selection_style(dark_mode));
            }
            None => layer.apply_risk_filter(self.risk_filter, dark_mode),
        }
    }

    /// Click on a country: emphasise it, fill the info panel and move the
    /// view onto it. Ignored when the layer belongs to a superseded load.
    pub fn select_feature(&mut self, index: usize, dark_mode: bool) -> Option<FitTarget> {
        let layer = self.layer.as_mut()?;
        if layer.generation() != self.generation || layer.feature(index).is_none() {
            return None;
        }

        layer.reset_all_styles();
        layer.set_style(index, &selection_style(dark_mode));
        self.selected = Some(index);

        let feature = layer.feature(index)?;
        log::debug!(
            "Selected {} ({})",
            feature.display_name(),
            feature.iso3.as_deref().unwrap_or("no ISO3 code")
        );
        self.info.update(&PanelFields::from_feature(feature, &self.disease));

        let target = fit_target(feature);
        if let (Some(view), Some(target)) = (self.view.as_mut(), target.as_ref()) {
            view.fit_bounds(target);
        }
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::country::tests::{collection, sample_health, SAMPLE};
    use crate::map::country::{merge_health, RiskTier};
    use crate::map::style::style_for;

    fn features() -> Vec<CountryFeature> {
        merge_health(collection(SAMPLE), &sample_health())
    }

    fn state() -> MapViewState {
        MapViewState::new(MapOptions::default(), "COVID-19".to_string())
    }

    fn loaded() -> MapViewState {
        let mut state = state();
        let generation = state.bootstrap();
        assert!(state.handle_event(
            LoaderEvent::Finished {
                generation,
                result: Ok(features()),
            },
            false,
        ));
        state
    }

    #[test]
    fn bootstrap_replaces_the_previous_view() {
        let mut state = state();
        assert!(state.view().is_none());

        let first = state.bootstrap();
        let center = state.options.initial_center;
        state.view_mut().unwrap().set_view(center, 7.0);
        let second = state.bootstrap();

        assert_eq!(second, first + 1);
        assert_eq!(state.view().unwrap().zoom(), 3.0);
        assert!(state.is_loading());
    }

    #[test]
    fn successful_load_renders_and_clears_the_indicator() {
        let state = loaded();
        assert_eq!(state.load_state(), &LoadState::Ready);
        assert_eq!(state.layer().unwrap().len(), 3);
        assert_eq!(state.risk_filter(), RiskFilter::All);
    }

    #[test]
    fn exhausted_load_shows_manual_retry_and_renders_nothing() {
        let mut state = state();
        let generation = state.bootstrap();
        state.handle_event(
            LoaderEvent::Progress {
                generation,
                progress: LoadProgress::Retrying { attempt: 3, of: 3 },
            },
            false,
        );
        state.handle_event(
            LoaderEvent::Finished {
                generation,
                result: Err(MapError::GeometryExhausted {
                    attempts: 3,
                    last: Box::new(MapError::GeometryFetchFailed("GeoJSON error: 503".to_string())),
                }),
            },
            false,
        );

        assert_eq!(
            state.load_state(),
            &LoadState::Failed {
                message: LOAD_FAILED_MESSAGE.to_string(),
                retry: true,
            }
        );
        assert!(state.layer().is_none());
    }

    #[test]
    fn progress_updates_the_indicator_text() {
        let mut state = state();
        let generation = state.bootstrap();
        state.handle_event(
            LoaderEvent::Progress {
                generation,
                progress: LoadProgress::Retrying { attempt: 1, of: 3 },
            },
            false,
        );
        assert_eq!(
            state.load_state(),
            &LoadState::Loading {
                message: "Retrying... (1/3)".to_string()
            }
        );
    }

    #[test]
    fn retry_is_refused_while_loading() {
        let mut state = state();
        let generation = state.bootstrap();
        assert_eq!(state.request_retry(), None);
        assert_eq!(state.generation(), generation);

        state.handle_event(
            LoaderEvent::Finished {
                generation,
                result: Err(MapError::StatsFetchFailed("offline".to_string())),
            },
            false,
        );
        assert_eq!(state.request_retry(), Some(generation + 1));
        assert!(state.is_loading());
    }

    #[test]
    fn results_from_a_superseded_load_are_dropped() {
        let mut state = state();
        let stale = state.bootstrap();
        let current = state.bootstrap();

        assert!(!state.handle_event(
            LoaderEvent::Finished {
                generation: stale,
                result: Ok(features()),
            },
            false,
        ));
        assert!(state.layer().is_none());
        assert!(state.is_loading());

        assert!(state.handle_event(
            LoaderEvent::Finished {
                generation: current,
                result: Ok(features()),
            },
            false,
        ));
        assert!(state.layer().is_some());
    }

    #[test]
    fn selecting_a_country_highlights_it_and_fills_the_panel() {
        let mut state = loaded();
        let target = state.select_feature(0, false).unwrap();

        assert_eq!(state.selected(), Some(0));
        assert_eq!(state.info().location(), "France");
        assert_eq!(state.info().disease(), "COVID-19");
        assert_eq!(state.info().cases(), "2000000");
        assert!(!target.crosses_date_line);

        let layer = state.layer().unwrap();
        let selected = layer.style(0).unwrap();
        assert_eq!(selected.weight, 2.0);
        assert_eq!(selected.fill_opacity, 0.9);
        for index in 1..layer.len() {
            let feature = layer.feature(index).unwrap();
            assert_eq!(*layer.style(index).unwrap(), style_for(feature.cases));
        }
    }

    #[test]
    fn selecting_a_date_line_country_uses_the_adjusted_box() {
        let mut state = loaded();
        let target = state.select_feature(2, true).unwrap();
        assert!(target.crosses_date_line);
        assert_eq!(target.bounds.west(), 170.0);
        assert_eq!(target.bounds.east(), 190.0);
    }

    #[test]
    fn selection_is_ignored_once_a_reload_started() {
        let mut state = loaded();
        state.load = LoadState::Failed {
            message: LOAD_FAILED_MESSAGE.to_string(),
            retry: true,
        };
        state.request_retry().unwrap();

        assert!(state.select_feature(0, false).is_none());
        assert_eq!(state.info(), &InfoPanel::default());
    }

    #[test]
    fn filter_keeps_only_matching_tier_emphasised() {
        let mut state = loaded();
        state.apply_risk_filter(RiskFilter::Medium, false);
        assert_eq!(state.risk_filter(), RiskFilter::Medium);

        let layer = state.layer().unwrap();
        for (feature, style) in layer.iter() {
            let emphasised = style.fill_opacity == 0.9 && style.stroke_opacity == 1.0;
            assert_eq!(emphasised, feature.risk == RiskTier::Medium);
        }

        state.apply_risk_filter(RiskFilter::All, false);
        for (_, style) in state.layer().unwrap().iter() {
            assert_eq!(style.stroke_opacity, 1.0);
            assert_eq!(style.fill_opacity, 0.7);
        }
    }

    #[test]
    fn theme_change_recolours_the_selection() {
        let mut state = loaded();
        state.select_feature(0, false);
        assert_eq!(state.layer().unwrap().style(0).unwrap().stroke_color, egui::Color32::BLACK);

        state.restyle(true);
        let layer = state.layer().unwrap();
        assert_eq!(layer.style(0).unwrap().stroke_color, egui::Color32::WHITE);
        assert_eq!(layer.style(0).unwrap().weight, 2.0);
    }

    #[test]
    fn filter_is_stored_even_without_a_layer() {
        let mut state = state();
        state.apply_risk_filter(RiskFilter::High, false);
        assert_eq!(state.risk_filter(), RiskFilter::High);
    }
}
