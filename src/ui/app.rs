use std::sync::Arc;

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::error::MapError;
use crate::map::country::RiskFilter;
use crate::map::map::Map;
use crate::map::map_tile::{MapTile, TileKey};
use crate::maps_api::boundary_retriever::BoundaryRetriever;
use crate::maps_api::health_retriever::HealthRetriever;
use crate::maps_api::loader::DataLoader;
use crate::maps_api::retry::RetryPolicy;
use crate::maps_api::tile_retriever::TileRetriever;

use super::state::{LoadState, LoaderEvent, MapViewState};
use super::{legend, theme};

type TileResult = (TileKey, Result<MapTile, MapError>);

pub struct EpiMapApp {
    config: AppConfig,
    state: MapViewState,
    loader: DataLoader,
    tile_retriever: TileRetriever,
    loader_sender: mpsc::UnboundedSender<LoaderEvent>,
    loader_receiver: mpsc::UnboundedReceiver<LoaderEvent>,
    tile_sender: mpsc::UnboundedSender<TileResult>,
    tile_receiver: mpsc::UnboundedReceiver<TileResult>,
    runtime: tokio::runtime::Runtime,
    dark_mode: bool,
}

impl EpiMapApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Result<Self, std::io::Error> {
        cc.egui_ctx.set_style(theme::style(&cc.egui_ctx, false));

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .thread_name("epimap-fetcher")
            .enable_all()
            .build()?;

        let client = reqwest::Client::new();
        let loader = DataLoader::new(
            Arc::new(HealthRetriever::new(client.clone(), config.health_url.clone())),
            Arc::new(BoundaryRetriever::new(client.clone())),
            config.geo_primary_url.clone(),
            config.geo_backup_url.clone(),
            RetryPolicy::new(config.retry_count, config.backoff),
        );
        let tile_retriever = TileRetriever::new(client, config.tiles.clone());

        let (loader_sender, loader_receiver) = mpsc::unbounded_channel();
        let (tile_sender, tile_receiver) = mpsc::unbounded_channel();

        let mut app = Self {
            state: MapViewState::new(config.map.clone(), config.disease.clone()),
            config,
            loader,
            tile_retriever,
            loader_sender,
            loader_receiver,
            tile_sender,
            tile_receiver,
            runtime,
            dark_mode: false,
        };
        app.bootstrap(&cc.egui_ctx);
        Ok(app)
    }

    fn bootstrap(&mut self, ctx: &egui::Context) {
        let generation = self.state.bootstrap();
        log::info!("Initializing map (load {})", generation);
        self.spawn_load(generation, ctx);
    }

    fn spawn_load(&self, generation: u64, ctx: &egui::Context) {
        let loader = self.loader.clone();
        let sender = self.loader_sender.clone();
        let requester = ctx.clone();

        self.runtime.spawn(async move {
            let progress_sender = sender.clone();
            let progress_requester = requester.clone();
            let result = loader
                .load(tokio::time::sleep, move |progress| {
                    let _ = progress_sender.send(LoaderEvent::Progress { generation, progress });
                    progress_requester.request_repaint();
                })
                .await;

            if sender.send(LoaderEvent::Finished { generation, result }).is_err() {
                log::warn!("Load {} finished after the window closed", generation);
            }
            requester.request_repaint();
        });
    }

    fn request_tiles(&mut self, missing: Vec<TileKey>, ctx: &egui::Context) {
        let Some(view) = self.state.view_mut() else {
            return;
        };
        for key in missing {
            // Failed tiles stay pending so they are not asked for every frame
            if !view.tiles_mut().request(key) {
                continue;
            }
            let sender = self.tile_sender.clone();
            let tile_retriever = self.tile_retriever.clone();
            let requester = ctx.clone();

            self.runtime.spawn(async move {
                let (z, x, y) = key;
                let result = tile_retriever.fetch_tile(z, x, y).await;
                if sender.send((key, result)).is_ok() {
                    requester.request_repaint();
                }
            });
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.loader_receiver.try_recv() {
            self.state.handle_event(event, self.dark_mode);
        }

        while let Ok((key, result)) = self.tile_receiver.try_recv() {
            match result {
                Ok(tile) => {
                    if let Some(view) = self.state.view_mut() {
                        view.tiles_mut().insert(tile);
                    }
                }
                Err(e) => log::warn!("Error fetching tile {:?}: {}", key, e),
            }
        }
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        let mut reset = false;
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(format!("{} world map", self.config.disease));
                ui.separator();

                let mut filter = self.state.risk_filter();
                egui::ComboBox::from_label("Risk level")
                    .selected_text(filter_label(filter))
                    .show_ui(ui, |ui| {
                        for option in RiskFilter::ALL {
                            ui.selectable_value(&mut filter, option, filter_label(option));
                        }
                    });
                if filter != self.state.risk_filter() {
                    log::debug!("Risk filter changed to {}", filter);
                    self.state.apply_risk_filter(filter, self.dark_mode);
                }

                ui.separator();
                reset = ui.button("Reset view").clicked();

                if ui.checkbox(&mut self.dark_mode, "Dark mode").changed() {
                    ctx.set_style(theme::style(ctx, self.dark_mode));
                    self.state.restyle(self.dark_mode);
                }
            });
        });

        if reset {
            self.bootstrap(ctx);
        }
    }

    fn side_panel(&self, ctx: &egui::Context) {
        egui::SidePanel::right("info_panel")
            .resizable(false)
            .default_width(240.0)
            .show(ctx, |ui| {
                self.state.info().show(ui);
                ui.separator();
                legend::show_case_scale(ui);
                ui.add_space(8.0);
                legend::show_risk_levels(ui);
            });
    }

    fn map_panel(&mut self, ctx: &egui::Context) {
        let mut missing_tiles = Vec::new();
        let mut clicked = None;

        egui::CentralPanel::default().frame(egui::Frame::none()).show(ctx, |ui| {
            let size = ui.available_size();
            if let Some((view, layer)) = self.state.map_parts() {
                let map = Map::new(view, &mut missing_tiles, &mut clicked)
                    .layer(layer)
                    .viewport_size(size)
                    .tiles(self.tile_retriever.max_zoom(), &self.config.tiles.attribution);
                ui.add(map);
            }
        });

        self.request_tiles(missing_tiles, ctx);

        if let Some(index) = clicked {
            if let Some(target) = self.state.select_feature(index, self.dark_mode) {
                log::debug!(
                    "Fitting selection (date line: {}, max zoom {})",
                    target.crosses_date_line,
                    target.max_zoom
                );
            }
        }
    }

    fn load_overlay(&mut self, ctx: &egui::Context) {
        let (message, retry) = match self.state.load_state() {
            LoadState::Loading { message } => (message.clone(), false),
            LoadState::Failed { message, retry } => (message.clone(), *retry),
            LoadState::Idle | LoadState::Ready => return,
        };

        let mut try_again = false;
        egui::Window::new("Map data")
            .title_bar(false)
            .resizable(false)
            .collapsible(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if self.state.is_loading() {
                        ui.spinner();
                    }
                    ui.label(message);
                });
                if retry {
                    try_again = ui
                        .add_enabled(!self.state.is_loading(), egui::Button::new("Try Again"))
                        .clicked();
                }
            });

        if try_again {
            if let Some(generation) = self.state.request_retry() {
                log::info!("Retrying map data load (load {})", generation);
                self.spawn_load(generation, ctx);
            }
        }
    }
}

fn filter_label(filter: RiskFilter) -> &'static str {
    match filter {
        RiskFilter::All => "All",
        RiskFilter::Low => "Low",
        RiskFilter::Medium => "Medium",
        RiskFilter::High => "High",
    }
}

impl eframe::App for EpiMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // F11 toggles fullscreen
        if let Some(new_fullscreen) = ctx.input(|i| {
            if i.key_pressed(egui::Key::F11) {
                Some(!i.viewport().fullscreen.unwrap_or(false))
            } else {
                None
            }
        }) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(new_fullscreen));
            ctx.send_viewport_cmd(egui::ViewportCommand::Decorations(!new_fullscreen));
            ctx.send_viewport_cmd(egui::ViewportCommand::Maximized(!new_fullscreen));
            ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
        }

        self.drain_events();

        self.toolbar(ctx);
        self.side_panel(ctx);
        self.map_panel(ctx);
        self.load_overlay(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_filter_has_a_label() {
        let labels: Vec<_> = RiskFilter::ALL.iter().map(|f| filter_label(*f)).collect();
        assert_eq!(labels, ["All", "Low", "Medium", "High"]);
    }
}
