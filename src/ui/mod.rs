pub mod app;
pub mod info_panel;
pub mod legend;
pub mod state;
pub mod theme;
