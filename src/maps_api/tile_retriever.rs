use crate::config::TileLayerOptions;
use crate::error::MapError;
use crate::map::map_tile::MapTile;

#[derive(Debug, Clone)]
pub struct TileRetriever {
    client: reqwest::Client,
    options: TileLayerOptions,
}

impl TileRetriever {
    pub fn new(client: reqwest::Client, options: TileLayerOptions) -> Self {
        Self { client, options }
    }

    pub fn max_zoom(&self) -> u32 {
        self.options.max_zoom
    }

    /// Fills the `{s}`, `{z}`, `{x}`, `{y}` and `{r}` placeholders.
    pub fn tile_url(&self, zoom: u32, x: u32, y: u32) -> String {
        let subdomain = match self.options.subdomains.len() {
            0 => "",
            n => self.options.subdomains[((x + y) as usize) % n].as_str(),
        };
        self.options
            .url_template
            .replace("{s}", subdomain)
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{r}", &self.options.retina_suffix)
    }

    /// Asynchronously fetches a tile and decodes it into a MapTile.
    pub async fn fetch_tile(&self, zoom: u32, x: u32, y: u32) -> Result<MapTile, MapError> {
        let failed = |reason: String| MapError::TileFetchFailed { z: zoom, x, y, reason };

        let url = self.tile_url(zoom, x, y);
        log::debug!("Fetching tile from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("status {}", response.status())));
        }

        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

        let image = image::load_from_memory(&bytes)
            .map_err(|e| failed(e.to_string()))?
            .to_rgba8();
        let size = [image.width() as usize, image.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());

        Ok(MapTile::new(x, y, zoom, color_image))
    }
}
