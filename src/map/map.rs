use egui::epaint::{Color32, Mesh, Pos2, Rect, Shape};
use egui::{vec2, Align2, FontId, Response, Sense, Ui, Vec2, Widget};

use crate::config::MapOptions;

use super::fit::FitTarget;
use super::geo::{project, unproject, world_size, Coordinate, TILE_SIZE};
use super::layer::{CountryLayer, FillMesh};
use super::map_tile::{TileCache, TileKey};
use super::style::DASH_LENGTH;

/// Points closer than this on screen are merged while drawing.
const MIN_SEGMENT_PX: f32 = 0.75;

/// Camera and base-layer state of one map instance.
///
/// Dropping it releases every tile texture it holds.
pub struct MapView {
    options: MapOptions,
    center: Coordinate,
    zoom: f64,
    viewport: Vec2,
    tiles: TileCache,
}

impl MapView {
    pub fn new(options: MapOptions) -> Self {
        let mut view = Self {
            center: options.initial_center,
            zoom: options.initial_zoom,
            options,
            viewport: Vec2::ZERO,
            tiles: TileCache::default(),
        };
        view.clamp_center();
        view
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn tiles_mut(&mut self) -> &mut TileCache {
        &mut self.tiles
    }

    pub fn set_viewport(&mut self, size: Vec2) {
        if self.viewport != size {
            self.viewport = size;
            self.clamp_center();
        }
    }

    pub fn set_view(&mut self, center: Coordinate, zoom: f64) {
        self.zoom = zoom.clamp(self.options.min_zoom, self.options.max_zoom);
        self.center = center.wrapped();
        self.clamp_center();
    }

    /// Zooms by whole snap steps around the current centre.
    pub fn zoom_by(&mut self, steps: f64) {
        let zoom = self.snap(self.zoom) + steps * self.options.zoom_snap;
        self.set_view(self.center, zoom);
    }

    /// Moves the map with the pointer: content follows `delta` screen pixels.
    pub fn pan_by(&mut self, delta: Vec2) {
        let (x, y) = project(&self.center, self.zoom);
        self.center = unproject(x - delta.x as f64, y - delta.y as f64, self.zoom).wrapped();
        self.clamp_center();
    }

    /// Largest snapped zoom showing all of `target.bounds` inside the padded
    /// viewport, never above `target.max_zoom`.
    pub fn fit_bounds(&mut self, target: &FitTarget) {
        let padding = 2.0 * self.options.fit_padding;
        let available = vec2((self.viewport.x - padding).max(1.0), (self.viewport.y - padding).max(1.0));

        let b = &target.bounds;
        let (west, north) = project(&Coordinate::new(b.north(), b.west()), 0.0);
        let (east, south) = project(&Coordinate::new(b.south(), b.east()), 0.0);
        let scale = (available.x as f64 / (east - west)).min(available.y as f64 / (south - north));

        let snap = self.options.zoom_snap;
        let mut zoom = scale.log2();
        if snap > 0.0 && zoom.is_finite() {
            zoom = (zoom / snap).floor() * snap;
        }
        self.set_view(b.center(), zoom.min(target.max_zoom));
    }

    fn snap(&self, zoom: f64) -> f64 {
        let snap = self.options.zoom_snap;
        if snap > 0.0 {
            (zoom / snap).round() * snap
        } else {
            zoom
        }
    }

    /// Pulls the centre back so the viewport stays inside the max bounds,
    /// scaled by the bounds viscosity.
    fn clamp_center(&mut self) {
        let bounds = &self.options.max_bounds;
        let (min_x, min_y) = project(&Coordinate::new(bounds.north(), bounds.west()), self.zoom);
        let (max_x, max_y) = project(&Coordinate::new(bounds.south(), bounds.east()), self.zoom);
        let half_w = self.viewport.x as f64 / 2.0;
        let half_h = self.viewport.y as f64 / 2.0;

        let clamp_axis = |value: f64, lo: f64, hi: f64, half: f64| {
            if hi - lo <= 2.0 * half {
                (lo + hi) / 2.0
            } else {
                value.clamp(lo + half, hi - half)
            }
        };

        let (x, y) = project(&self.center, self.zoom);
        let cx = clamp_axis(x, min_x, max_x, half_w);
        let cy = clamp_axis(y, min_y, max_y, half_h);
        let viscosity = self.options.max_bounds_viscosity.clamp(0.0, 1.0);
        self.center = unproject(x + (cx - x) * viscosity, y + (cy - y) * viscosity, self.zoom);
    }

    /// Screen offset of world pixel (0, 0) at the current zoom.
    fn origin(&self, rect: Rect) -> (f64, f64) {
        let (cx, cy) = project(&self.center, self.zoom);
        (rect.center().x as f64 - cx, rect.center().y as f64 - cy)
    }

    pub fn screen_to_geo(&self, rect: Rect, pos: Pos2) -> Coordinate {
        let (ox, oy) = self.origin(rect);
        unproject(pos.x as f64 - ox, pos.y as f64 - oy, self.zoom)
    }

    #[cfg(test)]
    pub fn geo_to_screen(&self, rect: Rect, coordinate: &Coordinate) -> Pos2 {
        let (ox, oy) = self.origin(rect);
        let (x, y) = project(coordinate, self.zoom);
        Pos2::new((x + ox) as f32, (y + oy) as f32)
    }

    /// Tiles covering `rect`, with the screen rectangle each one fills.
    pub fn visible_tiles(&self, rect: Rect, max_tile_zoom: u32) -> Vec<(TileKey, Rect)> {
        let z = (self.zoom.round().max(0.0) as u32).min(max_tile_zoom);
        let n = 2u32.pow(z);
        let tile_px = TILE_SIZE * world_size(self.zoom) / world_size(z as f64);
        let (ox, oy) = self.origin(rect);

        let first = |screen_min: f32, offset: f64| ((screen_min as f64 - offset) / tile_px).floor().max(0.0) as u32;
        let last = |screen_max: f32, offset: f64| {
            (((screen_max as f64 - offset) / tile_px).floor().max(0.0) as u32).min(n - 1)
        };

        let mut tiles = Vec::new();
        for x in first(rect.min.x, ox)..=last(rect.max.x, ox) {
            for y in first(rect.min.y, oy)..=last(rect.max.y, oy) {
                let min = Pos2::new((x as f64 * tile_px + ox) as f32, (y as f64 * tile_px + oy) as f32);
                let tile_rect = Rect::from_min_size(min, Vec2::splat(tile_px as f32));
                if tile_rect.intersects(rect) {
                    tiles.push(((z, x, y), tile_rect));
                }
            }
        }
        tiles
    }
}

/// Interactive map widget: base tiles, country shapes, hover tooltip.
pub struct Map<'a> {
    view: &'a mut MapView,
    layer: Option<&'a CountryLayer>,
    missing_tiles: &'a mut Vec<TileKey>,
    clicked: &'a mut Option<usize>,
    viewport_size: Vec2,
    tile_max_zoom: u32,
    attribution: &'a str,
}

impl<'a> Map<'a> {
    pub fn new(view: &'a mut MapView, missing_tiles: &'a mut Vec<TileKey>, clicked: &'a mut Option<usize>) -> Self {
        Self {
            view,
            layer: None,
            missing_tiles,
            clicked,
            viewport_size: Vec2::new(1024.0, 1024.0),
            tile_max_zoom: 19,
            attribution: "",
        }
    }

    pub fn layer(mut self, layer: Option<&'a CountryLayer>) -> Self {
        self.layer = layer;
        self
    }

    pub fn viewport_size(mut self, size: Vec2) -> Self {
        self.viewport_size = size;
        self
    }

    pub fn tiles(mut self, max_zoom: u32, attribution: &'a str) -> Self {
        self.tile_max_zoom = max_zoom;
        self.attribution = attribution;
        self
    }

    fn handle_input(&mut self, ui: &Ui, response: &Response) {
        if response.dragged() {
            self.view.pan_by(response.drag_delta());
        }

        if !response.hovered() {
            return;
        }

        // Pinch or ctrl+scroll
        let zoom_delta = ui.input(|i| i.zoom_delta());
        if (zoom_delta - 1.0).abs() > f32::EPSILON {
            let zoom = self.view.zoom() + (zoom_delta as f64).log2();
            self.view.set_view(self.view.center(), zoom);
            return;
        }

        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll.abs() > f32::EPSILON {
            self.view.zoom_by(scroll.signum() as f64);
        }
    }

    fn paint_tiles(&mut self, ui: &Ui, rect: Rect) {
        let painter = ui.painter().with_clip_rect(rect);
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));

        for (key, tile_rect) in self.view.visible_tiles(rect, self.tile_max_zoom) {
            if let Some(tile) = self.view.tiles_mut().get_mut(&key) {
                let texture = tile.texture(ui.ctx());
                painter.image(texture.id(), tile_rect, uv, Color32::WHITE);
            } else {
                self.missing_tiles.push(key);
                painter.rect_filled(tile_rect.shrink(0.5), 0.0, Color32::from_gray(220));
            }
        }
    }

    fn paint_countries(&self, ui: &Ui, rect: Rect, layer: &CountryLayer) {
        let painter = ui.painter().with_clip_rect(rect);
        let scale = world_size(self.view.zoom()) / TILE_SIZE;
        let (ox, oy) = self.view.origin(rect);
        let to_screen = |p: &[f64; 2]| Pos2::new((p[0] * scale + ox) as f32, (p[1] * scale + oy) as f32);

        let mut borders = Vec::new();
        for (style, shape) in layer.shapes() {
            let on_screen = Rect::from_min_max(to_screen(&shape.min), to_screen(&shape.max));
            if !on_screen.intersects(rect) {
                continue;
            }

            let mut mesh = Mesh::default();
            for fill in &shape.fills {
                append_fill(&mut mesh, fill, &to_screen, style.fill());
            }
            if !mesh.is_empty() {
                painter.add(Shape::mesh(mesh));
            }

            for ring in shape.polygons.iter().flatten() {
                let points = simplify(ring.iter().map(to_screen));
                if points.len() >= 3 {
                    borders.push((points, style.stroke(), style.dashed));
                }
            }
        }

        for (mut points, stroke, dashed) in borders {
            if dashed {
                points.push(points[0]);
                painter.extend(Shape::dashed_line(&points, stroke, DASH_LENGTH, DASH_LENGTH));
            } else {
                painter.add(Shape::closed_line(points, stroke));
            }
        }
    }

    fn paint_tooltip(&self, ui: &Ui, pos: Pos2, text: &str) {
        let painter = ui.painter();
        let galley = painter.layout_no_wrap(text.to_string(), FontId::proportional(13.0), Color32::BLACK);
        let rect = Rect::from_center_size(pos, galley.size() + vec2(12.0, 6.0));
        painter.rect_filled(rect, 3.0, Color32::WHITE.gamma_multiply(0.8));
        painter.galley(rect.center() - galley.size() / 2.0, galley, Color32::BLACK.gamma_multiply(0.8));
    }
}

impl<'a> Widget for Map<'a> {
    fn ui(mut self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(self.viewport_size, Sense::click_and_drag());
        self.view.set_viewport(rect.size());

        self.handle_input(ui, &response);

        ui.painter().rect_filled(rect, 0.0, Color32::from_rgb(0xd4, 0xda, 0xdc));
        self.paint_tiles(ui, rect);

        if let Some(layer) = self.layer {
            self.paint_countries(ui, rect, layer);

            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    *self.clicked = layer.hit_test(&self.view.screen_to_geo(rect, pos));
                }
            }

            if let Some(pos) = response.hover_pos() {
                let hovered = layer.hit_test(&self.view.screen_to_geo(rect, pos));
                if let Some(feature) = hovered.and_then(|index| layer.feature(index)) {
                    self.paint_tooltip(ui, pos, feature.display_name());
                }
            }
        }

        if !self.attribution.is_empty() {
            ui.painter().text(
                rect.right_bottom() - vec2(4.0, 2.0),
                Align2::RIGHT_BOTTOM,
                self.attribution,
                FontId::proportional(11.0),
                Color32::from_gray(90),
            );
        }

        response
    }
}

/// Drops consecutive points that land on (almost) the same pixel.
/// Appends a triangulated fill to `mesh`, moving its vertices onto the screen.
fn append_fill(mesh: &mut Mesh, fill: &FillMesh, to_screen: impl Fn(&[f64; 2]) -> Pos2, color: Color32) {
    let base = mesh.vertices.len() as u32;
    for p in &fill.vertices {
        mesh.colored_vertex(to_screen(p), color);
    }
    mesh.indices.extend(fill.indices.iter().map(|i| base + i));
}

fn simplify(points: impl Iterator<Item = Pos2>) -> Vec<Pos2> {
    let mut out: Vec<Pos2> = Vec::new();
    for p in points {
        match out.last() {
            Some(last) if last.distance(p) < MIN_SEGMENT_PX => {}
            _ => out.push(p),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::geo::GeoBounds;
    use crate::map::layer::triangulate;
    use approx::assert_abs_diff_eq;

    fn view(viewport: Vec2) -> MapView {
        let mut view = MapView::new(MapOptions::default());
        view.set_viewport(viewport);
        view
    }

    #[test]
    fn zoom_is_kept_within_limits() {
        let mut view = view(vec2(800.0, 600.0));
        view.set_view(Coordinate::new(0.0, 0.0), 12.0);
        assert_eq!(view.zoom(), 8.0);
        view.set_view(Coordinate::new(0.0, 0.0), 0.0);
        assert_eq!(view.zoom(), 2.0);
        view.zoom_by(-1.0);
        assert_eq!(view.zoom(), 2.0);
        view.zoom_by(3.0);
        assert_eq!(view.zoom(), 3.5);
    }

    #[test]
    fn panning_cannot_leave_the_max_bounds() {
        let mut view = view(vec2(800.0, 600.0));
        view.set_view(Coordinate::new(0.0, 0.0), 3.0);
        view.pan_by(vec2(0.0, 100_000.0));

        let rect = Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0));
        let top = view.screen_to_geo(rect, rect.center_top());
        assert_abs_diff_eq!(top.latitude(), 85.0, epsilon = 1e-6);
    }

    #[test]
    fn initial_view_is_centred_as_configured() {
        let view = view(vec2(800.0, 600.0));
        assert_abs_diff_eq!(view.center().latitude(), 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(view.center().longitude(), 0.0, epsilon = 1e-9);
        assert_eq!(view.zoom(), 3.0);
    }

    #[test]
    fn fit_bounds_respects_max_zoom_and_padding() {
        let mut view = view(vec2(1000.0, 800.0));
        let target = FitTarget {
            bounds: GeoBounds::new(40.0, 0.0, 50.0, 10.0),
            max_zoom: 6.0,
            crosses_date_line: false,
        };
        view.fit_bounds(&target);
        // the 10 px tall box in 700 px of height gives log2(69) ~ 6.1, snapped to 6
        assert_eq!(view.zoom(), 6.0);
        assert_abs_diff_eq!(view.center().longitude(), 5.0, epsilon = 1e-6);

        let capped = FitTarget { max_zoom: 3.36, ..target };
        view.fit_bounds(&capped);
        assert_abs_diff_eq!(view.zoom(), 3.36);
    }

    #[test]
    fn fit_bounds_snaps_down() {
        let mut view = view(vec2(612.0, 612.0));
        let target = FitTarget {
            bounds: GeoBounds::new(-60.0, -90.0, 60.0, 90.0),
            max_zoom: 8.0,
            crosses_date_line: false,
        };
        view.fit_bounds(&target);
        // 180 degrees is 128 px at zoom 0 and 512 px fit -> exactly zoom 2
        assert_eq!(view.zoom(), 2.0);
    }

    #[test]
    fn fit_across_the_date_line_centres_on_the_antimeridian() {
        let mut view = view(vec2(1000.0, 800.0));
        let target = FitTarget {
            bounds: GeoBounds::new(-20.0, 170.0, -10.0, 190.0),
            max_zoom: 2.0,
            crosses_date_line: true,
        };
        view.fit_bounds(&target);
        assert_eq!(view.zoom(), 2.0);
        assert!(view.center().longitude().abs() <= 180.0);
    }

    #[test]
    fn screen_and_geo_round_trip() {
        let view = view(vec2(800.0, 600.0));
        let rect = Rect::from_min_size(Pos2::new(10.0, 20.0), vec2(800.0, 600.0));
        let point = Coordinate::new(30.0, 15.0);
        let back = view.screen_to_geo(rect, view.geo_to_screen(rect, &point));
        assert_abs_diff_eq!(back.latitude(), 30.0, epsilon = 1e-3);
        assert_abs_diff_eq!(back.longitude(), 15.0, epsilon = 1e-3);
    }

    #[test]
    fn visible_tiles_cover_the_viewport() {
        let view = view(vec2(800.0, 600.0));
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0));
        let tiles = view.visible_tiles(rect, 19);
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|((z, x, y), _)| *z == 3 && *x < 8 && *y < 8));

        let covered: f32 = tiles
            .iter()
            .map(|(_, r)| r.intersect(rect).area())
            .sum();
        assert_abs_diff_eq!(covered, rect.area(), epsilon = 1.0);
    }

    #[test]
    fn simplify_merges_close_points() {
        let points = vec![Pos2::new(0.0, 0.0), Pos2::new(0.1, 0.1), Pos2::new(5.0, 0.0), Pos2::new(5.2, 0.0)];
        assert_eq!(simplify(points.into_iter()), vec![Pos2::new(0.0, 0.0), Pos2::new(5.0, 0.0)]);
    }

    fn mesh_covers(mesh: &Mesh, p: Pos2) -> bool {
        mesh.indices.chunks(3).any(|t| {
            let [a, b, c] = [0, 1, 2].map(|k| mesh.vertices[t[k] as usize].pos);
            let cross = |u: Pos2, v: Pos2| (v.x - u.x) * (p.y - u.y) - (v.y - u.y) * (p.x - u.x);
            let (d1, d2, d3) = (cross(a, b), cross(b, c), cross(c, a));
            let negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
            let positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
            !(negative && positive)
        })
    }

    #[test]
    fn concave_fill_stays_inside_its_outline() {
        let ring = vec![
            [0.0, 0.0],
            [40.0, 0.0],
            [40.0, 80.0],
            [60.0, 80.0],
            [60.0, 0.0],
            [100.0, 0.0],
            [100.0, 100.0],
            [0.0, 100.0],
            [0.0, 0.0],
        ];
        let fill = triangulate(&[ring]);
        let mut mesh = Mesh::default();
        let color = Color32::from_rgb(0xff, 0x44, 0x44);
        append_fill(&mut mesh, &fill, |p: &[f64; 2]| Pos2::new(p[0] as f32, p[1] as f32), color);

        assert!(!mesh_covers(&mesh, Pos2::new(50.0, 20.0)));
        assert!(mesh_covers(&mesh, Pos2::new(20.0, 50.0)));
        assert!(mesh.vertices.iter().all(|v| v.color == color));
    }

    #[test]
    fn appended_fills_index_their_own_vertices() {
        let square = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]];
        let fill = triangulate(&[square]);
        let shift = |dx: f32| move |p: &[f64; 2]| Pos2::new(p[0] as f32 + dx, p[1] as f32);

        let mut mesh = Mesh::default();
        append_fill(&mut mesh, &fill, shift(0.0), Color32::WHITE);
        append_fill(&mut mesh, &fill, shift(100.0), Color32::WHITE);

        assert_eq!(mesh.vertices.len(), 8);
        assert!(mesh.indices[6..].iter().all(|&i| i >= 4));
        assert!(mesh_covers(&mesh, Pos2::new(105.0, 5.0)));
        assert!(!mesh_covers(&mesh, Pos2::new(50.0, 5.0)));
    }
}
