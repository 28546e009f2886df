pub mod country;
pub mod fit;
pub mod geo;
pub mod layer;
pub mod map;
pub mod map_tile;
pub mod style;
