pub mod seat_map;
pub mod catalog;

pub use catalog::{CatalogError, InMemoryCatalog, MovieListing, TheatreListing};
pub use seat_map::{SeatMap, SeatMapSummary};
