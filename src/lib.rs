pub mod block;
pub mod config;
pub mod features;
pub mod field;
pub mod fractal;
pub mod gentype;
pub mod overworld;
pub mod render;

pub use block::{BLOCK_SIZE, NeighborRoads, Tile, TileGrid, synthesize_block};
pub use config::WorldParams;
pub use gentype::{GenTypeDef, GenTypeTable, Routine};
pub use overworld::generator::generate_overworld;
pub use overworld::{MacroBlock, MacroMap, Place, PlaceKind};
