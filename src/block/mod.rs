//! Тонкая детализация блока: сетка тайлов 16×16 по требованию
//!
//! Синтез чистый и эфемерный: локальный ГПСЧ детерминированно
//! выводится из (глобальный сид, координаты блока), макрокарта не
//! изменяется, результат каждый раз строится заново.

pub mod overlay;
pub mod routines;
pub mod stitch;

use crate::features::FEAT_GRASS;
use crate::gentype::GenTypeTable;
use crate::overworld::{InfoFlags, MacroBlock, MacroMap};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Сторона тайловой сетки блока
pub const BLOCK_SIZE: usize = 16;

/// Один тайл тонкой сетки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub feature: u16,
    pub flags: InfoFlags,
}

/// Сетка тайлов, всегда ровно 16×16
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Сетка, целиком заполненная одним элементом
    #[must_use]
    pub fn filled(feature: u16) -> Self {
        Self {
            tiles: vec![
                Tile { feature, flags: InfoFlags::empty() };
                BLOCK_SIZE * BLOCK_SIZE
            ],
        }
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> &Tile {
        &self.tiles[y * BLOCK_SIZE + x]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut Tile {
        &mut self.tiles[y * BLOCK_SIZE + x]
    }

    #[must_use]
    pub fn side(&self) -> usize {
        BLOCK_SIZE
    }
}

/// Уровни дорог соседних блоков: 9 значений в порядке (dy, dx),
/// индекс `(dy + 1) * 3 + (dx + 1)`, центр — сам блок
#[derive(Debug, Clone, Copy, Default)]
pub struct NeighborRoads {
    pub levels: [u8; 9],
    pub self_road: bool,
}

impl NeighborRoads {
    /// Снимает уровни дорог вокруг блока (x, y) с макрокарты.
    /// Соседи за границей карты читаются как отсутствие дороги.
    #[must_use]
    pub fn from_map(map: &MacroMap, x: usize, y: usize) -> Self {
        let mut levels = [0u8; 9];
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if map.in_bounds(nx, ny) {
                    let flags = map.block(nx as usize, ny as usize).flags;
                    levels[((dy + 1) * 3 + (dx + 1)) as usize] = stitch::road_level(flags);
                }
            }
        }
        let center = map.block(x, y).flags;
        Self {
            levels,
            self_road: center.has(InfoFlags::ROAD | InfoFlags::TRACK),
        }
    }
}

/// Синтезирует тонкую сетку тайлов одного макроблока.
///
/// Неизвестный id типа генерации откатывается к травяному блоку;
/// оверлеи опасностей и сшивка дорог применяются поверх в любом случае.
#[must_use]
pub fn synthesize_block(
    block: &MacroBlock,
    x: usize,
    y: usize,
    world_seed: u64,
    table: &GenTypeTable,
    neighbors: Option<&NeighborRoads>,
) -> TileGrid {
    let mut rng = ChaCha8Rng::seed_from_u64(block_seed(world_seed, x, y));
    let mut grid = TileGrid::filled(FEAT_GRASS);

    if let Some(def) = table.get(block.terrain_type) {
        routines::apply(
            &mut grid,
            &def.routine,
            table,
            block.flags.has(InfoFlags::ROAD | InfoFlags::TRACK),
            0,
            &mut rng,
        );
    }

    overlay::apply(&mut grid, block.flags, &mut rng);

    if let Some(info) = neighbors {
        stitch::stitch_roads(&mut grid, info);
    }

    grid
}

/// Детерминированный сид блока из глобального сида и координат
fn block_seed(world_seed: u64, x: usize, y: usize) -> u64 {
    world_seed
        ^ (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gentype::{GenTypeDef, GenTypeTable, ParamRange, Routine};

    #[test]
    fn synthesis_is_deterministic() {
        let table = GenTypeTable::default();
        let block = MacroBlock { terrain_type: 3, ..MacroBlock::default() };
        let a = synthesize_block(&block, 5, 9, 777, &table, None);
        let b = synthesize_block(&block, 5, 9, 777, &table, None);
        assert_eq!(a, b);
    }

    #[test]
    fn different_blocks_get_different_seeds() {
        assert_ne!(block_seed(1, 2, 3), block_seed(1, 3, 2));
        assert_ne!(block_seed(1, 0, 0), block_seed(2, 0, 0));
    }

    #[test]
    fn every_routine_yields_16x16() {
        // По одному типу на каждую из четырёх рутин
        let table = GenTypeTable::new(vec![
            GenTypeDef {
                id: 1,
                hgt: ParamRange::full(),
                pop: ParamRange::full(),
                law: ParamRange::full(),
                chance: 1,
                routine: Routine::Fractal {
                    candidates: vec![crate::gentype::FeatureThreshold {
                        feature: crate::features::FEAT_GRASS,
                        threshold: 128,
                    }],
                },
            },
            GenTypeDef {
                id: 2,
                hgt: ParamRange::full(),
                pop: ParamRange::full(),
                law: ParamRange::full(),
                chance: 1,
                routine: Routine::Cumulative {
                    steps: vec![crate::gentype::FeatureChance {
                        feature: crate::features::FEAT_DIRT,
                        chance: 50,
                    }],
                },
            },
            GenTypeDef {
                id: 3,
                hgt: ParamRange::full(),
                pop: ParamRange::full(),
                law: ParamRange::full(),
                chance: 1,
                routine: Routine::Overlay {
                    base: 1,
                    rings: vec![crate::gentype::FeatureThreshold {
                        feature: crate::features::FEAT_SHALLOW_WATER,
                        threshold: 180,
                    }],
                },
            },
            GenTypeDef {
                id: 4,
                hgt: ParamRange::full(),
                pop: ParamRange::full(),
                law: ParamRange::full(),
                chance: 1,
                routine: Routine::Plot,
            },
        ]);

        for id in 1..=4u16 {
            let block = MacroBlock { terrain_type: id, ..MacroBlock::default() };
            let grid = synthesize_block(&block, 0, 0, 1, &table, None);
            assert_eq!(grid.side(), BLOCK_SIZE);
            assert_eq!(grid.tiles.len(), BLOCK_SIZE * BLOCK_SIZE);
        }
    }

    #[test]
    fn unknown_terrain_type_falls_back_to_grass() {
        let table = GenTypeTable::default();
        let block = MacroBlock { terrain_type: 999, ..MacroBlock::default() };
        let grid = synthesize_block(&block, 0, 0, 1, &table, None);
        for y in 0..BLOCK_SIZE {
            for x in 0..BLOCK_SIZE {
                assert_eq!(grid.get(x, y).feature, FEAT_GRASS);
            }
        }
    }
}
