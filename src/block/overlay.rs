// src/block/overlay.rs
//! Оверлеи опасностей: вода, лава, кислота
//!
//! Каждый проход включается своим флагом макроблока и рисует пятно по
//! собственному свежезасеянному фрактальному полю. Вода двухуровневая
//! (глубокая и мелкая), лава и кислота — одноуровневые.

use crate::block::{BLOCK_SIZE, TileGrid, routines::sample_sheet};
use crate::features::{FEAT_ACID, FEAT_DEEP_WATER, FEAT_LAVA, FEAT_SHALLOW_WATER};
use crate::overworld::InfoFlags;
use rand::Rng;

/// Порог глубокой воды
const DEEP_THRESHOLD: i32 = 208;
/// Порог мелководья
const SHALLOW_THRESHOLD: i32 = 160;
/// Порог одноуровневых опасностей
const HAZARD_THRESHOLD: i32 = 192;

/// Применяет все включённые флагами оверлеи
pub(crate) fn apply<R: Rng>(grid: &mut TileGrid, flags: InfoFlags, rng: &mut R) {
    if flags.has(InfoFlags::WATER) {
        let sheet = sample_sheet(rng, false);
        for y in 0..BLOCK_SIZE {
            for x in 0..BLOCK_SIZE {
                let v = sheet[y * BLOCK_SIZE + x];
                let tile = grid.get_mut(x, y);
                if v >= DEEP_THRESHOLD {
                    tile.feature = FEAT_DEEP_WATER;
                    tile.flags.insert(InfoFlags::WATER);
                } else if v >= SHALLOW_THRESHOLD {
                    tile.feature = FEAT_SHALLOW_WATER;
                    tile.flags.insert(InfoFlags::WATER);
                }
            }
        }
    }

    if flags.has(InfoFlags::LAVA) {
        single_tier(grid, FEAT_LAVA, InfoFlags::LAVA, rng);
    }
    if flags.has(InfoFlags::ACID) {
        single_tier(grid, FEAT_ACID, InfoFlags::ACID, rng);
    }
}

fn single_tier<R: Rng>(grid: &mut TileGrid, feature: u16, flag: u16, rng: &mut R) {
    let sheet = sample_sheet(rng, false);
    for y in 0..BLOCK_SIZE {
        for x in 0..BLOCK_SIZE {
            if sheet[y * BLOCK_SIZE + x] >= HAZARD_THRESHOLD {
                let tile = grid.get_mut(x, y);
                tile.feature = feature;
                tile.flags.insert(flag);
            }
        }
    }
}
