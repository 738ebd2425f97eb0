// src/block/routines.rs
//! Четыре рутины синтеза тайлов блока

use crate::block::{BLOCK_SIZE, TileGrid};
use crate::features::{FEAT_DIRT, FEAT_GRASS, FEAT_PERM_WALL};
use crate::field::normalize;
use crate::fractal::{DEFAULT_ROUGHNESS, FRACTAL_STEP, FractalGrid};
use crate::gentype::{FeatureChance, FeatureThreshold, GenTypeTable, Routine};
use rand::Rng;

/// Рутины учитывают не больше четырёх кандидатов/шагов
const MAX_PARAMS: usize = 4;
/// Ограничение вложенности оверлеев: защищает от циклов в справочнике
const MAX_OVERLAY_DEPTH: u8 = 4;
/// «Большая константа» обратных весов фрактальной рутины
const WEIGHT_SCALE: i32 = 4096;
/// Ширина полосы дизеринга у границ внешних колец оверлея
const DITHER_BAND: i32 = 8;

/// Диспетчеризация рутины типа генерации
pub(crate) fn apply<R: Rng>(
    grid: &mut TileGrid,
    routine: &Routine,
    table: &GenTypeTable,
    block_has_road: bool,
    depth: u8,
    rng: &mut R,
) {
    match routine {
        Routine::Fractal { candidates } => fractal_terrain(grid, candidates, rng),
        Routine::Cumulative { steps } => cumulative_terrain(grid, steps, rng),
        Routine::Overlay { base, rings } => {
            if depth < MAX_OVERLAY_DEPTH {
                if let Some(base_def) = table.get(*base) {
                    apply(grid, &base_def.routine, table, block_has_road, depth + 1, rng);
                }
            }
            overlay_rings(grid, rings, rng);
        }
        Routine::Plot => plot(grid, block_has_road, rng),
    }
}

/// Свежий нормализованный лист 16×16 из фрактальной сетки.
///
/// Обычный лист засевает четыре угла независимыми значениями;
/// центрированный — низкие углы и высокий центр (для колец оверлея).
pub(crate) fn sample_sheet<R: Rng>(rng: &mut R, center_biased: bool) -> Vec<i32> {
    let mut grid = FractalGrid::new();
    if center_biased {
        grid.set_corners(rng.gen_range(0..64));
        grid.set_center(rng.gen_range(192..256));
    } else {
        for (cx, cy) in [
            (0, 0),
            (FRACTAL_STEP, 0),
            (0, FRACTAL_STEP),
            (FRACTAL_STEP, FRACTAL_STEP),
        ] {
            grid.set(cx, cy, rng.gen_range(0..256));
        }
    }
    grid.generate(rng, DEFAULT_ROUGHNESS);

    let mut values = Vec::with_capacity(BLOCK_SIZE * BLOCK_SIZE);
    for y in 0..BLOCK_SIZE {
        for x in 0..BLOCK_SIZE {
            values.push(grid.get(x, y));
        }
    }
    normalize(&mut values);
    values
}

/// Рутина 1: фрактальный рельеф.
///
/// Вес кандидата обратно пропорционален расстоянию высоты до его
/// порога; точное попадание получает весь масштаб целиком.
fn fractal_terrain<R: Rng>(grid: &mut TileGrid, candidates: &[FeatureThreshold], rng: &mut R) {
    let sheet = sample_sheet(rng, false);

    for y in 0..BLOCK_SIZE {
        for x in 0..BLOCK_SIZE {
            let v = sheet[y * BLOCK_SIZE + x];

            let mut weights: [(u16, i32); MAX_PARAMS] = [(0, 0); MAX_PARAMS];
            let mut total = 0i32;
            let mut used = 0usize;
            for candidate in candidates.iter().take(MAX_PARAMS) {
                if candidate.feature == 0 {
                    continue;
                }
                let d = (i32::from(candidate.threshold) - v).abs();
                let w = if d == 0 { WEIGHT_SCALE } else { WEIGHT_SCALE / d };
                weights[used] = (candidate.feature, w);
                total += w;
                used += 1;
            }

            // Нулевая масса — откат к первому кандидату или заполнителю
            let feature = if total == 0 {
                candidates.first().map_or(FEAT_GRASS, |c| c.feature)
            } else {
                let draw = rng.gen_range(0..total);
                let mut cumulative = 0i32;
                let mut picked = weights[0].0;
                for &(feat, w) in &weights[..used] {
                    cumulative += w;
                    if draw < cumulative {
                        picked = feat;
                        break;
                    }
                }
                picked
            };

            grid.get_mut(x, y).feature = if feature == 0 { FEAT_GRASS } else { feature };
        }
    }
}

/// Рутина 2: накопительная цепочка.
///
/// Идём по парам (элемент, шанс), продвигаясь дальше только пока
/// монетка с весом шанса выпадает удачно; нулевой шанс или конец
/// списка обрывают проход, остаётся последний достигнутый элемент.
fn cumulative_terrain<R: Rng>(grid: &mut TileGrid, steps: &[FeatureChance], rng: &mut R) {
    for y in 0..BLOCK_SIZE {
        for x in 0..BLOCK_SIZE {
            let mut feature = FEAT_GRASS;
            for step in steps.iter().take(MAX_PARAMS) {
                if step.feature == 0 {
                    break;
                }
                feature = step.feature;
                if step.chance == 0 {
                    break;
                }
                if rng.gen_range(0..100) >= u32::from(step.chance) {
                    break;
                }
            }
            grid.get_mut(x, y).feature = feature;
        }
    }
}

/// Рутина 3, кольцевая часть: концентрические пороги из
/// центрированного фрактального поля. Базовый террейн уже
/// синтезирован рекурсивно в `apply`. У границ двух внешних колец —
/// подизеренный 50%-й переход.
fn overlay_rings<R: Rng>(grid: &mut TileGrid, rings: &[FeatureThreshold], rng: &mut R) {
    if rings.is_empty() {
        return;
    }
    let sheet = sample_sheet(rng, true);

    for y in 0..BLOCK_SIZE {
        for x in 0..BLOCK_SIZE {
            let v = sheet[y * BLOCK_SIZE + x];

            let mut chosen = None;
            for (i, ring) in rings.iter().take(3).enumerate() {
                if v >= i32::from(ring.threshold) {
                    chosen = Some(i);
                }
            }
            let Some(i) = chosen else {
                continue;
            };

            let mut feature = rings[i].feature;
            if i <= 1 && v - i32::from(rings[i].threshold) < DITHER_BAND && rng.gen_bool(0.5) {
                if i == 0 {
                    // Внешняя граница: ячейка остаётся базовым террейном
                    continue;
                }
                feature = rings[i - 1].feature;
            }
            grid.get_mut(x, y).feature = feature;
        }
    }
}

/// Рутина 4: застроенный участок.
///
/// Случайный прямоугольник с одним из узоров: сплошная трава,
/// сплошная земля, чередующиеся полосы, либо трава/земля со зданием из
/// неразрушаемых стен и земляной отмосткой в одну клетку. Дорожный
/// флаг блока исключает узоры со зданием.
fn plot<R: Rng>(grid: &mut TileGrid, block_has_road: bool, rng: &mut R) {
    for y in 0..BLOCK_SIZE {
        for x in 0..BLOCK_SIZE {
            grid.get_mut(x, y).feature = FEAT_GRASS;
        }
    }

    let w = rng.gen_range(6..=12);
    let h = rng.gen_range(6..=12);
    let x0 = rng.gen_range(1..=BLOCK_SIZE - w - 1);
    let y0 = rng.gen_range(1..=BLOCK_SIZE - h - 1);

    let pattern = if block_has_road {
        rng.gen_range(0..3)
    } else {
        rng.gen_range(0..5)
    };

    for dy in 0..h {
        for dx in 0..w {
            let ground = match pattern {
                0 | 3 => FEAT_GRASS,
                1 | 4 => FEAT_DIRT,
                _ => {
                    if dx % 2 == 0 {
                        FEAT_GRASS
                    } else {
                        FEAT_DIRT
                    }
                }
            };

            let feature = if pattern >= 3 {
                let in_building =
                    dx >= 2 && dx < w - 2 && dy >= 2 && dy < h - 2;
                let in_margin =
                    dx >= 1 && dx < w - 1 && dy >= 1 && dy < h - 1;
                if in_building {
                    FEAT_PERM_WALL
                } else if in_margin {
                    FEAT_DIRT
                } else {
                    ground
                }
            } else {
                ground
            };

            grid.get_mut(x0 + dx, y0 + dy).feature = feature;
        }
    }
}
