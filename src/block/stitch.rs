// src/block/stitch.rs
//! Сшивка дорог через границы блоков
//!
//! По уровням дорог восьми соседей и самого блока строится решётка
//! 3×3 опорных точек (углы, середины рёбер, центр), которая
//! интерполируется бесшумной диффузией фрактальной сетки. Тайлы с
//! интерполированным значением выше порога становятся дорогой. Опорные
//! точки на общем ребре двух блоков совпадают, поэтому дорога
//! непрерывна через шов.

use crate::block::{BLOCK_SIZE, NeighborRoads, TileGrid};
use crate::features::FEAT_ROAD;
use crate::fractal::{FRACTAL_STEP, FractalGrid};
use crate::overworld::InfoFlags;

/// Уровень полноценной дороги
pub const ROAD_LEVEL: u8 = 10;
/// Уровень тропы
pub const TRACK_LEVEL: u8 = 6;
/// Уровень земли без дороги
const GROUND_LEVEL: i32 = 0;
/// Интерполированные значения выше этого порога становятся дорогой
const ROAD_BORDER: i32 = 3;

/// Уровень дороги макроблока по его флагам
#[must_use]
pub fn road_level(flags: InfoFlags) -> u8 {
    if flags.has(InfoFlags::ROAD) {
        ROAD_LEVEL
    } else if flags.has(InfoFlags::TRACK) {
        TRACK_LEVEL
    } else {
        0
    }
}

/// Накладывает дорожное покрытие на сетку тайлов блока
pub(crate) fn stitch_roads(grid: &mut TileGrid, info: &NeighborRoads) {
    let mut anchors = [[GROUND_LEVEL; 3]; 3];

    if info.self_road {
        // Дорожный блок: все 8 соседей — опорные точки как есть,
        // собственный уровень в центре
        for ay in 0..3 {
            for ax in 0..3 {
                anchors[ay][ax] = i32::from(info.levels[ay * 3 + ax]);
            }
        }
    } else {
        // Недорожный блок: смотрим только на ортогональных соседей
        let north = i32::from(info.levels[1]);
        let west = i32::from(info.levels[3]);
        let east = i32::from(info.levels[5]);
        let south = i32::from(info.levels[7]);

        if north <= GROUND_LEVEL
            && west <= GROUND_LEVEL
            && east <= GROUND_LEVEL
            && south <= GROUND_LEVEL
        {
            return;
        }

        anchors[0][1] = north;
        anchors[1][0] = west;
        anchors[1][2] = east;
        anchors[2][1] = south;

        // Угол поднимается, только когда дороги есть с обеих смежных
        // сторон — так получаются естественные повороты
        let mut corner_raised = false;
        for (ay, ax, a, b) in [
            (0usize, 0usize, north, west),
            (0, 2, north, east),
            (2, 0, south, west),
            (2, 2, south, east),
        ] {
            if a > GROUND_LEVEL && b > GROUND_LEVEL {
                anchors[ay][ax] = (a + b) / 2;
                corner_raised = true;
            }
        }
        if !corner_raised {
            return;
        }
    }

    // Интерполяция опорных точек бесшумной диффузией
    let mut field = FractalGrid::new();
    let half = FRACTAL_STEP / 2;
    for (ay, gy) in [(0usize, 0usize), (1, half), (2, FRACTAL_STEP)] {
        for (ax, gx) in [(0usize, 0usize), (1, half), (2, FRACTAL_STEP)] {
            field.set(gx, gy, anchors[ay][ax]);
        }
    }
    field.smooth();

    for y in 0..BLOCK_SIZE {
        for x in 0..BLOCK_SIZE {
            if field.get(x, y) > ROAD_BORDER {
                let tile = grid.get_mut(x, y);
                tile.feature = FEAT_ROAD;
                tile.flags.insert(InfoFlags::ROAD);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEAT_GRASS;

    fn levels(road_dirs: &[(i32, i32)], level: u8) -> [u8; 9] {
        let mut out = [0u8; 9];
        for &(dx, dy) in road_dirs {
            out[((dy + 1) * 3 + (dx + 1)) as usize] = level;
        }
        out
    }

    fn road_tiles(grid: &TileGrid) -> usize {
        let mut n = 0;
        for y in 0..BLOCK_SIZE {
            for x in 0..BLOCK_SIZE {
                if grid.get(x, y).feature == FEAT_ROAD {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn road_block_between_two_neighbors_draws_through() {
        // Дорога с запада и востока, сам блок дорожный
        let mut lv = levels(&[(-1, 0), (1, 0)], ROAD_LEVEL);
        lv[4] = ROAD_LEVEL;
        let info = NeighborRoads { levels: lv, self_road: true };

        let mut grid = TileGrid::filled(FEAT_GRASS);
        stitch_roads(&mut grid, &info);

        // Средний ряд прошит дорогой от края до края
        let mid = BLOCK_SIZE / 2;
        for x in 0..BLOCK_SIZE {
            assert_eq!(grid.get(x, mid).feature, FEAT_ROAD, "разрыв на x={x}");
            assert!(grid.get(x, mid).flags.has(InfoFlags::ROAD));
        }
    }

    #[test]
    fn seam_is_continuous_between_adjacent_road_blocks() {
        // Два соседних дорожных блока A и B (B восточнее A); уровни
        // согласованы: с точки зрения A дорога на востоке, с точки
        // зрения B — на западе
        let mut a_levels = levels(&[(1, 0), (-1, 0)], ROAD_LEVEL);
        a_levels[4] = ROAD_LEVEL;
        let mut b_levels = levels(&[(-1, 0), (1, 0)], ROAD_LEVEL);
        b_levels[4] = ROAD_LEVEL;

        let mut a = TileGrid::filled(FEAT_GRASS);
        let mut b = TileGrid::filled(FEAT_GRASS);
        stitch_roads(&mut a, &NeighborRoads { levels: a_levels, self_road: true });
        stitch_roads(&mut b, &NeighborRoads { levels: b_levels, self_road: true });

        // На общем шве (восточный столбец A, западный столбец B)
        // дорожные тайлы совпадают построчно
        for y in 0..BLOCK_SIZE {
            let a_road = a.get(BLOCK_SIZE - 1, y).feature == FEAT_ROAD;
            let b_road = b.get(0, y).feature == FEAT_ROAD;
            assert_eq!(a_road, b_road, "шов разорван на y={y}");
        }
        assert!(road_tiles(&a) > 0);
    }

    #[test]
    fn non_road_block_needs_two_orthogonal_neighbors() {
        // Одна дорога на севере: угол не поднимается, оверлей пропущен
        let info = NeighborRoads {
            levels: levels(&[(0, -1)], ROAD_LEVEL),
            self_road: false,
        };
        let mut grid = TileGrid::filled(FEAT_GRASS);
        stitch_roads(&mut grid, &info);
        assert_eq!(road_tiles(&grid), 0);
    }

    #[test]
    fn non_road_block_with_corner_pair_gets_turn() {
        // Дороги на севере и востоке — поворот через северо-восточный угол
        let info = NeighborRoads {
            levels: levels(&[(0, -1), (1, 0)], ROAD_LEVEL),
            self_road: false,
        };
        let mut grid = TileGrid::filled(FEAT_GRASS);
        stitch_roads(&mut grid, &info);

        assert!(road_tiles(&grid) > 0);
        // Северо-восточный квадрант затронут, юго-западный угол чист
        assert_eq!(grid.get(0, BLOCK_SIZE - 1).feature, FEAT_GRASS);
    }

    #[test]
    fn no_neighbors_no_roads() {
        let info = NeighborRoads { levels: [0; 9], self_road: false };
        let mut grid = TileGrid::filled(FEAT_GRASS);
        stitch_roads(&mut grid, &info);
        assert_eq!(road_tiles(&grid), 0);
    }

    #[test]
    fn track_levels_translate_from_flags() {
        let mut flags = InfoFlags::empty();
        flags.insert(InfoFlags::TRACK);
        assert_eq!(road_level(flags), TRACK_LEVEL);
        flags.insert(InfoFlags::ROAD);
        assert_eq!(road_level(flags), ROAD_LEVEL);
        assert_eq!(road_level(InfoFlags::empty()), 0);
    }
}
