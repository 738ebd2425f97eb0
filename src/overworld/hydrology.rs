// src/overworld/hydrology.rs
//! Гидрология макрокарты: реки и озёра
//!
//! Реки стекают от самых высоких ячеек по наискорейшему спуску и
//! обрываются на уровне моря или в локальном минимуме. Озёра — малые
//! круги в случайных точках выше уровня моря.

use crate::field::ScalarField;
use crate::overworld::{InfoFlags, MacroBlock};
use rand::Rng;

const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Прокладывает до `max_rivers` рек от ячеек выше `source_level`.
///
/// Истоки обходятся в порядке убывания высоты; каждый шаг идёт в
/// строго самого низкого из 8 соседей, так что протока всегда конечна.
pub fn carve_rivers(
    blocks: &mut [MacroBlock],
    height: &ScalarField,
    sea_level: u8,
    source_level: u8,
    max_rivers: usize,
) {
    let size = height.size();

    let mut sources: Vec<(usize, usize)> = (0..size * size)
        .map(|i| (i % size, i / size))
        .filter(|&(x, y)| height.get(x, y) >= source_level)
        .collect();
    // От вершин к низинам; при равной высоте порядок стабилен
    sources.sort_by_key(|&(x, y)| std::cmp::Reverse(height.get(x, y)));

    for &(sx, sy) in sources.iter().take(max_rivers) {
        let (mut x, mut y) = (sx, sy);
        loop {
            blocks[y * size + x].flags.insert(InfoFlags::WATER);

            let current = height.get(x, y);
            if current <= sea_level {
                break;
            }

            // Строго самый низкий сосед; локальный минимум обрывает протоку
            let mut best = current;
            let mut next = None;
            for &(dx, dy) in &DIRECTIONS {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx >= size as i32 || ny >= size as i32 {
                    continue;
                }
                let h = height.get(nx as usize, ny as usize);
                if h < best {
                    best = h;
                    next = Some((nx as usize, ny as usize));
                }
            }

            match next {
                Some((nx, ny)) => {
                    x = nx;
                    y = ny;
                }
                None => break,
            }
        }
    }
}

/// Разбрасывает `count` малых круглых озёр по суше
pub fn scatter_lakes<R: Rng>(
    blocks: &mut [MacroBlock],
    height: &ScalarField,
    sea_level: u8,
    count: usize,
    rng: &mut R,
) {
    let size = height.size();
    if size == 0 {
        return;
    }

    for _ in 0..count {
        // Несколько попыток найти точку выше уровня моря
        for _ in 0..16 {
            let cx = rng.gen_range(0..size);
            let cy = rng.gen_range(0..size);
            if height.get(cx, cy) <= sea_level {
                continue;
            }

            // Крест 3×3 без углов — «круг» радиуса 1 на макросетке
            for &(dx, dy) in &[(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)] {
                let nx = cx as i32 + dx;
                let ny = cy as i32 + dy;
                if nx >= 0 && ny >= 0 && nx < size as i32 && ny < size as i32 {
                    blocks[ny as usize * size + nx as usize]
                        .flags
                        .insert(InfoFlags::WATER);
                }
            }
            break;
        }
    }
}
