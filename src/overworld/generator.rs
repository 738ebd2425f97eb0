// src/overworld/generator.rs
//! Конвейер генерации макрокарты
//!
//! Один проход без повторного входа: поля → море → гидрология → места
//! → дороги → классификация → уровни монстров. Результат — неизменяемая
//! `MacroMap`; все случайные решения берутся из одного ChaCha8,
//! засеянного сидом из параметров.

use crate::config::WorldParams;
use crate::field::ScalarField;
use crate::gentype::GenTypeTable;
use crate::overworld::{InfoFlags, MacroBlock, MacroMap, Place, PlaceKind, hydrology, roads};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Ключ стартового города
pub const STARTING_TOWN_KEY: &str = "starting_town";

/// Сторона площади города в макроячейках
const TOWN_FOOTPRINT: usize = 2;
/// Сторона площади входа в подземелье
const DUNGEON_FOOTPRINT: usize = 1;
/// Радиус подавления монстров вокруг мест (расстояние Чебышёва)
const PLACE_SAFETY_RADIUS: usize = 2;

/// Генерирует надмирье целиком
#[must_use]
pub fn generate_overworld(params: &WorldParams, table: &GenTypeTable) -> MacroMap {
    let size = params.size.max(1);
    let sea_level = params.sea_level();
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    // === 1. Три независимых параметрических поля ===
    let height = ScalarField::build(&mut rng, size);
    let mut pop = ScalarField::build(&mut rng, size);
    let mut law = ScalarField::build(&mut rng, size);

    // === 2. Море: население обнуляется, закон слабеет вдвое ===
    for y in 0..size {
        for x in 0..size {
            if height.get(x, y) < sea_level {
                pop.set(x, y, 0);
                law.set(x, y, law.get(x, y) / 2);
            }
        }
    }

    let mut blocks = vec![MacroBlock::default(); size * size];

    // === 3. Гидрология ===
    hydrology::carve_rivers(
        &mut blocks,
        &height,
        sea_level,
        params.river_source_level,
        params.rivers,
    );
    hydrology::scatter_lakes(&mut blocks, &height, sea_level, params.lakes, &mut rng);

    // === 4. Города и подземелья ===
    let places = place_sites(&mut blocks, &height, &pop, &law, sea_level, params, &mut rng);

    // === 5. Дороги ===
    roads::connect_places(
        &mut blocks,
        &places,
        &pop,
        &law,
        params.road_range,
        params.road_threshold,
        &mut rng,
    );

    // === 6. Классификация каждой макроячейки ===
    for y in 0..size {
        for x in 0..size {
            blocks[y * size + x].terrain_type =
                table.classify(height.get(x, y), pop.get(x, y), law.get(x, y), &mut rng);
        }
    }

    // === 7. Уровни и вероятности монстров ===
    derive_monsters(&mut blocks, &law, &places, size);

    MacroMap::new(size, params.seed, blocks, places)
}

/// Размещает стартовый город, остальные города и подземелья
fn place_sites<R: Rng>(
    blocks: &mut [MacroBlock],
    height: &ScalarField,
    pop: &ScalarField,
    law: &ScalarField,
    sea_level: u8,
    params: &WorldParams,
    rng: &mut R,
) -> Vec<Place> {
    let size = height.size();
    let mut places: Vec<Place> = Vec::new();

    // Стартовый город — жадно лучший по law+pop пригодный блок.
    // Карта обязана иметь стартовую позицию, поэтому требования
    // ослабляются ступенчато: полная площадь → одна ячейка → одна
    // ячейка поверх воды → просто самая высокая точка карты.
    let footprint = TOWN_FOOTPRINT.min(size);
    let start = best_site(blocks, height, law, pop, sea_level, footprint)
        .map(|(x, y)| (x, y, footprint))
        .or_else(|| best_site(blocks, height, law, pop, sea_level, 1).map(|(x, y)| (x, y, 1)))
        .or_else(|| wettest_site(height, law, pop, sea_level).map(|(x, y)| (x, y, 1)))
        .unwrap_or_else(|| {
            let (x, y) = highest_cell(height);
            (x, y, 1)
        });
    {
        let (x, y, f) = start;
        // Принудительная посадка осушает занятые ячейки
        for dy in 0..f {
            for dx in 0..f {
                blocks[(y + dy) * size + (x + dx)].flags.remove(InfoFlags::WATER);
            }
        }
        commit_place(
            blocks,
            pop,
            &mut places,
            STARTING_TOWN_KEY.to_string(),
            PlaceKind::Town,
            x,
            y,
            f,
            rng,
        );
    }

    // Остальные города и подземелья — выборка с отклонением
    let extra_towns = params.towns.saturating_sub(places.len());
    sample_category(
        blocks, height, pop, &mut places, sea_level, params, PlaceKind::Town, extra_towns,
        TOWN_FOOTPRINT, rng,
    );
    sample_category(
        blocks, height, pop, &mut places, sea_level, params, PlaceKind::Dungeon, params.dungeons,
        DUNGEON_FOOTPRINT, rng,
    );

    places
}

/// Лучший по law+pop блок, куда помещается площадь `footprint`
fn best_site(
    blocks: &[MacroBlock],
    height: &ScalarField,
    law: &ScalarField,
    pop: &ScalarField,
    sea_level: u8,
    footprint: usize,
) -> Option<(usize, usize)> {
    let size = height.size();
    let mut best: Option<(usize, usize, u32)> = None;
    for y in 0..size {
        for x in 0..size {
            if !footprint_fits(blocks, height, sea_level, x, y, footprint) {
                continue;
            }
            let score = u32::from(law.get(x, y)) + u32::from(pop.get(x, y));
            if best.is_none_or(|(_, _, s)| score > s) {
                best = Some((x, y, score));
            }
        }
    }
    best.map(|(x, y, _)| (x, y))
}

/// Откат при полностью заводнённой суше: лучшая надводная ячейка,
/// флаг воды игнорируется
fn wettest_site(
    height: &ScalarField,
    law: &ScalarField,
    pop: &ScalarField,
    sea_level: u8,
) -> Option<(usize, usize)> {
    let size = height.size();
    let mut best: Option<(usize, usize, u32)> = None;
    for y in 0..size {
        for x in 0..size {
            if height.get(x, y) < sea_level {
                continue;
            }
            let score = u32::from(law.get(x, y)) + u32::from(pop.get(x, y));
            if best.is_none_or(|(_, _, s)| score > s) {
                best = Some((x, y, score));
            }
        }
    }
    best.map(|(x, y, _)| (x, y))
}

/// Последний рубеж для карты-океана: самая высокая точка
fn highest_cell(height: &ScalarField) -> (usize, usize) {
    let size = height.size();
    let mut best = (0usize, 0usize, 0u8);
    for y in 0..size {
        for x in 0..size {
            let h = height.get(x, y);
            if h > best.2 {
                best = (x, y, h);
            }
        }
    }
    (best.0, best.1)
}

#[allow(clippy::too_many_arguments)]
fn sample_category<R: Rng>(
    blocks: &mut [MacroBlock],
    height: &ScalarField,
    pop: &ScalarField,
    places: &mut Vec<Place>,
    sea_level: u8,
    params: &WorldParams,
    kind: PlaceKind,
    count: usize,
    footprint: usize,
    rng: &mut R,
) {
    let size = height.size();
    if size < footprint {
        return;
    }

    for _ in 0..count {
        let mut placed = false;
        for _ in 0..params.place_attempts {
            let x = rng.gen_range(0..=size - footprint);
            let y = rng.gen_range(0..=size - footprint);
            if !footprint_fits(blocks, height, sea_level, x, y, footprint) {
                continue;
            }

            // Минимальный разнос внутри категории
            let candidate_center = (x + footprint / 2, y + footprint / 2);
            let too_close = places.iter().filter(|p| p.kind == kind).any(|p| {
                let (px, py) = p.center();
                let d = px.abs_diff(candidate_center.0) + py.abs_diff(candidate_center.1);
                (d as u32) < params.min_place_distance
            });
            if too_close {
                continue;
            }

            let n = places.iter().filter(|p| p.kind == kind).count() + 1;
            let key = match kind {
                PlaceKind::Town => format!("town_{n}"),
                PlaceKind::Dungeon => format!("dungeon_{n}"),
            };
            commit_place(blocks, pop, places, key, kind, x, y, footprint, rng);
            placed = true;
            break;
        }
        // Бюджет попыток исчерпан — мест будет меньше запрошенного
        if !placed {
            break;
        }
    }
}

/// Пригодность прямоугольника: в границах, выше моря, без воды и мест
fn footprint_fits(
    blocks: &[MacroBlock],
    height: &ScalarField,
    sea_level: u8,
    x: usize,
    y: usize,
    footprint: usize,
) -> bool {
    let size = height.size();
    if x + footprint > size || y + footprint > size {
        return false;
    }
    for dy in 0..footprint {
        for dx in 0..footprint {
            let (cx, cy) = (x + dx, y + dy);
            let block = &blocks[cy * size + cx];
            if height.get(cx, cy) < sea_level
                || block.flags.has(InfoFlags::WATER)
                || block.place.is_some()
            {
                return false;
            }
        }
    }
    true
}

#[allow(clippy::too_many_arguments)]
fn commit_place<R: Rng>(
    blocks: &mut [MacroBlock],
    pop: &ScalarField,
    places: &mut Vec<Place>,
    key: String,
    kind: PlaceKind,
    x: usize,
    y: usize,
    footprint: usize,
    rng: &mut R,
) {
    let size = pop.size();
    let index = places.len() as u16;
    let center = (x + footprint / 2, y + footprint / 2);

    places.push(Place {
        key,
        kind,
        name: place_name(rng),
        x,
        y,
        width: footprint,
        height: footprint,
        seed: rng.r#gen(),
        population: pop.get(center.0, center.1),
        monster_type: match kind {
            PlaceKind::Town => 0,
            PlaceKind::Dungeon => rng.gen_range(1..=8),
        },
    });

    for dy in 0..footprint {
        for dx in 0..footprint {
            blocks[(y + dy) * size + (x + dx)].place = Some(index);
        }
    }
}

/// Уровень монстров растёт там, где слаб закон; вокруг мест спокойно
fn derive_monsters(blocks: &mut [MacroBlock], law: &ScalarField, places: &[Place], size: usize) {
    for y in 0..size {
        for x in 0..size {
            let l = law.get(x, y);
            let mut level = (255 - u32::from(l)) / 16 + 1;
            let mut prob = level / 2 + 1;

            if places.iter().any(|p| rect_distance(p, x, y) <= PLACE_SAFETY_RADIUS) {
                level /= 2;
                prob = 0;
            }

            let block = &mut blocks[y * size + x];
            block.monster_level = level.min(255) as u8;
            block.monster_prob = prob.min(100) as u8;
        }
    }
}

/// Расстояние Чебышёва от точки до прямоугольника места
fn rect_distance(place: &Place, x: usize, y: usize) -> usize {
    let dx = if x < place.x {
        place.x - x
    } else if x >= place.x + place.width {
        x - (place.x + place.width - 1)
    } else {
        0
    };
    let dy = if y < place.y {
        place.y - y
    } else if y >= place.y + place.height {
        y - (place.y + place.height - 1)
    } else {
        0
    };
    dx.max(dy)
}

const SYLLABLES: [&str; 16] = [
    "ар", "бел", "дор", "фен", "гал", "хол", "кар", "лим", "мор", "нар", "ос", "пер", "рун",
    "рав", "сол", "тир",
];

/// Имя места из 2–3 случайных слогов с заглавной буквы
fn place_name<R: Rng>(rng: &mut R) -> String {
    let count = rng.gen_range(2..=3);
    let mut raw = String::new();
    for _ in 0..count {
        raw.push_str(SYLLABLES[rng.gen_range(0..SYLLABLES.len())]);
    }
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(map: &MacroMap) -> Vec<(u16, u8, u8)> {
        let size = map.size();
        let mut out = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                let b = map.block(x, y);
                out.push((b.terrain_type, b.monster_level, b.monster_prob));
            }
        }
        out
    }

    #[test]
    fn seed_42_size_8_scenario() {
        let params = WorldParams { size: 8, ..WorldParams::with_seed(42) };
        let table = GenTypeTable::default();
        let map = generate_overworld(&params, &table);

        let starts = map
            .places()
            .iter()
            .filter(|p| p.key == STARTING_TOWN_KEY)
            .count();
        assert_eq!(starts, 1);

        let (sx, sy) = map.starting_position();
        assert!(sx < 8 && sy < 8);

        for y in 0..8 {
            for x in 0..8 {
                let id = map.block(x, y).terrain_type;
                assert!(table.get(id).is_some(), "ячейка ({x},{y}): id {id} вне справочника");
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let params = WorldParams { size: 16, ..WorldParams::with_seed(7) };
        let table = GenTypeTable::default();
        let a = generate_overworld(&params, &table);
        let b = generate_overworld(&params, &table);

        assert_eq!(snapshot(&a), snapshot(&b));
        assert_eq!(a.places().len(), b.places().len());
        for (pa, pb) in a.places().iter().zip(b.places()) {
            assert_eq!(pa.key, pb.key);
            assert_eq!(pa.name, pb.name);
            assert_eq!((pa.x, pa.y), (pb.x, pb.y));
        }
    }

    #[test]
    fn same_category_places_respect_min_distance() {
        let params = WorldParams { size: 24, ..WorldParams::with_seed(3) };
        let table = GenTypeTable::default();
        let map = generate_overworld(&params, &table);

        let places = map.places();
        for (i, a) in places.iter().enumerate() {
            for b in &places[i + 1..] {
                if a.kind == b.kind {
                    assert!(
                        a.manhattan_to(b) >= params.min_place_distance,
                        "{} и {} слишком близко",
                        a.key,
                        b.key
                    );
                }
            }
        }
    }

    #[test]
    fn exhausted_budget_degrades_softly() {
        // Запрашиваем заведомо больше мест, чем влезает
        let params = WorldParams {
            size: 8,
            towns: 50,
            dungeons: 50,
            ..WorldParams::with_seed(5)
        };
        let table = GenTypeTable::default();
        let map = generate_overworld(&params, &table);
        assert!(map.places().len() < 100);
    }

    #[test]
    fn monsters_are_suppressed_near_places() {
        let params = WorldParams { size: 16, ..WorldParams::with_seed(11) };
        let table = GenTypeTable::default();
        let map = generate_overworld(&params, &table);

        for place in map.places() {
            let (cx, cy) = place.center();
            assert_eq!(map.block(cx, cy).monster_prob, 0);
        }
    }

    #[test]
    fn place_keys_are_unique() {
        let params = WorldParams { size: 24, ..WorldParams::with_seed(9) };
        let table = GenTypeTable::default();
        let map = generate_overworld(&params, &table);

        let mut keys: Vec<&str> = map.places().iter().map(|p| p.key.as_str()).collect();
        keys.sort_unstable();
        let before = keys.len();
        keys.dedup();
        assert_eq!(before, keys.len());
    }
}
