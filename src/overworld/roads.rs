// src/overworld/roads.rs
//! Дорожная сеть между местами
//!
//! Каждое место соединяется с ближайшим соседом в радиусе досягаемости
//! (или просто ближайшим, если радиус пуст). Трасса строится
//! рекурсивным делением отрезка пополам с ограниченным поперечным
//! сдвигом середины, что даёт естественные изгибы вместо прямых линий.

use crate::field::ScalarField;
use crate::overworld::{InfoFlags, MacroBlock, Place};
use petgraph::graph::{NodeIndex, UnGraph};
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Отрезки короче этого растеризуются прямой линией
const SUBDIVIDE_DISTANCE: i32 = 6;

/// Соединяет места дорогами и возвращает граф итоговой сети.
///
/// Узлы графа — индексы мест, рёбра — проложенные соединения.
pub fn connect_places<R: Rng>(
    blocks: &mut [MacroBlock],
    places: &[Place],
    pop: &ScalarField,
    law: &ScalarField,
    road_range: u32,
    road_threshold: u32,
    rng: &mut R,
) -> UnGraph<u16, ()> {
    let mut graph = UnGraph::new_undirected();
    let mut nodes: HashMap<u16, NodeIndex> = HashMap::new();
    for i in 0..places.len() {
        let idx = i as u16;
        nodes.insert(idx, graph.add_node(idx));
    }

    let mut edges = HashSet::new();
    for (i, place) in places.iter().enumerate() {
        let Some(j) = pick_partner(places, i, road_range) else {
            continue;
        };
        let (a, b) = if i < j { (i as u16, j as u16) } else { (j as u16, i as u16) };
        if !edges.insert((a, b)) {
            continue;
        }
        graph.add_edge(nodes[&a], nodes[&b], ());

        let from = place.center();
        let to = places[j].center();
        draw_road(
            blocks,
            pop,
            law,
            (from.0 as i32, from.1 as i32),
            (to.0 as i32, to.1 as i32),
            road_threshold,
            rng,
        );
    }

    graph
}

/// Ближайшее место в радиусе `range`; если в радиусе никого нет —
/// откат к глобально ближайшему
fn pick_partner(places: &[Place], from: usize, range: u32) -> Option<usize> {
    let distance = |j: usize| places[from].manhattan_to(&places[j]);
    let others = || (0..places.len()).filter(|&j| j != from);

    others()
        .filter(|&j| distance(j) <= range)
        .min_by_key(|&j| distance(j))
        .or_else(|| others().min_by_key(|&j| distance(j)))
}

/// Рекурсивная трасса: деление пополам, пока расстояние больше порога
pub(crate) fn draw_road<R: Rng>(
    blocks: &mut [MacroBlock],
    pop: &ScalarField,
    law: &ScalarField,
    a: (i32, i32),
    b: (i32, i32),
    threshold: u32,
    rng: &mut R,
) {
    let size = pop.size() as i32;
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let dist = dx.abs().max(dy.abs());

    if dist > SUBDIVIDE_DISTANCE {
        // Сдвиг середины перпендикулярно отрезку, не больше четверти длины
        let shift = rng.gen_range(-dist / 4..=dist / 4);
        let mut mid = (
            (a.0 + b.0) / 2 - dy * shift / dist,
            (a.1 + b.1) / 2 + dx * shift / dist,
        );
        mid.0 = mid.0.clamp(0, size - 1);
        mid.1 = mid.1.clamp(0, size - 1);

        // Вырожденная середина не делит отрезок — добиваем прямой линией
        if mid == a || mid == b {
            rasterize(blocks, pop, law, a, b, threshold);
            return;
        }
        draw_road(blocks, pop, law, a, mid, threshold, rng);
        draw_road(blocks, pop, law, mid, b, threshold, rng);
    } else {
        rasterize(blocks, pop, law, a, b, threshold);
    }
}

fn rasterize(
    blocks: &mut [MacroBlock],
    pop: &ScalarField,
    law: &ScalarField,
    a: (i32, i32),
    b: (i32, i32),
    threshold: u32,
) {
    let size = pop.size() as i32;
    let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs());
    for t in 0..=steps {
        let x = a.0 + (b.0 - a.0) * t / steps.max(1);
        let y = a.1 + (b.1 - a.1) * t / steps.max(1);
        if x < 0 || y < 0 || x >= size || y >= size {
            continue;
        }
        mark(blocks, pop, law, x as usize, y as usize, threshold);
    }
}

/// Помечает ячейку дорогой или тропой; опасные ячейки не трогаем
fn mark(
    blocks: &mut [MacroBlock],
    pop: &ScalarField,
    law: &ScalarField,
    x: usize,
    y: usize,
    threshold: u32,
) {
    let size = pop.size();
    let block = &mut blocks[y * size + x];
    if block.flags.has(InfoFlags::HAZARD) {
        return;
    }
    let grade = u32::from(pop.get(x, y)) + u32::from(law.get(x, y));
    if grade >= threshold {
        block.flags.insert(InfoFlags::ROAD);
    } else {
        block.flags.insert(InfoFlags::TRACK);
    }
}
