// src/render.rs
//! Диагностический рендер макрокарты в PNG
//!
//! Цвет блока — стабильная псевдослучайная окраска по id типа
//! генерации, поверх неё флаги воды/лавы/кислоты/дорог и маркеры мест.

use crate::overworld::{InfoFlags, MacroMap, PlaceKind};
use image::{ImageBuffer, Rgba};
use imageproc::drawing::draw_filled_circle_mut;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Разворачивает карту в RGBA-буфер, по `scale`×`scale` пикселей на блок
#[must_use]
pub fn to_rgba_image(map: &MacroMap, scale: u32) -> Vec<u8> {
    let scale = scale.max(1);
    let side = map.size() as u32 * scale;

    #[cfg(feature = "parallel")]
    let pixels: Vec<[u8; 4]> = (0..side * side)
        .into_par_iter()
        .map(|i| pixel_color(map, i, scale, side))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let pixels: Vec<[u8; 4]> = (0..side * side)
        .map(|i| pixel_color(map, i, scale, side))
        .collect();

    let mut data: Vec<u8> = pixels.into_iter().flatten().collect();
    draw_place_markers(map, &mut data, scale, side);
    data
}

/// Сохраняет карту как PNG
pub fn save_as_png(
    map: &MacroMap,
    path: &str,
    scale: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let scale = scale.max(1);
    let side = map.size() as u32 * scale;
    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(side, side, to_rgba_image(map, scale))
            .ok_or("Failed to create image buffer")?;
    img.save(path)?;
    Ok(())
}

fn pixel_color(map: &MacroMap, i: u32, scale: u32, side: u32) -> [u8; 4] {
    let bx = ((i % side) / scale) as usize;
    let by = ((i / side) / scale) as usize;
    let block = map.block(bx, by);

    if block.flags.has(InfoFlags::WATER) {
        return [30, 90, 180, 255];
    }
    if block.flags.has(InfoFlags::LAVA) {
        return [200, 60, 20, 255];
    }
    if block.flags.has(InfoFlags::ACID) {
        return [120, 180, 40, 255];
    }
    if block.flags.has(InfoFlags::ROAD) {
        return [150, 120, 90, 255];
    }
    if block.flags.has(InfoFlags::TRACK) {
        return [130, 105, 75, 255];
    }
    terrain_color(block.terrain_type)
}

/// Стабильный цвет по id типа генерации: земляная палитра без
/// привязки к конкретному справочнику
fn terrain_color(terrain_type: u16) -> [u8; 4] {
    let h = u32::from(terrain_type).wrapping_mul(2_654_435_761);
    [
        (60 + (h >> 8) % 120) as u8,
        (90 + (h >> 16) % 130) as u8,
        (40 + (h >> 24) % 80) as u8,
        255,
    ]
}

fn draw_place_markers(map: &MacroMap, data: &mut Vec<u8>, scale: u32, side: u32) {
    let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        match ImageBuffer::from_raw(side, side, std::mem::take(data)) {
            Some(img) => img,
            None => return,
        };

    for place in map.places() {
        let (cx, cy) = place.center();
        let px = (cx as u32 * scale + scale / 2) as i32;
        let py = (cy as u32 * scale + scale / 2) as i32;
        let color = match place.kind {
            PlaceKind::Town => Rgba([240, 220, 60, 255]),
            PlaceKind::Dungeon => Rgba([40, 20, 30, 255]),
        };
        draw_filled_circle_mut(&mut img, (px, py), (scale / 2) as i32, color);
    }

    *data = img.into_raw();
}
