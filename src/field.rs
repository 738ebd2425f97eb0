// src/field.rs
//! Скалярные параметрические поля макрокарты
//!
//! Три таких поля (высота, население, законность) строятся на каждый
//! запуск генерации: фрактальная сетка засевается из ГПСЧ, затем
//! передискретизируется ближайшим соседом до макроразрешения и
//! нормализуется в диапазон [0, 255].

use crate::fractal::{DEFAULT_ROUGHNESS, FRACTAL_STEP, FractalGrid};
use rand::Rng;

/// Двумерное поле значений 0..=255, по одному на макроячейку
#[derive(Debug, Clone)]
pub struct ScalarField {
    size: usize,
    data: Vec<u8>,
}

impl ScalarField {
    /// Синтезирует поле размера `size`×`size` из свежей фрактальной сетки
    #[must_use]
    pub fn build<R: Rng>(rng: &mut R, size: usize) -> Self {
        let mut grid = FractalGrid::new();
        for (cx, cy) in [
            (0, 0),
            (FRACTAL_STEP, 0),
            (0, FRACTAL_STEP),
            (FRACTAL_STEP, FRACTAL_STEP),
        ] {
            grid.set(cx, cy, rng.gen_range(0..256));
        }
        grid.generate(rng, DEFAULT_ROUGHNESS);

        // Передискретизация ближайшим соседом до макроразрешения
        let mut samples = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                let gx = nearest(x, size);
                let gy = nearest(y, size);
                samples.push(grid.get(gx, gy));
            }
        }

        normalize(&mut samples);
        Self {
            size,
            data: samples.into_iter().map(|v| v.clamp(0, 255) as u8).collect(),
        }
    }

    #[must_use]
    pub fn from_raw(size: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), size * size);
        Self { size, data }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.size + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.size + x] = value;
    }
}

fn nearest(macro_coord: usize, size: usize) -> usize {
    if size > 1 {
        macro_coord * FRACTAL_STEP / (size - 1)
    } else {
        0
    }
}

/// Растягивает значения так, чтобы минимум стал 0, а максимум 255.
/// Вырожденное константное поле остаётся нетронутым.
pub fn normalize(samples: &mut [i32]) {
    let Some(&first) = samples.first() else {
        return;
    };
    let mut min = first;
    let mut max = first;
    for &v in samples.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    if max == min {
        return;
    }
    for v in samples.iter_mut() {
        *v = (*v - min) * 255 / (max - min);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn normalize_spans_full_range() {
        let mut samples = vec![40, 70, 100, 55];
        normalize(&mut samples);
        assert_eq!(*samples.iter().min().unwrap(), 0);
        assert_eq!(*samples.iter().max().unwrap(), 255);
    }

    #[test]
    fn normalize_keeps_constant_field() {
        let mut samples = vec![13; 16];
        normalize(&mut samples);
        assert_eq!(samples, vec![13; 16]);
    }

    #[test]
    fn built_field_spans_full_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let field = ScalarField::build(&mut rng, 16);
        let values: Vec<u8> = (0..16)
            .flat_map(|y| (0..16).map(move |x| (x, y)))
            .map(|(x, y)| field.get(x, y))
            .collect();
        assert_eq!(*values.iter().min().unwrap(), 0);
        assert_eq!(*values.iter().max().unwrap(), 255);
    }

    #[test]
    fn build_is_deterministic() {
        let run = || {
            let mut rng = ChaCha8Rng::seed_from_u64(11);
            let f = ScalarField::build(&mut rng, 8);
            (0..8)
                .flat_map(|y| (0..8).map(move |x| (x, y)))
                .map(|(x, y)| f.get(x, y))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
