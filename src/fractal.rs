// src/fractal.rs
//! Фрактальный синтезатор высот (midpoint displacement)
//!
//! Квадратная сетка 17×17, которой пользуются все численные части
//! генератора: параметрические поля макрокарты, рельеф блоков, оверлеи
//! воды/лавы и интерполяция дорог. Незаполненные ячейки хранятся как
//! `None`, поэтому опорные значения, выставленные до `generate()`,
//! никогда не перезаписываются.

use rand::Rng;

/// Шаг сетки (N): сетка имеет размер (N+1)×(N+1)
pub const FRACTAL_STEP: usize = 16;
/// Полный размер стороны сетки
pub const FRACTAL_SIZE: usize = FRACTAL_STEP + 1;

/// Коэффициент шероховатости по умолчанию
pub const DEFAULT_ROUGHNESS: i32 = 16;

/// Множитель диагонального смещения ≈ 1/√2 — гасит артефакты
/// квадратной решётки в центрах ячеек
const DIAGONAL_DAMP: f32 = 0.707;

#[derive(Debug, Clone)]
pub struct FractalGrid {
    cells: Vec<Option<i32>>,
}

impl Default for FractalGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl FractalGrid {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: vec![None; FRACTAL_SIZE * FRACTAL_SIZE],
        }
    }

    /// Сбрасывает все ячейки в незаполненное состояние
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    fn idx(x: usize, y: usize) -> usize {
        y * FRACTAL_SIZE + x
    }

    /// Значение заполненной ячейки; незаполненная читается как 0
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> i32 {
        self.cells[Self::idx(x, y)].unwrap_or(0)
    }

    #[must_use]
    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        self.cells[Self::idx(x, y)].is_some()
    }

    pub fn set(&mut self, x: usize, y: usize, value: i32) {
        self.cells[Self::idx(x, y)] = Some(value);
    }

    /// Засевает четыре угла одним структурным значением
    pub fn set_corners(&mut self, value: i32) {
        self.set(0, 0, value);
        self.set(FRACTAL_STEP, 0, value);
        self.set(0, FRACTAL_STEP, value);
        self.set(FRACTAL_STEP, FRACTAL_STEP, value);
    }

    /// Засевает центральную ячейку
    pub fn set_center(&mut self, value: i32) {
        self.set(FRACTAL_STEP / 2, FRACTAL_STEP / 2, value);
    }

    /// Заполняет все пустые ячейки методом смещения средней точки.
    ///
    /// Шаг уменьшается вдвое от N до 1; на каждом уровне считаются
    /// горизонтальные середины, вертикальные середины и центры
    /// квадратов. Амплитуда случайного смещения пропорциональна
    /// текущему шагу, поэтому спектр получается фрактальным (1/f).
    /// Незасеянные углы получают случайные значения из того же ГПСЧ.
    pub fn generate<R: Rng>(&mut self, rng: &mut R, roughness: i32) {
        for (cx, cy) in [
            (0, 0),
            (FRACTAL_STEP, 0),
            (0, FRACTAL_STEP),
            (FRACTAL_STEP, FRACTAL_STEP),
        ] {
            if !self.is_filled(cx, cy) {
                self.set(cx, cy, rng.gen_range(0..256));
            }
        }
        self.diffuse(|rng, step| {
            let amp = (step as i32 * roughness) / 4;
            if amp > 0 { rng.gen_range(-amp..=amp) } else { 0 }
        }, rng);
    }

    /// Та же диффузия, но без случайных смещений — чистая интерполяция
    /// опорных значений (используется для сглаживания дорог).
    pub fn smooth(&mut self) {
        // ГПСЧ не нужен: смещение всегда нулевое
        let mut dummy = NoRng;
        self.diffuse(|_, _| 0, &mut dummy);
    }

    fn diffuse<R: Rng>(&mut self, mut offset: impl FnMut(&mut R, usize) -> i32, rng: &mut R) {
        let mut step = FRACTAL_STEP;
        while step > 1 {
            let half = step / 2;

            // Горизонтальные середины: среднее левого и правого соседа
            for y in (0..FRACTAL_SIZE).step_by(step) {
                for x in (half..FRACTAL_SIZE).step_by(step) {
                    if !self.is_filled(x, y) {
                        let v = (self.get(x - half, y) + self.get(x + half, y)) / 2;
                        self.set(x, y, v + offset(rng, step));
                    }
                }
            }

            // Вертикальные середины: среднее верхнего и нижнего
            for x in (0..FRACTAL_SIZE).step_by(step) {
                for y in (half..FRACTAL_SIZE).step_by(step) {
                    if !self.is_filled(x, y) {
                        let v = (self.get(x, y - half) + self.get(x, y + half)) / 2;
                        self.set(x, y, v + offset(rng, step));
                    }
                }
            }

            // Центры квадратов: среднее четырёх диагональных углов,
            // смещение придавлено множителем DIAGONAL_DAMP
            for y in (half..FRACTAL_SIZE).step_by(step) {
                for x in (half..FRACTAL_SIZE).step_by(step) {
                    if !self.is_filled(x, y) {
                        let v = (self.get(x - half, y - half)
                            + self.get(x + half, y - half)
                            + self.get(x - half, y + half)
                            + self.get(x + half, y + half))
                            / 4;
                        let d = (offset(rng, step) as f32 * DIAGONAL_DAMP) as i32;
                        self.set(x, y, v + d);
                    }
                }
            }

            step = half;
        }
    }
}

/// Заглушка ГПСЧ для `smooth()`: диффузия с нулевым смещением не
/// делает ни одной выборки
struct NoRng;

impl rand::RngCore for NoRng {
    fn next_u32(&mut self) -> u32 {
        0
    }
    fn next_u64(&mut self) -> u64 {
        0
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        dest.fill(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn generate_fills_every_cell() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut grid = FractalGrid::new();
        grid.set_corners(128);
        grid.generate(&mut rng, DEFAULT_ROUGHNESS);

        for y in 0..FRACTAL_SIZE {
            for x in 0..FRACTAL_SIZE {
                assert!(grid.is_filled(x, y), "пустая ячейка ({x},{y})");
            }
        }
    }

    #[test]
    fn seeded_cells_survive_generation() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut grid = FractalGrid::new();
        grid.set_corners(10);
        grid.set_center(250);
        grid.generate(&mut rng, DEFAULT_ROUGHNESS);

        assert_eq!(grid.get(0, 0), 10);
        assert_eq!(grid.get(FRACTAL_STEP, FRACTAL_STEP), 10);
        assert_eq!(grid.get(FRACTAL_STEP / 2, FRACTAL_STEP / 2), 250);
    }

    #[test]
    fn generation_is_deterministic() {
        let run = || {
            let mut rng = ChaCha8Rng::seed_from_u64(99);
            let mut grid = FractalGrid::new();
            grid.set_corners(64);
            grid.generate(&mut rng, DEFAULT_ROUGHNESS);
            (0..FRACTAL_SIZE)
                .flat_map(|y| (0..FRACTAL_SIZE).map(move |x| (x, y)))
                .map(|(x, y)| grid.get(x, y))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn smooth_interpolates_without_noise() {
        let mut grid = FractalGrid::new();
        grid.set_corners(0);
        grid.set_center(0);
        // середины рёбер — тоже опорные точки интерполяции
        grid.set(FRACTAL_STEP / 2, 0, 0);
        grid.set(FRACTAL_STEP / 2, FRACTAL_STEP, 0);
        grid.set(0, FRACTAL_STEP / 2, 0);
        grid.set(FRACTAL_STEP, FRACTAL_STEP / 2, 0);
        grid.smooth();

        // все опорные значения нулевые — интерполяция обязана дать ноль везде
        for y in 0..FRACTAL_SIZE {
            for x in 0..FRACTAL_SIZE {
                assert_eq!(grid.get(x, y), 0);
            }
        }
    }

    #[test]
    fn clear_resets_cells() {
        let mut grid = FractalGrid::new();
        grid.set(3, 3, 42);
        grid.clear();
        assert!(!grid.is_filled(3, 3));
    }
}
