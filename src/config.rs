// src/config.rs
//! Конфигурация генерации надмирья
//!
//! Все параметры, управляющие макрогенерацией: размер сетки, уровень
//! моря, гидрология, количество и разнос поселений, дороги. Структура
//! сериализуется в TOML, каждое поле имеет значение по умолчанию,
//! поэтому минимальный конфиг — это один сид.

use serde::{Deserialize, Serialize};
use std::fs;

/// Основные параметры генерации надмирья
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldParams {
    /// Сид генератора случайных чисел (детерминированная генерация)
    pub seed: u64,

    /// Сторона макросетки в блоках (по умолчанию 32)
    #[serde(default = "default_size")]
    pub size: usize,

    /// Делитель уровня моря: море ниже высоты 256 / sea_fraction
    #[serde(default = "default_sea_fraction")]
    pub sea_fraction: u32,

    /// Максимум рек (нисходящих проток от высоких точек)
    #[serde(default = "default_rivers")]
    pub rivers: usize,

    /// Минимальная высота истока реки
    #[serde(default = "default_river_source_level")]
    pub river_source_level: u8,

    /// Количество малых озёр
    #[serde(default = "default_lakes")]
    pub lakes: usize,

    /// Количество городов, включая стартовый
    #[serde(default = "default_towns")]
    pub towns: usize,

    /// Количество входов в подземелья
    #[serde(default = "default_dungeons")]
    pub dungeons: usize,

    /// Минимальное манхэттенское расстояние между местами одной категории
    #[serde(default = "default_min_place_distance")]
    pub min_place_distance: u32,

    /// Радиус поиска соседа при прокладке дорог
    #[serde(default = "default_road_range")]
    pub road_range: u32,

    /// Порог law+pop, выше которого прокладывается дорога, ниже — тропа
    #[serde(default = "default_road_threshold")]
    pub road_threshold: u32,

    /// Бюджет попыток размещения одного места
    #[serde(default = "default_place_attempts")]
    pub place_attempts: usize,
}

fn default_size() -> usize {
    32
}
fn default_sea_fraction() -> u32 {
    4
}
fn default_rivers() -> usize {
    12
}
fn default_river_source_level() -> u8 {
    200
}
fn default_lakes() -> usize {
    8
}
fn default_towns() -> usize {
    5
}
fn default_dungeons() -> usize {
    6
}
fn default_min_place_distance() -> u32 {
    6
}
fn default_road_range() -> u32 {
    16
}
fn default_road_threshold() -> u32 {
    180
}
fn default_place_attempts() -> usize {
    100
}

impl WorldParams {
    /// Параметры по умолчанию с заданным сидом
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, ..Self::default() }
    }

    /// Высота уровня моря, производная от `sea_fraction`
    #[must_use]
    pub fn sea_level(&self) -> u8 {
        (256 / self.sea_fraction.max(1)).min(255) as u8
    }

    /// Загружает параметры из TOML-файла
    ///
    /// # Ошибки
    /// Возвращает ошибку, если файл не найден или содержит недопустимый формат.
    pub fn from_toml_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let params: Self = toml::from_str(&contents)?;
        Ok(params)
    }
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            seed: 0,
            size: default_size(),
            sea_fraction: default_sea_fraction(),
            rivers: default_rivers(),
            river_source_level: default_river_source_level(),
            lakes: default_lakes(),
            towns: default_towns(),
            dungeons: default_dungeons(),
            min_place_distance: default_min_place_distance(),
            road_range: default_road_range(),
            road_threshold: default_road_threshold(),
            place_attempts: default_place_attempts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let params: WorldParams = toml::from_str("seed = 42").unwrap();
        assert_eq!(params.seed, 42);
        assert_eq!(params.size, 32);
        assert_eq!(params.sea_level(), 64);
    }

    #[test]
    fn sea_level_respects_fraction() {
        let mut params = WorldParams::with_seed(1);
        params.sea_fraction = 8;
        assert_eq!(params.sea_level(), 32);
        params.sea_fraction = 1;
        assert_eq!(params.sea_level(), 255);
    }
}
