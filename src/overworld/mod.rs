//! Макрокарта надмирья: блоки, места, итоговая неизменяемая карта

pub mod generator;
pub mod hydrology;
pub mod roads;

use serde::{Deserialize, Serialize};

/// Битовые флаги макроблока и тайла
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoFlags(u16);

impl InfoFlags {
    pub const ROAD: u16 = 0x0001;
    pub const TRACK: u16 = 0x0002;
    pub const WATER: u16 = 0x0004;
    pub const LAVA: u16 = 0x0008;
    pub const ACID: u16 = 0x0010;

    /// Любой из опасных для дороги флагов
    pub const HAZARD: u16 = Self::WATER | Self::LAVA | Self::ACID;

    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn has(self, mask: u16) -> bool {
        self.0 & mask != 0
    }

    pub fn insert(&mut self, mask: u16) {
        self.0 |= mask;
    }

    pub fn remove(&mut self, mask: u16) {
        self.0 &= !mask;
    }
}

/// Категория места на макрокарте
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceKind {
    Town,
    Dungeon,
}

/// Город или вход в подземелье, занимающий прямоугольник макроячеек
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    /// Машинный ключ: `starting_town`, `town_2`, `dungeon_1`, ...
    pub key: String,
    pub kind: PlaceKind,
    /// Имя для игрока
    pub name: String,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    /// Сид для генерации внутренностей места
    pub seed: u64,
    /// Население в точке размещения (значение поля pop)
    pub population: u8,
    /// Тип обитателей подземелья; 0 для городов
    pub monster_type: u16,
}

impl Place {
    /// Центр занимаемого прямоугольника
    #[must_use]
    pub fn center(&self) -> (usize, usize) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    #[must_use]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Манхэттенское расстояние между центрами
    #[must_use]
    pub fn manhattan_to(&self, other: &Place) -> u32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax.abs_diff(bx) + ay.abs_diff(by)) as u32
    }
}

/// Одна ячейка макросетки
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MacroBlock {
    /// Id типа генерации из справочника
    pub terrain_type: u16,
    /// Индекс места в списке карты, если блок входит в его площадь
    pub place: Option<u16>,
    pub flags: InfoFlags,
    /// Уровень генерируемых монстров
    pub monster_level: u8,
    /// Вероятность генерации монстра (в процентах)
    pub monster_prob: u8,
}

/// Неизменяемая макрокарта: сетка блоков, список мест, сид и размер
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroMap {
    size: usize,
    seed: u64,
    blocks: Vec<MacroBlock>,
    places: Vec<Place>,
}

impl MacroMap {
    #[must_use]
    pub(crate) fn new(size: usize, seed: u64, blocks: Vec<MacroBlock>, places: Vec<Place>) -> Self {
        debug_assert_eq!(blocks.len(), size * size);
        Self { size, seed, blocks, places }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn block(&self, x: usize, y: usize) -> &MacroBlock {
        &self.blocks[y * self.size + x]
    }

    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.size && (y as usize) < self.size
    }

    #[must_use]
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Место по машинному ключу
    #[must_use]
    pub fn place(&self, key: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.key == key)
    }

    /// Стартовая позиция игрока: центр стартового города, а если его
    /// нет (карта без мест) — центр карты
    #[must_use]
    pub fn starting_position(&self) -> (usize, usize) {
        self.place(generator::STARTING_TOWN_KEY)
            .map_or((self.size / 2, self.size / 2), Place::center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_insert_and_remove() {
        let mut flags = InfoFlags::empty();
        flags.insert(InfoFlags::ROAD | InfoFlags::WATER);
        assert!(flags.has(InfoFlags::ROAD));
        assert!(flags.has(InfoFlags::HAZARD));
        flags.remove(InfoFlags::WATER);
        assert!(!flags.has(InfoFlags::HAZARD));
        assert!(flags.has(InfoFlags::ROAD));
    }

    #[test]
    fn place_geometry() {
        let place = Place {
            key: "town_1".into(),
            kind: PlaceKind::Town,
            name: "Тестоград".into(),
            x: 2,
            y: 3,
            width: 2,
            height: 2,
            seed: 0,
            population: 10,
            monster_type: 0,
        };
        assert_eq!(place.center(), (3, 4));
        assert!(place.contains(2, 3));
        assert!(place.contains(3, 4));
        assert!(!place.contains(4, 3));
    }
}
