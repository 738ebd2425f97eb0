//! Идентификаторы элементов ландшафта
//!
//! Непрозрачные числовые константы, согласованные с каталогом террейна
//! движка. Генератор оперирует только этими id и не знает, как они
//! рисуются.

/// Каменный пол
pub const FEAT_FLOOR: u16 = 1;
/// Трава
pub const FEAT_GRASS: u16 = 2;
/// Земля/грязь
pub const FEAT_DIRT: u16 = 3;
/// Дерево
pub const FEAT_TREE: u16 = 4;
/// Песок
pub const FEAT_SAND: u16 = 5;
/// Скала
pub const FEAT_ROCK: u16 = 6;
/// Снег
pub const FEAT_SNOW: u16 = 7;
/// Мелководье
pub const FEAT_SHALLOW_WATER: u16 = 8;
/// Глубокая вода
pub const FEAT_DEEP_WATER: u16 = 9;
/// Лава
pub const FEAT_LAVA: u16 = 10;
/// Кислота
pub const FEAT_ACID: u16 = 11;
/// Дорога
pub const FEAT_ROAD: u16 = 12;
/// Неразрушаемая стена зданий
pub const FEAT_PERM_WALL: u16 = 13;
