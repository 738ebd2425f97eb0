// src/gentype.rs
//! Справочник типов генерации и классификатор террейна
//!
//! Каждый тип генерации описывает параллелепипед в пространстве
//! (высота, население, законность), вес при пересечениях и алгоритм
//! синтеза тайлов блока. Справочник загружается из TOML и после
//! загрузки неизменяем; встроенная таблица по умолчанию покрывает весь
//! диапазон параметров.

use crate::features::{
    FEAT_DEEP_WATER, FEAT_DIRT, FEAT_GRASS, FEAT_ROCK, FEAT_SAND, FEAT_SHALLOW_WATER, FEAT_SNOW,
    FEAT_TREE,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;

/// Включительный диапазон одного параметра классификации
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: u8,
    pub max: u8,
}

impl ParamRange {
    #[must_use]
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    /// Весь диапазон 0..=255
    #[must_use]
    pub const fn full() -> Self {
        Self { min: 0, max: 255 }
    }

    #[must_use]
    pub fn contains(self, value: u8) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Кандидат рельефной рутины: элемент и порог высоты
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureThreshold {
    pub feature: u16,
    pub threshold: u8,
}

/// Шаг накопительной рутины: элемент и шанс перехода дальше (в процентах)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureChance {
    pub feature: u16,
    pub chance: u8,
}

/// Алгоритм синтеза тайлов блока.
///
/// Вместо числового кода рутины — помеченное объединение: каждый
/// вариант несёт только свои параметры, а диспетчеризация проверяется
/// компилятором на полноту.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Routine {
    /// Фрактальный рельеф: до 4 кандидатов, выбор обратно
    /// пропорционален расстоянию высоты до порога
    Fractal { candidates: Vec<FeatureThreshold> },
    /// Накопительная цепочка: продвижение по парам (элемент, шанс),
    /// пока монетка выпадает удачно
    Cumulative { steps: Vec<FeatureChance> },
    /// Базовый террейн другого типа плюс концентрические кольца
    /// из центрированного фрактального поля
    Overlay { base: u16, rings: Vec<FeatureThreshold> },
    /// Застроенный участок: прямоугольник с травой/землёй/полосами,
    /// возможно со зданием
    Plot,
}

/// Описание одного типа генерации
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenTypeDef {
    pub id: u16,
    pub hgt: ParamRange,
    pub pop: ParamRange,
    pub law: ParamRange,
    /// Вес при пересечении нескольких типов
    pub chance: u32,
    pub routine: Routine,
}

impl GenTypeDef {
    fn matches(&self, hgt: u8, pop: u8, law: u8) -> bool {
        self.hgt.contains(hgt) && self.pop.contains(pop) && self.law.contains(law)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct GenTypeFile {
    gen_type: Vec<GenTypeDef>,
}

/// Неизменяемый справочник типов генерации
#[derive(Debug, Clone)]
pub struct GenTypeTable {
    defs: Vec<GenTypeDef>,
}

impl GenTypeTable {
    #[must_use]
    pub fn new(defs: Vec<GenTypeDef>) -> Self {
        Self { defs }
    }

    /// Загружает справочник из TOML-файла с таблицами `[[gen_type]]`
    pub fn from_toml_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let file: GenTypeFile = toml::from_str(&contents)?;
        Ok(Self::new(file.gen_type))
    }

    #[must_use]
    pub fn defs(&self) -> &[GenTypeDef] {
        &self.defs
    }

    #[must_use]
    pub fn get(&self, id: u16) -> Option<&GenTypeDef> {
        self.defs.iter().find(|d| d.id == id)
    }

    /// Классифицирует тройку параметров в id типа генерации.
    ///
    /// Ноль совпадений — откат к первому элементу справочника (аномалия
    /// данных, см. `validate`). Одно совпадение возвращается как есть.
    /// Несколько — взвешенный розыгрыш по накопленным суммам `chance`;
    /// при нулевой суммарной массе побеждает первое совпадение.
    /// Пустой справочник даёт id 0, который при синтезе блока
    /// откатится к травяному заполнению.
    pub fn classify<R: Rng>(&self, hgt: u8, pop: u8, law: u8, rng: &mut R) -> u16 {
        let matches: Vec<&GenTypeDef> =
            self.defs.iter().filter(|d| d.matches(hgt, pop, law)).collect();

        match matches.len() {
            0 => self.defs.first().map_or(0, |d| d.id),
            1 => matches[0].id,
            _ => {
                let total: u32 = matches.iter().map(|d| d.chance).sum();
                if total == 0 {
                    return matches[0].id;
                }
                let draw = rng.gen_range(0..total);
                let mut cumulative = 0u32;
                for def in &matches {
                    cumulative += def.chance;
                    if draw < cumulative {
                        return def.id;
                    }
                }
                matches[matches.len() - 1].id
            }
        }
    }

    /// Проверяет справочник и возвращает список предупреждений:
    /// пустая таблица, висячие ссылки `Overlay::base`, дырки в покрытии
    /// пространства параметров. Откат классификатора к первому элементу
    /// маскирует такие дырки, поэтому их стоит ловить на этапе данных.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.defs.is_empty() {
            warnings.push("справочник пуст: вся карта деградирует к траве".to_string());
            return warnings;
        }

        for def in &self.defs {
            if let Routine::Overlay { base, .. } = def.routine {
                if base == def.id {
                    warnings.push(format!("тип {}: оверлей ссылается сам на себя", def.id));
                } else if self.get(base).is_none() {
                    warnings.push(format!(
                        "тип {}: базовый тип {} отсутствует в справочнике",
                        def.id, base
                    ));
                }
            }
        }

        // Грубая сетка по всем трём осям: ловим непокрытые области
        let mut holes = 0usize;
        for h in (0..=255u16).step_by(32) {
            for p in (0..=255u16).step_by(32) {
                for l in (0..=255u16).step_by(32) {
                    let covered = self
                        .defs
                        .iter()
                        .any(|d| d.matches(h as u8, p as u8, l as u8));
                    if !covered {
                        holes += 1;
                    }
                }
            }
        }
        if holes > 0 {
            warnings.push(format!(
                "{holes} точек пробной сетки не покрыты ни одним типом (сработает откат)"
            ));
        }

        warnings
    }
}

impl Default for GenTypeTable {
    /// Встроенный справочник: полное покрытие по высоте, пересечения
    /// разруливаются весами
    fn default() -> Self {
        let defs = vec![
            // Глубокий океан
            GenTypeDef {
                id: 1,
                hgt: ParamRange::new(0, 31),
                pop: ParamRange::full(),
                law: ParamRange::full(),
                chance: 100,
                routine: Routine::Cumulative {
                    steps: vec![FeatureChance { feature: FEAT_DEEP_WATER, chance: 0 }],
                },
            },
            // Прибрежные воды
            GenTypeDef {
                id: 2,
                hgt: ParamRange::new(32, 63),
                pop: ParamRange::full(),
                law: ParamRange::full(),
                chance: 100,
                routine: Routine::Fractal {
                    candidates: vec![
                        FeatureThreshold { feature: FEAT_DEEP_WATER, threshold: 20 },
                        FeatureThreshold { feature: FEAT_SHALLOW_WATER, threshold: 100 },
                        FeatureThreshold { feature: FEAT_SAND, threshold: 190 },
                        FeatureThreshold { feature: FEAT_GRASS, threshold: 245 },
                    ],
                },
            },
            // Луга
            GenTypeDef {
                id: 3,
                hgt: ParamRange::new(64, 159),
                pop: ParamRange::full(),
                law: ParamRange::full(),
                chance: 100,
                routine: Routine::Fractal {
                    candidates: vec![
                        FeatureThreshold { feature: FEAT_DIRT, threshold: 40 },
                        FeatureThreshold { feature: FEAT_GRASS, threshold: 130 },
                        FeatureThreshold { feature: FEAT_TREE, threshold: 230 },
                    ],
                },
            },
            // Лес
            GenTypeDef {
                id: 4,
                hgt: ParamRange::new(96, 191),
                pop: ParamRange::new(0, 191),
                law: ParamRange::full(),
                chance: 60,
                routine: Routine::Fractal {
                    candidates: vec![
                        FeatureThreshold { feature: FEAT_GRASS, threshold: 60 },
                        FeatureThreshold { feature: FEAT_TREE, threshold: 160 },
                        FeatureThreshold { feature: FEAT_DIRT, threshold: 20 },
                        FeatureThreshold { feature: FEAT_ROCK, threshold: 250 },
                    ],
                },
            },
            // Пустошь: мало населения, мало закона
            GenTypeDef {
                id: 5,
                hgt: ParamRange::new(64, 159),
                pop: ParamRange::new(0, 63),
                law: ParamRange::new(0, 127),
                chance: 40,
                routine: Routine::Cumulative {
                    steps: vec![
                        FeatureChance { feature: FEAT_SAND, chance: 70 },
                        FeatureChance { feature: FEAT_DIRT, chance: 40 },
                        FeatureChance { feature: FEAT_ROCK, chance: 0 },
                    ],
                },
            },
            // Болото с озёрами поверх лугов
            GenTypeDef {
                id: 6,
                hgt: ParamRange::new(64, 127),
                pop: ParamRange::full(),
                law: ParamRange::new(0, 127),
                chance: 15,
                routine: Routine::Overlay {
                    base: 3,
                    rings: vec![
                        FeatureThreshold { feature: FEAT_DIRT, threshold: 140 },
                        FeatureThreshold { feature: FEAT_SHALLOW_WATER, threshold: 175 },
                        FeatureThreshold { feature: FEAT_DEEP_WATER, threshold: 215 },
                    ],
                },
            },
            // Холмы
            GenTypeDef {
                id: 7,
                hgt: ParamRange::new(160, 207),
                pop: ParamRange::full(),
                law: ParamRange::full(),
                chance: 100,
                routine: Routine::Fractal {
                    candidates: vec![
                        FeatureThreshold { feature: FEAT_GRASS, threshold: 70 },
                        FeatureThreshold { feature: FEAT_DIRT, threshold: 120 },
                        FeatureThreshold { feature: FEAT_ROCK, threshold: 200 },
                    ],
                },
            },
            // Горы
            GenTypeDef {
                id: 8,
                hgt: ParamRange::new(208, 255),
                pop: ParamRange::full(),
                law: ParamRange::full(),
                chance: 100,
                routine: Routine::Fractal {
                    candidates: vec![
                        FeatureThreshold { feature: FEAT_DIRT, threshold: 30 },
                        FeatureThreshold { feature: FEAT_ROCK, threshold: 140 },
                        FeatureThreshold { feature: FEAT_SNOW, threshold: 235 },
                    ],
                },
            },
            // Обжитые земли: высокое население
            GenTypeDef {
                id: 9,
                hgt: ParamRange::new(64, 191),
                pop: ParamRange::new(192, 255),
                law: ParamRange::new(128, 255),
                chance: 30,
                routine: Routine::Plot,
            },
        ];
        Self::new(defs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    #[test]
    fn classification_is_total_over_dataset() {
        let table = GenTypeTable::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for h in (0..=255u16).step_by(17) {
            for p in (0..=255u16).step_by(51) {
                for l in (0..=255u16).step_by(51) {
                    let id = table.classify(h as u8, p as u8, l as u8, &mut rng);
                    assert!(table.get(id).is_some(), "id {id} вне справочника");
                }
            }
        }
    }

    #[test]
    fn zero_matches_fall_back_to_first_entry() {
        let table = GenTypeTable::new(vec![GenTypeDef {
            id: 77,
            hgt: ParamRange::new(0, 10),
            pop: ParamRange::new(0, 10),
            law: ParamRange::new(0, 10),
            chance: 100,
            routine: Routine::Plot,
        }]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(table.classify(200, 200, 200, &mut rng), 77);
    }

    #[test]
    fn empty_table_degrades_to_zero() {
        let table = GenTypeTable::new(Vec::new());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(table.classify(10, 10, 10, &mut rng), 0);
        assert!(!table.validate().is_empty());
    }

    #[test]
    fn zero_total_chance_picks_first_match() {
        let def = |id| GenTypeDef {
            id,
            hgt: ParamRange::full(),
            pop: ParamRange::full(),
            law: ParamRange::full(),
            chance: 0,
            routine: Routine::Plot,
        };
        let table = GenTypeTable::new(vec![def(1), def(2), def(3)]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(table.classify(128, 128, 128, &mut rng), 1);
    }

    #[test]
    fn equal_weights_draw_roughly_uniform() {
        let def = |id| GenTypeDef {
            id,
            hgt: ParamRange::full(),
            pop: ParamRange::full(),
            law: ParamRange::full(),
            chance: 50,
            routine: Routine::Plot,
        };
        let table = GenTypeTable::new(vec![def(1), def(2), def(3), def(4)]);
        let mut rng = ChaCha8Rng::seed_from_u64(123);

        let trials = 4000usize;
        let mut counts: HashMap<u16, usize> = HashMap::new();
        for _ in 0..trials {
            *counts.entry(table.classify(0, 0, 0, &mut rng)).or_insert(0) += 1;
        }

        let expected = trials as f64 / 4.0;
        for id in 1..=4u16 {
            let n = *counts.get(&id).unwrap_or(&0) as f64;
            assert!(
                (n - expected).abs() / expected < 0.10,
                "тип {id} выбран {n} раз при ожидаемых {expected}"
            );
        }
    }

    #[test]
    fn default_table_has_no_dangling_overlay_bases() {
        let table = GenTypeTable::default();
        for w in table.validate() {
            assert!(
                !w.contains("отсутствует"),
                "висячая ссылка в таблице по умолчанию: {w}"
            );
        }
    }

    #[test]
    fn toml_round_trip() {
        let src = r#"
            [[gen_type]]
            id = 42
            hgt = { min = 0, max = 255 }
            pop = { min = 0, max = 255 }
            law = { min = 0, max = 255 }
            chance = 10

            [gen_type.routine]
            kind = "cumulative"
            steps = [{ feature = 2, chance = 0 }]
        "#;
        let file: GenTypeFile = toml::from_str(src).unwrap();
        let table = GenTypeTable::new(file.gen_type);
        assert_eq!(table.defs().len(), 1);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(table.classify(1, 1, 1, &mut rng), 42);
    }
}
