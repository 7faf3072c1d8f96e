//! Nutrient vocabulary shared by the catalog, the recommender and the cards.
//!
//! Values are per 100 g edible portion. Column keys double as the database
//! column names in `vege_nutrition` and carry their unit as the last `_`
//! segment (`iron_mg` is milligrams).

use std::fmt;

/// One of the nutrients tracked per vegetable, in canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nutrient {
    Calories,
    Water,
    Protein,
    Fat,
    Carbohydrate,
    Fiber,
    Sugar,
    Sodium,
    Potassium,
    Calcium,
    Magnesium,
    Iron,
    Zinc,
    Phosphorus,
    VitaminA,
    VitaminC,
    VitaminE,
    VitaminB1,
    FolicAcid,
}

impl Nutrient {
    pub const COUNT: usize = 19;

    pub const ALL: [Nutrient; Nutrient::COUNT] = [
        Nutrient::Calories,
        Nutrient::Water,
        Nutrient::Protein,
        Nutrient::Fat,
        Nutrient::Carbohydrate,
        Nutrient::Fiber,
        Nutrient::Sugar,
        Nutrient::Sodium,
        Nutrient::Potassium,
        Nutrient::Calcium,
        Nutrient::Magnesium,
        Nutrient::Iron,
        Nutrient::Zinc,
        Nutrient::Phosphorus,
        Nutrient::VitaminA,
        Nutrient::VitaminC,
        Nutrient::VitaminE,
        Nutrient::VitaminB1,
        Nutrient::FolicAcid,
    ];

    /// Column key, e.g. `vitamin_c_mg`.
    pub fn key(self) -> &'static str {
        match self {
            Nutrient::Calories => "calories_kcal",
            Nutrient::Water => "water_g",
            Nutrient::Protein => "protein_g",
            Nutrient::Fat => "fat_g",
            Nutrient::Carbohydrate => "carb_g",
            Nutrient::Fiber => "fiber_g",
            Nutrient::Sugar => "sugar_g",
            Nutrient::Sodium => "sodium_mg",
            Nutrient::Potassium => "potassium_mg",
            Nutrient::Calcium => "calcium_mg",
            Nutrient::Magnesium => "magnesium_mg",
            Nutrient::Iron => "iron_mg",
            Nutrient::Zinc => "zinc_mg",
            Nutrient::Phosphorus => "phosphorus_mg",
            Nutrient::VitaminA => "vitamin_a_iu",
            Nutrient::VitaminC => "vitamin_c_mg",
            Nutrient::VitaminE => "vitamin_e_mg",
            Nutrient::VitaminB1 => "vitamin_b1_mg",
            Nutrient::FolicAcid => "folic_acid_ug",
        }
    }

    /// Name shown to users.
    pub fn display_name(self) -> &'static str {
        match self {
            Nutrient::Calories => "熱量",
            Nutrient::Water => "水",
            Nutrient::Protein => "蛋白質",
            Nutrient::Fat => "脂肪",
            Nutrient::Carbohydrate => "碳水化合物",
            Nutrient::Fiber => "膳食纖維",
            Nutrient::Sugar => "糖",
            Nutrient::Sodium => "鈉",
            Nutrient::Potassium => "鉀",
            Nutrient::Calcium => "鈣",
            Nutrient::Magnesium => "鎂",
            Nutrient::Iron => "鐵",
            Nutrient::Zinc => "鋅",
            Nutrient::Phosphorus => "磷",
            Nutrient::VitaminA => "維生素A",
            Nutrient::VitaminC => "維生素C",
            Nutrient::VitaminE => "維生素E",
            Nutrient::VitaminB1 => "維生素B1",
            Nutrient::FolicAcid => "葉酸",
        }
    }

    /// Unit abbreviation taken from the key suffix.
    pub fn unit_abbreviation(self) -> &'static str {
        let key = self.key();
        key.rsplit_once('_').map(|(_, unit)| unit).unwrap_or("")
    }

    /// Unit shown to users.
    pub fn unit(self) -> &'static str {
        unit_label(self.unit_abbreviation())
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Resolve free text (key, display name, English stem or a common
    /// synonym) to a nutrient.
    pub fn resolve(term: &str) -> Option<Nutrient> {
        let normalized = normalize(term);
        if normalized.is_empty() {
            return None;
        }

        for nutrient in Nutrient::ALL {
            if normalized == normalize(nutrient.key())
                || normalized == normalize(nutrient.display_name())
                || normalized == normalize(nutrient.english_stem())
            {
                return Some(nutrient);
            }
        }

        SYNONYMS
            .iter()
            .find(|(synonym, _)| normalize(synonym) == normalized)
            .map(|(_, nutrient)| *nutrient)
    }

    /// Key without its unit suffix, with spaces for underscores.
    fn english_stem(self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::Water => "water",
            Nutrient::Protein => "protein",
            Nutrient::Fat => "fat",
            Nutrient::Carbohydrate => "carb",
            Nutrient::Fiber => "fiber",
            Nutrient::Sugar => "sugar",
            Nutrient::Sodium => "sodium",
            Nutrient::Potassium => "potassium",
            Nutrient::Calcium => "calcium",
            Nutrient::Magnesium => "magnesium",
            Nutrient::Iron => "iron",
            Nutrient::Zinc => "zinc",
            Nutrient::Phosphorus => "phosphorus",
            Nutrient::VitaminA => "vitamin a",
            Nutrient::VitaminC => "vitamin c",
            Nutrient::VitaminE => "vitamin e",
            Nutrient::VitaminB1 => "vitamin b1",
            Nutrient::FolicAcid => "folic acid",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

const SYNONYMS: &[(&str, Nutrient)] = &[
    ("卡路里", Nutrient::Calories),
    ("kcal", Nutrient::Calories),
    ("水分", Nutrient::Water),
    ("碳水", Nutrient::Carbohydrate),
    ("醣類", Nutrient::Carbohydrate),
    ("carbohydrate", Nutrient::Carbohydrate),
    ("纖維", Nutrient::Fiber),
    ("纖維質", Nutrient::Fiber),
    ("糖分", Nutrient::Sugar),
    ("鈉質", Nutrient::Sodium),
    ("鉀質", Nutrient::Potassium),
    ("鈣質", Nutrient::Calcium),
    ("鎂質", Nutrient::Magnesium),
    ("鐵質", Nutrient::Iron),
    ("鋅質", Nutrient::Zinc),
    ("維他命A", Nutrient::VitaminA),
    ("維他命C", Nutrient::VitaminC),
    ("維他命E", Nutrient::VitaminE),
    ("維他命B1", Nutrient::VitaminB1),
    ("folate", Nutrient::FolicAcid),
];

/// Chinese unit label for a unit abbreviation; unknown units map to "".
pub fn unit_label(abbreviation: &str) -> &'static str {
    match abbreviation.to_ascii_lowercase().as_str() {
        "kcal" => "大卡",
        "g" => "克",
        "mg" => "毫克",
        "iu" => "IU",
        "ug" => "微克",
        _ => "",
    }
}

/// One decimal place, or `N/A` for missing data.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.1}"),
        _ => "N/A".to_string(),
    }
}

fn normalize(term: &str) -> String {
    term.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Nutrient values of one vegetable, indexed by [`Nutrient`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NutrientProfile {
    values: [Option<f64>; Nutrient::COUNT],
}

impl NutrientProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, nutrient: Nutrient) -> Option<f64> {
        self.values[nutrient.index()]
    }

    pub fn set(&mut self, nutrient: Nutrient, value: Option<f64>) {
        self.values[nutrient.index()] = value;
    }

    pub fn with(mut self, nutrient: Nutrient, value: f64) -> Self {
        self.set(nutrient, Some(value));
        self
    }

    /// Entries in canonical order, missing values included.
    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, Option<f64>)> + '_ {
        Nutrient::ALL.iter().map(|n| (*n, self.get(*n)))
    }

    pub fn has_values(&self) -> bool {
        self.values.iter().any(Option::is_some)
    }
}
