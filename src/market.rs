//! Presentation fields for the web frontend.
//!
//! Prices, seasons and the nutrition badge are randomly generated for
//! display only. They are not market data and are never persisted.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::catalog::VegetableRef;

pub const SEASONS: [&str; 5] = ["春季", "夏季", "秋季", "冬季", "全年"];

const HISTORY_DAYS: usize = 30;
const MIN_PRICE: i32 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct NutritionBadge {
    #[serde(rename = "熱量")]
    pub calories: i32,
    #[serde(rename = "纖維")]
    pub fiber: f64,
    #[serde(rename = "維生素C")]
    pub vitamin_c: i32,
    #[serde(rename = "維生素A")]
    pub vitamin_a: i32,
    #[serde(rename = "鐵質")]
    pub iron: f64,
    #[serde(rename = "鈣質")]
    pub calcium: i32,
}

/// One vegetable as the frontend lists it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VegetableListing {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub season: &'static str,
    pub price_change: String,
    pub current_price: i32,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub price_history: Vec<i32>,
    pub nutrition: NutritionBadge,
}

/// Thirty daily prices around a base price in [20, 40], never below 5.
pub fn price_history<R: Rng + ?Sized>(rng: &mut R) -> Vec<i32> {
    let base: i32 = rng.gen_range(20..=40);
    (0..HISTORY_DAYS)
        .map(|_| (base + rng.gen_range(-3..=3)).max(MIN_PRICE))
        .collect()
}

/// Day-over-day change as a signed percentage, e.g. `+3.4%`.
pub fn price_change(previous: i32, current: i32) -> String {
    let delta = current - previous;
    let percent = if previous == 0 {
        0.0
    } else {
        f64::from(delta) / f64::from(previous) * 100.0
    };
    let sign = if delta >= 0 { "+" } else { "" };
    format!("{sign}{percent:.1}%")
}

pub fn nutrition_badge<R: Rng + ?Sized>(rng: &mut R) -> NutritionBadge {
    NutritionBadge {
        calories: rng.gen_range(15..=50),
        fiber: round1(rng.gen_range(1.0..=5.0)),
        vitamin_c: rng.gen_range(10..=100),
        vitamin_a: rng.gen_range(0..=500),
        iron: round1(rng.gen_range(0.3..=3.0)),
        calcium: rng.gen_range(10..=150),
    }
}

pub fn description(name: &str) -> String {
    format!("新鮮{name}，營養豐富，是您餐桌上的最佳選擇。")
}

/// Decorate a catalog entry with display fields. `with_image_url` adds the
/// duplicate `imageUrl` key the detail page reads.
pub fn listing<R: Rng + ?Sized>(
    rng: &mut R,
    vegetable: &VegetableRef,
    image: String,
    with_image_url: bool,
) -> VegetableListing {
    let price_history = price_history(rng);
    let current_price = price_history[HISTORY_DAYS - 1];
    let previous_price = price_history[HISTORY_DAYS - 2];

    VegetableListing {
        id: vegetable.id,
        name: vegetable.name.clone(),
        description: description(&vegetable.name),
        season: SEASONS.choose(rng).copied().unwrap_or("全年"),
        price_change: price_change(previous_price, current_price),
        current_price,
        image_url: with_image_url.then(|| image.clone()),
        image,
        price_history,
        nutrition: nutrition_badge(rng),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn history_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let history = price_history(&mut rng);
            assert_eq!(history.len(), 30);
            assert!(history.iter().all(|p| (17..=43).contains(p)));
            let spread = history.iter().max().unwrap() - history.iter().min().unwrap();
            assert!(spread <= 6);
        }
    }

    #[test]
    fn change_is_signed_and_rounded() {
        assert_eq!(price_change(30, 31), "+3.3%");
        assert_eq!(price_change(25, 23), "-8.0%");
        assert_eq!(price_change(20, 20), "+0.0%");
    }

    #[test]
    fn listing_fills_every_field() {
        let mut rng = StdRng::seed_from_u64(1);
        let veg = VegetableRef {
            id: 4,
            name: "芋頭".into(),
        };
        let listing = listing(&mut rng, &veg, "http://img/芋頭.jpg".into(), true);

        assert_eq!(listing.current_price, listing.price_history[29]);
        assert!(SEASONS.contains(&listing.season));
        assert_eq!(listing.image_url.as_deref(), Some("http://img/芋頭.jpg"));
        assert!(listing.description.contains("芋頭"));

        let json = serde_json::to_value(&listing).unwrap();
        assert!(json.get("priceHistory").is_some());
        assert!(json["nutrition"].get("維生素C").is_some());
    }

    #[test]
    fn list_entries_omit_image_url() {
        let mut rng = StdRng::seed_from_u64(2);
        let veg = VegetableRef {
            id: 1,
            name: "山蘇".into(),
        };
        let json = serde_json::to_value(listing(&mut rng, &veg, "x".into(), false)).unwrap();
        assert!(json.get("imageUrl").is_none());
    }
}
