//! Reinicio diario: archiva las reservas del día anterior como ventas,
//! vacía la lista de reservas, repone stock y elige el plato del día.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::{DailyMenu, JsonStore, LastReset, MenuItem, Reservation, SalesRecord};
use crate::db::store::Result;

/// Stock por defecto tras el reinicio
pub const DEFAULT_STOCK: &[(&str, i64)] = &[
    ("カレーライス", 50),
    ("ハンバーグ定食", 30),
    ("唐揚げ定食", 40),
    ("魚の煮付け定食", 25),
    ("ラーメン", 60),
    ("うどん", 50),
    ("そば", 45),
    ("サラダ", 100),
    ("味噌汁", 100),
    ("ご飯", 200),
];

/// Candidatos a plato del día
pub const FEATURED_OPTIONS: &[&str] = &[
    "カレーライス",
    "ハンバーグ定食",
    "唐揚げ定食",
    "魚の煮付け定食",
    "ラーメン",
    "うどん",
    "そば",
];

const UNSPECIFIED: &str = "未指定";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResetOutcome {
    pub date: String,
    pub sales: SalesRecord,
    pub featured: String,
    pub cleared_reservations: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResetStatus {
    pub needs_reset: bool,
    pub last_reset: Option<String>,
    pub last_reset_time: Option<String>,
    pub today: String,
}

/// Agrega la lista de reservas en un registro de ventas con fecha `date`
pub fn summarize_day(reservations: &[Reservation], date: NaiveDate) -> SalesRecord {
    let mut menu_sales: BTreeMap<String, u64> = BTreeMap::new();
    let mut time_slots: BTreeMap<String, u64> = BTreeMap::new();
    let mut total_people = 0u64;

    for reservation in reservations {
        let people = u64::from(reservation.people);
        total_people += people;

        let food = non_empty_or(&reservation.food, UNSPECIFIED);
        *menu_sales.entry(food).or_default() += people;

        let time = non_empty_or(&reservation.time, UNSPECIFIED);
        *time_slots.entry(time).or_default() += people;
    }

    SalesRecord {
        date: date.format("%Y-%m-%d").to_string(),
        total_reservations: reservations.len() as u64,
        total_people,
        menu_sales,
        time_slots,
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Repone el stock por defecto
///
/// Los platos conocidos recuperan su cantidad por defecto, los ilimitados
/// siguen ilimitados y el resto no cambia. Un menú vacío se siembra con los
/// valores por defecto.
pub fn restock(menu: &mut Vec<MenuItem>) {
    if menu.is_empty() {
        menu.extend(DEFAULT_STOCK.iter().map(|(name, stock)| MenuItem::new(name, *stock)));
        return;
    }

    for item in menu.iter_mut().filter(|item| !item.is_unlimited()) {
        if let Some((_, stock)) = DEFAULT_STOCK.iter().find(|(name, _)| *name == item.name) {
            item.stock = *stock;
        }
    }
}

/// Elige de forma uniforme el plato del día
pub fn pick_featured(rng: &mut impl Rng) -> String {
    FEATURED_OPTIONS
        .choose(rng)
        .copied()
        .unwrap_or(FEATURED_OPTIONS[0])
        .to_string()
}

/// Inserta o sustituye el plato destacado de `date`
pub fn upsert_daily_menu(daily: &mut Vec<DailyMenu>, date: &str, food: &str) {
    match daily.iter_mut().find(|m| m.date == date) {
        Some(entry) => entry.food = food.to_string(),
        None => daily.push(DailyMenu {
            date: date.to_string(),
            food: food.to_string(),
        }),
    }
}

/// Ejecuta el reinicio completo sobre el almacén
///
/// Se toma el candado de escritura durante toda la secuencia. `featured`
/// llega ya elegido para que el llamador controle la aleatoriedad.
pub async fn perform_daily_reset(
    store: &JsonStore,
    now: NaiveDateTime,
    featured: String,
) -> Result<ResetOutcome> {
    let _guard = store.exclusive().await;

    let today = now.date();
    let today_str = today.format("%Y-%m-%d").to_string();
    let yesterday = today - Duration::days(1);

    // 1. Ventas del día anterior
    let reservations = store.reservations().load().await?;
    let record = summarize_day(&reservations, yesterday);

    let mut sales = store.sales().load().await?;
    sales.push(record.clone());
    store.sales().save(&sales).await?;

    // 2. Reservas a cero
    store.reservations().save(&Vec::new()).await?;

    // 3. Stock por defecto
    let mut menu = store.menu().load().await?;
    restock(&mut menu);
    store.menu().save(&menu).await?;

    // 4. Plato del día
    let mut daily = store.daily_menu().load().await?;
    upsert_daily_menu(&mut daily, &today_str, &featured);
    store.daily_menu().save(&daily).await?;

    // 5. Marca de reinicio
    store
        .last_reset()
        .save(&Some(LastReset {
            last_reset: today_str.clone(),
            timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        }))
        .await?;

    tracing::info!(
        date = %today_str,
        archived = %record.date,
        reservations = record.total_reservations,
        people = record.total_people,
        featured = %featured,
        "Daily reset completed"
    );

    Ok(ResetOutcome {
        date: today_str,
        sales: record,
        featured,
        cleared_reservations: reservations.len(),
    })
}

/// Estado del último reinicio
pub async fn reset_status(store: &JsonStore, today: NaiveDate) -> Result<ResetStatus> {
    let last = store.last_reset().load().await?;
    let today = today.format("%Y-%m-%d").to_string();

    Ok(ResetStatus {
        needs_reset: last.as_ref().map_or(true, |l| l.last_reset != today),
        last_reset: last.as_ref().map(|l| l.last_reset.clone()),
        last_reset_time: last.map(|l| l.timestamp),
        today,
    })
}
