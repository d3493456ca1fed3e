//! Informe mensual a partir de `sales.json`.

use serde::{ser::SerializeMap, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::db::SalesRecord;

const TOP_MENU_LEN: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    pub date: String,
    pub reservations: u64,
    pub people: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MenuRanking {
    pub name: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub total_days: usize,
    pub total_reservations: u64,
    pub total_people: u64,
    pub menu_sales: BTreeMap<String, u64>,
    pub daily_sales: Vec<DailySales>,
    pub time_slot_sales: BTreeMap<String, u64>,
    /// Se serializa como `{ "メニュー": cantidad }` en orden de ranking
    #[serde(serialize_with = "ranking_as_map")]
    pub top_menu: Vec<MenuRanking>,
    pub average_daily_people: f64,
    pub busiest_day: Option<String>,
    pub busiest_time_slot: Option<String>,
}

/// Construye el informe de `year`/`month` en una sola pasada
///
/// Sólo cuentan los registros cuya fecha empieza por `YYYY-MM-`.
pub fn build(sales: &[SalesRecord], year: i32, month: u32) -> MonthlyReport {
    let prefix = format!("{:04}-{:02}-", year, month);

    let mut total_reservations = 0u64;
    let mut total_people = 0u64;
    let mut menu_sales: BTreeMap<String, u64> = BTreeMap::new();
    let mut time_slot_sales: BTreeMap<String, u64> = BTreeMap::new();
    let mut daily_sales = Vec::new();

    let mut busiest_day: Option<String> = None;
    let mut busiest_day_people = 0u64;

    for record in sales.iter().filter(|r| r.date.starts_with(&prefix)) {
        total_reservations += record.total_reservations;
        total_people += record.total_people;

        for (food, qty) in &record.menu_sales {
            *menu_sales.entry(food.clone()).or_default() += qty;
        }
        for (slot, qty) in &record.time_slots {
            *time_slot_sales.entry(slot.clone()).or_default() += qty;
        }

        if record.total_people > busiest_day_people {
            busiest_day_people = record.total_people;
            busiest_day = Some(record.date.clone());
        }

        daily_sales.push(DailySales {
            date: record.date.clone(),
            reservations: record.total_reservations,
            people: record.total_people,
        });
    }

    let total_days = daily_sales.len();
    let average_daily_people = if total_days == 0 {
        0.0
    } else {
        (total_people as f64 / total_days as f64 * 10.0).round() / 10.0
    };

    let mut busiest_time_slot = None;
    let mut busiest_slot_people = 0u64;
    for (slot, qty) in &time_slot_sales {
        if *qty > busiest_slot_people {
            busiest_slot_people = *qty;
            busiest_time_slot = Some(slot.clone());
        }
    }

    MonthlyReport {
        year,
        month,
        total_days,
        total_reservations,
        total_people,
        top_menu: top_menu(&menu_sales),
        menu_sales,
        daily_sales,
        time_slot_sales,
        average_daily_people,
        busiest_day,
        busiest_time_slot,
    }
}

fn top_menu(menu_sales: &BTreeMap<String, u64>) -> Vec<MenuRanking> {
    let mut ranking: Vec<MenuRanking> = menu_sales
        .iter()
        .map(|(name, quantity)| MenuRanking {
            name: name.clone(),
            quantity: *quantity,
        })
        .collect();

    // Empates por nombre para un orden estable
    ranking.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    ranking.truncate(TOP_MENU_LEN);
    ranking
}

fn ranking_as_map<S: Serializer>(ranking: &[MenuRanking], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(ranking.len()))?;
    for entry in ranking {
        map.serialize_entry(&entry.name, &entry.quantity)?;
    }
    map.end()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

impl MonthlyReport {
    /// Nombre del adjunto CSV
    pub fn csv_filename(&self) -> String {
        format!("monthly_report_{:04}_{:02}.csv", self.year, self.month)
    }

    /// Texto CSV por secciones
    pub fn to_csv(&self) -> String {
        let mut lines = vec![
            format!("{}年{}月 月次レポート", self.year, self.month),
            String::new(),
            "基本統計".to_string(),
            "項目,値".to_string(),
            format!("営業日数,{}", self.total_days),
            format!("総予約数,{}", self.total_reservations),
            format!("総人数,{}", self.total_people),
            format!("1日平均人数,{:.1}", self.average_daily_people),
            format!("最繁忙日,{}", csv_field(self.busiest_day.as_deref().unwrap_or("-"))),
            format!(
                "最繁忙時間帯,{}",
                csv_field(self.busiest_time_slot.as_deref().unwrap_or("-"))
            ),
            String::new(),
            "メニュー別売上".to_string(),
            "メニュー,数量".to_string(),
        ];

        lines.extend(
            self.menu_sales
                .iter()
                .map(|(name, qty)| format!("{},{}", csv_field(name), qty)),
        );

        lines.push(String::new());
        lines.push("時間帯別売上".to_string());
        lines.push("時間帯,人数".to_string());
        lines.extend(
            self.time_slot_sales
                .iter()
                .map(|(slot, qty)| format!("{},{}", csv_field(slot), qty)),
        );

        lines.push(String::new());
        lines.push("日別売上".to_string());
        lines.push("日付,予約数,人数".to_string());
        lines.extend(self.daily_sales.iter().map(|day| {
            format!("{},{},{}", csv_field(&day.date), day.reservations, day.people)
        }));

        let mut csv = lines.join("\n");
        csv.push('\n');
        csv
    }
}
