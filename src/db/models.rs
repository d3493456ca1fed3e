use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Campos desconocidos de un registro; se conservan tal cual al reescribir
pub type Extra = Map<String, Value>;

/// Stock que representa "sin límite"
pub const UNLIMITED_STOCK: i64 = -1;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Holiday {
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Holiday {
    /// Motivo para mostrar; "不明" si falta o está vacío
    pub fn display_reason(&self) -> &str {
        match self.reason.as_deref().map(str::trim) {
            Some(reason) if !reason.is_empty() => reason,
            _ => "不明",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MenuItem {
    pub name: String,
    pub stock: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl MenuItem {
    pub fn new(name: &str, stock: i64) -> Self {
        Self {
            name: name.to_string(),
            stock,
            extra: Extra::new(),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.stock == UNLIMITED_STOCK
    }
}

/// Plato destacado del día
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyMenu {
    pub date: String,
    pub food: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_people", deserialize_with = "lenient_people")]
    pub people: u32,
    #[serde(default)]
    pub food: String,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub reservation_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

fn default_people() -> u32 {
    1
}

/// Acepta un número como entero o como texto ("1234"); lo ilegible es `None`
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_people<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.unwrap_or_else(default_people))
}

/// Ventana horaria en la que se aceptan reservas nuevas
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationTimeWindow {
    pub start_time: String,
    pub end_time: String,
    pub enabled: bool,
    pub message: String,
}

impl Default for ReservationTimeWindow {
    fn default() -> Self {
        Self {
            start_time: "11:30".to_string(),
            end_time: "12:45".to_string(),
            enabled: true,
            message: "予約時間: 11:30-12:45".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub google_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Review {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Resumen de ventas de un día, añadido en cada reinicio diario
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecord {
    pub date: String,
    #[serde(default)]
    pub total_reservations: u64,
    #[serde(default)]
    pub total_people: u64,
    #[serde(default)]
    pub menu_sales: BTreeMap<String, u64>,
    #[serde(default)]
    pub time_slots: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastReset {
    pub last_reset: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn holiday_keeps_unknown_fields() {
        let raw = json!({"date": "2026-01-01", "reason": "元日", "note": "全館休館"});
        let holiday: Holiday = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(holiday.reason.as_deref(), Some("元日"));
        assert_eq!(serde_json::to_value(&holiday).unwrap(), raw);
    }

    #[test]
    fn holiday_without_reason_stays_without_reason() {
        let raw = json!({"date": "2026-01-02"});
        let holiday: Holiday = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(holiday.reason, None);
        assert_eq!(holiday.display_reason(), "不明");
        assert_eq!(serde_json::to_value(&holiday).unwrap(), raw);
    }

    #[test]
    fn reservation_defaults_are_lenient() {
        let reservation: Reservation =
            serde_json::from_value(json!({"name": "田中", "food": "ラーメン"})).unwrap();
        assert_eq!(reservation.people, 1);
        assert_eq!(reservation.reservation_number, None);

        let out = serde_json::to_value(&reservation).unwrap();
        assert!(out.get("userId").is_none());
        assert!(out.get("verified").is_none());
    }

    #[test]
    fn reservation_uses_camel_case_keys() {
        let reservation: Reservation = serde_json::from_value(json!({
            "id": 1, "date": "2026-10-19", "time": "12:00", "name": "佐藤",
            "people": 2, "food": "うどん", "reservationNumber": 4321, "userId": "user_1"
        }))
        .unwrap();
        assert_eq!(reservation.reservation_number, Some(4321));
        assert_eq!(reservation.user_id.as_deref(), Some("user_1"));
    }

    #[test]
    fn default_window_matches_lunch_service() {
        let window = ReservationTimeWindow::default();
        assert!(window.enabled);
        assert_eq!(window.start_time, "11:30");
        assert_eq!(window.end_time, "12:45");
    }
}
