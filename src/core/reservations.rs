//! Reglas de negocio para aceptar una reserva nueva.
//!
//! Todo es síncrono y sin E/S: el handler carga menú, reservas y ventana,
//! llama a [`place_reservation`] y guarda lo que haya cambiado.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

use crate::api::AppError;
use crate::db::{models::Extra, MenuItem, Reservation, ReservationTimeWindow};

const NUMBER_RANGE: std::ops::RangeInclusive<u32> = 1000..=9999;

#[derive(Debug, Error, PartialEq)]
pub enum ReservationError {
    #[error("お名前を入力してください")]
    MissingName,

    #[error("メニューを選択してください")]
    MissingFood,

    #[error("人数は1人以上で指定してください")]
    InvalidPeople,

    #[error("現在は予約時間外です（{message}）")]
    OutsideWindow { message: String },

    #[error("メニュー「{0}」は存在しません")]
    UnknownFood(String),

    #[error("「{0}」は売り切れです")]
    SoldOut(String),

    #[error("予約番号の空きがありません")]
    NumbersExhausted,
}

impl From<ReservationError> for AppError {
    fn from(error: ReservationError) -> Self {
        match error {
            ReservationError::MissingName => AppError::validation_field("name", &error.to_string()),
            ReservationError::MissingFood => AppError::validation_field("food", &error.to_string()),
            ReservationError::InvalidPeople => {
                AppError::validation_field("people", &error.to_string())
            }
            ReservationError::UnknownFood(ref food) => AppError::not_found_id("メニュー", food),
            ReservationError::OutsideWindow { .. }
            | ReservationError::SoldOut(_)
            | ReservationError::NumbersExhausted => {
                AppError::Validation(error.to_string())
            }
        }
    }
}

/// Datos que envía el alumno
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub name: String,
    pub food: String,
    pub people: Option<u32>,
    pub user_id: Option<String>,
}

/// Indica si la ventana de reservas admite una reserva a la hora `now`
///
/// Una ventana deshabilitada o ausente no restringe nada. Los extremos son
/// inclusivos. Si las horas configuradas no se pueden interpretar, la ventana
/// no bloquea.
pub fn window_allows(window: Option<&ReservationTimeWindow>, now: NaiveTime) -> bool {
    let Some(window) = window.filter(|w| w.enabled) else {
        return true;
    };

    let parse = |s: &str| NaiveTime::parse_from_str(s.trim(), "%H:%M");
    match (parse(&window.start_time), parse(&window.end_time)) {
        (Ok(start), Ok(end)) => {
            // Comparación a nivel de minuto, como las horas configuradas
            let now = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(now);
            now >= start && now <= end
        }
        _ => {
            tracing::warn!(
                start = %window.start_time,
                end = %window.end_time,
                "Unparseable reservation window, not enforcing it"
            );
            true
        }
    }
}

/// Texto descriptivo de la ventana para mensajes de error
pub fn window_message(window: &ReservationTimeWindow) -> String {
    if window.message.trim().is_empty() {
        format!("予約時間: {}-{}", window.start_time, window.end_time)
    } else {
        window.message.clone()
    }
}

/// Número de reserva de 4 cifras que no usa ninguna reserva viva
///
/// Devuelve `None` cuando las 9000 combinaciones están ocupadas.
pub fn unique_reservation_number(existing: &[Reservation], rng: &mut impl Rng) -> Option<u32> {
    let used: HashSet<u32> = existing
        .iter()
        .filter_map(|r| r.reservation_number)
        .filter(|n| NUMBER_RANGE.contains(n))
        .collect();

    let capacity = (NUMBER_RANGE.end() - NUMBER_RANGE.start() + 1) as usize;
    if used.len() >= capacity {
        return None;
    }

    loop {
        let candidate = rng.gen_range(NUMBER_RANGE);
        if !used.contains(&candidate) {
            return Some(candidate);
        }
    }
}

/// Valida y construye una reserva, descontando stock del menú
///
/// # Reglas
/// - Nombre y menú obligatorios, al menos 1 persona
/// - La ventana de reservas, si está habilitada, debe contener `now`
/// - El menú debe existir; stock 0 es "agotado"
/// - Stock distinto de -1 se decrementa exactamente en 1
///
/// `menu` sólo se modifica si la reserva se acepta.
pub fn place_reservation(
    menu: &mut [MenuItem],
    existing: &[Reservation],
    window: Option<&ReservationTimeWindow>,
    request: NewReservation,
    now: NaiveDateTime,
    rng: &mut impl Rng,
) -> Result<Reservation, ReservationError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ReservationError::MissingName);
    }

    let food = request.food.trim();
    if food.is_empty() {
        return Err(ReservationError::MissingFood);
    }

    let people = request.people.unwrap_or(1);
    if people == 0 {
        return Err(ReservationError::InvalidPeople);
    }

    if !window_allows(window, now.time()) {
        let message = window.map(window_message).unwrap_or_default();
        return Err(ReservationError::OutsideWindow { message });
    }

    let item = menu
        .iter_mut()
        .find(|item| item.name == food)
        .ok_or_else(|| ReservationError::UnknownFood(food.to_string()))?;

    let reservation_number = unique_reservation_number(existing, rng)
        .ok_or(ReservationError::NumbersExhausted)?;

    if !item.is_unlimited() {
        if item.stock <= 0 {
            return Err(ReservationError::SoldOut(item.name.clone()));
        }
        item.stock -= 1;
    }

    Ok(Reservation {
        id: now.and_utc().timestamp_millis(),
        date: now.format("%Y-%m-%d").to_string(),
        time: now.format("%H:%M").to_string(),
        name: name.to_string(),
        people,
        food: food.to_string(),
        reservation_number: Some(reservation_number),
        user_id: request.user_id,
        verified: None,
        extra: Extra::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::{rngs::StdRng, SeedableRng};

    fn at(hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(hh, mm, 0)
            .unwrap()
    }

    fn request(food: &str) -> NewReservation {
        NewReservation {
            name: "田中太郎".into(),
            food: food.into(),
            people: None,
            user_id: None,
        }
    }

    fn menu() -> Vec<MenuItem> {
        vec![
            MenuItem::new("カレーライス", 2),
            MenuItem::new("サラダ", -1),
            MenuItem::new("ラーメン", 0),
        ]
    }

    #[test]
    fn decrements_limited_stock_by_one() {
        let mut menu = menu();
        let mut rng = StdRng::seed_from_u64(7);
        let mut req = request("カレーライス");
        req.people = Some(3);

        let reservation = place_reservation(&mut menu, &[], None, req, at(12, 0), &mut rng).unwrap();

        assert_eq!(menu[0].stock, 1);
        assert_eq!(reservation.people, 3);
        assert_eq!(reservation.date, "2026-10-19");
        assert_eq!(reservation.time, "12:00");
        assert!(NUMBER_RANGE.contains(&reservation.reservation_number.unwrap()));
    }

    #[test]
    fn unlimited_stock_is_untouched() {
        let mut menu = menu();
        let mut rng = StdRng::seed_from_u64(7);
        place_reservation(&mut menu, &[], None, request("サラダ"), at(12, 0), &mut rng).unwrap();
        assert_eq!(menu[1].stock, -1);
    }

    #[test]
    fn sold_out_is_rejected_without_changes() {
        let mut menu = menu();
        let before = menu.clone();
        let mut rng = StdRng::seed_from_u64(7);

        let err = place_reservation(&mut menu, &[], None, request("ラーメン"), at(12, 0), &mut rng)
            .unwrap_err();

        assert_eq!(err, ReservationError::SoldOut("ラーメン".into()));
        assert_eq!(menu, before);
    }

    #[test]
    fn unknown_food_and_missing_fields() {
        let mut menu = menu();
        let mut rng = StdRng::seed_from_u64(7);

        let err = place_reservation(&mut menu, &[], None, request("そば"), at(12, 0), &mut rng)
            .unwrap_err();
        assert_eq!(err, ReservationError::UnknownFood("そば".into()));

        let mut req = request("カレーライス");
        req.name = "   ".into();
        let err = place_reservation(&mut menu, &[], None, req, at(12, 0), &mut rng).unwrap_err();
        assert_eq!(err, ReservationError::MissingName);

        let mut req = request("カレーライス");
        req.people = Some(0);
        let err = place_reservation(&mut menu, &[], None, req, at(12, 0), &mut rng).unwrap_err();
        assert_eq!(err, ReservationError::InvalidPeople);
    }

    #[test]
    fn window_is_inclusive_and_optional() {
        let window = ReservationTimeWindow::default();
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();

        assert!(window_allows(Some(&window), t(11, 30)));
        assert!(window_allows(Some(&window), t(12, 45)));
        assert!(!window_allows(Some(&window), t(12, 46)));
        assert!(!window_allows(Some(&window), t(9, 0)));

        let disabled = ReservationTimeWindow {
            enabled: false,
            ..window
        };
        assert!(window_allows(Some(&disabled), t(23, 0)));
        assert!(window_allows(None, t(23, 0)));
    }

    #[test]
    fn outside_window_is_rejected() {
        let mut menu = menu();
        let mut rng = StdRng::seed_from_u64(7);
        let window = ReservationTimeWindow::default();

        let err = place_reservation(
            &mut menu,
            &[],
            Some(&window),
            request("カレーライス"),
            at(15, 0),
            &mut rng,
        )
        .unwrap_err();

        assert!(matches!(err, ReservationError::OutsideWindow { ref message } if message.contains("11:30")));
        assert_eq!(menu[0].stock, 2);
    }

    fn numbered(numbers: impl IntoIterator<Item = u32>) -> Vec<Reservation> {
        numbers
            .into_iter()
            .map(|n| Reservation {
                id: n as i64,
                date: String::new(),
                time: String::new(),
                name: String::new(),
                people: 1,
                food: String::new(),
                reservation_number: Some(n),
                user_id: None,
                verified: None,
                extra: Extra::new(),
            })
            .collect()
    }

    #[test]
    fn reservation_number_avoids_existing_ones() {
        let existing = numbered((1000..=9998).chain([u32::MAX, 42]));
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(unique_reservation_number(&existing, &mut rng), Some(9999));
    }

    #[test]
    fn exhausted_numbers_reject_the_reservation() {
        let existing = numbered((1000..=9999).chain([u32::MAX]));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(unique_reservation_number(&existing, &mut rng), None);

        let mut menu = menu();
        let err = place_reservation(
            &mut menu,
            &existing,
            None,
            request("カレーライス"),
            at(12, 0),
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(err, ReservationError::NumbersExhausted);
        assert_eq!(menu[0].stock, 2);

        let app: AppError = err.into();
        assert_eq!(
            actix_web::ResponseError::status_code(&app),
            actix_web::http::StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn errors_map_to_http_categories() {
        use actix_web::{http::StatusCode, ResponseError};

        let not_found: AppError = ReservationError::UnknownFood("そば".into()).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let sold_out: AppError = ReservationError::SoldOut("ラーメン".into()).into();
        assert_eq!(sold_out.status_code(), StatusCode::BAD_REQUEST);
    }
}
