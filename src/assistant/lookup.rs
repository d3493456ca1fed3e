//! Respuestas deterministas a partir de los datos del comedor.

use chrono::NaiveDate;
use rand::Rng;

use super::{intent, pick};
use crate::core::congestion::Congestion;
use crate::db::store::Result;
use crate::db::{Holiday, JsonStore, ReservationTimeWindow};

/// Datos del día que necesita el asistente, leídos una sola vez por mensaje
#[derive(Debug, Clone, Default)]
pub struct CafeteriaSnapshot {
    pub holiday: Option<Holiday>,
    pub featured: Option<String>,
    pub window: Option<ReservationTimeWindow>,
    pub reservation_count: usize,
}

impl CafeteriaSnapshot {
    pub async fn load(store: &JsonStore, today: NaiveDate) -> Result<Self> {
        let today = today.format("%Y-%m-%d").to_string();

        let holiday = store
            .holidays()
            .load()
            .await?
            .into_iter()
            .find(|h| h.date == today);

        let featured = store
            .daily_menu()
            .load()
            .await?
            .into_iter()
            .find(|m| m.date == today)
            .map(|m| m.food);

        let window = store.reservation_times().load().await?;
        // Todas las reservas vivas, aunque no se haya hecho el reinicio
        let reservation_count = store.reservations().load().await?.len();

        Ok(Self {
            holiday,
            featured,
            window,
            reservation_count,
        })
    }

    pub fn congestion(&self) -> Congestion {
        Congestion::from_count(self.reservation_count)
    }
}

/// Respuesta basada en datos, o `None` si el mensaje no trata de ellos
///
/// El orden importa: menú, cierre, ventana de reservas y ocupación.
pub fn answer(snapshot: &CafeteriaSnapshot, message: &str, rng: &mut impl Rng) -> Option<String> {
    if intent::mentions(message, intent::MENU_DATA) {
        return Some(menu_answer(snapshot, rng));
    }

    if intent::mentions(message, intent::HOLIDAY_DATA) {
        return Some(holiday_answer(snapshot, rng));
    }

    if intent::mentions(message, intent::WINDOW_DATA) {
        return Some(window_answer(snapshot, rng));
    }

    if intent::mentions(message, intent::CONGESTION_DATA) {
        let count = snapshot.reservation_count;
        let label = snapshot.congestion().label();
        let text = match rng.gen_range(0..3) {
            0 => format!("現在の予約人数は{count}人です。\n\n混雑予測: {label}"),
            1 => format!("予約人数は{count}人となっています。\n\n混雑予測: {label}"),
            _ => format!("現在{count}人の予約があります。\n\n混雑予測: {label}"),
        };
        return Some(text);
    }

    None
}

fn menu_answer(snapshot: &CafeteriaSnapshot, rng: &mut impl Rng) -> String {
    let food = snapshot.featured.as_deref().unwrap_or("未設定");
    let status = match &snapshot.holiday {
        Some(holiday) => format!("休業（理由: {}）", holiday.display_reason()),
        None => "営業予定".to_string(),
    };

    match rng.gen_range(0..3) {
        0 => format!("本日の定食は「{food}」です。\n\n営業状況は{status}です。"),
        1 => format!("今日の定食は「{food}」となっています。\n\n営業状況は{status}です。"),
        _ => format!("本日の定食メニューは「{food}」です。\n\n営業状況は{status}です。"),
    }
}

fn holiday_answer(snapshot: &CafeteriaSnapshot, rng: &mut impl Rng) -> String {
    match &snapshot.holiday {
        Some(holiday) => {
            let reason = holiday.display_reason();
            match rng.gen_range(0..3) {
                0 => format!("本日は🚫 休業となっております。\n\n理由: {reason}"),
                1 => format!("申し訳ございませんが、本日は🚫 休業です。\n\n理由: {reason}"),
                _ => format!("本日は🚫 休業となっています。\n\n理由: {reason}"),
            }
        }
        None => pick(
            rng,
            &["本日は✅ 営業予定です。", "本日は✅ 営業しています。", "本日は✅ 営業予定となっています。"],
        )
        .to_string(),
    }
}

fn window_answer(snapshot: &CafeteriaSnapshot, rng: &mut impl Rng) -> String {
    match snapshot.window.as_ref().filter(|w| w.enabled) {
        Some(window) => {
            let (start, end) = (&window.start_time, &window.end_time);
            let note = if window.message.trim().is_empty() {
                String::new()
            } else {
                format!("\n\n補足: {}", window.message)
            };
            match rng.gen_range(0..3) {
                0 => format!("予約可能時間は{start}から{end}までです。{note}"),
                1 => format!("予約は{start}から{end}まで受け付けています。{note}"),
                _ => format!("予約可能時間は{start}〜{end}です。{note}"),
            }
        }
        None => pick(
            rng,
            &[
                "予約時間の制限は現在ありません。いつでも予約可能です。",
                "予約はいつでも可能です。時間制限はありません。",
                "予約時間の制限はありません。いつでも予約できます。",
            ],
        )
        .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Extra;
    use rand::{rngs::StdRng, SeedableRng};

    fn snapshot() -> CafeteriaSnapshot {
        CafeteriaSnapshot {
            holiday: None,
            featured: Some("カレーライス".into()),
            window: Some(ReservationTimeWindow::default()),
            reservation_count: 15,
        }
    }

    fn ask(snapshot: &CafeteriaSnapshot, message: &str) -> Option<String> {
        answer(snapshot, &message.to_lowercase(), &mut StdRng::seed_from_u64(3))
    }

    #[test]
    fn menu_question_mentions_featured_dish() {
        let reply = ask(&snapshot(), "今日の定食は？").unwrap();
        assert!(reply.contains("カレーライス"));
        assert!(reply.contains("営業予定"));
    }

    #[test]
    fn holiday_today_includes_reason() {
        let mut snap = snapshot();
        snap.holiday = Some(Holiday {
            date: "2026-10-19".into(),
            reason: Some("設備点検".into()),
            extra: Extra::new(),
        });

        let reply = ask(&snap, "holiday today").unwrap();
        assert!(reply.contains("休業"));
        assert!(reply.contains("設備点検"));
    }

    #[test]
    fn window_takes_precedence_over_congestion() {
        let reply = ask(&snapshot(), "予約時間を教えて").unwrap();
        assert!(reply.contains("11:30"));
        assert!(reply.contains("補足"));

        let mut snap = snapshot();
        snap.window = None;
        assert!(ask(&snap, "予約可能ですか").unwrap().contains("制限"));
    }

    #[test]
    fn congestion_uses_reservation_count() {
        let reply = ask(&snapshot(), "混雑していますか").unwrap();
        assert!(reply.contains("15人"));
        assert!(reply.contains("やや混雑"));
    }

    #[test]
    fn unrelated_message_is_not_answered() {
        assert_eq!(ask(&snapshot(), "こんにちは"), None);
    }

    #[test]
    fn missing_featured_dish_is_reported() {
        let mut snap = snapshot();
        snap.featured = None;
        assert!(ask(&snap, "menu please").unwrap().contains("未設定"));
    }

    #[tokio::test]
    async fn snapshot_reads_only_today() {
        use crate::db::DailyMenu;
        use crate::test_utils::TestDir;

        let dir = TestDir::new();
        let store = JsonStore::init(dir.path()).await.unwrap();
        store
            .daily_menu()
            .save(&vec![
                DailyMenu { date: "2026-10-18".into(), food: "そば".into() },
                DailyMenu { date: "2026-10-19".into(), food: "うどん".into() },
            ])
            .await
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let snap = CafeteriaSnapshot::load(&store, today).await.unwrap();
        assert_eq!(snap.featured.as_deref(), Some("うどん"));
        assert_eq!(snap.holiday, None);
        assert_eq!(snap.reservation_count, 0);
    }
}
