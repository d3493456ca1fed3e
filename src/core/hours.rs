//! Horario de apertura del comedor y estado del día.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::Serialize;

use crate::db::Holiday;

/// Tramo de apertura de un día, en minutos desde medianoche
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningHours {
    pub opens: u32,
    pub closes: u32,
}

fn minutes(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn clock(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

impl OpeningHours {
    pub const fn new(open_h: u32, open_m: u32, close_h: u32, close_m: u32) -> Self {
        Self {
            opens: open_h * 60 + open_m,
            closes: close_h * 60 + close_m,
        }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        let now = minutes(time);
        now >= self.opens && now <= self.closes
    }

    pub fn display(&self) -> String {
        format!("{} - {}", clock(self.opens), clock(self.closes))
    }
}

/// Horario semanal: lunes a viernes, sábado reducido, domingo cerrado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub weekday: OpeningHours,
    pub saturday: OpeningHours,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            weekday: OpeningHours::new(11, 0, 14, 0),
            saturday: OpeningHours::new(11, 0, 13, 0),
        }
    }
}

/// Estado del comedor en un instante
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CafeteriaStatus {
    Holiday { reason: String },
    ClosedDay,
    BeforeOpen { opens: String },
    Open { closes: String },
    AfterClose,
}

impl BusinessHours {
    pub fn for_day(&self, date: NaiveDate) -> Option<OpeningHours> {
        match date.weekday() {
            Weekday::Sun => None,
            Weekday::Sat => Some(self.saturday),
            _ => Some(self.weekday),
        }
    }

    pub fn status_at(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        holiday: Option<&Holiday>,
    ) -> CafeteriaStatus {
        if let Some(holiday) = holiday {
            return CafeteriaStatus::Holiday {
                reason: holiday.display_reason().to_string(),
            };
        }

        let Some(hours) = self.for_day(date) else {
            return CafeteriaStatus::ClosedDay;
        };

        if minutes(time) < hours.opens {
            CafeteriaStatus::BeforeOpen {
                opens: clock(hours.opens),
            }
        } else if hours.contains(time) {
            CafeteriaStatus::Open {
                closes: clock(hours.closes),
            }
        } else {
            CafeteriaStatus::AfterClose
        }
    }

    /// Texto del horario para mostrar al usuario
    pub fn describe(&self) -> String {
        format!(
            "**平日（月〜金）**\n・{}\n\n**土曜日**\n・{}\n\n**日曜日・休業日**\n・休業",
            self.weekday.display(),
            self.saturday.display()
        )
    }
}

impl CafeteriaStatus {
    pub fn message(&self) -> String {
        match self {
            CafeteriaStatus::Holiday { reason } => format!("❌ 本日は休業日です（理由: {}）", reason),
            CafeteriaStatus::ClosedDay => "❌ 本日は休業日です（日曜日は休業です）".to_string(),
            CafeteriaStatus::BeforeOpen { opens } => format!("⏰ 本日は{}から営業します", opens),
            CafeteriaStatus::Open { closes } => format!("✅ 現在営業中です（{}まで）", closes),
            CafeteriaStatus::AfterClose => "🌙 本日の営業は終了しました".to_string(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, CafeteriaStatus::Open { .. })
    }
}
