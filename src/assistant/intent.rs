//! Detección de palabras clave sobre el mensaje ya en minúsculas.
//!
//! Las claves japonesas se buscan como subcadena. Las claves ASCII exigen
//! límite de palabra, así "hi" no coincide dentro de "this".

pub const MENU_DATA: &[&str] = &["定食", "メニュー", "menu"];
pub const HOLIDAY_DATA: &[&str] = &["休業", "営業", "holiday", "holidays", "closed"];
pub const WINDOW_DATA: &[&str] = &[
    "予約時間",
    "いつ予約",
    "予約可能",
    "reservation time",
    "reservation hours",
    "booking time",
];
pub const CONGESTION_DATA: &[&str] = &[
    "予約",
    "混雑",
    "人数",
    "congestion",
    "crowded",
    "busy",
    "reservation",
    "reservations",
];

pub const GREETING: &[&str] = &["こんにちは", "こんばんは", "おはよう", "hello", "hi"];
pub const THANKS: &[&str] = &["ありがとう", "thank", "thanks", "thx"];
pub const MENU: &[&str] = &["メニュー", "料理", "食べ物", "定食", "何が", "何を", "menu"];
pub const HOURS: &[&str] = &["営業時間", "何時", "開いて", "閉まって", "いつ", "hours", "open"];
pub const RESERVATION: &[&str] = &["予約", "reservation", "booking"];
pub const QUESTION: &[&str] = &["？", "?", "何", "どう", "なぜ", "どうして"];

/// Claves para deducir el tema de turnos anteriores
pub const MENU_TOPIC: &[&str] = &["メニュー", "料理"];
pub const TIME_TOPIC: &[&str] = &["時間", "営業"];
pub const RESERVATION_TOPIC: &[&str] = &["予約"];

/// Indica si `text` (en minúsculas) contiene alguna de las claves
pub fn mentions(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| contains_keyword(text, keyword))
}

fn contains_keyword(text: &str, keyword: &str) -> bool {
    let word_like = keyword.chars().any(|c| c.is_ascii_alphanumeric());
    if !word_like {
        return text.contains(keyword);
    }

    text.match_indices(keyword).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + keyword.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}
