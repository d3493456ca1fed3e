//! Árbol de respuestas por reglas cuando no hay datos ni modelo externo.

use chrono::NaiveDateTime;
use rand::Rng;

use super::lookup::{self, CafeteriaSnapshot};
use super::{intent, pick, ChatTurn};
use crate::core::hours::BusinessHours;

/// Temas que aparecen en la conversación, incluido el mensaje actual
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConversationContext {
    pub has_menu: bool,
    pub has_reservation: bool,
    pub has_time: bool,
    pub message_count: usize,
}

pub fn analyze(history: &[ChatTurn], message: &str) -> ConversationContext {
    let mut context = ConversationContext {
        message_count: history.len(),
        ..Default::default()
    };

    let contents = history
        .iter()
        .map(|turn| turn.content.to_lowercase())
        .chain(std::iter::once(message.to_string()));

    for content in contents {
        context.has_menu |= intent::mentions(&content, intent::MENU_TOPIC);
        context.has_reservation |= intent::mentions(&content, intent::RESERVATION_TOPIC);
        context.has_time |= intent::mentions(&content, intent::TIME_TOPIC);
    }

    context
}

/// Todo lo que necesita el árbol para contestar
pub struct FallbackInput<'a> {
    /// Mensaje en minúsculas
    pub message: &'a str,
    pub history: &'a [ChatTurn],
    pub snapshot: &'a CafeteriaSnapshot,
    pub hours: &'a BusinessHours,
    pub now: NaiveDateTime,
}

/// Recorre el árbol y siempre devuelve una respuesta
pub fn respond(input: &FallbackInput<'_>, rng: &mut impl Rng) -> String {
    let message = input.message;
    let context = analyze(input.history, message);

    if intent::mentions(message, intent::GREETING) {
        return greeting(input.history.is_empty(), rng);
    }

    if intent::mentions(message, intent::THANKS) {
        return pick(
            rng,
            &[
                "どういたしまして！\n\n他にもご質問がございましたら、いつでもお声かけください。",
                "いえいえ、お役に立てて嬉しいです！\n\n他に何かございましたら、お気軽にどうぞ。",
                "どういたしまして。\n\n他にもご質問があれば、いつでもお聞かせください。",
            ],
        )
        .to_string();
    }

    if intent::mentions(message, intent::MENU) {
        if let Some(answer) = lookup::answer(input.snapshot, message, rng) {
            return answer;
        }
        return menu_reply(context.has_menu && context.message_count > 0, rng);
    }

    if intent::mentions(message, intent::HOURS) {
        return hours_reply(input, context.has_time && context.message_count > 0);
    }

    if intent::mentions(message, intent::RESERVATION) {
        if let Some(answer) = lookup::answer(input.snapshot, message, rng) {
            return answer;
        }
        return reservation_reply(context.has_reservation && context.message_count > 0);
    }

    if let Some(reply) = follow_up(input.history) {
        return reply.to_string();
    }

    if intent::mentions(message, intent::QUESTION) {
        return "ご質問ありがとうございます。\n\n食堂について以下の内容でしたらお答えできます：\n\n🍽️ メニューについて\n⏰ 営業時間について\n📝 予約について\n⚠️ アレルギー対応について\n💰 料金について\n📍 場所について\n\n具体的にどのことについて知りたいですか？".to_string();
    }

    pick(
        rng,
        &[
            "ご質問ありがとうございます。\n\n食堂についてお答えできます。メニュー、営業時間、予約など、どのことについて知りたいですか？\n\nお気軽にお聞かせください！",
            "ご質問をありがとうございます。\n\n食堂について、メニューや営業時間、予約など、何でもお答えできます。どのことについて知りたいですか？",
            "ご質問ありがとうございます。\n\n食堂についてお答えできます。メニュー、営業時間、予約などについて、どのことについて知りたいですか？\n\nお気軽にどうぞ。",
        ],
    )
    .to_string()
}

fn greeting(first_time: bool, rng: &mut impl Rng) -> String {
    let options: &[&str] = if first_time {
        &[
            "こんにちは！食堂のAIアシスタントです。\n\n何かお手伝いできることがございましたら、お気軽にお声かけください。\n\nメニュー、営業時間、予約など、食堂に関するご質問でしたら何でもお答えします！",
            "こんにちは！いらっしゃいませ。\n\n食堂について、メニューや営業時間、予約など、何でもお聞きください。お手伝いさせていただきます！",
            "こんにちは！食堂のAIアシスタントです。\n\n今日はどのようなご用件でしょうか？メニューや営業時間、予約についてお答えできます。",
        ]
    } else {
        &[
            "こんにちは！またいらっしゃいましたね。\n\n何か他にお手伝いできることはありますか？",
            "こんにちは！おかえりなさい。\n\n他にご質問がございましたら、お気軽にお聞かせください。",
            "こんにちは！\n\n何か他にお手伝いできることはありますか？",
        ]
    };
    pick(rng, options).to_string()
}

fn menu_reply(continuing: bool, rng: &mut impl Rng) -> String {
    let options: &[&str] = if continuing {
        &[
            "メニューについてですね。本日のメニューは管理者サイトで設定されています。\n\n具体的にどのメニューについて知りたいですか？",
            "メニューのことですね。今日のメニューについては、管理者サイトで設定された情報を確認できます。\n\nどのメニューについて詳しく知りたいですか？",
            "メニューについてお答えします。本日のメニューは管理者サイトで設定されています。\n\nどのメニューについて知りたいですか？",
        ]
    } else {
        &[
            "メニューについてお答えします。\n\n本日のメニューについては、管理者サイトで設定された情報を確認できます。\n\nどのメニューについて詳しく知りたいですか？",
            "メニューですね。今日のメニューは管理者サイトで設定されています。\n\n具体的にどのメニューについて知りたいですか？",
            "メニューについてお答えできます。本日のメニューは管理者サイトで設定されています。\n\nどのメニューについて詳しく知りたいですか？",
        ]
    };
    pick(rng, options).to_string()
}

fn reservation_reply(continuing: bool) -> String {
    let intro = if continuing {
        "引き続き予約についてですね。"
    } else {
        "予約についてお答えします。"
    };
    format!(
        "{intro}\n\n📝 **予約システム**\n\n予約はメインページの「予約サイト」から行えます。\n\n予約可能時間や混雑状況については、管理者サイトで設定された情報を確認できます。\n\n予約について他にご質問はありますか？"
    )
}

fn hours_reply(input: &FallbackInput<'_>, continuing: bool) -> String {
    let status = input.hours.status_at(
        input.now.date(),
        input.now.time(),
        input.snapshot.holiday.as_ref(),
    );
    let intro = if continuing {
        "引き続き営業時間についてですね。"
    } else {
        "営業時間についてお答えします。"
    };

    format!(
        "{}\n\n⏰ **営業時間**\n\n{}\n\n現在の時刻は{}です。{}\n\n他にご質問はありますか？",
        intro,
        input.hours.describe(),
        input.now.format("%H:%M"),
        status.message()
    )
}

/// Respuesta que continúa el tema del último turno del usuario
fn follow_up(history: &[ChatTurn]) -> Option<&'static str> {
    let last_user = history.iter().rev().find(|t| t.role == "user")?;
    history
        .iter()
        .rev()
        .find(|t| t.role == "assistant" && !t.content.is_empty())?;

    let topic = last_user.content.to_lowercase();
    if topic.is_empty() {
        None
    } else if intent::mentions(&topic, &["メニュー"]) {
        Some("メニューについて、他にもご質問はありますか？\n\n例えば、料金やアレルギー対応についてもお答えできます。")
    } else if intent::mentions(&topic, intent::TIME_TOPIC) {
        Some("営業時間について、他にもご質問はありますか？\n\n予約やメニューについてもお答えできます。")
    } else if intent::mentions(&topic, intent::RESERVATION_TOPIC) {
        Some("予約について、他にもご質問はありますか？\n\nメニューや営業時間についてもお答えできます。")
    } else {
        None
    }
}
