//! Inline-keyboard callback handler: the notification settings flow.
//!
//! Tags: `notif_yes` / `notif_change` enter the flow, `tz_{hours}` picks
//! a timezone, `time_{HH:MM}` a local delivery time, `day_{tag}` toggles
//! a weekday and `days_done` commits. Stale buttons (flow state gone or
//! mismatched) are answered and otherwise ignored.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{error, info, warn};

use notibox_core::version::VERSION;
use notibox_scheduler::{
    format_offset, join_days, local_to_reference, ScheduleChange, TimeOfDay, Weekday,
};

use crate::context::AppContext;
use crate::flow::{default_days, Flow};
use crate::keyboards;
use crate::text;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    ctx: Arc<AppContext>,
) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let user_id = q.from.id.0 as i64;
    let Some(message) = q.regular_message() else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let message_id = message.id;

    match data {
        "notif_yes" | "notif_change" => {
            enter_settings(&bot, &ctx, user_id, chat_id, message_id).await
        }
        "notif_no" => {
            let _ = ctx.store.set_user_version(user_id, VERSION);
            ctx.flows.remove(&user_id);
            bot.edit_message_text(
                chat_id,
                message_id,
                "Okay! Use /notifications if you change your mind.",
            )
            .await?;
            Ok(())
        }
        "notif_disable" => disable(&bot, &ctx, user_id, chat_id, message_id).await,
        "days_done" => commit(&bot, &ctx, user_id, chat_id, message_id).await,
        _ if data.starts_with("tz_") => {
            pick_timezone(&bot, &ctx, user_id, chat_id, message_id, &data[3..]).await
        }
        _ if data.starts_with("time_") => {
            pick_time(&bot, &ctx, user_id, chat_id, message_id, &data[5..]).await
        }
        _ if data.starts_with("day_") => {
            toggle_day(&bot, &ctx, user_id, chat_id, message_id, &data[4..]).await
        }
        other => {
            warn!(user_id, data = other, "unknown callback tag");
            Ok(())
        }
    }
}

/// First settings step. The timezone keyboard is shown only when no offset
/// is stored yet; otherwise the flow jumps straight to the time picker and
/// the commit reuses the stored offset.
async fn enter_settings(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
) -> ResponseResult<()> {
    let stored_offset = ctx
        .store
        .notification_settings(user_id)
        .ok()
        .flatten()
        .and_then(|s| s.timezone_offset);

    if stored_offset.is_none() {
        ctx.flows.insert(user_id, Flow::ChoosingTimezone);
        bot.edit_message_text(
            chat_id,
            message_id,
            "🌍 First, pick your timezone so reminders arrive at the right local time:",
        )
        .reply_markup(keyboards::timezone_keyboard())
        .await?;
    } else {
        ctx.flows
            .insert(user_id, Flow::ChoosingTime { chosen_offset: None });
        bot.edit_message_text(chat_id, message_id, "⏰ Pick a delivery time (your local time):")
            .reply_markup(keyboards::time_keyboard())
            .await?;
    }
    Ok(())
}

async fn disable(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
) -> ResponseResult<()> {
    if let Err(e) = ctx.store.upsert_schedule(user_id, false, None, None, None) {
        error!(user_id, error = %e, "disabling notifications failed");
        bot.edit_message_text(chat_id, message_id, "⚠️ Something went wrong, please try again.")
            .await?;
        return Ok(());
    }
    if let Err(e) = ctx
        .scheduler
        .update_schedule(user_id, ScheduleChange::Disabled)
    {
        error!(user_id, error = %e, "cancelling timer failed");
    }
    ctx.flows.remove(&user_id);
    info!(user_id, "notifications disabled");
    bot.edit_message_text(
        chat_id,
        message_id,
        "🔕 Notifications disabled.\n\nUse /notifications to enable them again.",
    )
    .await?;
    Ok(())
}

async fn pick_timezone(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
    hours: &str,
) -> ResponseResult<()> {
    if !matches!(ctx.flows.get(&user_id).as_deref(), Some(Flow::ChoosingTimezone)) {
        return Ok(());
    }
    let Ok(hours) = hours.parse::<i32>() else {
        warn!(user_id, hours, "malformed timezone tag");
        return Ok(());
    };
    if !(-12..=14).contains(&hours) {
        warn!(user_id, hours, "timezone out of range");
        return Ok(());
    }
    let offset = hours * 3600;

    ctx.flows.insert(
        user_id,
        Flow::ChoosingTime {
            chosen_offset: Some(offset),
        },
    );
    bot.edit_message_text(
        chat_id,
        message_id,
        format!(
            "✅ Timezone: {}\n\n⏰ Now pick a delivery time (your local time):",
            format_offset(offset)
        ),
    )
    .reply_markup(keyboards::time_keyboard())
    .await?;
    Ok(())
}

async fn pick_time(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
    time: &str,
) -> ResponseResult<()> {
    let chosen_offset = match ctx.flows.get(&user_id).as_deref() {
        Some(Flow::ChoosingTime { chosen_offset }) => *chosen_offset,
        _ => return Ok(()),
    };
    let Ok(local_time) = time.parse::<TimeOfDay>() else {
        warn!(user_id, time, "malformed time tag");
        return Ok(());
    };

    let selected = default_days();
    bot.edit_message_text(
        chat_id,
        message_id,
        format!("✅ Time: {local_time}\n\n📅 Now pick the days (tap to toggle):"),
    )
    .reply_markup(keyboards::days_keyboard(&selected))
    .await?;
    ctx.flows.insert(
        user_id,
        Flow::ChoosingDays {
            chosen_offset,
            local_time,
            selected,
        },
    );
    Ok(())
}

async fn toggle_day(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
    tag: &str,
) -> ResponseResult<()> {
    let (chosen_offset, local_time, mut selected) = match ctx.flows.get(&user_id).as_deref() {
        Some(Flow::ChoosingDays {
            chosen_offset,
            local_time,
            selected,
        }) => (*chosen_offset, *local_time, selected.clone()),
        _ => return Ok(()),
    };
    let Some(day) = tag.parse::<u8>().ok().and_then(Weekday::from_tag) else {
        warn!(user_id, tag, "malformed day tag");
        return Ok(());
    };

    if !selected.remove(&day) {
        selected.insert(day);
    }
    bot.edit_message_reply_markup(chat_id, message_id)
        .reply_markup(keyboards::days_keyboard(&selected))
        .await?;
    ctx.flows.insert(
        user_id,
        Flow::ChoosingDays {
            chosen_offset,
            local_time,
            selected,
        },
    );
    Ok(())
}

/// Commit: convert the chosen local time to reference time, persist, and
/// replace the user's timer. The offset used for conversion is the one
/// picked this pass or the stored one; only a freshly picked offset is
/// written back, so a skipped timezone step never clobbers the stored
/// value.
async fn commit(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
) -> ResponseResult<()> {
    let (chosen_offset, local_time, selected) = match ctx.flows.get(&user_id).as_deref() {
        Some(Flow::ChoosingDays {
            chosen_offset,
            local_time,
            selected,
        }) => (*chosen_offset, *local_time, selected.clone()),
        _ => return Ok(()),
    };

    if selected.is_empty() {
        bot.edit_message_text(
            chat_id,
            message_id,
            "⚠️ Pick at least one day:",
        )
        .reply_markup(keyboards::days_keyboard(&selected))
        .await?;
        return Ok(());
    }

    let stored_offset = ctx
        .store
        .notification_settings(user_id)
        .ok()
        .flatten()
        .and_then(|s| s.timezone_offset);
    let effective_offset = chosen_offset.or(stored_offset).unwrap_or(0);
    let reference_time = local_to_reference(local_time, effective_offset);
    let days: Vec<Weekday> = selected.iter().copied().collect();
    let days_str = join_days(&days);

    if let Err(e) = ctx.store.upsert_schedule(
        user_id,
        true,
        Some(&reference_time.to_string()),
        Some(&days_str),
        chosen_offset,
    ) {
        error!(user_id, error = %e, "saving schedule failed");
        bot.edit_message_text(chat_id, message_id, "⚠️ Something went wrong, please try again.")
            .await?;
        return Ok(());
    }
    if let Err(e) = ctx.scheduler.update_schedule(
        user_id,
        ScheduleChange::Enabled {
            time: reference_time,
            days: days.clone(),
        },
    ) {
        error!(user_id, error = %e, "arming timer failed");
    }
    let _ = ctx.store.set_user_version(user_id, VERSION);
    ctx.flows.remove(&user_id);
    info!(
        user_id,
        local = %local_time,
        reference = %reference_time,
        days = %days_str,
        "notifications enabled"
    );

    bot.edit_message_text(
        chat_id,
        message_id,
        format!(
            "✅ Notifications set!\n\n\
             ⏰ Time: {local_time} ({})\n\
             📅 Days: {}\n\n\
             I'll send your unchecked tasks on this schedule.\n\
             Use /notifications to change it.",
            format_offset(effective_offset),
            text::format_days(&days)
        ),
    )
    .await?;
    Ok(())
}
