//! Inbound text handler registered in the teloxide Dispatcher.
//!
//! Commands come first; free text is routed by the user's current flow
//! state (token entry, page entry) and otherwise appended as a note.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{error, info, warn};

use notibox_core::config::LIST_PAGE_SIZE;
use notibox_core::version::{
    changelog_message, is_newer_version, should_show_notifications_intro, VERSION,
};
use notibox_scheduler::{format_offset, parse_days, reference_to_local, ScheduleChange, TimeOfDay};

use crate::context::AppContext;
use crate::flow::Flow;
use crate::keyboards;
use crate::text;

pub async fn handle_message(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> ResponseResult<()> {
    if msg.from.as_ref().map(|u| u.is_bot).unwrap_or(false) {
        return Ok(());
    }
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;
    let chat_id = msg.chat.id;

    let Some(raw) = msg.text() else {
        return Ok(());
    };
    let input = raw.trim();
    if input.is_empty() {
        return Ok(());
    }

    if input.starts_with('/') {
        return handle_command(&bot, &ctx, user_id, chat_id, input).await;
    }

    // Free text is flow-dependent: setup steps consume it, otherwise it is
    // a note for the inbox.
    let flow = ctx.flows.get(&user_id).map(|f| f.value().clone());
    match flow {
        Some(Flow::AwaitingToken) => handle_token_input(&bot, &ctx, user_id, chat_id, input).await,
        Some(Flow::AwaitingPage) => handle_page_input(&bot, &ctx, user_id, chat_id, input).await,
        _ => append_note(&bot, &ctx, user_id, chat_id, input).await,
    }
}

async fn handle_command(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
    input: &str,
) -> ResponseResult<()> {
    match command_of(input) {
        "/start" => start(bot, ctx, user_id, chat_id).await,
        "/notifications" => notifications(bot, ctx, user_id, chat_id).await,
        "/list" => list_notes(bot, ctx, user_id, chat_id).await,
        "/reset" => {
            ctx.flows.remove(&user_id);
            // The row is going away; its timer must go with it, or a user
            // with no configuration keeps receiving summaries.
            if let Err(e) = ctx
                .scheduler
                .update_schedule(user_id, ScheduleChange::Disabled)
            {
                error!(user_id, error = %e, "cancelling timer failed");
            }
            if let Err(e) = ctx.store.reset_user(user_id) {
                error!(user_id, error = %e, "reset failed");
                bot.send_message(chat_id, "⚠️ Something went wrong, please try again.")
                    .await?;
                return Ok(());
            }
            bot.send_message(chat_id, "🔄 Configuration cleared. Use /start to set up again.")
                .await?;
            Ok(())
        }
        "/cancel" => {
            ctx.flows.remove(&user_id);
            bot.send_message(chat_id, "❌ Cancelled. Use /start to begin setup.")
                .await?;
            Ok(())
        }
        "/help" => {
            bot.send_message(chat_id, text::HELP).await?;
            Ok(())
        }
        "/version" => {
            bot.send_message(chat_id, format!("📦 Bot version: {VERSION}"))
                .await?;
            Ok(())
        }
        _ => Ok(()), // unknown commands are ignored
    }
}

/// First token of the input with any `@BotName` suffix stripped, as sent
/// by group chats.
fn command_of(input: &str) -> &str {
    let first = input.split_whitespace().next().unwrap_or("");
    first.split('@').next().unwrap_or(first)
}

async fn start(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
) -> ResponseResult<()> {
    match ctx.store.credentials(user_id) {
        Ok(Some(creds)) => {
            // Already configured; maybe show what changed since last time.
            if check_changelog(bot, ctx, user_id, chat_id).await? {
                return Ok(());
            }
            bot.send_message(
                chat_id,
                format!(
                    "✅ You're all set!\n\n\
                     Your configuration:\n\
                     • Page: {}\n\n\
                     Just send a message and it lands in your inbox.\n\n\
                     Use /reset to reconfigure.",
                    creds.page_name
                ),
            )
            .await?;
        }
        Ok(None) => {
            let _ = ctx.store.set_user_version(user_id, VERSION);
            ctx.flows.insert(user_id, Flow::AwaitingToken);
            bot.send_message(chat_id, text::SETUP_INTRO).await?;
        }
        Err(e) => {
            error!(user_id, error = %e, "config lookup failed");
            bot.send_message(chat_id, "⚠️ Something went wrong, please try again.")
                .await?;
        }
    }
    Ok(())
}

/// Show the changelog once per released version. Returns `true` when the
/// notifications intro (with its opt-in keyboard) was sent; the caller
/// should stop there.
async fn check_changelog(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
) -> ResponseResult<bool> {
    let seen = match ctx.store.user_version(user_id) {
        Ok(v) => v,
        Err(_) => return Ok(false),
    };
    if !is_newer_version(VERSION, &seen) {
        return Ok(false);
    }
    info!(user_id, from = %seen, to = VERSION, "showing changelog");

    if should_show_notifications_intro(&seen) {
        // Version is bumped when the user answers the opt-in prompt.
        bot.send_message(
            chat_id,
            "🎉 New feature: inbox reminders!\n\n\
             I can send you your unchecked tasks at a time and on days of \
             your choosing.\n\n\
             Want to set it up?",
        )
        .reply_markup(keyboards::yes_no_keyboard())
        .await?;
        return Ok(true);
    }

    if let Some(message) = changelog_message(VERSION) {
        bot.send_message(chat_id, message).await?;
    }
    let _ = ctx.store.set_user_version(user_id, VERSION);
    Ok(false)
}

async fn notifications(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
) -> ResponseResult<()> {
    let settings = ctx.store.notification_settings(user_id).ok().flatten();
    let enabled = settings.as_ref().map(|s| s.enabled).unwrap_or(false);

    if !enabled {
        bot.send_message(
            chat_id,
            "🔕 Notifications are off.\n\n\
             Want a scheduled summary of your unsorted inbox?",
        )
        .reply_markup(keyboards::yes_no_keyboard())
        .await?;
        return Ok(());
    }

    // Settings exist here, `enabled` came from them.
    let settings = settings.unwrap();
    let time_display = match (&settings.time, settings.timezone_offset) {
        (Some(time), Some(offset)) => match time.parse::<TimeOfDay>() {
            Ok(reference) => {
                let local = reference_to_local(reference, offset);
                format!("{local} ({})", format_offset(offset))
            }
            Err(_) => time.clone(),
        },
        (Some(time), None) => time.clone(),
        (None, _) => "Not set".to_string(),
    };
    let days = parse_days(settings.days.as_deref().unwrap_or(""));

    bot.send_message(
        chat_id,
        format!(
            "📬 Notification settings:\n\n\
             Status: ✅ On\n\
             Time: {time_display}\n\
             Days: {}\n\n\
             Want to change anything?",
            text::format_days(&days)
        ),
    )
    .reply_markup(keyboards::actions_keyboard())
    .await?;
    Ok(())
}

async fn handle_token_input(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
    token: &str,
) -> ResponseResult<()> {
    // Cheap shape check before hitting the API.
    if token.len() < 20 {
        bot.send_message(
            chat_id,
            "❌ That doesn't look like a token. Please check it and send again.\n\n\
             Integration tokens are long strings starting with 'secret_' or 'ntn_'.",
        )
        .await?;
        return Ok(());
    }

    match ctx.notion.validate_token(token).await {
        Ok(()) => {
            if let Err(e) = ctx.store.save_token(user_id, token) {
                error!(user_id, error = %e, "saving token failed");
                bot.send_message(chat_id, "⚠️ Something went wrong, please try again.")
                    .await?;
                return Ok(());
            }
            ctx.flows.insert(user_id, Flow::AwaitingPage);
            bot.send_message(chat_id, text::TOKEN_SAVED).await?;
        }
        Err(e) => {
            warn!(user_id, error = %e, "token validation failed");
            bot.send_message(
                chat_id,
                format!(
                    "❌ Token check failed: {e}\n\n\
                     Make sure:\n\
                     • The token is copied correctly\n\
                     • The integration is active\n\
                     • The integration has access to your pages\n\n\
                     Send the token again, or /cancel to stop."
                ),
            )
            .await?;
        }
    }
    Ok(())
}

async fn handle_page_input(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
    input: &str,
) -> ResponseResult<()> {
    let token = ctx
        .store
        .user_config(user_id)
        .ok()
        .flatten()
        .and_then(|c| c.notion_token);
    let Some(token) = token else {
        ctx.flows.remove(&user_id);
        bot.send_message(chat_id, "❌ Token missing. Please start over with /start.")
            .await?;
        return Ok(());
    };

    match ctx.notion.resolve_page(&token, input).await {
        Ok((page_id, page_name)) => {
            if let Err(e) = ctx.store.save_page(user_id, &page_id, &page_name) {
                error!(user_id, error = %e, "saving page failed");
                bot.send_message(chat_id, "⚠️ Something went wrong, please try again.")
                    .await?;
                return Ok(());
            }
            ctx.flows.remove(&user_id);
            bot.send_message(
                chat_id,
                format!(
                    "✅ Page configured!\n\n\
                     📄 Page: {page_name}\n\n\
                     Now just send me messages and I'll add them to your inbox.\n\n\
                     Use /reset to reconfigure."
                ),
            )
            .await?;
        }
        Err(e) => {
            warn!(user_id, error = %e, "page setup failed");
            bot.send_message(
                chat_id,
                format!(
                    "❌ Could not set up the page: {e}\n\n\
                     Possible causes:\n\
                     • The page wasn't found\n\
                     • The integration has no access to it\n\
                     • The URL or name is malformed\n\n\
                     Try again, or /cancel to stop."
                ),
            )
            .await?;
        }
    }
    Ok(())
}

async fn append_note(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
    note: &str,
) -> ResponseResult<()> {
    let Some(creds) = ctx.store.credentials(user_id).ok().flatten() else {
        bot.send_message(chat_id, text::NOT_CONFIGURED).await?;
        return Ok(());
    };

    match ctx
        .notion
        .append_todo(&creds.notion_token, &creds.page_id, note)
        .await
    {
        Ok(()) => {
            bot.send_message(chat_id, "✅ Note saved").await?;
        }
        Err(e) => {
            warn!(user_id, error = %e, "appending note failed");
            bot.send_message(
                chat_id,
                format!("❌ Could not save the note: {e}\n\nTry again, or use /reset to reconfigure."),
            )
            .await?;
        }
    }
    Ok(())
}

async fn list_notes(
    bot: &Bot,
    ctx: &Arc<AppContext>,
    user_id: i64,
    chat_id: ChatId,
) -> ResponseResult<()> {
    let Some(creds) = ctx.store.credentials(user_id).ok().flatten() else {
        bot.send_message(chat_id, text::NOT_CONFIGURED).await?;
        return Ok(());
    };

    match ctx
        .notion
        .list_items(&creds.notion_token, &creds.page_id, LIST_PAGE_SIZE)
        .await
    {
        Ok(items) => {
            bot.send_message(chat_id, text::format_list(&items)).await?;
        }
        Err(e) => {
            warn!(user_id, error = %e, "listing notes failed");
            bot.send_message(
                chat_id,
                format!("❌ Could not fetch notes: {e}\n\nTry again later, or use /reset to reconfigure."),
            )
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_parsing_strips_bot_name_suffix() {
        assert_eq!(command_of("/start"), "/start");
        assert_eq!(command_of("/start@NotiboxBot"), "/start");
        assert_eq!(command_of("/list@NotiboxBot extra words"), "/list");
        assert_eq!(command_of("/reset  "), "/reset");
    }
}
