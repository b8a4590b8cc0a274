//! Telegram transport: turns updates into [`InboundEvent`]s and sends the replies.

use crate::error::InboxError;
use crate::inbox::command;
use crate::inbox::dispatch::{CommandDispatcher, InboundEvent, PhotoPayload, Reply};
use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{InputFile, PhotoSize};
use tracing::{debug, error, info, warn};

pub async fn run(inbox: CommandDispatcher, token: String) -> Result<()> {
    let bot = Bot::new(token);
    let me = bot
        .get_me()
        .await
        .context("failed to reach the Telegram Bot API (check BOT_TOKEN)")?;
    info!(
        username = %me.username(),
        out_dir = %inbox.config().paths.out_dir.display(),
        "bot connected, polling for updates"
    );

    let inbox = Arc::new(inbox);
    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![inbox])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("dispatcher stopped");
    Ok(())
}

async fn fetch_photo(bot: &Bot, sizes: &[PhotoSize]) -> Result<(Option<String>, Vec<u8>)> {
    // Sizes arrive smallest first.
    let largest = sizes
        .last()
        .ok_or_else(|| InboxError::Download("photo message without sizes".to_string()))?;
    let file = bot
        .get_file(largest.file.id.clone())
        .await
        .context("getFile request failed")?;
    let mut bytes = Vec::new();
    bot.download_file(&file.path, &mut bytes)
        .await
        .context("file download failed")?;
    let unique_id = largest.file.unique_id.to_string();
    Ok(((!unique_id.is_empty()).then_some(unique_id), bytes))
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    inbox: Arc<CommandDispatcher>,
) -> ResponseResult<()> {
    let sender = msg.from.as_ref().map(|u| u.id.0);
    let at = inbox.config().zone.stamp(msg.date);

    let event = if let Some(text) = msg.text() {
        match command::parse(text) {
            Some(command) => InboundEvent::Command {
                sender,
                command,
                at,
            },
            None => InboundEvent::Text {
                sender,
                text: text.to_string(),
                at,
            },
        }
    } else if let Some(sizes) = msg.photo() {
        // Check before downloading anything on behalf of a stranger.
        if !inbox.is_allowed(sender) {
            debug!(?sender, "ignoring photo from unauthorized sender");
            return Ok(());
        }
        match fetch_photo(&bot, sizes).await {
            Ok((unique_id, bytes)) => InboundEvent::Photo {
                sender,
                photo: PhotoPayload {
                    unique_id,
                    bytes,
                    caption: msg.caption().map(ToOwned::to_owned),
                },
                at,
            },
            Err(err) => {
                warn!(error = %format!("{err:#}"), "photo download failed");
                let reply = InboxError::Download(err.to_string()).user_message();
                bot.send_message(msg.chat.id, reply).await?;
                return Ok(());
            }
        }
    } else {
        return Ok(());
    };

    let worker = Arc::clone(&inbox);
    let replies = match tokio::task::spawn_blocking(move || worker.dispatch(event)).await {
        Ok(replies) => replies,
        Err(err) => {
            error!(error = %err, "dispatch task failed");
            bot.send_message(msg.chat.id, "failed: internal error").await?;
            return Ok(());
        }
    };

    send_replies(&bot, msg.chat.id, replies).await
}

async fn send_document(bot: &Bot, chat: ChatId, input: InputFile, name: &str) -> ResponseResult<()> {
    if let Err(err) = bot.send_document(chat, input).await {
        warn!(file = name, error = %err, "sending document failed");
        bot.send_message(chat, format!("failed to send {name}")).await?;
    }
    Ok(())
}

async fn send_replies(bot: &Bot, chat: ChatId, replies: Vec<Reply>) -> ResponseResult<()> {
    for reply in replies {
        match reply {
            Reply::Text(text) => {
                bot.send_message(chat, text).await?;
            }
            Reply::Document { path, file_name } => {
                let input = InputFile::file(path).file_name(file_name.clone());
                send_document(bot, chat, input, &file_name).await?;
            }
            Reply::Archive(archive) => {
                let input = InputFile::file(archive.path().to_path_buf())
                    .file_name(archive.file_name.clone());
                send_document(bot, chat, input, &archive.file_name).await?;
                debug!(entries = archive.entries, "archive sent, removing temp file");
                drop(archive);
            }
        }
    }
    Ok(())
}
