//! Interactive conversation view
//!
//! Renders new messages as the synchronizers publish them and sends each
//! stdin line as a message. Leaves when the session can no longer be
//! refreshed.

use anyhow::Result;
use chrono::Local;
use log::warn;
use messaging::{
    ApiClient, ClientConfig, Conversation, ConversationId, Inbox, Message, MessageId, SessionStatus, User,
    UserId, display_name, fallback, format_file_size, format_message_time, is_image_file,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::surface;

const HELP: &str = "Type a message and press Enter to send. Commands: /attach <path>, /detach, \
/download <message-id> [dir], /quit";

pub async fn run(client: Arc<ApiClient>, config: &ClientConfig, id: ConversationId) -> Result<()> {
    if !client.session().has_session() {
        anyhow::bail!("Not logged in. Run `hirechat login <email>` first.");
    }
    let me = client.session().current().map(|u| u.id);

    let inbox = Inbox::new(client.clone(), config);
    let conversation = match inbox.conversations().refresh().await {
        Ok(_) => inbox
            .conversations()
            .find(id)
            .unwrap_or_else(|| Conversation::new(id, None)),
        Err(e) => {
            warn!("Failed to load conversations: {}", e);
            Conversation::new(id, None)
        }
    };
    let other = conversation.other_participant.clone();

    println!("-- {} (conversation {}) --", display_name(other.as_ref()), id);
    println!("{}", HELP);

    inbox.activate();
    inbox.select(conversation);

    let mut messages = inbox.messages().subscribe();
    let mut session = client.session().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printed: HashSet<MessageId> = HashSet::new();

    loop {
        tokio::select! {
            changed = messages.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = messages.borrow_and_update().clone();
                for message in state.messages.iter().filter(|m| printed.insert(m.id)) {
                    print_message(message, me, other.as_ref());
                }
            }
            changed = session.changed() => {
                if changed.is_err() || *session.borrow_and_update() == SessionStatus::Expired {
                    println!("Your session has expired. Run `hirechat login <email>` to sign in again.");
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !handle_line(&inbox, line.trim()).await {
                    break;
                }
            }
        }
    }

    inbox.deactivate();
    Ok(())
}

/// Handle one input line. Returns false to leave the conversation.
async fn handle_line(inbox: &Inbox, line: &str) -> bool {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "/quit" | "/exit" => return false,
        "/help" => println!("{}", HELP),
        "/attach" if !rest.is_empty() => match inbox.messages().attach_file(rest) {
            Ok(()) => {
                if let Some(file) = inbox.messages().snapshot().draft.file {
                    println!(
                        "Attached {} ({}). Press Enter to send.",
                        file.file_name,
                        format_file_size(file.size)
                    );
                }
            }
            Err(e) => println!("! {}", e.user_message(&e.to_string())),
        },
        "/detach" => {
            inbox.messages().remove_file();
            println!("Attachment removed");
        }
        "/download" if !rest.is_empty() => download(inbox, rest).await,
        _ if command.starts_with('/') => println!("Unknown command. {}", HELP),
        _ => {
            inbox.messages().set_text(line);
            if !inbox.messages().snapshot().draft.is_sendable() {
                return true;
            }
            if let Err(e) = inbox.send().await {
                println!("! {}", surface(e, fallback::SEND_MESSAGE));
            }
        }
    }
    true
}

async fn download(inbox: &Inbox, args: &str) {
    let (id, dir) = args.split_once(' ').unwrap_or((args, "."));
    let Ok(id) = id.parse::<i64>() else {
        println!("! Usage: /download <message-id> [dir]");
        return;
    };

    let attachment = inbox
        .messages()
        .messages()
        .into_iter()
        .find(|m| m.id == MessageId(id))
        .and_then(|m| m.attachment);
    let Some(attachment) = attachment else {
        println!("! Message {} has no attachment", id);
        return;
    };

    match inbox.messages().download(&attachment, PathBuf::from(dir.trim())).await {
        Ok(path) => println!("Saved {}", path.display()),
        Err(e) => println!("! {}", surface(e, fallback::DOWNLOAD_FILE)),
    }
}

fn print_message(message: &Message, me: Option<UserId>, other: Option<&User>) {
    let time = format_message_time(&message.created_at.with_timezone(&Local));

    if message.is_system_message {
        println!("[{}] * {}", time, message.content.as_deref().unwrap_or_default());
        return;
    }

    let sender = if me.is_some_and(|id| message.is_from(id)) {
        "You".to_string()
    } else {
        display_name(other)
    };
    if let Some(content) = &message.content {
        println!("[{}] {}: {}", time, sender, content);
    }
    if let Some(attachment) = &message.attachment {
        let kind = if is_image_file(&attachment.file_name) {
            "image"
        } else {
            "file"
        };
        let prefix = if message.content.is_some() {
            String::new()
        } else {
            format!("[{}] {}: ", time, sender)
        };
        println!(
            "{}  [{} {} ({}), /download {}]",
            prefix,
            kind,
            attachment.file_name,
            format_file_size(attachment.file_size),
            message.id
        );
    }
}
