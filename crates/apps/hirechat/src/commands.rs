//! One-shot commands

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, Utc};
use messaging::{
    ApiClient, ApiError, ApplicationId, ClientConfig, ConversationId, ConversationInitiator,
    ConversationSync, DraftFile, JobApplication, RegisterRequest, UserId, UserType,
    display_name, download_attachment, fallback, format_relative, run_blocking,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Turn an API error into the text a user should see
pub fn surface(error: ApiError, fallback: &str) -> anyhow::Error {
    anyhow!(error.user_message(fallback))
}

fn read_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn require_session(client: &ApiClient) -> Result<()> {
    if !client.session().has_session() {
        bail!("Not logged in. Run `hirechat login <email>` first.");
    }
    Ok(())
}

pub async fn login(client: Arc<ApiClient>, email: String, password: Option<String>) -> Result<()> {
    let password = read_password(password)?;
    let user = run_blocking(move || client.login(&email, &password))
        .await
        .map_err(|e| surface(e, fallback::LOGIN))?;
    println!("Logged in as {}", display_name(Some(&user)));
    Ok(())
}

pub async fn register(
    client: Arc<ApiClient>,
    email: String,
    username: String,
    user_type: UserType,
    full_name: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let form = RegisterRequest {
        email,
        username,
        password: read_password(password)?,
        user_type,
        full_name,
    };
    let user = run_blocking(move || client.register(&form))
        .await
        .map_err(|e| surface(e, fallback::REGISTER))?;
    println!("Registered and logged in as {} ({})", user.username, user_type.as_str());
    Ok(())
}

pub fn logout(client: &ApiClient) -> Result<()> {
    client.logout()?;
    println!("Logged out");
    Ok(())
}

pub async fn whoami(client: Arc<ApiClient>) -> Result<()> {
    require_session(&client)?;
    let user = run_blocking(move || client.me()).await?;
    let role = user.user_type.map(|t| t.as_str()).unwrap_or("unknown");
    println!("{} <{}> ({})", display_name(Some(&user)), user.email.as_deref().unwrap_or("-"), role);
    Ok(())
}

pub async fn conversations(client: Arc<ApiClient>, config: &ClientConfig) -> Result<()> {
    require_session(&client)?;
    let sync = ConversationSync::new(client, config.conversation_poll_interval);
    let conversations = sync
        .refresh()
        .await
        .map_err(|e| surface(e, fallback::LOAD_CONVERSATIONS))?;

    if conversations.is_empty() {
        println!("No conversations yet");
        return Ok(());
    }

    let now = Utc::now().with_timezone(&Local);
    for conversation in &conversations {
        let name = display_name(conversation.other_participant.as_ref());
        let preview = conversation
            .last_message
            .as_ref()
            .map(|m| {
                let text = m.content.as_deref().unwrap_or("[attachment]");
                format!("{}  {}", truncate(text, 40), format_relative(m.created_at.with_timezone(&Local), now))
            })
            .unwrap_or_default();
        let unread = if conversation.has_unread() {
            format!(" ({} unread)", conversation.unread_count)
        } else {
            String::new()
        };
        println!("{:>5}  {}{}  {}", conversation.id, name, unread, preview);
    }
    Ok(())
}

pub async fn send(client: Arc<ApiClient>, id: ConversationId, file: Option<PathBuf>, text: String) -> Result<()> {
    require_session(&client)?;
    let draft_file = file
        .map(DraftFile::inspect)
        .transpose()
        .map_err(|e| surface(e, fallback::SEND_MESSAGE))?;

    let message = run_blocking(move || {
        let outbound = draft_file.as_ref().map(DraftFile::load).transpose()?;
        client.send_message(id, Some(&text), outbound)
    })
    .await
    .map_err(|e| surface(e, fallback::SEND_MESSAGE))?;

    println!("Sent message {}", message.id);
    Ok(())
}

pub async fn download(client: Arc<ApiClient>, stored: String, name: String, dir: PathBuf) -> Result<()> {
    require_session(&client)?;
    let path = run_blocking(move || download_attachment(&client, &stored, &name, &dir))
        .await
        .map_err(|e| surface(e, fallback::DOWNLOAD_FILE))?;
    println!("Saved {}", path.display());
    Ok(())
}

pub async fn students(client: Arc<ApiClient>) -> Result<()> {
    require_session(&client)?;
    let flow = ConversationInitiator::open(client)
        .await
        .map_err(|e| surface(e, fallback::LOAD_STUDENTS))?;

    if flow.candidates().is_empty() {
        println!("No students found");
    }
    for student in flow.candidates() {
        println!("{:>5}  {}", student.id, display_name(Some(student)));
    }
    Ok(())
}

pub async fn start(client: Arc<ApiClient>, student_id: UserId) -> Result<()> {
    require_session(&client)?;
    let mut flow = ConversationInitiator::open(client)
        .await
        .map_err(|e| surface(e, fallback::LOAD_STUDENTS))?;
    let conversation = flow
        .start(student_id)
        .await
        .map_err(|e| surface(e, fallback::START_CONVERSATION))?;

    println!(
        "Conversation {} with {}. Open it with `hirechat chat {}`.",
        conversation.id,
        display_name(conversation.other_participant.as_ref()),
        conversation.id
    );
    Ok(())
}

pub async fn list_applications(client: Arc<ApiClient>) -> Result<()> {
    require_session(&client)?;
    let applications = run_blocking(move || client.list_applications()).await?;
    if applications.is_empty() {
        println!("No applications");
    }
    for application in &applications {
        print_application(application);
    }
    Ok(())
}

pub async fn apply(client: Arc<ApiClient>, employer_id: UserId, title: String) -> Result<()> {
    require_session(&client)?;
    let application = run_blocking(move || client.apply_for_job(employer_id, &title)).await?;
    print_application(&application);
    Ok(())
}

pub async fn decide(client: Arc<ApiClient>, id: ApplicationId, accept: bool) -> Result<()> {
    require_session(&client)?;
    let application = run_blocking(move || {
        if accept {
            client.accept_application(id)
        } else {
            client.reject_application(id)
        }
    })
    .await?;
    print_application(&application);
    Ok(())
}

fn print_application(application: &JobApplication) {
    println!(
        "{:>5}  {:<9} {}  (student {}, employer {}, applied {})",
        application.id,
        application.status.as_str(),
        application.job_title,
        application.student_id,
        application.employer_id,
        application.applied_at.with_timezone(&Local).format("%Y-%m-%d"),
    );
}

/// Shorten text for one-line listings
pub fn truncate(text: &str, max_chars: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let cut: String = single_line.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut)
}
