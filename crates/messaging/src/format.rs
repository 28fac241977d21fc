//! Display helpers shared by front ends

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

use crate::models::User;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Format a timestamp relative to `now` (e.g., "5m ago")
///
/// Anything a week or older is shown as a date in `now`'s time zone.
pub fn format_relative<Tz>(ts: DateTime<Tz>, now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let elapsed = now.clone().signed_duration_since(ts.clone());

    if elapsed.num_minutes() < 1 {
        "Just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        ts.with_timezone(&now.timezone()).format("%Y-%m-%d").to_string()
    }
}

/// Time of day for a message bubble, e.g. "09:05"
pub fn format_message_time<Tz>(ts: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.format("%H:%M").to_string()
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

/// Name to show for a conversation counterpart
pub fn display_name(user: Option<&User>) -> String {
    user.and_then(|u| {
        u.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(Some(u.username.as_str()).filter(|n| !n.is_empty()))
    })
    .unwrap_or("Unknown User")
    .to_string()
}

/// Single uppercase letter for an avatar placeholder
pub fn avatar_initial(user: Option<&User>) -> String {
    user.and_then(|u| u.username.chars().next())
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

pub fn is_image_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
