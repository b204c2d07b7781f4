//! Embed rendering for notices.
//!
//! Every channel gets the same message and every recipient the same DM, so
//! these are pure functions of the [`Notice`].

use herald_types::notification::Notice;

use super::types::{CreateMessage, Embed, EmbedField, EmbedFooter, EmbedImage};

/// Message posted to a broadcast channel: urgency marker plus title as
/// plain content (so the mention pings), and the notice as an embed.
pub fn channel_message(notice: &Notice) -> CreateMessage {
    let profile = notice.category.profile();
    let mut fields = vec![
        EmbedField::new("📝 Message", notice.message.clone(), false),
        EmbedField::new("👤 Sender", notice.sender.display_name.clone(), true),
        EmbedField::new("⏰ Time", discord_timestamp(notice, 'R'), true),
    ];
    if let Some(details) = &notice.details {
        fields.push(EmbedField::new("📋 Details", details.clone(), false));
    }

    CreateMessage {
        content: Some(notice.headline()),
        embeds: vec![Embed {
            title: profile.title.to_string(),
            description: None,
            color: profile.color,
            fields,
            thumbnail: thumbnail(notice),
            footer: footer(notice),
            timestamp: notice.sent_at.to_rfc3339(),
        }],
    }
}

/// Direct message sent to each configured recipient.
pub fn direct_message(notice: &Notice) -> CreateMessage {
    let profile = notice.category.profile();
    let origin = notice.origin.as_deref().unwrap_or("Discord");
    let mut fields = vec![
        EmbedField::new("Sender", notice.sender.display_name.clone(), true),
        EmbedField::new("Time", discord_timestamp(notice, 'F'), true),
        EmbedField::new("Message", notice.message.clone(), false),
    ];
    if let Some(details) = &notice.details {
        fields.push(EmbedField::new("Details", details.clone(), false));
    }

    CreateMessage {
        content: None,
        embeds: vec![Embed {
            title: format!("📢 {}", profile.title),
            description: Some(format!("New notification from **{origin}**!")),
            color: profile.color,
            fields,
            thumbnail: thumbnail(notice),
            footer: footer(notice),
            timestamp: notice.sent_at.to_rfc3339(),
        }],
    }
}

/// `<t:unix:style>` markup, rendered by clients in the reader's timezone.
fn discord_timestamp(notice: &Notice, style: char) -> String {
    format!("<t:{}:{style}>", notice.sent_at.timestamp())
}

fn thumbnail(notice: &Notice) -> Option<EmbedImage> {
    notice
        .sender
        .avatar_url
        .clone()
        .map(|url| EmbedImage { url })
}

fn footer(notice: &Notice) -> EmbedFooter {
    EmbedFooter {
        text: format!("Notification type: {}", notice.title()),
    }
}
