//! How users are named to each other and to the admin channel.

use crate::domain::{Catalog, User};

const ANONYMOUS: &str = "Anonymous";

/// Escape the characters Telegram HTML treats specially.
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn display_name(user: &User) -> String {
    let parts: Vec<&str> = [user.first_name(), user.last_name()]
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        ANONYMOUS.to_owned()
    } else {
        parts.join(" ")
    }
}

/// `@username`, or a `tg://user` mention link around the escaped name.
pub(crate) fn identifier(user: &User) -> String {
    if user.username().is_empty() {
        format!(
            r#"<a href="tg://user?id={}">{}</a>"#,
            user.id(),
            escape_html(&display_name(user))
        )
    } else {
        format!("@{}", escape_html(user.username()))
    }
}

/// [`identifier`] plus the localized phone line when a phone is stored.
pub(crate) fn identifier_with_phone(catalog: &Catalog, language: &str, user: &User) -> String {
    let mut text = identifier(user);
    if let Some(phone) = user.phone() {
        text.push('\n');
        text.push_str(&catalog.format(language, "phone_label", &[&escape_html(phone)]));
    }
    text
}
