//! `/language` picker.

use crate::domain::{
    CallbackAction, Envelope, InlineButton, LANGUAGES, OutgoingMessage, User, native_name,
};

use super::context::SessionContext;

const LANGUAGES_PER_ROW: usize = 2;

/// Every language with loaded templates, two per row, the current one ticked.
pub(crate) fn language_picker(ctx: &SessionContext, user: &User) -> Envelope {
    let current = user.language_code();
    let offered: Vec<_> = LANGUAGES
        .iter()
        .filter(|language| ctx.catalog.has_language(language.code))
        .collect();
    let rows = offered
        .chunks(LANGUAGES_PER_ROW)
        .map(|chunk| {
            chunk
                .iter()
                .map(|language| {
                    let label = if language.code == current {
                        format!("✅ {}", language.native_name)
                    } else {
                        language.native_name.to_owned()
                    };
                    InlineButton::new(label, CallbackAction::Language(language.code.to_owned()))
                })
                .collect()
        })
        .collect();
    let text = ctx.format(user, "language.picker", &[&native_name(current)]);
    Envelope::reply(OutgoingMessage::text(user.id(), text).with_inline(rows))
}
