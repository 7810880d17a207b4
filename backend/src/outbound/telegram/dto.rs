//! Bot API request and response DTOs.
//!
//! Domain payloads are mapped onto these wire shapes in one pass; nothing
//! outside this adapter sees Bot API field names.

use serde::{Deserialize, Serialize};

use crate::domain::{
    CallbackAnswer, InlineButton, Keyboard, MessageEdit, OutgoingMessage, ParseMode, ReplyButton,
    ReplyRequest,
};

/// Generic `{ ok, result, description, error_code }` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponseDto<T> {
    pub(crate) ok: bool,
    pub(crate) result: Option<T>,
    pub(crate) description: Option<String>,
    pub(crate) error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SentMessageDto {
    pub(super) message_id: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyMarkupDto<'a>>,
}

impl<'a> From<&'a OutgoingMessage> for SendMessageRequest<'a> {
    fn from(message: &'a OutgoingMessage) -> Self {
        Self {
            chat_id: message.chat_id.get(),
            text: &message.text,
            parse_mode: parse_mode(message.parse_mode),
            reply_markup: message.keyboard.as_ref().map(ReplyMarkupDto::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct EditMessageTextRequest<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyMarkupDto<'a>>,
}

impl<'a> From<&'a MessageEdit> for EditMessageTextRequest<'a> {
    fn from(edit: &'a MessageEdit) -> Self {
        Self {
            chat_id: edit.chat_id.get(),
            message_id: edit.message_id.get(),
            text: &edit.text,
            parse_mode: parse_mode(edit.parse_mode),
            reply_markup: edit.inline_rows.as_deref().map(inline_markup),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct AnswerCallbackQueryRequest<'a> {
    callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

impl<'a> From<&'a CallbackAnswer> for AnswerCallbackQueryRequest<'a> {
    fn from(answer: &'a CallbackAnswer) -> Self {
        Self {
            callback_query_id: &answer.callback_id,
            text: answer.text.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ReplyMarkupDto<'a> {
    Inline {
        inline_keyboard: Vec<Vec<InlineButtonDto<'a>>>,
    },
    Reply {
        keyboard: Vec<Vec<KeyboardButtonDto<'a>>>,
        one_time_keyboard: bool,
        resize_keyboard: bool,
    },
    Remove {
        remove_keyboard: bool,
    },
}

impl<'a> From<&'a Keyboard> for ReplyMarkupDto<'a> {
    fn from(keyboard: &'a Keyboard) -> Self {
        match keyboard {
            Keyboard::Inline { rows } => inline_markup(rows),
            Keyboard::Reply { rows, one_time } => Self::Reply {
                keyboard: rows
                    .iter()
                    .map(|row| row.iter().map(KeyboardButtonDto::from).collect())
                    .collect(),
                one_time_keyboard: *one_time,
                resize_keyboard: true,
            },
            Keyboard::RemoveReply => Self::Remove {
                remove_keyboard: true,
            },
        }
    }
}

fn inline_markup(rows: &[Vec<InlineButton>]) -> ReplyMarkupDto<'_> {
    ReplyMarkupDto::Inline {
        inline_keyboard: rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| InlineButtonDto {
                        text: &button.text,
                        callback_data: &button.callback_data,
                    })
                    .collect()
            })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
struct InlineButtonDto<'a> {
    text: &'a str,
    callback_data: &'a str,
}

#[derive(Debug, Serialize)]
struct KeyboardButtonDto<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    request_location: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    request_contact: bool,
}

impl<'a> From<&'a ReplyButton> for KeyboardButtonDto<'a> {
    fn from(button: &'a ReplyButton) -> Self {
        Self {
            text: &button.text,
            request_location: button.request == ReplyRequest::Location,
            request_contact: button.request == ReplyRequest::Contact,
        }
    }
}

const fn parse_mode(mode: ParseMode) -> Option<&'static str> {
    match mode {
        ParseMode::Plain => None,
        ParseMode::Html => Some("HTML"),
    }
}

#[cfg(test)]
mod tests {
    //! Wire shape coverage for request DTOs.
    use insta::assert_json_snapshot;
    use rstest::rstest;

    use super::*;
    use crate::domain::{MessageId, UserId};

    #[rstest]
    fn inline_message_serialises_to_bot_api_shape() {
        let message = OutgoingMessage::text(UserId::new(7), "<b>Hi</b>")
            .html()
            .with_inline(vec![vec![InlineButton::new("Yes", "yes")]]);
        assert_json_snapshot!(SendMessageRequest::from(&message), @r#"
        {
          "chat_id": 7,
          "text": "<b>Hi</b>",
          "parse_mode": "HTML",
          "reply_markup": {
            "inline_keyboard": [
              [
                {
                  "text": "Yes",
                  "callback_data": "yes"
                }
              ]
            ]
          }
        }
        "#);
    }

    #[rstest]
    fn location_keyboard_requests_location() {
        let message = OutgoingMessage::text(UserId::new(7), "Share").with_keyboard(Keyboard::Reply {
            rows: vec![vec![ReplyButton::new("📍", ReplyRequest::Location)]],
            one_time: true,
        });
        assert_json_snapshot!(SendMessageRequest::from(&message), @r#"
        {
          "chat_id": 7,
          "text": "Share",
          "reply_markup": {
            "keyboard": [
              [
                {
                  "text": "📍",
                  "request_location": true
                }
              ]
            ],
            "one_time_keyboard": true,
            "resize_keyboard": true
          }
        }
        "#);
    }

    #[rstest]
    fn edit_without_rows_omits_markup() {
        let edit = MessageEdit::text(UserId::new(3), MessageId::new(44), "done");
        let value = serde_json::to_value(EditMessageTextRequest::from(&edit)).expect("serialise");
        assert_eq!(value.get("message_id"), Some(&serde_json::json!(44)));
        assert!(value.get("reply_markup").is_none());
        assert!(value.get("parse_mode").is_none());
    }

    #[rstest]
    fn remove_keyboard_serialises_flag() {
        let message =
            OutgoingMessage::text(UserId::new(1), "bye").with_keyboard(Keyboard::RemoveReply);
        let value = serde_json::to_value(SendMessageRequest::from(&message)).expect("serialise");
        assert_eq!(
            value.get("reply_markup"),
            Some(&serde_json::json!({"remove_keyboard": true}))
        );
    }
}
