//! Emoji shortcode tool

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::{ToolCall, ToolDefinition};
use crate::tools::Tool;

/// Look up a shortcode (`thumbsup`) or CLDR name (`thumbs_up`)
fn lookup(code: &str) -> Option<&'static str> {
    if code.is_empty() || code.contains(char::is_whitespace) {
        return None;
    }
    if let Some(emoji) = emojis::get_by_shortcode(code) {
        return Some(emoji.as_str());
    }

    let wanted = code.to_lowercase();
    emojis::iter()
        .find(|emoji| cldr_code(emoji.name()) == wanted)
        .map(|emoji| emoji.as_str())
}

/// `"flag: United States"` becomes `flag_united_states`
fn cldr_code(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ':' | ',' | '.' | '\'' | '"' | '!' | '(' | ')'))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Replace every known `:shortcode:` in `text`; unknown codes are kept
fn emojize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(':') {
        let after = &rest[start + 1..];
        let Some(end) = after.find(':') else {
            break;
        };

        let code = &after[..end];
        match lookup(code) {
            Some(emoji) => {
                out.push_str(&rest[..start]);
                out.push_str(emoji);
                rest = &after[end + 1..];
            }
            None => {
                // Keep the first colon and retry from the second
                out.push_str(&rest[..start + 1]);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Turns shortcodes such as `:thumbs_up:` into emoji
#[derive(Debug, Default)]
pub struct Emojistr;

#[async_trait]
impl Tool for Emojistr {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "emojistr",
            "Returns an emoji from a shortcode",
            json!({
                "type": "object",
                "properties": {
                    "emoji_shortcode": {
                        "type": "string",
                        "description": "The short code name of the emojis"
                    }
                },
                "required": ["emoji_shortcode"]
            }),
        )
    }

    async fn call(&self, call: &ToolCall) -> anyhow::Result<Value> {
        let code = call.get_string("emoji_shortcode").unwrap_or_default();
        Ok(json!(emojize(&code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emojize() {
        assert_eq!(emojize(":thumbs_up:"), "👍");
        assert_eq!(emojize("Rust :crab: is :fire:"), "Rust 🦀 is 🔥");
        assert_eq!(emojize(":unknown_code:"), ":unknown_code:");
        assert_eq!(emojize("time 10:30 :tada:"), "time 10:30 🎉");
        assert_eq!(emojize("no codes"), "no codes");
    }

    #[test]
    fn test_cldr_names() {
        assert_eq!(emojize(":smiling_face_with_sunglasses:"), "😎");
        assert_eq!(emojize(":face_with_tears_of_joy:"), "😂");
        assert_eq!(emojize(":cat_face:"), "🐱");
        assert_eq!(emojize(":sun_with_face:"), "🌞");
        assert_eq!(emojize(":grinning_squinting_face:"), "😆");
        assert_eq!(emojize(":Thumbs_Up:"), "👍");
    }

    #[test]
    fn test_cldr_code() {
        assert_eq!(cldr_code("flag: United States"), "flag_united_states");
        assert_eq!(cldr_code("Thumbs up"), "thumbs_up");
    }
}
