//! Deterministic rule-table matcher used when no provider yields a usable
//! structured call.
//!
//! Each rule is a total, side-effect-free function from the request text to
//! an optional argument map. Rules are tried in table order; the first one
//! that both matches and extracts its arguments wins. A rule never invents
//! a required argument: if the text does not contain it, the rule declines
//! and the scan continues.

use serde_json::{json, Map, Value};

/// A fallback match: action name plus raw arguments, still subject to
/// catalog validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedCall {
    pub action: &'static str,
    pub arguments: Map<String, Value>,
}

struct Rule {
    action: &'static str,
    extract: fn(&Text) -> Option<Map<String, Value>>,
}

const RULES: &[Rule] = &[
    Rule {
        action: "list_channels",
        extract: list_channels,
    },
    Rule {
        action: "list_roles",
        extract: list_roles,
    },
    Rule {
        action: "create_channel",
        extract: create_channel,
    },
    Rule {
        action: "create_role",
        extract: create_role,
    },
    Rule {
        action: "delete_category",
        extract: delete_category,
    },
    Rule {
        action: "delete_channel",
        extract: delete_channel,
    },
    Rule {
        action: "delete_role",
        extract: delete_role,
    },
    Rule {
        action: "kick_member",
        extract: kick_member,
    },
    Rule {
        action: "ban_member",
        extract: ban_member,
    },
    Rule {
        action: "get_server_stats",
        extract: server_stats,
    },
    Rule {
        action: "backup_server",
        extract: backup_server,
    },
];

/// Match the request text against the rule table. Pure: identical text
/// always produces the identical result.
pub fn detect(text: &str) -> Option<DetectedCall> {
    let text = Text::new(text);
    for rule in RULES {
        if let Some(arguments) = (rule.extract)(&text) {
            return Some(DetectedCall {
                action: rule.action,
                arguments,
            });
        }
    }
    None
}

/// Pre-tokenized view of the request text.
struct Text<'a> {
    raw: &'a str,
    lower: String,
    words: Vec<&'a str>,
}

impl<'a> Text<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            raw,
            lower: raw.to_lowercase(),
            words: raw.split_whitespace().collect(),
        }
    }

    fn has(&self, word: &str) -> bool {
        self.lower.split_whitespace().any(|w| trim_token(w) == word)
    }

    fn has_any(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.has(w))
    }

    /// The cleaned word following the first occurrence of any of `keys`.
    /// Declines filler words so `"channel called general"` does not yield
    /// `"called"` as the name.
    fn word_after(&self, keys: &[&str]) -> Option<String> {
        for key in keys {
            let pos = self
                .words
                .iter()
                .position(|w| trim_token(&w.to_lowercase()) == *key);
            let Some(pos) = pos else { continue };
            if let Some(next) = self.words.get(pos + 1) {
                let cleaned = trim_token(next);
                if !cleaned.is_empty() && !is_filler(&cleaned.to_lowercase()) {
                    return Some(cleaned.to_string());
                }
            }
        }
        None
    }

    /// Text between the first pair of single or double quotes.
    fn quoted(&self) -> Option<String> {
        for quote in ['"', '\''] {
            let mut parts = self.raw.splitn(3, quote);
            parts.next()?;
            if let Some(inner) = parts.next() {
                if parts.next().is_some() && !inner.trim().is_empty() {
                    return Some(inner.trim().to_string());
                }
            }
        }
        None
    }
}

fn trim_token(word: &str) -> &str {
    word.trim_matches(|c: char| {
        matches!(c, '"' | '\'' | ',' | '.' | '!' | '?' | ':' | ';' | '@' | '(' | ')')
    })
}

fn is_filler(word: &str) -> bool {
    matches!(
        word,
        "a" | "an"
            | "the"
            | "new"
            | "called"
            | "named"
            | "channel"
            | "channels"
            | "role"
            | "roles"
            | "category"
            | "member"
            // Pronouns never name a concrete target.
            | "someone"
            | "somebody"
            | "anyone"
            | "anybody"
            | "everyone"
            | "everybody"
            | "them"
            | "him"
            | "her"
    )
}

const CREATE_WORDS: &[&str] = &["create", "make", "add"];
const LIST_WORDS: &[&str] = &["list", "show", "display"];
const COLOR_WORDS: &[&str] = &[
    "red", "blue", "green", "yellow", "purple", "orange", "pink",
];

/// Name extraction order: a quoted span, then an explicit `called`/`named`
/// marker, then the word after the entity keyword itself. Quotes win so a
/// multi-word name like `called "dev talk"` is taken whole instead of being
/// cut at the first token.
fn name_after(text: &Text, last_resort: &[&str]) -> Option<String> {
    text.quoted()
        .or_else(|| text.word_after(&["called", "named"]))
        .or_else(|| text.word_after(last_resort))
}

fn list_channels(text: &Text) -> Option<Map<String, Value>> {
    (text.has_any(LIST_WORDS) && text.has_any(&["channel", "channels"])).then(Map::new)
}

fn list_roles(text: &Text) -> Option<Map<String, Value>> {
    (text.has_any(LIST_WORDS) && text.has_any(&["role", "roles"])).then(Map::new)
}

fn create_channel(text: &Text) -> Option<Map<String, Value>> {
    if !text.has_any(CREATE_WORDS) {
        return None;
    }
    let has_channel = text.has_any(&["channel", "channels"]);
    let has_category = text.has("category");
    if !has_channel && !has_category {
        return None;
    }

    let name = if has_channel {
        name_after(text, &["channel"])?
    } else {
        name_after(text, &["category"])?
    };

    let mut args = Map::new();
    args.insert("channel_name".into(), json!(name));
    if has_category && !has_channel {
        args.insert("channel_type".into(), json!("category"));
    } else if text.has("voice") {
        args.insert("channel_type".into(), json!("voice"));
    } else {
        args.insert("channel_type".into(), json!("text"));
    }
    Some(args)
}

fn create_role(text: &Text) -> Option<Map<String, Value>> {
    if !(text.has_any(CREATE_WORDS) && text.has_any(&["role", "roles"])) {
        return None;
    }
    let name = name_after(text, &["role"])?;

    let mut args = Map::new();
    args.insert("role_name".into(), json!(name));
    if let Some(color) = hex_color(text).or_else(|| color_word(text)) {
        args.insert("color".into(), json!(color));
    }
    Some(args)
}

fn delete_category(text: &Text) -> Option<Map<String, Value>> {
    if !(text.has_any(&["delete", "remove"]) && text.has("category")) {
        return None;
    }
    let name = name_after(text, &["category"])?;
    let mut args = Map::new();
    args.insert("category".into(), json!(name));
    Some(args)
}

fn delete_channel(text: &Text) -> Option<Map<String, Value>> {
    if !(text.has_any(&["delete", "remove"]) && text.has_any(&["channel", "channels"])) {
        return None;
    }
    let name = name_after(text, &["channel"])?;
    let mut args = Map::new();
    args.insert("channel".into(), json!(name));
    Some(args)
}

fn delete_role(text: &Text) -> Option<Map<String, Value>> {
    if !(text.has_any(&["delete", "remove"]) && text.has_any(&["role", "roles"])) {
        return None;
    }
    let name = name_after(text, &["role"])?;
    let mut args = Map::new();
    args.insert("role".into(), json!(name));
    Some(args)
}

fn kick_member(text: &Text) -> Option<Map<String, Value>> {
    if !text.has("kick") {
        return None;
    }
    let member = name_after(text, &["member", "kick"])?;
    let mut args = Map::new();
    args.insert("member".into(), json!(member));
    Some(args)
}

fn ban_member(text: &Text) -> Option<Map<String, Value>> {
    if !text.has("ban") {
        return None;
    }
    let member = name_after(text, &["member", "ban"])?;
    let mut args = Map::new();
    args.insert("member".into(), json!(member));
    Some(args)
}

fn server_stats(text: &Text) -> Option<Map<String, Value>> {
    let hit = text.has_any(&["stats", "statistics"])
        || (text.has("server") && text.has_any(&["info", "information", "status"]));
    hit.then(Map::new)
}

fn backup_server(text: &Text) -> Option<Map<String, Value>> {
    (text.has("backup") && text.has("server")).then(Map::new)
}

fn hex_color(text: &Text) -> Option<String> {
    text.words.iter().find_map(|w| {
        let w = w.trim_matches(|c: char| matches!(c, ',' | '.' | '!' | '?'));
        let rest = w.strip_prefix('#')?;
        (rest.len() == 6 && rest.chars().all(|c| c.is_ascii_hexdigit()))
            .then(|| w.to_string())
    })
}

fn color_word(text: &Text) -> Option<String> {
    COLOR_WORDS
        .iter()
        .find(|c| text.has(c))
        .map(|c| c.to_string())
}
