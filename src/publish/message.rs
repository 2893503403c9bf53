use chrono::{DateTime, TimeZone};

use crate::config::{Config, MessageStyle};
use crate::constant::TEST_MESSAGE_PREFIX;

/// Turns an entry title into the text that goes out with the post.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageFormatter {
    Plain,
    Decorated { prefix: String, hashtags: Vec<String> },
}

impl MessageFormatter {
    pub fn from_config(config: &Config) -> Self {
        match config.message_style {
            MessageStyle::Plain => MessageFormatter::Plain,
            MessageStyle::Decorated => MessageFormatter::Decorated {
                prefix: config.post_prefix.clone(),
                hashtags: config.hashtags.clone(),
            },
        }
    }

    pub fn format(&self, title: &str) -> String {
        match self {
            MessageFormatter::Plain => title.to_string(),
            MessageFormatter::Decorated { prefix, hashtags } => {
                let mut parts = Vec::with_capacity(3);
                if !prefix.is_empty() {
                    parts.push(prefix.clone());
                }
                parts.push(title.to_string());
                if !hashtags.is_empty() {
                    parts.push(hashtags.join(" "));
                }
                parts.join("\n\n")
            }
        }
    }
}

/// The timestamped message used by the connectivity check.
pub fn test_message<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}\nPosted at: {}",
        TEST_MESSAGE_PREFIX,
        now.format("%Y-%m-%d %H:%M:%S %Z")
    )
}

#[test]
fn test_plain_is_the_raw_title() {
    assert_eq!(MessageFormatter::Plain.format("Funny Cat"), "Funny Cat");
}

#[test]
fn test_decorated_joins_parts_with_blank_lines() {
    let formatter = MessageFormatter::Decorated {
        prefix: "🤣 Daily Meme: ".to_string(),
        hashtags: vec!["#Meme".to_string(), "#LOL".to_string()],
    };
    assert_eq!(
        formatter.format("Funny Cat"),
        "🤣 Daily Meme: \n\nFunny Cat\n\n#Meme #LOL"
    );
}

#[test]
fn test_decorated_omits_empty_parts() {
    let formatter = MessageFormatter::Decorated {
        prefix: String::new(),
        hashtags: vec![],
    };
    assert_eq!(formatter.format("Funny Cat"), "Funny Cat");
}

#[test]
fn test_formatter_follows_config_style() {
    let config = crate::config::config_from_pairs(&[
        ("MESSAGE_STYLE", "decorated"),
        ("POST_PREFIX", "Hey: "),
        ("POST_HASHTAGS", "#One"),
    ]);
    assert_eq!(
        MessageFormatter::from_config(&config).format("T"),
        "Hey: \n\nT\n\n#One"
    );
    let config = crate::config::config_from_pairs(&[]);
    assert_eq!(MessageFormatter::from_config(&config), MessageFormatter::Plain);
}

#[test]
fn test_message_carries_timestamp() {
    let now = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
    assert_eq!(
        test_message(&now),
        "Automated Test Post from memepost!\nPosted at: 2024-05-01 12:30:00 UTC"
    );
}
