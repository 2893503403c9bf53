use std::time::Duration;

pub const GRAPH_API_BASE: &str = "https://graph.facebook.com";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_POST_PREFIX: &str = "🤣 Daily Meme: ";
pub const DEFAULT_HASHTAGS: &[&str] = &[
    "#Meme",
    "#LOL",
    "#Funny",
    "#DankMemes",
    "#Humor",
    "#Relatable",
    "#Comedy",
    "#MemesDaily",
    "#InstaMemes",
    "#Laughter",
    "#MemeLife",
    "#Hilarious",
    "#FunniestMemes",
];

pub const TEST_MESSAGE_PREFIX: &str = "Automated Test Post from memepost!";

pub const USER_AGENT: &str = concat!("memepost/", env!("CARGO_PKG_VERSION"));

/// Number of characters of the raw feed body echoed to the log.
pub const FEED_PREVIEW_CHARS: usize = 200;
