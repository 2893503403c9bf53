use rand::seq::SliceRandom;
use rand::Rng;

use crate::feed::FeedEntry;

/// Picks one entry uniformly at random, or nothing when the list is empty.
pub fn select<'a, R: Rng + ?Sized>(entries: &'a [FeedEntry], rng: &mut R) -> Option<&'a FeedEntry> {
    let selected = entries.choose(rng)?;
    tracing::info!(
        "Selected entry: Title='{}', Link='{}', Image='{}'",
        selected.title,
        selected.link,
        selected.image_url.as_deref().unwrap_or("None")
    );
    Some(selected)
}
