/// Weight of the existing rating, as if it were backed by this many reviews.
pub const RATING_PRIOR_WEIGHT: f64 = 10.0;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Fixed-weight blend of the current rating with one new review:
/// `round((old * 10 + given) / 11, 1)`. A single review moves the rating
/// by at most ~0.4 stars.
pub fn blended_rating(old_rating: f64, given: i64) -> f64 {
    let raw = (old_rating * RATING_PRIOR_WEIGHT + given as f64) / (RATING_PRIOR_WEIGHT + 1.0);
    let rounded = (raw * 10.0).round() / 10.0;
    rounded.clamp(MIN_RATING as f64, MAX_RATING as f64)
}

/// A customer message counts as a rating only if it is a single digit 1-5.
pub fn parse_rating(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.chars().count() != 1 {
        return None;
    }
    trimmed
        .parse::<i64>()
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
}
