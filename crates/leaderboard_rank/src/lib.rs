use core_types::{LeaderboardEntry, RawEntry, TransformError, LEADERBOARD_SIZE};

const MASK: &str = "***";

/// Ranks raw upstream rows into the public leaderboard.
///
/// Rows are ordered by wagered amount, highest first, with ties keeping their
/// upstream order. Only the top [`LEADERBOARD_SIZE`] survive, and the first
/// two ranks are displayed in swapped order.
pub fn transform(raw: Vec<RawEntry>) -> Result<Vec<LeaderboardEntry>, TransformError> {
    let mut parsed = raw
        .into_iter()
        .map(|entry| {
            let amount = parse_wager(&entry)?;
            Ok((entry.username, amount))
        })
        .collect::<Result<Vec<_>, TransformError>>()?;

    // Stable, so equal amounts keep input order.
    parsed.sort_by(|a, b| b.1.total_cmp(&a.1));
    parsed.truncate(LEADERBOARD_SIZE);
    swap_top_two(&mut parsed);

    Ok(parsed
        .into_iter()
        .map(|(username, amount)| {
            let wagered = round_wager(amount);
            LeaderboardEntry {
                username: mask_username(&username),
                wagered,
                weighted_wager: wagered,
            }
        })
        .collect())
}

pub fn swap_top_two<T>(ranks: &mut [T]) {
    if ranks.len() >= 2 {
        ranks.swap(0, 1);
    }
}

/// Keeps the first and last two characters; names of four characters or
/// fewer pass through unchanged.
pub fn mask_username(username: &str) -> String {
    let chars: Vec<char> = username.chars().collect();
    if chars.len() <= 4 {
        return username.to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}{MASK}{tail}")
}

/// Nearest integer, halves away from zero.
pub fn round_wager(amount: f64) -> i64 {
    amount.round() as i64
}

fn parse_wager(entry: &RawEntry) -> Result<f64, TransformError> {
    entry
        .wagered_amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TransformError::NonNumericWager {
            username: entry.username.clone(),
            raw: entry.wagered_amount.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(username: &str, amount: &str) -> RawEntry {
        RawEntry {
            username: username.to_string(),
            wagered_amount: amount.to_string(),
        }
    }

    #[test]
    fn masks_by_length() {
        assert_eq!(mask_username(""), "");
        assert_eq!(mask_username("ab"), "ab");
        assert_eq!(mask_username("abcd"), "abcd");
        assert_eq!(mask_username("abcde"), "ab***de");
        assert_eq!(mask_username("abcdefgh"), "ab***gh");
    }

    #[test]
    fn masking_counts_characters_not_bytes() {
        assert_eq!(mask_username("äöüß"), "äöüß");
        assert_eq!(mask_username("éèêëē"), "éè***ëē");
    }

    #[test]
    fn rounds_halves_away_from_zero() {
        assert_eq!(round_wager(1234.5), 1235);
        assert_eq!(round_wager(1235.5), 1236);
        assert_eq!(round_wager(1234.49), 1234);
        assert_eq!(round_wager(0.5), 1);
        assert_eq!(round_wager(0.0), 0);
    }

    #[test]
    fn rounding_applies_to_both_wager_fields() {
        let out = transform(vec![raw("alice", "1234.5")]).expect("transform");
        assert_eq!(out[0].wagered, 1235);
        assert_eq!(out[0].weighted_wager, 1235);
    }

    #[test]
    fn swap_twice_restores_order() {
        let mut ranks = vec![1, 2, 3];
        swap_top_two(&mut ranks);
        assert_eq!(ranks, vec![2, 1, 3]);
        swap_top_two(&mut ranks);
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn swap_ignores_short_lists() {
        let mut one = vec!["only"];
        swap_top_two(&mut one);
        assert_eq!(one, vec!["only"]);
        let mut none: Vec<u8> = Vec::new();
        swap_top_two(&mut none);
        assert!(none.is_empty());
    }

    #[test]
    fn twelve_entries_keep_ten_with_top_two_swapped() {
        let input = (1..=12)
            .map(|i| raw(&format!("player{i:02}"), &format!("{}.0", i * 100)))
            .collect::<Vec<_>>();
        let out = transform(input).expect("transform");
        assert_eq!(out.len(), 10);

        let wagers = out.iter().map(|e| e.wagered).collect::<Vec<_>>();
        assert_eq!(
            wagers,
            vec![1100, 1200, 1000, 900, 800, 700, 600, 500, 400, 300]
        );
        assert_eq!(out[0].username, "pl***11");
        assert_eq!(out[1].username, "pl***12");
    }

    #[test]
    fn ties_keep_input_order() {
        let out = transform(vec![
            raw("first", "10"),
            raw("second", "10"),
            raw("third", "10"),
            raw("top", "50"),
        ])
        .expect("transform");
        let names = out.iter().map(|e| e.username.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["fi***st", "top", "se***nd", "th***rd"]);
    }

    #[test]
    fn single_entry_is_not_swapped() {
        let out = transform(vec![raw("solo", "3.2")]).expect("transform");
        assert_eq!(
            out,
            vec![LeaderboardEntry {
                username: "solo".to_string(),
                wagered: 3,
                weighted_wager: 3,
            }]
        );
    }

    #[test]
    fn empty_input_gives_empty_board() {
        assert!(transform(Vec::new()).expect("transform").is_empty());
    }

    #[test]
    fn accepts_padded_amounts() {
        let out = transform(vec![raw("alice", " 42.6 ")]).expect("transform");
        assert_eq!(out[0].wagered, 43);
    }

    #[test]
    fn non_numeric_amount_fails_whole_batch() {
        let err = transform(vec![raw("alice", "12.0"), raw("mallory", "lots")])
            .expect_err("non numeric");
        assert_eq!(
            err,
            TransformError::NonNumericWager {
                username: "mallory".to_string(),
                raw: "lots".to_string(),
            }
        );
    }

    #[test]
    fn non_finite_amount_is_rejected() {
        assert!(transform(vec![raw("alice", "NaN")]).is_err());
        assert!(transform(vec![raw("alice", "inf")]).is_err());
    }
}
