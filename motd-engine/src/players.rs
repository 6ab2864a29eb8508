//! Displayed player counts.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::constants::FAKE_PLAYER_BUCKET_MS;
use crate::data::{FakePlayers, Group, SelectionStrategy};
use crate::numbers::{ceil_f64_to_u32, u32_to_f64};
use crate::seed::bucket_seed;

/// Counts reported for one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PlayerCounts {
    pub base_online: u32,
    pub base_max: u32,
    pub display_online: u32,
    pub display_max: u32,
    pub fake_delta: u32,
    /// Host should report the counts as unknown.
    pub hidden: bool,
    /// Host should suppress the sample player list.
    pub hover_disabled: bool,
}

/// Apply the group's count policy to the host's real counts.
#[must_use]
pub fn compute(
    group: &Group,
    origin: Option<&str>,
    base_online: u32,
    base_max: u32,
    now_ms: u64,
) -> PlayerCounts {
    let policy = &group.player_count;
    let fake_delta = fake_delta(group, origin, base_online, now_ms);
    let display_online = base_online.saturating_add(fake_delta);

    let display_max = match (policy.max_players, policy.just_x_more) {
        (Some(fixed), _) => fixed.max(1),
        (None, Some(extra)) => display_online.saturating_add(extra),
        (None, None) => base_max,
    };

    PlayerCounts {
        base_online,
        base_max,
        display_online,
        display_max,
        fake_delta,
        hidden: policy.hide_player_count,
        hover_disabled: policy.disable_hover,
    }
}

fn fake_delta(group: &Group, origin: Option<&str>, base_online: u32, now_ms: u64) -> u32 {
    match group.player_count.fake_players {
        FakePlayers::Off => 0,
        FakePlayers::Static { count } => count,
        FakePlayers::Percent { percent } => {
            ceil_f64_to_u32(u32_to_f64(base_online) * percent.max(0.0) / 100.0)
        }
        FakePlayers::Range { min, max } => {
            let low = min.min(max);
            let high = min.max(max);
            if low == high {
                return low;
            }
            match origin {
                Some(key) if group.strategy == SelectionStrategy::StickyPerOrigin => {
                    let bucket = now_ms / FAKE_PLAYER_BUCKET_MS;
                    ChaCha8Rng::seed_from_u64(bucket_seed(key, bucket)).gen_range(low..=high)
                }
                _ => rand::thread_rng().gen_range(low..=high),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PlayerCountPolicy, Variant};

    fn group(strategy: SelectionStrategy, policy: PlayerCountPolicy) -> Group {
        Group::new("g", strategy, vec![Variant::new("v", 1, "hi")]).with_player_count(policy)
    }

    #[test]
    fn percent_and_max_override() {
        let policy = PlayerCountPolicy {
            fake_players: FakePlayers::Percent { percent: 50.0 },
            max_players: Some(20),
            ..PlayerCountPolicy::default()
        };
        let counts = compute(&group(SelectionStrategy::Random, policy), None, 10, 100, 0);
        assert_eq!(counts.fake_delta, 5);
        assert_eq!(counts.display_online, 15);
        assert_eq!(counts.display_max, 20);
        assert_eq!(counts.base_max, 100);
    }

    #[test]
    fn percent_rounds_up() {
        let policy = PlayerCountPolicy {
            fake_players: FakePlayers::Percent { percent: 10.0 },
            ..PlayerCountPolicy::default()
        };
        let counts = compute(&group(SelectionStrategy::Random, policy), None, 3, 20, 0);
        assert_eq!(counts.fake_delta, 1);
        assert_eq!(counts.display_max, 20);
    }

    #[test]
    fn just_x_more_tracks_display_online() {
        let policy = PlayerCountPolicy {
            fake_players: FakePlayers::Static { count: 4 },
            just_x_more: Some(1),
            ..PlayerCountPolicy::default()
        };
        let counts = compute(&group(SelectionStrategy::Random, policy), None, 6, 500, 0);
        assert_eq!(counts.display_online, 10);
        assert_eq!(counts.display_max, 11);
    }

    #[test]
    fn max_override_wins_over_just_x_more() {
        let policy = PlayerCountPolicy {
            just_x_more: Some(5),
            max_players: Some(0),
            ..PlayerCountPolicy::default()
        };
        let counts = compute(&group(SelectionStrategy::Random, policy), None, 6, 500, 0);
        assert_eq!(counts.display_max, 1);
    }

    #[test]
    fn sticky_range_is_stable_within_bucket() {
        let policy = PlayerCountPolicy {
            fake_players: FakePlayers::Range { min: 0, max: 1_000 },
            ..PlayerCountPolicy::default()
        };
        let group = group(SelectionStrategy::StickyPerOrigin, policy);
        let first = compute(&group, Some("1.2.3.4"), 1, 10, 60_000);
        for now in [60_001, 90_000, 119_999] {
            assert_eq!(compute(&group, Some("1.2.3.4"), 1, 10, now).fake_delta, first.fake_delta);
        }
        assert!(first.fake_delta <= 1_000);
    }

    #[test]
    fn unseeded_range_stays_in_bounds() {
        let policy = PlayerCountPolicy {
            fake_players: FakePlayers::Range { min: 3, max: 8 },
            hide_player_count: true,
            disable_hover: true,
            ..PlayerCountPolicy::default()
        };
        let group = group(SelectionStrategy::Random, policy);
        for _ in 0..200 {
            let counts = compute(&group, Some("o"), 0, 10, 0);
            assert!((3..=8).contains(&counts.fake_delta));
            assert!(counts.hidden && counts.hover_disabled);
        }
    }
}
