use std::collections::HashSet;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use super::rotation::RotationCursor;
use super::types::{CaptainId, EligibleCaptain, FixedAssignment, Strategy};
use super::weekday::{parse_date, weekday_of};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct ResolveOptions<'a> {
    pub strategy: Strategy,
    /// Without a cursor the rotation strategy degrades to a random pick
    pub rotation: Option<&'a mut RotationCursor>,
    pub exclude: Option<&'a HashSet<CaptainId>>,
    /// Overrides the per weekday + slot key, e.g. to chain several slots into one rotation
    pub rotation_key: Option<&'a str>,
}

/// Picks the captain for an outing on `date` in `time_slot_id`.
///
/// `Ok(None)` means nobody is available; only an unparseable date is an error.
pub fn resolve(
    date: &str,
    time_slot_id: &str,
    fixed_assignments: &[FixedAssignment],
    eligible_captains: &[EligibleCaptain],
    options: ResolveOptions<'_>,
) -> Result<Option<CaptainId>> {
    resolve_with_rng(
        date,
        time_slot_id,
        fixed_assignments,
        eligible_captains,
        options,
        &mut rand::thread_rng(),
    )
}

pub fn resolve_with_rng<R: Rng + ?Sized>(
    date: &str,
    time_slot_id: &str,
    fixed_assignments: &[FixedAssignment],
    eligible_captains: &[EligibleCaptain],
    options: ResolveOptions<'_>,
    rng: &mut R,
) -> Result<Option<CaptainId>> {
    let weekday = weekday_of(parse_date(date)?);
    Ok(resolve_on_weekday(
        weekday,
        time_slot_id,
        fixed_assignments,
        eligible_captains,
        options,
        rng,
    ))
}

/// Same as [`resolve_with_rng`] for callers that already know the weekday (0 = Sunday)
pub fn resolve_on_weekday<R: Rng + ?Sized>(
    weekday: u8,
    time_slot_id: &str,
    fixed_assignments: &[FixedAssignment],
    eligible_captains: &[EligibleCaptain],
    options: ResolveOptions<'_>,
    rng: &mut R,
) -> Option<CaptainId> {
    if eligible_captains.is_empty() {
        return None;
    }

    // Fixed assignments skip availability and exclusion checks
    if let Some(fixed) = find_fixed(fixed_assignments, weekday, time_slot_id) {
        debug!(
            "slot {} weekday {}: fixed assignment {} -> {}",
            time_slot_id, weekday, fixed.id, fixed.captain_id
        );
        return Some(fixed.captain_id.clone());
    }

    let exclude = options.exclude;
    let is_usable = |captain: &EligibleCaptain| {
        exclude.map_or(true, |ex| !ex.contains(&captain.id)) && captain.restriction.allows(weekday)
    };

    match (options.strategy, options.rotation) {
        (Strategy::Rotation, Some(cursor)) => {
            let key = match options.rotation_key {
                Some(key) => key.to_string(),
                None => RotationCursor::default_key(weekday, time_slot_id),
            };
            next_in_rotation(eligible_captains, cursor, &key, is_usable)
        }
        _ => {
            let usable: Vec<&EligibleCaptain> =
                eligible_captains.iter().filter(|c| is_usable(*c)).collect();
            usable.choose(rng).map(|c| c.id.clone())
        }
    }
}

pub fn find_fixed<'a>(
    fixed_assignments: &'a [FixedAssignment],
    weekday: u8,
    time_slot_id: &str,
) -> Option<&'a FixedAssignment> {
    fixed_assignments
        .iter()
        .find(|f| f.active && f.weekday == weekday && f.time_slot_id == time_slot_id)
}

/// Circular scan from the cursor; the cursor only moves when someone is found
fn next_in_rotation<F>(
    captains: &[EligibleCaptain],
    cursor: &mut RotationCursor,
    key: &str,
    is_usable: F,
) -> Option<CaptainId>
where
    F: Fn(&EligibleCaptain) -> bool,
{
    let n = captains.len();
    let start = cursor.get(key) % n;
    for i in 0..n {
        let index = (start + i) % n;
        let captain = &captains[index];
        if is_usable(captain) {
            cursor.set(key, (index + 1) % n);
            return Some(captain.id.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use crate::schedule::types::Restriction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // 2024-03-12 is a Tuesday, 2024-03-16 a Saturday, 2024-03-10 a Sunday
    const TUESDAY: &str = "2024-03-12";
    const SATURDAY: &str = "2024-03-16";
    const SUNDAY: &str = "2024-03-10";

    fn captains(list: &[(&str, Restriction)]) -> Vec<EligibleCaptain> {
        list.iter().map(|(id, r)| EligibleCaptain::new(id, *r)).collect()
    }

    fn fixed(weekday: u8, slot: &str, captain: &str) -> FixedAssignment {
        FixedAssignment {
            id: 1,
            weekday,
            time_slot_id: slot.to_string(),
            captain_id: captain.to_string(),
            active: true,
        }
    }

    fn rotate(
        date: &str,
        slot: &str,
        fixed: &[FixedAssignment],
        pool: &[EligibleCaptain],
        cursor: &mut RotationCursor,
        exclude: Option<&HashSet<CaptainId>>,
        key: Option<&str>,
    ) -> Option<CaptainId> {
        resolve(
            date,
            slot,
            fixed,
            pool,
            ResolveOptions {
                strategy: Strategy::Rotation,
                rotation: Some(cursor),
                exclude,
                rotation_key: key,
            },
        )
        .unwrap()
    }

    #[test]
    fn fixed_assignment_wins_over_restriction_and_exclusion() {
        let pool = captains(&[
            ("A", Restriction::Unrestricted),
            ("B", Restriction::SundaysOnly),
        ]);
        let overrides = vec![fixed(2, "am", "B")];
        let exclude: HashSet<CaptainId> = ["B".to_string()].into_iter().collect();
        let mut cursor = RotationCursor::new();

        let got = rotate(TUESDAY, "am", &overrides, &pool, &mut cursor, Some(&exclude), None);
        assert_eq!(got.as_deref(), Some("B"));
        assert!(cursor.is_empty());

        // Random strategy as well
        let got = resolve(TUESDAY, "am", &overrides, &pool, ResolveOptions::default()).unwrap();
        assert_eq!(got.as_deref(), Some("B"));

        // Other slot on the same day is not affected
        let got = rotate(TUESDAY, "pm", &overrides, &pool, &mut cursor, None, None);
        assert_eq!(got.as_deref(), Some("A"));
    }

    #[test]
    fn inactive_fixed_assignment_is_ignored() {
        let pool = captains(&[("A", Restriction::Unrestricted)]);
        let mut deleted = fixed(2, "am", "Z");
        deleted.active = false;
        let mut cursor = RotationCursor::new();
        let got = rotate(TUESDAY, "am", &[deleted], &pool, &mut cursor, None, None);
        assert_eq!(got.as_deref(), Some("A"));
    }

    #[test]
    fn empty_pool_returns_none() {
        let mut cursor = RotationCursor::new();
        assert_eq!(rotate(TUESDAY, "am", &[], &[], &mut cursor, None, None), None);
        assert_eq!(
            resolve(TUESDAY, "am", &[], &[], ResolveOptions::default()).unwrap(),
            None
        );
    }

    #[test]
    fn rotation_cycles_through_usable_captains() {
        let pool = captains(&[
            ("A", Restriction::Unrestricted),
            ("B", Restriction::WeekendsOnly),
            ("C", Restriction::WeekdaysOnly),
            ("D", Restriction::Unrestricted),
        ]);
        let mut cursor = RotationCursor::new();
        let picks: Vec<_> = (0..6)
            .map(|_| rotate(TUESDAY, "am", &[], &pool, &mut cursor, None, None).unwrap())
            .collect();
        assert_eq!(picks, vec!["A", "C", "D", "A", "C", "D"]);

        let mut cursor = RotationCursor::new();
        let picks: Vec<_> = (0..3)
            .map(|_| rotate(SATURDAY, "am", &[], &pool, &mut cursor, None, None).unwrap())
            .collect();
        assert_eq!(picks, vec!["A", "B", "D"]);
    }

    #[test]
    fn default_keys_keep_rotations_apart() {
        let pool = captains(&[("A", Restriction::Unrestricted), ("B", Restriction::Unrestricted)]);
        let mut cursor = RotationCursor::new();
        assert_eq!(rotate(TUESDAY, "am", &[], &pool, &mut cursor, None, None).as_deref(), Some("A"));
        assert_eq!(rotate(TUESDAY, "pm", &[], &pool, &mut cursor, None, None).as_deref(), Some("A"));
        assert_eq!(cursor.get("2-am"), 1);
        assert_eq!(cursor.get("2-pm"), 1);
    }

    #[test]
    fn shared_key_chains_slots() {
        let pool = captains(&[
            ("A", Restriction::Unrestricted),
            ("B", Restriction::Unrestricted),
            ("C", Restriction::Unrestricted),
        ]);
        let mut cursor = RotationCursor::new();
        let key = Some("global");
        assert_eq!(rotate(TUESDAY, "am", &[], &pool, &mut cursor, None, key).as_deref(), Some("A"));
        assert_eq!(rotate(TUESDAY, "pm", &[], &pool, &mut cursor, None, key).as_deref(), Some("B"));
        assert_eq!(rotate(SUNDAY, "am", &[], &pool, &mut cursor, None, key).as_deref(), Some("C"));
        assert_eq!(cursor.get("global"), 0);
    }

    #[test]
    fn exclusion_is_skipped_by_rotation() {
        let pool = captains(&[("A", Restriction::Unrestricted), ("B", Restriction::Unrestricted)]);
        let exclude: HashSet<CaptainId> = ["A".to_string()].into_iter().collect();
        let mut cursor = RotationCursor::new();
        let got = rotate(TUESDAY, "am", &[], &pool, &mut cursor, Some(&exclude), None);
        assert_eq!(got.as_deref(), Some("B"));
        assert_eq!(cursor.get("2-am"), 0);
    }

    #[test]
    fn nobody_usable_leaves_cursor_untouched() {
        let pool = captains(&[("A", Restriction::SundaysOnly), ("B", Restriction::Unrestricted)]);
        let exclude: HashSet<CaptainId> = ["B".to_string()].into_iter().collect();
        let mut cursor = RotationCursor::new();
        cursor.set("k", 1);
        let got = rotate(TUESDAY, "am", &[], &pool, &mut cursor, Some(&exclude), Some("k"));
        assert_eq!(got, None);
        assert_eq!(cursor.get("k"), 1);
        assert_eq!(cursor.get("2-am"), 0);
    }

    #[test]
    fn rotation_is_repeatable_from_a_snapshot() {
        let pool = captains(&[
            ("A", Restriction::Unrestricted),
            ("B", Restriction::Unrestricted),
            ("C", Restriction::SaturdaysOnly),
        ]);
        let mut snapshot = RotationCursor::new();
        snapshot.set("2-am", 1);

        let mut first = snapshot.clone();
        let mut second = snapshot.clone();
        let a = rotate(TUESDAY, "am", &[], &pool, &mut first, None, None);
        let b = rotate(TUESDAY, "am", &[], &pool, &mut second, None, None);
        assert_eq!(a, b);
        assert_eq!(a.as_deref(), Some("B"));
        assert_eq!(first, second);
    }

    #[test]
    fn single_usable_captain_on_tuesday() {
        let pool = captains(&[("A", Restriction::Unrestricted), ("B", Restriction::SaturdaysOnly)]);
        let mut cursor = RotationCursor::new();

        let got = rotate(TUESDAY, "am", &[], &pool, &mut cursor, None, Some("k"));
        assert_eq!(got.as_deref(), Some("A"));
        assert_eq!(cursor.get("k"), 1);

        let got = rotate(TUESDAY, "am", &[], &pool, &mut cursor, None, Some("k"));
        assert_eq!(got.as_deref(), Some("A"));
        assert_eq!(cursor.get("k"), 1);
    }

    #[test]
    fn stale_cursor_past_the_end_wraps() {
        let pool = captains(&[("A", Restriction::Unrestricted), ("B", Restriction::Unrestricted)]);
        let mut cursor = RotationCursor::new();
        cursor.set("k", 7);
        let got = rotate(TUESDAY, "am", &[], &pool, &mut cursor, None, Some("k"));
        assert_eq!(got.as_deref(), Some("B"));
        assert_eq!(cursor.get("k"), 0);
    }

    #[test]
    fn random_picks_only_usable_captains() {
        let pool = captains(&[
            ("A", Restriction::SundaysOnly),
            ("B", Restriction::Unrestricted),
            ("C", Restriction::WeekdaysOnly),
        ]);
        let exclude: HashSet<CaptainId> = ["C".to_string()].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let options = ResolveOptions {
                strategy: Strategy::Random,
                exclude: Some(&exclude),
                ..Default::default()
            };
            let got = resolve_with_rng(TUESDAY, "am", &[], &pool, options, &mut rng).unwrap();
            assert_eq!(got.as_deref(), Some("B"));
        }
    }

    #[test]
    fn random_spreads_over_every_usable_captain() {
        let pool = captains(&[
            ("A", Restriction::Unrestricted),
            ("S", Restriction::SundaysOnly),
            ("B", Restriction::WeekdaysOnly),
            ("X", Restriction::Unrestricted),
            ("C", Restriction::Unrestricted),
            ("D", Restriction::Unrestricted),
        ]);
        let exclude: HashSet<CaptainId> = ["X".to_string()].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<String, u32> = HashMap::new();
        for _ in 0..400 {
            let options = ResolveOptions {
                strategy: Strategy::Random,
                exclude: Some(&exclude),
                ..Default::default()
            };
            let got = resolve_with_rng(TUESDAY, "am", &[], &pool, options, &mut rng).unwrap();
            *counts.entry(got.unwrap()).or_default() += 1;
        }

        let mut picked: Vec<&str> = counts.keys().map(|id| id.as_str()).collect();
        picked.sort_unstable();
        assert_eq!(picked, vec!["A", "B", "C", "D"]);
        // 100 expected each; a first-usable pick would put all 400 on A
        assert!(counts.values().all(|&n| (50..=150).contains(&n)), "{:?}", counts);
    }

    #[test]
    fn random_strategy_ignores_cursor() {
        let pool = captains(&[("A", Restriction::Unrestricted), ("B", Restriction::Unrestricted)]);
        let mut cursor = RotationCursor::new();
        let mut rng = StdRng::seed_from_u64(1);
        let options = ResolveOptions {
            strategy: Strategy::Random,
            rotation: Some(&mut cursor),
            ..Default::default()
        };
        let got = resolve_with_rng(TUESDAY, "am", &[], &pool, options, &mut rng).unwrap();
        assert!(got.is_some());
        assert!(cursor.is_empty());
    }

    #[test]
    fn random_with_nobody_usable_returns_none() {
        let pool = captains(&[("A", Restriction::SundaysOnly)]);
        let got = resolve(TUESDAY, "am", &[], &pool, ResolveOptions::default()).unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn bad_date_is_an_error() {
        let pool = captains(&[("A", Restriction::Unrestricted)]);
        assert!(resolve("12/03/2024", "am", &[], &pool, ResolveOptions::default()).is_err());
    }
}
