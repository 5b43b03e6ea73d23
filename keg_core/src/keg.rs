//! Keg arithmetic: weight ↔ keg size and weight ↔ beer count.
//!
//! All functions are pure and total. Sizes outside [`KEG_SIZES`] are
//! "unknown" and fall back to an empty weight of zero.
//!
//! ## Units
//!
//! Weights are grams, keg sizes are liters. One beer is half a liter, which
//! the tables treat as 500 g of content.

/// Known keg sizes in liters, in warehouse order.
pub const KEG_SIZES: [i32; 5] = [10, 15, 20, 30, 50];

/// Grams of content per beer (0.5 l).
pub const GRAMS_PER_BEER: f64 = 500.0;

/// A keg counts as low when its weight is this close to the empty weight.
pub const LOW_THRESHOLD_G: f64 = 2500.0;

/// Default tolerance for matching a weight to a keg's full weight.
pub const DEFAULT_GUESS_TOLERANCE_G: f64 = 2500.0;

/// Empty weight of the keg shell in grams; unknown kegs weigh 0.
pub fn empty_weight(keg: i32) -> f64 {
    match keg {
        10 => 6000.0,
        15 => 7000.0,
        20 => 9250.0,
        30 => 10000.0,
        50 => 13500.0,
        _ => 0.0,
    }
}

/// Full weight in grams: one kilogram per liter on top of the shell.
pub fn full_weight(keg: i32) -> f64 {
    f64::from(keg) * 1000.0 + empty_weight(keg)
}

#[inline]
pub fn is_known(keg: i32) -> bool {
    KEG_SIZES.contains(&keg)
}

/// Beers in a full keg (two per liter); 0 for unknown sizes.
pub fn capacity(keg: i32) -> i32 {
    if is_known(keg) { keg * 2 } else { 0 }
}

/// Beers remaining in `keg` at the given weight.
///
/// Known kegs are capped at their capacity since a freshly tapped keg often
/// reads a little over its nominal weight. Unknown kegs use an empty weight of
/// 0 and are not capped, so they report a large count.
pub fn beers_left(keg: i32, weight: f64) -> i32 {
    if keg == 0 {
        return 0;
    }
    let empty = empty_weight(keg);
    if weight < empty {
        return 0;
    }

    let beers = ((weight - empty) / GRAMS_PER_BEER).floor() as i32;
    if is_known(keg) {
        beers.min(capacity(keg))
    } else {
        beers
    }
}

/// Beers already poured from `keg` at the given weight; unknown kegs → 0.
pub fn beers_consumed(keg: i32, weight: f64) -> i32 {
    if !is_known(keg) {
        return 0;
    }
    let full = f64::from(capacity(keg));
    let content = weight - empty_weight(keg);

    if content <= 0.0 {
        return capacity(keg);
    }
    if content >= f64::from(keg) * 1000.0 {
        return 0;
    }

    (full - content / GRAMS_PER_BEER).floor() as i32
}

/// Whether a swap to a new keg is expected.
///
/// No keg and unknown kegs are always low.
pub fn is_low(keg: i32, weight: f64) -> bool {
    if keg == 0 || !is_known(keg) {
        return true;
    }

    (weight - empty_weight(keg)).abs() < LOW_THRESHOLD_G
}

/// Keg size whose full weight lies strictly within `tolerance` of `weight`.
///
/// When several sizes match, the one with the closest full weight wins and
/// ties go to the smaller keg.
pub fn guess_keg_size(weight: f64, tolerance: f64) -> Option<i32> {
    let mut best: Option<(i32, f64)> = None;
    let mut matches = 0_usize;
    for keg in KEG_SIZES {
        let delta = (weight - full_weight(keg)).abs();
        if delta >= tolerance {
            continue;
        }
        matches += 1;
        match best {
            Some((_, d)) if d <= delta => {}
            _ => best = Some((keg, delta)),
        }
    }

    if matches > 1 {
        tracing::warn!(
            weight,
            matches,
            chosen = best.map(|(k, _)| k),
            "ambiguous keg size guess"
        );
    }

    best.map(|(keg, _)| keg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(10, 6100.0, 0)]
    #[case(10, 7500.0, 3)]
    #[case(15, 7000.0, 0)]
    #[case(15, 8500.0, 3)]
    #[case(20, 9250.0, 0)]
    #[case(20, 10750.0, 3)]
    #[case(30, 10400.0, 0)]
    #[case(30, 11200.0, 2)]
    #[case(50, 13900.0, 0)]
    #[case(50, 15100.0, 3)]
    #[case(90, 10000.0, 20)]
    fn beers_left_table(#[case] keg: i32, #[case] weight: f64, #[case] beers: i32) {
        assert_eq!(beers_left(keg, weight), beers, "keg {keg} at {weight} g");
    }

    #[test]
    fn beers_left_below_empty_is_zero() {
        assert_eq!(beers_left(50, 10100.0), 0);
    }

    #[test]
    fn beers_left_is_capped_for_overfull_kegs() {
        assert_eq!(beers_left(10, 16600.0), 20);
        assert_eq!(beers_left(10, 16400.0), 20);
    }

    #[rstest]
    fn empty_and_full_weights_bound_the_count(#[values(10, 15, 20, 30, 50)] keg: i32) {
        assert_eq!(beers_left(keg, empty_weight(keg)), 0);
        assert_eq!(beers_left(keg, full_weight(keg)), 2 * keg);
    }

    #[rstest]
    #[case(0, 0.0, true)]
    #[case(0, 10000.0, true)]
    #[case(10, 7100.0, true)]
    #[case(10, 10500.0, false)]
    #[case(30, 8100.0, true)]
    #[case(30, 17500.0, false)]
    #[case(90, 10000.0, true)]
    fn is_low_table(#[case] keg: i32, #[case] weight: f64, #[case] low: bool) {
        assert_eq!(is_low(keg, weight), low);
    }

    #[rstest]
    #[case(16500.0, Some(10))]
    #[case(22200.0, Some(15))]
    #[case(29000.0, Some(20))]
    #[case(41000.0, Some(30))]
    #[case(63000.0, Some(50))]
    #[case(35000.0, None)]
    #[case(6050.0, None)]
    fn guess_table(#[case] weight: f64, #[case] keg: Option<i32>) {
        assert_eq!(guess_keg_size(weight, DEFAULT_GUESS_TOLERANCE_G), keg);
    }

    #[test]
    fn guess_prefers_closest_full_weight() {
        // With a wide tolerance both 10 l (16000) and 15 l (22000) match 20000.
        assert_eq!(guess_keg_size(20000.0, 5000.0), Some(15));
        // Equidistant: smaller keg wins.
        assert_eq!(guess_keg_size(19000.0, 5000.0), Some(10));
    }

    #[test]
    fn tolerance_edge_is_exclusive() {
        assert_eq!(guess_keg_size(18500.0, 2500.0), None);
        assert_eq!(guess_keg_size(18499.0, 2500.0), Some(10));
    }

    #[rstest]
    #[case(10, 6000.0, 20)]
    #[case(10, 16000.0, 0)]
    #[case(10, 11000.0, 10)]
    #[case(50, 13500.0, 100)]
    #[case(30, 25000.0, 30)]
    #[case(90, 10000.0, 0)]
    fn beers_consumed_table(#[case] keg: i32, #[case] weight: f64, #[case] consumed: i32) {
        assert_eq!(beers_consumed(keg, weight), consumed);
    }
}
