//! Counting and duplicate detection shared by server evaluation and the client engine.
//!
//! Both sides feed their own element stream through these functions, which is
//! what keeps their verdicts identical.

/// Outcome of counting matches for a require rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    /// Matches counted before the loop stopped
    pub matches: usize,
    /// Elements read before the loop stopped
    pub inspected: usize,
    pub is_valid: bool,
}

/// Count `true` entries, stopping as soon as the verdict is known.
///
/// Without a maximum the loop stops once `minimum` matches are seen (valid);
/// with a maximum it stops once the count exceeds it (invalid).
pub fn try_tally<E, I>(matches: I, minimum: usize, maximum: Option<usize>) -> Result<Tally, E>
where
    I: IntoIterator<Item = Result<bool, E>>,
{
    let mut count = 0;
    let mut inspected = 0;

    for is_match in matches {
        inspected += 1;
        if is_match? {
            count += 1;
        }

        match maximum {
            None if count >= minimum => break,
            Some(max) if count > max => break,
            _ => {}
        }
    }

    let is_valid = count >= minimum && maximum.map_or(true, |max| count <= max);
    Ok(Tally {
        matches: count,
        inspected,
        is_valid,
    })
}

/// Infallible form of [`try_tally`]
pub fn tally<I>(matches: I, minimum: usize, maximum: Option<usize>) -> Tally
where
    I: IntoIterator<Item = bool>,
{
    match try_tally::<std::convert::Infallible, _>(matches.into_iter().map(Ok), minimum, maximum) {
        Ok(tally) => tally,
        Err(never) => match never {},
    }
}

/// Index and value of the first element equal to an earlier one.
///
/// Values are compared with `PartialEq` against everything seen so far, in
/// order, so the scan stops at the first repeat.
pub fn try_first_duplicate<V, E, I>(values: I) -> Result<Option<(usize, V)>, E>
where
    V: PartialEq,
    I: IntoIterator<Item = Result<V, E>>,
{
    let mut seen: Vec<V> = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        let value = value?;
        if seen.contains(&value) {
            return Ok(Some((index, value)));
        }
        seen.push(value);
    }
    Ok(None)
}

/// Infallible form of [`try_first_duplicate`]
pub fn first_duplicate<V, I>(values: I) -> Option<(usize, V)>
where
    V: PartialEq,
    I: IntoIterator<Item = V>,
{
    match try_first_duplicate::<V, std::convert::Infallible, _>(values.into_iter().map(Ok)) {
        Ok(found) => found,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_at_minimum_without_maximum() {
        let result = tally([false, true, true, true], 2, None);
        assert!(result.is_valid);
        assert_eq!(result.matches, 2);
        assert_eq!(result.inspected, 3);
    }

    #[test]
    fn test_stops_above_maximum() {
        let result = tally([true, true, true, true, false], 1, Some(2));
        assert!(!result.is_valid);
        assert_eq!(result.matches, 3);
        assert_eq!(result.inspected, 3);
    }

    #[test]
    fn test_range_reads_everything_when_within_bounds() {
        let result = tally([true, false, true, false], 2, Some(3));
        assert!(result.is_valid);
        assert_eq!(result.inspected, 4);
    }

    #[test]
    fn test_empty_input_is_below_minimum() {
        let result = tally(std::iter::empty(), 1, None);
        assert!(!result.is_valid);
        assert_eq!(result.matches, 0);
    }

    #[test]
    fn test_errors_propagate() {
        let result: Result<Tally, &str> = try_tally([Ok(false), Err("boom"), Ok(true)], 1, None);
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn test_first_duplicate() {
        assert_eq!(first_duplicate(["a", "b", "c"]), None);
        assert_eq!(first_duplicate(["a", "b", "a", "b"]), Some((2, "a")));
    }
}
