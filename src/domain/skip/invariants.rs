use crate::domain::{DomainError, DomainResult};

/// Bounded region invariants:
/// 1. Both bounds are finite
/// 2. Start is not negative
/// 3. Start is strictly before end
pub fn validate_skip_bounds(start: f64, end: f64) -> DomainResult<()> {
    if !start.is_finite() || !end.is_finite() {
        return Err(DomainError::NonFiniteTime(format!(
            "skip region [{start}, {end})"
        )));
    }
    if start < 0.0 {
        return Err(DomainError::InvariantViolation(format!(
            "Skip region cannot start before zero (start = {start})"
        )));
    }
    if start >= end {
        return Err(DomainError::InvalidSkipRegion { start, end });
    }
    Ok(())
}
