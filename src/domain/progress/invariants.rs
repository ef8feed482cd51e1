use super::entity::WatchProgress;
use crate::domain::{DomainError, DomainResult};

/// Validates a progress payload before it leaves the process
pub fn validate_watch_progress(progress: &WatchProgress) -> DomainResult<()> {
    validate_clock(progress.current, progress.duration)?;
    if progress.episode_id.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Watch progress requires an episode id".to_string(),
        ));
    }
    Ok(())
}

/// Clock invariants:
/// 1. Both values are finite
/// 2. Duration is known (positive)
/// 3. Position is within [0, duration]
fn validate_clock(current: f64, duration: f64) -> DomainResult<()> {
    if !current.is_finite() || !duration.is_finite() {
        return Err(DomainError::NonFiniteTime(format!(
            "position {current} / duration {duration}"
        )));
    }
    if duration <= 0.0 {
        return Err(DomainError::InvariantViolation(
            "Duration is not known yet".to_string(),
        ));
    }
    if current < 0.0 {
        return Err(DomainError::InvariantViolation(format!(
            "Position cannot be negative ({current})"
        )));
    }
    if current > duration {
        return Err(DomainError::ProgressExceedsDuration {
            progress: current,
            duration,
        });
    }
    Ok(())
}
