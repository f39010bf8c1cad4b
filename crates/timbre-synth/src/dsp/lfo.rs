//! Triangle LFO.

/// Triangle wave starting at its zero crossing going up, evaluated at `time`.
///
/// Returns 0 before `start_time`. The quarter-phase offset makes the wave start
/// at 0 rather than at its minimum.
#[inline]
pub fn triangle(start_time: f64, frequency: f64, time: f64) -> f64 {
    if time < start_time {
        return 0.0;
    }
    let x = (time - start_time) * frequency + 0.25;
    (x - (x + 0.5).floor()).abs() * 4.0 - 1.0
}
