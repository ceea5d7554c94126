use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u32;

/// Convert Fixed64 to f64. Use only for display, never in the tick loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// `done / total` as a fraction clamped to `[0, 1]`. A zero total reads as 0.
#[inline]
pub fn progress_fraction(done: Ticks, total: Ticks) -> Fixed64 {
    if total == 0 {
        return Fixed64::ZERO;
    }
    let done = done.min(total);
    Fixed64::from_num(done) / Fixed64::from_num(total)
}
