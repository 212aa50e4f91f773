const EPLEY_REPS_DIVISOR: f64 = 30.0;

/// Epley estimate rounded to one decimal; `0.0` for zero or invalid input.
pub fn estimate_one_rm(weight: f64, reps: u32) -> f64 {
    if !weight.is_finite() || weight <= 0.0 || reps == 0 {
        return 0.0;
    }

    let raw = weight * (1.0 + f64::from(reps) / EPLEY_REPS_DIVISOR);
    (raw * 10.0).round() / 10.0
}

pub fn preview_one_rm(weight: &str, reps: &str) -> f64 {
    let weight = weight.trim().parse::<f64>().ok();
    let reps = reps.trim().parse::<u32>().ok();

    match (weight, reps) {
        (Some(weight), Some(reps)) => estimate_one_rm(weight, reps),
        _ => 0.0,
    }
}
