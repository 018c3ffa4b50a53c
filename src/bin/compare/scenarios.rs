// Scenario Definitions — scripted pool-size targets for algorithm comparison
// Curves return the desired live pool as a multiple of the target pool size

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub blocks: u32,
    /// Desired pool / target pool, as a function of progress in [0, 1].
    pub pool_curve: fn(f64) -> f64,
    /// Relative uniform noise applied to the desired pool each block.
    pub noise: f64,
}

// ─── Curve Functions ────────────────────────────────────────────────────────

fn steady(_progress: f64) -> f64 {
    1.0
}

fn surge(progress: f64) -> f64 {
    if progress < 0.3 { 1.0 } else { 1.3 }
}

fn drain(progress: f64) -> f64 {
    if progress < 0.3 { 1.0 } else { (1.0 - (progress - 0.3)).max(0.6) }
}

fn oscillation(progress: f64) -> f64 {
    1.0 + 0.2 * (progress * std::f64::consts::TAU * 4.0).sin()
}

fn growth(progress: f64) -> f64 {
    0.5 + 0.7 * progress
}

// ─── Scenario Catalog ───────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario { name: "STEADY", label: "Steady demand at target", blocks: 2_000, pool_curve: steady, noise: 0.02 },
        Scenario { name: "SURGE", label: "Demand surge to 130%", blocks: 2_000, pool_curve: surge, noise: 0.02 },
        Scenario { name: "DRAIN", label: "Demand drains to 60%", blocks: 2_000, pool_curve: drain, noise: 0.02 },
        Scenario { name: "OSCILLATION", label: "Cyclical demand +/-20%", blocks: 2_000, pool_curve: oscillation, noise: 0.05 },
        Scenario { name: "GROWTH", label: "Linear adoption 50% -> 120%", blocks: 2_000, pool_curve: growth, noise: 0.02 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curves_stay_positive() {
        for s in scenarios() {
            for step in 0..=100 {
                let v = (s.pool_curve)(step as f64 / 100.0);
                assert!(v > 0.0, "{} at {} = {}", s.name, step, v);
            }
        }
    }
}
