use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Width of one integration step, in seconds.
const STEP_SECS: f64 = 0.1;
/// Upper bound on integration steps, so long windows stay cheap.
const MAX_STEPS: usize = 10_000;

/// Request rate as a function of elapsed seconds. Written on the command
/// line as `kind:p1,p2,...`, e.g. `linear:2,1` or `sin:5,1,10`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RateCurve {
    /// `a`
    Const { a: f64 },
    /// `m * t + b`
    Linear { m: f64, b: f64 },
    /// `a * sin(t / b) + c`
    Sin { a: f64, b: f64, c: f64 },
    /// `a * exp(b * t) + c`
    Exp { a: f64, b: f64, c: f64 },
}

impl RateCurve {
    /// Instantaneous rate at `t`. Negative or non-finite rates count as zero.
    pub fn rate(&self, t: f64) -> f64 {
        let r = match *self {
            RateCurve::Const { a } => a,
            RateCurve::Linear { m, b } => m * t + b,
            RateCurve::Sin { a, b, c } => a * (t / b).sin() + c,
            RateCurve::Exp { a, b, c } => a * (b * t).exp() + c,
        };
        if r.is_finite() && r > 0.0 {
            r
        } else {
            0.0
        }
    }

    /// Start offsets for `requests` units over a `time` second window.
    ///
    /// The rate is integrated over the window and unit k starts where the
    /// cumulative load reaches `k / requests` of the total, so unit 0 always
    /// starts at once and denser parts of the curve get more starts. A curve
    /// that is zero over the whole window degrades to even spacing.
    pub fn schedule(&self, requests: usize, time: f64) -> Vec<Duration> {
        if time <= 0.0 {
            return vec![Duration::ZERO; requests];
        }

        let steps = ((time / STEP_SECS).ceil() as usize).clamp(1, MAX_STEPS);
        let dt = time / steps as f64;

        let mut cumulative = Vec::with_capacity(steps + 1);
        cumulative.push(0.0);
        let mut acc = 0.0;
        for i in 0..steps {
            acc += self.rate((i as f64 + 0.5) * dt) * dt;
            cumulative.push(acc);
        }

        if !acc.is_finite() || acc <= 0.0 {
            return (0..requests)
                .map(|k| secs(time * k as f64 / requests as f64, time))
                .collect();
        }

        let mut seg = 0;
        (0..requests)
            .map(|k| {
                let target = acc * k as f64 / requests as f64;
                while seg + 1 < steps && cumulative[seg + 1] <= target {
                    seg += 1;
                }
                let (lo, hi) = (cumulative[seg], cumulative[seg + 1]);
                let frac = if hi > lo { (target - lo) / (hi - lo) } else { 0.0 };
                secs((seg as f64 + frac) * dt, time)
            })
            .collect()
    }
}

fn secs(t: f64, time: f64) -> Duration {
    Duration::from_secs_f64(t.clamp(0.0, time))
}

impl FromStr for RateCurve {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| ConfigError::InvalidCurve(format!("'{s}': {why}"));

        let (kind, params) = s.split_once(':').ok_or_else(|| invalid("expected kind:params"))?;
        let params = params
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(&e.to_string()))?;
        if params.iter().any(|p| !p.is_finite()) {
            return Err(invalid("parameters must be finite"));
        }

        let want = match kind.trim().to_lowercase().as_str() {
            "const" => 1,
            "linear" => 2,
            "sin" | "exp" => 3,
            _ => return Err(invalid("kind must be const, linear, sin or exp")),
        };
        if params.len() != want {
            return Err(invalid(&format!("{kind} takes {want} parameter(s)")));
        }

        let curve = match kind.trim().to_lowercase().as_str() {
            "const" => RateCurve::Const { a: params[0] },
            "linear" => RateCurve::Linear {
                m: params[0],
                b: params[1],
            },
            "sin" => {
                if params[1] == 0.0 {
                    return Err(invalid("sin period must not be zero"));
                }
                RateCurve::Sin {
                    a: params[0],
                    b: params[1],
                    c: params[2],
                }
            }
            _ => RateCurve::Exp {
                a: params[0],
                b: params[1],
                c: params[2],
            },
        };
        Ok(curve)
    }
}

impl fmt::Display for RateCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateCurve::Const { a } => write!(f, "const:{a}"),
            RateCurve::Linear { m, b } => write!(f, "linear:{m},{b}"),
            RateCurve::Sin { a, b, c } => write!(f, "sin:{a},{b},{c}"),
            RateCurve::Exp { a, b, c } => write!(f, "exp:{a},{b},{c}"),
        }
    }
}
