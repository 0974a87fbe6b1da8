use crate::curve::RateCurve;
use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Number of characters of the response body kept in a success line.
pub const SNIPPET_CHARS: usize = 50;

/// How each dispatch unit's start delay is derived.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Pacing {
    /// Every unit waits one interval, so all requests fire together after it.
    #[default]
    Uniform,
    /// Unit k waits k intervals, spreading starts over the whole window.
    Staggered,
    /// Starts follow a rate curve over the window.
    Curve(RateCurve),
}

impl FromStr for Pacing {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "uniform" => Ok(Pacing::Uniform),
            "staggered" => Ok(Pacing::Staggered),
            _ => s.parse().map(Pacing::Curve),
        }
    }
}

impl fmt::Display for Pacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pacing::Uniform => write!(f, "uniform"),
            Pacing::Staggered => write!(f, "staggered"),
            Pacing::Curve(curve) => write!(f, "{curve}"),
        }
    }
}

/// Run configuration. Only constructible through [`Config::new`], so
/// `requests >= 1` holds and `time` is non-negative and fits a [`Duration`],
/// which bounds every delay derived from it.
#[derive(Clone, Debug)]
pub struct Config {
    url: String,
    requests: usize,
    time: f64,
    pacing: Pacing,
    timeout: Option<Duration>,
}

impl Config {
    pub fn new(url: impl Into<String>, requests: i64, time: f64) -> Result<Self, ConfigError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl);
        }
        if requests < 1 {
            return Err(ConfigError::NoRequests(requests));
        }
        if Duration::try_from_secs_f64(time).is_err() {
            return Err(ConfigError::InvalidTime(time));
        }
        let requests = usize::try_from(requests).map_err(|_| ConfigError::NoRequests(requests))?;

        Ok(Self {
            url,
            requests,
            time,
            pacing: Pacing::default(),
            timeout: None,
        })
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Per-request transport timeout. `None` keeps the client default of no deadline.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn requests(&self) -> usize {
        self.requests
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn interval_secs(&self) -> f64 {
        self.time / self.requests as f64
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs())
    }

    /// Delay before unit `rank` issues its request.
    pub fn delay_for(&self, rank: usize) -> Duration {
        match self.pacing {
            Pacing::Uniform => self.interval(),
            Pacing::Staggered => self.staggered(rank),
            Pacing::Curve(curve) => curve
                .schedule(self.requests, self.time)
                .get(rank)
                .copied()
                .unwrap_or_default(),
        }
    }

    /// Delays for every unit, in rank order.
    pub fn delays(&self) -> Vec<Duration> {
        match self.pacing {
            Pacing::Curve(curve) => curve.schedule(self.requests, self.time),
            _ => (0..self.requests).map(|rank| self.delay_for(rank)).collect(),
        }
    }

    fn staggered(&self, rank: usize) -> Duration {
        let t = self.time * rank as f64 / self.requests as f64;
        Duration::from_secs_f64(t.min(self.time))
    }
}

/// Result of one request attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success { status: u16, snippet: String },
    Failure { description: String },
}

impl Outcome {
    pub fn success(status: u16, body: &str) -> Self {
        Outcome::Success {
            status,
            snippet: body.chars().take(SNIPPET_CHARS).collect(),
        }
    }

    pub fn failure(error: impl fmt::Display) -> Self {
        let mut description = error.to_string();
        if description.trim().is_empty() {
            description = "unknown transport error".to_string();
        }
        Outcome::Failure { description }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success { status, snippet } => {
                write!(f, "Status Code: {status}, Content: {snippet}")
            }
            Outcome::Failure { description } => write!(f, "Request failed: {description}"),
        }
    }
}

#[derive(Debug)]
pub struct UnitReport {
    pub rank: usize,
    pub begin: chrono::DateTime<chrono::Utc>,
    pub end: chrono::DateTime<chrono::Utc>,
    pub outcome: Outcome,
}
