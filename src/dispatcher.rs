use crate::error::DispatchError;
use crate::issuer::Issuer;
use crate::model::{Config, UnitReport};
use crate::worker::worker;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Fans a run out into one task per request and joins them all.
pub struct Dispatcher {
    config: Config,
    issuer: Issuer,
}

impl Dispatcher {
    pub fn new(config: Config) -> Result<Self, DispatchError> {
        let issuer = Issuer::new(config.timeout())?;
        Ok(Self { config, issuer })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Spawns every unit, then waits for all of them. Each unit sends its
    /// report on `tx`; the caller must keep draining the receiver while this
    /// runs. Returns how many units ran to completion.
    pub async fn run(&self, tx: mpsc::Sender<UnitReport>) -> usize {
        let url: Arc<str> = Arc::from(self.config.url());
        info!(
            url = %url,
            requests = self.config.requests(),
            interval_secs = self.config.interval_secs(),
            pacing = %self.config.pacing(),
            "dispatching"
        );

        let mut set = JoinSet::new();
        for (rank, delay) in self.config.delays().into_iter().enumerate() {
            set.spawn(worker(
                rank,
                delay,
                url.clone(),
                self.issuer.clone(),
                tx.clone(),
            ));
        }

        drop(tx);

        let mut completed = 0;
        while let Some(res) = set.join_next().await {
            match res {
                Ok(()) => completed += 1,
                Err(e) => error!(error = %e, "dispatch unit did not complete"),
            }
        }
        info!(completed, "all units finished");
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pacing;
    use std::time::Duration;
    use tokio::time::Instant;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn collect(mut rx: mpsc::Receiver<UnitReport>) -> Vec<UnitReport> {
        let mut reports = vec![];
        while let Some(report) = rx.recv().await {
            reports.push(report);
        }
        reports
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_every_unit_runs_exactly_once() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(25)
            .mount(&mock_server)
            .await;

        let config = Config::new(mock_server.uri(), 25, 0.0).unwrap();
        let dispatcher = Dispatcher::new(config).unwrap();
        let (tx, rx) = mpsc::channel(25);

        assert_eq!(dispatcher.run(tx).await, 25);

        let mut ranks: Vec<_> = collect(rx).await.into_iter().map(|r| r.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (0..25).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_drains_through_small_channel() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let config = Config::new(mock_server.uri(), 10, 0.0).unwrap();
        let dispatcher = Dispatcher::new(config).unwrap();
        let (tx, rx) = mpsc::channel(1);

        let printer = tokio::spawn(collect(rx));
        assert_eq!(dispatcher.run(tx).await, 10);
        assert_eq!(printer.await.unwrap().len(), 10);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_uniform_pacing_fires_in_one_burst() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let config = Config::new(mock_server.uri(), 4, 1.0).unwrap();
        let dispatcher = Dispatcher::new(config).unwrap();
        let (tx, rx) = mpsc::channel(4);

        let started = Instant::now();
        dispatcher.run(tx).await;
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(250));
        assert!(elapsed < Duration::from_secs(5));

        let reports = collect(rx).await;
        let first = reports.iter().map(|r| r.begin).min().unwrap();
        let last = reports.iter().map(|r| r.begin).max().unwrap();
        assert!((last - first).num_milliseconds() < 200);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_staggered_pacing_spreads_starts() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let config = Config::new(mock_server.uri(), 4, 1.0)
            .unwrap()
            .with_pacing(Pacing::Staggered);
        let dispatcher = Dispatcher::new(config).unwrap();
        let (tx, rx) = mpsc::channel(4);

        let started = Instant::now();
        dispatcher.run(tx).await;
        assert!(started.elapsed() >= Duration::from_millis(750));

        let reports = collect(rx).await;
        let first = reports.iter().map(|r| r.begin).min().unwrap();
        let last = reports.iter().map(|r| r.begin).max().unwrap();
        assert!((last - first).num_milliseconds() >= 600);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_curve_pacing_delays_later_units() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&mock_server)
            .await;

        let config = Config::new(mock_server.uri(), 2, 1.0)
            .unwrap()
            .with_pacing("linear:1,0".parse().unwrap());
        let dispatcher = Dispatcher::new(config).unwrap();
        let (tx, rx) = mpsc::channel(2);

        let started = Instant::now();
        assert_eq!(dispatcher.run(tx).await, 2);
        assert!(started.elapsed() >= Duration::from_millis(650));
        assert_eq!(collect(rx).await.len(), 2);
    }
}
