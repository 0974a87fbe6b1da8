use crate::model::Outcome;
use std::time::Duration;

/// Sends one GET per call and turns whatever happens into an [`Outcome`].
#[derive(Clone, Debug)]
pub struct Issuer {
    client: reqwest::Client,
}

impl Issuer {
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    pub async fn issue(&self, url: &str) -> Outcome {
        let response = match self.client.get(url).send().await {
            Ok(res) => res,
            Err(e) => return Outcome::failure(e),
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => Outcome::success(status, &body),
            Err(e) => Outcome::failure(e),
        }
    }
}
