use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;

use super::HarmonyApi;

#[derive(Debug, Clone)]
pub struct HarmonyHttpClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl HarmonyHttpClient {
    pub fn new(host: &str, port: u16, timeout: std::time::Duration) -> anyhow::Result<Self> {
        let client = HttpClientConfig::default().with_timeout(timeout).new_tracing_client()?;

        Ok(Self {
            client,
            base_url: format!("http://{}:{}/hubs", host, port),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn fetch(&self, url: &str) -> anyhow::Result<Value> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }

    async fn pulse(&self, method: reqwest::Method, path: &str, repeat: u32) {
        let url = self.url(path);

        for _ in 0..repeat {
            tracing::debug!("Sending {} {}", method, url);

            let result = match self.client.request(method.clone(), &url).send().await {
                Ok(response) => response.error_for_status().map(|_| ()).map_err(anyhow::Error::from),
                Err(e) => Err(anyhow::Error::from(e)),
            };

            match result {
                Ok(_) => infrastructure::meter::increment("harmony_commands", &[("result", "ok")]),
                Err(e) => {
                    tracing::error!("Error sending {} {}: {:?}", method, url, e);
                    infrastructure::meter::increment("harmony_commands", &[("result", "error")]);
                }
            }
        }
    }
}

impl HarmonyApi for HarmonyHttpClient {
    #[tracing::instrument(skip(self))]
    async fn get(&self, path: &str) -> Value {
        let url = self.url(path);

        match self.fetch(&url).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Error fetching {}: {:?}", url, e);
                Value::Object(Default::default())
            }
        }
    }

    async fn put(&self, path: &str, repeat: u32) {
        self.pulse(reqwest::Method::PUT, path, repeat).await
    }

    async fn post(&self, path: &str, repeat: u32) {
        self.pulse(reqwest::Method::POST, path, repeat).await
    }
}
