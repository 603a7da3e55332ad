use super::*;
use crate::game::catalog::PLAUSIBLE_VINTAGES;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

/// Label reader backed by an HTTP recognition service.
///
/// The photo is POSTed as JSON (`mime_type`, base64 `image`); the service
/// answers with a `WineInfo` body.
pub struct RemoteLabelReader {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl RemoteLabelReader {
    pub fn new(url: String, timeout: Duration) -> LabelResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LabelError::Config(e.to_string()))?;

        Ok(Self {
            url,
            timeout,
            client,
        })
    }
}

/// Refuse service answers the game can't build questions from
fn check_recognised(wine: WineInfo) -> LabelResult<WineInfo> {
    if !PLAUSIBLE_VINTAGES.contains(&wine.vintage) {
        return Err(LabelError::Parse(format!(
            "implausible vintage {}",
            wine.vintage
        )));
    }
    Ok(wine)
}

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    mime_type: &'a str,
    image: String,
}

#[async_trait]
impl LabelReader for RemoteLabelReader {
    async fn read_label(&self, photo: &PhotoUpload) -> LabelResult<WineInfo> {
        let request = RecognizeRequest {
            mime_type: &photo.mime_type,
            image: STANDARD.encode(&photo.bytes),
        };

        let response = tokio::time::timeout(
            self.timeout,
            self.client.post(&self.url).json(&request).send(),
        )
        .await
        .map_err(|_| LabelError::Timeout(self.timeout))?
        .map_err(|e| LabelError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND
            || response.status() == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            return Err(LabelError::NoMatch);
        }

        if !response.status().is_success() {
            return Err(LabelError::Request(format!(
                "Label service returned status: {}",
                response.status()
            )));
        }

        let wine: WineInfo = response
            .json()
            .await
            .map_err(|e| LabelError::Parse(e.to_string()))?;
        let wine = check_recognised(wine)?;

        tracing::info!(
            "Label service recognised {} {} from {}",
            wine.vintage,
            wine.producer,
            wine.country
        );
        Ok(wine)
    }

    fn name(&self) -> &str {
        "remote"
    }
}
