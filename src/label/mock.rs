use super::*;
use crate::game::catalog::label_candidates;
use rand::seq::IndexedRandom;

/// Stand-in for real label recognition: waits a moment, then "recognises"
/// one of a fixed set of bottles at random
pub struct MockLabelReader {
    delay: Duration,
    candidates: Vec<WineInfo>,
}

impl MockLabelReader {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            candidates: label_candidates(),
        }
    }

    /// Use a custom candidate list (an empty list makes every read fail)
    pub fn with_candidates(delay: Duration, candidates: Vec<WineInfo>) -> Self {
        Self { delay, candidates }
    }
}

#[async_trait]
impl LabelReader for MockLabelReader {
    async fn read_label(&self, photo: &PhotoUpload) -> LabelResult<WineInfo> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let picked = {
            let mut rng = rand::rng();
            self.candidates.choose(&mut rng).cloned()
        };

        match picked {
            Some(wine) => {
                tracing::debug!(
                    "Mock label reader picked {} {} ({} bytes, {})",
                    wine.vintage,
                    wine.producer,
                    photo.bytes.len(),
                    photo.mime_type
                );
                Ok(wine)
            }
            None => Err(LabelError::NoMatch),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
