// REST clients for the recruiting backend's question and answer APIs.
//
// Thin wrappers: validate the status, deserialize, classify failures
// into `PersistError`. All schema and business rules live server-side.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::store::{
    AnswerId, AnswerStore, ApplicantId, ExistingAnswer, InterviewId, NewAnswer, PersistError,
    Question, QuestionId, QuestionSource,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PersistError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(PersistError::Rejected(format!("HTTP {}: {}", status, body)))
}

/// Question listing backed by the recruiting REST API.
pub struct RestQuestionSource {
    http: reqwest::Client,
    base_url: String,
}

impl RestQuestionSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl QuestionSource for RestQuestionSource {
    async fn list_questions(&self, interview: InterviewId) -> Result<Vec<Question>, PersistError> {
        let url = format!("{}/interviews/{}/questions", self.base_url, interview);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PersistError::Request(e.to_string()))?;

        let questions: Vec<Question> = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| PersistError::Rejected(e.to_string()))?;

        debug!(
            "Loaded {} question(s) for interview {}",
            questions.len(),
            interview
        );

        Ok(questions)
    }
}

#[derive(Debug, Deserialize)]
struct AnswerRecord {
    id: AnswerId,
    #[serde(rename = "questionId")]
    question_id: QuestionId,
    text: String,
}

#[derive(Debug, Deserialize)]
struct CreatedAnswer {
    id: AnswerId,
}

/// Answer persistence backed by the recruiting REST API.
pub struct RestAnswerStore {
    http: reqwest::Client,
    base_url: String,
}

impl RestAnswerStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl AnswerStore for RestAnswerStore {
    async fn existing_answers(
        &self,
        applicant: ApplicantId,
    ) -> Result<HashMap<QuestionId, ExistingAnswer>, PersistError> {
        let url = format!("{}/applicants/{}/answers", self.base_url, applicant);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PersistError::Request(e.to_string()))?;

        let records: Vec<AnswerRecord> = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| PersistError::Rejected(e.to_string()))?;

        Ok(records
            .into_iter()
            .map(|r| {
                (
                    r.question_id,
                    ExistingAnswer {
                        id: r.id,
                        text: r.text,
                    },
                )
            })
            .collect())
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<AnswerId, PersistError> {
        let url = format!("{}/answers", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&json!({
                "interviewId": answer.interview,
                "questionId": answer.question,
                "applicantId": answer.applicant,
                "text": answer.text,
            }))
            .send()
            .await
            .map_err(|e| PersistError::Request(e.to_string()))?;

        let created: CreatedAnswer = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| PersistError::Rejected(e.to_string()))?;

        Ok(created.id)
    }

    async fn update_answer(&self, id: AnswerId, text: &str) -> Result<(), PersistError> {
        let url = format!("{}/answers/{}", self.base_url, id);

        let response = self
            .http
            .put(&url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| PersistError::Request(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }
}
