use chrono::{DateTime, Local};
use thiserror::Error;

use crate::{
    client::Client,
    error::GenerateError,
    export::PlanDocument,
    meal_plan::{format_amount, GeneratedPlan},
};

pub const GREETING: &str =
    "Hi! Tell me your budget, how many days to plan and any preferences, and I'll build a meal plan.";
pub const GENERATING_NOTICE: &str = "Generating your meal plan, this can take a minute. Please wait...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Submitting { generation: u64 },
    /// Terminal: a new session is needed to plan again.
    ResultsReady,
}

/// A prompt accepted by the session, waiting for the generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub prompt: String,
    generation: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("the prompt is empty")]
    EmptyPrompt,
    #[error("a plan is already being generated")]
    Busy,
    #[error("the session already has results")]
    Finished,
}

/// Headline figures of a finished plan, exactly as the service sent them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub total_budget: String,
    pub days: String,
    pub total_cost: String,
    pub remaining_budget: String,
}

/// Chat-style planning: free text in, one long generation call, then a
/// structured result that ends the conversation.
#[derive(Debug)]
pub struct MealPlanSession {
    phase: SessionPhase,
    transcript: Vec<Message>,
    next_message_id: u64,
    generation: u64,
    results: Option<GeneratedPlan>,
}

impl Default for MealPlanSession {
    fn default() -> Self {
        let mut session = Self {
            phase: SessionPhase::Idle,
            transcript: Vec::new(),
            next_message_id: 1,
            generation: 0,
            results: None,
        };
        session.push(Sender::Bot, GREETING.to_string());
        session
    }
}

impl MealPlanSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, sender: Sender, text: String) {
        self.transcript.push(Message {
            id: self.next_message_id,
            text,
            sender,
            timestamp: Local::now(),
        });
        self.next_message_id += 1;
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// The text input is only enabled while idle.
    pub fn input_enabled(&self) -> bool {
        self.phase == SessionPhase::Idle
    }

    pub fn submit(&mut self, text: &str) -> Result<Submission, SubmitError> {
        match self.phase {
            SessionPhase::Submitting { .. } => return Err(SubmitError::Busy),
            SessionPhase::ResultsReady => return Err(SubmitError::Finished),
            SessionPhase::Idle => {}
        }
        let prompt = text.trim();
        if prompt.is_empty() {
            return Err(SubmitError::EmptyPrompt);
        }
        self.generation += 1;
        self.push(Sender::User, prompt.to_string());
        self.push(Sender::Bot, GENERATING_NOTICE.to_string());
        self.phase = SessionPhase::Submitting {
            generation: self.generation,
        };
        Ok(Submission {
            prompt: prompt.to_string(),
            generation: self.generation,
        })
    }

    /// Record the outcome of a submission. Returns `false` if the
    /// submission is no longer the outstanding one.
    pub fn complete(
        &mut self,
        submission: &Submission,
        result: Result<GeneratedPlan, GenerateError>,
    ) -> bool {
        if self.phase
            != (SessionPhase::Submitting {
                generation: submission.generation,
            })
        {
            tracing::debug!(generation = submission.generation, "discarding stale generation result");
            return false;
        }
        match result {
            Ok(generated) => {
                tracing::info!(
                    days = generated.plan.days,
                    total_cost = generated.plan.total_cost,
                    "meal plan ready"
                );
                self.results = Some(generated);
                self.phase = SessionPhase::ResultsReady;
            }
            Err(e) => {
                tracing::warn!(error = %e, "meal plan generation failed");
                self.push(
                    Sender::Bot,
                    format!("Sorry, I couldn't generate your plan ({e}). Please try again."),
                );
                self.phase = SessionPhase::Idle;
            }
        }
        true
    }

    /// Submit `text` and wait for the generation service.
    pub async fn run(&mut self, client: &Client, text: &str) -> Result<(), SubmitError> {
        let submission = self.submit(text)?;
        let result = client.generate_meal_plan(&submission.prompt).await;
        self.complete(&submission, result);
        Ok(())
    }

    pub fn results(&self) -> Option<&GeneratedPlan> {
        self.results.as_ref()
    }

    pub fn summary(&self) -> Option<PlanSummary> {
        let plan = &self.results.as_ref()?.plan;
        Some(PlanSummary {
            total_budget: format_amount(plan.total_budget),
            days: plan.days.to_string(),
            total_cost: format_amount(plan.total_cost),
            remaining_budget: format_amount(plan.remaining_budget),
        })
    }

    /// Printable document of the plan, once results are in.
    pub fn export(&self) -> Option<PlanDocument> {
        let generated = self.results.as_ref()?;
        Some(PlanDocument::from_plan(&generated.plan, Local::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::EndpointConfig;
    use crate::meal_plan::MealPlanResponse;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> Client {
        Client::new(
            reqwest::Client::new(),
            EndpointConfig::new(server.base_url()).unwrap(),
        )
    }

    fn generated() -> GeneratedPlan {
        GeneratedPlan {
            plan: MealPlanResponse {
                total_budget: 500.0,
                days: 2,
                total_cost: 420.0,
                remaining_budget: 80.0,
                ..MealPlanResponse::default()
            },
            meta: None,
        }
    }

    #[test]
    fn starts_idle_with_greeting() {
        let session = MealPlanSession::new();
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.input_enabled());
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].text, GREETING);
        assert_eq!(session.transcript()[0].sender, Sender::Bot);
    }

    #[test]
    fn submit_appends_prompt_and_notice() {
        let mut session = MealPlanSession::new();
        let submission = session.submit("  budget 500, 2 days ").unwrap();
        assert_eq!(submission.prompt, "budget 500, 2 days");
        assert!(!session.input_enabled());
        let texts: Vec<_> = session.transcript().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec![GREETING, "budget 500, 2 days", GENERATING_NOTICE]);
        let ids: Vec<_> = session.transcript().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn submit_rejects_empty_and_busy() {
        let mut session = MealPlanSession::new();
        assert_eq!(session.submit("   "), Err(SubmitError::EmptyPrompt));
        session.submit("plan").unwrap();
        assert_eq!(session.submit("again"), Err(SubmitError::Busy));
    }

    #[test]
    fn success_is_terminal() {
        let mut session = MealPlanSession::new();
        let submission = session.submit("plan").unwrap();
        assert!(session.complete(&submission, Ok(generated())));
        assert_eq!(session.phase(), SessionPhase::ResultsReady);
        assert_eq!(session.submit("more"), Err(SubmitError::Finished));
        assert!(!session.complete(&submission, Ok(generated())));
    }

    #[test]
    fn malformed_envelope_behaves_like_network_failure() {
        let mut malformed = MealPlanSession::new();
        let submission = malformed.submit("plan").unwrap();
        let error = crate::meal_plan::parse_envelope(r#"{"success": true}"#).unwrap_err();
        malformed.complete(&submission, Err(error));

        let mut failed = MealPlanSession::new();
        let submission = failed.submit("plan").unwrap();
        failed.complete(
            &submission,
            Err(GenerateError::ResponseError(reqwest::StatusCode::BAD_GATEWAY)),
        );

        for session in [&malformed, &failed] {
            assert_eq!(session.phase(), SessionPhase::Idle);
            assert!(session.input_enabled());
            assert!(session.results().is_none());
            let last = session.transcript().last().unwrap();
            assert_eq!(last.sender, Sender::Bot);
            assert!(last.text.starts_with("Sorry"));
        }
        assert!(failed.submit("retry").is_ok());
    }

    #[test]
    fn export_only_after_results() {
        let mut session = MealPlanSession::new();
        assert!(session.export().is_none());
        let submission = session.submit("plan").unwrap();
        session.complete(&submission, Ok(generated()));
        assert!(session.export().is_some());
    }

    #[tokio::test]
    async fn run_end_to_end() {
        // Arrange
        let server = MockServer::start_async().await;
        let generate_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generateMealPlan")
                    .json_body(json!({"prompt": "budget 500, 2 days"}));
                then.status(200).json_body(json!({
                    "success": true,
                    "data": {
                        "totalBudget": 500,
                        "days": 2,
                        "healthLevel": 3,
                        "dailyPlans": [
                            {"day": 1, "dailyTotal": 999, "meals": []},
                            {"day": 2, "dailyTotal": 0, "meals": []}
                        ],
                        "totalCost": 420,
                        "remainingBudget": 80
                    },
                    "meta": {"iterations": 2, "generatedAt": "2025-05-01T10:00:00Z"}
                }));
            })
            .await;
        let client = client_for(&server);
        let mut session = MealPlanSession::new();

        // Act
        let outcome = session.run(&client, "budget 500, 2 days").await;

        // Assert
        assert_eq!(outcome, Ok(()));
        assert_eq!(session.phase(), SessionPhase::ResultsReady);
        let summary = session.summary().unwrap();
        assert_eq!(summary.remaining_budget, "80");
        assert_eq!(summary.total_cost, "420");
        assert_eq!(summary.total_budget, "500");
        assert_eq!(summary.days, "2");
        generate_mock.assert();
    }

    #[tokio::test]
    async fn run_failure_returns_to_idle() {
        // Arrange
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/api/generateMealPlan");
                then.status(200).json_body(json!({"success": true}));
            })
            .await;
        let client = client_for(&server);
        let mut session = MealPlanSession::new();

        // Act
        session.run(&client, "anything").await.unwrap();

        // Assert
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.transcript().len(), 4);
    }
}
