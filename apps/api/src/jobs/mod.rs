//! Job functions: the background half of each tool.
//!
//! The runner invokes these with the event data the gateway submitted. Each
//! calls the model, turns its reply into structured content, persists one
//! history record keyed by the correlation id and returns `{ "output": .. }`
//! so the gateway's extractor can find it.
//!
//! A reply that cannot be turned into structured content fails the job:
//! nothing is stored and the runner marks the run Failed.

pub mod handlers;
pub mod prompts;
pub mod signature;

use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::errors::AppError;
use crate::gateway::ToolKind;
use crate::history::{HistoryStore, NewHistoryRecord};
use crate::llm_client::{parse_fenced_json, LanguageModel};
use prompts::{
    CAREER_COACH_SYSTEM, COVER_LETTER_SYSTEM, RESUME_ANALYZER_SYSTEM, ROADMAP_GENERATOR_SYSTEM,
};

/// Letters shorter than this are treated as a failed generation.
const MIN_COVER_LETTER_CHARS: usize = 100;

// ────────────────────────────────────────────────────────────────────────────
// Event payloads
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResumeJob {
    record_id: String,
    resume_text: String,
    user_email: String,
    resume_file_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoverLetterJob {
    coverid: String,
    #[serde(default)]
    user_input: Value,
    user_email: String,
}

/// Form fields of a cover-letter request. Every field is optional; free-text
/// input is taken as the additional notes.
#[derive(Debug, Default, PartialEq)]
struct CoverLetterInput {
    job_title: String,
    company_name: String,
    key_skills: String,
    additional_notes: String,
    applicant_name: String,
}

impl CoverLetterInput {
    fn from_input(input: &Value) -> Self {
        match input {
            Value::Null => Self::default(),
            Value::Object(fields) => {
                let text = |key: &str| match fields.get(key) {
                    None | Some(Value::Null) => String::new(),
                    Some(value) => input_text(value),
                };
                Self {
                    job_title: text("jobTitle"),
                    company_name: text("companyName"),
                    key_skills: text("keySkills"),
                    additional_notes: text("additionalNotes"),
                    applicant_name: text("applicantName"),
                }
            }
            other => Self {
                additional_notes: input_text(other),
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoadmapJob {
    roadmap_id: String,
    user_input: Value,
    user_email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CareerChatJob {
    user_input: Value,
}

fn decode<T: DeserializeOwned>(tool: ToolKind, data: Value) -> Result<T, AppError> {
    serde_json::from_value(data).map_err(|e| {
        AppError::Validation(format!(
            "Invalid {} payload: {e}",
            tool.spec().event_name
        ))
    })
}

/// Renders free-form input for a prompt: strings verbatim, anything else as JSON.
fn input_text(input: &Value) -> String {
    match input {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Worker
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct JobWorker {
    llm: Arc<dyn LanguageModel>,
    history: Arc<dyn HistoryStore>,
}

impl JobWorker {
    pub fn new(llm: Arc<dyn LanguageModel>, history: Arc<dyn HistoryStore>) -> Self {
        Self { llm, history }
    }

    /// Executes one submitted event and returns the run's output envelope.
    pub async fn execute(&self, tool: ToolKind, data: Value) -> Result<Value, AppError> {
        info!("Executing {} job", tool.spec().event_name);
        match tool {
            ToolKind::ResumeAnalyzer => self.analyze_resume(decode(tool, data)?).await,
            ToolKind::CoverLetter => self.write_cover_letter(decode(tool, data)?).await,
            ToolKind::Roadmap => self.generate_roadmap(decode(tool, data)?).await,
            ToolKind::CareerChat => self.answer_career_question(decode(tool, data)?).await,
        }
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AppError> {
        self.llm
            .complete(system, prompt)
            .await
            .map_err(|e| AppError::Llm(format!("Agent call failed: {e}")))
    }

    async fn analyze_resume(&self, job: ResumeJob) -> Result<Value, AppError> {
        let reply = self.complete(RESUME_ANALYZER_SYSTEM, &job.resume_text).await?;
        let report = parse_structured(&reply)?;

        self.history
            .insert(NewHistoryRecord {
                record_id: job.record_id,
                content: report.clone(),
                user_email: job.user_email,
                ai_agent_type: ToolKind::ResumeAnalyzer.spec().agent_type.to_string(),
                meta_data: job.resume_file_url,
            })
            .await?;

        Ok(json!({ "output": report }))
    }

    async fn write_cover_letter(&self, job: CoverLetterJob) -> Result<Value, AppError> {
        let input = CoverLetterInput::from_input(&job.user_input);

        let job_description = format!(
            "Job Title: {}\nCompany: {}\nRequired Skills: {}\nAdditional Notes: {}",
            input.job_title, input.company_name, input.key_skills, input.additional_notes
        );
        let prompt = json!({
            "resumeText": "",
            "jobDescription": job_description,
            "applicantName": input.applicant_name,
            "companyName": input.company_name,
            "position": input.job_title,
        })
        .to_string();

        let reply = self.complete(COVER_LETTER_SYSTEM, &prompt).await?;
        let letter = reply.trim();
        if letter.chars().count() < MIN_COVER_LETTER_CHARS {
            error!("Cover letter for {} too short: {letter:?}", job.coverid);
            return Err(AppError::MalformedOutput(
                "Cover letter content is too short or empty".to_string(),
            ));
        }

        let content = json!({ "coverLetter": letter });
        self.history
            .insert(NewHistoryRecord {
                record_id: job.coverid,
                content: content.clone(),
                user_email: job.user_email,
                ai_agent_type: ToolKind::CoverLetter.spec().agent_type.to_string(),
                meta_data: Some(job.user_input.to_string()),
            })
            .await?;

        Ok(json!({ "output": content }))
    }

    async fn generate_roadmap(&self, job: RoadmapJob) -> Result<Value, AppError> {
        let user_input = input_text(&job.user_input);
        let prompt = format!("UserInput: {user_input}");
        let reply = self.complete(ROADMAP_GENERATOR_SYSTEM, &prompt).await?;
        let roadmap = parse_structured(&reply)?;

        self.history
            .insert(NewHistoryRecord {
                record_id: job.roadmap_id,
                content: roadmap.clone(),
                user_email: job.user_email,
                ai_agent_type: ToolKind::Roadmap.spec().agent_type.to_string(),
                meta_data: Some(user_input),
            })
            .await?;

        Ok(json!({ "output": roadmap }))
    }

    async fn answer_career_question(&self, job: CareerChatJob) -> Result<Value, AppError> {
        let reply = self
            .complete(CAREER_COACH_SYSTEM, &input_text(&job.user_input))
            .await?;
        let answer = reply.trim();
        if answer.is_empty() {
            return Err(AppError::MalformedOutput("Empty career answer".to_string()));
        }
        Ok(json!({ "output": answer }))
    }
}

/// Parses a fenced JSON reply into an object. Anything else fails the job.
fn parse_structured(reply: &str) -> Result<Value, AppError> {
    match parse_fenced_json::<Value>(reply) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => {
            error!("AI output is JSON but not an object: {other}");
            Err(AppError::MalformedOutput(
                "Expected a JSON object from AI agent".to_string(),
            ))
        }
        Err(e) => {
            error!("Failed to parse JSON from AI output: {reply}");
            Err(AppError::MalformedOutput(format!(
                "Invalid JSON returned from AI agent: {e}"
            )))
        }
    }
}
