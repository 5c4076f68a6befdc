// ATS feedback prompt templates.

/// The JSON shape the model must return. Mirrors `Feedback`.
pub const RESPONSE_FORMAT: &str = r#"{
  "overallScore": number, // 0-100, max 100
  "ATS": {
    "score": number, // how well the resume would pass an ATS
    "tips": [{ "type": "good" | "improve", "tip": "string" }] // 3-4 tips
  },
  "toneAndStyle": {
    "score": number,
    "tips": [{ "type": "good" | "improve", "tip": "short title", "explanation": "detailed explanation" }] // 3-4 tips
  },
  "content": {
    "score": number,
    "tips": [{ "type": "good" | "improve", "tip": "short title", "explanation": "detailed explanation" }]
  },
  "structure": {
    "score": number,
    "tips": [{ "type": "good" | "improve", "tip": "short title", "explanation": "detailed explanation" }]
  },
  "skills": {
    "score": number,
    "tips": [{ "type": "good" | "improve", "tip": "short title", "explanation": "detailed explanation" }]
  }
}"#;

/// Builds the review instructions for a job title and description.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    format!(
        "You are an expert in ATS (Applicant Tracking Systems) and resume review.
Analyse the attached resume, rate it, and explain how to improve it.
Be thorough and honest. Low scores are fine when the resume is weak; point out every mistake you find.
Use the job description below to tailor the feedback to the role.

JOB TITLE:
{job_title}

JOB DESCRIPTION:
{job_description}

OUTPUT FORMAT (return exactly this structure):
{RESPONSE_FORMAT}

Return ONLY the JSON object: no backticks, no comments, no other text."
    )
}
