//! Prompt builders for the chat-completions interviewer.

use prepai_types::BehavioralMetrics;

use super::{EvaluationRequest, QuestionRequest, ResumeScoreRequest};

const OPENING_RESUME_CHARS: usize = 2500;
const FOLLOW_UP_RESUME_CHARS: usize = 1000;
const SCORED_RESUME_CHARS: usize = 2000;

pub(super) const SYSTEM_PROMPT: &str = "You are a professional technical interviewer. \
Reply with exactly one JSON object and nothing else: no markdown, no commentary.";

pub(super) const ATS_SYSTEM_PROMPT: &str = "You are an applicant tracking system that grades \
resumes against a job description. Reply with exactly one JSON object and nothing else.";

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

const QUESTION_SHAPE: &str = r#"{
  "title": "Question Title",
  "description": "The question text",
  "input_format": "Input example, or text for verbal questions",
  "output_format": "Output example, or text for verbal questions"
}"#;

pub(super) fn question_prompt(request: &QuestionRequest<'_>) -> String {
    let profile = request.profile;
    let resume_limit = if request.previous_question.is_some() {
        FOLLOW_UP_RESUME_CHARS
    } else {
        OPENING_RESUME_CHARS
    };
    let resume = request
        .resume_context
        .map(|text| truncate_chars(text.trim(), resume_limit))
        .filter(|text| !text.is_empty())
        .unwrap_or("(no resume provided)");

    let mut prompt = format!(
        "Conduct a {focus} interview for a {role} with {experience} of experience.\n\
         Interview intensity: {intensity}/10.\n\n\
         Candidate resume context:\n\"\"\"\n{resume}\n\"\"\"\n\n",
        focus = profile.focus_area,
        role = profile.role,
        experience = profile.experience_level,
        intensity = profile.intensity,
    );
    match request.previous_question {
        None => prompt.push_str(
            "Generate the FIRST interview question. When the resume lists skills or projects, \
             target one of them specifically.\n\n",
        ),
        Some(previous) => {
            prompt.push_str(&format!(
                "The candidate just answered: \"{previous}\".\n\
                 Generate the NEXT question. It must differ from the previous one \
                 and stay relevant to the candidate's profile.\n\n"
            ));
        }
    }
    prompt.push_str("Return JSON with this shape:\n");
    prompt.push_str(QUESTION_SHAPE);
    prompt
}

fn metrics_block(metrics: Option<&BehavioralMetrics>) -> String {
    let Some(metrics) = metrics else {
        return "Behavioral data: not captured.\n".to_string();
    };
    let mut lines = String::from("Behavioral data:\n");
    if let Some(wpm) = metrics.wpm {
        lines.push_str(&format!(
            "- Speaking pace: {wpm:.0} words per minute (ideal is 110-150)\n"
        ));
    }
    if let Some(fillers) = metrics.filler_words {
        lines.push_str(&format!("- Filler words used: {fillers} (um, uh, like)\n"));
    }
    if let Some(duration) = metrics.duration_secs {
        lines.push_str(&format!("- Answer duration: {duration:.0} seconds\n"));
    }
    lines
}

pub(super) fn evaluation_prompt(request: &EvaluationRequest<'_>) -> String {
    format!(
        "Evaluate a candidate's answer as a behavioral and technical interviewer for a {role} role.\n\n\
         Question: \"{title}\"\n{description}\n\n\
         Answer transcript:\n\"\"\"\n{answer}\n\"\"\"\n\n\
         {metrics}\n\
         Judge clarity (pace and structure), confidence (fillers and hesitation) \
         and technical accuracy (content).\n\n\
         Return JSON with this shape:\n\
         {{\n  \"technical_accuracy\": \"High | Medium | Low\",\n  \"clarity_score\": 0-10,\n  \
         \"confidence_score\": 0-10,\n  \"feedback\": \"Two sentences on delivery and technical correctness.\"\n}}",
        role = request.profile.role,
        title = request.question.title,
        description = request.question.description,
        answer = request.answer.trim(),
        metrics = metrics_block(request.metrics),
    )
}

pub(super) fn resume_score_prompt(request: &ResumeScoreRequest<'_>) -> String {
    let job = request.job_description.trim();
    let job = if job.is_empty() { "General" } else { job };
    format!(
        "Job: \"{job}\"\n\n\
         Resume text:\n\"\"\"\n{resume}\n\"\"\"\n\n\
         Score how well the resume fits the job from 0 to 100 and suggest concrete improvements.\n\n\
         Return JSON with this shape:\n\
         {{\n  \"score\": 0-100,\n  \"improvement_tips\": [\"Tip 1\", \"Tip 2\"],\n  \
         \"summary\": \"Short summary\"\n}}",
        resume = truncate_chars(request.resume_text.trim(), SCORED_RESUME_CHARS),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use prepai_types::{InterviewProfile, Question};

    fn profile() -> InterviewProfile {
        InterviewProfile {
            role: "Backend Engineer".to_string(),
            experience_level: "3-5 Years".to_string(),
            focus_area: "System Design".to_string(),
            intensity: 7,
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn follow_up_prompt_mentions_previous_question_and_cuts_resume() {
        let profile = profile();
        let resume = "x".repeat(3000);
        let prompt = question_prompt(&QuestionRequest {
            profile: &profile,
            resume_context: Some(&resume),
            previous_question: Some("Caching strategies"),
        });
        assert!(prompt.contains("Caching strategies"));
        assert!(prompt.contains("7/10"));
        assert!(!prompt.contains(&"x".repeat(FOLLOW_UP_RESUME_CHARS + 1)));
    }

    #[test]
    fn evaluation_prompt_includes_metrics() {
        let profile = profile();
        let question = Question::new("Queues", "Why queues?", "text", "text");
        let metrics = BehavioralMetrics {
            wpm: Some(180.0),
            filler_words: Some(4),
            duration_secs: None,
        };
        let prompt = evaluation_prompt(&EvaluationRequest {
            profile: &profile,
            question: &question,
            answer: "I used queues.",
            metrics: Some(&metrics),
        });
        assert!(prompt.contains("180 words per minute"));
        assert!(prompt.contains("Filler words used: 4"));
        assert!(prompt.contains("I used queues."));
    }

    #[test]
    fn resume_score_prompt_cuts_resume_and_defaults_job() {
        let resume = "y".repeat(2500);
        let prompt = resume_score_prompt(&ResumeScoreRequest {
            resume_text: &resume,
            job_description: " ",
        });
        assert!(prompt.contains("Job: \"General\""));
        assert!(prompt.contains(&"y".repeat(SCORED_RESUME_CHARS)));
        assert!(!prompt.contains(&"y".repeat(SCORED_RESUME_CHARS + 1)));
    }
}
