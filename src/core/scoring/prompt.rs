use serde::Serialize;

use super::band::ALLOWED_BANDS;

const SYSTEM_PROMPT: &str = "You are a language expert. Your task is to evaluate the grammar and \
lexical resources of the provided text, and given the pronunciation score, determine the IELTS band score.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// The two-message conversation sent to the scorer.
pub fn build_messages(transcript: &str, pron_score: f64) -> Vec<ChatMessage> {
    let user = format!(
        "I would like you to evaluate the IELTS band score for the whole speech based on the \
grammar and lexical resources aspect of the following speech transcript:\n\n{transcript}\n\n\
and the following pronunciation score out of 100:\n\n{pron_score}\n\n\
Output only a single value of the IELTS band score. Possible output values are {ALLOWED_BANDS}"
    );

    vec![
        ChatMessage {
            role: Role::System,
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: Role::User,
            content: user,
        },
    ]
}
