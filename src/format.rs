//! Output templates: notes, summary, quiz and pro tips.
//!
//! Rendering is a pure function of its inputs. Quiz mode is the only template
//! that draws randomness, and it takes the generator as a parameter.

use crate::summary::{SummaryResult, Topic};
use clap::ValueEnum;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::fmt;

/// Number of questions in a quiz
pub const QUIZ_LENGTH: usize = 10;

/// Separator between per-topic outputs in a batch
pub const BATCH_SEPARATOR: &str = "\n\n";

const QUIZ_FALLBACK_WORD: &str = "topic";

/// Output template selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Mode {
    /// Bullet-point notes built from the summary
    Notes,
    /// The raw summary under a header
    Summary,
    /// Ten questions built from the topic words
    Quiz,
    /// Study tips for the topic
    Tips,
}

impl Mode {
    /// Whether this template uses the fetched summary at all
    pub fn needs_summary(self) -> bool {
        matches!(self, Mode::Notes | Mode::Summary)
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Notes => "Notes",
            Mode::Summary => "Summary",
            Mode::Quiz => "Quiz",
            Mode::Tips => "Pro Tips",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Render one topic in the given mode.
pub fn render<R: Rng + ?Sized>(
    mode: Mode,
    topic: &Topic,
    result: &SummaryResult,
    rng: &mut R,
) -> String {
    match mode {
        Mode::Notes => notes(&result.text()),
        Mode::Summary => summary(topic, result),
        Mode::Quiz => quiz(topic.as_str(), rng),
        Mode::Tips => pro_tips(topic),
    }
}

/// Render a batch in input order, one block per topic.
pub fn render_batch<R: Rng + ?Sized>(
    mode: Mode,
    entries: &[(Topic, SummaryResult)],
    rng: &mut R,
) -> String {
    entries
        .iter()
        .map(|(topic, result)| render(mode, topic, result, rng))
        .collect::<Vec<_>>()
        .join(BATCH_SEPARATOR)
}

/// Header plus the summary (or failure message) untouched.
pub fn summary(topic: &Topic, result: &SummaryResult) -> String {
    format!("📝 Summary of {}\n\n{}", topic, result.text())
}

/// Split on `". "` and bullet every non-blank piece.
pub fn notes(text: &str) -> String {
    let mut lines = vec![
        "📌 Notes (Auto-generated from Wikipedia)".to_string(),
        "-".repeat(50),
    ];
    lines.extend(
        text.split(". ")
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(|segment| format!("• {}", segment)),
    );
    lines.join("\n")
}

/// Ten questions, each naming one word of the topic chosen at random.
pub fn quiz<R: Rng + ?Sized>(topic: &str, rng: &mut R) -> String {
    let mut words: Vec<&str> = topic.split_whitespace().collect();
    if words.is_empty() {
        words.push(QUIZ_FALLBACK_WORD);
    }

    let mut lines = vec!["❓ Quiz Questions".to_string(), "-".repeat(40)];
    for n in 1..=QUIZ_LENGTH {
        let word = words.choose(rng).copied().unwrap_or(QUIZ_FALLBACK_WORD);
        lines.push(format!("{}. Explain the term '{}' in detail.", n, word));
    }
    lines.join("\n")
}

pub fn pro_tips(topic: &Topic) -> String {
    let tips = [
        format!("• Break down {} into subtopics for easier understanding.", topic),
        format!("• Make diagrams or charts to visualize {}.", topic),
        format!("• Connect {} with real-life examples.", topic),
        format!("• Revise {} regularly for exams.", topic),
        format!("• Try answering previous questions on {}.", topic),
    ];
    format!("💡 Pro Tips:\n{}\n{}", "-".repeat(40), tips.join("\n"))
}
