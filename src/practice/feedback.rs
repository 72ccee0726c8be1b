use std::fmt;

use crate::api::{AnswerMetrics, FeedbackResult, SubScores};
use crate::config::ScoreBands;

use super::PracticeAttempt;

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Green,
    Yellow,
    Red,
}

impl ScoreBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::Green => "green",
            ScoreBand::Yellow => "yellow",
            ScoreBand::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverallScore {
    /// `N/100`
    pub label: String,
    pub band: ScoreBand,
    /// Width of the score bar, clamped to 0..=100
    pub bar_percent: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubScoreCard {
    pub name: &'static str,
    /// `N/10`
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Bullets(Vec<String>),
    Text(String),
    Fields(Vec<(&'static str, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackSection {
    pub title: &'static str,
    pub body: SectionBody,
}

/// Everything needed to show one evaluation. Sections whose data is absent
/// are left out; "Your Answer" is always last.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackView {
    pub question: String,
    pub overall: Option<OverallScore>,
    pub sub_scores: Vec<SubScoreCard>,
    pub sections: Vec<FeedbackSection>,
    pub your_answer: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackRenderer {
    bands: ScoreBands,
}

impl FeedbackRenderer {
    pub fn new(bands: ScoreBands) -> Self {
        Self { bands }
    }

    pub fn band(&self, score: f64) -> ScoreBand {
        if score >= self.bands.good {
            ScoreBand::Green
        } else if score >= self.bands.fair {
            ScoreBand::Yellow
        } else {
            ScoreBand::Red
        }
    }

    pub fn render(&self, attempt: &PracticeAttempt, feedback: &FeedbackResult) -> FeedbackView {
        let overall = feedback.overall_score.map(|score| OverallScore {
            label: format!("{}/100", format_score(score)),
            band: self.band(score),
            bar_percent: score.clamp(0.0, 100.0).round() as u8,
        });

        FeedbackView {
            question: attempt.question.clone(),
            overall,
            sub_scores: feedback.scores.as_ref().map(sub_score_cards).unwrap_or_default(),
            sections: sections(feedback),
            your_answer: attempt.answer.clone(),
        }
    }
}

fn sub_score_cards(scores: &SubScores) -> Vec<SubScoreCard> {
    [
        ("Relevance", scores.relevance),
        ("Clarity", scores.clarity),
        ("Completeness", scores.completeness),
    ]
    .into_iter()
    .filter_map(|(name, value)| {
        value.map(|v| SubScoreCard {
            name,
            label: format!("{}/10", format_score(v)),
        })
    })
    .collect()
}

fn sections(feedback: &FeedbackResult) -> Vec<FeedbackSection> {
    let mut sections = Vec::new();

    let mut bullets = |title: &'static str, items: &[String]| {
        let items: Vec<String> = items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !items.is_empty() {
            sections.push(FeedbackSection {
                title,
                body: SectionBody::Bullets(items),
            });
        }
    };
    bullets("Strengths", &feedback.strengths);
    bullets("Areas for Improvement", &feedback.improvements);

    if let Some(text) = non_blank(feedback.detailed_feedback.as_deref()) {
        sections.push(FeedbackSection {
            title: "Detailed Analysis",
            body: SectionBody::Text(text),
        });
    }

    let suggestions: Vec<String> = feedback
        .suggestions
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if !suggestions.is_empty() {
        sections.push(FeedbackSection {
            title: "Suggestions for Better Answers",
            body: SectionBody::Bullets(suggestions),
        });
    }

    if let Some(fields) = feedback.metrics.as_ref().map(metric_fields) {
        if !fields.is_empty() {
            sections.push(FeedbackSection {
                title: "Answer Metrics",
                body: SectionBody::Fields(fields),
            });
        }
    }

    if let Some(text) = non_blank(feedback.sample_answer.as_deref()) {
        sections.push(FeedbackSection {
            title: "Sample Improved Answer",
            body: SectionBody::Text(text),
        });
    }

    sections
}

fn metric_fields(metrics: &AnswerMetrics) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();
    if let Some(count) = metrics.word_count {
        fields.push(("Word Count", count.to_string()));
    }
    if let Some(duration) = metrics.duration {
        fields.push(("Duration", format!("{}s", format_score(duration))));
    }
    if let Some(wpm) = metrics.words_per_minute {
        fields.push(("Pace", format!("{} WPM", format_score(wpm))));
    }
    if let Some(complexity) = non_blank(metrics.complexity.as_deref()) {
        fields.push(("Complexity", complexity));
    }
    fields
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Whole numbers without a fractional part, otherwise one decimal
fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

impl fmt::Display for FeedbackView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "AI Feedback & Evaluation")?;
        writeln!(f, "{}", self.question)?;

        if let Some(overall) = &self.overall {
            let filled = (overall.bar_percent as usize * BAR_WIDTH + 50) / 100;
            writeln!(f)?;
            writeln!(
                f,
                "Overall Score: {} ({})",
                overall.label,
                overall.band.as_str()
            )?;
            writeln!(
                f,
                "[{}{}]",
                "#".repeat(filled),
                "-".repeat(BAR_WIDTH - filled)
            )?;
        }

        if !self.sub_scores.is_empty() {
            let cards: Vec<String> = self
                .sub_scores
                .iter()
                .map(|c| format!("{} {}", c.name, c.label))
                .collect();
            writeln!(f, "{}", cards.join(" | "))?;
        }

        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "{}", section.title)?;
            match &section.body {
                SectionBody::Bullets(items) => {
                    for item in items {
                        writeln!(f, "  • {}", item)?;
                    }
                }
                SectionBody::Text(text) => writeln!(f, "  {}", text)?,
                SectionBody::Fields(fields) => {
                    for (name, value) in fields {
                        writeln!(f, "  {}: {}", name, value)?;
                    }
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "Your Answer")?;
        write!(f, "  {}", self.your_answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Question;
    use crate::practice::{AnswerSubmission, InputMode};

    fn attempt() -> PracticeAttempt {
        let question = Question {
            id: "q1".to_string(),
            question: "Explain closures".to_string(),
            answer: "...".to_string(),
            is_pinned: false,
        };
        PracticeAttempt::new(
            &question,
            AnswerSubmission {
                question: question.question.clone(),
                answer_text: "A closure captures variables from its scope.".to_string(),
                input_mode: InputMode::Text,
                recording_duration_secs: 0,
            },
        )
    }

    #[test]
    fn seventy_two_is_yellow_with_three_cards() {
        let feedback = FeedbackResult {
            overall_score: Some(72.0),
            scores: Some(SubScores {
                relevance: Some(7.0),
                clarity: Some(8.0),
                completeness: Some(6.0),
            }),
            strengths: vec!["Accurate".to_string()],
            improvements: vec!["Add an example".to_string()],
            ..FeedbackResult::default()
        };

        let view = FeedbackRenderer::default().render(&attempt(), &feedback);
        let overall = view.overall.as_ref().unwrap();
        assert_eq!(overall.label, "72/100");
        assert_eq!(overall.band, ScoreBand::Yellow);
        assert_eq!(overall.bar_percent, 72);

        let cards: Vec<(&str, &str)> = view
            .sub_scores
            .iter()
            .map(|c| (c.name, c.label.as_str()))
            .collect();
        assert_eq!(
            cards,
            vec![
                ("Relevance", "7/10"),
                ("Clarity", "8/10"),
                ("Completeness", "6/10")
            ]
        );

        let titles: Vec<&str> = view.sections.iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Strengths", "Areas for Improvement"]);

        let text = view.to_string();
        assert!(text.contains("Overall Score: 72/100 (yellow)"));
        assert!(text.contains("Relevance 7/10 | Clarity 8/10 | Completeness 6/10"));
        assert!(text.ends_with("Your Answer\n  A closure captures variables from its scope."));
    }

    #[test]
    fn bands_follow_configured_thresholds() {
        let renderer = FeedbackRenderer::default();
        assert_eq!(renderer.band(80.0), ScoreBand::Green);
        assert_eq!(renderer.band(79.9), ScoreBand::Yellow);
        assert_eq!(renderer.band(60.0), ScoreBand::Yellow);
        assert_eq!(renderer.band(12.0), ScoreBand::Red);

        let strict = FeedbackRenderer::new(ScoreBands {
            good: 90.0,
            fair: 75.0,
        });
        assert_eq!(strict.band(85.0), ScoreBand::Yellow);
        assert_eq!(strict.band(72.0), ScoreBand::Red);
    }

    #[test]
    fn sections_keep_fixed_order_and_skip_absent_data() {
        let feedback = FeedbackResult {
            overall_score: None,
            strengths: vec!["   ".to_string()],
            detailed_feedback: Some("Solid grasp of scope.".to_string()),
            suggestions: vec!["Mention move semantics".to_string()],
            metrics: Some(AnswerMetrics {
                word_count: Some(120),
                duration: Some(45.0),
                words_per_minute: Some(160.0),
                complexity: Some("intermediate".to_string()),
            }),
            sample_answer: Some("Closures are...".to_string()),
            ..FeedbackResult::default()
        };

        let view = FeedbackRenderer::default().render(&attempt(), &feedback);
        assert!(view.overall.is_none());
        assert!(view.sub_scores.is_empty());

        let titles: Vec<&str> = view.sections.iter().map(|s| s.title).collect();
        assert_eq!(
            titles,
            vec![
                "Detailed Analysis",
                "Suggestions for Better Answers",
                "Answer Metrics",
                "Sample Improved Answer"
            ]
        );
        assert_eq!(
            view.sections[2].body,
            SectionBody::Fields(vec![
                ("Word Count", "120".to_string()),
                ("Duration", "45s".to_string()),
                ("Pace", "160 WPM".to_string()),
                ("Complexity", "intermediate".to_string()),
            ])
        );
    }

    #[test]
    fn partial_sub_scores_render_only_present_cards() {
        let feedback = FeedbackResult {
            overall_score: Some(130.0),
            scores: Some(SubScores {
                relevance: Some(7.5),
                clarity: None,
                completeness: None,
            }),
            ..FeedbackResult::default()
        };
        let view = FeedbackRenderer::default().render(&attempt(), &feedback);
        assert_eq!(view.overall.as_ref().unwrap().bar_percent, 100);
        assert_eq!(view.sub_scores.len(), 1);
        assert_eq!(view.sub_scores[0].label, "7.5/10");
    }
}
