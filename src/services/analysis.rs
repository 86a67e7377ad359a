// src/services/analysis.rs

use crate::models::result::AnswerDetail;

const EXCELLENT: &str = "Excellent work! You have mastered nearly all of the material. \
    Consider moving on to more challenging content.";
const GOOD: &str = "Good work. You understand most of the material well. \
    Review the questions you missed to consolidate those topics.";
const FAIR: &str = "Fair result. Some topics are not yet well understood. \
    Revisit the related material and practise further.";
const NEEDS_WORK: &str = "This result needs improvement. Most topics are not yet understood. \
    Start again from the fundamentals and work through the material systematically.";

const ATTENTION_HEADER: &str = "Topics that need attention:";

/// Builds the textual performance summary for a graded attempt.
///
/// The band is chosen from the correct rate (>= 0.9, >= 0.7, >= 0.5, else).
/// When anything was answered incorrectly, the content of each missed
/// question is listed. An empty attempt is treated as a correct rate of 0
/// with no list.
pub fn generate_analysis(answers: &[AnswerDetail]) -> String {
    let total = answers.len();
    let correct = answers.iter().filter(|a| a.is_correct).count();
    let correct_rate = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    };

    let mut analysis = band_text(correct_rate).to_string();

    if total > 0 && correct_rate < 1.0 {
        analysis.push_str("\n\n");
        analysis.push_str(ATTENTION_HEADER);
        for answer in answers.iter().filter(|a| !a.is_correct) {
            analysis.push_str("\n- ");
            analysis.push_str(&answer.content);
        }
    }

    analysis
}

fn band_text(correct_rate: f64) -> &'static str {
    if correct_rate >= 0.9 {
        EXCELLENT
    } else if correct_rate >= 0.7 {
        GOOD
    } else if correct_rate >= 0.5 {
        FAIR
    } else {
        NEEDS_WORK
    }
}
