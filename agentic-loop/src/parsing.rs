//! Parsing the LLM's think/evaluate responses, with heuristic fallbacks
//! so the downstream contracts (non-empty thinking/plan, a definite
//! success/failure verdict) always hold.

use agentic_events::Verdict;

const SUCCESS_LEXICON: &[&str] = &[
    "successfully",
    "completed",
    "created",
    "generated",
    "written",
    "updated",
    "saved",
    "built",
    "implemented",
    "fixed",
];

const FAILURE_LEXICON: &[&str] = &[
    "error",
    "failed",
    "exception",
    "not found",
    "cannot",
    "unable",
    "denied",
    "invalid",
    "missing",
    "timeout",
    "refused",
];

/// Parsed think-step output. `thinking`/`plan` are guaranteed non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinkOutput {
    /// The reasoning text.
    pub thinking: String,
    /// The plan text, passed to the dispatcher as the execute-step
    /// request.
    pub plan: String,
}

/// Parse a think-step response by locating the literal markers
/// `THINKING:` and `PLAN:`. Falls back to a line-prefix scan, then to
/// treating the whole response as the plan with a synthesised thinking
/// placeholder.
pub fn parse_think_response(response: &str) -> ThinkOutput {
    if let (Some(thinking), Some(plan)) = (extract_marker(response, "THINKING:"), extract_marker(response, "PLAN:")) {
        return ThinkOutput {
            thinking: non_empty_or_placeholder(thinking, "(no reasoning provided)"),
            plan: non_empty_or_placeholder(plan, "(no plan provided)"),
        };
    }

    if let (Some(thinking), Some(plan)) = (line_prefix_scan(response, "thinking"), line_prefix_scan(response, "plan"))
    {
        return ThinkOutput {
            thinking: non_empty_or_placeholder(thinking, "(no reasoning provided)"),
            plan: non_empty_or_placeholder(plan, "(no plan provided)"),
        };
    }

    let trimmed = response.trim();
    ThinkOutput {
        thinking: "(reasoning not separated from plan)".to_string(),
        plan: non_empty_or_placeholder(trimmed.to_string(), "(no plan provided)"),
    }
}

/// Find the literal marker `label` and return the text up to the next
/// all-caps `WORD:` marker or end of string.
fn extract_marker(response: &str, label: &str) -> Option<String> {
    let start = response.find(label)? + label.len();
    let rest = &response[start..];
    let end = next_marker_offset(rest).unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

/// Offset of the next `LABEL:` style marker within `text`, scanning for an
/// uppercase run of letters immediately followed by a colon.
fn next_marker_offset(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_uppercase() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_uppercase() {
                i += 1;
            }
            if i < bytes.len() && bytes[i] == b':' && i > start {
                return Some(start);
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Fallback: scan lines for one starting with `label` (case-insensitive,
/// optionally followed by `:`).
fn line_prefix_scan(response: &str, label: &str) -> Option<String> {
    for line in response.lines() {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();
        if lower.starts_with(label) {
            let rest = trimmed[label.len()..].trim_start_matches(':').trim();
            return Some(rest.to_string());
        }
    }
    None
}

fn non_empty_or_placeholder(text: String, placeholder: &str) -> String {
    if text.trim().is_empty() {
        placeholder.to_string()
    } else {
        text
    }
}

/// Parsed evaluate-step output, before the heuristic fallback is
/// considered.
#[derive(Debug, Clone)]
struct ParsedEvaluation {
    success: Option<bool>,
    confidence: Option<f64>,
    reasoning: Option<String>,
    feedback: Option<String>,
}

fn parse_evaluation_fields(response: &str) -> ParsedEvaluation {
    let success = extract_marker(response, "SUCCESS:").and_then(|s| {
        let token = s.split_whitespace().next().unwrap_or("").to_lowercase();
        match token.as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    });
    let confidence = extract_marker(response, "CONFIDENCE:").and_then(|s| {
        s.split_whitespace()
            .next()
            .and_then(|tok| tok.trim_end_matches('%').parse::<f64>().ok())
            .map(|v| if v > 1.0 { v / 100.0 } else { v })
    });
    let reasoning = extract_marker(response, "REASONING:").filter(|s| !s.trim().is_empty());
    let feedback = extract_marker(response, "FEEDBACK:").filter(|s| !s.trim().is_empty());

    ParsedEvaluation {
        success,
        confidence,
        reasoning,
        feedback,
    }
}

/// Evaluate-step output: the final verdict plus the feedback text carried
/// into refinement.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    /// The parsed or heuristic verdict.
    pub verdict: Verdict,
    /// Feedback text, parsed or synthesised by the heuristic fallback.
    pub feedback: String,
}

/// Parse an evaluate-step response, falling back to the heuristic
/// evaluator when the success flag or confidence does not parse.
pub fn parse_evaluation(response: &str, original_task: &str, execution_result: &str) -> EvaluationOutcome {
    let parsed = parse_evaluation_fields(response);

    if let (Some(succeeded), Some(confidence)) = (parsed.success, parsed.confidence) {
        return EvaluationOutcome {
            verdict: Verdict {
                succeeded,
                confidence: Some(confidence),
                reasoning: parsed.reasoning.unwrap_or_default(),
            },
            feedback: parsed.feedback.unwrap_or_default(),
        };
    }

    heuristic_evaluate(original_task, execution_result)
}

/// Count substring hits against the success/failure lexicons, then fall
/// back to a task-shape heuristic, then a keyword-overlap heuristic.
pub fn heuristic_evaluate(original_task: &str, execution_result: &str) -> EvaluationOutcome {
    let result_lower = execution_result.to_lowercase();
    let task_lower = original_task.to_lowercase();

    let failure_hits = FAILURE_LEXICON.iter().filter(|w| result_lower.contains(**w)).count();
    let success_hits = SUCCESS_LEXICON.iter().filter(|w| result_lower.contains(**w)).count();

    if failure_hits > 0 {
        return EvaluationOutcome {
            verdict: Verdict {
                succeeded: false,
                confidence: Some(0.6),
                reasoning: "heuristic: result text matched the failure lexicon".to_string(),
            },
            feedback: "the execution result indicates failure; try a different approach".to_string(),
        };
    }

    if success_hits > 0 {
        return EvaluationOutcome {
            verdict: Verdict {
                succeeded: true,
                confidence: Some(0.6),
                reasoning: "heuristic: result text matched the success lexicon".to_string(),
            },
            feedback: String::new(),
        };
    }

    const TASK_SHAPES: &[(&[&str], &[&str])] = &[
        (&["create", "write"], &["created", "written"]),
        (&["read", "open"], &["read", "loaded"]),
        (&["search", "find"], &["found", "results"]),
    ];
    for (task_words, result_words) in TASK_SHAPES {
        if task_words.iter().any(|w| task_lower.contains(w)) && result_words.iter().any(|w| result_lower.contains(w))
        {
            return EvaluationOutcome {
                verdict: Verdict {
                    succeeded: true,
                    confidence: Some(0.5),
                    reasoning: "heuristic: task-shape match".to_string(),
                },
                feedback: String::new(),
            };
        }
    }

    let overlap = keyword_overlap(&task_lower, &result_lower);
    if overlap >= 0.4 {
        EvaluationOutcome {
            verdict: Verdict {
                succeeded: true,
                confidence: Some(overlap),
                reasoning: "heuristic: relevance via keyword overlap".to_string(),
            },
            feedback: String::new(),
        }
    } else {
        EvaluationOutcome {
            verdict: Verdict {
                succeeded: false,
                confidence: Some(1.0 - overlap),
                reasoning: "heuristic: insufficient keyword overlap with task".to_string(),
            },
            feedback: "the result did not clearly address the task; try a more direct approach".to_string(),
        }
    }
}

fn keyword_overlap(task: &str, result: &str) -> f64 {
    let task_words: std::collections::HashSet<&str> =
        task.split_whitespace().filter(|w| w.len() >= 3).collect();
    if task_words.is_empty() {
        return 0.0;
    }
    let result_words: std::collections::HashSet<&str> =
        result.split_whitespace().filter(|w| w.len() >= 3).collect();
    let overlap = task_words.intersection(&result_words).count();
    overlap as f64 / task_words.len() as f64
}

/// Build the refined context string fed into the next think step:
/// `"<prior context> | Previous feedback: <feedback>"`, with the
/// alternative-approaches appendix once `iteration` exceeds `threshold`.
pub fn refine_context(prior_context: &str, feedback: &str, iteration: u32, threshold: u32) -> String {
    let mut refined = format!("{prior_context} | Previous feedback: {feedback}");
    if iteration > threshold {
        refined.push_str(&format!("| Note: iteration {iteration}, consider alternative approaches."));
    }
    refined
}
