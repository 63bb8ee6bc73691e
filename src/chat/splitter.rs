//! Separates a model response into its reasoning block and final answer.
//!
//! Reasoning models emit chain-of-thought wrapped in `<think>…</think>`
//! ahead of the answer text. [`split_response`] partitions the accumulated
//! response; callers re-run it on the full text after every streamed
//! fragment, so it must behave sensibly on partial input: an unclosed block
//! stays in the answer until the closing marker arrives.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches one reasoning block. `(?s)` lets the block span lines; the lazy
/// quantifier keeps a second block out of the first capture.
static REASONING_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>(.*?)</think>").expect("reasoning block pattern"));

/// A response partitioned into reasoning and answer regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitResponse {
    /// Trimmed text of the first closed reasoning block; empty when none.
    pub reasoning: String,
    /// The response with every reasoning block removed, trimmed.
    pub answer: String,
}

/// Partition `text` into `(reasoning, answer)`.
///
/// The FIRST reasoning block becomes `reasoning`; EVERY reasoning block is
/// stripped when producing `answer`. With no closed block the whole trimmed
/// text is the answer, so an in-progress block is not shown as reasoning
/// until it closes. Pure and deterministic; safe to call on every fragment
/// of a growing response.
pub fn split_response(text: &str) -> SplitResponse {
    match REASONING_BLOCK.captures(text) {
        Some(caps) => SplitResponse {
            reasoning: caps[1].trim().to_string(),
            answer: REASONING_BLOCK.replace_all(text, "").trim().to_string(),
        },
        None => SplitResponse {
            reasoning: String::new(),
            answer: text.trim().to_string(),
        },
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
