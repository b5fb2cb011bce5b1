//! The hidden completion entry point
//!
//! Shell scripts call the program as `prog __complete <words...> <partial>`
//! and read back one candidate per line (`value` or `value<TAB>description`)
//! followed by a final `:<directive>` line.

use crate::command_tree::CommandTree;
use crate::completions::{Candidate, CompletionEngine, Completions};
use crate::directive::Directive;
use crate::error::{CompletionError, Result};
use std::io::Write;
use tracing::debug;

/// Marker word asking for candidates with descriptions
pub const COMPLETE_COMMAND: &str = "__complete";
/// Marker word asking for bare candidates
pub const COMPLETE_NO_DESC_COMMAND: &str = "__completeNoDesc";

/// A decoded invocation of the hidden entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Words typed before the cursor word, program name excluded
    pub words: Vec<String>,
    /// The partial word under the cursor, possibly empty
    pub to_complete: String,
    pub descriptions: bool,
}

impl CompletionRequest {
    /// Recognize the hidden entry point in `args` (program name excluded).
    ///
    /// Returns `None` when the first argument is not a completion marker.
    /// A marker with no further words completes an empty word.
    pub fn from_args<I, S>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let descriptions = match args.next()?.as_str() {
            COMPLETE_COMMAND => true,
            COMPLETE_NO_DESC_COMMAND => false,
            _ => return None,
        };
        let mut words: Vec<String> = args.collect();
        let to_complete = words.pop().unwrap_or_default();
        Some(Self {
            words,
            to_complete,
            descriptions,
        })
    }
}

/// Render completions in the line protocol.
pub fn encode(completions: &Completions, descriptions: bool) -> String {
    let mut out = String::new();
    for candidate in &completions.candidates {
        let mut line = candidate.value.clone();
        if descriptions {
            if let Some(description) = candidate.description.as_deref().filter(|d| !d.is_empty()) {
                line.push('\t');
                line.push_str(description);
            }
        }
        // only the first line of a multi-line candidate is kept
        out.push_str(line.lines().next().unwrap_or_default());
        out.push('\n');
    }
    out.push(':');
    out.push_str(&completions.directive.bits().to_string());
    out.push('\n');
    out
}

/// Parse line-protocol output back into completions.
pub fn decode(output: &str) -> Result<Completions> {
    let mut lines: Vec<&str> = output.lines().collect();
    while lines.last().map_or(false, |l| l.trim().is_empty()) {
        lines.pop();
    }

    let directive_line = lines
        .pop()
        .ok_or_else(|| CompletionError::Protocol("empty output".to_string()))?;
    let bits = directive_line
        .strip_prefix(':')
        .and_then(|b| b.parse::<u32>().ok())
        .ok_or_else(|| CompletionError::Protocol(format!("bad directive line '{}'", directive_line)))?;
    let directive = Directive::from_bits(bits)
        .ok_or_else(|| CompletionError::Protocol(format!("undefined directive bits {}", bits)))?;

    let candidates = lines
        .into_iter()
        .filter(|line| !line.is_empty())
        .map(Candidate::parse)
        .collect();
    Ok(Completions {
        candidates,
        directive,
    })
}

/// Answer a completion request on `out`.
pub fn serve<W: Write>(tree: &CommandTree, request: &CompletionRequest, out: &mut W) -> Result<()> {
    debug!(words = ?request.words, to_complete = %request.to_complete, "completion request");
    let completions = CompletionEngine::new(tree).resolve(&request.words, &request.to_complete);
    out.write_all(encode(&completions, request.descriptions).as_bytes())?;
    out.flush()?;
    Ok(())
}
