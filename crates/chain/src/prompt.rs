//! Deterministic prompt assembly.
//!
//! Renders a single instruction-plus-context block from the course label,
//! the catalog of namespaces the model may reference, the retrieved
//! documents, and the caller-supplied history text. Pure and total: no I/O,
//! no clock, no randomness — identical inputs always produce identical
//! output.
//!
//! The citation block is capped by a character budget. Budget enforcement
//! drops whole document lines, never a fragment: the first line that would
//! overflow is dropped and accumulation stops.

use lectern_core::{Namespace, RetrievalResult, RetrievedDocument};

/// All inputs required to assemble one prompt.
pub struct PromptInput<'a> {
    /// The user's question.
    pub question: &'a str,
    /// The course label scoping this call (the namespace filter).
    pub course_label: &'a str,
    /// Every namespace the model is told it may reference.
    pub catalog_namespaces: &'a [Namespace],
    /// Documents from this call's retrieval, in retrieval order.
    pub documents: &'a RetrievalResult,
    /// Raw history text supplied by the caller.
    pub history: &'a str,
}

/// Assembles the instruction payload handed to the generative model.
///
/// The output structure is a design contract with the model, not something
/// the pipeline parses back.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    character_budget: usize,
}

impl PromptAssembler {
    pub fn new(character_budget: usize) -> Self {
        Self { character_budget }
    }

    /// Render one document as a single normalized citation line.
    fn render_line(document: &RetrievedDocument) -> String {
        format!(
            "- Text: \"{}\", Source: \"{}\", Page Number: {}, Total Pages: {}",
            collapse_whitespace(&document.text),
            document.source,
            document.page_number,
            document.total_pages
        )
    }

    /// The citation block, capped at the character budget.
    ///
    /// Lines accumulate in retrieval order until the next line would push
    /// the block over budget; that line and every later document are
    /// silently omitted.
    pub fn citation_block(&self, documents: &RetrievalResult) -> String {
        let mut block = String::new();
        for document in documents.iter() {
            let line = Self::render_line(document);
            let needed = if block.is_empty() {
                line.len()
            } else {
                line.len() + 1
            };
            if block.len() + needed > self.character_budget {
                break;
            }
            if !block.is_empty() {
                block.push('\n');
            }
            block.push_str(&line);
        }
        block
    }

    /// Assemble the full prompt in fixed template order: course scoping,
    /// referenceable catalog, citation block, history.
    pub fn assemble(&self, input: &PromptInput<'_>) -> String {
        let catalog = input
            .catalog_namespaces
            .iter()
            .map(Namespace::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let citations = self.citation_block(input.documents);

        format!(
            "You are a study assistant for the class {course}. Your primary role is to engage in \
educational conversation and provide accurate, helpful answers grounded in the class materials \
you have access to. Never make up answers or give answers you are uncertain about; when \
uncertain, ask the user for more detail.\n\
\n\
The user's question is: {question}\n\
\n\
Contextual understanding:\n\
- You answer questions pertaining to the class {course} only. If the question is unrelated, \
tell the user that they have selected {course}, then answer as best you can in that context.\n\
- The class materials you have access to are: {catalog}.\n\
\n\
Course materials:\n\
{citations}\n\
\n\
Reference citing:\n\
- Select the most relevant course materials when developing your answer. Cite the source and \
page number in parentheses right where the citation is used, not grouped at the end. Never \
state information beyond the explicit content of the materials; if something is not elaborated \
there, state it as is without assumptions.\n\
\n\
Previous conversation:\n\
{history}\n\
- If the question continues a prior exchange, use the previous conversation to produce a \
comprehensive answer. If it is distinct from the history, transition to the new context.\n\
\n\
Formatting:\n\
- Surround any mathematical expression, notation, or variable with $ (for example: \
$ax^2 + bx + c = 0$).\n\
- Use bold for key terms, italics for titles, bullet points for lists, and numbered lists for \
sequences of steps. Keep responses clear, consistent, and easy to read.\n",
            course = input.course_label,
            question = input.question,
            catalog = catalog,
            citations = citations,
            history = input.history,
        )
    }
}

/// Collapse all runs of whitespace (including newlines) to single spaces.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
