use crate::pipeline::chunker::Chunk;

/// What the model must say when the context lacks the answer.
pub const REFUSAL: &str = "I don't know based on the given information.";

const TEMPLATE: &str = r#"You are a helpful assistant answering questions about the documents in the context below.

### Answering Guidelines
- Use ONLY information found in the context.
- Never invent facts, names, dates, or numbers.
- If the answer is not in the context, reply exactly: "{refusal}"
- Explain your reasoning when the question needs several steps.

### Context
The context is text extracted from one or more PDF documents. Some passages begin with the document's title, author, or subject.

{context}

---

### Examples

Q: What is the main finding of the paper?
A: The context states, "Our primary finding was a correlation between X and Y." So the main finding is the correlation between X and Y.

Q: Who is the author?
A: {refusal}

---

Based ONLY on the context above, answer the following question.

Q: {question}
A:"#;

/// Context block handed to the oracle: chunk contents separated by blank lines.
pub fn build_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(Chunk::content)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the full prompt for `question` over `chunks`.
///
/// Placeholders are filled in one pass, so braces inside the context or the
/// question are left alone.
pub fn render(chunks: &[Chunk], question: &str) -> String {
    let template = TEMPLATE.replace("{refusal}", REFUSAL);
    let (head, tail) = template.split_once("{context}").unwrap_or((template.as_str(), ""));
    let tail = tail.replacen("{question}", question, 1);
    format!("{head}{}{tail}", build_context(chunks))
}
