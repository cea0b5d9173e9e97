use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pdfqa_lib::config::AppConfig;
use pdfqa_lib::embedding::{Embed, l2_normalize};
use pdfqa_lib::error::OracleError;
use pdfqa_lib::oracle::AnswerOracle;
use pdfqa_test_util::pdf::{PdfFixture, write_pdf};

use crate::output::BufferedIO;
use crate::runtime::{Backend, Runtime};

const KEYWORD_MODEL_ID: &str = "test/keyword-32";
const KEYWORD_DIMENSION: usize = 32;

/// Bag-of-words embedder: each lowercase word adds weight to a hashed bucket.
struct KeywordEmbedder {
    calls: Arc<AtomicUsize>,
}

impl Embed for KeywordEmbedder {
    fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|text| keyword_vector(text)).collect())
    }

    fn model_id(&self) -> &str {
        KEYWORD_MODEL_ID
    }

    fn dimension(&self) -> usize {
        KEYWORD_DIMENSION
    }
}

fn keyword_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; KEYWORD_DIMENSION];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
                (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
            });
        vector[(hash % KEYWORD_DIMENSION as u64) as usize] += 1.0;
    }
    l2_normalize(&mut vector);
    vector
}

/// Oracle that records prompts and returns a canned answer, or fails.
struct RecordingOracle {
    answer: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl AnswerOracle for RecordingOracle {
    fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
            .clone()
            .ok_or_else(|| OracleError::Unreachable("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// [`Backend`] with no model files or network access.
pub struct FakeBackend {
    answer: Option<String>,
    /// Number of texts embedded across every embedder this backend handed out.
    pub embed_calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeBackend {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            embed_calls: Arc::default(),
            prompts: Arc::default(),
        }
    }

    /// Every oracle call fails as if the server were down.
    pub fn failing() -> Self {
        Self {
            answer: None,
            ..Self::answering("")
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Backend for FakeBackend {
    fn model_id(&self) -> String {
        KEYWORD_MODEL_ID.to_string()
    }

    fn embedder(&self, _config: &AppConfig) -> anyhow::Result<Box<dyn Embed>> {
        Ok(Box::new(KeywordEmbedder {
            calls: Arc::clone(&self.embed_calls),
        }))
    }

    fn oracle(&self, _config: &AppConfig) -> anyhow::Result<Arc<dyn AnswerOracle>> {
        Ok(Arc::new(RecordingOracle {
            answer: self.answer.clone(),
            prompts: Arc::clone(&self.prompts),
        }))
    }
}

/// Create a base directory with a three-page corpus under `documents/`.
///
/// The caller must hold the returned [`tempfile::TempDir`] to keep the
/// directory alive for the duration of the test.
pub fn corpus_runtime(backend: &FakeBackend) -> (tempfile::TempDir, Runtime<'_>) {
    let tmp = tempfile::tempdir().unwrap();
    let documents = tmp.path().join("documents");
    std::fs::create_dir_all(&documents).unwrap();
    write_pdf(
        &documents.join("manual.pdf"),
        &PdfFixture {
            pages: vec![
                "The relief valve pressure limit is 40 bar.",
                "Calibrate the pressure sensor every 90 days.",
            ],
            title: Some("Operator Manual"),
            author: None,
            subject: None,
        },
    );
    write_pdf(
        &documents.join("notes.pdf"),
        &PdfFixture::pages(&["Shift handover notes mention the torque wrench."]),
    );

    let mut config = AppConfig::default();
    config.paths.base_dir = tmp.path().to_path_buf();
    (tmp, Runtime::new(config, backend))
}

/// Run the CLI with `args` against `backend`.
pub fn run_args(args: &[&str], backend: &FakeBackend, io: &mut BufferedIO) -> anyhow::Result<()> {
    crate::try_run(args, backend, io)
}

/// Strip margin markers from a multi-line string (Kotlin-style `trimMargin`).
///
/// Each line is scanned for the first `|` character after optional leading
/// whitespace. Everything before and including the `|` is removed. Lines that
/// do not contain a leading `|` are dropped. Use `\|` for a literal `|`.
///
/// Prefer the [`trim_margin!`] macro which wraps `format!` for convenience.
pub fn _trim_margin(s: &str) -> String {
    s.lines()
        .filter_map(|line| {
            line.trim_start()
                .strip_prefix('|')
                .map(|rest| rest.replace("\\|", "|"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build a margin-trimmed string with `format!`-style interpolation.
macro_rules! trim_margin {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::test_util::_trim_margin(&format!($fmt $(, $arg)*))
    };
}
pub(crate) use trim_margin;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_margin_keeps_trailing_space() {
        let result = _trim_margin(
            "|line one
             |  line two
             |> ",
        );
        assert_eq!(result, "line one\n  line two\n> ");
    }

    #[test]
    fn trim_margin_escaped_pipe() {
        assert_eq!(_trim_margin("|a \\| b\n|c"), "a | b\nc");
    }

    #[test]
    fn keyword_vectors_share_words() {
        let a = keyword_vector("valve pressure");
        let b = keyword_vector("Pressure of the VALVE");
        let c = keyword_vector("torque wrench");
        let dot = |x: &[f32], y: &[f32]| x.iter().zip(y).map(|(p, q)| p * q).sum::<f32>();
        assert!(dot(&a, &b) > dot(&a, &c));
    }

    #[test]
    fn corpus_has_three_pages() {
        let backend = FakeBackend::answering("x");
        let (tmp, runtime) = corpus_runtime(&backend);
        let documents = tmp.path().join("documents");
        assert!(documents.join("manual.pdf").is_file());
        assert!(documents.join("notes.pdf").is_file());
        assert_eq!(runtime.config.paths.documents_path(), documents);
    }
}
