use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prompt handed to the default `llm` engine.
pub const DEFAULT_OCR_PROMPT: &str = "OCR the attached file into Markdown. \
Make sure to use Markdown formatting for headings, lists, and paragraphs. \
If you encounter math or greek symbols, please use LaTeX format delimited by $ or $$. \
If you encounter tables, please use Markdown table format. \
If you encounter code, please use Markdown code block format. Only use code blocks for code. \
If you encounter a simple diagram, please use a mermaid code block. \
Do not add any commentary or delimiters to your response.";

/// User configuration from `OcrDrop Config.yaml`, overridable from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserConfig {
    pub ocr: OcrSettings,
    pub export: ExportSettings,
    pub logging: LogSettings,
}

/// External OCR engine invocation.
///
/// Each argument may contain `{path}`, `{model}` and `{prompt}` placeholders, which
/// are substituted per file before the program is spawned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub program: String,
    pub args: Vec<String>,
    pub model: String,
    pub prompt: String,
    pub timeout_secs: u64,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            program: "llm".to_string(),
            args: ["prompt", "-m", "{model}", "-a", "{path}", "{prompt}"]
                .iter()
                .map(|arg| arg.to_string())
                .collect(),
            model: "gemini-2.0-flash".to_string(),
            prompt: DEFAULT_OCR_PROMPT.to_string(),
            timeout_secs: 300,
        }
    }
}

impl OcrSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Extension replacing the source file's extension on export.
    pub extension: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            extension: "md".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub dir: String,
    pub prefix: String,
    pub debug: bool,
    /// Mirror log output to stderr.
    pub console: bool,
    /// Write the log file as JSON lines.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            prefix: "ocrdrop".to_string(),
            debug: false,
            console: true,
            json: false,
        }
    }
}
