//! C++ artifact generation
//!
//! Renders resolved shader stages into a translation unit the engine build
//! compiles directly. Three embedding strategies are supported:
//!
//! | Mode | Symbol | Content |
//! |------|--------|---------|
//! | [`EmbeddingMode::TextMulti`]  | `<Scope>::<stage>ShaderSrc` per stage | raw string literal |
//! | [`EmbeddingMode::TextSingle`] | one symbol, overridable               | raw string literal |
//! | [`EmbeddingMode::BinaryBlob`] | `<Scope>::<stage>Bin` per stage       | `std::vector<unsigned char>` |
//!
//! Writes are idempotent: an artifact whose bytes already match the rendered
//! output is left untouched.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Whether a stage produces text or a compiled binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StageKind {
    #[default]
    Text,
    Binary,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::Text => write!(f, "text"),
            StageKind::Binary => write!(f, "binary"),
        }
    }
}

/// Resolved content of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderContent {
    Text(String),
    Binary(Vec<u8>),
}

impl ShaderContent {
    pub fn kind(&self) -> StageKind {
        match self {
            ShaderContent::Text(_) => StageKind::Text,
            ShaderContent::Binary(_) => StageKind::Binary,
        }
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        match self {
            ShaderContent::Text(text) => text.len(),
            ShaderContent::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One named section of an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub content: ShaderContent,
}

impl Section {
    pub fn new(name: impl Into<String>, content: ShaderContent) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, ShaderContent::Text(text.into()))
    }

    pub fn binary(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(name, ShaderContent::Binary(bytes.into()))
    }
}

/// Embedding strategy for an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingMode {
    /// One raw string per stage
    TextMulti,
    /// A single raw string, optionally under a custom symbol name
    TextSingle { symbol: Option<String> },
    /// Byte arrays, optionally behind `#if <guard>`
    BinaryBlob { guard: Option<String> },
}

impl EmbeddingMode {
    pub fn label(&self) -> &'static str {
        match self {
            EmbeddingMode::TextMulti => "text-multi",
            EmbeddingMode::TextSingle { .. } => "text-single",
            EmbeddingMode::BinaryBlob { .. } => "binary-blob",
        }
    }

    /// Content kind every section must have in this mode
    pub fn content_kind(&self) -> StageKind {
        match self {
            EmbeddingMode::TextMulti | EmbeddingMode::TextSingle { .. } => StageKind::Text,
            EmbeddingMode::BinaryBlob { .. } => StageKind::Binary,
        }
    }
}

/// Names used in the generated translation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    /// Header declaring the scope type, e.g. `TracerX/Renderer.h`
    pub header: String,
    pub namespace: String,
    /// Type owning the generated static members, e.g. `Renderer`
    pub scope: String,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self {
            header: "TracerX/Renderer.h".to_string(),
            namespace: "TracerX".to_string(),
            scope: "Renderer".to_string(),
        }
    }
}

/// A rendered artifact and where it belongs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub content: String,
}

impl OutputArtifact {
    pub fn new(path: impl Into<PathBuf>, content: String) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }

    /// True if the file on disk holds exactly these bytes
    pub fn matches_disk(&self) -> bool {
        fs::read(&self.path).is_ok_and(|existing| existing == self.content.as_bytes())
    }

    /// Write the artifact unless the file already matches. Returns whether a
    /// write happened.
    pub fn write_if_changed(&self) -> Result<bool> {
        if self.matches_disk() {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, &self.content).map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(true)
    }
}

/// Renders sections into C++ and writes the result
#[derive(Debug, Clone, Default)]
pub struct CodeEmitter {
    layout: ArtifactLayout,
}

impl CodeEmitter {
    pub fn new(layout: ArtifactLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Render and write `sections` to `target`, skipping the write when the
    /// file is already up to date. Returns whether the file was written.
    pub fn emit(&self, target: &Path, sections: &[Section], mode: &EmbeddingMode) -> Result<bool> {
        let artifact = OutputArtifact::new(target, self.render(sections, mode)?);
        artifact.write_if_changed()
    }

    /// Render the complete artifact text
    pub fn render(&self, sections: &[Section], mode: &EmbeddingMode) -> Result<String> {
        check_sections(sections, mode)?;

        let mut out = format!(
            "#include <{}>\n\nusing namespace {};\n\n",
            self.layout.header, self.layout.namespace
        );

        let blocks: Vec<String> = match mode {
            EmbeddingMode::TextMulti => sections
                .iter()
                .map(|section| self.text_block(&format!("{}ShaderSrc", section.name), section, mode))
                .collect::<Result<_>>()?,
            EmbeddingMode::TextSingle { symbol } => {
                let section = &sections[0];
                let symbol = symbol
                    .clone()
                    .unwrap_or_else(|| format!("{}ShaderSrc", section.name));
                vec![self.text_block(&symbol, section, mode)?]
            }
            EmbeddingMode::BinaryBlob { .. } => sections
                .iter()
                .map(|section| self.binary_block(section))
                .collect(),
        };

        let guard = match mode {
            EmbeddingMode::BinaryBlob { guard } => guard.as_deref(),
            _ => None,
        };
        if let Some(guard) = guard {
            out.push_str(&format!("#if {guard}\n"));
        }
        out.push_str(&blocks.join("\n"));
        if guard.is_some() {
            out.push_str("#endif\n");
        }

        Ok(out)
    }

    fn text_block(&self, symbol: &str, section: &Section, mode: &EmbeddingMode) -> Result<String> {
        let text = match &section.content {
            ShaderContent::Text(text) => text.as_str(),
            ShaderContent::Binary(_) => "",
        };
        let delimiter = raw_delimiter(text).ok_or_else(|| Error::SectionMismatch {
            mode: mode.label(),
            reason: format!("stage {} (no raw string delimiter fits)", section.name),
        })?;
        Ok(format!(
            "const char* {}::{symbol} =\nR\"{delimiter}(\n{text}\n){delimiter}\";\n",
            self.layout.scope
        ))
    }

    fn binary_block(&self, section: &Section) -> String {
        let mut block = format!(
            "const std::vector<unsigned char> {}::{}Bin =\n{{\n",
            self.layout.scope, section.name
        );
        if let ShaderContent::Binary(bytes) = &section.content {
            for byte in bytes {
                block.push_str(&format!("    {byte},\n"));
            }
        }
        block.push_str("};\n");
        block
    }
}

fn check_sections(sections: &[Section], mode: &EmbeddingMode) -> Result<()> {
    let mismatch = |reason: String| Error::SectionMismatch {
        mode: mode.label(),
        reason,
    };

    if sections.is_empty() {
        return Err(mismatch("an empty section list".to_string()));
    }
    if matches!(mode, EmbeddingMode::TextSingle { .. }) && sections.len() != 1 {
        return Err(mismatch(format!("{} sections (expected 1)", sections.len())));
    }
    let expected = mode.content_kind();
    if let Some(section) = sections.iter().find(|s| s.content.kind() != expected) {
        return Err(mismatch(format!(
            "{} content for stage {}",
            section.content.kind(),
            section.name
        )));
    }
    Ok(())
}

/// Raw string delimiter that cannot clash with `text`.
///
/// Plain `R"(...)"` unless the text itself contains `)"`, then `shader`,
/// `shader0`, `shader1` and so on up to the 16 character limit of C++.
fn raw_delimiter(text: &str) -> Option<String> {
    const MAX_DELIMITER_LEN: usize = 16;

    std::iter::once(String::new())
        .chain(std::iter::once("shader".to_string()))
        .chain((0u64..).map(|n| format!("shader{n}")))
        .take_while(|delimiter| delimiter.len() <= MAX_DELIMITER_LEN)
        .find(|delimiter| !text.contains(&format!("){delimiter}\"")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter() -> CodeEmitter {
        CodeEmitter::default()
    }

    #[test]
    fn test_text_multi_layout() {
        let sections = vec![
            Section::text("accumulator", "void main() {}"),
            Section::text("vertex", "void main() { gl_Position = vec4(0.0); }"),
        ];
        let out = emitter().render(&sections, &EmbeddingMode::TextMulti).unwrap();
        assert_eq!(
            out,
            "#include <TracerX/Renderer.h>\n\
             \n\
             using namespace TracerX;\n\
             \n\
             const char* Renderer::accumulatorShaderSrc =\n\
             R\"(\n\
             void main() {}\n\
             )\";\n\
             \n\
             const char* Renderer::vertexShaderSrc =\n\
             R\"(\n\
             void main() { gl_Position = vec4(0.0); }\n\
             )\";\n"
        );
    }

    #[test]
    fn test_order_fidelity() {
        let sections = vec![
            Section::text("vertex", "v"),
            Section::text("toneMapper", "t"),
            Section::text("pathTracer", "p"),
        ];
        let out = emitter().render(&sections, &EmbeddingMode::TextMulti).unwrap();
        let vertex = out.find("Renderer::vertexShaderSrc").unwrap();
        let tone = out.find("Renderer::toneMapperShaderSrc").unwrap();
        let tracer = out.find("Renderer::pathTracerShaderSrc").unwrap();
        assert!(vertex < tone && tone < tracer);
    }

    #[test]
    fn test_text_single_symbol() {
        let sections = vec![Section::text("pathTracer", "layout(local_size_x = 8) in;")];

        let default = emitter()
            .render(&sections, &EmbeddingMode::TextSingle { symbol: None })
            .unwrap();
        assert!(default.contains("const char* Renderer::pathTracerShaderSrc =\n"));

        let custom = emitter()
            .render(
                &sections,
                &EmbeddingMode::TextSingle {
                    symbol: Some("computeShaderSrc".to_string()),
                },
            )
            .unwrap();
        assert!(custom.contains("const char* Renderer::computeShaderSrc =\n"));
        assert!(!custom.contains("pathTracerShaderSrc"));
    }

    #[test]
    fn test_text_single_requires_one_section() {
        let sections = vec![Section::text("a", "a"), Section::text("b", "b")];
        let err = emitter()
            .render(&sections, &EmbeddingMode::TextSingle { symbol: None })
            .unwrap_err();
        assert!(matches!(err, Error::SectionMismatch { mode: "text-single", .. }));
    }

    #[test]
    fn test_empty_sections_rejected() {
        assert!(emitter().render(&[], &EmbeddingMode::TextMulti).is_err());
    }

    #[test]
    fn test_binary_blob_with_guard() {
        let emitter = CodeEmitter::new(ArtifactLayout {
            header: "Engine/Renderer.h".to_string(),
            namespace: "Engine".to_string(),
            scope: "Renderer".to_string(),
        });
        let sections = vec![Section::binary("pathTracer", vec![3u8, 2, 35, 7])];
        let out = emitter
            .render(
                &sections,
                &EmbeddingMode::BinaryBlob {
                    guard: Some("ENGINE_SPIRV".to_string()),
                },
            )
            .unwrap();
        assert_eq!(
            out,
            "#include <Engine/Renderer.h>\n\
             \n\
             using namespace Engine;\n\
             \n\
             #if ENGINE_SPIRV\n\
             const std::vector<unsigned char> Renderer::pathTracerBin =\n\
             {\n    3,\n    2,\n    35,\n    7,\n};\n\
             #endif\n"
        );
    }

    #[test]
    fn test_binary_blob_without_guard() {
        let sections = vec![Section::binary("a", vec![255u8]), Section::binary("b", vec![0u8])];
        let out = emitter()
            .render(&sections, &EmbeddingMode::BinaryBlob { guard: None })
            .unwrap();
        assert!(!out.contains("#if"));
        assert!(out.contains("Renderer::aBin =\n{\n    255,\n};\n\nconst std::vector"));
    }

    #[test]
    fn test_content_kind_must_match_mode() {
        let err = emitter()
            .render(&[Section::binary("vertex", vec![1u8])], &EmbeddingMode::TextMulti)
            .unwrap_err();
        assert!(err.to_string().contains("binary content for stage vertex"));

        let err = emitter()
            .render(
                &[Section::text("vertex", "x")],
                &EmbeddingMode::BinaryBlob { guard: None },
            )
            .unwrap_err();
        assert!(err.to_string().contains("text content for stage vertex"));
    }

    #[test]
    fn test_raw_delimiter_avoids_clash() {
        let out = emitter()
            .render(&[Section::text("odd", "// ends with )\"")], &EmbeddingMode::TextMulti)
            .unwrap();
        assert!(out.contains("R\"shader(\n// ends with )\"\n)shader\";\n"));
    }

    #[test]
    fn test_raw_delimiter_skips_clashing_candidates() {
        let out = emitter()
            .render(
                &[Section::text("odd", "a)\" b)shader\" c")],
                &EmbeddingMode::TextSingle { symbol: None },
            )
            .unwrap();
        assert!(out.contains("R\"shader0(\na)\" b)shader\" c\n)shader0\";\n"));

        assert_eq!(raw_delimiter("x)\" )shader\" )shader0\""), Some("shader1".to_string()));
        assert_eq!(raw_delimiter("plain"), Some(String::new()));
    }

    #[test]
    fn test_emit_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("src").join("RendererShaderSrc.cpp");
        let sections = vec![Section::text("vertex", "void main() {}")];

        assert!(emitter().emit(&target, &sections, &EmbeddingMode::TextMulti).unwrap());
        let first = fs::metadata(&target).unwrap().modified().unwrap();
        let content = fs::read(&target).unwrap();

        assert!(!emitter().emit(&target, &sections, &EmbeddingMode::TextMulti).unwrap());
        assert_eq!(fs::metadata(&target).unwrap().modified().unwrap(), first);
        assert_eq!(fs::read(&target).unwrap(), content);
    }

    #[test]
    fn test_whitespace_difference_rewrites() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("out.cpp");
        let sections = vec![Section::text("vertex", "void main() {}")];
        let rendered = emitter().render(&sections, &EmbeddingMode::TextMulti).unwrap();

        fs::write(&target, format!("{rendered} ")).unwrap();
        assert!(emitter().emit(&target, &sections, &EmbeddingMode::TextMulti).unwrap());
        assert_eq!(fs::read_to_string(&target).unwrap(), rendered);
    }

    #[test]
    fn test_write_error_names_path() {
        let dir = tempfile::TempDir::new().unwrap();
        // A regular file where a parent directory is expected
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let target = blocker.join("out.cpp");

        let err = emitter()
            .emit(&target, &[Section::text("v", "v")], &EmbeddingMode::TextMulti)
            .unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
    }
}
