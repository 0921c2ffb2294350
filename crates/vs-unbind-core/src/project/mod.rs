//! Removal of `Scc*` bindings from MSBuild-style project files.

pub mod document;

pub use document::{ProjectDocument, XmlAttribute, XmlDeclaration, XmlElement, XmlNode};

use crate::encoding::{LineEnding, TextEncoding};
use crate::error::Error;
use crate::platform::WritableGuard;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Local-name prefix of every source-control binding element and attribute.
pub const SCC_PREFIX: &str = "Scc";

pub const DEFAULT_INDENT: usize = 2;

/// Bytes decoded from disk plus what was learned about their encoding.
#[derive(Debug)]
pub struct DecodedProject {
    pub text: String,
    /// Encoding the bytes were actually read with.
    pub detected: TextEncoding,
}

/// Decodes project bytes: BOM first, then a non-UTF declared encoding, then UTF-8.
pub fn decode_project(bytes: &[u8]) -> Result<DecodedProject, Error> {
    if let Some((detected, bom_len)) = TextEncoding::sniff_bom(bytes) {
        let text = detected.decode(&bytes[bom_len..])?;
        return Ok(DecodedProject { text, detected });
    }

    let detected = match sniff_declared_encoding(bytes).and_then(|label| TextEncoding::for_label(&label)) {
        Some(legacy @ TextEncoding::Legacy(_)) => legacy,
        _ => TextEncoding::Utf8 { bom: false },
    };
    let text = detected.decode(bytes)?;
    Ok(DecodedProject { text, detected })
}

/// Reads `encoding="..."` from an ASCII-compatible XML declaration.
fn sniff_declared_encoding(bytes: &[u8]) -> Option<String> {
    let end = bytes.windows(2).position(|pair| pair == b"?>")?;
    let header = std::str::from_utf8(&bytes[..end]).ok()?;
    let header = header.trim_start().strip_prefix("<?xml")?;
    let after = &header[header.find("encoding")? + "encoding".len()..];
    let after = after.trim_start().strip_prefix('=')?.trim_start();
    let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &after[1..];
    Some(value[..value.find(quote)?].to_string())
}

/// Encoding to write with, and the label to put in the declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEncoding {
    pub encoding: TextEncoding,
    pub declared: Option<String>,
}

/// Picks the output encoding from the declaration and what was detected:
/// no declared encoding means UTF-8 without BOM and no label; a `utf*`
/// label keeps the detected encoding; anything else is honoured as named.
pub fn output_encoding(
    declared: Option<&str>,
    detected: TextEncoding,
) -> Result<OutputEncoding, Error> {
    let Some(label) = declared.filter(|label| !label.trim().is_empty()) else {
        return Ok(OutputEncoding {
            encoding: TextEncoding::Utf8 { bom: false },
            declared: None,
        });
    };

    let encoding = if label.to_lowercase().starts_with("utf") {
        detected
    } else {
        TextEncoding::for_label(label)
            .ok_or_else(|| Error::UnsupportedEncoding(label.to_string()))?
    };

    Ok(OutputEncoding {
        encoding,
        declared: Some(label.to_string()),
    })
}

/// Strips `Scc*` nodes from project text and re-serializes it. Returns the
/// new text and the encoding it must be written in.
pub fn sanitize_project_text(
    decoded: &DecodedProject,
    indent: usize,
) -> Result<(String, OutputEncoding), Error> {
    let mut doc = ProjectDocument::parse(&decoded.text)?;
    let removed = doc.remove_prefixed(SCC_PREFIX);
    debug!("Removed {} source control node(s)", removed);

    let output = output_encoding(doc.declared_encoding(), decoded.detected)?;
    let xml = doc.to_xml(indent, output.declared.as_deref())?;

    let xml = match LineEnding::detect(&decoded.text) {
        LineEnding::CrLf => xml.replace("\r\n", "\n").replace('\n', "\r\n"),
        LineEnding::Lf => xml,
    };
    Ok((xml, output))
}

/// Rewrites a project file in place without its source-control bindings.
pub fn sanitize_project_file(path: &Path, indent: usize) -> Result<(), Error> {
    if !path.to_string_lossy().to_lowercase().ends_with("proj") {
        return Err(Error::NotAProject(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    let decoded = decode_project(&bytes)?;
    let (xml, output) = sanitize_project_text(&decoded, indent)?;

    debug!(
        "Writing {} as {} (read as {})",
        path.display(),
        output.encoding.name(),
        decoded.detected.name()
    );

    let _guard = WritableGuard::acquire(path)?;
    fs::write(path, output.encoding.encode(&xml))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    fn decoded(text: &str) -> DecodedProject {
        decode_project(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_sniff_declared_encoding() {
        assert_eq!(
            sniff_declared_encoding(b"<?xml version=\"1.0\" encoding=\"Windows-1252\"?><a/>"),
            Some("Windows-1252".to_string())
        );
        assert_eq!(
            sniff_declared_encoding(b"<?xml version='1.0' encoding = 'utf-8' ?><a/>"),
            Some("utf-8".to_string())
        );
        assert_eq!(sniff_declared_encoding(b"<?xml version=\"1.0\"?><a/>"), None);
        assert_eq!(sniff_declared_encoding(b"<a/>"), None);
    }

    #[test]
    fn test_output_encoding_without_declaration() {
        let output = output_encoding(None, TextEncoding::Utf8 { bom: true }).unwrap();
        assert_eq!(output.encoding, TextEncoding::Utf8 { bom: false });
        assert_eq!(output.declared, None);
    }

    #[test]
    fn test_output_encoding_utf_uses_detected() {
        let output = output_encoding(Some("UTF-8"), TextEncoding::Utf8 { bom: true }).unwrap();
        assert_eq!(output.encoding, TextEncoding::Utf8 { bom: true });
        assert_eq!(output.declared.as_deref(), Some("UTF-8"));

        let output = output_encoding(Some("utf-16"), TextEncoding::Utf16Le).unwrap();
        assert_eq!(output.encoding, TextEncoding::Utf16Le);
    }

    #[test]
    fn test_output_encoding_named_code_page() {
        let output =
            output_encoding(Some("windows-1252"), TextEncoding::Utf8 { bom: false }).unwrap();
        assert_eq!(output.encoding, TextEncoding::Legacy(WINDOWS_1252));
        assert!(matches!(
            output_encoding(Some("x-made-up"), TextEncoding::Utf8 { bom: false }),
            Err(Error::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_sanitize_removes_scc_element() {
        let input = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\r\n<Project ToolsVersion=\"4.0\" xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">\r\n  <PropertyGroup>\r\n    <AssemblyName>App</AssemblyName>\r\n    <SccProjectName>X</SccProjectName>\r\n    <SccLocalPath>.</SccLocalPath>\r\n  </PropertyGroup>\r\n</Project>";
        let (xml, output) = sanitize_project_text(&decoded(input), DEFAULT_INDENT).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\r\n<Project ToolsVersion=\"4.0\" xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">\r\n  <PropertyGroup>\r\n    <AssemblyName>App</AssemblyName>\r\n  </PropertyGroup>\r\n</Project>"
        );
        assert_eq!(output.encoding, TextEncoding::Utf8 { bom: false });
    }

    #[test]
    fn test_sanitize_removes_nested_scc_attributes() {
        let input = "<Project><ItemGroup><Reference Include=\"A\" SccProvider=\"p\"><Private>True</Private></Reference></ItemGroup></Project>";
        let (xml, _) = sanitize_project_text(&decoded(input), DEFAULT_INDENT).unwrap();
        assert!(!xml.contains("Scc"));
        assert!(xml.contains("<Reference Include=\"A\">"));
        assert!(xml.contains("<Private>True</Private>"));
    }

    #[test]
    fn test_sanitize_without_scc_keeps_structure() {
        let input = "<Project>\n  <PropertyGroup Condition=\" '$(Configuration)' == 'Debug' \">\n    <Optimize>false</Optimize>\n  </PropertyGroup>\n  <Import Project=\"$(MSBuildToolsPath)\\Microsoft.CSharp.targets\" />\n</Project>";
        let (xml, _) = sanitize_project_text(&decoded(input), DEFAULT_INDENT).unwrap();
        let before = ProjectDocument::parse(input).unwrap();
        let after = ProjectDocument::parse(&xml).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_decode_project_honours_legacy_declaration() {
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"windows-1252\"?><Project><Company>".to_vec();
        bytes.push(0xE9); // é
        bytes.extend_from_slice(b"</Company></Project>");

        let decoded = decode_project(&bytes).unwrap();
        assert_eq!(decoded.detected, TextEncoding::Legacy(WINDOWS_1252));
        assert!(decoded.text.contains("<Company>é</Company>"));

        let (xml, output) = sanitize_project_text(&decoded, DEFAULT_INDENT).unwrap();
        assert_eq!(output.encoding, TextEncoding::Legacy(WINDOWS_1252));
        assert!(output.encoding.encode(&xml).contains(&0xE9));
    }

    #[test]
    fn test_sanitize_rejects_non_project() {
        let err = sanitize_project_file(Path::new("App.sln"), DEFAULT_INDENT).unwrap_err();
        assert!(matches!(err, Error::NotAProject(_)));
    }
}
