//! Markdown report to a standalone, styled HTML page.

use std::path::Path;

use anyhow::{Context, Result, bail};
use pulldown_cmark::{Options, Parser, html};
use tracing::info;

const STYLESHEET: &str = r#"
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
        line-height: 1.6;
        color: #343a40;
        background-color: #f8f9fa;
        margin: 0;
        padding: 20px;
    }
    .container {
        max-width: 850px;
        margin: 0 auto;
        background-color: #ffffff;
        padding: 40px;
        border-radius: 8px;
        box-shadow: 0 4px 12px rgba(0,0,0,0.08);
    }
    h1, h2, h3, h4, h5, h6 {
        color: #0056b3;
        font-weight: 600;
        border-bottom: 2px solid #e9ecef;
        padding-bottom: 10px;
        margin-top: 1.5em;
    }
    h1 { font-size: 2.2em; }
    h2 { font-size: 1.8em; }
    h3 { font-size: 1.5em; }
    h4 { font-size: 1.2em; border-bottom: 1px solid #e9ecef; }
    p { margin-bottom: 1.2em; }
    a { color: #007bff; text-decoration: none; }
    a:hover { text-decoration: underline; }
    table {
        width: 100%;
        border-collapse: collapse;
        margin-top: 1.5em;
        margin-bottom: 1.5em;
        box-shadow: 0 2px 4px rgba(0,0,0,0.05);
    }
    th, td {
        padding: 12px 15px;
        border: 1px solid #dee2e6;
        text-align: left;
    }
    th {
        background-color: #f2f2f2;
        font-weight: bold;
        color: #495057;
    }
    tr:nth-child(even) { background-color: #f8f9fa; }
    tr:hover { background-color: #e9ecef; }
    blockquote {
        border-left: 5px solid #007bff;
        padding: 15px 20px;
        margin: 25px 0;
        background-color: #f1f8ff;
        color: #333;
        font-style: italic;
    }
    code {
        background-color: #e9ecef;
        padding: 3px 5px;
        border-radius: 4px;
        font-family: "SFMono-Regular", Consolas, "Liberation Mono", Menlo, Courier, monospace;
    }
    hr {
        border: 0;
        height: 1px;
        background: #dee2e6;
        margin: 2.5em 0;
    }
"#;

/// Convert Markdown to an HTML fragment. GitHub-style tables are enabled.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Wrap a Markdown report in the full report page.
pub fn html_report(markdown: &str) -> String {
    let body = markdown_to_html(markdown);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Strategic Analysis Report</title>
    <style>{STYLESHEET}</style>
</head>
<body>
    <div class="container">
{body}
    </div>
</body>
</html>
"#
    )
}

/// Read `input` (Markdown) and write the styled page to `output`.
pub fn render_report_file(input: &Path, output: &Path) -> Result<()> {
    if !input.exists() {
        bail!("{} not found", input.display());
    }
    let markdown = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    std::fs::write(output, html_report(&markdown))
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(path = %output.display(), "generated HTML report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_headings_and_emphasis() {
        let html = markdown_to_html("# Title\n\nSome **bold** text.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn converts_tables() {
        let html = markdown_to_html("| Case | Outcome |\n|---|---|\n| Burlington | Upheld |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>Case</th>"));
        assert!(html.contains("<td>Burlington</td>"));
    }

    #[test]
    fn report_page_has_title_style_and_body() {
        let page = html_report("## Findings");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Strategic Analysis Report</title>"));
        assert!(page.contains("border-collapse: collapse;"));
        assert!(page.contains("<div class=\"container\">"));
        assert!(page.contains("<h2>Findings</h2>"));
    }

    #[test]
    fn render_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.md");
        let output = dir.path().join("report.html");
        std::fs::write(&input, "# Report").unwrap();

        render_report_file(&input, &output).unwrap();
        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("<h1>Report</h1>"));
    }

    #[test]
    fn render_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_report_file(&dir.path().join("report.md"), &dir.path().join("out.html"))
            .unwrap_err();
        assert!(err.to_string().contains("report.md not found"));
    }
}
