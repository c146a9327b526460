//! Startup banner and session summary display.

use std::path::Path;

use crate::consts::{AUTHOR, HOMEPAGE, REPO, format_number};
use crate::llm::TokenUsage;

/// What the banner reports about the session.
pub struct BannerInfo<'a> {
    /// `chat` or the address being served.
    pub mode: &'a str,
    pub model: &'a str,
    pub auth_status: &'a str,
    pub cases_dir: &'a Path,
    pub db: &'a str,
}

pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║            C O U N S E L              ║
   ║   strategic co-counsel, arbitration   ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   mode      {}
   model     {}
   auth      {}
   cases     {}
   db        {}
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.mode,
        info.model,
        info.auth_status,
        info.cases_dir.display(),
        info.db,
    );
}

/// Token line for a finished run, empty when nothing was spent.
pub fn usage_line(usage: TokenUsage) -> Option<String> {
    (usage.total() > 0).then(|| {
        format!(
            "session: {:>6} input + {:>6} output = {:>6} tokens",
            format_number(usage.input_tokens),
            format_number(usage.output_tokens),
            format_number(usage.total()),
        )
    })
}

/// Print the session summary (token usage + farewell).
pub fn print_session_summary(usage: TokenUsage) {
    if let Some(line) = usage_line(usage) {
        println!("{line}");
    }
    println!("goodbye.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn print_banner_does_not_panic() {
        print_banner(&BannerInfo {
            mode: "chat",
            model: "gemini-2.5-flash",
            auth_status: "not authenticated",
            cases_dir: &PathBuf::from("data/cases"),
            db: ":memory:",
        });
    }

    #[test]
    fn usage_line_formats_thousands() {
        let line = usage_line(TokenUsage {
            input_tokens: 1234,
            output_tokens: 567,
        })
        .unwrap();
        assert!(line.contains("1,234 input"));
        assert!(line.contains("1,801 tokens"));
    }

    #[test]
    fn usage_line_skipped_when_idle() {
        assert!(usage_line(TokenUsage::default()).is_none());
    }
}
