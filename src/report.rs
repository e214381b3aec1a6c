//! # Report Renderer
//! Fixed-shape markdown report built from a parsed analysis.

use crate::analyze::AnalysisResult;

/// Bullets rendered per section; shorter lists are padded with [`PLACEHOLDER`].
pub const BULLETS_PER_SECTION: usize = 2;
pub const PLACEHOLDER: &str = "-";
pub const REPORT_REGION: &str = "India";
pub const FOOTER: &str = "Generated automatically.";

/// `"information technology"` -> `"Information technology"`.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn padded(items: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = items
        .iter()
        .take(BULLETS_PER_SECTION)
        .map(String::as_str)
        .collect();
    out.resize(BULLETS_PER_SECTION, PLACEHOLDER);
    out
}

/// Render the report. Pure: identical input gives byte-identical output.
pub fn render_markdown(sector: &str, analysis: &AnalysisResult) -> String {
    let opps = padded(&analysis.opportunities);
    let risks = padded(&analysis.risks);

    format!(
        "\n# {title} Sector Market Report - {REPORT_REGION}\n\
         \n\
         ## Summary\n\
         {summary}\n\
         \n\
         ---\n\
         \n\
         ### Opportunities\n\
         - {o0}\n\
         - {o1}\n\
         \n\
         ### Risks\n\
         - {r0}\n\
         - {r1}\n\
         \n\
         {FOOTER}\n",
        title = capitalize(sector),
        summary = analysis.summary,
        o0 = opps[0],
        o1 = opps[1],
        r0 = risks[0],
        r1 = risks[1],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(opps: &[&str], risks: &[&str]) -> AnalysisResult {
        AnalysisResult {
            summary: "Demand is strong.".into(),
            opportunities: opps.iter().map(|s| s.to_string()).collect(),
            risks: risks.iter().map(|s| s.to_string()).collect(),
            raw_response_text: String::new(),
        }
    }

    #[test]
    fn renders_full_template() {
        let md = render_markdown("information technology", &analysis(&["A", "B"], &["C", "D"]));
        let expected = "\n# Information technology Sector Market Report - India\n\n## Summary\nDemand is strong.\n\n---\n\n### Opportunities\n- A\n- B\n\n### Risks\n- C\n- D\n\nGenerated automatically.\n";
        assert_eq!(md, expected);
    }

    #[test]
    fn pads_missing_entries_and_drops_extra() {
        let md = render_markdown("steel", &analysis(&["A", "B", "C"], &[]));
        assert!(md.contains("### Opportunities\n- A\n- B\n\n"));
        assert!(!md.contains("- C"));
        assert!(md.contains("### Risks\n- -\n- -\n"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let a = analysis(&["x"], &["y"]);
        assert_eq!(render_markdown("pharma", &a), render_markdown("pharma", &a));
    }

    #[test]
    fn capitalize_lowercases_the_rest() {
        assert_eq!(capitalize("REAL Estate"), "Real estate");
        assert_eq!(capitalize(""), "");
    }
}
