//! Prompt Assembly
//!
//! Builds the single prompt sent to the model for each question: a role
//! preamble naming the uploaded file, a bounded per-sheet preview of the
//! dataset, any precomputed analysis, the answer-format contract, and the
//! question itself.
//!
//! The preview is capped at [`PREVIEW_ROWS`] rows per sheet so prompt size
//! grows with sheet count rather than row count; whole-dataset answers come
//! from the computed-results section, which the handlers derive from every
//! row.

use analyst_types::Dataset;

use crate::handlers::{row_record, Analysis};

/// Rows shown per sheet in the dataset preview.
pub const PREVIEW_ROWS: usize = 5;

/// Fixed answer-format contract, appended to every prompt. The reply
/// parser depends on the exact `CHART_SPEC:` sentinel named here.
const ANSWER_INSTRUCTIONS: &str = r#"
## Answer Format
1. Answer in plain, concise prose.
2. Where computed results are provided above, present them as authoritative. Do not recompute them and never tell the user to do the calculation themselves.
3. If a chart would help the answer, or one was explicitly requested, finish with a single line that starts with exactly CHART_SPEC: followed by one JSON object.
4. The chart JSON must contain "type" (one of "bar", "line", "pie", "area"), "title", and "data" (an array of flat records). Bar, line, and area charts also need "xKey" and "yKey"; pie charts need "nameKey" and "dataKey".
5. Output nothing after the JSON object, and at most one chart per answer.
"#;

/// Assemble the full prompt for one question.
///
/// Pure string assembly; the same dataset, analysis, and question always
/// produce the same prompt.
pub fn build_analysis_prompt(
    dataset: &Dataset,
    analysis: Option<&Analysis>,
    question: &str,
) -> String {
    let mut prompt = format!(
        "You are a data analyst answering questions about the spreadsheet file \"{}\".\n\
        Base every statement on the data provided below. Do not invent rows or columns.\n",
        dataset.file_name
    );

    prompt.push_str(&build_dataset_section(dataset));
    if let Some(analysis) = analysis {
        prompt.push_str(&build_analysis_section(analysis));
    }
    prompt.push_str(ANSWER_INSTRUCTIONS);
    prompt.push_str(&format!("\n## Question\n{}\n", question));
    prompt
}

/// Prompt asking the model for starter questions about the dataset.
/// Preview only, no analysis; the reply is expected as a numbered list.
pub fn build_suggestions_prompt(dataset: &Dataset) -> String {
    let mut prompt = format!(
        "You are a data analyst looking at the spreadsheet file \"{}\".\n",
        dataset.file_name
    );
    prompt.push_str(&build_dataset_section(dataset));
    prompt.push_str(
        "\nSuggest up to 5 short analytical questions a user could ask about this data.\n\
        Number them 1 to 5, one question per line, and output nothing else.\n",
    );
    prompt
}

/// Per-sheet preview: name, dimensions, column order, and the first
/// [`PREVIEW_ROWS`] rows as single-line JSON records.
fn build_dataset_section(dataset: &Dataset) -> String {
    let mut section = String::from("\n## Dataset\n");

    for sheet in &dataset.sheets {
        section.push_str(&format!(
            "\n### Sheet \"{}\" ({} rows, {} columns)\n",
            sheet.name,
            sheet.row_count(),
            sheet.columns.len()
        ));
        section.push_str(&format!("Columns: {}\n", sheet.columns.join(", ")));
        if sheet.is_empty() {
            continue;
        }

        section.push_str("Sample rows (JSON):\n");
        for row in sheet.rows.iter().take(PREVIEW_ROWS) {
            let record = row_record(sheet, row);
            let line = serde_json::to_string(&record).unwrap_or_else(|_| "{}".to_string());
            section.push_str(&line);
            section.push('\n');
        }
        if sheet.row_count() > PREVIEW_ROWS {
            section.push_str(&format!(
                "... and {} more rows not shown\n",
                sheet.row_count() - PREVIEW_ROWS
            ));
        }
    }

    section
}

fn build_analysis_section(analysis: &Analysis) -> String {
    let mut section = String::from(
        "\n## Computed Results\n\
        These results were computed deterministically over the full dataset, not just\n\
        the sample rows above. Present them as the answer instead of recomputing.\n\n",
    );
    section.push_str(&analysis.summary);
    section.push('\n');
    section
}
