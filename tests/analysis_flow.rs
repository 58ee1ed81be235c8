//! E2E Test: Question-to-Answer Analysis Flow
//!
//! Tests the full pipeline: Question -> Router -> Handler -> Prompt ->
//! Model -> Reply Parser -> Message Log, with a scripted model standing in
//! for the Gemini service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sheet_analyst::{
    init_tracing, AnalysisModel, AnalysisSession, CellValue, ChartType, Dataset, MessageRole,
    ModelConfig, ModelError, ModelResult, Row, Sheet,
};

/// Scripted stand-in for the model service. Records every prompt it sees
/// and pops one canned result per call.
struct MockModel {
    config: ModelConfig,
    replies: Mutex<VecDeque<ModelResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockModel {
    fn new(replies: Vec<ModelResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            config: ModelConfig::new("test-key", "mock-model"),
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn reply(text: &str) -> Arc<Self> {
        Self::new(vec![Ok(text.to_string())])
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisModel for MockModel {
    async fn complete(&self, prompt: &str) -> ModelResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}

fn row(pairs: &[(&str, CellValue)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn units() -> Dataset {
    let sheet = Sheet::new(
        "Units",
        vec![
            "Name".to_string(),
            "Faction".to_string(),
            "Attack".to_string(),
        ],
    )
    .with_row(row(&[
        ("Name", CellValue::from("A")),
        ("Faction", CellValue::from("red")),
        ("Attack", CellValue::Number(10.0)),
    ]))
    .with_row(row(&[
        ("Name", CellValue::from("B")),
        ("Faction", CellValue::from("blue")),
        ("Attack", CellValue::Number(50.0)),
    ]))
    .with_row(row(&[
        ("Name", CellValue::from("C")),
        ("Faction", CellValue::from("red")),
        ("Attack", CellValue::Number(30.0)),
    ]));
    Dataset::new("units.xlsx").with_sheet(sheet)
}

#[tokio::test]
async fn test_top_three_flow() -> anyhow::Result<()> {
    init_tracing();

    let model = MockModel::reply("B leads, then C, then A.");
    let mut session = AnalysisSession::new(model.clone());
    session.load_dataset(units());

    let message = session.ask("top 3 by Attack").await?;
    assert_eq!(message.content, "B leads, then C, then A.");

    // The ranking ran before the model saw anything.
    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("## Computed Results"));
    assert!(prompts[0].contains("  1. B: 50"));
    assert!(prompts[0].contains("  2. C: 30"));
    assert!(prompts[0].contains("  3. A: 10"));
    assert!(prompts[0].trim_end().ends_with("top 3 by Attack"));

    // The handler chart rides along since the reply carried none.
    let chart = message.chart.expect("ranking chart expected");
    assert_eq!(chart.chart_type, ChartType::Bar);
    assert_eq!(chart.x_key.as_deref(), Some("Name"));
    assert_eq!(chart.y_key.as_deref(), Some("Attack"));
    assert_eq!(chart.data.len(), 3);
    assert_eq!(chart.data[0]["Name"], serde_json::json!("B"));

    assert_eq!(session.messages().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_condition_filter_flow() -> anyhow::Result<()> {
    init_tracing();

    let model = MockModel::reply("Two rows are above 20: B and C.");
    let mut session = AnalysisSession::new(model.clone());
    session.load_dataset(units());

    session.ask("which rows have Attack above 20?").await?;

    let prompts = model.prompts();
    assert!(prompts[0].contains("2 of 3 rows match Attack > 20"));
    assert!(prompts[0].contains("- B: 50"));
    assert!(prompts[0].contains("- C: 30"));
    assert!(!prompts[0].contains("- A: 10"));
    Ok(())
}

#[tokio::test]
async fn test_chart_spec_reply_round_trip() -> anyhow::Result<()> {
    init_tracing();

    let reply = concat!(
        "Attack split by unit shown below.\n",
        "CHART_SPEC: {\"type\":\"pie\",\"title\":\"Attack share\",",
        "\"data\":[{\"Name\":\"B\",\"Attack\":50}],",
        "\"nameKey\":\"Name\",\"dataKey\":\"Attack\"}",
    );
    let model = MockModel::reply(reply);
    let mut session = AnalysisSession::new(model);
    session.load_dataset(units());

    let message = session.ask("pie chart of attack by unit").await?;
    assert_eq!(message.content, "Attack split by unit shown below.");

    let chart = message.chart.expect("pie chart expected");
    assert_eq!(chart.chart_type, ChartType::Pie);
    assert_eq!(chart.title, "Attack share");
    assert_eq!(chart.name_key.as_deref(), Some("Name"));
    Ok(())
}

#[tokio::test]
async fn test_upstream_error_becomes_log_entry() {
    init_tracing();

    let model = MockModel::new(vec![Err(ModelError::api("HTTP 500: backend down"))]);
    let mut session = AnalysisSession::new(model);
    session.load_dataset(units());

    let message = session
        .ask("top 2 by attack")
        .await
        .expect("upstream errors must not propagate");
    assert_eq!(message.role, MessageRole::Assistant);
    assert!(message.content.contains("HTTP 500"));
    assert!(message.chart.is_none());

    let log = session.messages();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].role, MessageRole::User);
    assert_eq!(log[1].role, MessageRole::Assistant);
}

#[tokio::test]
async fn test_describe_then_ask_flow() -> anyhow::Result<()> {
    init_tracing();

    let model = MockModel::new(vec![
        Ok("One sheet of unit stats.".to_string()),
        Ok("B has the highest attack at 50.".to_string()),
    ]);
    let mut session = AnalysisSession::new(model.clone());
    session.load_dataset(units());

    let overview = session.describe_dataset().await?;
    assert_eq!(overview.content, "One sheet of unit stats.");

    session.ask("which unit has the highest attack?").await?;

    // The canned describe question stays out of the visible log.
    assert_eq!(session.messages().len(), 4);
    assert_eq!(session.visible_messages().len(), 3);
    assert!(!session.messages()[0].visible);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    // Overview turn is preview-only; the extremum turn carries results.
    assert!(!prompts[0].contains("## Computed Results"));
    assert!(prompts[1].contains("## Computed Results"));
    assert!(prompts[1].contains("highest Attack"));
    Ok(())
}

#[tokio::test]
async fn test_unrouted_question_sends_preview_only() -> anyhow::Result<()> {
    init_tracing();

    let model = MockModel::reply("It is a small table of three units.");
    let mut session = AnalysisSession::new(model.clone());
    session.load_dataset(units());

    let message = session.ask("what is this data about?").await?;
    assert!(message.chart.is_none());

    let prompts = model.prompts();
    assert!(!prompts[0].contains("## Computed Results"));
    assert!(prompts[0].contains("### Sheet \"Units\" (3 rows, 3 columns)"));
    Ok(())
}

#[tokio::test]
async fn test_ask_before_load_fails() {
    init_tracing();

    let model = MockModel::reply("unused");
    let mut session = AnalysisSession::new(model.clone());

    let result = session.ask("top 3 by attack").await;
    assert!(result.is_err());
    assert!(model.prompts().is_empty());
}
