//! Report Module
//! Renders the insights of one content type plus its full record list into
//! a sectioned CSV document for spreadsheet tools.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::content::{ContentItem, ContentKind};
use crate::insights::Insights;

/// Lets spreadsheet tools detect UTF-8 on open.
pub const UTF8_BOM: char = '\u{feff}';

pub const DEFAULT_DATA_SOURCE: &str = "GLEC Admin API";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// When and from where a report was produced.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub generated_at: DateTime<FixedOffset>,
    pub data_source: String,
}

impl ReportContext {
    pub fn new(generated_at: DateTime<FixedOffset>) -> Self {
        Self {
            generated_at,
            data_source: DEFAULT_DATA_SOURCE.to_string(),
        }
    }

    pub fn with_data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = data_source.into();
        self
    }

    /// Date used in the report file name. Always the UTC calendar day.
    pub fn file_date(&self) -> NaiveDate {
        self.generated_at.with_timezone(&Utc).date_naive()
    }

    fn offset(&self) -> FixedOffset {
        *self.generated_at.offset()
    }
}

/// Always wrap in quotes, doubling embedded quotes.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Quote only when the value would otherwise break the row.
pub fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(quote(value))
    } else {
        Cow::Borrowed(value)
    }
}

pub fn format_date(value: Option<DateTime<Utc>>, offset: FixedOffset) -> String {
    match value {
        Some(dt) => dt.with_timezone(&offset).format("%Y. %-m. %-d.").to_string(),
        None => "N/A".to_string(),
    }
}

fn percentage(count: usize, total: usize) -> u64 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u64
}

/// Build the full report: header, key metrics, category distribution,
/// top viewed, recently published, full listing and footer.
pub fn format_report(insights: &Insights, all_items: &[ContentItem], ctx: &ReportContext) -> String {
    let kind = insights.kind;
    let stats = &insights.base;
    let noun = kind.noun();
    let offset = ctx.offset();
    let label = |key: &str| csv_field(kind.category_label(key)).into_owned();

    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("=== GLEC {} 통계 리포트 ===", noun));
    lines.push(format!(
        "생성일시,{}",
        ctx.generated_at.format("%Y. %-m. %-d. %H:%M:%S")
    ));
    lines.push(format!("총 {} 수,{}", noun, stats.total_items));
    lines.push(String::new());

    lines.push("=== 주요 통계 ===".to_string());
    lines.push("지표,값".to_string());
    lines.push(format!("전체 {},{}", noun, stats.total_items));
    lines.push(format!("작성중,{}", stats.draft_count));
    lines.push(format!("발행됨,{}", stats.published_count));
    lines.push(format!("보관됨,{}", stats.archived_count));
    lines.push(format!("총 조회수,{}", stats.total_views));
    lines.push(format!("평균 조회수,{}", stats.avg_views_per_item));
    lines.push(String::new());

    lines.push("=== 카테고리별 분포 ===".to_string());
    lines.push("카테고리,개수,비율(%)".to_string());
    for (key, count) in insights.category_distribution.iter() {
        lines.push(format!(
            "{},{},{}",
            label(key),
            count,
            percentage(count, stats.total_items)
        ));
    }
    lines.push(String::new());

    lines.push("=== 조회수 상위 5개 ===".to_string());
    lines.push("순위,제목,카테고리,조회수,게시일".to_string());
    for (index, item) in insights.top_viewed.iter().enumerate() {
        lines.push(format!(
            "{},{},{},{},{}",
            index + 1,
            quote(&item.title),
            label(&item.category),
            item.views(),
            format_date(item.published_at, offset)
        ));
    }
    lines.push(String::new());

    lines.push("=== 최근 발행 5개 ===".to_string());
    lines.push("제목,카테고리,조회수,게시일".to_string());
    for item in &insights.recent_published {
        lines.push(format!(
            "{},{},{},{}",
            quote(&item.title),
            label(&item.category),
            item.views(),
            format_date(item.published_at, offset)
        ));
    }
    lines.push(String::new());

    lines.push(format!("=== 전체 {} 목록 ===", noun));
    lines.push("ID,제목,카테고리,상태,조회수,게시일".to_string());
    for item in all_items {
        lines.push(format!(
            "{},{},{},{},{},{}",
            csv_field(&item.id),
            quote(&item.title),
            label(&item.category),
            item.effective_status(),
            item.views(),
            format_date(item.published_at, offset)
        ));
    }
    lines.push(String::new());

    lines.push("=== 리포트 끝 ===".to_string());
    lines.push(format!("생성 시스템,GLEC Admin - {}", kind.title()));
    lines.push(format!("데이터 소스,{}", csv_field(&ctx.data_source)));

    let mut document = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum::<usize>() + 3);
    document.push(UTF8_BOM);
    document.push_str(&lines.join("\n"));
    document
}

/// `glec-<content-type>-report-<YYYY-MM-DD>.csv`
pub fn report_file_name(kind: ContentKind, date: NaiveDate) -> String {
    format!("glec-{}-report-{}.csv", kind.report_slug(), date.format("%Y-%m-%d"))
}

/// Write `document` into `dir` under `file_name`. The bytes go to a
/// temporary file first, so a failure never leaves a truncated report.
pub fn write_report(dir: &Path, file_name: &str, document: &str) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(file_name);

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(document.as_bytes())?;
    tmp.flush()?;
    tmp.persist(&target).map_err(|e| e.error)?;

    tracing::info!(path = %target.display(), bytes = document.len(), "report written");
    Ok(target)
}
