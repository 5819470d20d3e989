// ==========================================
// CSV Import+ - 笔记类型匹配器
// ==========================================
// 职责: 按名称查找笔记类型 / 按表头与列数为正文挑选笔记类型
// 评分: (表头名称相似度, 列数接近度, -字段数) 字典序最大者胜出
// ==========================================
// 红线: 只读宿主笔记类型，不做任何修改
// ==========================================

use crate::config::DetectionSettings;
use crate::domain::{Delimiter, MatchResult, SchemaInfo};
use crate::importer::delimiter_detector::DelimiterDetector;
use crate::importer::row_reader::{is_blank_row, CsvRowReader};
use crate::repository::SchemaRepository;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

/// 挖空笔记类型的名称
pub const CLOZE_SCHEMA_NAME: &str = "Cloze";

static CLOZE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{c\d+::").unwrap());
static SEPARATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_\-]+").unwrap());
static NON_NAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 ]+").unwrap());

// 小写名称 → 宿主内置笔记类型的规范名称（小写）
const ALIASES: &[(&str, &str)] = &[
    ("cloze", "cloze"),
    ("basic", "basic"),
    ("basic (and reversed card)", "basic (and reversed card)"),
    ("basic (reversed)", "basic (and reversed card)"),
    ("basic (type in the answer)", "basic (type in the answer)"),
    ("basic (type in)", "basic (type in the answer)"),
];

/// 名称归一化: trim → 小写 → 空白/下划线/连字符串压成单个空格 → 去掉 `[a-z0-9 ]` 以外的字符
pub fn normalize_name(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let spaced = SEPARATOR_RUN.replace_all(&lowered, " ");
    NON_NAME_CHARS.replace_all(&spaced, "").into_owned()
}

/// 文本中是否含挖空标记 `{{c<数字>::`
pub fn detect_cloze_in_text(text: &str) -> bool {
    CLOZE_MARKER.is_match(text)
}

/// 按名称查找（trim + 不区分大小写的精确匹配，先经别名表规范化）
///
/// # 返回
/// - Some(index): 第一个匹配的下标
/// - None: 名称为空或无匹配
pub fn find_schema_by_name(schemas: &[SchemaInfo], name: &str) -> Option<usize> {
    let target = name.trim().to_lowercase();
    if target.is_empty() {
        return None;
    }
    let target = ALIASES
        .iter()
        .find(|(alias, _)| *alias == target)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(target);

    schemas
        .iter()
        .position(|s| s.name.trim().to_lowercase() == target)
}

/// 列数接近度: 差 0/1/2 → 3/2/1，否则 0
fn column_closeness(observed: usize, field_count: usize) -> i64 {
    match observed.abs_diff(field_count) {
        0 => 3,
        1 => 2,
        2 => 1,
        _ => 0,
    }
}

/// 表头名称相似度: 精确匹配 +3，否则与任一非空字段名互为子串 +1
fn name_similarity(header: &[String], fields: &[String]) -> i64 {
    let mut score = 0;
    for token in header.iter().filter(|h| !h.is_empty()) {
        if fields.iter().any(|f| f == token) {
            score += 3;
        } else if fields
            .iter()
            .filter(|f| !f.is_empty())
            .any(|f| f.contains(token.as_str()) || token.contains(f.as_str()))
        {
            score += 1;
        }
    }
    score
}

/// 为正文挑选最匹配的笔记类型
///
/// # 参数
/// - text: 已剥离指令块的正文
/// - delimiter: 已确定的分隔符
/// - schemas: 宿主笔记类型列表（返回值中的 index 即此列表下标）
/// - repo: 用于读取字段的宿主
/// - header_hint: 用户已勾选"首行为表头"
///
/// # 返回
/// - Some(MatchResult): 最佳笔记类型
/// - None: 无非空行 / 无可用笔记类型
///
/// # 说明
/// - 含挖空标记且存在 Cloze 时直接选 Cloze
/// - 宿主无法读取的笔记类型不参与评分
#[instrument(skip(text, schemas, repo, settings), fields(schemas = schemas.len()))]
pub fn auto_pick_schema<R>(
    text: &str,
    delimiter: Delimiter,
    schemas: &[SchemaInfo],
    repo: &R,
    header_hint: bool,
    settings: &DetectionSettings,
) -> Option<MatchResult>
where
    R: SchemaRepository + ?Sized,
{
    if detect_cloze_in_text(text) {
        if let Some(index) = find_schema_by_name(schemas, CLOZE_SCHEMA_NAME) {
            match repo.get_schema(schemas[index].id) {
                Ok(Some(cloze)) => {
                    debug!(index, "检测到挖空标记，选用 Cloze");
                    return Some(MatchResult {
                        name: schemas[index].name.clone(),
                        field_count: cloze.field_count(),
                        index,
                    });
                }
                Ok(None) => debug!("Cloze 笔记类型无法读取，改用评分"),
                Err(e) => warn!(error = %e, "Cloze 笔记类型读取失败，改用评分"),
            }
        }
    }

    let rows: Vec<Vec<String>> = match CsvRowReader::read_rows(text, delimiter) {
        Ok(rows) => rows.into_iter().filter(|r| !is_blank_row(r)).collect(),
        Err(e) => {
            debug!(error = %e, "正文解析失败，视为无数据");
            Vec::new()
        }
    };
    let first_row = rows.first()?;

    let has_header = header_hint || DelimiterDetector::new(*settings).has_header(text);

    let header: Vec<String> = if has_header {
        first_row.iter().map(|c| normalize_name(c)).collect()
    } else {
        Vec::new()
    };
    let data_rows = if has_header { &rows[1..] } else { &rows[..] };
    let observed_cols = data_rows
        .iter()
        .take(settings.schema_sample_rows)
        .map(|r| r.len())
        .max()
        .unwrap_or(first_row.len());

    // (名称分, 列数分, -字段数)
    let mut best: Option<((i64, i64, i64), MatchResult)> = None;
    for (index, info) in schemas.iter().enumerate() {
        let schema = match repo.get_schema(info.id) {
            Ok(Some(schema)) => schema,
            Ok(None) => {
                debug!(schema = %info.name, "笔记类型不存在，跳过");
                continue;
            }
            Err(e) => {
                warn!(schema = %info.name, error = %e, "笔记类型读取失败，跳过");
                continue;
            }
        };

        let fields: Vec<String> = schema.fields.iter().map(|f| normalize_name(f)).collect();
        let field_count = schema.field_count();
        let score = (
            name_similarity(&header, &fields),
            column_closeness(observed_cols, field_count),
            -(field_count as i64),
        );

        if best.as_ref().map_or(true, |(top, _)| score > *top) {
            best = Some((
                score,
                MatchResult {
                    name: info.name.clone(),
                    field_count,
                    index,
                },
            ));
        }
    }

    best.map(|(score, result)| {
        debug!(
            schema = %result.name,
            name_score = score.0,
            column_score = score.1,
            observed_cols,
            has_header,
            "笔记类型匹配完成"
        );
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SchemaDescriptor, SchemaId};
    use crate::repository::{RepositoryError, RepositoryResult};

    struct FakeSchemas {
        schemas: Vec<SchemaDescriptor>,
        broken: Vec<SchemaId>,
    }

    impl FakeSchemas {
        fn new(defs: Vec<(&str, Vec<&str>)>) -> Self {
            let schemas = defs
                .into_iter()
                .enumerate()
                .map(|(i, (name, fields))| SchemaDescriptor {
                    id: i as SchemaId + 1,
                    name: name.to_string(),
                    fields: fields.iter().map(|f| f.to_string()).collect(),
                })
                .collect();
            Self {
                schemas,
                broken: Vec::new(),
            }
        }

        fn infos(&self) -> Vec<SchemaInfo> {
            self.schemas.iter().map(|s| s.info()).collect()
        }
    }

    impl SchemaRepository for FakeSchemas {
        fn list_schemas(&self) -> RepositoryResult<Vec<SchemaInfo>> {
            Ok(self.infos())
        }

        fn get_schema(&self, id: SchemaId) -> RepositoryResult<Option<SchemaDescriptor>> {
            if self.broken.contains(&id) {
                return Err(RepositoryError::InternalError("broken".to_string()));
            }
            Ok(self.schemas.iter().find(|s| s.id == id).cloned())
        }
    }

    fn pick(repo: &FakeSchemas, text: &str, header_hint: bool) -> Option<MatchResult> {
        auto_pick_schema(
            text,
            Delimiter::Comma,
            &repo.infos(),
            repo,
            header_hint,
            &DetectionSettings::default(),
        )
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Back_Extra "), "back extra");
        assert_eq!(normalize_name("Front--Side\t2"), "front side 2");
        assert_eq!(normalize_name("Wort (DE)!"), "wort de");
        assert_eq!(normalize_name("???"), "");
    }

    #[test]
    fn test_detect_cloze_marker() {
        assert!(detect_cloze_in_text("The {{c1::sun}} is a star"));
        assert!(detect_cloze_in_text("{{c12::x}}"));
        assert!(!detect_cloze_in_text("{{c::x}} {{C1::y}}"));
    }

    #[test]
    fn test_find_schema_by_name() {
        let repo = FakeSchemas::new(vec![
            ("Basic", vec!["Front", "Back"]),
            ("Basic (and reversed card)", vec!["Front", "Back"]),
            ("Cloze", vec!["Text", "Back Extra"]),
        ]);
        let infos = repo.infos();
        assert_eq!(find_schema_by_name(&infos, "  cloze "), Some(2));
        assert_eq!(find_schema_by_name(&infos, "BASIC"), Some(0));
        assert_eq!(find_schema_by_name(&infos, "basic (reversed)"), Some(1));
        assert_eq!(find_schema_by_name(&infos, "Vocab"), None);
        assert_eq!(find_schema_by_name(&infos, "   "), None);
    }

    #[test]
    fn test_cloze_marker_wins_over_scoring() {
        let repo = FakeSchemas::new(vec![
            ("Front Back", vec!["Front", "Back"]),
            ("Cloze", vec!["Text", "Back Extra", "Source", "Notes"]),
        ]);
        let picked = pick(&repo, "Front,Back\n{{c1::Paris}} is in France,geo", true).unwrap();
        assert_eq!(picked.name, "Cloze");
        assert_eq!(picked.field_count, 4);
        assert_eq!(picked.index, 1);
    }

    #[test]
    fn test_cloze_marker_without_cloze_schema_falls_back() {
        let repo = FakeSchemas::new(vec![("Basic", vec!["Front", "Back"])]);
        let picked = pick(&repo, "{{c1::x}},y", false).unwrap();
        assert_eq!(picked.name, "Basic");
    }

    #[test]
    fn test_exact_header_match_beats_substring() {
        let repo = FakeSchemas::new(vec![
            ("Long Names", vec!["Question Text", "Answer Text"]),
            ("Short Names", vec!["Question", "Answer"]),
        ]);
        let picked = pick(&repo, "question,answer\nq1,a1\nq2,a2", true).unwrap();
        assert_eq!(picked.name, "Short Names");
        assert_eq!(picked.index, 1);
    }

    #[test]
    fn test_column_closeness_without_header() {
        let repo = FakeSchemas::new(vec![
            ("Two", vec!["A", "B"]),
            ("Three", vec!["A", "B", "C"]),
        ]);
        let picked = pick(&repo, "1,2,3\n4,5,6", false).unwrap();
        assert_eq!(picked.name, "Three");
        assert_eq!(picked.field_count, 3);
    }

    #[test]
    fn test_equal_closeness_prefers_fewer_fields() {
        let repo = FakeSchemas::new(vec![
            ("Four", vec!["A", "B", "C", "D"]),
            ("Two", vec!["A", "B"]),
        ]);
        let picked = pick(&repo, "1,2,3\n4,5,6", false).unwrap();
        assert_eq!(picked.name, "Two");
    }

    #[test]
    fn test_full_tie_keeps_first_schema() {
        let repo = FakeSchemas::new(vec![
            ("First", vec!["A", "B"]),
            ("Second", vec!["C", "D"]),
        ]);
        let picked = pick(&repo, "1,2\n3,4", false).unwrap();
        assert_eq!(picked.name, "First");
        assert_eq!(picked.index, 0);
    }

    #[test]
    fn test_unreadable_schema_is_skipped() {
        let mut repo = FakeSchemas::new(vec![
            ("Three", vec!["A", "B", "C"]),
            ("Five", vec!["A", "B", "C", "D", "E"]),
        ]);
        repo.broken.push(1);
        let picked = pick(&repo, "1,2,3\n4,5,6", false).unwrap();
        assert_eq!(picked.name, "Five");
        assert_eq!(picked.index, 1);
    }

    #[test]
    fn test_no_rows_or_no_schemas_yields_none() {
        let repo = FakeSchemas::new(vec![("Basic", vec!["Front", "Back"])]);
        assert!(pick(&repo, "  ,  \n\n", false).is_none());
        assert!(pick(&repo, "", false).is_none());

        let empty = FakeSchemas::new(vec![]);
        assert!(pick(&empty, "a,b", false).is_none());
    }
}
