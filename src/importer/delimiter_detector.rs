// ==========================================
// CSV Import+ - 分隔符检测器
// ==========================================
// 职责: 推断正文分隔符并统计行数
// 流程: 取样本(前 N 字符) → 启发式嗅探 → 失败则统计回退 → 全文计行
// 候选: 逗号 / Tab / 分号 / 竖线
// ==========================================
// 嗅探分两步:
// 1. 引号推断: 寻找被引号包裹、两侧紧邻分隔符的字段
// 2. 频率推断: 按行统计候选字符出现次数，取众数最一致的字符
// ==========================================

use crate::config::DetectionSettings;
use crate::domain::{CsvFormat, Delimiter};
use crate::importer::error::ImportResult;
use crate::importer::importer_trait::DialectSniffer;
use crate::importer::row_reader::CsvRowReader;
use std::cmp::Ordering;
use tracing::{debug, instrument};

/// 频率推断的分块行数上限
const FREQUENCY_CHUNK_LINES: usize = 10;
/// 一致性阈值：从 1.0 每次降 0.01，低于该值放弃
const CONSISTENCY_THRESHOLD: f64 = 0.9;
/// 多个字符同时满足一致性时的优先顺序（竖线不在其中）
const PREFERRED: [Delimiter; 3] = [Delimiter::Comma, Delimiter::Tab, Delimiter::Semicolon];

/// 取前 `max_chars` 个字符（按字符而非字节截断）
pub fn leading_sample(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// 可作为分隔符出现的字符：非单词字符、非换行、非引号
fn is_delimiter_class(c: char) -> bool {
    !(c.is_alphanumeric() || c == '_' || c == '\n' || is_quote(c))
}

/// 从 `from` 起寻找第一个后方满足 `tail` 的闭合引号（最短匹配）
fn find_closing(
    chars: &[char],
    from: usize,
    quote: char,
    tail: impl Fn(usize) -> bool,
) -> Option<usize> {
    (from..chars.len()).find(|&j| chars[j] == quote && tail(j + 1))
}

// ==========================================
// 引号推断的三种形态（按顺序尝试，取第一个有命中的形态）
// ==========================================
// 返回 (分隔符字符, 匹配结束位置)
type QuotedMatch = Option<(char, usize)>;

/// `,"...",` 形态：分隔符 + 可选空格 + 引号字段 + 同一分隔符
fn match_enclosed(chars: &[char], i: usize) -> QuotedMatch {
    let delim = chars[i];
    if !is_delimiter_class(delim) {
        return None;
    }
    for space in [true, false] {
        if space && chars.get(i + 1) != Some(&' ') {
            continue;
        }
        let q_pos = i + 1 + usize::from(space);
        let quote = match chars.get(q_pos) {
            Some(&q) if is_quote(q) => q,
            _ => continue,
        };
        if let Some(j) = find_closing(chars, q_pos + 1, quote, |k| chars.get(k) == Some(&delim)) {
            return Some((delim, j + 2));
        }
    }
    None
}

/// 行首 `"...",` 形态：行首引号字段 + 分隔符 + 可选空格
fn match_line_start(chars: &[char], i: usize) -> QuotedMatch {
    let mut starts = Vec::with_capacity(2);
    if i == 0 || chars[i - 1] == '\n' {
        starts.push(i);
    }
    if chars[i] == '\n' {
        starts.push(i + 1);
    }
    for q_pos in starts {
        let quote = match chars.get(q_pos) {
            Some(&q) if is_quote(q) => q,
            _ => continue,
        };
        let closing = find_closing(chars, q_pos + 1, quote, |k| {
            chars.get(k).map_or(false, |&c| is_delimiter_class(c))
        });
        if let Some(j) = closing {
            let delim = chars[j + 1];
            let end = j + 2 + usize::from(chars.get(j + 2) == Some(&' '));
            return Some((delim, end));
        }
    }
    None
}

/// 行尾 `,"..."` 形态：分隔符 + 可选空格 + 引号字段 + 行尾
fn match_line_end(chars: &[char], i: usize) -> QuotedMatch {
    let delim = chars[i];
    if !is_delimiter_class(delim) {
        return None;
    }
    for space in [true, false] {
        if space && chars.get(i + 1) != Some(&' ') {
            continue;
        }
        let q_pos = i + 1 + usize::from(space);
        let quote = match chars.get(q_pos) {
            Some(&q) if is_quote(q) => q,
            _ => continue,
        };
        let closing = find_closing(chars, q_pos + 1, quote, |k| {
            k == chars.len() || chars[k] == '\n'
        });
        if let Some(j) = closing {
            return Some((delim, j + 1));
        }
    }
    None
}

/// 从左到右收集不重叠的命中
fn find_all(chars: &[char], matcher: fn(&[char], usize) -> QuotedMatch) -> Vec<char> {
    let mut found = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match matcher(chars, i) {
            Some((delim, end)) => {
                found.push(delim);
                i = end.max(i + 1);
            }
            None => i += 1,
        }
    }
    found
}

// ==========================================
// HeuristicSniffer - 启发式方言嗅探
// ==========================================
pub struct HeuristicSniffer {
    fallback_line_limit: usize,
}

impl HeuristicSniffer {
    pub fn new(settings: &DetectionSettings) -> Self {
        Self {
            fallback_line_limit: settings.fallback_line_limit,
        }
    }

    fn candidate(c: char) -> Option<Delimiter> {
        Delimiter::CANDIDATES
            .iter()
            .copied()
            .find(|d| d.as_char() == c)
    }

    /// 引号推断：第一个有命中的形态中，出现最多的候选分隔符（同数取先出现者）
    fn guess_from_quotes(&self, sample: &str) -> Option<Delimiter> {
        let chars: Vec<char> = sample.chars().collect();
        let matchers: [fn(&[char], usize) -> QuotedMatch; 3] =
            [match_enclosed, match_line_start, match_line_end];

        for matcher in matchers {
            let found = find_all(&chars, matcher);
            if found.is_empty() {
                continue;
            }

            let mut counts: Vec<(Delimiter, usize)> = Vec::new();
            for delim in found.into_iter().filter_map(Self::candidate) {
                match counts.iter_mut().find(|(d, _)| *d == delim) {
                    Some(entry) => entry.1 += 1,
                    None => counts.push((delim, 1)),
                }
            }

            let mut best: Option<(Delimiter, usize)> = None;
            for (delim, count) in counts {
                if best.map_or(true, |(_, c)| count > c) {
                    best = Some((delim, count));
                }
            }
            return best.map(|(d, _)| d);
        }
        None
    }

    /// 频率推断：逐块累积每行出现次数分布，取众数最一致的候选
    fn guess_from_frequency(&self, sample: &str) -> Option<Delimiter> {
        let lines: Vec<&str> = sample.split('\n').filter(|l| !l.is_empty()).collect();
        if lines.is_empty() {
            return None;
        }

        let chunk = lines.len().min(FREQUENCY_CHUNK_LINES);
        // 每个候选: [(出现次数, 行数)]，按首次出现顺序
        let mut tables: Vec<Vec<(usize, i64)>> = vec![Vec::new(); Delimiter::CANDIDATES.len()];
        let mut start = 0;
        let mut iteration = 0;

        while start < lines.len() {
            iteration += 1;
            let end = (start + chunk).min(lines.len());
            for line in &lines[start..end] {
                for (table, delim) in tables.iter_mut().zip(Delimiter::CANDIDATES) {
                    let freq = line.matches(delim.as_char()).count();
                    match table.iter_mut().find(|(f, _)| *f == freq) {
                        Some(entry) => entry.1 += 1,
                        None => table.push((freq, 1)),
                    }
                }
            }

            let total = (chunk * iteration).min(lines.len()) as f64;
            let modes: Vec<Option<(usize, i64)>> = tables.iter().map(|t| mode_of(t)).collect();

            let mut qualified: Vec<(Delimiter, usize, i64)> = Vec::new();
            let mut consistency = 1.0_f64;
            while qualified.is_empty() && consistency >= CONSISTENCY_THRESHOLD {
                for (delim, mode) in Delimiter::CANDIDATES.iter().zip(&modes) {
                    if let Some((count, line_hits)) = *mode {
                        if count > 0 && line_hits > 0 && line_hits as f64 / total >= consistency {
                            qualified.push((*delim, count, line_hits));
                        }
                    }
                }
                consistency -= 0.01;
            }

            match qualified.len() {
                0 => {}
                1 => return Some(qualified[0].0),
                _ => {
                    if let Some(d) = PREFERRED
                        .iter()
                        .find(|p| qualified.iter().any(|(d, _, _)| d == *p))
                    {
                        return Some(*d);
                    }
                    return qualified
                        .into_iter()
                        .max_by_key(|(d, count, hits)| (*count, *hits, d.as_byte()))
                        .map(|(d, _, _)| d);
                }
            }
            start = end;
        }
        None
    }
}

impl Default for HeuristicSniffer {
    fn default() -> Self {
        Self::new(&DetectionSettings::default())
    }
}

/// 众数：行数最多的出现次数（同数取先出现者），行数扣除其余次数的行数；
/// 只有 0 次的字符返回 None
fn mode_of(table: &[(usize, i64)]) -> Option<(usize, i64)> {
    match table {
        [] => None,
        [(0, _)] => None,
        [single] => Some(*single),
        _ => {
            let mut best = table[0];
            for entry in &table[1..] {
                if entry.1 > best.1 {
                    best = *entry;
                }
            }
            let others: i64 = table.iter().map(|e| e.1).sum::<i64>() - best.1;
            Some((best.0, best.1 - others))
        }
    }
}

impl DialectSniffer for HeuristicSniffer {
    fn try_sniff(&self, sample: &str) -> Option<Delimiter> {
        self.guess_from_quotes(sample)
            .or_else(|| self.guess_from_frequency(sample))
    }

    fn fallback_score(&self, sample: &str) -> Delimiter {
        let lines: Vec<&str> = sample
            .split('\n')
            .take(self.fallback_line_limit)
            .filter(|l| !l.trim().is_empty())
            .collect();

        // (分隔符, 平均次数, 是否每行次数一致)
        let mut scored: Vec<(Delimiter, f64, bool)> = Vec::new();
        for delim in Delimiter::CANDIDATES {
            let counts: Vec<usize> = lines
                .iter()
                .map(|l| l.matches(delim.as_char()).count())
                .collect();
            if counts.is_empty() {
                continue;
            }
            let avg = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            let consistent = counts[0] > 0 && counts.iter().all(|&c| c == counts[0]);
            if consistent || avg > 0.0 {
                scored.push((delim, avg, consistent));
            }
        }

        // 稳定排序：同分时保持候选顺序
        scored.sort_by(|a, b| {
            b.2.cmp(&a.2)
                .then(b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal))
        });
        scored.first().map(|(d, _, _)| *d).unwrap_or_default()
    }
}

// ==========================================
// 表头投票
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Unset,
    Numeric,
    Length(usize),
}

fn is_numeric(cell: &str) -> bool {
    cell.trim().parse::<f64>().is_ok()
}

fn kind_of(cell: &str) -> ColumnKind {
    if is_numeric(cell) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Length(cell.chars().count())
    }
}

/// 首行为候选表头；之后至多 `max_rows` 行中与表头等长的行参与列类型推断
///
/// 类型前后不一致的列退出投票。每列: 长度类型且表头长度不同 / 数值列而表头非数值 / 列类型未定 → +1，
/// 否则 -1。总分 > 0 判为有表头
pub(crate) fn header_vote(sample: &str, delimiter: Delimiter, max_rows: usize) -> bool {
    let rows = match CsvRowReader::read_rows(sample, delimiter) {
        Ok(rows) => rows,
        Err(_) => return false,
    };
    let mut rows = rows.into_iter();
    let header = match rows.next() {
        Some(header) => header,
        None => return false,
    };

    let mut kinds: Vec<Option<ColumnKind>> = vec![Some(ColumnKind::Unset); header.len()];
    for row in rows.take(max_rows) {
        if row.len() != header.len() {
            continue;
        }
        for (slot, cell) in kinds.iter_mut().zip(&row) {
            let Some(current) = *slot else { continue };
            let observed = kind_of(cell);
            if current == ColumnKind::Unset {
                *slot = Some(observed);
            } else if current != observed {
                *slot = None;
            }
        }
    }

    let mut score: i32 = 0;
    for (kind, cell) in kinds.iter().zip(&header) {
        match kind {
            None => {}
            Some(ColumnKind::Length(len)) => {
                score += if cell.chars().count() != *len { 1 } else { -1 };
            }
            Some(ColumnKind::Numeric) => {
                score += if is_numeric(cell) { -1 } else { 1 };
            }
            Some(ColumnKind::Unset) => score += 1,
        }
    }
    score > 0
}

// ==========================================
// DelimiterDetector - 分隔符检测器
// ==========================================
pub struct DelimiterDetector<S: DialectSniffer = HeuristicSniffer> {
    sniffer: S,
    settings: DetectionSettings,
}

impl DelimiterDetector<HeuristicSniffer> {
    pub fn new(settings: DetectionSettings) -> Self {
        Self {
            sniffer: HeuristicSniffer::new(&settings),
            settings,
        }
    }
}

impl Default for DelimiterDetector<HeuristicSniffer> {
    fn default() -> Self {
        Self::new(DetectionSettings::default())
    }
}

impl<S: DialectSniffer> DelimiterDetector<S> {
    /// 使用自定义嗅探策略
    pub fn with_sniffer(sniffer: S, settings: DetectionSettings) -> Self {
        Self { sniffer, settings }
    }

    pub fn settings(&self) -> &DetectionSettings {
        &self.settings
    }

    /// 只推断分隔符（样本 = 前 sniff_sample_chars 个字符）
    pub fn detect_delimiter(&self, text: &str) -> Delimiter {
        let sample = leading_sample(text, self.settings.sniff_sample_chars);
        match self.sniffer.try_sniff(sample) {
            Some(delimiter) => delimiter,
            None => {
                let delimiter = self.sniffer.fallback_score(sample);
                debug!(delimiter = %delimiter, "嗅探失败，使用统计回退");
                delimiter
            }
        }
    }

    /// 推断分隔符并用它解析完整正文计行
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn detect(&self, text: &str) -> ImportResult<CsvFormat> {
        let delimiter = self.detect_delimiter(text);
        let row_count = CsvRowReader::count_rows(text, delimiter)?;
        debug!(delimiter = %delimiter, rows = row_count, "格式检测完成");
        Ok(CsvFormat {
            delimiter,
            row_count,
        })
    }

    /// 对正文前 sniff_sample_chars 个字符做表头判断
    pub fn has_header(&self, text: &str) -> bool {
        let sample = leading_sample(text, self.settings.sniff_sample_chars);
        self.sniffer
            .has_header(sample, self.settings.header_sniff_rows)
    }
}

/// 使用默认检测参数推断格式
pub fn detect_csv_format(text: &str) -> ImportResult<CsvFormat> {
    DelimiterDetector::new(DetectionSettings::default()).detect(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sniff(sample: &str) -> Option<Delimiter> {
        HeuristicSniffer::default().try_sniff(sample)
    }

    #[test]
    fn test_sniff_uniform_delimiters() {
        assert_eq!(sniff("a,b,c\n1,2,3\n4,5,6"), Some(Delimiter::Comma));
        assert_eq!(sniff("a;b\nc;d"), Some(Delimiter::Semicolon));
        assert_eq!(sniff("x\ty\tz\n1\t2\t3"), Some(Delimiter::Tab));
        assert_eq!(sniff("a|b\nc|d"), Some(Delimiter::Pipe));
    }

    #[test]
    fn test_sniff_quoted_fields_beat_frequency() {
        // 逗号与分号每行各一次；引号字段两侧是分号
        let sample = "\"x,y\";\"z\"\n\"p,q\";\"r\"";
        assert_eq!(sniff(sample), Some(Delimiter::Semicolon));
    }

    #[test]
    fn test_sniff_fails_on_inconsistent_lines() {
        assert_eq!(sniff("a;b\nc;d;e\nf"), None);
        assert_eq!(sniff(""), None);
        assert_eq!(sniff("plain words only"), None);
    }

    #[test]
    fn test_fallback_uniform_single_candidate() {
        let sniffer = HeuristicSniffer::default();
        assert_eq!(sniffer.fallback_score("a|b|c\nd|e|f"), Delimiter::Pipe);
    }

    #[test]
    fn test_fallback_consistent_outranks_loose() {
        let sniffer = HeuristicSniffer::default();
        // 逗号平均 2 次但不一致；分号每行 1 次
        assert_eq!(sniffer.fallback_score("a,b,,c;d\ne;f,g"), Delimiter::Semicolon);
    }

    #[test]
    fn test_fallback_tie_keeps_candidate_order_and_defaults_to_comma() {
        let sniffer = HeuristicSniffer::default();
        assert_eq!(sniffer.fallback_score("a,b;c"), Delimiter::Comma);
        assert_eq!(sniffer.fallback_score(""), Delimiter::Comma);
        assert_eq!(sniffer.fallback_score("\n  \nno delimiters"), Delimiter::Comma);
    }

    #[test]
    fn test_fallback_only_looks_at_leading_lines() {
        let sniffer = HeuristicSniffer::default();
        let sample = "a\nb\nc\nd\ne\nf;g;h";
        assert_eq!(sniffer.fallback_score(sample), Delimiter::Comma);
    }

    #[test]
    fn test_detect_loose_fallback_and_row_count() {
        let format = detect_csv_format("a;b\nc;d;e\nf").unwrap();
        assert_eq!(format.delimiter, Delimiter::Semicolon);
        assert_eq!(format.row_count, 3);
    }

    #[test]
    fn test_detect_is_idempotent() {
        let text = "Front\tBack\nQ1\tA1\nQ2\tA2\n";
        let first = detect_csv_format(text).unwrap();
        let second = detect_csv_format(text).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.delimiter, Delimiter::Tab);
        assert_eq!(first.row_count, 3);
    }

    #[test]
    fn test_row_count_uses_full_body_not_sample() {
        let mut text = String::new();
        for i in 0..500 {
            text.push_str(&format!("question {},answer {}\n", i, i));
        }
        assert!(text.chars().count() > DetectionSettings::DEFAULT_SNIFF_SAMPLE_CHARS);
        let format = detect_csv_format(&text).unwrap();
        assert_eq!(format.delimiter, Delimiter::Comma);
        assert_eq!(format.row_count, 500);
    }

    #[test]
    fn test_leading_sample_counts_chars() {
        assert_eq!(leading_sample("日本語テキスト", 3), "日本語");
        assert_eq!(leading_sample("ab", 10), "ab");
    }

    #[test]
    fn test_has_header_votes() {
        let detector = DelimiterDetector::new(DetectionSettings::default());
        assert!(detector.has_header("name,age\nalice,30\nbob,25"));
        assert!(detector.has_header("Front,Back\nQ1,A1\nQ2,A2"));
        assert!(!detector.has_header("1,2\n3,4\n5,6"));
        assert!(!detector.has_header(""));
    }
}
