// ==========================================
// CSV Import+ - CSV 行读取器
// ==========================================
// 职责: 按给定分隔符把文本切成行（单元格原样保留，不 trim）
// 约定: 无表头 / 允许行长度不一致 / 双引号转义
// 说明: 长度为 0 的物理空行按空行（无单元格）返回，不被吞掉
// ==========================================

use crate::domain::Delimiter;
use crate::importer::error::ImportResult;
use csv::{ReaderBuilder, StringRecord};

pub struct CsvRowReader;

impl CsvRowReader {
    fn builder(delimiter: Delimiter) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter.as_byte());
        builder
    }

    /// 逐行回调；`None` 表示一条长度为 0 的空行
    ///
    /// csv 解析器会跳过空行，这里按记录起点前的换行符补回
    fn walk_rows<F>(text: &str, delimiter: Delimiter, mut on_row: F) -> ImportResult<()>
    where
        F: FnMut(Option<&StringRecord>),
    {
        let bytes = text.as_bytes();
        let mut reader = Self::builder(delimiter).from_reader(bytes);

        let mut record = StringRecord::new();
        let mut cursor = 0;
        while reader.read_record(&mut record)? {
            let read_from = record
                .position()
                .map_or(cursor, |pos| pos.byte() as usize);
            let start = skip_line_breaks(bytes, read_from);
            for _ in 0..blank_lines_before(bytes, start) {
                on_row(None);
            }
            on_row(Some(&record));
            cursor = start + 1;
        }

        for _ in 0..blank_lines_before(bytes, bytes.len()) {
            on_row(None);
        }
        Ok(())
    }

    /// 读取全部行
    pub fn read_rows(text: &str, delimiter: Delimiter) -> ImportResult<Vec<Vec<String>>> {
        let mut rows = Vec::new();
        Self::walk_rows(text, delimiter, |record| {
            rows.push(match record {
                Some(record) => record.iter().map(|c| c.to_string()).collect(),
                None => Vec::new(),
            });
        })?;
        Ok(rows)
    }

    /// 只统计行数（含空行）
    pub fn count_rows(text: &str, delimiter: Delimiter) -> ImportResult<usize> {
        let mut count = 0;
        Self::walk_rows(text, delimiter, |_| count += 1)?;
        Ok(count)
    }
}

fn is_line_break(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

fn skip_line_breaks(bytes: &[u8], mut at: usize) -> usize {
    while at < bytes.len() && is_line_break(bytes[at]) {
        at += 1;
    }
    at
}

/// `end` 之前连续换行符中包含的空行数
///
/// 文本开头的每个换行都是一条空行；记录之后的第一个换行是该记录的行尾
fn blank_lines_before(bytes: &[u8], end: usize) -> usize {
    let mut run_start = end;
    while run_start > 0 && is_line_break(bytes[run_start - 1]) {
        run_start -= 1;
    }

    let run = &bytes[run_start..end];
    let mut breaks = 0;
    let mut i = 0;
    while i < run.len() {
        // \r\n 算一个换行
        if run[i] == b'\r' && run.get(i + 1) == Some(&b'\n') {
            i += 1;
        }
        breaks += 1;
        i += 1;
    }

    if run_start == 0 {
        breaks
    } else {
        breaks.saturating_sub(1)
    }
}

/// 整行为空（无单元格，或全部单元格 trim 后为空）
pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}
