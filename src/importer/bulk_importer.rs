// ==========================================
// CSV Import+ - 批量导入器
// ==========================================
// 职责: 正文 → 行 → 笔记，逐条落库
// 规则:
// - header_present 且行数 > 1 时丢弃首行
// - 整行为空（无单元格或全部空白）计入 skipped_empty，不建笔记
// - 单元格 trim 后按位置写入字段，至多 min(行长, 字段数) 个
// - 行长 > 字段数时，最后一个单元格按空白切分为标签
// - 任一笔记写入失败即中止；已写入的笔记不回滚
// ==========================================

use crate::domain::{ContainerId, Delimiter, ImportOutcome, Record, SchemaDescriptor};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::NoteImporter;
use crate::importer::row_reader::{is_blank_row, CsvRowReader};
use crate::repository::RecordRepository;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

// ==========================================
// BulkImporterImpl - 批量导入器实现
// ==========================================
pub struct BulkImporterImpl<R>
where
    R: RecordRepository,
{
    record_repo: R,
}

impl<R> BulkImporterImpl<R>
where
    R: RecordRepository,
{
    pub fn new(record_repo: R) -> Self {
        Self { record_repo }
    }

    /// 按位置填充字段；超出字段数的行把末尾单元格作为标签
    fn build_record(&self, schema: &SchemaDescriptor, row: &[String]) -> Record {
        let field_count = schema.field_count();
        let mut record = self.record_repo.new_record(schema);

        for (i, cell) in row.iter().take(field_count).enumerate() {
            record.set_field(i, cell.trim());
        }

        if row.len() > field_count {
            if let Some(tag_cell) = row.last() {
                record.set_tags(split_tags(tag_cell));
            }
        }
        record
    }
}

/// 按空白切分标签（空串 → 无标签）
pub fn split_tags(cell: &str) -> Vec<String> {
    cell.split_whitespace().map(|t| t.to_string()).collect()
}

impl<R> NoteImporter for BulkImporterImpl<R>
where
    R: RecordRepository,
{
    #[instrument(skip(self, body, schema), fields(schema = %schema.name, delimiter = %delimiter))]
    fn do_import(
        &self,
        body: &str,
        delimiter: Delimiter,
        schema: &SchemaDescriptor,
        container: ContainerId,
        header_present: bool,
    ) -> ImportResult<ImportOutcome> {
        let start_time = Instant::now();

        let rows = CsvRowReader::read_rows(body, delimiter)?;
        if rows.is_empty() {
            return Err(ImportError::NoDataRows);
        }

        // 只有一行时即使勾选表头也不丢弃
        let skip_header = header_present && rows.len() > 1;
        let first_data_row = usize::from(skip_header);
        debug!(rows = rows.len(), skip_header, "开始逐行建笔记");

        let mut added = 0;
        let mut skipped_empty = 0;
        for (row_index, row) in rows.iter().enumerate().skip(first_data_row) {
            if is_blank_row(row) {
                skipped_empty += 1;
                continue;
            }

            let record = self.build_record(schema, row);
            self.record_repo
                .add_record(&record, container)
                .map_err(|e| {
                    error!(row = row_index + 1, added, error = %e, "笔记写入失败，导入中止");
                    ImportError::RecordCreationFailed {
                        row: row_index + 1,
                        message: e.to_string(),
                    }
                })?;
            added += 1;
        }

        info!(
            added,
            skipped_empty,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "批量导入完成"
        );

        Ok(ImportOutcome {
            added,
            skipped_empty,
            delimiter,
        })
    }
}
