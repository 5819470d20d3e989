// ==========================================
// CSV Import+ - 导入层
// ==========================================
// 职责: 原始文本 → 指令 → 分隔符 → 笔记类型 → 行 → 笔记
// 数据流单向: 每一步只依赖前一步的结果
// ==========================================

// 模块声明
pub mod bulk_importer;
pub mod delimiter_detector;
pub mod directive_parser;
pub mod error;
pub mod importer_trait;
pub mod input_source;
pub mod row_reader;
pub mod schema_matcher;

// 重导出核心类型
pub use bulk_importer::BulkImporterImpl;
pub use delimiter_detector::{detect_csv_format, leading_sample, DelimiterDetector, HeuristicSniffer};
pub use directive_parser::{extract_directives, strip_directive_lines};
pub use error::{ImportError, ImportResult};
pub use input_source::{read_input_file, InputSource};
pub use row_reader::{is_blank_row, CsvRowReader};
pub use schema_matcher::{
    auto_pick_schema, detect_cloze_in_text, find_schema_by_name, normalize_name,
    CLOZE_SCHEMA_NAME,
};

// 重导出 Trait 接口
pub use importer_trait::{DialectSniffer, NoteImporter};
