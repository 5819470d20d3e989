// ==========================================
// CSV Import+ - 导入引擎 Trait
// ==========================================
// 职责: 定义方言嗅探与批量导入接口（不包含实现）
// ==========================================

use crate::domain::{ContainerId, Delimiter, ImportOutcome, SchemaDescriptor};
use crate::importer::delimiter_detector::header_vote;
use crate::importer::error::ImportResult;

// ==========================================
// DialectSniffer Trait
// ==========================================
// 用途: 两阶段分隔符推断策略
// 实现者: HeuristicSniffer
pub trait DialectSniffer: Send + Sync {
    /// 启发式嗅探
    ///
    /// # 返回
    /// - Some(Delimiter): 找到一致的方言
    /// - None: 嗅探失败，由调用方转入 fallback_score
    fn try_sniff(&self, sample: &str) -> Option<Delimiter>;

    /// 统计回退：总能给出一个分隔符（无候选时为逗号）
    fn fallback_score(&self, sample: &str) -> Delimiter;

    /// 表头判断：以嗅探出的方言读取样本，首行作为候选表头投票
    ///
    /// 嗅探失败或样本为空时返回 false
    fn has_header(&self, sample: &str, max_rows: usize) -> bool {
        if sample.trim().is_empty() {
            return false;
        }
        match self.try_sniff(sample) {
            Some(delimiter) => header_vote(sample, delimiter, max_rows),
            None => false,
        }
    }
}

// ==========================================
// NoteImporter Trait
// ==========================================
// 用途: 批量建笔记主接口
// 实现者: BulkImporterImpl
pub trait NoteImporter: Send + Sync {
    /// 将正文按行建为笔记
    ///
    /// # 参数
    /// - body: 已剥离指令块的正文
    /// - delimiter: 已确定的分隔符
    /// - schema: 目标笔记类型
    /// - container: 目标牌组
    /// - header_present: 首行是否为表头（仅在行数 > 1 时丢弃）
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 新增数 / 空行跳过数 / 使用的分隔符
    /// - Err: 无数据行、解析失败、任一笔记写入失败（已写入的不回滚）
    fn do_import(
        &self,
        body: &str,
        delimiter: Delimiter,
        schema: &SchemaDescriptor,
        container: ContainerId,
        header_present: bool,
    ) -> ImportResult<ImportOutcome>;
}
