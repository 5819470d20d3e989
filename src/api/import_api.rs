// ==========================================
// CSV Import+ - 导入API
// ==========================================
// 职责: 编排 指令 → 分隔符 → 笔记类型 → 批量导入，并生成状态/结果提示
// 宿主: 通过构造函数显式注入，不使用全局状态
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{DetectionSettings, ImportConfigReader};
use crate::domain::{
    AnalysisOptions, ContainerInfo, ContentAnalysis, CsvFormat, Delimiter, DelimiterMode, Directives,
    FormatStatus, ImportOutcome, ImportRequest, SchemaChoice, SchemaDescriptor, SchemaInfo,
    SchemaSource,
};
use crate::i18n::t_with_args;
use crate::importer::{
    auto_pick_schema, extract_directives, find_schema_by_name, strip_directive_lines,
    BulkImporterImpl, CsvRowReader, DelimiterDetector, NoteImporter,
};
use crate::repository::CollectionRepository;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// 快速导入响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickImportResponse {
    pub outcome: ImportOutcome,
    /// 目标牌组
    pub deck: ContainerInfo,
    /// 实际使用的笔记类型及其来源
    pub schema: SchemaChoice,
    /// 分隔符是否为自动检测所得
    pub delimiter_auto_detected: bool,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 导入API
pub struct ImportApi<H>
where
    H: CollectionRepository,
{
    host: H,
    config: Option<Arc<dyn ImportConfigReader>>,
}

impl<H> ImportApi<H>
where
    H: CollectionRepository,
{
    /// 创建新的ImportApi实例（使用内置检测参数）
    pub fn new(host: H) -> Self {
        Self { host, config: None }
    }

    /// 从配置读取检测参数
    pub fn with_config(mut self, config: Arc<dyn ImportConfigReader>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// 当前检测参数；读取失败时使用内置值
    pub fn detection_settings(&self) -> DetectionSettings {
        match &self.config {
            Some(config) => config.get_detection_settings().unwrap_or_else(|e| {
                warn!(error = %e, "检测参数读取失败，使用内置值");
                DetectionSettings::default()
            }),
            None => DetectionSettings::default(),
        }
    }

    pub fn list_schemas(&self) -> ApiResult<Vec<SchemaInfo>> {
        Ok(self.host.list_schemas()?)
    }

    pub fn list_containers(&self) -> ApiResult<Vec<ContainerInfo>> {
        Ok(self.host.list_containers()?)
    }

    pub fn current_container(&self) -> ApiResult<Option<ContainerInfo>> {
        Ok(self.host.current_container()?)
    }

    /// 确定分隔符
    ///
    /// - Fixed: 直接使用
    /// - Auto: 对正文做格式检测；正文为空或检测失败时为逗号
    pub fn resolve_delimiter(&self, mode: DelimiterMode, body: &str) -> Delimiter {
        match mode {
            DelimiterMode::Fixed(delimiter) => delimiter,
            DelimiterMode::Auto if body.is_empty() => Delimiter::Comma,
            DelimiterMode::Auto => {
                match DelimiterDetector::new(self.detection_settings()).detect(body) {
                    Ok(format) => format.delimiter,
                    Err(e) => {
                        warn!(error = %e, "分隔符检测失败，使用逗号");
                        Delimiter::Comma
                    }
                }
            }
        }
    }

    /// 读取笔记类型完整描述，组装为选择结果
    fn schema_choice(
        &self,
        schemas: &[SchemaInfo],
        index: usize,
        source: SchemaSource,
    ) -> ApiResult<Option<(SchemaChoice, SchemaDescriptor)>> {
        let info = &schemas[index];
        let descriptor = match self.host.get_schema(info.id)? {
            Some(descriptor) => descriptor,
            None => return Ok(None),
        };
        let choice = SchemaChoice {
            schema: info.clone(),
            field_count: descriptor.field_count(),
            index,
            source,
        };
        Ok(Some((choice, descriptor)))
    }

    /// `#notetype:` 指令指定的笔记类型（名称无匹配或无法读取时为 None）
    fn directive_schema(
        &self,
        schemas: &[SchemaInfo],
        directives: &Directives,
    ) -> Option<(SchemaChoice, SchemaDescriptor)> {
        let name = directives.notetype()?;
        let Some(index) = find_schema_by_name(schemas, name) else {
            warn!(notetype = name, "指令指定的笔记类型不存在");
            return None;
        };
        match self.schema_choice(schemas, index, SchemaSource::Directive) {
            Ok(choice) => choice,
            Err(e) => {
                warn!(notetype = name, error = %e, "指令指定的笔记类型读取失败");
                None
            }
        }
    }

    /// 内容分析：每次内容或选项变化后调用
    ///
    /// # 返回
    /// - None: 输入为空（状态栏清空）
    /// - Some(ContentAnalysis): 检测结果；检测失败体现在 format 中，不返回错误
    #[instrument(skip(self, raw), fields(raw_len = raw.len()))]
    pub fn analyze_content(&self, raw: &str, options: AnalysisOptions) -> Option<ContentAnalysis> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let settings = self.detection_settings();
        let directives = extract_directives(raw);
        let body = strip_directive_lines(raw);

        let schemas = self.host.list_schemas().unwrap_or_else(|e| {
            warn!(error = %e, "笔记类型列表读取失败");
            Vec::new()
        });
        let forced = self.directive_schema(&schemas, &directives).map(|(choice, _)| choice);

        let (format, auto) = match options.delimiter_mode {
            DelimiterMode::Auto => match DelimiterDetector::new(settings).detect(&body) {
                Ok(format) => (format, true),
                Err(e) => {
                    warn!(error = %e, "格式检测失败");
                    return Some(ContentAnalysis {
                        directives,
                        body,
                        format: FormatStatus::Failed {
                            message: e.to_string(),
                        },
                        schema: forced,
                    });
                }
            },
            DelimiterMode::Fixed(delimiter) => {
                let row_count = CsvRowReader::count_rows(&body, delimiter).unwrap_or(0);
                (
                    CsvFormat {
                        delimiter,
                        row_count,
                    },
                    false,
                )
            }
        };

        let schema = forced.or_else(|| {
            auto_pick_schema(
                &body,
                format.delimiter,
                &schemas,
                &self.host,
                options.header_hint,
                &settings,
            )
            .map(|picked| SchemaChoice {
                schema: schemas[picked.index].clone(),
                field_count: picked.field_count,
                index: picked.index,
                source: SchemaSource::Detected,
            })
        });

        debug!(schema = ?schema.as_ref().map(|s| &s.schema.name), "内容分析完成");
        Some(ContentAnalysis {
            directives,
            body,
            format: FormatStatus::Detected { format, auto },
            schema,
        })
    }

    /// 确定导入使用的笔记类型
    ///
    /// 优先级: 显式指定 > `#notetype:` 指令 > 自动匹配
    fn resolve_schema(
        &self,
        schemas: &[SchemaInfo],
        directives: &Directives,
        body: &str,
        delimiter: Delimiter,
        request: &ImportRequest,
        settings: &DetectionSettings,
    ) -> ApiResult<(SchemaChoice, SchemaDescriptor)> {
        if let Some(name) = request
            .schema_override
            .as_deref()
            .filter(|n| !n.trim().is_empty())
        {
            let index = find_schema_by_name(schemas, name)
                .ok_or_else(|| ApiError::UnknownSchema(name.trim().to_string()))?;
            return self
                .schema_choice(schemas, index, SchemaSource::Override)?
                .ok_or(ApiError::SchemaNotFound);
        }

        if let Some(choice) = self.directive_schema(schemas, directives) {
            return Ok(choice);
        }

        let picked = auto_pick_schema(
            body,
            delimiter,
            schemas,
            &self.host,
            request.header_present,
            settings,
        )
        .ok_or(ApiError::SchemaUnresolved)?;
        self.schema_choice(schemas, picked.index, SchemaSource::Detected)?
            .ok_or(ApiError::SchemaNotFound)
    }

    /// 快速导入
    ///
    /// # 返回
    /// - Ok(QuickImportResponse): 导入结果
    /// - Err(ApiError): 输入为空 / 牌组或笔记类型无法解析 / 无数据行 / 笔记写入失败
    ///
    /// # 说明
    /// - 任一笔记写入失败即中止，此前已写入的笔记保留
    #[instrument(skip(self, raw, request), fields(raw_len = raw.len()))]
    pub fn quick_import(&self, raw: &str, request: &ImportRequest) -> ApiResult<QuickImportResponse> {
        let start_time = Instant::now();

        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ApiError::InputEmpty);
        }

        let settings = self.detection_settings();
        let directives = extract_directives(raw);
        let body = strip_directive_lines(raw);

        let deck = self
            .host
            .resolve_container(&request.container)?
            .ok_or(ApiError::ContainerUnresolved)?;

        let schemas = self.host.list_schemas()?;
        let delimiter = self.resolve_delimiter(request.delimiter_mode, &body);
        let (schema, descriptor) = self.resolve_schema(
            &schemas,
            &directives,
            &body,
            delimiter,
            request,
            &settings,
        )?;
        info!(
            deck = %deck.name,
            schema = %schema.schema.name,
            source = ?schema.source,
            delimiter = %delimiter,
            "开始快速导入"
        );

        self.host.select_container(deck.id)?;

        let importer = BulkImporterImpl::new(&self.host);
        let outcome = importer.do_import(
            &body,
            delimiter,
            &descriptor,
            deck.id,
            request.header_present,
        )?;

        Ok(QuickImportResponse {
            outcome,
            deck,
            schema,
            delimiter_auto_detected: request.delimiter_mode.is_auto(),
            elapsed_ms: start_time.elapsed().as_millis() as i64,
        })
    }

    /// 在父牌组下创建子牌组并选中
    ///
    /// # 参数
    /// - parent: 父牌组完整名称（为空时在顶层创建）
    /// - child: 子牌组名称（trim 后连续空白压成一个空格）
    pub fn create_subdeck(&self, parent: &str, child: &str) -> ApiResult<ContainerInfo> {
        let child = child.trim();
        if child.is_empty() {
            return Err(ApiError::SubdeckNameEmpty);
        }
        let child = WHITESPACE_RUN.replace_all(child, " ");

        let parent = parent.trim();
        let full_name = if parent.is_empty() {
            child.into_owned()
        } else {
            format!("{}::{}", parent, child)
        };

        let deck = self
            .host
            .get_or_create_container(&full_name)
            .map_err(|e| ApiError::SubdeckCreationFailed(e.to_string()))?;
        self.host
            .select_container(deck.id)
            .map_err(|e| ApiError::SubdeckCreationFailed(e.to_string()))?;

        info!(deck = %deck.name, "子牌组已创建并选中");
        Ok(deck)
    }
}

// ==========================================
// 提示文本
// ==========================================

/// 状态栏: 各部分以 " • " 连接
pub fn render_status(analysis: &ContentAnalysis) -> String {
    let format = match &analysis.format {
        FormatStatus::Detected { format, .. } => format,
        FormatStatus::Failed { message } => {
            return t_with_args("status.detection_failed", &[("error", message.as_str())]);
        }
    };

    let delimiter_name = format.delimiter.display_name();
    let rows = format.row_count.to_string();
    let mut parts = vec![
        t_with_args("status.detected", &[("delimiter", delimiter_name.as_str())]),
        t_with_args("status.rows", &[("count", rows.as_str())]),
    ];

    if let Some(choice) = &analysis.schema {
        let fields = choice.field_count.to_string();
        let args = [
            ("name", choice.schema.name.as_str()),
            ("count", fields.as_str()),
        ];
        let key = match choice.source {
            SchemaSource::Directive => "status.note_type_directive",
            SchemaSource::Detected | SchemaSource::Override => "status.note_type",
        };
        parts.push(t_with_args(key, &args));
    }

    parts.join(" • ")
}

/// 导入完成提示
pub fn render_outcome(response: &QuickImportResponse) -> String {
    let added = response.outcome.added.to_string();
    let mut msg = t_with_args(
        "import.complete",
        &[("added", added.as_str()), ("deck", response.deck.name.as_str())],
    );

    if response.outcome.skipped_empty > 0 {
        let skipped = response.outcome.skipped_empty.to_string();
        msg.push('\n');
        msg.push_str(&t_with_args(
            "import.skipped_empty",
            &[("count", skipped.as_str())],
        ));
    }

    if response.delimiter_auto_detected {
        let name = response.outcome.delimiter.display_name();
        msg.push_str("\n\n");
        msg.push_str(&t_with_args(
            "import.used_delimiter",
            &[("delimiter", name.as_str())],
        ));
    }
    msg
}

/// 子牌组创建提示
pub fn render_subdeck_created(deck: &ContainerInfo) -> String {
    t_with_args("subdeck.created", &[("name", deck.name.as_str())])
}
