// ==========================================
// CSV Import+ - 宿主集合 Repository Trait
// ==========================================
// 职责: 定义检测/导入引擎依赖的宿主能力（不包含实现）
// 红线: Repository 不含业务规则，只做数据存取
// ==========================================
// 引擎只依赖这里的 trait，宿主实例由调用方显式注入
// ==========================================

use crate::domain::{
    ContainerId, ContainerInfo, ContainerSelection, Record, SchemaDescriptor, SchemaId,
    SchemaInfo,
};
use crate::repository::error::RepositoryResult;
use std::sync::Arc;

// ==========================================
// SchemaRepository Trait
// ==========================================
// 用途: 笔记类型只读访问
// 实现者: CollectionRepositoryImpl（使用 rusqlite）
pub trait SchemaRepository: Send + Sync {
    /// 列出全部笔记类型（顺序即界面下拉框顺序）
    fn list_schemas(&self) -> RepositoryResult<Vec<SchemaInfo>>;

    /// 按 ID 读取笔记类型及其有序字段
    ///
    /// # 返回
    /// - Ok(Some(SchemaDescriptor)): 找到
    /// - Ok(None): 宿主中不存在
    /// - Err: 存储错误
    fn get_schema(&self, id: SchemaId) -> RepositoryResult<Option<SchemaDescriptor>>;
}

// ==========================================
// ContainerRepository Trait
// ==========================================
// 用途: 牌组解析 / 选择 / 创建
pub trait ContainerRepository: Send + Sync {
    fn list_containers(&self) -> RepositoryResult<Vec<ContainerInfo>>;

    /// 宿主当前选中的牌组（可能为空）
    fn current_container(&self) -> RepositoryResult<Option<ContainerInfo>>;

    /// 解析用户选择
    ///
    /// # 返回
    /// - Ok(None): 选择无法对应到任何牌组
    fn resolve_container(
        &self,
        selection: &ContainerSelection,
    ) -> RepositoryResult<Option<ContainerInfo>>;

    /// 将牌组设为宿主当前牌组
    fn select_container(&self, id: ContainerId) -> RepositoryResult<()>;

    /// 按完整名称取得牌组，不存在则创建（子牌组用 `::` 分隔）
    fn get_or_create_container(&self, name: &str) -> RepositoryResult<ContainerInfo>;
}

// ==========================================
// RecordRepository Trait
// ==========================================
// 用途: 笔记创建与落库
// 说明: 每次 add_record 独立提交，不提供批量事务
pub trait RecordRepository: Send + Sync {
    /// 创建绑定到笔记类型的空笔记（字段槽位数 = 字段数）
    fn new_record(&self, schema: &SchemaDescriptor) -> Record {
        Record::new(schema.id, schema.field_count())
    }

    /// 将笔记写入目标牌组，返回宿主分配的笔记 ID
    fn add_record(&self, record: &Record, container: ContainerId) -> RepositoryResult<i64>;
}

/// 完整宿主集合能力
pub trait CollectionRepository: SchemaRepository + ContainerRepository + RecordRepository {}

impl<T> CollectionRepository for T where T: SchemaRepository + ContainerRepository + RecordRepository {}

// ==========================================
// Arc 包装转发（便于多个组件共享同一宿主实例）
// ==========================================
impl<T: SchemaRepository + ?Sized> SchemaRepository for Arc<T> {
    fn list_schemas(&self) -> RepositoryResult<Vec<SchemaInfo>> {
        (**self).list_schemas()
    }

    fn get_schema(&self, id: SchemaId) -> RepositoryResult<Option<SchemaDescriptor>> {
        (**self).get_schema(id)
    }
}

impl<T: ContainerRepository + ?Sized> ContainerRepository for Arc<T> {
    fn list_containers(&self) -> RepositoryResult<Vec<ContainerInfo>> {
        (**self).list_containers()
    }

    fn current_container(&self) -> RepositoryResult<Option<ContainerInfo>> {
        (**self).current_container()
    }

    fn resolve_container(
        &self,
        selection: &ContainerSelection,
    ) -> RepositoryResult<Option<ContainerInfo>> {
        (**self).resolve_container(selection)
    }

    fn select_container(&self, id: ContainerId) -> RepositoryResult<()> {
        (**self).select_container(id)
    }

    fn get_or_create_container(&self, name: &str) -> RepositoryResult<ContainerInfo> {
        (**self).get_or_create_container(name)
    }
}

impl<T: RecordRepository + ?Sized> RecordRepository for Arc<T> {
    fn new_record(&self, schema: &SchemaDescriptor) -> Record {
        (**self).new_record(schema)
    }

    fn add_record(&self, record: &Record, container: ContainerId) -> RepositoryResult<i64> {
        (**self).add_record(record, container)
    }
}

// 引用转发（导入器按引用借用宿主）
impl<T: RecordRepository + ?Sized> RecordRepository for &T {
    fn new_record(&self, schema: &SchemaDescriptor) -> Record {
        (**self).new_record(schema)
    }

    fn add_record(&self, record: &Record, container: ContainerId) -> RepositoryResult<i64> {
        (**self).add_record(record, container)
    }
}
