//! 采集结果写入
//!
//! 以业务唯一键判重：默认跳过已有文档，`update` 模式下保留 id 与创建时间整体覆盖。

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::error::Result;
use crate::services::ContentService;
use crate::storage::repository::Document;

/// 单个文档的写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Created,
    Updated,
    Skipped,
    /// `--dry-run`：只输出 JSON
    Printed,
}

/// 一次采集的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub discovered: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub printed: usize,
    pub failed: usize,
}

impl ImportReport {
    pub fn record(&mut self, outcome: ImportOutcome) {
        match outcome {
            ImportOutcome::Created => self.created += 1,
            ImportOutcome::Updated => self.updated += 1,
            ImportOutcome::Skipped => self.skipped += 1,
            ImportOutcome::Printed => self.printed += 1,
        }
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn processed(&self) -> usize {
        self.created + self.updated + self.skipped + self.printed + self.failed
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "发现 {}，新增 {}，更新 {}，跳过 {}，输出 {}，失败 {}",
            self.discovered, self.created, self.updated, self.skipped, self.printed, self.failed
        )
    }
}

/// 导入模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// 已存在则跳过
    #[default]
    SkipExisting,
    /// 已存在则覆盖
    Update,
    /// 不写入，打印 JSON
    DryRun,
}

pub struct Importer<T: Document> {
    /// `DryRun` 模式下为空
    service: Option<ContentService<T>>,
    mode: ImportMode,
}

impl<T: Document> Importer<T> {
    pub fn new(service: ContentService<T>, mode: ImportMode) -> Self {
        Self {
            service: Some(service),
            mode,
        }
    }

    /// 只打印、不连接存储
    pub fn dry_run() -> Self {
        Self {
            service: None,
            mode: ImportMode::DryRun,
        }
    }

    pub fn mode(&self) -> ImportMode {
        self.mode
    }

    pub async fn import(&self, mut doc: T) -> Result<ImportOutcome> {
        let service = match (&self.service, self.mode) {
            (Some(service), ImportMode::SkipExisting | ImportMode::Update) => service,
            _ => {
                println!("{}", serde_json::to_string_pretty(&doc)?);
                return Ok(ImportOutcome::Printed);
            }
        };

        let key = doc.natural_key();
        match service.find_by_natural_key(&key).await? {
            Some(existing) if self.mode == ImportMode::Update => {
                doc.set_identity(existing.id(), existing.created_at());
                service.save(doc).await?;
                debug!(collection = T::COLLECTION, key = %key, "已覆盖");
                Ok(ImportOutcome::Updated)
            }
            Some(_) => {
                debug!(collection = T::COLLECTION, key = %key, "已存在，跳过");
                Ok(ImportOutcome::Skipped)
            }
            None => {
                service.create(doc).await?;
                Ok(ImportOutcome::Created)
            }
        }
    }

    /// 导入一个文档并计入汇总；失败只记录不中断
    pub async fn import_into(&self, doc: T, report: &mut ImportReport) {
        let key = doc.natural_key();
        match self.import(doc).await {
            Ok(outcome) => report.record(outcome),
            Err(e) => {
                warn!(collection = T::COLLECTION, key = %key, error = %e, "写入失败");
                report.record_failure();
            }
        }
    }
}
