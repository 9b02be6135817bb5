// ==========================================
// 实验跟踪流水线 - 模型注册表
// ==========================================
// 职责: 模型名 → 分类器构造;构造成功后替换槽位中的激活模型
// 约定: 未知模型名返回 Ok(None),不是错误;激活模型保持不变
// 约定: 超参数无效返回错误;激活模型保持不变
// ==========================================

use crate::classifier::{Classifier, Hyperparameters, ModelKind};
use crate::engine::artifact::ModelSlot;
use crate::engine::error::PipelineResult;
use std::sync::Arc;

pub struct ModelRegistry {
    seed: u64,
    slot: Arc<ModelSlot>,
}

impl ModelRegistry {
    /// # 参数
    /// - `seed`: 注入所有随机模型的固定种子
    /// - `slot`: 流水线共享的模型槽位
    pub fn new(seed: u64, slot: Arc<ModelSlot>) -> Self {
        Self { seed, slot }
    }

    /// 可选模型名称 (固定集合)
    pub fn list_models(&self) -> Vec<&'static str> {
        ModelKind::ALL.iter().map(|k| k.as_str()).collect()
    }

    /// 当前激活模型名称
    pub fn active_model(&self) -> PipelineResult<ModelKind> {
        self.slot.model_kind()
    }

    /// 构造并加载模型
    ///
    /// # 返回
    /// - `Ok(Some(kind))`: 已替换激活模型,已拟合产物被清空
    /// - `Ok(None)`: 模型名不在注册表中
    /// - `Err(...)`: 超参数无效或槽位不可用
    pub fn load_model(
        &self,
        name: &str,
        hyperparameters: &Hyperparameters,
    ) -> PipelineResult<Option<ModelKind>> {
        let Some(kind) = ModelKind::parse(name) else {
            tracing::warn!(model = name, "模型不在注册表中");
            return Ok(None);
        };

        let classifier = Classifier::from_hyperparameters(kind, hyperparameters, self.seed)?;
        let generation = self.slot.replace_model(classifier)?;
        tracing::info!(model = %kind, generation, "激活模型已替换");
        Ok(Some(kind))
    }
}
