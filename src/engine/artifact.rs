// ==========================================
// 实验跟踪流水线 - 拟合产物与模型槽位
// ==========================================
// FittedArtifact: 标准化变换 + 已训练分类器,整体不可变,带版本号
// ModelSlot: 当前模型原型 + 当前产物;训练在锁外进行,结果落库后短暂写锁替换
// 约束: 读者持有 Arc 快照,只会看到旧产物或新产物,不会看到混合状态
// 约束: 训练期间模型被替换 (generation 变化) 时,训练结果不再安装
// ==========================================

use crate::classifier::{Classifier, ModelKind};
use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::preprocess::StandardScaler;
use chrono::{NaiveDateTime, Utc};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

// ==========================================
// FittedArtifact
// ==========================================
#[derive(Debug, Clone)]
pub struct FittedArtifact {
    pub version: u64,
    pub model_name: ModelKind,
    pub scaler: StandardScaler,
    pub classifier: Classifier,
    pub feature_names: Vec<String>,
    pub fitted_at: NaiveDateTime,
}

impl FittedArtifact {
    pub fn new(
        version: u64,
        scaler: StandardScaler,
        classifier: Classifier,
        feature_names: Vec<String>,
    ) -> Self {
        Self {
            version,
            model_name: classifier.kind(),
            scaler,
            classifier,
            feature_names,
            fitted_at: Utc::now().naive_utc(),
        }
    }
}

#[derive(Debug)]
struct SlotState {
    prototype: Classifier,
    generation: u64,
    artifact: Option<Arc<FittedArtifact>>,
    next_version: u64,
}

// ==========================================
// ModelSlot
// ==========================================
#[derive(Debug)]
pub struct ModelSlot {
    state: RwLock<SlotState>,
}

impl ModelSlot {
    /// 以未训练原型创建槽位
    pub fn new(prototype: Classifier) -> Self {
        Self {
            state: RwLock::new(SlotState {
                prototype,
                generation: 0,
                artifact: None,
                next_version: 1,
            }),
        }
    }

    fn read(&self) -> PipelineResult<RwLockReadGuard<'_, SlotState>> {
        self.state
            .read()
            .map_err(|e| PipelineError::StateLock(e.to_string()))
    }

    fn write(&self) -> PipelineResult<RwLockWriteGuard<'_, SlotState>> {
        self.state
            .write()
            .map_err(|e| PipelineError::StateLock(e.to_string()))
    }

    /// 当前激活的模型
    pub fn model_kind(&self) -> PipelineResult<ModelKind> {
        Ok(self.read()?.prototype.kind())
    }

    /// 克隆未训练原型,并返回其 generation
    pub fn prototype(&self) -> PipelineResult<(Classifier, u64)> {
        let state = self.read()?;
        Ok((state.prototype.clone(), state.generation))
    }

    /// 当前产物快照
    pub fn artifact(&self) -> PipelineResult<Option<Arc<FittedArtifact>>> {
        Ok(self.read()?.artifact.clone())
    }

    /// 替换激活模型并清空已拟合产物
    ///
    /// 返回新的 generation
    pub fn replace_model(&self, prototype: Classifier) -> PipelineResult<u64> {
        let mut state = self.write()?;
        state.prototype = prototype;
        state.generation += 1;
        state.artifact = None;
        Ok(state.generation)
    }

    /// 为训练结果预留版本号
    ///
    /// # 返回
    /// - `Ok(None)`: 训练开始后模型已被替换
    pub fn reserve_version(&self, generation: u64) -> PipelineResult<Option<u64>> {
        let mut state = self.write()?;
        if state.generation != generation {
            return Ok(None);
        }
        let version = state.next_version;
        state.next_version += 1;
        Ok(Some(version))
    }

    /// 安装训练产物 (预测与运行记录落库之后调用)
    ///
    /// # 返回
    /// - `Ok(Some(artifact))`: 已安装
    /// - `Ok(None)`: 模型已被替换,或已安装更新版本,产物丢弃
    pub fn install(
        &self,
        generation: u64,
        artifact: FittedArtifact,
    ) -> PipelineResult<Option<Arc<FittedArtifact>>> {
        let mut state = self.write()?;
        if state.generation != generation {
            return Ok(None);
        }
        if let Some(current) = &state.artifact {
            if current.version > artifact.version {
                return Ok(None);
            }
        }

        let artifact = Arc::new(artifact);
        state.artifact = Some(artifact.clone());
        Ok(Some(artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn scaler() -> StandardScaler {
        StandardScaler::fit(&array![[0.0], [1.0]]).unwrap()
    }

    fn fitted(slot: &ModelSlot, generation: u64, proto: &Classifier) -> FittedArtifact {
        let version = slot.reserve_version(generation).unwrap().unwrap();
        FittedArtifact::new(version, scaler(), proto.clone(), vec!["feature_1".into()])
    }

    #[test]
    fn test_install_and_snapshot() {
        let slot = ModelSlot::new(Classifier::with_defaults(ModelKind::LogisticRegression, 42));
        assert!(slot.artifact().unwrap().is_none());

        let (proto, generation) = slot.prototype().unwrap();
        let first = fitted(&slot, generation, &proto);
        assert_eq!(first.version, 1);
        // 预留版本号不改变当前产物
        assert!(slot.artifact().unwrap().is_none());

        slot.install(generation, first).unwrap().unwrap();
        let snapshot = slot.artifact().unwrap().unwrap();

        let second = fitted(&slot, generation, &proto);
        assert_eq!(slot.install(generation, second).unwrap().unwrap().version, 2);
        // 旧快照不受替换影响
        assert_eq!(snapshot.version, 1);
    }

    #[test]
    fn test_older_version_does_not_replace_newer() {
        let slot = ModelSlot::new(Classifier::with_defaults(ModelKind::LogisticRegression, 42));
        let (proto, generation) = slot.prototype().unwrap();

        let older = fitted(&slot, generation, &proto);
        let newer = fitted(&slot, generation, &proto);
        slot.install(generation, newer).unwrap().unwrap();

        assert!(slot.install(generation, older).unwrap().is_none());
        assert_eq!(slot.artifact().unwrap().unwrap().version, 2);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let slot = ModelSlot::new(Classifier::with_defaults(ModelKind::RandomForest, 42));
        let (proto, generation) = slot.prototype().unwrap();
        let pending = fitted(&slot, generation, &proto);

        slot.replace_model(Classifier::with_defaults(ModelKind::Svc, 42)).unwrap();
        assert!(slot.reserve_version(generation).unwrap().is_none());
        assert!(slot.install(generation, pending).unwrap().is_none());
        assert!(slot.artifact().unwrap().is_none());
        assert_eq!(slot.model_kind().unwrap(), ModelKind::Svc);
    }

    #[test]
    fn test_replace_model_clears_artifact() {
        let slot = ModelSlot::new(Classifier::with_defaults(ModelKind::RandomForest, 42));
        let (proto, generation) = slot.prototype().unwrap();
        let pending = fitted(&slot, generation, &proto);
        slot.install(generation, pending).unwrap();
        assert!(slot.artifact().unwrap().is_some());

        slot.replace_model(Classifier::with_defaults(ModelKind::LogisticRegression, 42))
            .unwrap();
        assert!(slot.artifact().unwrap().is_none());
    }
}
