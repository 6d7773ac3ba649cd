//! 任务列表 - 业务能力层
//!
//! ## 职责
//!
//! 持有当前批处理模式下的有序任务列表，负责任务标识与生命周期：
//!
//! 1. **新增**：按模式选定类别与默认操作种类，参数取注册表默认值，追加到末尾
//! 2. **删除**：越界索引直接忽略
//! 3. **编辑**：只替换操作种类，原有参数保持不变
//! 4. **切换模式**：总是先清空，任务不能跨模式携带
//!
//! 任务序号单调递增，删除、清空、切换模式都不会回退

use tracing::debug;

use crate::error::{AppResult, ValidationError};
use crate::models::{BatchMode, OperationDomain, ParameterMap, Task, TaskId};
use crate::services::schema_registry::ParameterSchemaRegistry;

/// 参数为空时的占位文本
pub const NO_PARAMETERS_TEXT: &str = "无参数";

/// 编辑请求：由任务列表发出，交给界面（或测试）填写
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub index: usize,
    pub task_id: TaskId,
    pub domain: OperationDomain,
    pub current: String,
    /// 可选的操作种类
    pub choices: Vec<&'static str>,
}

impl EditRequest {
    /// 以新操作种类作答
    pub fn answer(&self, new_discriminant: impl Into<String>) -> EditResponse {
        EditResponse {
            index: self.index,
            task_id: self.task_id,
            new_discriminant: Some(new_discriminant.into()),
        }
    }

    /// 取消编辑
    pub fn cancel(&self) -> EditResponse {
        EditResponse {
            index: self.index,
            task_id: self.task_id,
            new_discriminant: None,
        }
    }
}

/// 编辑应答
#[derive(Debug, Clone, PartialEq)]
pub struct EditResponse {
    pub index: usize,
    pub task_id: TaskId,
    /// None 表示取消
    pub new_discriminant: Option<String>,
}

/// 任务列表中一行的显示数据
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub index: usize,
    pub task_id: TaskId,
    pub title: String,
    pub parameters_text: String,
}

/// 任务列表
#[derive(Debug, Clone)]
pub struct TaskListModel {
    mode: BatchMode,
    tasks: Vec<Task>,
    next_seq: u64,
    registry: ParameterSchemaRegistry,
}

impl TaskListModel {
    pub fn new(mode: BatchMode) -> Self {
        Self {
            mode,
            tasks: Vec::new(),
            next_seq: 0,
            registry: ParameterSchemaRegistry::new(),
        }
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 切换批处理模式（总是清空列表）
    pub fn set_mode(&mut self, mode: BatchMode) {
        self.clear();
        self.mode = mode;
    }

    /// 按当前模式新增一个默认任务
    pub fn add_task(&mut self) -> &Task {
        let domain = self.mode.domain();
        let kind = domain.default_kind();
        let parameters = self.registry.defaults_for(domain, kind);
        self.push(domain, kind.to_string(), parameters)
    }

    /// 新增指定类别的默认任务（混合模式可任选类别）
    pub fn add_task_in(&mut self, domain: OperationDomain) -> AppResult<&Task> {
        self.ensure_accepts(domain)?;
        let kind = domain.default_kind();
        let parameters = self.registry.defaults_for(domain, kind);
        Ok(self.push(domain, kind.to_string(), parameters))
    }

    /// 新增带有指定操作种类与参数的任务，参数经注册表补全
    pub fn add_configured(
        &mut self,
        domain: OperationDomain,
        kind: &str,
        overrides: &ParameterMap,
    ) -> AppResult<&Task> {
        self.ensure_accepts(domain)?;
        let parameters = self.registry.resolve(domain, kind, overrides);
        Ok(self.push(domain, kind.to_string(), parameters))
    }

    /// 删除任务，越界时不做任何事
    pub fn remove_task(&mut self, index: usize) -> Option<Task> {
        if index < self.tasks.len() {
            let task = self.tasks.remove(index);
            debug!("删除任务 {}", task.id);
            Some(task)
        } else {
            None
        }
    }

    /// 替换任务的操作种类
    ///
    /// 参数保持原样，即使已不符合新种类的参数模式
    pub fn edit_task(&mut self, index: usize, new_discriminant: impl Into<String>) -> bool {
        let new_discriminant = new_discriminant.into();
        if new_discriminant.trim().is_empty() {
            return false;
        }

        match self.tasks.get_mut(index) {
            Some(task) => {
                debug!(
                    "任务 {} 操作种类: {} → {}",
                    task.id, task.discriminant, new_discriminant
                );
                task.discriminant = new_discriminant;
                true
            }
            None => false,
        }
    }

    /// 为某一行生成编辑请求
    pub fn edit_request(&self, index: usize) -> Option<EditRequest> {
        let task = self.tasks.get(index)?;
        Some(EditRequest {
            index,
            task_id: task.id,
            domain: task.domain,
            current: task.discriminant.clone(),
            choices: self.registry.known_kinds(task.domain).to_vec(),
        })
    }

    /// 应用编辑应答
    ///
    /// 若该行的任务已不是发出请求时的任务（期间被删除或重排），应答作废
    pub fn apply_edit(&mut self, response: EditResponse) -> bool {
        let Some(new_discriminant) = response.new_discriminant else {
            return false;
        };

        let changed = matches!(
            self.tasks.get(response.index),
            Some(task) if task.id == response.task_id && task.discriminant != new_discriminant
        );
        changed && self.edit_task(response.index, new_discriminant)
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// 当前任务的副本，用于构建请求
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// 显示用的行数据
    pub fn rows(&self) -> Vec<TaskRow> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(index, task)| TaskRow {
                index,
                task_id: task.id,
                title: self.title_of(task),
                parameters_text: parameters_text(&task.parameters),
            })
            .collect()
    }

    fn title_of(&self, task: &Task) -> String {
        let name = self.registry.display_name(task.domain, &task.discriminant);
        match self.mode {
            BatchMode::MixedOperations => format!("{} · {}", task.domain.name(), name),
            _ => match task.domain {
                OperationDomain::Feature => format!("提取 {}", name),
                OperationDomain::Filter => format!("滤波 {}", name),
                OperationDomain::Transform => format!("变换 {}", name),
            },
        }
    }

    fn ensure_accepts(&self, domain: OperationDomain) -> AppResult<()> {
        if self.mode.accepts(domain) {
            Ok(())
        } else {
            Err(ValidationError::DomainMismatch {
                mode: self.mode,
                domain,
            }
            .into())
        }
    }

    fn push(&mut self, domain: OperationDomain, kind: String, parameters: ParameterMap) -> &Task {
        let id = TaskId::new(self.next_seq);
        self.next_seq += 1;

        debug!("新增任务 {} ({} / {})", id, domain, kind);

        self.tasks.push(Task {
            id,
            domain,
            discriminant: kind,
            parameters,
        });
        &self.tasks[self.tasks.len() - 1]
    }
}

/// 参数的单行文本，如 `ksize: 5, sigma: 0`
pub fn parameters_text(parameters: &ParameterMap) -> String {
    if parameters.is_empty() {
        return NO_PARAMETERS_TEXT.to_string();
    }
    parameters
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::ParamValue;

    #[test]
    fn test_add_task_uses_mode_defaults() {
        let mut list = TaskListModel::new(BatchMode::MultipleFilters);
        let task = list.add_task().clone();

        assert_eq!(task.domain, OperationDomain::Filter);
        assert_eq!(task.discriminant, "gaussian_blur");
        assert_eq!(task.parameters["ksize"], ParamValue::Int(5));
        assert_eq!(task.parameters["sigma"], ParamValue::Float(0.0));
    }

    #[test]
    fn test_ids_strictly_increase_across_removals() {
        let mut list = TaskListModel::new(BatchMode::MultipleFeatures);
        let mut ids = Vec::new();
        for round in 0..6 {
            ids.push(list.add_task().id);
            if round % 2 == 1 {
                list.remove_task(0);
            }
        }

        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_counter_survives_clear_and_mode_switch() {
        let mut list = TaskListModel::new(BatchMode::MultipleFeatures);
        list.add_task();
        list.add_task();
        list.clear();
        list.set_mode(BatchMode::FilterChain);

        assert_eq!(list.add_task().id.to_string(), "task_2");
    }

    #[test]
    fn test_switching_mode_always_empties_list() {
        let mut list = TaskListModel::new(BatchMode::MultipleTransformations);
        list.add_task();
        list.add_task();
        list.set_mode(BatchMode::MultipleTransformations);
        assert!(list.is_empty());

        list.add_task();
        list.set_mode(BatchMode::MixedOperations);
        assert_eq!(list.len(), 0);
        assert_eq!(list.mode(), BatchMode::MixedOperations);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut list = TaskListModel::new(BatchMode::FilterChain);
        list.add_task();
        assert!(list.remove_task(5).is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_edit_keeps_stale_parameters() {
        let mut list = TaskListModel::new(BatchMode::MultipleFilters);
        list.add_task();
        assert!(list.edit_task(0, "canny"));

        let task = list.get(0).unwrap();
        assert_eq!(task.discriminant, "canny");
        assert!(task.parameters.contains_key("ksize"));
        assert!(!task.parameters.contains_key("threshold1"));
    }

    #[test]
    fn test_edit_with_blank_kind_is_ignored() {
        let mut list = TaskListModel::new(BatchMode::MultipleFilters);
        list.add_task();
        assert!(!list.edit_task(0, "  "));
        assert!(!list.edit_task(3, "canny"));
        assert_eq!(list.get(0).unwrap().discriminant, "gaussian_blur");
    }

    #[test]
    fn test_edit_request_response_round() {
        let mut list = TaskListModel::new(BatchMode::TransformationChain);
        list.add_task();

        let request = list.edit_request(0).unwrap();
        assert_eq!(request.current, "rotation");
        assert!(request.choices.contains(&"flip"));

        assert!(!list.apply_edit(request.cancel()));
        assert!(list.apply_edit(request.answer("flip")));
        assert_eq!(list.get(0).unwrap().discriminant, "flip");
    }

    #[test]
    fn test_stale_edit_response_is_discarded() {
        let mut list = TaskListModel::new(BatchMode::MultipleFeatures);
        list.add_task();
        list.add_task();

        let request = list.edit_request(0).unwrap();
        list.remove_task(0);

        assert!(!list.apply_edit(request.answer("orb")));
        assert_eq!(list.get(0).unwrap().discriminant, "sift");
    }

    #[test]
    fn test_add_task_in_respects_mode_domain() {
        let mut list = TaskListModel::new(BatchMode::FilterChain);
        let err = list.add_task_in(OperationDomain::Feature).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::DomainMismatch { .. })
        ));

        list.set_mode(BatchMode::MixedOperations);
        let task = list.add_task_in(OperationDomain::Transform).unwrap();
        assert_eq!(task.discriminant, "rotation");
    }

    #[test]
    fn test_add_configured_resolves_parameters() {
        let mut list = TaskListModel::new(BatchMode::MultipleFeatures);
        let mut overrides = ParameterMap::new();
        overrides.insert("n_features".to_string(), ParamValue::Int(800));

        let task = list
            .add_configured(OperationDomain::Feature, "orb", &overrides)
            .unwrap();
        assert_eq!(task.parameters["n_features"], ParamValue::Int(800));
        assert_eq!(task.parameters["scale_factor"], ParamValue::Float(1.2));
    }

    #[test]
    fn test_rows_projection() {
        let mut list = TaskListModel::new(BatchMode::MultipleFilters);
        list.add_task();
        list.add_configured(OperationDomain::Filter, "sobel", &ParameterMap::new())
            .unwrap();

        let rows = list.rows();
        assert_eq!(rows[0].title, "滤波 高斯模糊");
        assert_eq!(rows[0].parameters_text, "ksize: 5, sigma: 0");
        assert_eq!(rows[1].parameters_text, NO_PARAMETERS_TEXT);
    }
}
