use crate::error::{AppError, AppResult, FileError};
use crate::models::plan::BatchPlan;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载批处理计划
pub async fn load_plan_file(toml_file_path: &Path) -> AppResult<BatchPlan> {
    let path_str = toml_file_path.display().to_string();

    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(path_str.clone(), e))?;

    let mut plan = parse_plan(&content, &path_str)?;

    // 设置文件路径
    plan.file_path = Some(
        toml_file_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string(),
    );

    Ok(plan)
}

/// 解析计划文本
pub fn parse_plan(content: &str, path: &str) -> AppResult<BatchPlan> {
    toml::from_str(content).map_err(|source| {
        AppError::File(FileError::TomlParseFailed {
            path: path.to_string(),
            source,
        })
    })
}

/// 从文件夹中加载所有批处理计划（按文件名排序）
///
/// 单个文件加载失败只记录警告并跳过
pub async fn load_all_plans(folder_path: &str) -> AppResult<Vec<BatchPlan>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(AppError::File(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }));
    }

    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    let mut toml_files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut plans = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_plan_file(&path).await {
            Ok(plan) => {
                tracing::info!("成功加载 {} 个任务", plan.tasks.len());
                plans.push(plan);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(plans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BatchMode;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cv_batch_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_all_plans_sorted_and_skips_broken() {
        let dir = temp_dir("plans");
        std::fs::write(
            dir.join("b_chain.toml"),
            "image_id = \"img\"\nmode = \"filter_chain\"\n[[tasks]]\nkind = \"canny\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("a_features.toml"),
            "image_id = \"img\"\nmode = \"multiple_features\"\n",
        )
        .unwrap();
        std::fs::write(dir.join("broken.toml"), "mode = 42").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let plans = load_all_plans(dir.to_str().unwrap()).await.unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].mode, BatchMode::MultipleFeatures);
        assert_eq!(plans[0].file_path.as_deref(), Some("a_features.toml"));
        assert_eq!(plans[1].mode, BatchMode::FilterChain);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missing_folder_is_an_error() {
        let err = load_all_plans("/definitely/not/here").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::File(FileError::DirectoryNotFound { .. })
        ));
    }
}
