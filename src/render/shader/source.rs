//! 着色器源文件查找与读取
//!
//! 进程可能从仓库根目录或其子目录启动，所以每个相对路径先在 `base_dir` 下查找，
//! 找不到再到上一级目录查找。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::core::error::ShaderLoadError;

/// 已读取的源文件
#[derive(Debug, Clone)]
pub struct LoadedSource {
    /// 实际找到的路径
    pub path: PathBuf,
    pub text: String,
    /// 读取前记录的修改时间
    pub modified: Option<SystemTime>,
}

/// 候选路径：`base_dir/path`，然后 `base_dir/../path`
pub fn candidates(base_dir: &Path, path: &Path) -> [PathBuf; 2] {
    [base_dir.join(path), base_dir.join("..").join(path)]
}

/// 返回第一个存在的候选路径
pub fn locate(base_dir: &Path, path: &Path) -> Option<PathBuf> {
    candidates(base_dir, path)
        .into_iter()
        .find(|candidate| candidate.is_file())
}

/// 源文件的当前修改时间；文件不存在或平台不支持时返回 `None`
pub fn modified_time(base_dir: &Path, path: &Path) -> Option<SystemTime> {
    let found = locate(base_dir, path)?;
    fs::metadata(found).and_then(|m| m.modified()).ok()
}

/// 查找并读取源文件
pub fn read_source(base_dir: &Path, path: &Path) -> Result<LoadedSource, ShaderLoadError> {
    let found = locate(base_dir, path).ok_or_else(|| ShaderLoadError::NotFound {
        path: path.to_path_buf(),
    })?;

    // 先取修改时间再读内容：读取期间发生的写入会在下一次轮询时被发现
    let modified = fs::metadata(&found).and_then(|m| m.modified()).ok();
    let text = fs::read_to_string(&found).map_err(|e| ShaderLoadError::Io {
        path: found.clone(),
        reason: e.to_string(),
    })?;

    Ok(LoadedSource {
        path: found,
        text,
        modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_direct_path_preferred() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("build");
        fs::create_dir_all(nested.join("shaders")).unwrap();
        fs::create_dir_all(root.path().join("shaders")).unwrap();
        fs::write(nested.join("shaders/a.wgsl"), "direct").unwrap();
        fs::write(root.path().join("shaders/a.wgsl"), "parent").unwrap();

        let loaded = read_source(&nested, Path::new("shaders/a.wgsl")).unwrap();
        assert_eq!(loaded.text, "direct");
        assert!(loaded.modified.is_some());
    }

    #[test]
    fn test_parent_fallback() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("build");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(root.path().join("shaders")).unwrap();
        fs::write(root.path().join("shaders/a.wgsl"), "parent").unwrap();

        let loaded = read_source(&nested, Path::new("shaders/a.wgsl")).unwrap();
        assert_eq!(loaded.text, "parent");
        assert!(modified_time(&nested, Path::new("shaders/a.wgsl")).is_some());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let root = TempDir::new().unwrap();
        let err = read_source(root.path(), Path::new("nope.wgsl")).unwrap_err();
        assert_eq!(
            err,
            ShaderLoadError::NotFound {
                path: PathBuf::from("nope.wgsl")
            }
        );
        assert!(modified_time(root.path(), Path::new("nope.wgsl")).is_none());
    }
}
