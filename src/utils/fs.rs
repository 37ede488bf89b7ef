/// 文件持久化工具
///
/// 索引与历史记录都整体重写：先写入同目录的临时文件，再 rename 覆盖，
/// 读者只会看到旧内容或新内容。
use crate::error::FileError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::warn;

const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// 原子地写入 JSON 文件
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), FileError> {
    let display = path.display().to_string();
    let body = serde_json::to_vec_pretty(value).map_err(|source| FileError::SerializeFailed {
        path: display.clone(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FileError::write(display.clone(), e))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    tokio::fs::write(&tmp, &body)
        .await
        .map_err(|e| FileError::write(tmp.display().to_string(), e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| FileError::write(display, e))
}

/// 读取 JSON 文件；文件不存在或内容损坏时返回默认值
pub async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!("读取 {} 失败，按空内容处理: {}", path.display(), e);
            return T::default();
        }
    };

    serde_json::from_slice(&content).unwrap_or_else(|e| {
        warn!("{} 内容损坏，按空内容处理: {}", path.display(), e);
        T::default()
    })
}

/// 以 64 KiB 分块计算文件内容的 SHA-256（十六进制）
pub async fn sha256_file(path: &Path) -> Result<String, FileError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| FileError::read(path.display().to_string(), e))?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| FileError::read(path.display().to_string(), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 1u32);

        write_json_atomic(&path, &value).await.unwrap();
        let loaded: BTreeMap<String, u32> = read_json_or_default(&path).await;
        assert_eq!(loaded, value);
        assert!(!dir.path().join("nested").join("data.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_missing_or_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let missing: Vec<u32> = read_json_or_default(&dir.path().join("nope.json")).await;
        assert!(missing.is_empty());

        let corrupt = dir.path().join("bad.json");
        std::fs::write(&corrupt, b"{not json").unwrap();
        let loaded: Vec<u32> = read_json_or_default(&corrupt).await;
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_sha256_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).await.unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        // 跨越多个分块
        let big = dir.path().join("big.bin");
        std::fs::write(&big, vec![7u8; HASH_CHUNK_SIZE * 2 + 5]).unwrap();
        let expected = hex::encode(Sha256::digest(vec![7u8; HASH_CHUNK_SIZE * 2 + 5]));
        assert_eq!(sha256_file(&big).await.unwrap(), expected);
    }
}
