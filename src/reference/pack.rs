use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use super::store::ReferenceStore;

/// pack 文件扩展名
pub const PACK_EXT: &str = "refs";

/// 构建信息，随 pack 一同保存
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackMeta {
    pub source_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
    /// 构建时使用的 label 排除子串
    pub excluded: Vec<String>,
}

/// 预解析好的参考序列集合（bincode 序列化），省去每次运行重新解析 FASTA
#[derive(Debug, Serialize, Deserialize)]
pub struct ReferencePack {
    pub meta: PackMeta,
    pub store: ReferenceStore,
}

impl ReferencePack {
    pub fn new(store: ReferenceStore, meta: PackMeta) -> Self {
        Self { meta, store }
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let f = std::fs::File::create(path)
            .map_err(|e| anyhow!("cannot create pack '{}': {}", path, e))?;
        let mut w = std::io::BufWriter::new(f);
        bincode::serialize_into(&mut w, self)?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let f = std::fs::File::open(path)
            .map_err(|e| anyhow!("cannot open pack '{}': {}", path, e))?;
        let pack: Self = bincode::deserialize_from(std::io::BufReader::new(f))
            .map_err(|e| anyhow!("'{}' is not a valid reference pack: {}", path, e))?;
        Ok(pack)
    }
}

/// 按扩展名判断：`.refs` 走 pack，其他按 FASTA 解析
pub fn is_pack_path(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .is_some_and(|ext| ext == PACK_EXT)
}
