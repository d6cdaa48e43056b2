pub mod pack;
pub mod store;

pub use pack::{is_pack_path, PackMeta, ReferencePack, PACK_EXT};
pub use store::{ReferenceSequence, ReferenceStore, StoreStats};

use anyhow::Result;

/// 加载参考序列（FASTA 或 `.refs` pack），再按 `exclude` 中的子串过滤 label
pub fn load_reference(path: &str, exclude: &[String]) -> Result<ReferenceStore> {
    let mut store = if is_pack_path(path) {
        let pack = ReferencePack::load_from_file(path)?;
        log::info!(
            "loaded pack '{}' (source={}, built={})",
            path,
            pack.meta.source_file.as_deref().unwrap_or("?"),
            pack.meta.build_timestamp.as_deref().unwrap_or("?"),
        );
        pack.store
    } else {
        ReferenceStore::load(path)?
    };

    for pat in exclude {
        let n = store.exclude_labels_containing(pat);
        log::info!("excluded {} record(s) with label containing '{}'", n, pat);
    }
    Ok(store)
}
