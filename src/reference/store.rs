use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

use crate::io::fasta::{FastaReader, FastaRecord};

/// 一条参考序列，加载后只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSequence {
    pub label: String,
    /// 大写残基，可含 IUPAC 简并码
    pub residues: Vec<u8>,
}

impl ReferenceSequence {
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

/// 参考序列集合，顺序即源文件中的出现顺序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceStore {
    seqs: Vec<ReferenceSequence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub n_seqs: usize,
    pub total_len: usize,
    pub min_len: usize,
}

impl ReferenceStore {
    pub fn new(seqs: Vec<ReferenceSequence>) -> Self {
        Self { seqs }
    }

    /// 打开并解析 FASTA 文件
    pub fn load(path: &str) -> Result<Self> {
        let fh = std::fs::File::open(path)
            .map_err(|e| anyhow!("cannot open reference FASTA '{}': {}", path, e))?;
        Self::from_reader(std::io::BufReader::new(fh))
            .map_err(|e| anyhow!("cannot read reference FASTA '{}': {}", path, e))
    }

    /// 从任意 BufRead 解析；空序列记录被丢弃
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut seqs = Vec::new();
        for rec in FastaReader::new(reader) {
            let FastaRecord { label, seq } = rec?;
            if seq.is_empty() {
                log::debug!("dropping empty record '{}'", label);
                continue;
            }
            seqs.push(ReferenceSequence { label, residues: seq });
        }
        Ok(Self { seqs })
    }

    /// 去掉 label 含 `pattern` 的记录，返回被去掉的条数
    pub fn exclude_labels_containing(&mut self, pattern: &str) -> usize {
        let before = self.seqs.len();
        self.seqs.retain(|s| !s.label.contains(pattern));
        before - self.seqs.len()
    }

    pub fn sequences(&self) -> &[ReferenceSequence] {
        &self.seqs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReferenceSequence> {
        self.seqs.iter()
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            n_seqs: self.seqs.len(),
            total_len: self.seqs.iter().map(ReferenceSequence::len).sum(),
            min_len: self.seqs.iter().map(ReferenceSequence::len).min().unwrap_or(0),
        }
    }

    /// 短于 `query_len` 的参考序列条数（这些序列没有可比对窗口）
    pub fn count_shorter_than(&self, query_len: usize) -> usize {
        self.seqs.iter().filter(|s| s.len() < query_len).count()
    }
}

impl<'a> IntoIterator for &'a ReferenceStore {
    type Item = &'a ReferenceSequence;
    type IntoIter = std::slice::Iter<'a, ReferenceSequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.seqs.iter()
    }
}
