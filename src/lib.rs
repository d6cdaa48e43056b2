//! # absent-seq
//!
//! 在参考基因组中寻找“不存在”的短核酸序列，用于设计不会与天然基因组发生
//! 交叉反应的合成条形码或对照序列。
//!
//! 流程是“生成-检验”：
//!
//! - **候选生成**：固定种子的确定性随机流产生定长 A/C/G/T 序列
//! - **同源性打分**：无间隙滑动窗口，正链与反向互补链都检测，参考序列中的
//!   IUPAC 简并码按其代表的碱基集合匹配，超过阈值立即退出
//! - **搜索循环**：候选对所有参考序列都未超阈值即记为缺失序列，直到找够条数
//!
//! ## 快速示例
//!
//! ```rust
//! use absent_seq::reference::{ReferenceSequence, ReferenceStore};
//! use absent_seq::search::{AbsenceSearch, SearchOpt, SeededGenerator, WindowScorer};
//!
//! let store = ReferenceStore::new(vec![ReferenceSequence {
//!     label: "chr1".to_string(),
//!     residues: b"ACGTACGTAGCTGATCGTAGCTAGCTAGCTGATCGTAGCTAGRYNNCTGAT".to_vec(),
//! }]);
//! let opt = SearchOpt { count: 2, length: 15, seed: 7, threshold: 80.0, ..SearchOpt::default() };
//!
//! let search = AbsenceSearch::new(&store, SeededGenerator::new(opt.seed), WindowScorer, &opt).unwrap();
//! let report = search.run(|_| Ok(())).unwrap();
//! assert_eq!(report.accepted.len(), 2);
//! ```
//!
//! ## 模块说明
//!
//! - [`io`] — FASTA 解析与结果写出
//! - [`reference`] — 参考序列集合、按 label 过滤、`.refs` pack
//! - [`search`] — 候选生成、同源性打分、搜索循环
//! - [`util`] — 反向互补、IUPAC 简并码等 DNA 工具函数

pub mod io;
pub mod reference;
pub mod search;
pub mod util;
