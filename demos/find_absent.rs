//! 演示如何在 library 模式下使用 absent-seq 寻找缺失序列。
//!
//! 运行方式：
//! ```bash
//! cargo run --example find_absent
//! ```

use std::io::Cursor;

use absent_seq::reference::ReferenceStore;
use absent_seq::search::{self, AbsenceSearch, SearchOpt, SeededGenerator, WindowScorer};

fn main() -> anyhow::Result<()> {
    // 1. 参考序列（含 IUPAC 简并码）
    let fasta = b">chr1 demo\nACGTACGTAGCTGATCGTAGCTAGCTAGCTGATCGTAGCTAGCTAGCTGAT\n\
>chr2 demo\nGATTACARYGATTACAKMGATTACASWGATTACABDHV\n\
>chrM mitochondrion\nTTTTTTTTTTTTTTTTTTTTTTTTTT\n";
    let mut store = ReferenceStore::from_reader(Cursor::new(&fasta[..]))?;
    let dropped = store.exclude_labels_containing("mitochondrion");
    println!("参考序列: {} 条（排除 {} 条）", store.len(), dropped);

    // 2. 单条打分
    let hit = search::test_homology(b"GATTACA", &store.sequences()[1].residues, 90.0);
    println!("GATTACA vs chr2: exceeded={}, best={}", hit.exceeded, hit.best_score);

    // 3. 搜索
    let opt = SearchOpt { count: 5, length: 14, seed: 2024, threshold: 75.0, ..SearchOpt::default() };
    let search = AbsenceSearch::new(&store, SeededGenerator::new(opt.seed), WindowScorer, &opt)?;
    let report = search.run(|q| {
        println!("  {}", String::from_utf8_lossy(q));
        Ok(())
    })?;
    println!(
        "找到 {} 条缺失序列，共尝试 {} 次（拒绝 {} 次），耗时 {:?}",
        report.accepted.len(),
        report.attempts,
        report.rejected,
        report.elapsed
    );
    Ok(())
}
