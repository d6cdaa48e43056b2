use crate::util::dna;

/// 单条参考序列的同源性检测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HomologyHit {
    /// 是否存在某个窗口（任一链）严格超过阈值
    pub exceeded: bool,
    /// 超阈值时为触发窗口的匹配数，否则为两条链上所有窗口的最大匹配数
    pub best_score: usize,
}

/// 同源性打分器。搜索循环只依赖此 trait，测试可注入假实现。
pub trait HomologyScorer {
    fn test(&self, query: &[u8], reference: &[u8], threshold: f64) -> HomologyHit;

    /// `rc` 为调用方预先算好的 `query` 反向互补，同一候选对所有参考序列复用。
    /// 默认忽略 `rc`，交给 [`HomologyScorer::test`]。
    fn test_strands(&self, query: &[u8], rc: &[u8], reference: &[u8], threshold: f64) -> HomologyHit {
        let _ = rc;
        self.test(query, reference, threshold)
    }
}

/// 无间隙滑动窗口打分，正反两条链，参考侧支持 IUPAC 简并码
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowScorer;

impl HomologyScorer for WindowScorer {
    fn test(&self, query: &[u8], reference: &[u8], threshold: f64) -> HomologyHit {
        test_homology(query, reference, threshold)
    }

    fn test_strands(&self, query: &[u8], rc: &[u8], reference: &[u8], threshold: f64) -> HomologyHit {
        test_homology_strands(query, rc, reference, threshold)
    }
}

/// `score / query_len * 100`
#[inline]
pub fn homology_percent(score: usize, query_len: usize) -> f64 {
    if query_len == 0 {
        return 0.0;
    }
    score as f64 / query_len as f64 * 100.0
}

/// 严格大于：恰好等于阈值不算超过
#[inline]
pub fn exceeds(score: usize, query_len: usize, threshold: f64) -> bool {
    query_len > 0 && homology_percent(score, query_len) > threshold
}

/// 窗口 `window`（与 query 等长）的匹配位点数
#[inline]
pub fn window_matches(query: &[u8], window: &[u8]) -> usize {
    query
        .iter()
        .zip(window)
        .filter(|&(&q, &r)| dna::iupac_accepts(r, q))
        .count()
}

/// 单链扫描：对每个偏移 `0..=len(ref)-len(query)` 计数。
/// 一旦某窗口超过阈值立即返回 `Some(匹配数)`；否则更新 `best` 并返回 `None`。
pub fn scan_strand(query: &[u8], reference: &[u8], threshold: f64, best: &mut usize) -> Option<usize> {
    let m = query.len();
    if m == 0 || reference.len() < m {
        return None;
    }
    for window in reference.windows(m) {
        let score = window_matches(query, window);
        if exceeds(score, m, threshold) {
            return Some(score);
        }
        if score > *best {
            *best = score;
        }
    }
    None
}

/// 先正链，再反向互补链；任一链超阈值即提前返回。
///
/// 参考序列短于 query 时没有窗口，结果为 `{ exceeded: false, best_score: 0 }`。
pub fn test_homology(query: &[u8], reference: &[u8], threshold: f64) -> HomologyHit {
    if query.is_empty() || reference.len() < query.len() {
        return HomologyHit::default();
    }
    test_homology_strands(query, &dna::revcomp(query), reference, threshold)
}

/// 同 [`test_homology`]，反向互补 `rc` 由调用方提供
pub fn test_homology_strands(query: &[u8], rc: &[u8], reference: &[u8], threshold: f64) -> HomologyHit {
    if query.is_empty() || reference.len() < query.len() {
        return HomologyHit::default();
    }
    let mut best = 0usize;
    if let Some(score) = scan_strand(query, reference, threshold, &mut best) {
        return HomologyHit { exceeded: true, best_score: score };
    }
    if let Some(score) = scan_strand(rc, reference, threshold, &mut best) {
        return HomologyHit { exceeded: true, best_score: score };
    }
    HomologyHit { exceeded: false, best_score: best }
}
