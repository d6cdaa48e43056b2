pub mod generator;
pub mod homology;

pub use generator::{CandidateSource, FixedCandidates, SeededGenerator};
pub use homology::{homology_percent, test_homology, HomologyHit, HomologyScorer, WindowScorer};

use anyhow::{bail, Result};
use log::Level;
use rayon::prelude::*;
use std::time::{Duration, Instant};

use crate::reference::{ReferenceSequence, ReferenceStore};
use crate::util::dna;

/// 低于此长度的候选在生物学上意义不大；仅提示，不强制
pub const RECOMMENDED_MIN_LENGTH: usize = 13;

/// 一次运行的全部参数，构造后不再改变
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOpt {
    /// 需要找到的缺失序列条数
    pub count: usize,
    /// 候选长度（bp）
    pub length: usize,
    pub seed: u64,
    /// 同源性百分比阈值，0–100，严格大于即拒绝
    pub threshold: f64,
    pub threads: usize,
    /// 尝试次数上限；None 表示不设上限
    pub max_attempts: Option<u64>,
    /// 输出每条参考序列上的最高同源性
    pub verbose: bool,
}

impl Default for SearchOpt {
    fn default() -> Self {
        Self {
            count: 1,
            length: 20,
            seed: 0,
            threshold: 80.0,
            threads: 1,
            max_attempts: None,
            verbose: false,
        }
    }
}

impl SearchOpt {
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            bail!("number of absent sequences must be positive");
        }
        if self.length == 0 {
            bail!("candidate length must be positive");
        }
        if !self.threshold.is_finite() || !(0.0..=100.0).contains(&self.threshold) {
            bail!("homology threshold must be within [0, 100], got {}", self.threshold);
        }
        if self.threads == 0 {
            bail!("threads must be at least 1");
        }
        if self.max_attempts == Some(0) {
            bail!("max attempts must be positive when given");
        }
        Ok(())
    }
}

/// 搜索状态机的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Searching,
    /// 已找到要求的条数
    Done,
    /// 达到尝试上限仍未找齐
    Exhausted,
}

/// 循环独占的可变状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub accepted: usize,
    pub target: usize,
    /// 已生成的候选数，即随机流位置
    pub attempts: u64,
    pub rejected: u64,
}

impl SearchState {
    pub fn new(target: usize) -> Self {
        Self { accepted: 0, target, attempts: 0, rejected: 0 }
    }

    pub fn phase(&self, max_attempts: Option<u64>) -> SearchPhase {
        if self.accepted >= self.target {
            SearchPhase::Done
        } else if max_attempts.is_some_and(|m| self.attempts >= m) {
            SearchPhase::Exhausted
        } else {
            SearchPhase::Searching
        }
    }
}

/// 单个候选对全部参考序列的判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// `reference` 为触发拒绝的参考序列下标，`score` 为触发窗口的匹配数
    Rejected { reference: usize, score: usize },
}

#[derive(Debug, Clone)]
pub struct SearchReport {
    /// 按发现顺序
    pub accepted: Vec<Vec<u8>>,
    pub attempts: u64,
    pub rejected: u64,
    pub phase: SearchPhase,
    pub elapsed: Duration,
}

/// 生成-检验循环。参考集合、候选来源、打分器均由外部注入。
///
/// 空参考集合时任何候选都直接通过；候选长度或阈值使通过概率极低时循环
/// 可能永不结束，需要时用 `SearchOpt::max_attempts` 设上限。
pub struct AbsenceSearch<'a, G, S> {
    store: &'a ReferenceStore,
    generator: G,
    scorer: S,
    opt: &'a SearchOpt,
    state: SearchState,
    pool: Option<rayon::ThreadPool>,
    /// 当前候选的反向互补，跨轮复用
    rc_buf: Vec<u8>,
}

impl<'a, G, S> AbsenceSearch<'a, G, S>
where
    G: CandidateSource,
    S: HomologyScorer + Sync,
{
    pub fn new(store: &'a ReferenceStore, generator: G, scorer: S, opt: &'a SearchOpt) -> Result<Self> {
        opt.validate()?;

        if opt.length < RECOMMENDED_MIN_LENGTH {
            log::warn!(
                "candidate length {} is below the recommended minimum of {} bp",
                opt.length,
                RECOMMENDED_MIN_LENGTH
            );
        }
        if store.is_empty() {
            log::warn!("reference store is empty: every candidate will be accepted");
        }
        let n_short = store.count_shorter_than(opt.length);
        if n_short > 0 {
            log::info!(
                "{} reference(s) shorter than {} bp have no window and will score zero",
                n_short,
                opt.length
            );
        }

        let pool = if opt.threads > 1 {
            Some(rayon::ThreadPoolBuilder::new().num_threads(opt.threads).build()?)
        } else {
            None
        };

        Ok(Self {
            store,
            generator,
            scorer,
            opt,
            state: SearchState::new(opt.count),
            pool,
            rc_buf: Vec::with_capacity(opt.length),
        })
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn phase(&self) -> SearchPhase {
        self.state.phase(self.opt.max_attempts)
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// 按存储顺序检测全部参考序列，遇到第一条超阈值的即停止
    pub fn evaluate(&self, query: &[u8]) -> Verdict {
        self.evaluate_strands(query, &dna::revcomp(query))
    }

    fn evaluate_strands(&self, query: &[u8], rc: &[u8]) -> Verdict {
        let (store, scorer, opt) = (self.store, &self.scorer, self.opt);
        let level = if opt.verbose { Level::Info } else { Level::Debug };
        let emit = |r: &ReferenceSequence, qlen: usize, hit: HomologyHit| {
            log::log!(level, "{}", diagnostic_line(r, qlen, hit));
        };
        let cand = Candidate { query, rc, threshold: opt.threshold };
        match &self.pool {
            Some(pool) => pool.install(|| evaluate_par(store, scorer, &cand, &emit)),
            None => evaluate_seq(store, scorer, &cand, &emit),
        }
    }

    /// 一轮：生成一条候选并判定。通过时返回该候选。
    pub fn step(&mut self) -> Option<Vec<u8>> {
        let query = self.generator.next_query(self.opt.length);
        debug_assert!(dna::is_acgt(&query), "candidate outside ACGT");
        self.state.attempts += 1;
        log::debug!("attempting {}", String::from_utf8_lossy(&query));

        let mut rc = std::mem::take(&mut self.rc_buf);
        dna::revcomp_into(&query, &mut rc);
        let verdict = self.evaluate_strands(&query, &rc);
        self.rc_buf = rc;

        match verdict {
            Verdict::Accepted => {
                self.state.accepted += 1;
                log::info!(
                    "absent sequence {}/{}: {} (attempt {})",
                    self.state.accepted,
                    self.state.target,
                    String::from_utf8_lossy(&query),
                    self.state.attempts
                );
                Some(query)
            }
            Verdict::Rejected { reference, score } => {
                self.state.rejected += 1;
                log::debug!(
                    "rejected {} on '{}' ({}/{})",
                    String::from_utf8_lossy(&query),
                    self.store.sequences()[reference].label,
                    score,
                    query.len()
                );
                None
            }
        }
    }

    /// 循环至 `Done`（或 `Exhausted`）。每条通过的候选先交给 `on_accept`（通常是写文件）。
    pub fn run<F>(mut self, mut on_accept: F) -> Result<SearchReport>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let start = Instant::now();
        let mut accepted = Vec::with_capacity(self.opt.count);

        while self.phase() == SearchPhase::Searching {
            if let Some(q) = self.step() {
                on_accept(&q)?;
                accepted.push(q);
            }
        }

        let phase = self.phase();
        if phase == SearchPhase::Exhausted {
            log::warn!(
                "stopped after {} attempts with {}/{} absent sequences",
                self.state.attempts,
                self.state.accepted,
                self.state.target
            );
        }

        Ok(SearchReport {
            accepted,
            attempts: self.state.attempts,
            rejected: self.state.rejected,
            phase,
            elapsed: start.elapsed(),
        })
    }
}

/// 一个候选及其反向互补，对所有参考序列共用
struct Candidate<'q> {
    query: &'q [u8],
    rc: &'q [u8],
    threshold: f64,
}

fn evaluate_seq<S, E>(store: &ReferenceStore, scorer: &S, cand: &Candidate<'_>, emit: &E) -> Verdict
where
    S: HomologyScorer,
    E: Fn(&ReferenceSequence, usize, HomologyHit),
{
    for (i, r) in store.iter().enumerate() {
        if let Some(v) = test_reference(scorer, cand, i, r, emit) {
            return v;
        }
    }
    Verdict::Accepted
}

/// `find_map_any` 在任一 worker 命中后停止派发；返回 None 时所有参考序列均已检测
fn evaluate_par<S, E>(store: &ReferenceStore, scorer: &S, cand: &Candidate<'_>, emit: &E) -> Verdict
where
    S: HomologyScorer + Sync,
    E: Fn(&ReferenceSequence, usize, HomologyHit) + Sync,
{
    store
        .sequences()
        .par_iter()
        .enumerate()
        .find_map_any(|(i, r)| test_reference(scorer, cand, i, r, emit))
        .unwrap_or(Verdict::Accepted)
}

/// 被打分的参考序列都会交给 `emit`，包括触发拒绝的那条
fn test_reference<S, E>(scorer: &S, cand: &Candidate<'_>, idx: usize, r: &ReferenceSequence, emit: &E) -> Option<Verdict>
where
    S: HomologyScorer,
    E: Fn(&ReferenceSequence, usize, HomologyHit),
{
    let qlen = cand.query.len();
    if r.len() < qlen {
        log::debug!("{}: shorter than query ({} < {}), skipped", r.label, r.len(), qlen);
        return None;
    }
    let hit = scorer.test_strands(cand.query, cand.rc, &r.residues, cand.threshold);
    emit(r, qlen, hit);
    if hit.exceeded {
        Some(Verdict::Rejected { reference: idx, score: hit.best_score })
    } else {
        None
    }
}

/// 单条参考序列的诊断行：`label: max homology X% (s/q)`，超阈值时带 ` exceeds threshold`
pub fn diagnostic_line(r: &ReferenceSequence, qlen: usize, hit: HomologyHit) -> String {
    format!(
        "{}: max homology {:.2}% ({}/{}){}",
        r.label,
        homology_percent(hit.best_score, qlen),
        hit.best_score,
        qlen,
        if hit.exceeded { " exceeds threshold" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceSequence;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn store(seqs: &[(&str, &[u8])]) -> ReferenceStore {
        ReferenceStore::new(
            seqs.iter()
                .map(|(l, s)| ReferenceSequence { label: l.to_string(), residues: s.to_vec() })
                .collect(),
        )
    }

    fn opt(count: usize, length: usize, threshold: f64) -> SearchOpt {
        SearchOpt { count, length, threshold, seed: 11, ..SearchOpt::default() }
    }

    /// 记录调用次数；对指定参考序列返回超阈值
    struct CountingScorer {
        calls: AtomicUsize,
        reject_on: Option<Vec<u8>>,
    }

    impl HomologyScorer for CountingScorer {
        fn test(&self, _query: &[u8], reference: &[u8], _threshold: f64) -> HomologyHit {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let exceeded = self.reject_on.as_deref() == Some(reference);
            HomologyHit { exceeded, best_score: 0 }
        }
    }

    #[test]
    fn opt_validation() {
        assert!(SearchOpt::default().validate().is_ok());
        assert!(opt(0, 20, 80.0).validate().is_err());
        assert!(opt(1, 0, 80.0).validate().is_err());
        assert!(opt(1, 20, 100.5).validate().is_err());
        assert!(opt(1, 20, -0.1).validate().is_err());
        assert!(opt(1, 20, f64::NAN).validate().is_err());
        assert!(opt(1, 20, 0.0).validate().is_ok());
        assert!(opt(1, 20, 100.0).validate().is_ok());
        assert!(SearchOpt { threads: 0, ..SearchOpt::default() }.validate().is_err());
        assert!(SearchOpt { max_attempts: Some(0), ..SearchOpt::default() }.validate().is_err());
    }

    #[test]
    fn state_phases() {
        let mut st = SearchState::new(2);
        assert_eq!(st.phase(None), SearchPhase::Searching);
        st.attempts = 5;
        assert_eq!(st.phase(Some(5)), SearchPhase::Exhausted);
        st.accepted = 2;
        assert_eq!(st.phase(Some(5)), SearchPhase::Done);
        assert_eq!(st.phase(None), SearchPhase::Done);
    }

    #[test]
    fn accepts_all_different_query() {
        let refs = store(&[("chr1", b"ACGTACGTACGTACGT")]);
        let o = opt(1, 8, 50.0);
        let gen = FixedCandidates::new(vec![b"TTTTTTTT".to_vec()]);
        let search = AbsenceSearch::new(&refs, gen, WindowScorer, &o).unwrap();
        let report = search.run(|_| Ok(())).unwrap();
        assert_eq!(report.accepted, vec![b"TTTTTTTT".to_vec()]);
        assert_eq!(report.attempts, 1);
        assert_eq!(report.phase, SearchPhase::Done);
    }

    #[test]
    fn rejects_forward_substring_then_accepts_next() {
        let refs = store(&[("chr1", b"AAAACCCCGGGGTTTT")]);
        let o = opt(1, 8, 90.0);
        let gen = FixedCandidates::new(vec![b"AAAACCCC".to_vec(), b"ACACACAC".to_vec()]);
        let search = AbsenceSearch::new(&refs, gen, WindowScorer, &o).unwrap();
        assert_eq!(
            search.evaluate(b"AAAACCCC"),
            Verdict::Rejected { reference: 0, score: 8 }
        );
        let report = search.run(|_| Ok(())).unwrap();
        assert_eq!(report.accepted, vec![b"ACACACAC".to_vec()]);
        assert_eq!(report.attempts, 2);
        assert_eq!(report.rejected, 1);
    }

    #[test]
    fn empty_store_accepts_each_draw() {
        let refs = ReferenceStore::default();
        let o = opt(3, 15, 50.0);
        let search = AbsenceSearch::new(&refs, SeededGenerator::new(5), WindowScorer, &o).unwrap();
        let report = search.run(|_| Ok(())).unwrap();
        assert_eq!(report.accepted.len(), 3);
        assert_eq!(report.attempts, 3);
        assert_eq!(report.rejected, 0);
    }

    #[test]
    fn rejection_skips_remaining_references() {
        let refs = store(&[("a", b"AAAA"), ("b", b"CCCC"), ("c", b"GGGG")]);
        let o = opt(1, 4, 50.0);
        let scorer = CountingScorer { calls: AtomicUsize::new(0), reject_on: Some(b"CCCC".to_vec()) };
        let search = AbsenceSearch::new(&refs, FixedCandidates::new(vec![]), scorer, &o).unwrap();
        assert_eq!(search.evaluate(b"ACGT"), Verdict::Rejected { reference: 1, score: 0 });
        assert_eq!(search.scorer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn acceptance_tests_every_reference() {
        let refs = store(&[("a", b"AAAA"), ("b", b"CCCC"), ("c", b"GGGG")]);
        let o = SearchOpt { threads: 3, ..opt(1, 4, 50.0) };
        let scorer = CountingScorer { calls: AtomicUsize::new(0), reject_on: None };
        let search = AbsenceSearch::new(&refs, FixedCandidates::new(vec![]), scorer, &o).unwrap();
        assert_eq!(search.evaluate(b"ACGT"), Verdict::Accepted);
        assert_eq!(search.scorer.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn short_references_are_skipped() {
        let refs = store(&[("tiny", b"ACG")]);
        let o = opt(1, 4, 0.0);
        let scorer = CountingScorer { calls: AtomicUsize::new(0), reject_on: Some(b"ACG".to_vec()) };
        let search = AbsenceSearch::new(&refs, FixedCandidates::new(vec![]), scorer, &o).unwrap();
        assert_eq!(search.evaluate(b"ACGT"), Verdict::Accepted);
        assert_eq!(search.scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn max_attempts_bounds_impossible_search() {
        // 阈值 0：任何至少一个匹配的窗口都会被拒绝
        let refs = store(&[("n", b"RYRYRYRYRYRYRYRYRYRY")]);
        let o = SearchOpt { max_attempts: Some(10), ..opt(1, 13, 0.0) };
        let search = AbsenceSearch::new(&refs, SeededGenerator::new(1), WindowScorer, &o).unwrap();
        let report = search.run(|_| Ok(())).unwrap();
        assert_eq!(report.phase, SearchPhase::Exhausted);
        assert_eq!(report.attempts, 10);
        assert_eq!(report.rejected, 10);
        assert!(report.accepted.is_empty());
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let refs = store(&[
            ("chr1", b"ACGTTGCAACGGTTACGATCGATCGGATCCGATAGCTAGCTAGGCTAGA"),
            ("chr2", b"TTTTGGGGCCCCAAAATTTTGGGGCCCCAAAARYKMSWBDHVN"),
            ("chr3", b"GATTACAGATTACAGATTACAGATTACA"),
        ]);
        let seq = opt(5, 14, 70.0);
        let par = SearchOpt { threads: 4, ..seq.clone() };
        let a = AbsenceSearch::new(&refs, SeededGenerator::new(3), WindowScorer, &seq)
            .unwrap()
            .run(|_| Ok(()))
            .unwrap();
        let b = AbsenceSearch::new(&refs, SeededGenerator::new(3), WindowScorer, &par)
            .unwrap()
            .run(|_| Ok(()))
            .unwrap();
        assert_eq!(a.accepted, b.accepted);
        assert_eq!(a.attempts, b.attempts);
    }

    #[test]
    fn callback_error_aborts_run() {
        let refs = ReferenceStore::default();
        let o = opt(2, 13, 50.0);
        let search = AbsenceSearch::new(&refs, SeededGenerator::new(0), WindowScorer, &o).unwrap();
        let err = search.run(|_| anyhow::bail!("disk full")).unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }

    fn seq(label: &str, residues: &[u8]) -> ReferenceSequence {
        ReferenceSequence { label: label.to_string(), residues: residues.to_vec() }
    }

    /// 收集 evaluate 过程中输出的诊断行
    fn collect_lines(refs: &ReferenceStore, query: &[u8], threshold: f64) -> (Verdict, Vec<String>) {
        let lines = Mutex::new(Vec::new());
        let emit = |r: &ReferenceSequence, qlen: usize, hit: HomologyHit| {
            lines.lock().unwrap().push(diagnostic_line(r, qlen, hit));
        };
        let rc = dna::revcomp(query);
        let cand = Candidate { query, rc: &rc, threshold };
        let v = evaluate_seq(refs, &WindowScorer, &cand, &emit);
        (v, lines.into_inner().unwrap())
    }

    #[test]
    fn diagnostic_line_tags_exceeding_reference() {
        let r = seq("chr2 rejecting", b"AAAACCCC");
        let line = diagnostic_line(&r, 8, HomologyHit { exceeded: true, best_score: 8 });
        assert_eq!(line, "chr2 rejecting: max homology 100.00% (8/8) exceeds threshold");
    }

    #[test]
    fn diagnostic_line_plain_for_passing_reference() {
        let r = seq("chr1", b"ACGTACGT");
        let line = diagnostic_line(&r, 8, HomologyHit { exceeded: false, best_score: 2 });
        assert_eq!(line, "chr1: max homology 25.00% (2/8)");
        assert!(!line.contains("exceeds threshold"));
    }

    #[test]
    fn diagnostics_stop_at_rejecting_reference() {
        let refs = ReferenceStore::new(vec![
            seq("a", b"ACGTACGTACGTACGT"),
            seq("b", b"GGGGAAAACCCCTTTT"),
            seq("c", b"AAAACCCCAAAACCCC"),
            seq("tiny", b"AC"),
        ]);
        let (v, lines) = collect_lines(&refs, b"AAAACCCC", 90.0);
        assert_eq!(v, Verdict::Rejected { reference: 1, score: 8 });
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("a: ") && !lines[0].contains("exceeds threshold"));
        assert!(lines[1].starts_with("b: ") && lines[1].ends_with(" exceeds threshold"));
    }

    #[test]
    fn diagnostics_cover_every_scored_reference_on_accept() {
        let refs = ReferenceStore::new(vec![
            seq("a", b"ACGTACGTACGTACGT"),
            seq("tiny", b"AC"),
            seq("b", b"GCGCGCGCGCGC"),
        ]);
        let (v, lines) = collect_lines(&refs, b"TTTTTTTT", 50.0);
        assert_eq!(v, Verdict::Accepted);
        // 短于 query 的参考序列不打分，也没有诊断行
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| !l.contains("exceeds threshold")));
    }

    /// 记录每次调用收到的反向互补
    struct RcRecorder {
        seen: Mutex<Vec<(Vec<u8>, Vec<u8>)>>,
    }

    impl HomologyScorer for RcRecorder {
        fn test(&self, _query: &[u8], _reference: &[u8], _threshold: f64) -> HomologyHit {
            HomologyHit::default()
        }

        fn test_strands(&self, query: &[u8], rc: &[u8], _reference: &[u8], _threshold: f64) -> HomologyHit {
            self.seen.lock().unwrap().push((query.to_vec(), rc.to_vec()));
            HomologyHit::default()
        }
    }

    #[test]
    fn step_passes_candidate_revcomp_to_scorer() {
        let refs = store(&[("a", b"ACGTACGT"), ("b", b"TTTTTTTT")]);
        let o = opt(2, 5, 50.0);
        let gen = FixedCandidates::new(vec![b"AAAAC".to_vec(), b"GATTA".to_vec()]);
        let scorer = RcRecorder { seen: Mutex::new(Vec::new()) };
        let mut search = AbsenceSearch::new(&refs, gen, scorer, &o).unwrap();
        assert!(search.step().is_some());
        assert!(search.step().is_some());

        let seen = search.scorer.seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        for (q, rc) in seen.iter() {
            assert_eq!(rc, &dna::revcomp(q));
        }
        assert_eq!(seen[3].1, b"TAATC");
    }
}
