use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::util::dna::BASES;

/// 候选序列来源。搜索循环只依赖此 trait，测试可替换为固定序列。
pub trait CandidateSource {
    /// 产生一条长度为 `len` 的 A/C/G/T 序列
    fn next_query(&mut self, len: usize) -> Vec<u8>;
}

/// 确定性随机候选生成器。
///
/// 算法固定，跨平台、跨版本可复现：
/// - 状态：xoshiro256**，用 `seed_from_u64(seed)`（SplitMix64 展开）初始化；
/// - 每个碱基取一次 `next_u64()`，`BASES[value % 4]`，即 `ACGT` 中的一个。
///
/// 2^64 是 4 的整数倍，取模不引入偏差。
pub struct SeededGenerator {
    rng: Xoshiro256StarStar,
    seed: u64,
    drawn: u64,
}

impl SeededGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            seed,
            drawn: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// 已产生的候选条数（随机流位置的计数）
    pub fn drawn(&self) -> u64 {
        self.drawn
    }

    /// 写入调用方缓冲区
    pub fn fill_query(&mut self, len: usize, out: &mut Vec<u8>) {
        out.clear();
        out.extend((0..len).map(|_| BASES[(self.rng.next_u64() % 4) as usize]));
        self.drawn += 1;
    }
}

impl CandidateSource for SeededGenerator {
    fn next_query(&mut self, len: usize) -> Vec<u8> {
        let mut q = Vec::with_capacity(len);
        self.fill_query(len, &mut q);
        q
    }
}

/// 按顺序回放预先给定的序列，用完后循环；用于测试与演示
pub struct FixedCandidates {
    queries: Vec<Vec<u8>>,
    next: usize,
    drawn: u64,
}

impl FixedCandidates {
    pub fn new(queries: Vec<Vec<u8>>) -> Self {
        Self { queries, next: 0, drawn: 0 }
    }

    pub fn drawn(&self) -> u64 {
        self.drawn
    }
}

impl CandidateSource for FixedCandidates {
    fn next_query(&mut self, _len: usize) -> Vec<u8> {
        self.drawn += 1;
        if self.queries.is_empty() {
            return Vec::new();
        }
        let q = self.queries[self.next].clone();
        self.next = (self.next + 1) % self.queries.len();
        q
    }
}
