/// 候选序列使用的碱基字母表，顺序固定（生成器按下标取碱基）
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// 参考序列字符 `r` 是否接受查询碱基 `q`。
///
/// 完全相同即匹配；否则按 IUPAC 简并码表判断。N 及表外字符一律不匹配。
#[inline]
pub fn iupac_accepts(r: u8, q: u8) -> bool {
    if r == q {
        return true;
    }
    match r {
        b'R' => matches!(q, b'A' | b'G'),
        b'Y' => matches!(q, b'C' | b'T'),
        b'S' => matches!(q, b'G' | b'C'),
        b'W' => matches!(q, b'A' | b'T'),
        b'K' => matches!(q, b'G' | b'T'),
        b'M' => matches!(q, b'A' | b'C'),
        b'B' => matches!(q, b'C' | b'G' | b'T'),
        b'D' => matches!(q, b'A' | b'G' | b'T'),
        b'H' => matches!(q, b'A' | b'C' | b'T'),
        b'V' => matches!(q, b'A' | b'C' | b'G'),
        _ => false,
    }
}

/// 大写化并去掉空白；其余字符（含简并码）原样保留
pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq {
        if b.is_ascii_whitespace() {
            continue;
        }
        out.push(b.to_ascii_uppercase());
    }
    out
}

#[inline]
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        _ => b'N',
    }
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    revcomp_into(seq, &mut out);
    out
}

/// 写入调用方提供的缓冲区；搜索循环每轮复用同一缓冲区，每个候选只算一次
pub fn revcomp_into(seq: &[u8], out: &mut Vec<u8>) {
    out.clear();
    out.extend(seq.iter().rev().map(|&b| complement(b)));
}

/// 仅由 A/C/G/T 组成（候选序列的合法域）
pub fn is_acgt(seq: &[u8]) -> bool {
    seq.iter().all(|b| BASES.contains(b))
}
