use anyhow::Result;
use std::io::BufRead;

use crate::util::dna;

/// 一条 FASTA 记录。`label` 是 `>` 之后的整行（含描述），用于按子串排除记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub label: String,
    pub seq: Vec<u8>,
}

pub struct FastaReader<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
    peek_label: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            done: false,
            peek_label: None,
        }
    }

    /// 读取下一条记录。首个 `>` 之前的行被忽略；序列可跨多行，统一大写。
    /// 按字节读取，label 中的非 UTF-8 字节以替换字符保留。
    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        if self.done {
            return Ok(None);
        }

        let label = match self.peek_label.take() {
            Some(l) => l,
            None => loop {
                self.buf.clear();
                let n = self.reader.read_until(b'\n', &mut self.buf)?;
                if n == 0 {
                    self.done = true;
                    return Ok(None);
                }
                if let Some(rest) = self.buf.strip_prefix(b">") {
                    break decode_label(rest);
                }
            },
        };

        let mut seq: Vec<u8> = Vec::new();
        loop {
            self.buf.clear();
            let n = self.reader.read_until(b'\n', &mut self.buf)?;
            if n == 0 {
                self.done = true;
                break;
            }
            if let Some(rest) = self.buf.strip_prefix(b">") {
                self.peek_label = Some(decode_label(rest));
                break;
            }
            seq.extend_from_slice(&dna::normalize_seq(&self.buf));
        }

        Ok(Some(FastaRecord { label, seq }))
    }
}

fn decode_label(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
