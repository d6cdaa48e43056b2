use anyhow::{anyhow, Result};
use std::io::Write;

/// 发现结果的写出端：每行一条序列，按发现顺序写出并立即 flush，
/// 长时间运行被中断时已找到的序列不会丢失。
pub struct SequenceWriter {
    out: Box<dyn Write>,
    written: usize,
}

impl SequenceWriter {
    /// `path` 为 `-` 时写到 stdout
    pub fn create(path: &str) -> Result<Self> {
        let out: Box<dyn Write> = if path == "-" {
            Box::new(std::io::BufWriter::new(std::io::stdout()))
        } else {
            let f = std::fs::File::create(path)
                .map_err(|e| anyhow!("cannot create output file '{}': {}", path, e))?;
            Box::new(std::io::BufWriter::new(f))
        };
        Ok(Self::from_writer(out))
    }

    pub fn from_writer(out: Box<dyn Write>) -> Self {
        Self { out, written: 0 }
    }

    pub fn write_sequence(&mut self, seq: &[u8]) -> Result<()> {
        self.out.write_all(seq)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<usize> {
        self.out.flush()?;
        Ok(self.written)
    }
}
