//! Minimal lcov tracefile model.
//!
//! A tracefile is a sequence of records, each opened by `SF:<path>` and closed
//! by `end_of_record`. Only the source path is interpreted; every other line
//! is kept verbatim (blank lines outside records are dropped).

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

const SOURCE_PREFIX: &str = "SF:";
const END_OF_RECORD: &str = "end_of_record";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Lines such as `TN:` that precede the `SF:` line.
    pub preamble: Vec<String>,
    pub source_file: String,
    /// Lines between `SF:` and `end_of_record`, exclusive.
    pub body: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tracefile {
    pub records: Vec<Record>,
    /// Lines after the last record.
    pub trailer: Vec<String>,
}

impl Tracefile {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut trace = Tracefile::default();
        let mut pending: Vec<String> = Vec::new();
        let mut current: Option<Record> = None;

        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim_end();
            match current.take() {
                Some(record) if line == END_OF_RECORD => trace.records.push(record),
                Some(mut record) => {
                    record.body.push(line.to_string());
                    current = Some(record);
                }
                None => {
                    if let Some(source) = line.strip_prefix(SOURCE_PREFIX) {
                        current = Some(Record {
                            preamble: std::mem::take(&mut pending),
                            source_file: source.to_string(),
                            body: Vec::new(),
                        });
                    } else if line == END_OF_RECORD {
                        bail!("line {}: end_of_record without SF", idx + 1);
                    } else if !line.is_empty() {
                        pending.push(line.to_string());
                    }
                }
            }
        }

        if let Some(record) = current {
            bail!("record for '{}' is not terminated", record.source_file);
        }
        trace.trailer = pending;
        Ok(trace)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading tracefile '{}'", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing tracefile '{}'", path.display()))
    }

    #[cfg(test)]
    pub(crate) fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())
            .with_context(|| format!("writing tracefile '{}'", path.display()))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut push = |line: &str| {
            out.push_str(line);
            out.push('\n');
        };
        for record in &self.records {
            record.preamble.iter().for_each(|l| push(l));
            push(&format!("{SOURCE_PREFIX}{}", record.source_file));
            record.body.iter().for_each(|l| push(l));
            push(END_OF_RECORD);
        }
        self.trailer.iter().for_each(|l| push(l));
        out
    }

    pub fn source_files(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.source_file.as_str())
    }

    /// Drop every record whose source path matches `pattern`, the way
    /// `lcov --remove` does. Returns how many were removed.
    #[cfg(test)]
    pub(crate) fn remove_matching(&mut self, pattern: &str) -> Result<usize> {
        let pattern =
            glob::Pattern::new(pattern).with_context(|| format!("invalid ignore pattern '{pattern}'"))?;
        let before = self.records.len();
        self.records.retain(|r| !pattern.matches(&r.source_file));
        Ok(before - self.records.len())
    }

    /// Hex sha256 of the rendered tracefile.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.render().as_bytes());
        hash.iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
TN:
SF:/src/lib/sources/Device.cpp
FN:10,Device::Device
DA:10,1
end_of_record
SF:/usr/include/c++/11/vector
DA:1,4
end_of_record
SF:/src/lib/tests/DeviceTests.cpp
DA:3,1
end_of_record
";

    #[test]
    fn test_parse_and_render_round_trip() {
        let trace = Tracefile::parse(SAMPLE).unwrap();
        assert_eq!(trace.records.len(), 3);
        assert_eq!(trace.records[0].preamble, vec!["TN:"]);
        assert_eq!(trace.records[0].body, vec!["FN:10,Device::Device", "DA:10,1"]);
        assert_eq!(trace.render(), SAMPLE);
    }

    #[test]
    fn test_remove_matching() {
        let mut trace = Tracefile::parse(SAMPLE).unwrap();

        assert_eq!(trace.remove_matching("/usr/*").unwrap(), 1);
        assert_eq!(trace.remove_matching("*/tests/*").unwrap(), 1);
        assert_eq!(trace.remove_matching("*/tests/*").unwrap(), 0);
        assert_eq!(
            trace.source_files().collect::<Vec<_>>(),
            vec!["/src/lib/sources/Device.cpp"]
        );
    }

    #[test]
    fn test_unterminated_record_rejected() {
        assert!(Tracefile::parse("SF:/a.cpp\nDA:1,1\n").is_err());
        assert!(Tracefile::parse("end_of_record\n").is_err());
    }

    #[test]
    fn test_digest_is_stable() {
        let a = Tracefile::parse(SAMPLE).unwrap();
        let b = Tracefile::parse(SAMPLE).unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }
}
