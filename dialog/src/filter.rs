use anyhow::bail;

use crate::Result;

/// One `Description|pattern;pattern` entry of a filter string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileFilter {
    pub description: String,
    pub patterns: Vec<String>,
}

impl FileFilter {
    /// Extensions as the native dialog expects them: `*.png` becomes `png`,
    /// `*.*` and `*` become `*`.
    pub fn extensions(&self) -> Vec<String> {
        self.patterns
            .iter()
            .map(|pattern| match pattern.rsplit_once('.') {
                Some((_, "*")) | None => "*".to_string(),
                Some((_, ext)) => ext.to_string(),
            })
            .collect()
    }
}

pub fn parse_filter(text: &str) -> Result<Vec<FileFilter>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<&str> = text.split('|').collect();
    if segments.len() % 2 != 0 {
        bail!("Filter `{text}` must consist of `Description|pattern` pairs.");
    }
    segments
        .chunks(2)
        .map(|pair| {
            let patterns: Vec<String> = pair[1]
                .split(';')
                .map(str::trim)
                .filter(|pattern| !pattern.is_empty())
                .map(str::to_string)
                .collect();
            if patterns.is_empty() {
                bail!("Filter `{}` has no pattern.", pair[0]);
            }
            Ok(FileFilter {
                description: pair[0].trim().to_string(),
                patterns,
            })
        })
        .collect()
}
