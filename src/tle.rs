use std::fs;
use std::path::Path;

use sgp4::Elements;
use thiserror::Error;

use crate::propagation::PropagationError;

#[derive(Debug, Error)]
pub enum TleFileError {
    #[error("TLE path not found: {0}")]
    NotFound(String),
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("invalid TLE in {file}: {source}")]
    Invalid {
        file: String,
        source: PropagationError,
    },
}

/// One satellite's element text plus display metadata. The raw text is
/// kept because the engines and the worker protocol carry element text,
/// not parsed handles; each engine re-resolves through its own cache.
#[derive(Debug, Clone)]
pub struct TleRecord {
    pub name: Option<String>,
    pub norad_id: u64,
    pub text: String,
}

impl TleRecord {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", self.norad_id))
    }
}

/// Load a TLE file or a directory of `.tle`/`.txt` files. Unparseable
/// files in a directory are logged and skipped; a single-file load
/// surfaces the error.
pub fn load(path: &Path) -> Result<Vec<TleRecord>, TleFileError> {
    if path.is_file() {
        return load_file(path);
    }
    if !path.is_dir() {
        return Err(TleFileError::NotFound(path.display().to_string()));
    }

    let mut records = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let path = entry.path();
        let is_tle = path
            .extension()
            .is_some_and(|ext| ext == "tle" || ext == "txt");
        if !path.is_file() || !is_tle {
            continue;
        }
        match load_file(&path) {
            Ok(mut found) => records.append(&mut found),
            Err(e) => {
                log::warn!("failed to parse TLE file {}: {}", path.display(), e);
            }
        }
    }
    Ok(records)
}

pub fn load_file(path: &Path) -> Result<Vec<TleRecord>, TleFileError> {
    let content = fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let mut records = Vec::new();
    for (name, line1, line2) in parse_multi_tle(&content) {
        let elements = Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
            .map_err(|e| TleFileError::Invalid {
                file: filename.clone(),
                source: PropagationError::Tle(e),
            })?;
        let text = match &name {
            Some(n) => format!("{n}\n{line1}\n{line2}"),
            None => format!("{line1}\n{line2}"),
        };
        records.push(TleRecord {
            name: elements.object_name.clone(),
            norad_id: elements.norad_id,
            text,
        });
    }
    Ok(records)
}

/// Split multi-satellite TLE content into (name, line1, line2) triplets,
/// accepting both the 2-line and the 3-line form and skipping junk lines.
pub fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS: &str = "ISS (ZARYA)
1 25544U 98067A   19343.69339541  .00001764  00000-0  40967-4 0  9998
2 25544  51.6439 211.2001 0007417  17.6667  85.6398 15.50103472202482";

    #[test]
    fn splits_three_line_form() {
        let triplets = parse_multi_tle(ISS);
        assert_eq!(triplets.len(), 1);
        assert_eq!(triplets[0].0.as_deref(), Some("ISS (ZARYA)"));
    }

    #[test]
    fn splits_two_line_form() {
        let content: Vec<&str> = ISS.lines().skip(1).collect();
        let triplets = parse_multi_tle(&content.join("\n"));
        assert_eq!(triplets.len(), 1);
        assert!(triplets[0].0.is_none());
    }

    #[test]
    fn skips_junk_lines() {
        let content = format!("# downloaded 2019-12-10\n{ISS}\ntrailing noise");
        let triplets = parse_multi_tle(&content);
        assert_eq!(triplets.len(), 1);
    }
}
