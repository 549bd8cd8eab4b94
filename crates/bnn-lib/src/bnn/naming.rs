//! Output file naming

use crate::primitives::NamingScheme;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

const PREFIX: &str = "bnn";
const SLUG_WORDS: usize = 6;
const SLUG_MAX_LEN: usize = 48;

/// Picks the file an output image is written to
#[derive(Debug, Clone)]
pub struct OutputNamer {
    directory: PathBuf,
    scheme: NamingScheme,
}

impl OutputNamer {
    pub fn new(directory: impl Into<PathBuf>, scheme: NamingScheme) -> Self {
        Self {
            directory: directory.into(),
            scheme,
        }
    }

    pub fn next_path(&self, prompt: &str, extension: &str) -> PathBuf {
        self.next_path_at(prompt, extension, Local::now())
    }

    /// Never returns a path that already exists; a taken name gets a `-2`,
    /// `-3`, ... suffix
    pub fn next_path_at(&self, prompt: &str, extension: &str, now: DateTime<Local>) -> PathBuf {
        let stem = match self.scheme {
            NamingScheme::Timestamp => format!("{PREFIX}-{}", now.format("%Y%m%d-%H%M%S")),
            NamingScheme::Prompt => {
                let slug = slugify(prompt);
                let time = now.format("%H%M%S");
                if slug.is_empty() {
                    format!("{PREFIX}-{time}")
                } else {
                    format!("{slug}-{time}")
                }
            }
            NamingScheme::Sequential => {
                format!("{PREFIX}-{:04}", next_sequence(&self.directory))
            }
        };
        unused_path(&self.directory, &stem, extension)
    }
}

fn unused_path(directory: &Path, stem: &str, extension: &str) -> PathBuf {
    let candidate = directory.join(format!("{stem}.{extension}"));
    if !candidate.exists() {
        return candidate;
    }
    (2u32..)
        .map(|n| directory.join(format!("{stem}-{n}.{extension}")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Lowercase ASCII slug of the first words of `text`
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for word in text.split_whitespace().take(SLUG_WORDS) {
        let cleaned: String = word
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if cleaned.is_empty() {
            continue;
        }
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(&cleaned);
    }

    if slug.len() > SLUG_MAX_LEN {
        slug.truncate(SLUG_MAX_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// One past the highest `bnn-NNNN.*` number already in `directory`
fn next_sequence(directory: &Path) -> u32 {
    let Ok(entries) = fs::read_dir(directory) else {
        return 1;
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let stem = name.split('.').next()?.to_string();
            stem.strip_prefix("bnn-")?.parse::<u32>().ok()
        })
        .max()
        .map_or(1, |highest| highest + 1)
}

#[cfg(test)]
mod tests {
    include!("naming.test.rs");
}
