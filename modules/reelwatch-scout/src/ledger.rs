use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

/// Durable record of already-delivered video links.
///
/// Backed by a newline-delimited file, one link per line. Growth is strictly
/// append-only: `commit` writes only the links claimed since load, once per
/// run, so prior entries are never rewritten and an interrupted run can at
/// worst lose its own delta.
pub struct Ledger {
    path: PathBuf,
    known: HashSet<String>,
    /// Links claimed this run, in claim order. Subset of `known`.
    claimed: Vec<String>,
    /// The existing file ends without a trailing newline (manual edit);
    /// the next append must not glue onto the last line.
    needs_leading_newline: bool,
}

impl Ledger {
    pub fn load(path: &Path) -> io::Result<Self> {
        let (known, needs_leading_newline) = match std::fs::read_to_string(path) {
            Ok(content) => {
                let known: HashSet<String> = content
                    .lines()
                    .map(|line| line.trim().to_string())
                    .filter(|line| !line.is_empty())
                    .collect();
                (known, !content.is_empty() && !content.ends_with('\n'))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No ledger file found, starting empty");
                (HashSet::new(), false)
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            path: path.to_path_buf(),
            known,
            claimed: Vec::new(),
            needs_leading_newline,
        })
    }

    /// Whether a link was delivered in a prior run or claimed in this one.
    pub fn contains(&self, link: &str) -> bool {
        self.known.contains(link)
    }

    /// Claim a link for this run. Returns false when the link is already
    /// known or already claimed; the first claim wins, so an item surfaced
    /// by two sources in one run is processed exactly once.
    pub fn claim(&mut self, link: &str) -> bool {
        if !self.known.insert(link.to_string()) {
            return false;
        }
        self.claimed.push(link.to_string());
        true
    }

    /// Drop a pending claim so the link stays unseen for a future run.
    /// Links loaded from the file are never released.
    pub fn release(&mut self, link: &str) {
        if let Some(pos) = self.claimed.iter().position(|c| c == link) {
            self.claimed.remove(pos);
            self.known.remove(link);
        }
    }

    /// Append the claimed links to the file in claim order. The only
    /// persistence operation: one durable write per run, after all
    /// deliveries have been attempted. Returns the number written.
    pub fn commit(&mut self) -> io::Result<usize> {
        if self.claimed.is_empty() {
            return Ok(0);
        }

        let mut out = String::new();
        if self.needs_leading_newline {
            out.push('\n');
        }
        for link in &self.claimed {
            out.push_str(link);
            out.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(out.as_bytes())?;
        file.sync_all()?;

        self.needs_leading_newline = false;
        let written = self.claimed.len();
        self.claimed.clear();
        Ok(written)
    }

    /// Links known at this moment, including pending claims.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("known_links.txt")
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::load(&temp_path(&dir)).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn claim_is_first_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::load(&temp_path(&dir)).unwrap();
        assert!(ledger.claim("https://vimeo.com/1"));
        assert!(!ledger.claim("https://vimeo.com/1"));
        assert!(ledger.contains("https://vimeo.com/1"));
    }

    #[test]
    fn commit_appends_delta_in_claim_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.claim("https://vimeo.com/2");
        ledger.claim("https://vimeo.com/1");
        assert_eq!(ledger.commit().unwrap(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "https://vimeo.com/2\nhttps://vimeo.com/1\n");

        // Second commit with nothing new writes nothing.
        assert_eq!(ledger.commit().unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn commit_preserves_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        std::fs::write(&path, "https://vimeo.com/old\n").unwrap();

        let mut ledger = Ledger::load(&path).unwrap();
        assert!(ledger.contains("https://vimeo.com/old"));
        assert!(!ledger.claim("https://vimeo.com/old"));
        ledger.claim("https://vimeo.com/new");
        ledger.commit().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "https://vimeo.com/old\nhttps://vimeo.com/new\n");
    }

    #[test]
    fn commit_repairs_missing_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        std::fs::write(&path, "https://vimeo.com/old").unwrap();

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.claim("https://vimeo.com/new");
        ledger.commit().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "https://vimeo.com/old\nhttps://vimeo.com/new\n");
    }

    #[test]
    fn release_forgets_a_claim_but_not_prior_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        std::fs::write(&path, "https://vimeo.com/old\n").unwrap();

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.claim("https://vimeo.com/new");
        ledger.release("https://vimeo.com/new");
        ledger.release("https://vimeo.com/old");

        assert!(!ledger.contains("https://vimeo.com/new"));
        assert!(ledger.contains("https://vimeo.com/old"));
        assert_eq!(ledger.commit().unwrap(), 0);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "https://vimeo.com/old\n"
        );
    }

    #[test]
    fn reload_after_commit_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.claim("https://vimeo.com/1");
        ledger.commit().unwrap();

        let mut reloaded = Ledger::load(&path).unwrap();
        assert!(!reloaded.claim("https://vimeo.com/1"));
        assert_eq!(reloaded.commit().unwrap(), 0);
    }
}
