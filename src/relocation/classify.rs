// src/relocation/classify.rs

//! Text file classification
//!
//! Only text files may have placeholders substituted into them; rewriting
//! strings inside compiled binaries is the linkage fixer's job. Scripts are
//! recognized directly by their `#!` line. Everything else is handed in one
//! batch to `file(1)`, whose description must mention "text".
//!
//! `file` misreads content under some locales, so it always runs with
//! `LC_ALL=C`. When `file` or `xargs` is not installed no file is
//! classified as text; libtool files are still relocated.

use crate::error::Result;
use crate::keg::Keg;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Documentation extensions never worth probing
pub const METAFILE_EXTENSIONS: &[&str] = &[
    "adoc", "md", "mdown", "markdown", "org", "pod", "rdoc", "rst", "rtf", "textile", "txt",
    "wiki",
];

/// Python virtualenv marker; always probed despite its `.txt` extension
const VIRTUALENV_PREFIX_FILE: &str = "orig-prefix.txt";

/// How many leading bytes are inspected for a `#!` line
const SHEBANG_SNIFF_LEN: u64 = 1024;

/// Classifies keg files as text using `file(1)`
#[derive(Debug, Clone)]
pub struct TextFileClassifier {
    probe: Option<FileProbe>,
}

/// Located `xargs` and `file` executables
#[derive(Debug, Clone)]
struct FileProbe {
    xargs: PathBuf,
    file: PathBuf,
}

impl TextFileClassifier {
    /// Classifier using `file` and `xargs` from `PATH`
    pub fn new() -> Self {
        let probe = match (which::which("xargs"), which::which("file")) {
            (Ok(xargs), Ok(file)) => Some(FileProbe { xargs, file }),
            _ => {
                debug!("file or xargs not found, text classification disabled");
                None
            }
        };
        Self { probe }
    }

    /// Classifier that never probes, for environments without `file`
    pub fn without_probe() -> Self {
        Self { probe: None }
    }

    /// Whether the external probe is available
    pub fn can_probe(&self) -> bool {
        self.probe.is_some()
    }

    /// Every regular file in the keg that holds text
    pub fn text_files(&self, keg: &Keg) -> Result<Vec<PathBuf>> {
        let Some(probe) = &self.probe else {
            warn!(
                "Cannot classify text files in {}: file(1) unavailable",
                keg.path().display()
            );
            return Ok(Vec::new());
        };

        let descriptor = keg.descriptor_path();
        let mut text_files = Vec::new();
        let mut candidates = Vec::new();

        for path in keg.regular_files()? {
            if file_name_is(&path, VIRTUALENV_PREFIX_FILE) {
                candidates.push(path);
                continue;
            }
            if path == descriptor || is_metafile(&path) {
                continue;
            }
            if is_text_executable(&path) {
                text_files.push(path);
                continue;
            }
            candidates.push(path);
        }

        if candidates.is_empty() {
            return Ok(text_files);
        }

        match probe.describe(&candidates) {
            Ok(output) => {
                let candidates: HashSet<PathBuf> = candidates.into_iter().collect();
                text_files.extend(parse_probe_output(&output, &candidates));
            }
            Err(e) => warn!("file(1) probe failed, skipping content classification: {}", e),
        }

        Ok(text_files)
    }
}

impl Default for TextFileClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FileProbe {
    /// Run `xargs -0 file --no-dereference --print0` over `files`
    fn describe(&self, files: &[PathBuf]) -> std::io::Result<Vec<u8>> {
        let mut child = Command::new(&self.xargs)
            .arg("-0")
            .arg(&self.file)
            .args(["--no-dereference", "--print0"])
            .env("LC_ALL", "C")
            .env("LANG", "C")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let mut input = Vec::new();
        for file in files {
            input.extend_from_slice(file.as_os_str().as_bytes());
            input.push(0);
        }

        // Feed stdin from a thread so a full stdout pipe cannot deadlock us
        let stdin = child.stdin.take();
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&input)?;
            }
            Ok(())
        });

        let output = child.wait_with_output()?;
        // xargs may exit before reading all of stdin; what it printed still counts
        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Writing file(1) input failed: {}", e),
            Err(_) => warn!("file(1) stdin writer panicked"),
        }

        debug!(
            "file(1) described {} candidates ({})",
            files.len(),
            output.status
        );
        Ok(output.stdout)
    }
}

/// Extract text files from `file --print0` output
///
/// Each record is `path\0description`. `file` sometimes emits extra lines
/// for one path; those carry no NUL separator and are ignored. Paths not
/// in `candidates` are ignored too.
pub fn parse_probe_output(output: &[u8], candidates: &HashSet<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut text_files = Vec::new();

    for line in output.split(|&b| b == b'\n') {
        let Some(nul) = line.iter().position(|&b| b == 0) else {
            continue;
        };
        let (path, info) = (&line[..nul], &line[nul + 1..]);
        if !contains(info, b"text") {
            continue;
        }

        let path = PathBuf::from(OsStr::from_bytes(path));
        if candidates.contains(&path) && seen.insert(path.clone()) {
            text_files.push(path);
        }
    }

    text_files
}

/// True when the file starts with `#!` followed by an interpreter
pub fn is_text_executable(path: &Path) -> bool {
    let mut head = Vec::new();
    let read = File::open(path).and_then(|f| f.take(SHEBANG_SNIFF_LEN).read_to_end(&mut head));
    if let Err(e) = read {
        debug!("Cannot sniff {}: {}", path.display(), e);
        return false;
    }
    has_shebang(&head)
}

fn has_shebang(head: &[u8]) -> bool {
    let Some(rest) = head.strip_prefix(b"#!") else {
        return false;
    };
    rest.iter().any(|&b| !is_space(b))
}

// Ruby/PCRE `\s`: space, \t, \n, \v, \f, \r
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

fn is_metafile(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| METAFILE_EXTENSIONS.contains(&ext))
}

fn file_name_is(path: &Path, name: &str) -> bool {
    path.file_name() == Some(OsStr::new(name))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn create_keg(temp_dir: &TempDir) -> Keg {
        let root = temp_dir.path().join("Cellar/foo/1.0");
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::create_dir_all(root.join(".brew")).unwrap();
        Keg::from_path(&root).unwrap()
    }

    #[test]
    fn test_has_shebang() {
        assert!(has_shebang(b"#!/bin/sh\n"));
        assert!(has_shebang(b"#! /usr/bin/env python3\n"));
        assert!(!has_shebang(b"#!\n   \n"));
        assert!(!has_shebang(b"#"));
        assert!(!has_shebang(b"\x7fELF"));
        assert!(!has_shebang(b" #!/bin/sh"));
    }

    #[test]
    fn test_is_metafile() {
        assert!(is_metafile(Path::new("/k/README.md")));
        assert!(is_metafile(Path::new("/k/LICENSE.txt")));
        assert!(!is_metafile(Path::new("/k/lib/foo.pc")));
        assert!(!is_metafile(Path::new("/k/README")));
    }

    #[test]
    fn test_parse_probe_output() {
        let candidates: HashSet<PathBuf> = ["/k/a.pc", "/k/b", "/k/c.sh"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let output = b"/k/a.pc\0: ASCII text\n\
/k/b\0: Mach-O 64-bit executable\n\
- ascii text continuation line\n\
/k/c.sh\0: POSIX shell script, ASCII text executable\n\
/k/other\0: ASCII text\n";

        let text = parse_probe_output(output, &candidates);

        assert_eq!(text, vec![PathBuf::from("/k/a.pc"), PathBuf::from("/k/c.sh")]);
    }

    #[test]
    fn test_parse_probe_output_tolerates_binary_noise() {
        let candidates: HashSet<PathBuf> = [PathBuf::from("/k/a")].into_iter().collect();
        let output = b"\xff\xfe garbage\n/k/a\0: UTF-8 Unicode text\n";

        assert_eq!(parse_probe_output(output, &candidates), vec![PathBuf::from("/k/a")]);
    }

    #[test]
    fn test_without_probe_returns_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let keg = create_keg(&temp_dir);
        fs::write(keg.path().join("bin/foo"), b"#!/bin/sh\necho hi\n").unwrap();

        let classifier = TextFileClassifier::without_probe();
        assert!(!classifier.can_probe());
        assert!(classifier.text_files(&keg).unwrap().is_empty());
    }

    #[test]
    fn test_text_files_with_probe() {
        let classifier = TextFileClassifier::new();
        if !classifier.can_probe() {
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let keg = create_keg(&temp_dir);
        let script = keg.path().join("bin/foo");
        let config = keg.path().join("bin/foo-config");
        let binary = keg.path().join("bin/blob");
        fs::write(&script, b"#!/bin/sh\necho hi\n").unwrap();
        fs::write(&config, b"prefix=/opt/pkg\nlibdir=${prefix}/lib\n").unwrap();
        fs::write(&binary, [0u8, 1, 2, 3, 0xff, 0xfe, 0, 0, 7, 8, 0, 0x80]).unwrap();
        fs::write(keg.path().join("README.md"), b"docs\n").unwrap();
        fs::write(keg.descriptor_path(), b"class Foo < Formula\nend\n").unwrap();
        symlink("foo", keg.path().join("bin/foo-link")).unwrap();

        let text = classifier.text_files(&keg).unwrap();

        assert!(text.contains(&script));
        assert!(text.contains(&config));
        assert!(!text.contains(&binary));
        assert!(!text.contains(&keg.path().join("README.md")));
        assert!(!text.contains(&keg.descriptor_path()));
        assert!(!text.contains(&keg.path().join("bin/foo-link")));
    }

    #[test]
    fn test_virtualenv_prefix_file_is_probed() {
        let classifier = TextFileClassifier::new();
        if !classifier.can_probe() {
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let keg = create_keg(&temp_dir);
        let marker = keg.path().join("orig-prefix.txt");
        fs::write(&marker, b"/opt/pkg/opt/python\n").unwrap();

        assert!(classifier.text_files(&keg).unwrap().contains(&marker));
    }

    #[test]
    fn test_describe_keeps_output_when_stdin_closes_early() {
        use std::os::unix::fs::PermissionsExt;

        if which::which("sh").is_err() {
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        // Answers for one file and exits without reading its input
        let early_exit = temp_dir.path().join("xargs");
        fs::write(&early_exit, "#!/bin/sh\nprintf '/k/a.pc\\000: ASCII text\\n'\n").unwrap();
        fs::set_permissions(&early_exit, fs::Permissions::from_mode(0o755)).unwrap();
        let probe = FileProbe {
            xargs: early_exit,
            file: PathBuf::from("file"),
        };
        let mut files = vec![PathBuf::from("/k/a.pc")];
        files.extend((0..20_000).map(|i| PathBuf::from(format!("/k/{}/{:0>96}", i, i))));

        let output = probe.describe(&files).unwrap();

        let candidates: HashSet<PathBuf> = files.into_iter().collect();
        assert_eq!(
            parse_probe_output(&output, &candidates),
            vec![PathBuf::from("/k/a.pc")]
        );
    }
}
