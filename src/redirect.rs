use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use crate::error::ShellError;
use crate::parser::Token;

/// Permission bits for files created by output redirection.
pub const CREATE_MODE: u32 = 0o644;

/// Where standard output goes, and whether it appends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRedirect {
    pub path: PathBuf,
    pub append: bool,
}

/// Redirections and the background marker pulled out of a token list.
#[derive(Debug, Default, PartialEq)]
pub struct Redirections {
    pub input: Option<PathBuf>,
    pub output: Option<OutputRedirect>,
    pub background: bool,
}

/// Separate redirect operators from regular arguments.
///
/// Handles `<`, `>`, `>>` and `&`. A later redirect of the same stream
/// replaces an earlier one.
pub fn extract_redirections(tokens: &[Token]) -> Result<(Vec<String>, Redirections), ShellError> {
    let mut args = Vec::new();
    let mut redirections = Redirections::default();
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        match token {
            Token::Word(word) => args.push(word.clone()),
            Token::Background => redirections.background = true,
            Token::Input => {
                redirections.input = Some(expect_filename(iter.next(), "<")?);
            }
            Token::Output => {
                let path = expect_filename(iter.next(), ">")?;
                redirections.output = Some(OutputRedirect { path, append: false });
            }
            Token::Append => {
                let path = expect_filename(iter.next(), ">>")?;
                redirections.output = Some(OutputRedirect { path, append: true });
            }
        }
    }

    Ok((args, redirections))
}

fn expect_filename(token: Option<&Token>, operator: &str) -> Result<PathBuf, ShellError> {
    match token {
        Some(Token::Word(path)) => Ok(PathBuf::from(path)),
        _ => Err(ShellError::Syntax(format!(
            "expected filename after '{operator}'"
        ))),
    }
}

/// Open an output redirection target in the shell itself (used by builtins).
/// Same semantics as the child-side redirect: create, `0644`, truncate or append.
pub fn open_output(target: &OutputRedirect) -> Result<File, ShellError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).mode(CREATE_MODE);
    if target.append {
        options.append(true);
    } else {
        options.truncate(true);
    }

    options.open(&target.path).map_err(|source| ShellError::Redirect {
        path: target.path.clone(),
        source,
    })
}

/// A redirect target converted ahead of `fork`, so the child never allocates.
#[derive(Debug)]
pub struct PreparedPath {
    path: CString,
    diagnostic: Vec<u8>,
}

impl PreparedPath {
    fn new(path: &Path) -> Result<Self, ShellError> {
        let path_c = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| ShellError::InvalidArgument(path.display().to_string()))?;
        let diagnostic = format!("mysh: {}: cannot open file\n", path.display()).into_bytes();
        Ok(Self {
            path: path_c,
            diagnostic,
        })
    }

    /// Message the child writes to stderr before exiting.
    pub fn diagnostic(&self) -> &[u8] {
        &self.diagnostic
    }
}

/// Child-side stream rebinding, prepared in the parent.
#[derive(Debug, Default)]
pub struct RedirectPlan {
    input: Option<PreparedPath>,
    output: Option<(PreparedPath, bool)>,
}

impl RedirectPlan {
    pub fn prepare(
        input: Option<&Path>,
        output: Option<&OutputRedirect>,
    ) -> Result<Self, ShellError> {
        Ok(Self {
            input: input.map(PreparedPath::new).transpose()?,
            output: output
                .map(|o| PreparedPath::new(&o.path).map(|p| (p, o.append)))
                .transpose()?,
        })
    }

    /// Rebind stdin/stdout onto the prepared files.
    ///
    /// Runs between `fork` and `exec`: only async-signal-safe calls, no
    /// allocation. On failure the returned path names the file that could
    /// not be opened, and the caller must not exec.
    pub fn apply(&self) -> Result<(), &PreparedPath> {
        if let Some(input) = &self.input {
            rebind(input, libc::O_RDONLY, libc::STDIN_FILENO).map_err(|_| input)?;
        }

        if let Some((output, append)) = &self.output {
            let mode = if *append { libc::O_APPEND } else { libc::O_TRUNC };
            let flags = libc::O_WRONLY | libc::O_CREAT | mode;
            rebind(output, flags, libc::STDOUT_FILENO).map_err(|_| output)?;
        }

        Ok(())
    }
}

fn rebind(target: &PreparedPath, flags: libc::c_int, fd: libc::c_int) -> io::Result<()> {
    let opened = unsafe { libc::open(target.path.as_ptr(), flags, CREATE_MODE as libc::c_uint) };
    if opened < 0 {
        return Err(io::Error::last_os_error());
    }
    if opened == fd {
        return Ok(());
    }

    let rc = unsafe { libc::dup2(opened, fd) };
    let err = io::Error::last_os_error();
    unsafe { libc::close(opened) };
    if rc < 0 {
        return Err(err);
    }
    Ok(())
}
