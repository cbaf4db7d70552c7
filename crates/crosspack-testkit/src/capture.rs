//! Output capture scopes for block expectations.
//!
//! Every invocation echoes the child's output to the test process's own
//! streams. When a capture scope is open on the current thread, the echoed
//! bytes are also appended to the innermost scope, which is how an enclosing
//! output assertion observes output produced while it drives an inner check.

use std::borrow::Cow;
use std::cell::RefCell;

thread_local! {
    static CAPTURE_STACK: RefCell<Vec<OutputBuffer>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Default)]
struct OutputBuffer {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Output observed while a closure ran, alongside the closure's value.
#[derive(Debug)]
pub struct CapturedOutput<T> {
    pub value: T,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl<T> CapturedOutput<T> {
    pub fn stdout_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

/// Runs `f` inside a fresh capture scope.
///
/// The scope is closed on every exit path, including a panic in `f`.
pub fn capture_output<T>(f: impl FnOnce() -> T) -> CapturedOutput<T> {
    let scope = CaptureScope::open();
    let value = f();
    let buffer = scope.close();
    CapturedOutput {
        value,
        stdout: buffer.stdout,
        stderr: buffer.stderr,
    }
}

pub fn capture_active() -> bool {
    CAPTURE_STACK.with(|stack| !stack.borrow().is_empty())
}

/// Echoes child output to this process and to the innermost capture scope.
pub(crate) fn echo_output(stdout: &[u8], stderr: &[u8]) {
    // print!/eprint! rather than io::stdout() so libtest's capture sees it.
    if !stdout.is_empty() {
        print!("{}", String::from_utf8_lossy(stdout));
    }
    if !stderr.is_empty() {
        eprint!("{}", String::from_utf8_lossy(stderr));
    }

    CAPTURE_STACK.with(|stack| {
        if let Some(buffer) = stack.borrow_mut().last_mut() {
            buffer.stdout.extend_from_slice(stdout);
            buffer.stderr.extend_from_slice(stderr);
        }
    });
}

struct CaptureScope {
    depth: usize,
    closed: bool,
}

impl CaptureScope {
    fn open() -> Self {
        let depth = CAPTURE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(OutputBuffer::default());
            stack.len()
        });
        Self {
            depth,
            closed: false,
        }
    }

    fn close(mut self) -> OutputBuffer {
        self.closed = true;
        CAPTURE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.truncate(self.depth);
            stack.pop().unwrap_or_default()
        })
    }
}

impl Drop for CaptureScope {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        CAPTURE_STACK.with(|stack| {
            if let Ok(mut stack) = stack.try_borrow_mut() {
                stack.truncate(self.depth.saturating_sub(1));
            }
        });
    }
}
