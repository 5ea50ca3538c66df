//! Brace depth tracking across source lines.
//!
//! Counts `{`/`}` in code position only: string literals, template literals
//! (including `${}` interpolation), line comments and block comments are
//! skipped. Block comments and template literals may span lines, so the
//! tracker keeps its state between calls to [`BraceTracker::feed`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Template,
    /// Code inside `${ ... }`, with its own nesting count.
    Interpolation(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BraceEvent {
    /// Byte offset of the brace within the fed text.
    pub offset: usize,
    pub open: bool,
    /// Depth after the brace has been applied.
    pub depth: i32,
}

#[derive(Debug, Clone, Default)]
pub struct BraceTracker {
    depth: i32,
    in_block_comment: bool,
    modes: Vec<Mode>,
}

impl BraceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// True when the tracker sits inside a construct that continues onto the
    /// next line (block comment or template literal).
    pub fn is_mid_token(&self) -> bool {
        self.in_block_comment || !self.modes.is_empty()
    }

    /// Feed one line of text, returning the code-position braces it contains.
    pub fn feed(&mut self, text: &str) -> Vec<BraceEvent> {
        let mut events = Vec::new();
        let bytes = text.as_bytes();
        let mut in_string: Option<u8> = None;
        let mut i = 0;

        while i < bytes.len() {
            let c = bytes[i];
            let next = bytes.get(i + 1).copied();

            if self.in_block_comment {
                if c == b'*' && next == Some(b'/') {
                    self.in_block_comment = false;
                    i += 2;
                } else {
                    i += 1;
                }
                continue;
            }

            if let Some(quote) = in_string {
                if c == b'\\' {
                    i += 2;
                    continue;
                }
                if c == quote {
                    in_string = None;
                }
                i += 1;
                continue;
            }

            if let Some(Mode::Template) = self.modes.last() {
                match c {
                    b'\\' => i += 2,
                    b'`' => {
                        self.modes.pop();
                        i += 1;
                    }
                    b'$' if next == Some(b'{') => {
                        self.modes.push(Mode::Interpolation(0));
                        i += 2;
                    }
                    _ => i += 1,
                }
                continue;
            }

            match c {
                b'/' if next == Some(b'/') => break,
                b'/' if next == Some(b'*') => {
                    self.in_block_comment = true;
                    i += 2;
                    continue;
                }
                b'\'' | b'"' => in_string = Some(c),
                b'`' => self.modes.push(Mode::Template),
                b'{' => match self.modes.last_mut() {
                    Some(Mode::Interpolation(n)) => *n += 1,
                    _ => {
                        self.depth += 1;
                        events.push(BraceEvent {
                            offset: i,
                            open: true,
                            depth: self.depth,
                        });
                    }
                },
                b'}' => match self.modes.last_mut() {
                    Some(Mode::Interpolation(0)) => {
                        self.modes.pop();
                    }
                    Some(Mode::Interpolation(n)) => *n -= 1,
                    _ => {
                        self.depth -= 1;
                        events.push(BraceEvent {
                            offset: i,
                            open: false,
                            depth: self.depth,
                        });
                    }
                },
                _ => {}
            }
            i += 1;
        }

        events
    }
}
