//! Per-execution capture of printed output

use std::cell::RefCell;
use std::rc::Rc;

/// Ordered buffer of printed lines.
///
/// Cloning yields another handle to the same buffer, so the sandbox's `print`
/// binding and the coordinator can share it. A sink belongs to one execution
/// attempt and never crosses threads.
#[derive(Debug, Clone, Default)]
pub struct OutputSink {
    entries: Rc<RefCell<Vec<String>>>,
}

impl OutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry made of `parts` joined by tabs, like Lua's `print`.
    pub fn record<I, S>(&self, parts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entry = String::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                entry.push('\t');
            }
            entry.push_str(part.as_ref());
        }
        self.entries.borrow_mut().push(entry);
    }

    /// Append an already formatted entry.
    pub fn write(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    /// All entries recorded so far, in emission order.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
