/// Navigation seam for the side channels that move the user to another page.
pub trait History {
    fn pathname(&self) -> &str;
    fn push(&mut self, path: &str);
}

/// In-memory history stack.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl History for MemoryHistory {
    fn pathname(&self) -> &str {
        self.entries.last().map(String::as_str).unwrap_or("/")
    }

    fn push(&mut self, path: &str) {
        self.entries.push(path.to_string());
    }
}
