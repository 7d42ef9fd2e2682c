//! Shared fixture types for the criterion benches.

/// A raw HTTP message kept as a wire-format fixture file (CRLF line
/// endings, ready to feed a decoder unchanged).
#[derive(Debug, Copy, Clone)]
pub struct Fixture {
    file_name: &'static str,
    content: &'static str,
}

impl Fixture {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn wire_len(&self) -> u64 {
        self.content.len() as u64
    }
}

/// A named benchmark case over one fixture.
#[derive(Debug, Copy, Clone)]
pub struct BenchCase {
    name: &'static str,
    fixture: Fixture,
}

impl BenchCase {
    pub fn new(name: &'static str, fixture: Fixture) -> Self {
        Self { name, fixture }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }
}
