//! In-memory [`ExternalTool`] for tests.

use std::cell::RefCell;

use super::ExternalTool;

type Handler = Box<dyn Fn(&[String]) -> std::io::Result<i32>>;

/// Records every invocation and answers with a configurable handler.
pub(crate) struct FakeTool {
    name: String,
    available: bool,
    handler: Handler,
    calls: RefCell<Vec<Vec<String>>>,
}

impl FakeTool {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            available: true,
            handler: Box::new(|_| Ok(0)),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub(crate) fn with_handler(
        mut self,
        handler: impl Fn(&[String]) -> std::io::Result<i32> + 'static,
    ) -> Self {
        self.handler = Box::new(handler);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }
}

impl ExternalTool for FakeTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn probe(&self) -> bool {
        self.available
    }

    fn run(&self, args: &[String]) -> std::io::Result<i32> {
        self.calls.borrow_mut().push(args.to_vec());
        (self.handler)(args)
    }
}
