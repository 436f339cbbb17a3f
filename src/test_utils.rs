//! Test utilities
//!
//! Generators for proptest and a recording fake of the process runner.

use futures::future::{FutureExt, LocalBoxFuture};
use std::cell::RefCell;

use crate::error::BuilderError;
use crate::infra::process::{Invocation, ProcessRunner};

pub mod generators {
    use proptest::prelude::*;

    /// Generate a single flag value (without its leading dash)
    pub fn flag_value() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9_=]{0,12}"
    }

    /// Generate a short list of flag values
    pub fn flag_values() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(flag_value(), 0..5)
    }

    /// Generate a platform or configuration tag
    pub fn tag() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("macOS".to_string()),
            Just("linux".to_string()),
            Just("debug".to_string()),
            Just("release".to_string()),
            "[a-z]{3,8}",
        ]
    }
}

type Handler = Box<dyn Fn(&Invocation) -> Result<String, BuilderError>>;

/// Process runner that launches nothing
///
/// Every invocation is recorded and answered by a handler closure. `exec`
/// calls are recorded too and fail, since the test process can't be replaced.
pub struct FakeRunner {
    handler: Handler,
    invocations: RefCell<Vec<Invocation>>,
    execs: RefCell<Vec<Invocation>>,
}

impl FakeRunner {
    /// Answer every invocation with `handler`
    pub fn new(handler: impl Fn(&Invocation) -> Result<String, BuilderError> + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            invocations: RefCell::new(Vec::new()),
            execs: RefCell::new(Vec::new()),
        }
    }

    /// Every invocation succeeds with empty output
    pub fn succeeding() -> Self {
        Self::new(|_| Ok(String::new()))
    }

    /// Invocations run so far, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Invocations that asked to replace the process
    pub fn execs(&self) -> Vec<Invocation> {
        self.execs.borrow().clone()
    }
}

impl ProcessRunner for FakeRunner {
    fn run<'a>(&'a self, invocation: &'a Invocation) -> LocalBoxFuture<'a, Result<String, BuilderError>> {
        self.invocations.borrow_mut().push(invocation.clone());
        let result = (self.handler)(invocation);
        async move { result }.boxed_local()
    }

    fn exec(&self, invocation: &Invocation) -> BuilderError {
        self.execs.borrow_mut().push(invocation.clone());
        BuilderError::Launch {
            program: invocation.program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::Unsupported, "exec in tests"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_fake_runner_records_invocations() {
        let runner = FakeRunner::new(|invocation| Ok(invocation.args.join(" ")));
        let invocation = Invocation::new("/usr/bin/swift", vec!["build".to_string()]);

        let output = runner.run(&invocation).await.unwrap();

        assert_eq!(output, "build");
        assert_eq!(runner.invocations(), vec![invocation]);
        assert!(runner.execs().is_empty());
    }

    #[test]
    fn test_fake_runner_exec_fails() {
        let runner = FakeRunner::succeeding();
        let invocation = Invocation::new("/usr/bin/swift", Vec::new());

        let error = runner.exec(&invocation);

        assert!(matches!(error, BuilderError::Launch { .. }));
        assert_eq!(runner.execs().len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_flag_value_generator(value in flag_value()) {
            prop_assert!(!value.is_empty());
            prop_assert!(!value.starts_with('-'));
        }

        #[test]
        fn test_tag_generator(tag in tag()) {
            prop_assert!(tag.len() >= 3);
        }
    }
}
