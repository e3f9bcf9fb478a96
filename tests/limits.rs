//! The default depth limit has to trip before the thread stack runs out. These run on threads
//! with the 2 MiB stack Rust gives spawned threads by default.

use std::thread;

use chainrex::{Error, Regex, RegexBuilder, RuntimeError};
use matches::assert_matches;

const STACK: usize = 2 * 1024 * 1024;

fn on_thread<F>(stack: usize, f: F)
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .stack_size(stack)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn long_chain_reports_overflow() {
    on_thread(STACK, || {
        let re = Regex::new(&r"\d".repeat(2000)).unwrap();
        assert_matches!(
            re.is_match(&"1".repeat(2000)),
            Err(Error::RuntimeError(RuntimeError::StackOverflow))
        );
    });
}

#[test]
fn nested_groups_report_overflow() {
    on_thread(STACK, || {
        let nested = format!("{}a{}", "(".repeat(60), ")".repeat(60));
        let re = Regex::new(&nested.repeat(20)).unwrap();
        assert_matches!(
            re.is_match(&"a".repeat(20)),
            Err(Error::RuntimeError(RuntimeError::StackOverflow))
        );
    });
}

#[test]
fn chain_within_the_limit_matches() {
    on_thread(STACK, || {
        let re = Regex::new(&r"\d".repeat(300)).unwrap();
        assert!(re.is_match(&"1".repeat(300)).unwrap());

        let nested = format!("{}a{}", "(".repeat(60), ")".repeat(60));
        let re = Regex::new(&nested.repeat(2)).unwrap();
        assert!(re.is_match("aa").unwrap());
    });
}

#[test]
fn raised_limit_with_a_bigger_stack() {
    on_thread(64 * 1024 * 1024, || {
        let re = RegexBuilder::new()
            .max_depth(5000)
            .build(&r"\d".repeat(2000))
            .unwrap();
        assert!(re.is_match(&"1".repeat(2000)).unwrap());
    });
}
