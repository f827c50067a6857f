#![cfg(test)]

//! `test!`/`error!` harness shared by the integration tests: a `test!`
//! macro that compiles `$input` and asserts the emitted CSS equals
//! `$output`, and an `error!` macro that asserts compilation fails with
//! a message equal to `$err`. Both accept a leading `$(#[$attr])*` so
//! call sites can attach `#[ignore = "..."]` the way
//! `content-exists.rs` does.

#[macro_export]
macro_rules! test {
    ($(#[$attr:meta])* $func:ident, $input:expr, $output:expr) => {
        $(#[$attr])*
        #[test]
        fn $func() {
            let input: &str = $input;
            let output: &str = $output;
            match sassy::compile_string(input, &sassy::Options::default()) {
                Ok(css) => assert_eq!(output, css, "input:\n{}", input),
                Err(e) => panic!("expected success, got error for {:?}: {}", input, e),
            }
        }
    };
}

#[macro_export]
macro_rules! error {
    ($(#[$attr:meta])* $func:ident, $input:expr, $err:expr) => {
        $(#[$attr])*
        #[test]
        fn $func() {
            let input: &str = $input;
            let expected: &str = $err;
            match sassy::compile_string(input, &sassy::Options::default()) {
                Ok(css) => panic!("expected error {:?}, but compiled to {:?}", expected, css),
                Err(e) => assert_eq!(expected, e.to_string(), "input:\n{}", input),
            }
        }
    };
}
