pub const EXPECTED_MORE_INPUT: &str = "Your program expected more input than was provided. \
Add the missing values to the input box and run again.";

const INPUT_TYPE_MISMATCH: &str = "The input did not match the type your program tried to read, \
for example text where a number was expected.";

const BAD_NUMBER: &str = "A value could not be parsed as a number. \
Check the input format and strip stray spaces or separators.";

const OUT_OF_BOUNDS: &str = "An index went outside the bounds of an array, list or string. \
Check loop limits and off-by-one errors.";

const NULL_REFERENCE: &str = "A variable was used before it was given a value. \
Check that objects are initialized before use.";

const DIVISION_BY_ZERO: &str = "A division by zero occurred. Guard divisors that can be zero.";

const TOO_DEEP: &str = "Recursion went too deep. Check the base case, or rewrite the recursion as a loop.";

const OUT_OF_MEMORY: &str = "The program ran out of memory. Look for unbounded collections or very large allocations.";

const BAD_MEMORY_ACCESS: &str = "The program accessed invalid memory. \
Check array indices, pointers and recursion depth.";

/// Known runtime failures, matched by substring against stderr in order.
///
/// Adding an entry is all it takes to support a new hint.
pub const EXCEPTION_HINTS: &[(&str, &str)] = &[
    ("NoSuchElementException", EXPECTED_MORE_INPUT),
    ("EOFError", EXPECTED_MORE_INPUT),
    ("InputMismatchException", INPUT_TYPE_MISMATCH),
    ("NumberFormatException", BAD_NUMBER),
    ("ValueError: invalid literal", BAD_NUMBER),
    ("ArrayIndexOutOfBoundsException", OUT_OF_BOUNDS),
    ("StringIndexOutOfBoundsException", OUT_OF_BOUNDS),
    ("IndexOutOfBoundsException", OUT_OF_BOUNDS),
    ("IndexError", OUT_OF_BOUNDS),
    ("NullPointerException", NULL_REFERENCE),
    ("ArithmeticException", DIVISION_BY_ZERO),
    ("ZeroDivisionError", DIVISION_BY_ZERO),
    ("StackOverflowError", TOO_DEEP),
    ("RecursionError", TOO_DEEP),
    ("OutOfMemoryError", OUT_OF_MEMORY),
    ("MemoryError", OUT_OF_MEMORY),
    ("Segmentation fault", BAD_MEMORY_ACCESS),
];

/// Hints for every known failure mentioned in `stderr`, without duplicates.
pub fn hints_for(stderr: &str) -> Vec<String> {
    let mut hints: Vec<String> = Vec::new();
    for (needle, hint) in EXCEPTION_HINTS {
        if stderr.contains(needle) && !hints.iter().any(|h| h == hint) {
            hints.push(hint.to_string());
        }
    }
    hints
}
