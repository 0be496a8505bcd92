use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::language::LanguageProfile;

const JS_READS: &str =
    r#"\breadline\b|process\.stdin|readFileSync\s*\(\s*(0|'/dev/stdin'|"/dev/stdin")"#;

/// Read calls that mean a program consumes standard input, keyed by the
/// sandbox runtime so that renamed catalog entries still match.
const READ_PATTERNS: &[(&str, &str)] = &[
    ("java", r"Scanner\s*\(\s*System\.in\s*\)|BufferedReader|System\.in\.read"),
    ("kotlin", r"\breadLine\s*\(|\breadln\s*\(|Scanner\s*\(\s*System\.`?in`?\s*\)"),
    ("python", r"\binput\s*\(|sys\.stdin"),
    ("javascript", JS_READS),
    ("typescript", JS_READS),
    ("c", r"\bscanf\s*\(|\bgetchar\s*\(|\bfgets\s*\(|\bgets\s*\("),
    ("c++", r"\bcin\s*>>|\bgetline\s*\(|\bscanf\s*\(|\bgetchar\s*\("),
    ("csharp", r"Console\.(ReadLine|Read|In)\b"),
    ("go", r"os\.Stdin|fmt\.Scan"),
    ("rust", r"stdin\s*\(\s*\)"),
    ("ruby", r"\bgets\b|STDIN|\$stdin"),
];

static COMPILED: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    READ_PATTERNS
        .iter()
        .map(|(runtime, pattern)| {
            (
                *runtime,
                Regex::new(pattern).expect("stdin read patterns are valid regexes"),
            )
        })
        .collect()
});

/// Returned instead of running a program that would wait for missing input.
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct InputRequired {
    pub language: String,
    pub message: String,
}

/// Checks whether `code` reads standard input while `stdin` is blank.
///
/// Runtimes without patterns of their own are checked against all of them.
pub fn check_stdin(
    code: &str,
    language: &LanguageProfile,
    stdin: &str,
) -> Result<(), InputRequired> {
    if !stdin.trim().is_empty() {
        return Ok(());
    }

    let mut patterns = COMPILED
        .iter()
        .filter(|(runtime, _)| runtime.eq_ignore_ascii_case(&language.runtime))
        .peekable();
    let reads_stdin = if patterns.peek().is_some() {
        patterns.any(|(_, re)| re.is_match(code))
    } else {
        COMPILED.iter().any(|(_, re)| re.is_match(code))
    };

    if reads_stdin {
        log::debug!(
            "Skipping {} run: program reads stdin but no input was given",
            language.name
        );
        return Err(InputRequired {
            language: language.name.clone(),
            message: "This program reads from standard input, but the input box is empty. \
                      Enter the input your program expects and run again."
                .to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageCatalog;

    fn check(code: &str, language: &str, stdin: &str) -> Result<(), InputRequired> {
        let catalog = LanguageCatalog::builtin();
        let profile = catalog.get(language).unwrap();
        check_stdin(code, profile, stdin)
    }

    fn profile(name: &str, runtime: &str) -> LanguageProfile {
        LanguageProfile {
            name: name.to_string(),
            aliases: Vec::new(),
            default_code: String::new(),
            runtime: runtime.to_string(),
            version: "*".to_string(),
            file_name: None,
        }
    }

    #[test]
    fn test_java_scanner_without_input() {
        let code = "Scanner sc = new Scanner(System.in);\nint n = sc.nextInt();";
        assert!(check(code, "Java", "").is_err());
        assert!(check(code, "Java", "  \n").is_err());
        assert!(check(code, "Java", "5\n").is_ok());
    }

    #[test]
    fn test_language_specific_patterns() {
        assert!(check("n = int(input())", "Python", "").is_err());
        assert!(check("import sys\ndata = sys.stdin.read()", "Python", "").is_err());
        assert!(check("int n; cin >> n;", "C++", "").is_err());
        assert!(check("scanf(\"%d\", &n);", "C", "").is_err());
        assert!(check("reader := bufio.NewReader(os.Stdin)", "Go", "").is_err());
        assert!(check("std::io::stdin().read_line(&mut s)", "Rust", "").is_err());
        assert!(check("var s = Console.ReadLine();", "C#", "").is_err());
        assert!(
            check("const d = require('fs').readFileSync(0, 'utf8');", "JavaScript", "").is_err()
        );
    }

    #[test]
    fn test_programs_without_reads_run() {
        assert!(check("print('hello')", "Python", "").is_ok());
        assert!(check("fn main() { println!(\"hi\"); }", "Rust", "").is_ok());
        assert!(check("System.out.println(1);", "Java", "").is_ok());
    }

    #[test]
    fn test_patterns_are_scoped_to_the_language() {
        // `input(` is a Python read, not a Java one
        assert!(check("String input(String s) { return s; }", "Java", "").is_ok());
    }

    #[test]
    fn test_renamed_profile_uses_its_runtime_patterns() {
        let python = profile("Python 3", "python");
        // `gets` is a Ruby read; a Python variable of that name is harmless
        assert!(check_stdin("gets = 1\nprint(gets)", &python, "").is_ok());

        let err = check_stdin("n = int(input())", &python, "").unwrap_err();
        assert_eq!(err.language, "Python 3");
    }

    #[test]
    fn test_unknown_runtime_checks_everything() {
        let elixir = profile("Elixir", "elixir");
        assert!(check_stdin("x = input()", &elixir, "").is_err());
        assert!(check_stdin("IO.puts 1", &elixir, "").is_ok());
    }
}
