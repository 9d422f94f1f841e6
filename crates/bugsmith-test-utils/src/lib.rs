//! Testing utilities for the bugsmith workspace
//!
//! Shared Python fixtures and tree-inspection helpers.

#![allow(missing_docs)]

use bugsmith_syntax::{Module, PythonParser, SourceParser, Stmt};

/// Python programs used across test suites
pub mod fixtures {
    pub const SIMPLE_ASSIGNMENT: &str = "x = 1\n";

    pub const ARITHMETIC: &str = "\
price = 10
tax = 2
total = price + tax - 1
discount = total - 0
";

    pub const FUNCTIONS: &str = "\
def add(a, b=1):
    result = a + b
    return result

async def fetch(url):
    data = await get(url)
    return data
";

    pub const CLASSES: &str = "\
class Counter:
    start = 0

    def __init__(self, step=1):
        self.count = 0
        self.step = step

    def bump(self):
        self.count += self.step
        return self.count
";

    pub const CONTROL_FLOW: &str = "\
items = [3, 1, 2]
for item in items:
    if item > 1:
        print(item)
    elif item == 1:
        continue
    else:
        break
while items:
    last = items.pop()
try:
    value = int('7')
except ValueError as err:
    value = -1
finally:
    done = True
";

    pub const COMPREHENSIONS: &str = "\
squares = [n * n for n in range(10) if n % 2]
lookup = {k: v + 1 for k, v in pairs}
total = sum(x - 1 for x in squares)
";

    /// Read of `x` before its binding occurrence
    pub const READ_BEFORE_BIND: &str = "\
print(x)
x = 5
print(x)
";

    /// `match` with value, class and capture patterns, and f-strings
    pub const PATTERN_MATCHING: &str = "\
mode = 'fast'
limit = 3
match mode, limit:
    case ('fast', n) if n > 1:
        label = f\"{mode}:{n + 1}\"
    case Settings.DEFAULT:
        label = f'default {limit!r:>{limit}}'
    case _:
        label = None
";

    /// Every fixture with a name
    #[must_use]
    pub fn all() -> Vec<(&'static str, &'static str)> {
        vec![
            ("simple_assignment", SIMPLE_ASSIGNMENT),
            ("arithmetic", ARITHMETIC),
            ("functions", FUNCTIONS),
            ("classes", CLASSES),
            ("control_flow", CONTROL_FLOW),
            ("comprehensions", COMPREHENSIONS),
            ("read_before_bind", READ_BEFORE_BIND),
            ("pattern_matching", PATTERN_MATCHING),
        ]
    }
}

/// Parse a fixture, panicking on invalid source
#[must_use]
pub fn parse(source: &str) -> Module {
    PythonParser::new()
        .parse(source)
        .unwrap_or_else(|e| panic!("fixture failed to parse: {}\n{}", e, source))
}

/// Visit every statement, nested bodies included, in pre-order
pub fn for_each_stmt(body: &[Stmt], f: &mut impl FnMut(&Stmt)) {
    for stmt in body {
        f(stmt);
        match stmt {
            Stmt::FunctionDef(def) => for_each_stmt(&def.body, f),
            Stmt::ClassDef(def) => for_each_stmt(&def.body, f),
            Stmt::For(stmt) => {
                for_each_stmt(&stmt.body, f);
                for_each_stmt(&stmt.orelse, f);
            }
            Stmt::While { body, orelse, .. } | Stmt::If { body, orelse, .. } => {
                for_each_stmt(body, f);
                for_each_stmt(orelse, f);
            }
            Stmt::With(stmt) => for_each_stmt(&stmt.body, f),
            Stmt::Try(stmt) => {
                for_each_stmt(&stmt.body, f);
                for handler in &stmt.handlers {
                    for_each_stmt(&handler.body, f);
                }
                for_each_stmt(&stmt.orelse, f);
                for_each_stmt(&stmt.finalbody, f);
            }
            Stmt::Match { cases, .. } => {
                for case in cases {
                    for_each_stmt(&case.body, f);
                }
            }
            _ => {}
        }
    }
}

/// Count statements matching `pred`
#[must_use]
pub fn count_stmts(module: &Module, pred: impl Fn(&Stmt) -> bool) -> usize {
    let mut count = 0;
    for_each_stmt(&module.body, &mut |stmt| {
        if pred(stmt) {
            count += 1;
        }
    });
    count
}

/// Statements a wrap may target (everything but `def`, `class`, `if`)
#[must_use]
pub fn count_wrap_eligible(module: &Module) -> usize {
    count_stmts(module, |stmt| {
        !matches!(stmt, Stmt::FunctionDef(_) | Stmt::ClassDef(_) | Stmt::If { .. })
    })
}

/// Function definitions with a non-empty body
#[must_use]
pub fn count_functions(module: &Module) -> usize {
    count_stmts(module, |stmt| matches!(stmt, Stmt::FunctionDef(def) if !def.body.is_empty()))
}

/// Text after the metadata docstring, or all of it when there is none
#[must_use]
pub fn strip_header(text: &str) -> &str {
    if !text.starts_with("\"\"\"\n") {
        return text;
    }
    match text[3..].find("\"\"\"\n\n") {
        Some(end) => &text[3 + end + 5..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_parse() {
        for (name, source) in fixtures::all() {
            assert!(
                PythonParser::new().parse(source).is_ok(),
                "fixture {} does not parse",
                name
            );
        }
    }

    #[test]
    fn wrap_eligible_counts_nested_statements() {
        let module = parse(fixtures::FUNCTIONS);
        // two assignments and two returns; the defs are excluded
        assert_eq!(count_wrap_eligible(&module), 4);
        assert_eq!(count_functions(&module), 2);
    }

    #[test]
    fn case_bodies_are_counted() {
        let module = parse(fixtures::PATTERN_MATCHING);
        // two assignments, the match and one assignment per case
        assert_eq!(count_wrap_eligible(&module), 6);
    }

    #[test]
    fn strip_header_removes_docstring() {
        let text = "\"\"\"\nheader\n\"\"\"\n\nx = 1\n";
        assert_eq!(strip_header(text), "x = 1\n");
        assert_eq!(strip_header("x = 1\n"), "x = 1\n");
    }
}
