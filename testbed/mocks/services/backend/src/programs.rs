//! A tiny scripting language the mock backend "executes" in place of real code.
//!
//! Each source line is one instruction; anything unrecognised is ignored so real
//! snippets (e.g. `int main() {}`) still run and produce no output.
//!
//! | line            | effect                                                  |
//! |-----------------|---------------------------------------------------------|
//! | `print(1)`      | writes `1\n`                                            |
//! | `print hello`   | writes `hello\n`; `$input` expands to the last input    |
//! | `input Enter n:`| requests a line of stdin with prompt `Enter n:`         |
//! | `error boom`    | fails with `boom` on stderr                             |
//! | `sleep 200`     | pauses for 200 ms                                       |

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Print(String),
    Input(String),
    Error(String),
    Sleep(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FakeProgram {
    steps: Vec<Step>,
}

/// Outcome of running a program with all stdin supplied up front.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchRun {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub delay: Duration,
}

impl FakeProgram {
    pub fn parse(code: &str) -> Self {
        let steps = code.lines().filter_map(parse_line).collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn run_batch(&self, stdin: &str) -> BatchRun {
        let mut inputs = stdin.lines();
        let mut last_input = String::new();
        let mut run = BatchRun {
            success: true,
            ..Default::default()
        };

        for step in &self.steps {
            match step {
                Step::Print(text) => {
                    run.stdout.push_str(&render(text, &last_input));
                    run.stdout.push('\n');
                }
                Step::Input(prompt) => {
                    run.stdout.push_str(prompt);
                    last_input = inputs.next().unwrap_or_default().to_string();
                }
                Step::Error(message) => {
                    run.stderr = render(message, &last_input);
                    run.success = false;
                    break;
                }
                Step::Sleep(duration) => run.delay += *duration,
            }
        }

        run
    }
}

/// Substitutes the last line of input for `$input`.
pub fn render(template: &str, last_input: &str) -> String {
    template.replace("$input", last_input)
}

fn parse_line(line: &str) -> Option<Step> {
    let line = line.trim();
    if let Some(arg) = call_argument(line, "print") {
        return Some(Step::Print(arg));
    }
    if let Some(arg) = call_argument(line, "input") {
        return Some(Step::Input(arg));
    }
    if let Some(arg) = call_argument(line, "error") {
        return Some(Step::Error(arg));
    }
    if let Some(arg) = call_argument(line, "sleep") {
        let millis = arg.parse().ok()?;
        return Some(Step::Sleep(Duration::from_millis(millis)));
    }
    None
}

fn call_argument(line: &str, keyword: &str) -> Option<String> {
    let rest = line.strip_prefix(keyword)?;
    if let Some(inner) = rest.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        return Some(unquote(inner.trim()).to_string());
    }
    let arg = rest.strip_prefix(' ')?;
    Some(arg.to_string())
}

fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text.strip_prefix(quote).and_then(|t| t.strip_suffix(quote)) {
            return inner;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_program() {
        let program = FakeProgram::parse(
            "print(1)\ninput(\"Enter n: \")\nprint got $input\nint main() {}\nsleep 5\nerror bad",
        );
        assert_eq!(
            program.steps(),
            &[
                Step::Print("1".to_string()),
                Step::Input("Enter n: ".to_string()),
                Step::Print("got $input".to_string()),
                Step::Sleep(Duration::from_millis(5)),
                Step::Error("bad".to_string()),
            ]
        );
    }

    #[test]
    fn test_batch_run_consumes_stdin() {
        let program = FakeProgram::parse("input n?\nprint twice $input $input");
        let run = program.run_batch("7\n");
        assert!(run.success);
        assert_eq!(run.stdout, "n?twice 7 7\n");
    }

    #[test]
    fn test_batch_run_stops_at_error() {
        let program = FakeProgram::parse("print a\nerror NameError: x\nprint b");
        let run = program.run_batch("");
        assert!(!run.success);
        assert_eq!(run.stdout, "a\n");
        assert_eq!(run.stderr, "NameError: x");
    }
}
