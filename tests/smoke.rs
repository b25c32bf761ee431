// snx smoke tests for the execution engine
// Covers: printing, scopes, functions, block skipping, styles, input, exec, GOTO and END

use snxscript::interpreter::errors::{ErrorKind, Severity};
use snxscript::platform::{DryRunRunner, MemoryOutput, ScriptedInput};
use snxscript::{
    BlockStyle, Engine, EngineIo, EngineOptions, ExitReason, ScriptError, SourceLines, Value,
};

struct Run {
    engine: Engine,
    output: MemoryOutput,
    errors: MemoryOutput,
    commands: DryRunRunner,
    result: Result<ExitReason, ScriptError>,
}

impl Run {
    fn kinds(&self) -> Vec<ErrorKind> {
        self.engine.diagnostics().iter().map(|d| d.kind()).collect()
    }
}

fn run_with(script: &str, style: BlockStyle, input: &[&str], announce_end: bool) -> Run {
    let output = MemoryOutput::new();
    let errors = MemoryOutput::new();
    let commands = DryRunRunner::new();
    let io = EngineIo::in_memory(
        ScriptedInput::new(input.iter().copied()),
        output.clone(),
        errors.clone(),
        commands.clone(),
    );
    let options = EngineOptions {
        style,
        announce_end,
    };
    let mut engine = Engine::with_io(SourceLines::from_text(script), options, io);
    let result = engine.run();
    Run {
        engine,
        output,
        errors,
        commands,
        result,
    }
}

fn run(script: &str) -> Run {
    run_with(script, BlockStyle::EndKeyword, &[], false)
}

#[test]
fn test_declared_variables_print() {
    let run = run("var x = 5\nprint x\nvar s = \"hi\"\nprintln s");
    assert_eq!(run.result, Ok(ExitReason::EndOfSource));
    assert_eq!(run.output.contents(), "5hi\n");
    assert!(run.engine.diagnostics().is_empty());
}

#[test]
fn test_arithmetic_program() {
    let run = run("var a = 7\nvar b = 2\nprintln a / b\nprintln a % b\nprint \"x=\"\nprintln a + b");
    assert_eq!(run.output.contents(), "3.5\n1\nx=9\n");
}

#[test]
fn test_interpolation() {
    let run = run("var name = \"Ada\"\nvar n = 2\nprintln \"hi ${name}, ${n}!\"");
    assert_eq!(run.output.contents(), "hi Ada, 2!\n");
}

#[test]
fn test_unterminated_interpolation_does_not_stop_the_program() {
    let run = run("var name = \"Ada\"\nprintln \"hi ${name\nprintln \"after\"");
    assert_eq!(run.result, Ok(ExitReason::EndOfSource));
    assert_eq!(run.kinds()[0], ErrorKind::Syntax);
    assert_eq!(run.output.contents(), "after\n");
}

#[test]
fn test_scope_teardown() {
    let run = run("if true\nvar y = 1\nprintln y\nend\ny = 2\nprintln y");
    assert_eq!(run.engine.variable("y"), None);
    assert_eq!(run.engine.state().scope_level, 0);
    // visible inside, gone after the close
    assert!(run.output.contents().starts_with("1\n"));
    assert_eq!(run.kinds()[0], ErrorKind::Name);
    assert_eq!(run.kinds()[1], ErrorKind::Substitution);
}

#[test]
fn test_missing_argument_defaults_to_zero_with_warning() {
    let run = run("func show(p)\nprintln p\nend\nshow()");
    assert_eq!(run.output.contents(), "0\n");
    let diagnostics = run.engine.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert_eq!(diagnostics[0].line, 4);
}

#[test]
fn test_function_call_returns_to_caller() {
    let script = "func add(a, b)\nprintln a + b\nend\nadd(2, 3)\nadd(\"x\", 1)\nprintln \"done\"";
    let run = run(script);
    assert_eq!(run.output.contents(), "5\nx1\ndone\n");
    let state = run.engine.state();
    assert_eq!(state.function_depth, 0);
    assert!(state.return_stack.is_empty());
    assert_eq!(run.engine.variable("a"), None);
    assert_eq!(run.engine.function("add").map(|f| f.parameters.len()), Some(2));
}

#[test]
fn test_explicit_return_skips_rest_of_body() {
    let run = run("func f()\nprintln 1\nreturn 42\nprintln 2\nend\nf()\nprintln 3");
    assert_eq!(run.output.contents(), "1\n3\n");
}

#[test]
fn test_false_branch_skips_nested_blocks_end_style() {
    let script = "if false\n  if true\n    println 1\n  end\n  func inner()\n  end\n  println 2\nend\nprintln 3";
    let run = run(script);
    assert_eq!(run.output.contents(), "3\n");
    assert!(run.engine.function("inner").is_none());
    assert!(run.engine.diagnostics().is_empty());
}

#[test]
fn test_false_branch_skips_nested_blocks_brace_style() {
    let script = "if false {\n  if true {\n    println 1\n  }\n  func inner() {\n  }\n}\nprintln 2";
    let run = run_with(script, BlockStyle::BraceDelimited, &[], false);
    assert_eq!(run.output.contents(), "2\n");
}

#[test]
fn test_brace_style_function_body_returns_at_close() {
    let script = "func f(a) {\nif a > 1 {\nprintln a\n}\n}\nf(5)\nf(0)\nprintln \"done\"";
    let run = run_with(script, BlockStyle::BraceDelimited, &[], false);
    assert_eq!(run.result, Ok(ExitReason::EndOfSource));
    assert_eq!(run.output.contents(), "5\ndone\n");
    let state = run.engine.state();
    assert!(state.return_stack.is_empty());
    assert_eq!(state.function_depth, 0);
    assert_eq!(state.scope_level, 0);
    assert!(run.engine.diagnostics().is_empty());
}

#[test]
fn test_recursion_aliases_parameters() {
    let script = "\
var depth = 0
func descend(n)
depth = depth + 1
if depth < 3
descend(depth)
end
end
descend(0)
println depth";
    let run = run(script);
    assert_eq!(run.result, Ok(ExitReason::EndOfSource));
    assert_eq!(run.output.contents(), "3\n");
    // nested activations share the caller's level, so `n` collides
    assert_eq!(run.kinds(), vec![ErrorKind::Name, ErrorKind::Name]);
    let state = run.engine.state();
    assert_eq!(state.scope_level, 0);
    assert_eq!(state.function_depth, 0);
    assert_eq!(run.engine.variable("n"), None);
}

#[test]
fn test_bad_statement_leaves_other_state_alone() {
    let run = run("var x = 1\nvar y = x / 0\nx = x + 1\ny = 5\nprintln x\nprintln y");
    assert_eq!(run.kinds(), vec![ErrorKind::Runtime]);
    assert_eq!(run.output.contents(), "2\n5\n");
    assert_eq!(run.engine.variable("x"), Some(&Value::Int(2)));
}

#[test]
fn test_style_switch_applies_forward() {
    let script = "STYLE = \"brackets\"\nif true {\nprintln 1\n}\nSTYLE = end\nif false\nprintln 2\nend\nprintln 3";
    let run = run(script);
    assert_eq!(run.output.contents(), "1\n3\n");
    assert_eq!(run.engine.style(), BlockStyle::EndKeyword);
}

#[test]
fn test_unknown_style_is_a_warning() {
    let run = run("STYLE = \"tabs\"\nprintln 1");
    assert_eq!(run.engine.diagnostics()[0].severity, Severity::Warning);
    assert_eq!(run.engine.style(), BlockStyle::EndKeyword);
    assert_eq!(run.output.contents(), "1\n");
}

#[test]
fn test_input_stage_reads_lines_in_order() {
    let script = "var name = input\nvar n = input\nprintln \"hello ${name}\"\nprintln n * 2\nif input == \"y\"\nprintln \"yes\"\nend";
    let run = run_with(script, BlockStyle::EndKeyword, &["Ada", "3", "y"], false);
    assert_eq!(run.output.contents(), "hello Ada\n6\nyes\n");
}

#[test]
fn test_exec_is_recorded_by_dry_run() {
    let run = run("var n = 5\nexec \"echo \" + n");
    assert_eq!(run.commands.commands(), vec!["echo 5".to_string()]);
}

#[test]
fn test_goto_loops_back() {
    let run = run("var i = 0\ni = i + 1\nif i < 3\nGOTO 2\nend\nprintln i");
    assert_eq!(run.output.contents(), "3\n");
}

#[test]
fn test_end_stops_execution() {
    let run = run("println 1\nEND\nprintln 2");
    assert_eq!(run.result, Ok(ExitReason::EndStatement));
    assert_eq!(run.output.contents(), "1\n");
}

#[test]
fn test_end_announcement() {
    let run = run_with("END", BlockStyle::EndKeyword, &[], true);
    assert!(
        run.output
            .contents()
            .contains("Program execution terminated by END command.")
    );
}

#[test]
fn test_unmatched_function_header_ends_program() {
    let run = run("func f()\nprintln 1");
    assert_eq!(run.result, Ok(ExitReason::EndOfSource));
    assert_eq!(run.kinds(), vec![ErrorKind::Syntax]);
    assert_eq!(run.output.contents(), "");
}

#[test]
fn test_nested_function_header_is_rejected() {
    let run = run("if true\nfunc g()\nprintln 1\nend\nend\ng()");
    assert_eq!(run.kinds(), vec![ErrorKind::Name, ErrorKind::Name]);
    assert!(run.engine.function("g").is_none());
    assert_eq!(run.output.contents(), "");
}

#[test]
fn test_first_function_definition_wins() {
    let run = run("func f()\nprintln 1\nend\nfunc f()\nprintln 2\nend\nf()");
    assert_eq!(run.output.contents(), "1\n");
    assert_eq!(run.kinds(), vec![ErrorKind::Name]);
}

#[test]
fn test_non_bool_condition_is_false() {
    let run = run("if 5\nprintln 1\nend\nprintln 2");
    assert_eq!(run.output.contents(), "2\n");
    assert_eq!(run.engine.diagnostics()[0].severity, Severity::Warning);
    assert_eq!(run.kinds(), vec![ErrorKind::Type]);
}

#[test]
fn test_diagnostics_reach_the_error_channel() {
    let run = run("z = 1");
    assert_eq!(
        run.errors.contents(),
        "error on line 1 [E004]: Name Error: Variable 'z' used before declaration.\n"
    );
}
