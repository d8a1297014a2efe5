//! End-to-end programs run through the public `Interpreter::run`/
//! `get_stack` surface, not internal types.

use postscript_interpreter::engine::Interpreter;
use postscript_interpreter::error::{InterpreterError, LexerError, ParserError, PostScriptError};
use postscript_interpreter::value::Value;

fn run(source: &str) -> Interpreter {
    let mut interp = Interpreter::new(Box::new(Vec::new()));
    interp.run(source).expect("program should run without error");
    interp
}

fn stack_strings(interp: &Interpreter) -> Vec<String> {
    interp.get_stack().iter().map(|v| v.to_string()).collect()
}

#[test]
fn add_two_numbers() {
    let interp = run("3 5 add");
    assert_eq!(stack_strings(&interp), vec!["8"]);
}

#[test]
fn factorial_via_recursion() {
    let interp = run(
        "/factorial { dup 1 le { pop 1 } { dup 1 sub factorial mul } ifelse } def 5 factorial",
    );
    assert_eq!(stack_strings(&interp), vec!["120"]);
}

#[test]
fn for_loop_accumulates_sum() {
    let interp = run("0 1 1 5 { add } for");
    assert_eq!(stack_strings(&interp), vec!["15"]);
}

#[test]
fn loop_with_exit() {
    let interp = run("0 { 1 add dup 5 eq { exit } if } loop");
    assert_eq!(stack_strings(&interp), vec!["5"]);
}

#[test]
fn array_put_mutates_in_place() {
    let interp = run("[1 2 3] dup 1 99 put");
    let stack = interp.get_stack();
    assert_eq!(stack.len(), 2);
    match (&stack[0], &stack[1]) {
        (Value::Array(a), Value::Array(b)) => {
            assert_eq!(a.to_vec(), b.to_vec());
            assert_eq!(a.to_vec().iter().map(|v| v.to_string()).collect::<Vec<_>>(), vec!["1", "99", "3"]);
        }
        other => panic!("expected two arrays, got {other:?}"),
    }
}

#[test]
fn fibonacci_via_recursion() {
    let interp = run(
        "/fib { dup 2 lt { } { dup 1 sub fib exch 2 sub fib add } ifelse } def 10 fib",
    );
    assert_eq!(stack_strings(&interp), vec!["55"]);
}

#[test]
fn pop_on_empty_stack_is_an_underflow_error() {
    let mut interp = Interpreter::new(Box::new(Vec::new()));
    let err = interp.run("pop").unwrap_err();
    assert!(matches!(err, PostScriptError::Interpreter(InterpreterError::StackUnderflow { op: "pop" })));
}

#[test]
fn divide_by_zero_is_an_error() {
    let mut interp = Interpreter::new(Box::new(Vec::new()));
    let err = interp.run("10 0 div").unwrap_err();
    assert!(matches!(err, PostScriptError::Interpreter(InterpreterError::DivideByZero { op: "div" })));
}

#[test]
fn undefined_name_is_an_error() {
    let mut interp = Interpreter::new(Box::new(Vec::new()));
    let err = interp.run("undefined_name").unwrap_err();
    assert!(matches!(err, PostScriptError::Interpreter(InterpreterError::Undefined { .. })));
}

#[test]
fn unterminated_string_is_a_lexer_error() {
    let mut interp = Interpreter::new(Box::new(Vec::new()));
    let err = interp.run("(unterminated").unwrap_err();
    assert!(matches!(err, PostScriptError::Lexer(LexerError::UnterminatedString { .. })));
}

#[test]
fn unterminated_procedure_is_a_parser_error() {
    let mut interp = Interpreter::new(Box::new(Vec::new()));
    let err = interp.run("{ 1 2").unwrap_err();
    assert!(matches!(err, PostScriptError::Parser(ParserError::UnterminatedProcedure { .. })));
}

#[test]
fn stopped_catches_stop_but_not_exit() {
    // `1` executes before `stop` fires; `2` never runs; `stopped` pushes
    // `true` once it catches the `stop`.
    let interp = run("{ 1 stop 2 } stopped");
    assert_eq!(stack_strings(&interp), vec!["1", "true"]);
}

#[test]
fn stopped_does_not_catch_exit() {
    // `exit` with no enclosing loop unwinds silently all the way out; it
    // must not be mistaken for `stop` by `stopped`.
    let interp = run("10 { exit } stopped");
    // `stopped`'s frame was torn down by the unhandled exit, so `stopped`
    // itself never got to push a `false`/`true` result; only the 10 survives.
    assert_eq!(stack_strings(&interp), vec!["10"]);
}

#[test]
fn exec_runs_a_procedure_popped_off_the_stack() {
    // `exec` must actually run a procedure object handed to it directly,
    // not merely push it back — distinct from encountering a procedure
    // literal in the program, which pushes it as data.
    let interp = run("3 4 { add } exec");
    assert_eq!(stack_strings(&interp), vec!["7"]);
}

#[test]
fn exec_on_an_executable_name_resolves_and_runs_it() {
    let interp = run("3 4 /add cvx exec");
    assert_eq!(stack_strings(&interp), vec!["7"]);
}

#[test]
fn array_aload_astore_round_trip_preserves_identity() {
    // `a aload astore` leaves the stack unchanged modulo the array's
    // identity (astore returns the same array object).
    let interp = run("[1 2 3] dup aload astore eq");
    assert_eq!(stack_strings(&interp), vec!["true"]);
}

#[test]
fn cvx_cvlit_round_trips_array_identity() {
    let interp = run("[1 2 3] dup cvx cvlit eq");
    assert_eq!(stack_strings(&interp), vec!["true"]);
}

#[test]
fn getinterval_shares_storage_with_source_array() {
    let interp = run("[1 2 3 4 5] dup 1 3 getinterval 0 99 put");
    let stack = interp.get_stack();
    assert_eq!(stack.len(), 1);
    match &stack[0] {
        Value::Array(a) => {
            assert_eq!(
                a.to_vec().iter().map(|v| v.to_string()).collect::<Vec<_>>(),
                vec!["1", "99", "3", "4", "5"]
            );
        }
        other => panic!("expected array, got {other:?}"),
    }
}

#[test]
fn dup_eq_is_true_for_any_value_on_top() {
    let interp = run("42 dup eq");
    assert_eq!(stack_strings(&interp), vec!["true"]);
}

#[test]
fn roll_with_full_depth_and_zero_offset_is_a_no_op() {
    let interp = run("1 2 3 3 0 roll");
    assert_eq!(stack_strings(&interp), vec!["1", "2", "3"]);
}

#[test]
fn copy_zero_is_a_no_op() {
    let interp = run("1 2 3 0 copy");
    assert_eq!(stack_strings(&interp), vec!["1", "2", "3"]);
}

#[test]
fn array_zero_has_zero_length() {
    let interp = run("0 array length");
    assert_eq!(stack_strings(&interp), vec!["0"]);
}

#[test]
fn mark_and_cleartomark_discard_down_to_the_mark() {
    let interp = run("1 2 mark 3 4 5 cleartomark");
    assert_eq!(stack_strings(&interp), vec!["1", "2"]);
}

#[test]
fn cleartomark_without_a_mark_is_an_error() {
    let mut interp = Interpreter::new(Box::new(Vec::new()));
    let err = interp.run("1 2 cleartomark").unwrap_err();
    assert!(matches!(
        err,
        PostScriptError::Interpreter(InterpreterError::MarkNotFound { op: "cleartomark" })
    ));
}

#[test]
fn xor_is_bitwise_on_integers_and_logical_on_booleans() {
    let interp = run("6 3 xor true false xor");
    assert_eq!(stack_strings(&interp), vec!["5", "true"]);
}

#[test]
fn store_rebinds_in_the_dictionary_that_already_defines_the_key_not_the_top_one() {
    // `store` walks the dictionary stack looking for the nearest existing
    // binding; `def` would instead shadow it in the new top dictionary.
    let interp = run("/x 1 def 10 dict begin /x 2 store end x");
    assert_eq!(stack_strings(&interp), vec!["2"]);
}

#[test]
fn def_in_a_pushed_dictionary_does_not_leak_after_end() {
    let interp = run("10 dict begin /y 42 def end /y { /unset cvx } def y");
    // after `end`, looking up `y` falls through to the freshly `def`ed
    // executable name rather than the binding made inside the popped dict.
    assert_eq!(stack_strings(&interp), vec!["unset"]);
}

#[test]
fn forall_over_dictionary_pushes_key_then_value_for_each_entry() {
    // forall pushes `key value` per entry (value on top); discard the key
    // with `exch pop` before folding the value into the running total.
    let interp = run("10 dict dup /a 1 put dup /b 2 put 0 exch { exch pop add } forall");
    assert_eq!(stack_strings(&interp), vec!["3"]);
}

#[test]
fn forall_over_string_pushes_character_codes() {
    let interp = run("0 (AB) { add } forall");
    assert_eq!(stack_strings(&interp), vec!["131"]);
}

#[test]
fn type_reports_the_expected_tag_for_each_variant() {
    let interp = run("1 type 1.0 type true type (s) type /n type [1] type { 1 } type");
    assert_eq!(
        stack_strings(&interp),
        vec!["integertype", "realtype", "booleantype", "stringtype", "nametype", "arraytype", "arraytype"]
    );
}

#[test]
fn cvs_formats_a_number_into_a_string() {
    let interp = run("3.5 10 string cvs");
    assert_eq!(stack_strings(&interp), vec!["3.5"]);
}

#[test]
fn astore_underflow_is_a_stack_underflow_error() {
    let mut interp = Interpreter::new(Box::new(Vec::new()));
    let err = interp.run("1 2 3 array astore").unwrap_err();
    assert!(matches!(
        err,
        PostScriptError::Interpreter(InterpreterError::StackUnderflow { op: "astore" })
    ));
}

#[test]
fn end_cannot_pop_below_initial_dictionary_stack_size() {
    let mut interp = Interpreter::new(Box::new(Vec::new()));
    let err = interp.run("end").unwrap_err();
    assert!(matches!(
        err,
        PostScriptError::Interpreter(InterpreterError::DictStackUnderflow { op: "end" })
    ));
}

/// A `Write` sink that can be read back after the interpreter's `Box<dyn
/// Write>` has taken ownership of it, by sharing a reference-counted buffer.
#[derive(Clone, Default)]
struct SharedBuf(std::rc::Rc<std::cell::RefCell<Vec<u8>>>);

impl std::io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn print_writes_raw_characters_to_the_sink() {
    let sink = SharedBuf::default();
    let mut interp = Interpreter::new(Box::new(sink.clone()));
    interp.run("(hello) print").unwrap();
    assert_eq!(String::from_utf8(sink.0.borrow().clone()).unwrap(), "hello");
}

#[test]
fn equals_equals_formats_arrays_and_procedures_verbosely() {
    let sink = SharedBuf::default();
    let mut interp = Interpreter::new(Box::new(sink.clone()));
    interp.run("[1 2 3] ==").unwrap();
    interp.run("{ 1 add } ==").unwrap();
    assert_eq!(
        String::from_utf8(sink.0.borrow().clone()).unwrap(),
        "[ 1 2 3 ]\n{ 1 add }\n"
    );
}

#[test]
fn equals_equals_wraps_a_string_in_parens_so_it_round_trips() {
    // `==` must reproduce a string as a re-lexable string literal (spec.md
    // §8 invariant 2), not bare characters that would re-lex as a name.
    let sink = SharedBuf::default();
    let mut interp = Interpreter::new(Box::new(sink.clone()));
    interp.run("(hello) ==").unwrap();
    interp.run("[ (hi) ] ==").unwrap();
    assert_eq!(String::from_utf8(sink.0.borrow().clone()).unwrap(), "(hello)\n[ (hi) ]\n");
}

#[test]
fn equals_prints_a_string_raw_without_parens() {
    let sink = SharedBuf::default();
    let mut interp = Interpreter::new(Box::new(sink.clone()));
    interp.run("(hello) =").unwrap();
    assert_eq!(String::from_utf8(sink.0.borrow().clone()).unwrap(), "hello\n");
}
