// ABOUTME: Tree-walking evaluator: walks the syntax tree under an environment

use crate::ast::{Block, Expr, Ident, Root, Stmt};
use crate::builtins;
use crate::env::Environment;
use crate::errors::RuntimeError;
use crate::trace;
use crate::value::{FunctionValue, Value, ValueKind};
use std::rc::Rc;

/// What one evaluation step produced: a plain value (possibly nothing), or
/// a control-flow sentinel travelling to its handler. `return` unwinds to
/// the nearest function call, `stop` to the nearest loop; runtime errors
/// travel through the `Err` channel all the way out.
pub enum Outcome {
    Value(Option<Value>),
    Return(Option<Value>, usize),
    Stop(usize),
}

type Evaluated = Result<Outcome, RuntimeError>;

/// Evaluated argument or element lists either yield all their values or
/// hand back the sentinel that interrupted them.
enum ExprList {
    Values(Vec<Value>),
    Sentinel(Outcome),
}

fn ok_value(value: Value) -> Evaluated {
    Ok(Outcome::Value(Some(value)))
}

/// Evaluates a whole program. A propagating `return` becomes the program's
/// value; otherwise the last statement's value is.
pub fn eval_root(root: &Root, env: &Rc<Environment>) -> Result<Option<Value>, RuntimeError> {
    let mut result = None;
    for stmt in &root.statements {
        match eval_stmt(stmt, env)? {
            Outcome::Value(value) => result = value,
            Outcome::Return(value, _) => return Ok(value),
            Outcome::Stop(_) => result = None,
        }
    }
    Ok(result)
}

fn eval_stmt(stmt: &Stmt, env: &Rc<Environment>) -> Evaluated {
    match stmt {
        Stmt::Expression { expr, .. } => eval_expr(expr, env),
        Stmt::Make { token, name, value } => {
            let evaluated = match eval_expr(value, env)? {
                Outcome::Value(v) => v,
                sentinel => return Ok(sentinel),
            };
            if let Expr::Function {
                name: Some(fn_name),
                ..
            } = value
            {
                // Named functions bind themselves; they cannot also be the
                // right side of a binding.
                return Err(RuntimeError::report(230, token.line, &[&fn_name.name]));
            }
            let Some(evaluated) = evaluated else {
                return Err(RuntimeError::report(211, token.line, &[]));
            };
            trace::record(
                token.line,
                name.name.as_str(),
                evaluated.to_string(),
                format!("define variable ({}) and bind ({})", name.name, evaluated),
            );
            env.define(name.name.clone(), evaluated);
            Ok(Outcome::Value(None))
        }
        Stmt::Return { token, value } => {
            let evaluated = match value {
                Some(expr) => match eval_expr(expr, env)? {
                    Outcome::Value(v) => v,
                    sentinel => return Ok(sentinel),
                },
                None => None,
            };
            Ok(Outcome::Return(evaluated, token.line))
        }
        Stmt::Stop { token } => {
            trace::record(token.line, "stop", "stop", "leave the loop");
            Ok(Outcome::Stop(token.line))
        }
        Stmt::Loop {
            token,
            condition,
            body,
        } => eval_loop(token.line, condition, body, env),
    }
}

fn eval_block(block: &Block, env: &Rc<Environment>) -> Evaluated {
    let mut result = Outcome::Value(None);
    for stmt in &block.statements {
        match eval_stmt(stmt, env)? {
            Outcome::Value(value) => result = Outcome::Value(value),
            sentinel => return Ok(sentinel),
        }
    }
    Ok(result)
}

fn eval_expr(expr: &Expr, env: &Rc<Environment>) -> Evaluated {
    match expr {
        Expr::Int { token, value } => ok_value(Value::int(*value, token.line)),
        Expr::Float { token, value } => ok_value(Value::float(*value, token.line)),
        Expr::Bool { token, value } => ok_value(Value::boolean(*value, token.line)),
        Expr::Str { token, value } => ok_value(Value::string(value.clone(), token.line)),
        Expr::Ident(ident) => eval_ident(ident, env),
        Expr::Array { token, elements } => {
            let values = match eval_expressions(elements, env)? {
                ExprList::Values(values) => values,
                ExprList::Sentinel(sentinel) => return Ok(sentinel),
            };
            ok_value(Value::array(values, token.line))
        }
        Expr::Index { token, left, index } => {
            let target = match eval_expr(left, env)? {
                Outcome::Value(v) => v,
                sentinel => return Ok(sentinel),
            };
            let index = match eval_expr(index, env)? {
                Outcome::Value(v) => v,
                sentinel => return Ok(sentinel),
            };
            eval_index(target, index, token.line)
        }
        Expr::Prefix {
            token,
            operator,
            operand,
        } => {
            let value = match eval_expr(operand, env)? {
                Outcome::Value(v) => v,
                sentinel => return Ok(sentinel),
            };
            eval_prefix(operator, value, token.line)
        }
        Expr::Infix {
            token,
            operator,
            left,
            right,
        } => {
            let lhs = match eval_expr(left, env)? {
                Outcome::Value(v) => v,
                sentinel => return Ok(sentinel),
            };
            let Some(lhs) = lhs else {
                return Err(RuntimeError::report(206, token.line, &[&operator]));
            };
            let rhs = match eval_expr(right, env)? {
                Outcome::Value(v) => v,
                sentinel => return Ok(sentinel),
            };
            let Some(rhs) = rhs else {
                let left_type = lhs.type_name();
                return Err(RuntimeError::report(
                    203,
                    token.line,
                    &[&left_type, &"nothing"],
                ));
            };
            eval_infix(operator, lhs, rhs, token.line)
        }
        Expr::If {
            token,
            condition,
            consequence,
            alternative,
        } => {
            let value = match eval_expr(condition, env)? {
                Outcome::Value(v) => v,
                sentinel => return Ok(sentinel),
            };
            let Some(value) = value else {
                return Err(RuntimeError::report(220, token.line, &[&"if"]));
            };
            if value.is_truthy() {
                trace::record(
                    token.line,
                    condition.to_string(),
                    "true",
                    "condition is true; run the if branch",
                );
                eval_block(consequence, env)
            } else if let Some(alternative) = alternative {
                trace::record(
                    token.line,
                    condition.to_string(),
                    "false",
                    "condition is false; run the else branch",
                );
                eval_block(alternative, env)
            } else {
                trace::record(
                    token.line,
                    condition.to_string(),
                    "false",
                    "condition is false; skip the if branch",
                );
                Ok(Outcome::Value(None))
            }
        }
        Expr::Function {
            token,
            name,
            params,
            body,
        } => {
            let function = Value {
                kind: ValueKind::Function(Rc::new(FunctionValue {
                    name: name.as_ref().map(|n| n.name.clone()),
                    params: params.clone(),
                    body: body.clone(),
                    env: env.clone(),
                })),
                line: token.line,
            };
            match name {
                Some(name) => {
                    trace::record(
                        token.line,
                        name.name.as_str(),
                        function.to_string(),
                        format!("define function ({})", name.name),
                    );
                    env.define(name.name.clone(), function);
                    Ok(Outcome::Value(None))
                }
                None => ok_value(function),
            }
        }
        Expr::Call {
            token,
            function,
            args,
        } => {
            let callee = match eval_expr(function, env)? {
                Outcome::Value(v) => v,
                sentinel => return Ok(sentinel),
            };
            trace::record(
                token.line,
                function.to_string(),
                "run",
                format!("call function ({})", function),
            );
            let Some(callee) = callee else {
                return Err(RuntimeError::report(231, token.line, &[&"nothing"]));
            };
            let values = match eval_expressions(args, env)? {
                ExprList::Values(values) => values,
                ExprList::Sentinel(sentinel) => return Ok(sentinel),
            };
            apply_function(callee, values, token.line)
        }
        Expr::Assign { token, name, value } => {
            let evaluated = match eval_expr(value, env)? {
                Outcome::Value(v) => v,
                sentinel => return Ok(sentinel),
            };
            if let Expr::Function {
                name: Some(fn_name),
                ..
            } = value.as_ref()
            {
                return Err(RuntimeError::report(230, token.line, &[&fn_name.name]));
            }
            let Some(evaluated) = evaluated else {
                return Err(RuntimeError::report(211, token.line, &[]));
            };
            let rendered = evaluated.to_string();
            if env.assign(&name.name, evaluated) {
                trace::record(
                    token.line,
                    name.name.as_str(),
                    rendered.as_str(),
                    format!("assign ({}) to variable ({})", rendered, name.name),
                );
                Ok(Outcome::Value(None))
            } else {
                Err(RuntimeError::report(210, token.line, &[&name.name]))
            }
        }
    }
}

/// Left-to-right evaluation of call arguments or array elements. The first
/// error short-circuits; a position that yields nothing is reported as 211.
fn eval_expressions(exprs: &[Expr], env: &Rc<Environment>) -> Result<ExprList, RuntimeError> {
    let mut values = Vec::with_capacity(exprs.len());
    for expr in exprs {
        match eval_expr(expr, env)? {
            Outcome::Value(Some(value)) => values.push(value),
            Outcome::Value(None) => {
                return Err(RuntimeError::report(211, expr.line(), &[]));
            }
            sentinel => return Ok(ExprList::Sentinel(sentinel)),
        }
    }
    Ok(ExprList::Values(values))
}

fn eval_ident(ident: &Ident, env: &Rc<Environment>) -> Evaluated {
    let line = ident.token.line;
    if let Some(value) = env.lookup(&ident.name) {
        trace::record(
            line,
            ident.name.as_str(),
            value.to_string(),
            format!("read variable ({})", ident.name),
        );
        return ok_value(value);
    }
    if let Some(value) = builtins::lookup(&ident.name, line) {
        return ok_value(value);
    }
    Err(RuntimeError::report(210, line, &[&ident.name]))
}

fn eval_prefix(operator: &str, value: Option<Value>, line: usize) -> Evaluated {
    match operator {
        "!" => eval_bang(value, line),
        "-" => eval_minus(value, line),
        _ => Err(RuntimeError::report(201, line, &[&operator])),
    }
}

fn eval_bang(value: Option<Value>, line: usize) -> Evaluated {
    match value.as_ref().map(|v| &v.kind) {
        Some(ValueKind::Bool(true)) => {
            trace::record(line, "true", "false", "negate");
            ok_value(Value::boolean(false, line))
        }
        Some(ValueKind::Bool(false)) => {
            trace::record(line, "false", "true", "negate");
            ok_value(Value::boolean(true, line))
        }
        _ => {
            trace::record(line, "Not Boolean", "false", "negating a non-boolean");
            ok_value(Value::boolean(false, line))
        }
    }
}

fn eval_minus(value: Option<Value>, line: usize) -> Evaluated {
    match value.map(|v| v.kind) {
        Some(ValueKind::Int(n)) => ok_value(Value::int(n.wrapping_neg(), line)),
        Some(ValueKind::Float(f)) => ok_value(Value::float(-f, line)),
        _ => Err(RuntimeError::report(202, line, &[])),
    }
}

fn eval_infix(operator: &str, left: Value, right: Value, line: usize) -> Evaluated {
    match &left.kind {
        ValueKind::Int(l) => match &right.kind {
            ValueKind::Int(r) => int_infix(operator, *l, *r, line),
            ValueKind::Float(r) => float_infix(operator, *l as f64, *r, line),
            ValueKind::Str(r) => number_string_concat(operator, &l.to_string(), r, line),
            _ => {
                let left_type = left.type_name();
                let right_type = right.type_name();
                Err(RuntimeError::report(
                    203,
                    line,
                    &[&left_type, &right_type],
                ))
            }
        },
        ValueKind::Float(l) => match &right.kind {
            ValueKind::Float(r) => float_infix(operator, *l, *r, line),
            ValueKind::Int(r) => float_infix(operator, *l, *r as f64, line),
            ValueKind::Str(r) => number_string_concat(operator, &l.to_string(), r, line),
            _ => {
                let left_type = left.type_name();
                let right_type = right.type_name();
                Err(RuntimeError::report(
                    203,
                    line,
                    &[&left_type, &right_type],
                ))
            }
        },
        ValueKind::Bool(l) => match &right.kind {
            ValueKind::Bool(r) => bool_infix(operator, *l, *r, line),
            _ => {
                let left_type = left.type_name();
                let right_type = right.type_name();
                Err(RuntimeError::report(
                    203,
                    line,
                    &[&left_type, &right_type],
                ))
            }
        },
        ValueKind::Str(l) => match &right.kind {
            ValueKind::Str(r) => string_infix(operator, l, r, line),
            ValueKind::Int(r) => string_infix(operator, l, &r.to_string(), line),
            ValueKind::Float(r) => string_infix(operator, l, &r.to_string(), line),
            _ => {
                let left_type = left.type_name();
                let right_type = right.type_name();
                Err(RuntimeError::report(
                    203,
                    line,
                    &[&left_type, &right_type],
                ))
            }
        },
        _ => Err(RuntimeError::report(206, line, &[&operator])),
    }
}

fn int_infix(operator: &str, l: i64, r: i64, line: usize) -> Evaluated {
    let result = match operator {
        "+" => Value::int(l.wrapping_add(r), line),
        "-" => Value::int(l.wrapping_sub(r), line),
        "*" => Value::int(l.wrapping_mul(r), line),
        "/" => {
            if r == 0 {
                return Err(RuntimeError::report(209, line, &[]));
            }
            // Exact division stays an integer; anything else is true
            // division.
            if l.wrapping_rem(r) != 0 {
                Value::float(l as f64 / r as f64, line)
            } else {
                Value::int(l.wrapping_div(r), line)
            }
        }
        "%" => {
            if r == 0 {
                return Err(RuntimeError::report(209, line, &[]));
            }
            Value::int(l.wrapping_rem(r), line)
        }
        "<" => Value::boolean(l < r, line),
        ">" => Value::boolean(l > r, line),
        "<=" => Value::boolean(l <= r, line),
        ">=" => Value::boolean(l >= r, line),
        "==" => Value::boolean(l == r, line),
        "!=" => Value::boolean(l != r, line),
        _ => return Err(RuntimeError::report(204, line, &[&operator])),
    };
    let note = if matches!(result.kind, ValueKind::Bool(_)) {
        "compare"
    } else {
        "calculate"
    };
    trace::record(
        line,
        format!("{} {} {}", l, operator, r),
        result.to_string(),
        note,
    );
    ok_value(result)
}

fn float_infix(operator: &str, l: f64, r: f64, line: usize) -> Evaluated {
    let result = match operator {
        "+" => Value::float(l + r, line),
        "-" => Value::float(l - r, line),
        "*" => Value::float(l * r, line),
        "/" => Value::float(l / r, line),
        "%" => return Err(RuntimeError::report(208, line, &[&operator])),
        "<" => Value::boolean(l < r, line),
        ">" => Value::boolean(l > r, line),
        "<=" => Value::boolean(l <= r, line),
        ">=" => Value::boolean(l >= r, line),
        "==" => Value::boolean(l == r, line),
        "!=" => Value::boolean(l != r, line),
        _ => return Err(RuntimeError::report(204, line, &[&operator])),
    };
    let note = if matches!(result.kind, ValueKind::Bool(_)) {
        "compare"
    } else {
        "calculate"
    };
    trace::record(
        line,
        format!("{} {} {}", l, operator, r),
        result.to_string(),
        note,
    );
    ok_value(result)
}

fn bool_infix(operator: &str, l: bool, r: bool, line: usize) -> Evaluated {
    let result = match operator {
        "==" => l == r,
        "!=" => l != r,
        "and" => l && r,
        "or" => l || r,
        _ => return Err(RuntimeError::report(205, line, &[&operator])),
    };
    trace::record(
        line,
        format!("{} {} {}", l, operator, r),
        result.to_string(),
        "compare",
    );
    ok_value(Value::boolean(result, line))
}

fn string_infix(operator: &str, l: &str, r: &str, line: usize) -> Evaluated {
    match operator {
        "+" => {
            let joined = format!("{}{}", l, r);
            trace::record(line, format!("{} + {}", l, r), joined.as_str(), "join strings");
            ok_value(Value::string(joined, line))
        }
        "==" => {
            trace::record(
                line,
                format!("{} == {}", l, r),
                (l == r).to_string(),
                "compare strings",
            );
            ok_value(Value::boolean(l == r, line))
        }
        "!=" => {
            trace::record(
                line,
                format!("{} != {}", l, r),
                (l != r).to_string(),
                "compare strings",
            );
            ok_value(Value::boolean(l != r, line))
        }
        _ => Err(RuntimeError::report(207, line, &[])),
    }
}

/// A number meeting a string supports only `+`: the number is rendered in
/// decimal and the two are joined.
fn number_string_concat(operator: &str, l: &str, r: &str, line: usize) -> Evaluated {
    if operator != "+" {
        return Err(RuntimeError::report(207, line, &[]));
    }
    string_infix(operator, l, r, line)
}

fn eval_index(target: Option<Value>, index: Option<Value>, line: usize) -> Evaluated {
    let Some(target) = target else {
        return Err(RuntimeError::report(400, line, &[&"nothing"]));
    };
    let Some(index) = index else {
        return Err(RuntimeError::report(401, line, &[]));
    };
    match (&target.kind, &index.kind) {
        (ValueKind::Array(elements), ValueKind::Int(ix)) => {
            let elements = elements.borrow();
            let last = elements.len() as i64 - 1;
            if *ix < 0 {
                return Err(RuntimeError::report(402, line, &[]));
            }
            if *ix > last {
                return Err(RuntimeError::report(403, line, &[ix, &last]));
            }
            let value = elements[*ix as usize].clone();
            trace::record(
                line,
                format!("{}[{}]", target, ix),
                value.to_string(),
                "take a value out of the array",
            );
            ok_value(value)
        }
        (ValueKind::Str(text), ValueKind::Int(ix)) => {
            // String indexing is 1-based and counts Unicode scalars.
            let count = text.chars().count() as i64;
            if *ix <= 0 {
                return Err(RuntimeError::report(502, line, &[]));
            }
            if *ix > count {
                return Err(RuntimeError::report(503, line, &[ix, &count]));
            }
            let ch = text.chars().nth(*ix as usize - 1).unwrap_or_default();
            let result = ch.to_string();
            trace::record(
                line,
                format!("{}[{}]", target, ix),
                result.as_str(),
                "take a character out of the string",
            );
            ok_value(Value::string(result, line))
        }
        (_, ValueKind::Int(_)) => {
            let target_type = target.type_name();
            Err(RuntimeError::report(400, line, &[&target_type]))
        }
        _ => Err(RuntimeError::report(401, line, &[])),
    }
}

fn eval_loop(line: usize, condition: &Expr, body: &Block, env: &Rc<Environment>) -> Evaluated {
    trace::record(line, "loop", "start", "enter the loop");
    let result = run_loop(line, condition, body, env);
    trace::record(line, "loop", "end", "leave the loop");
    result
}

fn run_loop(line: usize, condition: &Expr, body: &Block, env: &Rc<Environment>) -> Evaluated {
    let first = match eval_expr(condition, env)? {
        Outcome::Value(v) => v,
        sentinel => return Ok(sentinel),
    };
    let Some(first) = first else {
        return Err(RuntimeError::report(220, line, &[&"loop"]));
    };
    match first.kind {
        ValueKind::Str(_) => {
            let type_name = first.type_name();
            Err(RuntimeError::report(500, line, &[&type_name]))
        }
        ValueKind::Int(count) => {
            let mut result = None;
            let mut i: i64 = 0;
            while i < count {
                trace::record(
                    line,
                    format!("{} <= {}", i + 1, count),
                    "true",
                    format!("run the loop body (round {})", i + 1),
                );
                match eval_block(body, env)? {
                    Outcome::Value(value) => result = value,
                    Outcome::Stop(_) => {
                        result = None;
                        break;
                    }
                    propagating @ Outcome::Return(..) => return Ok(propagating),
                }
                i += 1;
            }
            Ok(Outcome::Value(result))
        }
        ValueKind::Float(limit) => {
            let mut result = None;
            let mut i = 0.0;
            while i < limit {
                trace::record(
                    line,
                    format!("{} <= {}", i + 1.0, limit),
                    "true",
                    format!("run the loop body (round {})", i + 1.0),
                );
                match eval_block(body, env)? {
                    Outcome::Value(value) => result = value,
                    Outcome::Stop(_) => {
                        result = None;
                        break;
                    }
                    propagating @ Outcome::Return(..) => return Ok(propagating),
                }
                i += 1.0;
            }
            Ok(Outcome::Value(result))
        }
        _ => {
            // While-form: re-evaluate the condition each round; a
            // non-boolean condition counts as false.
            let mut current = first;
            let mut result = None;
            let mut round = 0u64;
            while current.is_truthy() {
                round += 1;
                trace::record(
                    line,
                    condition.to_string(),
                    "true",
                    format!("run the loop body (round {})", round),
                );
                match eval_block(body, env)? {
                    Outcome::Value(value) => result = value,
                    Outcome::Stop(_) => {
                        result = None;
                        break;
                    }
                    propagating @ Outcome::Return(..) => return Ok(propagating),
                }
                let next = match eval_expr(condition, env)? {
                    Outcome::Value(v) => v,
                    sentinel => return Ok(sentinel),
                };
                let Some(next) = next else {
                    return Err(RuntimeError::report(220, line, &[&"loop"]));
                };
                current = next;
            }
            Ok(Outcome::Value(result))
        }
    }
}

fn apply_function(callee: Value, args: Vec<Value>, line: usize) -> Evaluated {
    match &callee.kind {
        ValueKind::Function(function) => {
            if args.len() != function.params.len() {
                let given = args.len();
                let wanted = function.params.len();
                return Err(RuntimeError::report(232, line, &[&given, &wanted]));
            }
            let call_env = Environment::enclosed(function.env.clone());
            for (param, arg) in function.params.iter().zip(args.into_iter()) {
                trace::record(
                    param.token.line,
                    param.name.as_str(),
                    arg.to_string(),
                    "bind argument to parameter",
                );
                call_env.define(param.name.clone(), arg);
            }
            match eval_block(&function.body, &call_env)? {
                Outcome::Return(value, return_line) => {
                    let rendered = value
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_default();
                    trace::record(
                        return_line,
                        rendered,
                        "to the caller",
                        "return the function's result",
                    );
                    Ok(Outcome::Value(value))
                }
                // A stray `stop` ends the call with no value; it never
                // crosses the call boundary.
                Outcome::Stop(_) => Ok(Outcome::Value(None)),
                Outcome::Value(value) => {
                    trace::record(line, "", "", "function finished");
                    Ok(Outcome::Value(value))
                }
            }
        }
        ValueKind::Builtin(_, function) => Ok(Outcome::Value(function(line, args)?)),
        _ => {
            let type_name = callee.type_name();
            Err(RuntimeError::report(231, line, &[&type_name]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(input: &str) -> Result<Option<Value>, RuntimeError> {
        crate::trace::reset();
        crate::errors::reset_runtime_errors();
        let mut parser = Parser::new(Lexer::new(input));
        let root = parser.parse();
        assert!(
            parser.errors().is_empty(),
            "syntax errors for {:?}: {:?}",
            input,
            parser.errors()
        );
        eval_root(&root, &Environment::new())
    }

    fn run_display(input: &str) -> String {
        run(input)
            .unwrap()
            .unwrap_or_else(|| panic!("no value for {:?}", input))
            .to_string()
    }

    fn run_code(input: &str) -> u16 {
        run(input).unwrap_err().code
    }

    #[test]
    fn test_literals() {
        assert_eq!(run_display("5"), "5");
        assert_eq!(run_display("2.5"), "2.5");
        assert_eq!(run_display("true"), "true");
        assert_eq!(run_display("\"hi\""), "\"hi\"");
        assert_eq!(run_display("[1, 2]"), "[1, 2]");
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(run_display("1 + 2 * 3"), "7");
        assert_eq!(run_display("10 - 2 - 3"), "5");
        assert_eq!(run_display("7 % 3"), "1");
        assert_eq!(run_display("(1 + 2) * 3"), "9");
    }

    #[test]
    fn test_division_goes_float_unless_exact() {
        assert_eq!(run_display("6 / 2"), "3");
        assert_eq!(run_display("5 / 2"), "2.5");
        assert_eq!(run_display("9 / 3"), "3");
    }

    #[test]
    fn test_mixed_arithmetic_promotes_to_float() {
        assert_eq!(run_display("1 + 2.5"), "3.5");
        assert_eq!(run_display("2.5 + 1"), "3.5");
        assert_eq!(run_display("1.0 + 2"), "3");
        assert_eq!(run_display("2 * 1.5"), "3");
    }

    #[test]
    fn test_string_concat_and_coercion() {
        assert_eq!(run_display("\"ab\" + \"cd\""), "\"abcd\"");
        assert_eq!(run_display("\"n=\" + 5"), "\"n=5\"");
        assert_eq!(run_display("5 + \"x\""), "\"5x\"");
        assert_eq!(run_display("\"v\" + 2.5"), "\"v2.5\"");
        assert_eq!(run_display("\"a\" == \"a\""), "true");
        assert_eq!(run_display("\"a\" != \"b\""), "true");
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(run_display("1 < 2"), "true");
        assert_eq!(run_display("2 >= 3"), "false");
        assert_eq!(run_display("1.5 <= 1.5"), "true");
        assert_eq!(run_display("true and false"), "false");
        assert_eq!(run_display("true or false"), "true");
        assert_eq!(run_display("true == false"), "false");
    }

    #[test]
    fn test_prefix_operators() {
        assert_eq!(run_display("-5"), "-5");
        assert_eq!(run_display("-2.5"), "-2.5");
        assert_eq!(run_display("!true"), "false");
        assert_eq!(run_display("!false"), "true");
        // A non-boolean operand quietly becomes false.
        assert_eq!(run_display("!5"), "false");
        assert_eq!(run_display("!\"s\""), "false");
    }

    #[test]
    fn test_operator_type_errors() {
        assert_eq!(run_code("5 + true"), 203);
        assert_eq!(run_code("true + true"), 205);
        assert_eq!(run_code("true and 1"), 203);
        assert_eq!(run_code("\"a\" - \"b\""), 207);
        assert_eq!(run_code("1 - \"a\""), 207);
        assert_eq!(run_code("\"a\" + true"), 203);
        assert_eq!(run_code("2.5 % 2"), 208);
        assert_eq!(run_code("-true"), 202);
        assert_eq!(run_code("[1] + 1"), 206);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(run_code("5 / 0"), 209);
        assert_eq!(run_code("5 % 0"), 209);
    }

    #[test]
    fn test_make_and_lookup() {
        assert_eq!(run_display("make x = 10\nmake y = 32\nx + y"), "42");
        assert_eq!(run_display("make x = 1\nmake x = 2\nx"), "2");
    }

    #[test]
    fn test_assignment_requires_prior_binding() {
        assert_eq!(run_code("a = 1"), 210);
        assert_eq!(run_display("make a = 1\na = a + 1\na"), "2");
    }

    #[test]
    fn test_assignment_evaluates_rhs_first() {
        // The right side runs before the target is checked, so its error
        // wins over the undefined target.
        assert_eq!(run_code("q = [1][5]"), 403);
    }

    #[test]
    fn test_undefined_name() {
        assert_eq!(run_code("missing"), 210);
    }

    #[test]
    fn test_named_function_cannot_be_bound() {
        assert_eq!(run_code("make f = func g() { return 1 }"), 230);
    }

    #[test]
    fn test_binding_no_value_is_an_error() {
        assert_eq!(run_code("make x = ADD([1], 2)"), 211);
    }

    #[test]
    fn test_if_expressions() {
        assert_eq!(run_display("if true { 10 }"), "10");
        assert_eq!(run_display("if false { 1 } else { 2 }"), "2");
        assert!(run("if false { 1 }").unwrap().is_none());
        // Non-boolean conditions count as false.
        assert_eq!(run_display("if 1 { 1 } else { 2 }"), "2");
        assert_eq!(
            run_display("make x = 2\nif x == 1 { 1 } else if x == 2 { 2 } else { 3 }"),
            "2"
        );
    }

    #[test]
    fn test_if_condition_with_no_value() {
        assert_eq!(run_code("if ADD([1], 2) { 1 }"), 220);
    }

    #[test]
    fn test_blocks_share_the_enclosing_scope() {
        // Only function calls create scopes, so a make inside a block is
        // visible after it.
        assert_eq!(run_display("if true { make a = 1 }\na"), "1");
    }

    #[test]
    fn test_counted_loops() {
        assert_eq!(run_display("make s = 0\nloop 3 { s = s + 1 }\ns"), "3");
        assert_eq!(run_display("make c = 0\nloop 0 { c = c + 1 }\nc"), "0");
    }

    #[test]
    fn test_float_loop_rounds_up() {
        assert_eq!(run_display("make s = 0\nloop 2.5 { s = s + 1 }\ns"), "3");
    }

    #[test]
    fn test_conditional_loop() {
        assert_eq!(run_display("make i = 0\nloop i < 4 { i = i + 1 }\ni"), "4");
    }

    #[test]
    fn test_loop_stop() {
        assert!(run("loop { stop }").unwrap().is_none());
        assert_eq!(
            run_display("make i = 0\nloop 10 { i = i + 1\nif i == 3 { stop } }\ni"),
            "3"
        );
    }

    #[test]
    fn test_loop_with_string_condition() {
        assert_eq!(run_code("loop \"three\" { stop }"), 500);
    }

    #[test]
    fn test_string_loop_body_builds_value() {
        assert_eq!(
            run_display("make s = \"\"\nloop 3 { s = s + \"a\" }\ns"),
            "\"aaa\""
        );
    }

    #[test]
    fn test_return_at_top_level_is_the_program_value() {
        assert_eq!(run_display("return 7\n9"), "7");
    }

    #[test]
    fn test_functions_and_calls() {
        assert_eq!(run_display("make id = func(x) { return x }\nid(5)"), "5");
        assert_eq!(run_display("func twice(x) { return x * 2 }\ntwice(4)"), "8");
        assert_eq!(run_display("make f = func() { 5 }\nf()"), "5");
    }

    #[test]
    fn test_recursion() {
        let program = "func fact(n) { if n <= 1 { return 1 } else { return n * fact(n - 1) } }\nfact(6)";
        assert_eq!(run_display(program), "720");
    }

    #[test]
    fn test_closures() {
        let program =
            "make mk = func(x) { return func(y) { return x + y } }\nmk(3)(4) + mk(10)(1)";
        assert_eq!(run_display(program), "18");
    }

    #[test]
    fn test_call_errors() {
        assert_eq!(run_code("5(1)"), 231);
        assert_eq!(run_code("make f = func(a) { return a }\nf(1, 2)"), 232);
    }

    #[test]
    fn test_stop_ends_a_function_without_value() {
        assert!(run("make f = func() { stop\nreturn 9 }\nf()").unwrap().is_none());
    }

    #[test]
    fn test_stop_does_not_cross_call_boundaries() {
        let program = "make f = func() { stop }\nmake c = 0\nloop 3 { f()\nc = c + 1 }\nc";
        assert_eq!(run_display(program), "3");
    }

    #[test]
    fn test_array_indexing() {
        assert_eq!(run_display("[1, 2, 3][0]"), "1");
        assert_eq!(run_display("[1, 2, 3][2]"), "3");
        assert_eq!(run_code("[1, 2, 3][-1]"), 402);
        assert_eq!(run_code("[1, 2, 3][3]"), 403);
        assert_eq!(run_code("[1][\"a\"]"), 401);
        assert_eq!(run_code("5[0]"), 400);
    }

    #[test]
    fn test_string_indexing_is_one_based() {
        assert_eq!(run_display("\"abc\"[1]"), "\"a\"");
        assert_eq!(run_display("\"abc\"[3]"), "\"c\"");
        assert_eq!(run_code("\"abc\"[0]"), 502);
        assert_eq!(run_code("\"abc\"[4]"), 503);
    }

    #[test]
    fn test_string_indexing_counts_scalars() {
        assert_eq!(run_display("\"日本語\"[2]"), "\"本\"");
    }

    #[test]
    fn test_errors_short_circuit_element_lists() {
        assert_eq!(run_code("[1, undef, 3]"), 210);
        assert_eq!(run_code("SIZE(undef)"), 210);
    }

    #[test]
    fn test_intrinsics_resolve_after_environment() {
        assert_eq!(run_display("make SIZE = 10\nSIZE"), "10");
        assert_eq!(run_display("SIZE(\"abc\")"), "3");
    }

    #[test]
    fn test_trace_records_accumulate_in_order() {
        let result = run("make x = 1\nx + 2");
        assert!(result.is_ok());
        let records = crate::trace::snapshot();
        assert!(!records.is_empty());
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.seq, i + 1);
        }
    }

    #[test]
    fn test_runtime_errors_land_on_the_run_list() {
        assert_eq!(run_code("missing"), 210);
        let recorded = crate::errors::runtime_errors();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].code, 210);
    }
}
